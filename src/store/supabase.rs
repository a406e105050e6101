use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use super::{with_retry, ResourceStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::submission::PendingResource;

/// Client for the hosted resources table (PostgREST API).
///
/// The server caps every response at `batch_size` rows, so `fetch_all`
/// walks the table with `Range` headers until a short page comes back.
#[derive(Clone)]
pub struct SupabaseStore {
    base_url: String,
    api_key: String,
    resources_table: String,
    pending_table: String,
    batch_size: usize,
    retries: u32,
    client: Client,
}

impl SupabaseStore {
    /// Create a new store client from config
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.supabase_url.clone(),
            api_key: config.supabase_key.clone(),
            resources_table: config.resources_table.clone(),
            pending_table: config.pending_table.clone(),
            batch_size: config.batch_size.max(1),
            retries: config.fetch_retries,
            client: Client::builder()
                .timeout(config.fetch_timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Check if credentials are configured
    fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(Error::config(
                "Resource store client not configured",
                "Set SUPABASE_URL and SUPABASE_ANON_KEY environment variables",
            ))
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Fetch rows `from..=to` of the resources table
    async fn fetch_page(&self, from: usize, to: usize) -> Result<Vec<Resource>> {
        let url = self.table_url(&self.resources_table);
        let resp = self
            .authorized(self.client.get(&url))
            .query(&[("select", "*")])
            .header("Range-Unit", "items")
            .header("Range", format!("{from}-{to}"))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request for rows {from}-{to} failed: {e}")))?;

        let status = resp.status();
        // Asking past the end of the table is an empty page, not an error
        if status.as_u16() == 416 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(Error::store_status(
                format!("Request for rows {from}-{to} returned {status}"),
                status.as_u16(),
            ));
        }

        resp.json()
            .await
            .map_err(|e| Error::parse(format!("Invalid resource rows {from}-{to}: {e}"), None))
    }
}

#[async_trait]
impl ResourceStore for SupabaseStore {
    async fn fetch_all(&self) -> Result<Vec<Resource>> {
        self.ensure_configured()?;

        let mut all = Vec::new();
        let mut from = 0;
        loop {
            let to = from + self.batch_size - 1;
            let page = with_retry(self.retries, "Resource page fetch", || self.fetch_page(from, to)).await?;
            let count = page.len();
            all.extend(page);
            if count < self.batch_size {
                break;
            }
            from += self.batch_size;
        }

        tracing::debug!("Fetched {} resources from {}", all.len(), self.resources_table);
        Ok(all)
    }

    async fn insert_pending(&self, submission: &PendingResource) -> Result<()> {
        self.ensure_configured()?;

        let url = self.table_url(&self.pending_table);
        let resp = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=minimal")
            .json(&[submission])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Submitting \"{}\" failed: {e}", submission.title)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::store_status(
                format!("Submission returned {status}: {body}"),
                status.as_u16(),
            ));
        }

        tracing::info!("Queued \"{}\" for review", submission.title);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[tokio::test]
    async fn unconfigured_store_reports_config_error() {
        let store = SupabaseStore::new(&Config::default());
        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn table_urls() {
        let config = Config {
            supabase_url: "https://abc.supabase.co".into(),
            supabase_key: "anon".into(),
            ..Config::default()
        };
        let store = SupabaseStore::new(&config);
        assert_eq!(store.table_url("resources"), "https://abc.supabase.co/rest/v1/resources");
    }
}
