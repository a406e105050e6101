//! Resource store access.
//!
//! The core only needs two operations from the store: fetch the complete
//! collection, and queue a submission for review. Adapters page, time out
//! and retry as needed.

/// In-process store
pub mod memory;
/// Local JSON snapshot store
pub mod snapshot;
/// Hosted PostgREST store
pub mod supabase;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::constants::store::RETRY_DELAY_MS;
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::submission::PendingResource;

pub use memory::MemoryStore;
pub use snapshot::JsonFileStore;
pub use supabase::SupabaseStore;

/// A queryable collection of resource records.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Every approved resource.
    async fn fetch_all(&self) -> Result<Vec<Resource>>;

    /// Queue a submission for review. Never touches the approved set.
    async fn insert_pending(&self, submission: &PendingResource) -> Result<()>;

    /// Adapter name (for logging).
    fn name(&self) -> &'static str;
}

/// Pick a store from configuration: a local snapshot when one is
/// configured, otherwise the hosted store.
pub fn from_config(config: &Config) -> Result<Arc<dyn ResourceStore>> {
    if let Some(path) = &config.snapshot_path {
        tracing::info!("Using resource snapshot at {}", path.display());
        return Ok(Arc::new(JsonFileStore::new(path.clone())));
    }
    if config.has_store_credentials() {
        return Ok(Arc::new(SupabaseStore::new(config)));
    }
    Err(Error::config(
        "No resource store configured",
        "Set SUPABASE_URL and SUPABASE_ANON_KEY, or RESOURCES_SNAPSHOT to a JSON export",
    ))
}

/// Run `op` once, then up to `retries` more times while it fails with a
/// transient error.
pub async fn with_retry<T, F, Fut>(retries: u32, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries && e.is_transient() => {
                attempt += 1;
                tracing::warn!("{what} failed ({e}); retry {attempt}/{retries}");
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_failures_once() {
        let calls = AtomicU32::new(0);
        let result = with_retry(1, "fetch", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::Network("timed out".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(1, "fetch", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Network("down".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(3, "fetch", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::store_status("not found", 404))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn from_config_requires_a_source() {
        let config = Config::default();
        assert!(matches!(from_config(&config), Err(Error::Config { .. })));

        let config = Config {
            snapshot_path: Some("/tmp/resources.json".into()),
            ..Config::default()
        };
        assert_eq!(from_config(&config).unwrap().name(), "snapshot");
    }
}
