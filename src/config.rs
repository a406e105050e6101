//! Application configuration.
//!
//! Handles loading configuration from environment variables and .env files.

use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{payment, store};
use crate::error::Result;

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The application name
    pub(crate) app_name: String,
    /// The application version
    pub(crate) app_version: String,
    /// Base URL of the hosted store (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Public anon key for the hosted store
    pub supabase_key: String,
    /// Table holding approved resources
    pub resources_table: String,
    /// Table receiving submissions
    pub pending_table: String,
    /// Rows per page when fetching the full collection
    pub batch_size: usize,
    /// Per-request timeout
    pub fetch_timeout: Duration,
    /// Retries after a failed fetch
    pub fetch_retries: u32,
    /// Payment provider secret key
    pub stripe_secret_key: String,
    /// Currency for donations
    pub currency: String,
    /// Local JSON export used instead of the hosted store when present
    pub snapshot_path: Option<PathBuf>,
}

impl Config {
    /// Get the application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get the application version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            supabase_url: String::new(),
            supabase_key: String::new(),
            resources_table: store::RESOURCES_TABLE.to_string(),
            pending_table: store::PENDING_TABLE.to_string(),
            batch_size: store::BATCH_SIZE,
            fetch_timeout: Duration::from_secs(store::FETCH_TIMEOUT_SECS),
            fetch_retries: store::FETCH_RETRIES,
            stripe_secret_key: String::new(),
            currency: payment::DEFAULT_CURRENCY.to_string(),
            snapshot_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    #[allow(clippy::unnecessary_wraps)] // Returns Result for forward-compatible API
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = env::var("SUPABASE_URL") {
            config.supabase_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(key) = env::var("SUPABASE_ANON_KEY") {
            config.supabase_key = key;
        }

        if let Ok(table) = env::var("RESOURCES_TABLE") {
            if !table.trim().is_empty() {
                config.resources_table = table.trim().to_string();
            }
        }

        if let Ok(table) = env::var("PENDING_TABLE") {
            if !table.trim().is_empty() {
                config.pending_table = table.trim().to_string();
            }
        }

        if let Some(size) = parse_var::<usize>("FETCH_BATCH_SIZE") {
            if size > 0 {
                config.batch_size = size;
            }
        }

        if let Some(secs) = parse_var::<u64>("FETCH_TIMEOUT_SECS") {
            config.fetch_timeout = Duration::from_secs(secs.max(1));
        }

        if let Some(retries) = parse_var::<u32>("FETCH_RETRIES") {
            config.fetch_retries = retries;
        }

        if let Ok(key) = env::var("STRIPE_SECRET_KEY") {
            config.stripe_secret_key = key;
        }

        if let Ok(currency) = env::var("DONATION_CURRENCY") {
            if !currency.trim().is_empty() {
                config.currency = currency.trim().to_lowercase();
            }
        }

        // Snapshot: env var override, or a default export in the data directory
        config.snapshot_path = env::var("RESOURCES_SNAPSHOT").ok().map_or_else(
            default_snapshot_path,
            |path| Some(PathBuf::from(shellexpand::tilde(&path).to_string())),
        );

        Ok(config)
    }

    /// Check if the hosted store is configured
    pub fn has_store_credentials(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_key.is_empty()
    }

    /// Check if the payment provider is configured
    pub fn has_payment_credentials(&self) -> bool {
        !self.stripe_secret_key.is_empty()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!("Ignoring {name}={raw:?}: not a valid value");
    }
    parsed
}

/// `~/.local/share/reformed-chapter/resources.json` (or the platform
/// equivalent), only if it exists.
fn default_snapshot_path() -> Option<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join("reformed-chapter").join(store::SNAPSHOT_FILE))
        .filter(|p| p.is_file())
}
