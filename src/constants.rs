//! Application constants.
//!
//! Centralizes magic numbers and configuration values for better maintainability.

/// Resource store constants.
pub mod store {
    /// Default table holding approved resources.
    pub const RESOURCES_TABLE: &str = "resources";

    /// Default table receiving submissions awaiting review.
    pub const PENDING_TABLE: &str = "pending_resources";

    /// Rows requested per page; the hosted store caps responses at this size.
    pub const BATCH_SIZE: usize = 1000;

    /// Default per-request timeout in seconds.
    pub const FETCH_TIMEOUT_SECS: u64 = 10;

    /// Retries after the first failed attempt.
    pub const FETCH_RETRIES: u32 = 1;

    /// Pause before retrying a failed fetch, in milliseconds.
    pub const RETRY_DELAY_MS: u64 = 250;

    /// File name of the local snapshot under the data directory.
    pub const SNAPSHOT_FILE: &str = "resources.json";
}

/// Donation and payment constants.
pub mod payment {
    /// Smallest amount the provider accepts, in cents.
    pub const MIN_AMOUNT_CENTS: u64 = 50;

    /// Default currency for donations.
    pub const DEFAULT_CURRENCY: &str = "usd";

    /// Metadata tag identifying donations from this site.
    pub const SOURCE_TAG: &str = "reformed-chapter-donation";

    /// Preset donation amounts in whole dollars.
    pub const PRESET_AMOUNTS: [u32; 4] = [15, 25, 50, 100];

    /// Payment provider API base.
    pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
}

/// Browsing constants.
pub mod browse {
    /// Channel buffer size for fetch results.
    pub const CHANNEL_BUFFER_SIZE: usize = 16;

    /// Maximum number of author suggestions returned by the picker search.
    pub const MAX_AUTHOR_SUGGESTIONS: usize = 20;

    /// Minimum fuzzy score for an author suggestion.
    pub const MIN_AUTHOR_SCORE: i64 = 30;
}
