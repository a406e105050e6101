//! Application error types.
//!
//! Provides unified error handling with actionable context for debugging.
//! Citation parsing has its own error type in [`crate::reference`]; parse
//! failures never travel through this one.

use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types with specific context for actionable debugging
#[derive(Debug, Error)]
pub enum Error {
    /// IO error with path context
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// The underlying IO error.
        source: std::io::Error,
        /// File path where the error occurred, if known.
        path: Option<std::path::PathBuf>,
    },

    /// Network error (connection, timeout, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// Resource store error with status context
    #[error("Resource store error: {message}")]
    Store {
        /// Human-readable error description.
        message: String,
        /// HTTP status code, if from an HTTP response.
        status: Option<u16>,
        /// Actionable suggestion for resolving the error.
        hint: Option<&'static str>,
    },

    /// Configuration error with guidance
    #[error("Configuration error: {message}. {hint}")]
    Config {
        /// Description of the configuration problem.
        message: String,
        /// Actionable guidance for fixing the issue.
        hint: &'static str,
    },

    /// Data parsing error
    #[error("Parse error in {file:?}: {message}")]
    Parse {
        /// File that failed to parse, if known.
        file: Option<std::path::PathBuf>,
        /// Description of the parse failure.
        message: String,
    },

    /// Payment provider error. The message is shown to the donor verbatim.
    #[error("{message}")]
    Payment {
        /// Message from the provider (or from local amount validation).
        message: String,
        /// HTTP status code, if the provider answered.
        status: Option<u16>,
    },

    /// Rejected resource submission
    #[error(transparent)]
    Submission(#[from] crate::submission::SubmissionError),
}

impl Error {
    /// Create an IO error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<std::path::PathBuf>>) -> Self {
        Self::Io { source, path: path.into() }
    }

    /// Create a store error without HTTP context
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            status: None,
            hint: None,
        }
    }

    /// Create a store error with HTTP status
    pub fn store_status(message: impl Into<String>, status: u16) -> Self {
        let hint = match status {
            401 => Some("Check SUPABASE_URL and SUPABASE_ANON_KEY environment variables"),
            403 => Some("The anon key may lack read access to the resources table"),
            404 => Some("Check RESOURCES_TABLE / PENDING_TABLE names"),
            416 => Some("Requested range is past the end of the table"),
            429 => Some("Rate limited - wait a moment and try again"),
            500..=599 => Some("Store server error - try again later"),
            _ => None,
        };
        Self::Store {
            message: message.into(),
            status: Some(status),
            hint,
        }
    }

    /// Create a config error with actionable hint
    pub fn config(message: impl Into<String>, hint: &'static str) -> Self {
        Self::Config { message: message.into(), hint }
    }

    /// Create a parse error with file context
    pub fn parse(message: impl Into<String>, file: impl Into<Option<std::path::PathBuf>>) -> Self {
        Self::Parse { file: file.into(), message: message.into() }
    }

    /// Create a payment error carrying the provider's message
    pub fn payment(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Payment { message: message.into(), status }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Store { status: Some(s), .. } => *s == 429 || *s >= 500,
            _ => false,
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io { source: e, path: None }
    }
}
