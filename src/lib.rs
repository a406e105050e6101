//! `Reformed Chapter` - chapter-by-chapter Bible study resource discovery.
//!
//! The crate parses scripture citations, matches curated resources against a
//! book and chapter (or a set of authors), and filters and sorts the results.
//! Submissions and donations go through the store and payment adapters.

// Re-export public modules for use in integration tests and as a library
pub mod browse;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod matching;
pub mod payment;
pub mod reference;
pub mod resource;
pub mod store;
pub mod submission;
pub mod types;

pub use error::{Error, Result};
pub use filter::Filters;
pub use matching::{match_resources, MatchResult, Target};
pub use reference::{parse_reference, ScriptureRange};
pub use resource::Resource;
