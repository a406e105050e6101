//! Core type definitions for compile-time safety.
//!
//! Resource types, price buckets and sort orders arrive from the store and
//! the UI as loose strings; each is parsed once here into an enum.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a resource, parsed from the store's free-form `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    /// Preached sermons.
    Sermon,
    /// Verse-by-verse commentaries.
    Commentary,
    /// Devotional readings.
    Devotional,
    /// Whole books.
    Book,
    /// Recorded videos.
    Video,
    /// Anything that does not normalize to a known type. Never shown in
    /// type-bucketed views.
    Unknown,
}

impl ResourceType {
    /// The five displayable types in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Sermon, Self::Commentary, Self::Devotional, Self::Book, Self::Video]
    }

    /// Normalize a raw stored type: lowercase, trim, drop one trailing "s",
    /// then pluralize ("commentary" -> "commentaries", else append "s").
    pub fn from_raw(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower);
        let bucket = if singular == "commentary" {
            "commentaries".to_string()
        } else {
            format!("{singular}s")
        };
        Self::from_bucket(&bucket).unwrap_or(Self::Unknown)
    }

    /// Parse a bucket key such as `"sermons"`.
    pub fn from_bucket(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.bucket() == Some(key))
    }

    /// Bucket key used for grouping and filtering (e.g. `"commentaries"`).
    #[must_use]
    pub const fn bucket(self) -> Option<&'static str> {
        match self {
            Self::Sermon => Some("sermons"),
            Self::Commentary => Some("commentaries"),
            Self::Devotional => Some("devotionals"),
            Self::Book => Some("books"),
            Self::Video => Some("videos"),
            Self::Unknown => None,
        }
    }

    /// Heading shown above a bucket.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sermon => "Sermons",
            Self::Commentary => "Commentaries",
            Self::Devotional => "Devotionals",
            Self::Book => "Books",
            Self::Video => "Videos",
            Self::Unknown => "Other",
        }
    }

    /// Singular name stored on submitted records.
    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Sermon => "Sermon",
            Self::Commentary => "Commentary",
            Self::Devotional => "Devotional",
            Self::Book => "Book",
            Self::Video => "Video",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a resource costs money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBucket {
    /// No price, `"0"`, or `"free"` in any case.
    Free,
    /// Everything else.
    Paid,
}

impl PriceBucket {
    /// Bucket a raw price string.
    pub fn from_price(price: Option<&str>) -> Self {
        match price.map(str::trim) {
            None | Some("" | "0") => Self::Free,
            Some(p) if p.eq_ignore_ascii_case("free") => Self::Free,
            Some(_) => Self::Paid,
        }
    }

    /// Lowercase key (`"free"` / `"paid"`).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for PriceBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown price filter {other:?} (expected free or paid)")),
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Keep the store's order.
    #[default]
    Default,
    /// By `(chapter, verse_start)`.
    Scripture,
    /// By title, ignoring case.
    Alphabetical,
    /// By publication year, newest first.
    Newest,
    /// By publication year, oldest first.
    Oldest,
}

impl SortOrder {
    /// Key as used by the UI (`""` for the default order).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Scripture => "scripture",
            Self::Alphabetical => "alphabetical",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "default" => Ok(Self::Default),
            "scripture" => Ok(Self::Scripture),
            "alphabetical" | "a-z" => Ok(Self::Alphabetical),
            "newest" | "date" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            other => Err(format!("unknown sort order {other:?}")),
        }
    }
}

/// Store-assigned resource identifier. The hosted store uses integer keys,
/// exports sometimes carry strings; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Create a new `ResourceId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for ResourceId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(d)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}
