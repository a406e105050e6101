//! Resource records as stored in the hosted table.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{PriceBucket, ResourceId, ResourceType};

/// A curated study resource. Read-only once approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Store-assigned identifier.
    pub id: ResourceId,
    /// Display title.
    pub title: String,
    /// Raw type string (e.g. "Sermon", "commentaries").
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Author, if known.
    #[serde(default)]
    pub author: Option<String>,
    /// Canonical book name the resource is filed under.
    #[serde(default)]
    pub book: String,
    /// First chapter; absent (or 0) for whole-book resources.
    #[serde(default, deserialize_with = "lenient_chapter")]
    pub chapter: Option<u32>,
    /// Last chapter; defaults to `chapter` when absent or 0.
    #[serde(default, deserialize_with = "lenient_chapter")]
    pub chapter_end: Option<u32>,
    /// First verse (display only).
    #[serde(default, deserialize_with = "lenient_number")]
    pub verse_start: Option<u32>,
    /// Last verse (display only).
    #[serde(default, deserialize_with = "lenient_number")]
    pub verse_end: Option<u32>,
    /// Further citations, `;`/`,` separated.
    #[serde(default)]
    pub secondary_scripture: Option<String>,
    /// Price text; see [`PriceBucket::from_price`].
    #[serde(default)]
    pub price: Option<String>,
    /// Year of publication.
    #[serde(default, deserialize_with = "lenient_number")]
    pub published_year: Option<i32>,
    /// Link to the resource.
    #[serde(default)]
    pub url: Option<String>,
    /// Cover image.
    #[serde(default)]
    pub image: Option<String>,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Resource {
    /// Minimal record, mostly for tests and demos.
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: impl Into<String>, book: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(id),
            title: title.into(),
            kind: kind.into(),
            author: None,
            book: book.into(),
            chapter: None,
            chapter_end: None,
            verse_start: None,
            verse_end: None,
            secondary_scripture: None,
            price: None,
            published_year: None,
            url: None,
            image: None,
            description: None,
        }
    }

    /// Parsed resource type.
    pub fn resource_type(&self) -> ResourceType {
        ResourceType::from_raw(&self.kind)
    }

    /// Trimmed author, `None` when missing or blank.
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }

    /// Free or paid.
    pub fn price_bucket(&self) -> PriceBucket {
        PriceBucket::from_price(self.price.as_deref())
    }

    /// Whether the resource has no chapter and so covers its whole book.
    pub fn is_whole_book(&self) -> bool {
        self.chapter_range().is_none()
    }

    /// Inclusive chapter range, `None` for whole-book resources. Chapter 0
    /// counts as absent.
    pub fn chapter_range(&self) -> Option<(u32, u32)> {
        let start = self.chapter.filter(|&c| c != 0)?;
        Some((start, self.chapter_end.filter(|&c| c != 0).unwrap_or(start)))
    }

    /// Non-blank secondary scripture text.
    pub fn secondary_scripture(&self) -> Option<&str> {
        self.secondary_scripture.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Human-readable primary reference, e.g. "Romans 8:28-9:5" or "Job".
    pub fn reference_label(&self) -> String {
        let Some((start, end)) = self.chapter_range() else {
            return self.book.clone();
        };
        let mut label = format!("{} {start}", self.book);
        match (self.verse_start, self.verse_end) {
            (Some(vs), Some(ve)) if end != start => label.push_str(&format!(":{vs}-{end}:{ve}")),
            (Some(vs), Some(ve)) if ve != vs => label.push_str(&format!(":{vs}-{ve}")),
            (Some(vs), _) => label.push_str(&format!(":{vs}")),
            (None, _) if end != start => label.push_str(&format!("-{end}")),
            (None, _) => {}
        }
        label
    }
}

/// Accept a JSON number, a numeric string, or null. Anything unparseable
/// becomes `None` rather than failing the whole record.
fn lenient_number<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + std::str::FromStr,
{
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|n| T::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Chapter numbers: like [`lenient_number`], with 0 read as absent.
fn lenient_chapter<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number::<D, u32>(d)?.filter(|&c| c != 0))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn deserializes_store_rows() {
        let json = r#"{
            "id": 17,
            "title": "The Golden Chain",
            "type": "Sermons",
            "author": "  John Piper ",
            "book": "Romans",
            "chapter": "8",
            "chapter_end": 9,
            "verse_start": 28,
            "verse_end": null,
            "secondary_scripture": "Ephesians 1:3-14",
            "price": "Free",
            "published_year": "1998",
            "url": "https://example.org/golden-chain"
        }"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(r.id.as_str(), "17");
        assert_eq!(r.resource_type(), ResourceType::Sermon);
        assert_eq!(r.author_name(), Some("John Piper"));
        assert_eq!(r.chapter_range(), Some((8, 9)));
        assert_eq!(r.published_year, Some(1998));
        assert_eq!(r.price_bucket(), PriceBucket::Free);
        assert!(r.image.is_none());
    }

    #[test]
    fn unparseable_numbers_are_absent() {
        let json = r#"{"id": "a", "title": "t", "type": "Book", "book": "Job", "chapter": "", "published_year": "n.d."}"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert!(r.is_whole_book());
        assert_eq!(r.published_year, None);
    }

    #[test]
    fn zero_chapters_are_absent() {
        let json = r#"{"id": 1, "title": "t", "type": "Sermon", "book": "Romans", "chapter": 8, "chapter_end": 0}"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(r.chapter_end, None);
        assert_eq!(r.chapter_range(), Some((8, 8)));

        let json = r#"{"id": 2, "title": "t", "type": "Sermon", "book": "Romans", "chapter": "0"}"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert!(r.is_whole_book());

        let mut r = Resource::new("3", "t", "Sermon", "Romans");
        r.chapter = Some(8);
        r.chapter_end = Some(0);
        assert_eq!(r.chapter_range(), Some((8, 8)));
        r.chapter = Some(0);
        assert!(r.is_whole_book());
    }

    #[test]
    fn blank_author_is_absent() {
        let mut r = Resource::new("1", "t", "Book", "Job");
        assert_eq!(r.author_name(), None);
        r.author = Some("   ".into());
        assert_eq!(r.author_name(), None);
    }

    #[test]
    fn reference_labels() {
        let mut r = Resource::new("1", "t", "Sermon", "Romans");
        assert_eq!(r.reference_label(), "Romans");
        r.chapter = Some(8);
        assert_eq!(r.reference_label(), "Romans 8");
        r.chapter_end = Some(9);
        assert_eq!(r.reference_label(), "Romans 8-9");
        r.verse_start = Some(28);
        r.verse_end = Some(5);
        assert_eq!(r.reference_label(), "Romans 8:28-9:5");
    }
}
