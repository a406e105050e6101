//! Resource submissions.
//!
//! Visitors submit a resource with a free-text scripture reference. The
//! reference is parsed into structured columns and the record lands in the
//! pending table for review; it never reaches the approved set directly.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog;
use crate::error::Result;
use crate::reference::{parse_fields, parse_reference, ReferenceFields};
use crate::store::ResourceStore;
use crate::types::ResourceType;

/// Why a submission was rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The scripture reference could not be parsed.
    #[error("Please enter a valid scripture reference (e.g., 'John 3:16' or '1 Corinthians 13:4-7')")]
    InvalidScripture,
    /// A required field is blank.
    #[error("Please fill in the {0} field")]
    MissingField(&'static str),
    /// The type is not one of the five resource types.
    #[error("Unknown resource type {0:?}; choose Sermon, Commentary, Devotional, Video or Book")]
    InvalidType(String),
    /// The publication year is not a plausible year.
    #[error("Published year {0:?} is not a valid year")]
    InvalidYear(String),
}

/// Raw form input, as typed by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionForm {
    /// Resource title.
    pub title: String,
    /// Resource type, e.g. "Sermon".
    #[serde(rename = "type")]
    pub kind: String,
    /// Author name.
    pub author: String,
    /// Primary scripture reference, e.g. "Romans 8:28-39".
    pub scripture: String,
    /// Link to the resource.
    pub url: String,
    /// Cover image link.
    pub image: String,
    /// Short description.
    pub description: String,
    /// Price text ("Free", "$12", ...).
    pub price: String,
    /// Year of publication.
    pub published_year: String,
    /// Further references, `;`/`,` separated.
    pub secondary_scripture: String,
}

/// A parsed submission, shaped like a row of the pending table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingResource {
    /// Resource title.
    pub title: String,
    /// Singular type name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Author, if given.
    pub author: Option<String>,
    /// Book as written in the reference.
    pub book: String,
    /// First chapter.
    pub chapter: u32,
    /// Last chapter.
    pub chapter_end: u32,
    /// First verse.
    pub verse_start: Option<u32>,
    /// Last verse.
    pub verse_end: Option<u32>,
    /// Link to the resource.
    pub url: String,
    /// Cover image link.
    pub image: Option<String>,
    /// Short description.
    pub description: Option<String>,
    /// Price text.
    pub price: Option<String>,
    /// Year of publication.
    pub published_year: Option<i32>,
    /// Further references.
    pub secondary_scripture: Option<String>,
}

fn optional(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn required(s: &str, field: &'static str) -> std::result::Result<String, SubmissionError> {
    optional(s).ok_or(SubmissionError::MissingField(field))
}

impl SubmissionForm {
    /// Live preview of how the scripture field will be stored. `None` while
    /// the field is blank.
    pub fn preview(&self) -> Option<ReferenceFields> {
        (!self.scripture.trim().is_empty()).then(|| parse_fields(&self.scripture))
    }

    /// Validate the form and convert it into a pending row.
    pub fn into_pending(self) -> std::result::Result<PendingResource, SubmissionError> {
        let title = required(&self.title, "title")?;
        let kind_raw = required(&self.kind, "type")?;
        let url = required(&self.url, "url")?;

        let range = parse_reference(&self.scripture).map_err(|e| {
            tracing::debug!("Rejected submission \"{title}\": {e}");
            SubmissionError::InvalidScripture
        })?;

        let kind = match ResourceType::from_raw(&kind_raw) {
            ResourceType::Unknown => return Err(SubmissionError::InvalidType(kind_raw)),
            known => known.singular().to_string(),
        };

        let published_year = optional(&self.published_year)
            .map(|y| parse_year(&y).ok_or(SubmissionError::InvalidYear(y)))
            .transpose()?;

        if catalog::find(&range.book).is_none() {
            match catalog::resolve_book(&range.book) {
                Some(book) => tracing::warn!(
                    "Submission \"{title}\" uses book {:?}; the catalog name is {:?}",
                    range.book,
                    book.name
                ),
                None => tracing::warn!("Submission \"{title}\" names unknown book {:?}", range.book),
            }
        }

        Ok(PendingResource {
            title,
            kind,
            author: optional(&self.author),
            book: range.book,
            chapter: range.chapter,
            chapter_end: range.chapter_end,
            verse_start: range.verse_start,
            verse_end: range.verse_end,
            url,
            image: optional(&self.image),
            description: optional(&self.description),
            price: optional(&self.price),
            published_year,
            secondary_scripture: optional(&self.secondary_scripture),
        })
    }
}

/// Years from the first printed books up to next year.
fn parse_year(text: &str) -> Option<i32> {
    let year: i32 = text.trim().parse().ok()?;
    let latest = chrono::Utc::now().year() + 1;
    (1400..=latest).contains(&year).then_some(year)
}

/// Validate `form` and queue it in `store`'s pending table.
pub async fn submit(store: &dyn ResourceStore, form: SubmissionForm) -> Result<PendingResource> {
    let pending = form.into_pending()?;
    store.insert_pending(&pending).await?;
    tracing::info!("Submitted \"{}\" ({} {})", pending.title, pending.kind, pending.book);
    Ok(pending)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStore;

    fn form() -> SubmissionForm {
        SubmissionForm {
            title: "  Love Is Patient ".into(),
            kind: "sermons".into(),
            author: " ".into(),
            scripture: "1 Corinthians 13:4-7".into(),
            url: "https://example.org/love".into(),
            price: "Free".into(),
            published_year: "2015".into(),
            ..SubmissionForm::default()
        }
    }

    #[test]
    fn converts_form_to_pending_row() {
        let pending = form().into_pending().unwrap();
        assert_eq!(pending.title, "Love Is Patient");
        assert_eq!(pending.kind, "Sermon");
        assert_eq!(pending.author, None);
        assert_eq!(pending.book, "1 Corinthians");
        assert_eq!((pending.chapter, pending.chapter_end), (13, 13));
        assert_eq!((pending.verse_start, pending.verse_end), (Some(4), Some(7)));
        assert_eq!(pending.published_year, Some(2015));
        assert_eq!(pending.image, None);
    }

    #[test]
    fn rejects_bad_scripture() {
        for scripture in ["", "not a reference"] {
            let f = SubmissionForm { scripture: scripture.into(), ..form() };
            let err = f.into_pending().unwrap_err();
            assert_eq!(err, SubmissionError::InvalidScripture);
            assert!(err.to_string().contains("John 3:16"));
        }
    }

    #[test]
    fn rejects_missing_fields_and_bad_values() {
        let f = SubmissionForm { title: " ".into(), ..form() };
        assert_eq!(f.into_pending().unwrap_err(), SubmissionError::MissingField("title"));

        let f = SubmissionForm { kind: "Podcast".into(), ..form() };
        assert!(matches!(f.into_pending(), Err(SubmissionError::InvalidType(_))));

        let f = SubmissionForm { published_year: "soon".into(), ..form() };
        assert!(matches!(f.into_pending(), Err(SubmissionError::InvalidYear(_))));
    }

    #[test]
    fn preview_tracks_scripture_field() {
        let mut f = form();
        assert_eq!(f.preview().unwrap().chapter, Some(13));
        f.scripture = "garbage".into();
        assert!(f.preview().unwrap().is_empty());
        f.scripture = "  ".into();
        assert!(f.preview().is_none());
    }

    #[tokio::test]
    async fn submit_writes_only_valid_forms() {
        let store = MemoryStore::default();
        submit(&store, form()).await.unwrap();

        let bad = SubmissionForm { scripture: "nope".into(), ..form() };
        let err = submit(&store, bad).await.unwrap_err();
        assert!(matches!(err, Error::Submission(SubmissionError::InvalidScripture)));

        let pending = store.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Love Is Patient");
    }
}
