//! Scripture citation parsing.
//!
//! Turns citations such as `"1 Corinthians 13:4-7"` or `"Romans 8:28-9:5"`
//! into a [`ScriptureRange`]. Secondary-scripture fields hold several
//! citations separated by `;` and `,`; see [`split_citations`] and
//! [`parse_citation`] for that context.

use std::fmt;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::normalize_book_name;

/// Marker for citations that cover a whole book without naming chapters.
pub const VARIED_CHAPTERS: &str = "(varied chapters)";

// Both the ASCII hyphen and the en-dash separate ranges.
const REFERENCE_BODY: &str = r"(\d*\s*[A-Za-z]+(?:\s+[A-Za-z]+)*)\s+(\d+)(?::(\d+)(?:[–-](\d+))?)?(?:[–-](\d+)(?::(\d+))?)?";

lazy_static! {
    /// Whole-string match used for submissions.
    #[allow(clippy::unwrap_used)]
    static ref RE_EXACT: Regex = Regex::new(&format!("^{REFERENCE_BODY}$")).unwrap();

    /// Prefix match tolerating trailing text such as a translation tag.
    #[allow(clippy::unwrap_used)]
    static ref RE_PREFIX: Regex = Regex::new(&format!("^{REFERENCE_BODY}")).unwrap();
}

/// Why a citation could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// Nothing but whitespace.
    #[error("scripture reference is empty")]
    Empty,
    /// Text that does not follow `<book> <chapter>[:verse[-verse]][-chapter[:verse]]`.
    #[error("not a scripture reference: {0:?}")]
    Malformed(String),
}

/// A parsed citation: one book, an inclusive chapter range, and optional
/// verses for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptureRange {
    /// Book name exactly as written (trimmed); may not resolve in the catalog.
    pub book: String,
    /// First chapter.
    pub chapter: u32,
    /// Last chapter, never less than `chapter`.
    pub chapter_end: u32,
    /// First verse, if given.
    pub verse_start: Option<u32>,
    /// Last verse (in `chapter_end`), if given.
    pub verse_end: Option<u32>,
}

impl ScriptureRange {
    /// Whether `chapter` lies within `[chapter, chapter_end]`.
    pub const fn covers_chapter(&self, chapter: u32) -> bool {
        self.chapter <= chapter && chapter <= self.chapter_end
    }

    /// Whether this range is in `book`, compared by normalized name.
    pub fn is_in_book(&self, book: &str) -> bool {
        normalize_book_name(&self.book) == normalize_book_name(book)
    }
}

impl fmt::Display for ScriptureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book, self.chapter)?;
        match (self.verse_start, self.verse_end) {
            (Some(start), Some(end)) if self.chapter_end != self.chapter => {
                write!(f, ":{start}-{}:{end}", self.chapter_end)
            }
            (Some(start), Some(end)) if end != start => write!(f, ":{start}-{end}"),
            (Some(start), _) => {
                write!(f, ":{start}")?;
                if self.chapter_end != self.chapter {
                    write!(f, "-{}", self.chapter_end)?;
                }
                Ok(())
            }
            (None, _) if self.chapter_end != self.chapter => write!(f, "-{}", self.chapter_end),
            (None, _) => Ok(()),
        }
    }
}

/// Flat view of a parse result for callers that do not branch on errors.
/// A failed parse yields an empty book and every number absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceFields {
    /// Book name, empty on failure.
    pub book: String,
    /// First chapter.
    pub chapter: Option<u32>,
    /// Last chapter.
    pub chapter_end: Option<u32>,
    /// First verse.
    pub verse_start: Option<u32>,
    /// Last verse.
    pub verse_end: Option<u32>,
}

impl ReferenceFields {
    /// True when the parse failed.
    pub fn is_empty(&self) -> bool {
        self.book.is_empty()
    }
}

impl From<ScriptureRange> for ReferenceFields {
    fn from(r: ScriptureRange) -> Self {
        Self {
            book: r.book,
            chapter: Some(r.chapter),
            chapter_end: Some(r.chapter_end),
            verse_start: r.verse_start,
            verse_end: r.verse_end,
        }
    }
}

impl From<Result<ScriptureRange, ReferenceError>> for ReferenceFields {
    fn from(result: Result<ScriptureRange, ReferenceError>) -> Self {
        result.map(Self::from).unwrap_or_default()
    }
}

/// Parse a single citation like `"Isaiah 32:15-17"` or `"Romans 8:28-9:5"`.
///
/// The whole string must be a reference; surrounding text is rejected.
pub fn parse_reference(text: &str) -> Result<ScriptureRange, ReferenceError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ReferenceError::Empty);
    }
    RE_EXACT
        .captures(text)
        .and_then(|caps| range_from_captures(&caps))
        .ok_or_else(|| ReferenceError::Malformed(text.to_string()))
}

/// [`parse_reference`] flattened into [`ReferenceFields`].
pub fn parse_fields(text: &str) -> ReferenceFields {
    parse_reference(text).into()
}

/// One entry of a secondary-scripture field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    /// A chapter range in a book.
    Range(ScriptureRange),
    /// `"<Book> (varied chapters)"`: every chapter of the book.
    VariedChapters {
        /// Book name as written.
        book: String,
    },
}

impl Citation {
    /// Whether this citation covers `chapter` of `book`. Book names are
    /// compared after normalization.
    pub fn covers(&self, book: &str, chapter: u32) -> bool {
        match self {
            Self::Range(range) => range.is_in_book(book) && range.covers_chapter(chapter),
            Self::VariedChapters { book: own } => {
                normalize_book_name(own) == normalize_book_name(book)
            }
        }
    }
}

/// Split a secondary-scripture field into individual citations: groups on
/// `;`, sub-references on `,`, each trimmed, blanks skipped.
pub fn split_citations(text: &str) -> impl Iterator<Item = &str> {
    text.split(';')
        .flat_map(|group| group.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

/// Parse one secondary-scripture citation. Recognizes the
/// `(varied chapters)` form and tolerates trailing text after a reference.
pub fn parse_citation(text: &str) -> Option<Citation> {
    let text = text.trim();

    if text.contains(VARIED_CHAPTERS) {
        let (book, _) = text.split_once('(')?;
        let book = book.trim();
        let plain = book.chars().all(|c| c.is_ascii_alphanumeric() || c.is_whitespace());
        return (!book.is_empty() && plain).then(|| Citation::VariedChapters {
            book: book.to_string(),
        });
    }

    parse_reference(text)
        .ok()
        .or_else(|| RE_PREFIX.captures(text).and_then(|caps| range_from_captures(&caps)))
        .map(Citation::Range)
}

fn range_from_captures(caps: &Captures<'_>) -> Option<ScriptureRange> {
    let number = |i: usize| -> Option<Option<u32>> {
        caps.get(i).map_or(Some(None), |m| m.as_str().parse().ok().map(Some))
    };

    let book = caps.get(1)?.as_str().trim().to_string();
    if book.is_empty() {
        return None;
    }
    let chapter = number(2)??;
    let verse_start = number(3)?;
    let same_chapter_end = number(4)?;
    let chapter_end = number(5)?.unwrap_or(chapter);
    let other_chapter_end = number(6)?;

    if chapter_end < chapter {
        return None;
    }

    let verse_end = other_chapter_end.or(same_chapter_end).or(verse_start);

    Some(ScriptureRange {
        book,
        chapter,
        chapter_end,
        verse_start,
        verse_end,
    })
}
