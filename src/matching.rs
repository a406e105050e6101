//! Matching resources against a chapter or an author set.
//!
//! A chapter target yields two partitions: *primary* (the record is filed
//! under a range covering the chapter) and *secondary* (its free-text
//! secondary scripture mentions the chapter). An author target yields the
//! *author-only* partition. Each partition is then grouped by type.
//!
//! Primary matching compares `record.book` to the target book exactly, while
//! secondary matching compares normalized names. The asymmetry is kept on
//! purpose: normalizing primary books would change which records appear for
//! rows with inconsistent casing in the store.

use std::collections::BTreeSet;

use crate::filter::{self, Filters};
use crate::reference::{parse_citation, split_citations};
use crate::resource::Resource;
use crate::types::{ResourceType, SortOrder};

/// What to match against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A chapter of a book, by canonical name.
    Chapter {
        /// Canonical book name.
        book: String,
        /// Chapter number.
        chapter: u32,
    },
    /// Author-only browsing: any resource by one of these authors.
    Authors(BTreeSet<String>),
}

impl Target {
    /// Chapter target.
    pub fn chapter(book: impl Into<String>, chapter: u32) -> Self {
        Self::Chapter { book: book.into(), chapter }
    }

    /// Author target from any list of names; names are trimmed.
    pub fn authors<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Authors(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        )
    }

    /// Whether this is author-only mode.
    pub const fn is_author_only(&self) -> bool {
        matches!(self, Self::Authors(_))
    }
}

/// Primary match: same book (exact), and either a whole-book resource or a
/// chapter range containing `chapter`.
pub fn matches_primary(resource: &Resource, book: &str, chapter: u32) -> bool {
    if resource.book != book {
        return false;
    }
    resource
        .chapter_range()
        .is_none_or(|(start, end)| start <= chapter && chapter <= end)
}

/// Secondary match: any citation in the secondary scripture covers the
/// chapter. Book names are compared normalized.
pub fn matches_secondary(resource: &Resource, book: &str, chapter: u32) -> bool {
    let Some(text) = resource.secondary_scripture() else {
        return false;
    };
    split_citations(text)
        .filter_map(parse_citation)
        .any(|citation| citation.covers(book, chapter))
}

/// Author-only match: trimmed author is one of `authors`.
pub fn matches_author(resource: &Resource, authors: &BTreeSet<String>) -> bool {
    resource.author_name().is_some_and(|a| authors.contains(a))
}

/// Distinct trimmed, non-blank authors across `records`, sorted.
pub fn available_authors<'a, I>(records: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Resource>,
{
    records
        .into_iter()
        .filter_map(Resource::author_name)
        .map(str::to_string)
        .collect()
}

/// A partition grouped into the five type buckets.
///
/// Records whose type is not recognized go to `unrecognized`. That list is
/// never part of [`TypeBuckets::iter`] or any filtered view, so such records
/// are not displayed; it exists so the exclusion can be counted and logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeBuckets<'a> {
    /// Sermons.
    pub sermons: Vec<&'a Resource>,
    /// Commentaries.
    pub commentaries: Vec<&'a Resource>,
    /// Devotionals.
    pub devotionals: Vec<&'a Resource>,
    /// Books.
    pub books: Vec<&'a Resource>,
    /// Videos.
    pub videos: Vec<&'a Resource>,
    /// Records with an unknown type, excluded from display.
    pub unrecognized: Vec<&'a Resource>,
}

impl<'a> TypeBuckets<'a> {
    /// Group records by type, keeping input order within each bucket.
    pub fn from_resources<I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        let mut buckets = Self::default();
        for record in records {
            match record.resource_type() {
                ResourceType::Sermon => buckets.sermons.push(record),
                ResourceType::Commentary => buckets.commentaries.push(record),
                ResourceType::Devotional => buckets.devotionals.push(record),
                ResourceType::Book => buckets.books.push(record),
                ResourceType::Video => buckets.videos.push(record),
                ResourceType::Unknown => buckets.unrecognized.push(record),
            }
        }
        if !buckets.unrecognized.is_empty() {
            tracing::debug!(
                "Excluding {} record(s) with unrecognized type from bucketed views",
                buckets.unrecognized.len()
            );
        }
        buckets
    }

    /// Records of one type. `Unknown` yields the excluded list.
    pub fn get(&self, kind: ResourceType) -> &[&'a Resource] {
        match kind {
            ResourceType::Sermon => &self.sermons,
            ResourceType::Commentary => &self.commentaries,
            ResourceType::Devotional => &self.devotionals,
            ResourceType::Book => &self.books,
            ResourceType::Video => &self.videos,
            ResourceType::Unknown => &self.unrecognized,
        }
    }

    /// The five displayable buckets in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, &[&'a Resource])> + '_ {
        ResourceType::all().iter().map(move |&kind| (kind, self.get(kind)))
    }

    /// Number of displayable records.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, list)| list.len()).sum()
    }

    /// Whether no displayable record is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filter and sort every bucket with the shared engine. Unrecognized
    /// records never pass the type filter, so the result has none.
    #[must_use]
    pub fn filtered(&self, filters: &Filters, sort: SortOrder) -> Self {
        let run = |list: &[&'a Resource]| filter::apply(list.iter().copied(), filters, sort);
        Self {
            sermons: run(&self.sermons),
            commentaries: run(&self.commentaries),
            devotionals: run(&self.devotionals),
            books: run(&self.books),
            videos: run(&self.videos),
            unrecognized: Vec::new(),
        }
    }
}

/// The three partitions for one target. Partitions that do not apply to the
/// target's mode are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult<'a> {
    /// Filed under a range covering the target chapter.
    pub primary: TypeBuckets<'a>,
    /// Mentioned by a secondary-scripture citation.
    pub secondary: TypeBuckets<'a>,
    /// Written by one of the target authors.
    pub author_only: TypeBuckets<'a>,
}

impl<'a> MatchResult<'a> {
    /// Apply the same filters and sort to every partition.
    #[must_use]
    pub fn filtered(&self, filters: &Filters, sort: SortOrder) -> Self {
        Self {
            primary: self.primary.filtered(filters, sort),
            secondary: self.secondary.filtered(filters, sort),
            author_only: self.author_only.filtered(filters, sort),
        }
    }

    /// Whether every partition is empty.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty() && self.author_only.is_empty()
    }
}

/// Partition `records` for `target`.
pub fn match_resources<'a>(records: &'a [Resource], target: &Target) -> MatchResult<'a> {
    match target {
        Target::Chapter { book, chapter } => {
            let primary = records.iter().filter(|r| matches_primary(r, book, *chapter));
            let secondary = records.iter().filter(|r| matches_secondary(r, book, *chapter));
            let result = MatchResult {
                primary: TypeBuckets::from_resources(primary),
                secondary: TypeBuckets::from_resources(secondary),
                author_only: TypeBuckets::default(),
            };
            tracing::debug!(
                "{book} {chapter}: {} primary, {} secondary of {} records",
                result.primary.len(),
                result.secondary.len(),
                records.len()
            );
            result
        }
        Target::Authors(authors) => {
            let hits = records.iter().filter(|r| matches_author(r, authors));
            let result = MatchResult {
                author_only: TypeBuckets::from_resources(hits),
                ..MatchResult::default()
            };
            tracing::debug!(
                "{} author(s): {} records of {}",
                authors.len(),
                result.author_only.len(),
                records.len()
            );
            result
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn res(id: &str, kind: &str, book: &str, chapter: Option<u32>, chapter_end: Option<u32>) -> Resource {
        let mut r = Resource::new(id, format!("title {id}"), kind, book);
        r.chapter = chapter;
        r.chapter_end = chapter_end;
        r
    }

    fn ids(list: &[&Resource]) -> Vec<String> {
        list.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn whole_book_matches_every_chapter() {
        let r = res("1", "Commentary", "John", None, Some(3));
        for chapter in [1, 5, 21] {
            assert!(matches_primary(&r, "John", chapter));
        }
        assert!(!matches_primary(&r, "Luke", 1));
    }

    #[test]
    fn zero_chapter_fields_read_as_absent() {
        let r = res("1", "Sermon", "Romans", Some(8), Some(0));
        assert!(matches_primary(&r, "Romans", 8));
        assert!(!matches_primary(&r, "Romans", 9));

        let r = res("2", "Sermon", "Romans", Some(0), None);
        assert!(matches_primary(&r, "Romans", 16));
    }

    #[test]
    fn chapter_range_is_inclusive() {
        let r = res("1", "Sermon", "Romans", Some(8), Some(9));
        assert!(!matches_primary(&r, "Romans", 7));
        assert!(matches_primary(&r, "Romans", 8));
        assert!(matches_primary(&r, "Romans", 9));
        assert!(!matches_primary(&r, "Romans", 10));

        let single = res("2", "Sermon", "Romans", Some(8), None);
        assert!(matches_primary(&single, "Romans", 8));
        assert!(!matches_primary(&single, "Romans", 9));
    }

    #[test]
    fn primary_book_comparison_is_exact() {
        let r = res("1", "Sermon", "romans", Some(8), None);
        assert!(!matches_primary(&r, "Romans", 8));
    }

    #[test]
    fn secondary_matching() {
        let mut r = res("1", "Sermon", "Ephesians", Some(1), None);
        r.secondary_scripture = Some("Romans 8:28-9:5; 1corinthians 13, Job (varied chapters)".into());

        assert!(matches_secondary(&r, "Romans", 8));
        assert!(matches_secondary(&r, "Romans", 9));
        assert!(!matches_secondary(&r, "Romans", 10));
        assert!(matches_secondary(&r, "1 Corinthians", 13));
        assert!(matches_secondary(&r, "Job", 1));
        assert!(matches_secondary(&r, "Job", 42));
        assert!(!matches_secondary(&r, "John", 1));
        assert!(!matches_secondary(&r, "Ephesians", 1));
    }

    #[test]
    fn varied_chapters_only_matches_its_book() {
        let mut r = res("1", "Book", "Job", None, None);
        r.secondary_scripture = Some("Job (varied chapters)".into());
        for chapter in 1..=42 {
            assert!(matches_secondary(&r, "Job", chapter));
        }
        assert!(!matches_secondary(&r, "John", 1));
        assert!(!matches_secondary(&r, "Joel", 1));
    }

    #[test]
    fn blank_secondary_never_matches() {
        let mut r = res("1", "Book", "Job", None, None);
        r.secondary_scripture = Some("   ".into());
        assert!(!matches_secondary(&r, "Job", 1));
        r.secondary_scripture = Some("see notes".into());
        assert!(!matches_secondary(&r, "Job", 1));
    }

    #[test]
    fn author_only_mode() {
        let mut a = res("1", "Sermon", "John", Some(1), None);
        a.author = Some(" John Piper".into());
        let mut b = res("2", "Book", "Genesis", None, None);
        b.author = Some("Tim Keller".into());
        let c = res("3", "Video", "Mark", Some(2), None);
        let records = vec![a, b, c];

        let result = match_resources(&records, &Target::authors(["John Piper", "  "]));
        assert!(result.primary.is_empty());
        assert!(result.secondary.is_empty());
        assert_eq!(ids(&result.author_only.sermons), vec!["1"]);
        assert_eq!(result.author_only.len(), 1);
    }

    #[test]
    fn grouping_excludes_unknown_types() {
        let records = vec![
            res("1", "Sermons", "John", Some(3), None),
            res("2", "commentary", "John", None, None),
            res("3", "Podcast", "John", Some(3), None),
            res("4", "Video", "John", Some(1), Some(4)),
        ];
        let result = match_resources(&records, &Target::chapter("John", 3));
        let primary = &result.primary;
        assert_eq!(ids(&primary.sermons), vec!["1"]);
        assert_eq!(ids(&primary.commentaries), vec!["2"]);
        assert_eq!(ids(&primary.videos), vec!["4"]);
        assert_eq!(ids(&primary.unrecognized), vec!["3"]);
        assert_eq!(primary.len(), 3);

        let shown: Vec<_> = primary.iter().flat_map(|(_, list)| ids(list)).collect();
        assert!(!shown.contains(&"3".to_string()));

        let filtered = primary.filtered(&Filters::default(), SortOrder::Default);
        assert!(filtered.unrecognized.is_empty());
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn available_authors_are_trimmed_and_sorted() {
        let mut a = res("1", "Sermon", "John", None, None);
        a.author = Some("  Tim Keller ".into());
        let mut b = res("2", "Sermon", "John", None, None);
        b.author = Some("J.I. Packer".into());
        let mut c = res("3", "Sermon", "John", None, None);
        c.author = Some(String::new());
        let mut d = res("4", "Sermon", "John", None, None);
        d.author = Some("Tim Keller".into());

        let authors: Vec<_> = available_authors(&[a, b, c, d]).into_iter().collect();
        assert_eq!(authors, vec!["J.I. Packer", "Tim Keller"]);
    }
}
