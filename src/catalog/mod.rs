//! Canonical book catalog, book-name normalization and URL slugs.

mod books;

use std::collections::HashMap;

use lazy_static::lazy_static;

use books::{ABBREVIATIONS, BIBLE_BOOKS};

/// A canonical book of the Bible and its chapter count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Book {
    /// Canonical display name (e.g. "1 Corinthians").
    pub name: &'static str,
    /// Number of chapters, always positive.
    pub chapters: u32,
}

impl Book {
    const fn new(name: &'static str, chapters: u32) -> Self {
        Self { name, chapters }
    }

    /// URL slug for this book (e.g. "song-of-solomon").
    pub fn slug(&self) -> String {
        book_to_slug(self.name)
    }

    /// Whether `chapter` exists in this book.
    pub const fn has_chapter(&self, chapter: u32) -> bool {
        chapter >= 1 && chapter <= self.chapters
    }
}

lazy_static! {
    /// Normalized name or abbreviation -> catalog index
    static ref BOOK_INDEX: HashMap<String, usize> = {
        let mut m = HashMap::new();
        for (idx, book) in BIBLE_BOOKS.iter().enumerate() {
            m.insert(normalize_book_name(book.name), idx);
        }
        for (alias, canonical) in ABBREVIATIONS {
            if let Some(idx) = BIBLE_BOOKS.iter().position(|b| b.name == *canonical) {
                m.insert((*alias).to_string(), idx);
            }
        }
        m
    };
}

/// All books in canonical order.
pub fn books() -> &'static [Book] {
    &BIBLE_BOOKS
}

/// Look up a book by its exact canonical name.
pub fn find(name: &str) -> Option<&'static Book> {
    BIBLE_BOOKS.iter().find(|b| b.name == name)
}

/// Chapter count for an exact canonical name.
pub fn chapter_count(name: &str) -> Option<u32> {
    find(name).map(|b| b.chapters)
}

/// Normalize a book name for comparison: lowercase, single spaces, and a
/// single space after a leading numeral ("1corinthians" -> "1 corinthians").
pub fn normalize_book_name(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let digits = collapsed.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && digits < collapsed.len() && !collapsed[digits..].starts_with(' ') {
        format!("{} {}", &collapsed[..digits], &collapsed[digits..])
    } else {
        collapsed
    }
}

/// Resolve free text (canonical name, odd casing/spacing, or a common
/// abbreviation such as "Rom" or "1 Cor") to a catalog entry.
pub fn resolve_book(text: &str) -> Option<&'static Book> {
    let key = normalize_book_name(text.trim_end_matches('.'));
    BOOK_INDEX.get(&key).map(|&idx| &BIBLE_BOOKS[idx])
}

/// Convert a book name to its URL slug: lowercase, spaces to hyphens, other
/// punctuation dropped.
pub fn book_to_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Resolve a URL slug back to the canonical book name.
pub fn slug_to_book(slug: &str) -> Option<&'static str> {
    BIBLE_BOOKS.iter().find(|b| b.slug() == slug).map(|b| b.name)
}

/// The book after `name` in canonical order.
pub fn next_book(name: &str) -> Option<&'static Book> {
    let idx = BIBLE_BOOKS.iter().position(|b| b.name == name)?;
    BIBLE_BOOKS.get(idx + 1)
}

/// The book before `name` in canonical order.
pub fn previous_book(name: &str) -> Option<&'static Book> {
    let idx = BIBLE_BOOKS.iter().position(|b| b.name == name)?;
    idx.checked_sub(1).and_then(|i| BIBLE_BOOKS.get(i))
}

/// Previous and next chapter within the same book, for chapter page
/// navigation. Unknown books are treated as having a single chapter.
pub fn adjacent_chapters(name: &str, chapter: u32) -> (Option<u32>, Option<u32>) {
    let total = chapter_count(name).unwrap_or(1);
    let prev = (chapter > 1).then(|| chapter - 1);
    let next = (chapter < total).then(|| chapter + 1);
    (prev, next)
}
