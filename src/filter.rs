//! Filtering and sorting of resource lists.
//!
//! One function, [`apply`], serves every partition and every type bucket so
//! that all views agree on what passes and in which order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::resource::Resource;
use crate::types::{PriceBucket, ResourceType, SortOrder};

/// Active filter state. Each dimension must pass for a record to be kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Allowed types. Defaults to all five ("All Types"); an empty set
    /// admits nothing.
    pub types: BTreeSet<ResourceType>,
    /// Allowed authors (trimmed). Empty means "All Authors".
    pub authors: BTreeSet<String>,
    /// Allowed price buckets. Empty means any price.
    pub price: BTreeSet<PriceBucket>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            types: ResourceType::all().iter().copied().collect(),
            authors: BTreeSet::new(),
            price: BTreeSet::new(),
        }
    }
}

impl Filters {
    /// Whether `resource` passes every active dimension.
    pub fn matches(&self, resource: &Resource) -> bool {
        self.type_matches(resource) && self.author_matches(resource) && self.price_matches(resource)
    }

    fn type_matches(&self, resource: &Resource) -> bool {
        let kind = resource.resource_type();
        kind != ResourceType::Unknown && self.types.contains(&kind)
    }

    fn author_matches(&self, resource: &Resource) -> bool {
        self.authors.is_empty()
            || resource.author_name().is_some_and(|a| self.authors.contains(a))
    }

    fn price_matches(&self, resource: &Resource) -> bool {
        self.price.is_empty() || self.price.contains(&resource.price_bucket())
    }

    /// Toggle a type on or off.
    pub fn toggle_type(&mut self, kind: ResourceType) {
        if !self.types.remove(&kind) {
            self.types.insert(kind);
        }
    }

    /// Toggle an author on or off.
    pub fn toggle_author(&mut self, author: &str) {
        let author = author.trim();
        if !self.authors.remove(author) {
            self.authors.insert(author.to_string());
        }
    }

    /// Toggle a price bucket on or off.
    pub fn toggle_price(&mut self, bucket: PriceBucket) {
        if !self.price.remove(&bucket) {
            self.price.insert(bucket);
        }
    }

    /// Select every type.
    pub fn select_all_types(&mut self) {
        self.types = ResourceType::all().iter().copied().collect();
    }

    /// Clear the author filter ("All Authors").
    pub fn clear_authors(&mut self) {
        self.authors.clear();
    }

    /// Reset to the default state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Filter `records` and order them by `sort`. The sort is stable; ties
/// keep their input order.
pub fn apply<'a, I>(records: I, filters: &Filters, sort: SortOrder) -> Vec<&'a Resource>
where
    I: IntoIterator<Item = &'a Resource>,
{
    let mut kept: Vec<&Resource> = records.into_iter().filter(|r| filters.matches(r)).collect();
    sort_resources(&mut kept, sort);
    kept
}

/// Stable in-place sort by `order`.
pub fn sort_resources(records: &mut [&Resource], order: SortOrder) {
    match order {
        SortOrder::Default => {}
        SortOrder::Alphabetical => records.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortOrder::Newest => records.sort_by_key(|r| std::cmp::Reverse(year(r))),
        SortOrder::Oldest => records.sort_by_key(|r| year(r)),
        SortOrder::Scripture => records.sort_by_key(|r| {
            (r.chapter.unwrap_or(0), r.verse_start.unwrap_or(0))
        }),
    }
}

fn year(r: &Resource) -> i32 {
    r.published_year.unwrap_or(0)
}

/// Case-insensitive title comparison that ignores leading punctuation and
/// diacritics, approximating a locale collation.
fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

fn collation_key(title: &str) -> String {
    let mut key = String::with_capacity(title.len());
    let letters = title
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase);
    // Letters with no decomposition, spelled the way a collator orders them
    for c in letters {
        match c {
            'ł' => key.push('l'),
            'ø' => key.push('o'),
            'đ' | 'ð' => key.push('d'),
            'ħ' => key.push('h'),
            'ı' => key.push('i'),
            'œ' => key.push_str("oe"),
            'æ' => key.push_str("ae"),
            'ß' => key.push_str("ss"),
            'þ' => key.push_str("th"),
            other => key.push(other),
        }
    }
    key
}
