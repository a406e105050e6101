//! Browsing session state.
//!
//! A session turns the visitor's selection into fetches, and fetched records
//! into filtered views. Fetches run on the tokio runtime and report back over
//! a channel; each one carries the generation it was started in, and only
//! the newest generation is allowed to replace what the session shows.

use std::collections::BTreeSet;
use std::sync::Arc;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use tokio::sync::mpsc;

use crate::catalog;
use crate::constants::browse::{CHANNEL_BUFFER_SIZE, MAX_AUTHOR_SUGGESTIONS, MIN_AUTHOR_SCORE};
use crate::error::Result;
use crate::filter::Filters;
use crate::matching::{available_authors, match_resources, MatchResult, Target};
use crate::resource::Resource;
use crate::store::ResourceStore;
use crate::types::SortOrder;

/// What the visitor has picked in the book, chapter and author controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected book, as shown in the picker.
    pub book: Option<String>,
    /// Selected chapter.
    pub chapter: Option<u32>,
    /// Selected authors.
    pub authors: BTreeSet<String>,
}

impl Selection {
    /// A book and chapter.
    pub fn chapter(book: impl Into<String>, chapter: u32) -> Self {
        Self {
            book: Some(book.into()),
            chapter: Some(chapter),
            authors: BTreeSet::new(),
        }
    }

    /// A chapter page addressed by URL slug, e.g. `("1-corinthians", 13)`.
    pub fn from_slug(slug: &str, chapter: u32) -> Option<Self> {
        catalog::slug_to_book(slug).map(|book| Self::chapter(book, chapter))
    }

    /// Authors only.
    pub fn authors<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            authors: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            ..Self::default()
        }
    }

    /// The match target, if the selection names one.
    ///
    /// A full book and chapter wins. Without one, selected authors switch
    /// the session to author-only browsing.
    pub fn target(&self) -> Option<Target> {
        match (&self.book, self.chapter) {
            (Some(book), Some(chapter)) => {
                let book = catalog::resolve_book(book).map_or_else(|| book.clone(), |b| b.name.to_string());
                Some(Target::chapter(book, chapter))
            }
            _ if !self.authors.is_empty() => Some(Target::Authors(self.authors.clone())),
            _ => None,
        }
    }

    /// Whether the selection is empty enough that shown results should go.
    /// A book without a chapter keeps whatever is on screen.
    pub fn clears_results(&self) -> bool {
        self.book.is_none() && self.authors.is_empty()
    }
}

/// Message sent from fetch tasks back to the session.
#[derive(Debug)]
pub enum BrowseUpdate {
    /// A fetch finished.
    Loaded {
        /// Generation the fetch was started in.
        generation: u64,
        /// Target the fetch was started for.
        target: Target,
        /// Fetched records, or why the fetch failed.
        result: Result<Vec<Resource>>,
    },
}

/// The records currently on screen and the target they were matched for.
#[derive(Debug, Clone)]
struct Shown {
    target: Target,
    records: Vec<Resource>,
}

/// Browsing session.
pub struct BrowseSession {
    store: Arc<dyn ResourceStore>,
    tx: mpsc::Sender<BrowseUpdate>,
    rx: mpsc::Receiver<BrowseUpdate>,
    generation: u64,
    shown: Option<Shown>,
    /// Active filters, applied to every partition.
    pub filters: Filters,
    /// Active sort order.
    pub sort: SortOrder,
    /// Every distinct author in the last fetched collection.
    pub available_authors: BTreeSet<String>,
    /// Whether a fetch for the newest generation is running.
    pub is_loading: bool,
    /// Error from the last failed fetch, until dismissed.
    pub error_message: Option<String>,
}

impl BrowseSession {
    /// New session reading from `store`.
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            store,
            tx,
            rx,
            generation: 0,
            shown: None,
            filters: Filters::default(),
            sort: SortOrder::Default,
            available_authors: BTreeSet::new(),
            is_loading: false,
            error_message: None,
        }
    }

    /// Current generation; bumped on every selection change.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Target of the results on screen.
    pub fn current_target(&self) -> Option<&Target> {
        self.shown.as_ref().map(|l| &l.target)
    }

    /// React to a selection change. Returns the generation of the fetch that
    /// was started, if any. Timeouts and retries belong to the store, which
    /// applies them per request.
    pub fn select(&mut self, selection: &Selection) -> Option<u64> {
        let Some(target) = selection.target() else {
            if selection.clears_results() {
                self.generation += 1;
                self.shown = None;
                self.is_loading = false;
            }
            return None;
        };

        self.generation += 1;
        let generation = self.generation;
        self.is_loading = true;
        self.error_message = None;

        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = store.fetch_all().await;
            if tx.send(BrowseUpdate::Loaded { generation, target, result }).await.is_err() {
                tracing::debug!("Browse session dropped before fetch {generation} finished");
            }
        });
        Some(generation)
    }

    /// Apply every finished fetch without waiting.
    pub fn handle_updates(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(update) => {
                    self.apply(update);
                }
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
    }

    /// Wait for the next finished fetch and apply it. Returns whether it was
    /// current; stale results are discarded.
    pub async fn wait_for_update(&mut self) -> bool {
        match self.rx.recv().await {
            Some(update) => self.apply(update),
            None => false,
        }
    }

    /// Wait until the newest fetch has been applied.
    pub async fn settle(&mut self) {
        while self.is_loading {
            let Some(update) = self.rx.recv().await else {
                break;
            };
            self.apply(update);
        }
    }

    fn apply(&mut self, update: BrowseUpdate) -> bool {
        let BrowseUpdate::Loaded { generation, target, result } = update;
        if generation != self.generation {
            tracing::warn!(
                "Discarding stale fetch {generation} (current is {})",
                self.generation
            );
            return false;
        }

        self.is_loading = false;
        match result {
            Ok(records) => {
                self.available_authors = available_authors(&records);
                self.shown = Some(Shown { target, records });
            }
            Err(e) => {
                self.error_message = Some(format!("Error fetching resources: {e}"));
            }
        }
        true
    }

    /// Clear the error message.
    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }

    /// Matched, filtered and sorted results for what is on screen.
    pub fn view(&self) -> Option<MatchResult<'_>> {
        let shown = self.shown.as_ref()?;
        let sort = match (&shown.target, self.sort) {
            // Records span books, so chapter order means nothing
            (Target::Authors(_), SortOrder::Scripture) => SortOrder::Default,
            (_, sort) => sort,
        };
        Some(match_resources(&shown.records, &shown.target).filtered(&self.filters, sort))
    }

    /// Author picker suggestions. Substring matches come first in name
    /// order, then fuzzy matches by score.
    pub fn search_authors(&self, query: &str) -> Vec<&str> {
        let query = query.trim();
        if query.is_empty() {
            return self
                .available_authors
                .iter()
                .map(String::as_str)
                .take(MAX_AUTHOR_SUGGESTIONS)
                .collect();
        }

        let needle = query.to_lowercase();
        let (mut hits, rest): (Vec<&str>, Vec<&str>) = self
            .available_authors
            .iter()
            .map(String::as_str)
            .partition(|name| name.to_lowercase().contains(&needle));

        let matcher = SkimMatcherV2::default();
        let mut fuzzy: Vec<(i64, &str)> = rest
            .into_iter()
            .filter_map(|name| matcher.fuzzy_match(name, query).map(|score| (score, name)))
            .filter(|(score, _)| *score >= MIN_AUTHOR_SCORE)
            .collect();
        fuzzy.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        hits.extend(fuzzy.into_iter().map(|(_, name)| name));
        hits.truncate(MAX_AUTHOR_SUGGESTIONS);
        hits
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::error::Error;
    use crate::store::{with_retry, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use crate::submission::PendingResource;
    use crate::types::ResourceType;
    use async_trait::async_trait;

    fn record(id: &str, title: &str, kind: &str, book: &str, chapter: Option<u32>, author: &str) -> Resource {
        let mut r = Resource::new(id, title, kind, book);
        r.chapter = chapter;
        r.author = Some(author.to_string());
        r
    }

    fn library() -> Vec<Resource> {
        vec![
            record("1", "Romans 8 Sermon", "Sermon", "Romans", Some(8), "John Piper"),
            record("2", "Romans Commentary", "Commentary", "Romans", None, "Douglas Moo"),
            record("3", "Genesis Sermon", "Sermon", "Genesis", Some(1), "John Piper"),
            record("4", "Psalms Devotional", "Devotional", "Psalms", Some(23), " "),
        ]
    }

    /// Store that answers after a delay, so later fetches can overtake it.
    struct SlowStore {
        delay: Duration,
        records: Vec<Resource>,
    }

    #[async_trait]
    impl ResourceStore for SlowStore {
        async fn fetch_all(&self) -> Result<Vec<Resource>> {
            tokio::time::sleep(self.delay).await;
            Ok(self.records.clone())
        }

        async fn insert_pending(&self, _submission: &PendingResource) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    /// Store whose first attempt overruns its per-attempt timeout.
    struct FlakyStore {
        attempt_timeout: Duration,
        calls: AtomicUsize,
        records: Vec<Resource>,
    }

    #[async_trait]
    impl ResourceStore for FlakyStore {
        async fn fetch_all(&self) -> Result<Vec<Resource>> {
            with_retry(1, "flaky fetch", || async {
                let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
                let delay = if attempt == 0 { Duration::from_millis(500) } else { Duration::ZERO };
                tokio::time::timeout(self.attempt_timeout, tokio::time::sleep(delay))
                    .await
                    .map_err(|_| Error::Network(format!("timed out after {:?}", self.attempt_timeout)))?;
                Ok::<_, Error>(self.records.clone())
            })
            .await
        }

        async fn insert_pending(&self, _submission: &PendingResource) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn selection_targets() {
        assert_eq!(
            Selection::chapter("Romans", 8).target(),
            Some(Target::chapter("Romans", 8))
        );
        assert_eq!(
            Selection::from_slug("1-corinthians", 13).unwrap().target(),
            Some(Target::chapter("1 Corinthians", 13))
        );

        let mut book_only = Selection { book: Some("Romans".into()), ..Selection::default() };
        assert_eq!(book_only.target(), None);
        assert!(!book_only.clears_results());

        book_only.authors.insert("John Piper".into());
        assert!(book_only.target().unwrap().is_author_only());

        assert_eq!(Selection::default().target(), None);
        assert!(Selection::default().clears_results());
        assert_eq!(Selection::authors(["  "]).target(), None);
    }

    #[tokio::test]
    async fn loads_and_filters_chapter() {
        let store = Arc::new(MemoryStore::new(library()));
        let mut session = BrowseSession::new(store);

        assert!(session.select(&Selection::chapter("Romans", 8)).is_some());
        assert!(session.is_loading);
        session.settle().await;
        assert!(!session.is_loading);

        let view = session.view().unwrap();
        assert_eq!(view.primary.len(), 2);
        assert_eq!(
            session.available_authors.iter().collect::<Vec<_>>(),
            ["Douglas Moo", "John Piper"]
        );

        session.filters.toggle_type(ResourceType::Commentary);
        let view = session.view().unwrap();
        assert_eq!(view.primary.sermons.len(), 1);
        assert!(view.primary.commentaries.is_empty());
    }

    #[tokio::test]
    async fn author_mode_ignores_scripture_sort() {
        let store = Arc::new(MemoryStore::new(library()));
        let mut session = BrowseSession::new(store);
        session.sort = SortOrder::Scripture;

        session.select(&Selection::authors(["John Piper"]));
        session.settle().await;

        let view = session.view().unwrap();
        let titles: Vec<_> = view.author_only.sermons.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Romans 8 Sermon", "Genesis Sermon"]);
        assert!(view.primary.is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_results() {
        let store = Arc::new(MemoryStore::new(library()));
        let handle = Arc::clone(&store);
        let mut session = BrowseSession::new(handle);

        session.select(&Selection::chapter("Romans", 8));
        session.settle().await;

        store.fail_next(1);
        session.select(&Selection::chapter("Genesis", 1));
        session.settle().await;

        let message = session.error_message.clone().unwrap();
        assert!(message.starts_with("Error fetching resources:"));
        assert_eq!(session.current_target(), Some(&Target::chapter("Romans", 8)));
        assert_eq!(session.view().unwrap().primary.len(), 2);

        session.dismiss_error();
        assert!(session.error_message.is_none());
    }

    #[tokio::test]
    async fn stale_fetch_is_discarded() {
        let slow = Arc::new(SlowStore { delay: Duration::from_millis(200), records: library() });
        let mut session = BrowseSession::new(slow);
        let first = session.select(&Selection::chapter("Romans", 8)).unwrap();

        session.store = Arc::new(MemoryStore::new(library()));
        let second = session.select(&Selection::chapter("Genesis", 1)).unwrap();
        assert!(second > first);

        assert!(session.wait_for_update().await);
        assert_eq!(session.current_target(), Some(&Target::chapter("Genesis", 1)));

        assert!(!session.wait_for_update().await);
        assert_eq!(session.current_target(), Some(&Target::chapter("Genesis", 1)));
    }

    #[tokio::test]
    async fn store_retry_runs_after_a_timed_out_attempt() {
        let store = Arc::new(FlakyStore {
            attempt_timeout: Duration::from_millis(100),
            calls: AtomicUsize::new(0),
            records: library(),
        });
        let handle = Arc::clone(&store);
        let mut session = BrowseSession::new(handle);
        session.select(&Selection::chapter("Romans", 8));
        session.settle().await;

        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.error_message, None);
        assert_eq!(session.view().unwrap().primary.len(), 2);
    }

    #[tokio::test]
    async fn clearing_selection_drops_results() {
        let store = Arc::new(MemoryStore::new(library()));
        let handle = Arc::clone(&store);
        let mut session = BrowseSession::new(handle);
        session.select(&Selection::chapter("Romans", 8));
        session.settle().await;

        let book_only = Selection { book: Some("Romans".into()), ..Selection::default() };
        assert_eq!(session.select(&book_only), None);
        assert!(session.view().is_some());

        assert_eq!(session.select(&Selection::default()), None);
        assert!(session.view().is_none());
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn handle_updates_applies_finished_fetches() {
        let store = Arc::new(MemoryStore::new(library()));
        let mut session = BrowseSession::new(store);
        session.handle_updates();
        assert!(session.view().is_none());

        session.select(&Selection::chapter("Genesis", 1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.handle_updates();
        assert!(!session.is_loading);
        assert_eq!(session.view().unwrap().primary.sermons.len(), 1);
    }

    #[tokio::test]
    async fn author_search() {
        let store = Arc::new(MemoryStore::new(library()));
        let mut session = BrowseSession::new(store);
        session.select(&Selection::chapter("Romans", 8));
        session.settle().await;

        assert_eq!(session.search_authors("piper"), ["John Piper"]);
        assert_eq!(session.search_authors("dmoo"), ["Douglas Moo"]);
        assert_eq!(session.search_authors("").len(), 2);
        assert!(session.search_authors("zzzz").is_empty());
    }
}
