use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::ResourceStore;
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::submission::PendingResource;

/// Store held in memory. Can be told to fail the next few fetches.
#[derive(Debug, Default)]
pub struct MemoryStore {
    resources: Mutex<Vec<Resource>>,
    pending: Mutex<Vec<PendingResource>>,
    failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryStore {
    /// Store holding `resources`.
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            resources: Mutex::new(resources),
            ..Self::default()
        }
    }

    /// Make the next `n` fetches fail with a network error.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Number of fetches attempted so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Submissions received so far.
    pub fn pending(&self) -> Vec<PendingResource> {
        self.pending.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<Resource>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::Network("memory store: simulated outage".into()));
        }
        self.resources
            .lock()
            .map(|r| r.clone())
            .map_err(|_| Error::store("memory store lock poisoned"))
    }

    async fn insert_pending(&self, submission: &PendingResource) -> Result<()> {
        self.pending
            .lock()
            .map(|mut p| p.push(submission.clone()))
            .map_err(|_| Error::store("memory store lock poisoned"))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
