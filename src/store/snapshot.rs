use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ResourceStore;
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::submission::PendingResource;

/// Store backed by a JSON export of the resources table (an array of rows).
///
/// Submissions are appended to a sibling `<name>.pending.json` file. Clones
/// share one write lock, so appends from concurrent tasks never overwrite
/// each other.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    pending_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Store reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path submissions are written to.
    pub fn pending_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map_or_else(|| "resources".to_string(), |s| s.to_string_lossy().into_owned());
        self.path.with_file_name(format!("{stem}.pending.json"))
    }
}

async fn read_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs_err::tokio::read_to_string(path)
        .await
        .map_err(|e| Error::io(e, path.to_path_buf()))?;
    serde_json::from_str(&content).map_err(|e| Error::parse(e.to_string(), path.to_path_buf()))
}

#[async_trait]
impl ResourceStore for JsonFileStore {
    async fn fetch_all(&self) -> Result<Vec<Resource>> {
        let resources: Vec<Resource> = read_array(&self.path).await?;
        tracing::debug!("Loaded {} resources from {}", resources.len(), self.path.display());
        Ok(resources)
    }

    async fn insert_pending(&self, submission: &PendingResource) -> Result<()> {
        let path = self.pending_path();
        // Held across the read-modify-write of the pending file
        let guard = self.pending_lock.lock().await;
        let mut pending: Vec<serde_json::Value> = if path.exists() {
            read_array(&path).await?
        } else {
            Vec::new()
        };
        pending.push(
            serde_json::to_value(submission).map_err(|e| Error::parse(e.to_string(), None))?,
        );
        let json = serde_json::to_string_pretty(&pending)
            .map_err(|e| Error::parse(e.to_string(), path.clone()))?;
        fs_err::tokio::write(&path, json)
            .await
            .map_err(|e| Error::io(e, path.clone()))?;
        drop(guard);
        tracing::info!("Queued \"{}\" in {}", submission.title, path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::submission::SubmissionForm;

    #[tokio::test]
    async fn reads_export_and_appends_submissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "title": "Romans Commentary", "type": "Commentary", "book": "Romans"},
                {"id": 2, "title": "Job Sermons", "type": "Sermon", "book": "Job", "chapter": 1}]"#,
        )
        .unwrap();

        let store = JsonFileStore::new(&path);
        let resources = store.fetch_all().await.unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1].chapter, Some(1));

        let form = SubmissionForm {
            title: "Hope in Romans 8".into(),
            kind: "Sermon".into(),
            scripture: "Romans 8:28-39".into(),
            url: "https://example.org/romans-8".into(),
            ..SubmissionForm::default()
        };
        let pending = form.into_pending().unwrap();
        store.insert_pending(&pending).await.unwrap();
        store.insert_pending(&pending).await.unwrap();

        let written: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(store.pending_path()).unwrap()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0]["book"], "Romans");
        assert_eq!(written[0]["chapter"], 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("resources.json")));

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let form = SubmissionForm {
                        title: format!("Sermon {i}"),
                        kind: "Sermon".into(),
                        scripture: format!("Psalms {}", i + 1),
                        url: "https://example.org/psalms".into(),
                        ..SubmissionForm::default()
                    };
                    store.insert_pending(&form.into_pending().unwrap()).await
                })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }

        let written: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(store.pending_path()).unwrap()).unwrap();
        assert_eq!(written.len(), 20);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let store = JsonFileStore::new("/definitely/not/here.json");
        assert!(matches!(store.fetch_all().await, Err(Error::Io { .. })));
    }

    #[test]
    fn pending_path_sits_next_to_snapshot() {
        let store = JsonFileStore::new("/data/export.json");
        assert_eq!(store.pending_path(), PathBuf::from("/data/export.pending.json"));
    }
}
