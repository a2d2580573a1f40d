//! File-based durable backend.
//!
//! Serializes the full snapshot to one JSON object, overwritten wholesale
//! on each persist. The write goes to a temporary sibling file first and
//! is renamed into place, so a failed flush never corrupts the previous
//! durable copy.

use crate::core::{MetrondError, Result, Snapshot};
use crate::storage::backend::DurableBackend;
use std::path::{Path, PathBuf};

/// Durable backend writing whole-snapshot JSON files.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend writing to the given path. The parent directory
    /// must exist.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait::async_trait]
impl DurableBackend for FileBackend {
    async fn persist(&self, snapshot: Snapshot) -> Result<()> {
        let body = serde_json::to_vec(&snapshot)?;
        let tmp = self.tmp_path();

        tokio::fs::write(&tmp, &body).await.map_err(|e| {
            MetrondError::storage(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            MetrondError::storage(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            metrics = snapshot.len(),
            "snapshot persisted to file"
        );
        Ok(())
    }

    async fn restore(&self) -> Result<Snapshot> {
        let body = match tokio::fs::read(&self.path).await {
            Ok(body) => body,
            // First run: nothing persisted yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot file, starting empty");
                return Ok(Snapshot::default());
            },
            Err(e) => {
                return Err(MetrondError::storage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            },
        };

        let snapshot: Snapshot = serde_json::from_slice(&body)?;
        tracing::info!(
            path = %self.path.display(),
            metrics = snapshot.len(),
            "snapshot restored from file"
        );
        Ok(snapshot)
    }

    async fn ping(&self) -> Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                tokio::fs::metadata(dir).await.map_err(|e| {
                    MetrondError::storage(format!("store directory unavailable: {}", e))
                })?;
                Ok(())
            },
            _ => Ok(()),
        }
    }

    async fn shutdown(&self, snapshot: Snapshot) -> Result<()> {
        self.persist(snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_restore_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("db.json"));
        let snapshot = backend.restore().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_persist_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("db.json"));

        let mut snapshot = Snapshot::default();
        snapshot.gauges.insert("Alloc".to_string(), 100.5);
        snapshot.counters.insert("PollCount".to_string(), 42);

        backend.persist(snapshot.clone()).await.unwrap();
        assert_eq!(backend.restore().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_restore_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("db.json"));

        let mut snapshot = Snapshot::default();
        snapshot.counters.insert("PollCount".to_string(), 7);
        backend.persist(snapshot).await.unwrap();

        let first = backend.restore().await.unwrap();
        let second = backend.restore().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_persist_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("db.json"));

        let mut old = Snapshot::default();
        old.gauges.insert("Old".to_string(), 1.0);
        backend.persist(old).await.unwrap();

        let mut new = Snapshot::default();
        new.gauges.insert("New".to_string(), 2.0);
        backend.persist(new.clone()).await.unwrap();

        assert_eq!(backend.restore().await.unwrap(), new);
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let backend = FileBackend::new(&path);

        backend.persist(Snapshot::default()).await.unwrap();
        assert!(path.exists());
        assert!(!backend.tmp_path().exists());
    }
}
