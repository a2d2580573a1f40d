//! Embedded database durable backend.
//!
//! Persists each metric as one row keyed by (name, kind). A persist is a
//! single transaction of upserts: either every metric in the snapshot
//! commits or none does, so a failed flush leaves the previously committed
//! rows untouched.

use crate::core::{MetricKind, MetrondError, Result, Snapshot};
use crate::storage::backend::DurableBackend;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;

/// Durable backend storing one row per metric in SQLite.
pub struct DatabaseBackend {
    conn: Mutex<Connection>,
}

impl DatabaseBackend {
    /// Open or create the database at the given path and initialize the
    /// schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            MetrondError::storage(format!(
                "failed to open database {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS metrics (
                name    TEXT NOT NULL,
                kind    TEXT NOT NULL,
                gauge   REAL,
                counter INTEGER,
                PRIMARY KEY (name, kind)
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS metrics (
                name    TEXT NOT NULL,
                kind    TEXT NOT NULL,
                gauge   REAL,
                counter INTEGER,
                PRIMARY KEY (name, kind)
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait::async_trait]
impl DurableBackend for DatabaseBackend {
    async fn persist(&self, snapshot: Snapshot) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        {
            let mut upsert_gauge = tx.prepare_cached(
                "INSERT INTO metrics (name, kind, gauge, counter)
                 VALUES (?1, ?2, ?3, NULL)
                 ON CONFLICT (name, kind) DO UPDATE SET gauge = excluded.gauge",
            )?;
            for (name, value) in &snapshot.gauges {
                upsert_gauge.execute(params![name, MetricKind::Gauge.as_str(), value])?;
            }

            let mut upsert_counter = tx.prepare_cached(
                "INSERT INTO metrics (name, kind, gauge, counter)
                 VALUES (?1, ?2, NULL, ?3)
                 ON CONFLICT (name, kind) DO UPDATE SET counter = excluded.counter",
            )?;
            for (name, value) in &snapshot.counters {
                upsert_counter.execute(params![name, MetricKind::Counter.as_str(), value])?;
            }
        }

        tx.commit()?;
        tracing::debug!(metrics = snapshot.len(), "snapshot persisted to database");
        Ok(())
    }

    async fn restore(&self) -> Result<Snapshot> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name, kind, gauge, counter FROM metrics")?;

        let mut snapshot = Snapshot::default();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let kind: String = row.get(1)?;
            match kind.as_str() {
                "gauge" => {
                    let value: f64 = row.get(2)?;
                    snapshot.gauges.insert(name, value);
                },
                "counter" => {
                    let value: i64 = row.get(3)?;
                    snapshot.counters.insert(name, value);
                },
                other => {
                    return Err(MetrondError::storage(format!(
                        "unknown metric kind '{}' in database row '{}'",
                        other, name
                    )))
                },
            }
        }

        tracing::info!(metrics = snapshot.len(), "snapshot restored from database");
        Ok(snapshot)
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    async fn shutdown(&self, snapshot: Snapshot) -> Result<()> {
        self.persist(snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.gauges.insert("Alloc".to_string(), 3407240.0);
        snapshot.gauges.insert("HeapIdle".to_string(), 3563520.0);
        snapshot.counters.insert("PollCount".to_string(), 42);
        snapshot
    }

    #[tokio::test]
    async fn test_restore_empty_database() {
        let backend = DatabaseBackend::open_in_memory().unwrap();
        assert!(backend.restore().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_restore_round_trip() {
        let backend = DatabaseBackend::open_in_memory().unwrap();
        backend.persist(sample()).await.unwrap();
        assert_eq!(backend.restore().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_rows() {
        let backend = DatabaseBackend::open_in_memory().unwrap();
        backend.persist(sample()).await.unwrap();

        let mut updated = sample();
        updated.gauges.insert("Alloc".to_string(), 1.0);
        updated.counters.insert("PollCount".to_string(), 43);
        backend.persist(updated.clone()).await.unwrap();

        assert_eq!(backend.restore().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_shared_name_across_kinds() {
        let backend = DatabaseBackend::open_in_memory().unwrap();
        let mut snapshot = Snapshot::default();
        snapshot.gauges.insert("X".to_string(), 1.5);
        snapshot.counters.insert("X".to_string(), 7);
        backend.persist(snapshot.clone()).await.unwrap();
        assert_eq!(backend.restore().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_ping() {
        let backend = DatabaseBackend::open_in_memory().unwrap();
        assert!(backend.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_persist_on_disk_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.db");

        {
            let backend = DatabaseBackend::open(&path).unwrap();
            backend.persist(sample()).await.unwrap();
        }

        let reopened = DatabaseBackend::open(&path).unwrap();
        assert_eq!(reopened.restore().await.unwrap(), sample());
    }
}
