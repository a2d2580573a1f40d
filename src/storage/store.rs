//! In-memory metric store.
//!
//! The authoritative mapping of gauge and counter values. The two kind
//! namespaces are guarded by independent reader-writer locks so an
//! unrelated gauge read is never blocked by a counter write. Lock order
//! is fixed (gauges, then counters) everywhere both are taken.

use crate::core::Snapshot;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Concurrent last-value store for gauges and counters.
#[derive(Debug, Default)]
pub struct MetricStore {
    gauges: RwLock<HashMap<String, f64>>,
    counters: RwLock<HashMap<String, i64>>,
}

impl MetricStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a restored snapshot.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            gauges: RwLock::new(snapshot.gauges),
            counters: RwLock::new(snapshot.counters),
        }
    }

    /// Overwrite a gauge value (last-write-wins).
    pub fn put_gauge(&self, name: &str, value: f64) {
        self.gauges.write().insert(name.to_string(), value);
    }

    /// Add a delta to a counter, creating the entry at the delta if absent.
    ///
    /// Negative deltas are accepted: they are a client-side error the
    /// engine does not police, matching the agent protocol. Returns the
    /// accumulated value after the merge.
    pub fn add_counter(&self, name: &str, delta: i64) -> i64 {
        let mut counters = self.counters.write();
        let entry = counters.entry(name.to_string()).or_insert(0);
        *entry = entry.wrapping_add(delta);
        *entry
    }

    /// Current gauge value, if the gauge exists.
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.read().get(name).copied()
    }

    /// Current counter value, if the counter exists.
    pub fn counter(&self, name: &str) -> Option<i64> {
        self.counters.read().get(name).copied()
    }

    /// Capture both namespaces atomically with respect to each other.
    ///
    /// Both locks are held for the duration of the copy, so a snapshot
    /// never shows a later write while missing an earlier one from the
    /// same submitter. Entries are copied out before release; callers
    /// never iterate under the locks.
    pub fn snapshot(&self) -> Snapshot {
        let gauges = self.gauges.read();
        let counters = self.counters.read();
        Snapshot {
            gauges: gauges.clone(),
            counters: counters.clone(),
        }
    }

    /// Replace both namespaces wholesale from a snapshot.
    ///
    /// Used only for startup recovery, never during normal operation, so
    /// holding both write locks for the duration is fine.
    pub fn restore(&self, snapshot: Snapshot) {
        let mut gauges = self.gauges.write();
        let mut counters = self.counters.write();
        *gauges = snapshot.gauges;
        *counters = snapshot.counters;
    }

    /// Number of metrics across both namespaces.
    pub fn len(&self) -> usize {
        self.gauges.read().len() + self.counters.read().len()
    }

    /// True when no metric is stored.
    pub fn is_empty(&self) -> bool {
        self.gauges.read().is_empty() && self.counters.read().is_empty()
    }
}
