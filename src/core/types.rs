//! Core domain types for metric ingestion and storage.
//!
//! The wire contract is intentionally small: an update carries a name, a
//! kind discriminator, and exactly one of a gauge value or a counter delta,
//! plus an optional integrity hash.

use crate::core::{MetrondError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The two supported metric kinds.
///
/// Gauges are last-write-wins instantaneous measurements; counters are
/// monotonically-accumulating values written as additive deltas. The two
/// kinds live in disjoint namespaces, so a gauge and a counter may share
/// a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    /// String discriminator used on the wire and in durable storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl FromStr for MetricKind {
    type Err = MetrondError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(MetrondError::UnsupportedKind(other.to_string())),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single inbound metric update.
///
/// The kind is carried as a raw string so that an unknown kind is reported
/// as an unsupported-kind error by the gateway instead of failing JSON
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricUpdate {
    /// Metric name, unique within its kind namespace.
    pub id: String,
    /// Kind discriminator, "gauge" or "counter".
    #[serde(rename = "type")]
    pub kind: String,
    /// Gauge value, present iff kind is "gauge".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Counter delta, present iff kind is "counter".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    /// Optional keyed hash of the update, hex-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl MetricUpdate {
    /// Build a gauge update.
    pub fn gauge<S: Into<String>>(id: S, value: f64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Gauge.as_str().to_string(),
            value: Some(value),
            delta: None,
            hash: None,
        }
    }

    /// Build a counter update.
    pub fn counter<S: Into<String>>(id: S, delta: i64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Counter.as_str().to_string(),
            value: None,
            delta: Some(delta),
            hash: None,
        }
    }

    /// Attach an integrity hash.
    pub fn with_hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Validate the update shape and resolve its kind.
    ///
    /// Exactly one of value/delta must be populated, matching the kind;
    /// anything else is a malformed update.
    pub fn validate(&self) -> Result<MetricKind> {
        if self.id.is_empty() {
            return Err(MetrondError::validation("metric name must not be empty"));
        }

        let kind = MetricKind::from_str(&self.kind)?;
        match kind {
            MetricKind::Gauge => {
                if self.value.is_none() {
                    return Err(MetrondError::validation(format!(
                        "gauge '{}' is missing a value",
                        self.id
                    )));
                }
                if self.delta.is_some() {
                    return Err(MetrondError::validation(format!(
                        "gauge '{}' must not carry a delta",
                        self.id
                    )));
                }
            },
            MetricKind::Counter => {
                if self.delta.is_none() {
                    return Err(MetrondError::validation(format!(
                        "counter '{}' is missing a delta",
                        self.id
                    )));
                }
                if self.value.is_some() {
                    return Err(MetrondError::validation(format!(
                        "counter '{}' must not carry a value",
                        self.id
                    )));
                }
            },
        }

        Ok(kind)
    }
}

/// Atomic bulk view of the store: all gauges and counters at one instant.
///
/// Used both for periodic persistence and for restore at startup. Equality
/// is map equality, which makes round-trip assertions in tests direct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Gauge name to last written value.
    pub gauges: HashMap<String, f64>,
    /// Counter name to accumulated value.
    pub counters: HashMap<String, i64>,
}

impl Snapshot {
    /// True when neither namespace holds any metric.
    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty() && self.counters.is_empty()
    }

    /// Total number of metrics across both namespaces.
    pub fn len(&self) -> usize {
        self.gauges.len() + self.counters.len()
    }
}
