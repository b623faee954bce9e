//! Metric registry shared between the collector and the protocol server
//!
//! The collector never mutates the snapshot a reader holds: every write
//! produces a new [`MetricSnapshot`] that replaces the published one in a
//! single reference swap. A reader therefore always sees every metric of a
//! part from the same tick.

use crate::core::{MetricKind, Part};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A complete point-in-time view of every metric
#[derive(Debug, Clone, Serialize)]
pub struct MetricSnapshot {
    parts: BTreeMap<Part, BTreeMap<MetricKind, f32>>,
    /// Unix timestamp (ms) of the refresh that produced this snapshot
    collected_at: Option<i64>,
}

impl MetricSnapshot {
    /// Snapshot with the default schema, every metric at 0.0
    pub fn new() -> Self {
        let parts = Part::ALL
            .iter()
            .map(|&part| {
                let metrics = part
                    .default_metrics()
                    .iter()
                    .map(|&metric| (metric, 0.0))
                    .collect();
                (part, metrics)
            })
            .collect();

        Self {
            parts,
            collected_at: None,
        }
    }

    /// Value of a metric, 0.0 if it was never observed
    pub fn get(&self, part: Part, metric: MetricKind) -> f32 {
        self.parts
            .get(&part)
            .and_then(|metrics| metrics.get(&metric))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, part: Part, metric: MetricKind, value: f32) {
        self.parts.entry(part).or_default().insert(metric, value);
    }

    /// All metrics of one part
    pub fn part(&self, part: Part) -> Option<&BTreeMap<MetricKind, f32>> {
        self.parts.get(&part)
    }

    /// Every metric, keyed by part
    pub fn metrics(&self) -> &BTreeMap<Part, BTreeMap<MetricKind, f32>> {
        &self.parts
    }

    pub fn collected_at(&self) -> Option<i64> {
        self.collected_at
    }

    pub fn mark_collected(&mut self) {
        self.collected_at = Some(chrono::Utc::now().timestamp_millis());
    }
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe holder of the current [`MetricSnapshot`]
pub struct MetricStore {
    current: RwLock<Arc<MetricSnapshot>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(MetricSnapshot::new())),
        }
    }

    pub fn get(&self, part: Part, metric: MetricKind) -> f32 {
        self.current.read().get(part, metric)
    }

    /// Overwrite a single metric
    ///
    /// Snapshots already handed out to readers are left untouched.
    pub fn set(&self, part: Part, metric: MetricKind, value: f32) {
        let mut current = self.current.write();
        Arc::make_mut(&mut current).set(part, metric, value);
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<MetricSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replace the published snapshot in one swap
    pub fn publish(&self, snapshot: MetricSnapshot) {
        *self.current.write() = Arc::new(snapshot);
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}
