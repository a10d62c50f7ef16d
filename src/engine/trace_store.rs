//! Per-subject raw trace storage.
//!
//! Holds the fixes for each subject of a batch run. Each subject's trace is
//! processed independently, so the store is plain owned data with no
//! interior mutability.

use std::collections::HashMap;

use crate::geo_utils::compute_bounds;
use crate::{Bounds, Fix};

/// Storage for per-subject GPS fixes.
#[derive(Debug, Default)]
pub struct TraceStore {
    traces: HashMap<String, Vec<Fix>>,
}

impl TraceStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            traces: HashMap::new(),
        }
    }

    /// Add (or replace) a subject's trace.
    pub fn add(&mut self, subject_id: String, fixes: Vec<Fix>) {
        self.traces.insert(subject_id, fixes);
    }

    /// Append fixes to a subject's trace, creating it if absent.
    pub fn append(&mut self, subject_id: &str, fixes: impl IntoIterator<Item = Fix>) {
        self.traces
            .entry(subject_id.to_string())
            .or_default()
            .extend(fixes);
    }

    /// Remove a subject's trace, returning it if present.
    pub fn remove(&mut self, subject_id: &str) -> Option<Vec<Fix>> {
        self.traces.remove(subject_id)
    }

    /// Get a subject's fixes.
    pub fn get(&self, subject_id: &str) -> Option<&[Fix]> {
        self.traces.get(subject_id).map(|f| f.as_slice())
    }

    /// Whether a subject exists.
    pub fn contains(&self, subject_id: &str) -> bool {
        self.traces.contains_key(subject_id)
    }

    /// All subject IDs, sorted for deterministic iteration.
    pub fn subject_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.traces.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Bounding box of a subject's trace.
    pub fn bounds(&self, subject_id: &str) -> Option<Bounds> {
        self.traces.get(subject_id).and_then(|f| compute_bounds(f))
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Drain all traces as `(subject_id, fixes)` pairs, sorted by subject.
    pub fn into_traces(self) -> Vec<(String, Vec<Fix>)> {
        let mut traces: Vec<(String, Vec<Fix>)> = self.traces.into_iter().collect();
        traces.sort_by(|a, b| a.0.cmp(&b.0));
        traces
    }

    /// Clear all traces.
    pub fn clear(&mut self) {
        self.traces.clear();
    }
}
