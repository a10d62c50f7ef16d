//! Activity ground-truth cross-reference.
//!
//! Consumes an external table of timestamped activity labels and annotates
//! each place with the first label recorded inside its interval. A pure
//! lookup: no inference, and a missing match yields the sentinel label
//! rather than an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CanonicalPlace;

/// Sentinel label for places with no matching activity record.
pub const UNMATCHED_ACTIVITY: &str = "unknown";

/// One externally supplied activity observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: DateTime<Utc>,
    pub label: String,
}

/// Match each place to the first activity whose timestamp falls inside the
/// place interval, in chronological event order.
///
/// Returns one label per place, [`UNMATCHED_ACTIVITY`] where nothing
/// matches.
pub fn match_place_activities(places: &[CanonicalPlace], events: &[ActivityEvent]) -> Vec<String> {
    let mut sorted: Vec<&ActivityEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);

    places
        .iter()
        .map(|place| {
            sorted
                .iter()
                .find(|e| e.timestamp >= place.start_time && e.timestamp <= place.end_time)
                .map(|e| e.label.clone())
                .unwrap_or_else(|| UNMATCHED_ACTIVITY.to_string())
        })
        .collect()
}
