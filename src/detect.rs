//! Stop/move segmentation of a derived trace.
//!
//! Two interchangeable detectors implement the [`StopDetector`] seam:
//! a speed/duration threshold detector and a spatial staypoint detector.
//! The pipeline depends on the trait, not on a variant, so detectors can be
//! swapped or benchmarked against each other.
//!
//! Moves are the complement of the detected stops: every maximal interval of
//! the trace not covered by a stop, filtered by minimum duration and by a
//! minimum time gap from the adjacent stops so segmentation noise is not
//! mislabeled as travel.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{fix_distance, haversine_distance};
use crate::{DerivedFix, Fix, MoveCandidate, StopCandidate};

/// Capability interface for stop detection strategies.
pub trait StopDetector {
    /// Partition a derived trace into stationary intervals.
    ///
    /// Returned stops are ordered by start time and never overlap. A
    /// stationary run that has not reached the detector's minimum duration
    /// by trace end is discarded, not emitted.
    fn detect_stops(&self, trace: &[DerivedFix]) -> Vec<StopCandidate>;
}

// ============================================================================
// Speed/duration threshold detector
// ============================================================================

/// Stop detection by dwell below a speed threshold.
///
/// A fix is "slow" when its smoothed speed is below `speed_threshold_kmh`;
/// contiguous runs of slow fixes whose summed time deltas reach
/// `min_duration_s` become stops. Fixes with undefined speed break a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedDurationDetector {
    /// Speed threshold in km/h below which a fix counts as stationary.
    /// Default: 2.0
    pub speed_threshold_kmh: f64,
    /// Minimum run duration in seconds for a stop to be emitted.
    /// Default: 60.0
    pub min_duration_s: f64,
}

impl Default for SpeedDurationDetector {
    fn default() -> Self {
        Self {
            speed_threshold_kmh: 2.0,
            min_duration_s: 60.0,
        }
    }
}

impl SpeedDurationDetector {
    fn is_slow(&self, d: &DerivedFix) -> bool {
        d.speed_kmh_smooth
            .or(d.speed_kmh)
            .map(|v| v < self.speed_threshold_kmh)
            .unwrap_or(false)
    }
}

impl StopDetector for SpeedDurationDetector {
    fn detect_stops(&self, trace: &[DerivedFix]) -> Vec<StopCandidate> {
        let mut stops = Vec::new();
        let mut run: Vec<&DerivedFix> = Vec::new();

        for d in trace {
            if self.is_slow(d) {
                run.push(d);
            } else {
                self.flush_run(&mut run, &mut stops);
            }
        }
        self.flush_run(&mut run, &mut stops);

        debug!("speed/duration detector: {} stops", stops.len());
        stops
    }
}

impl SpeedDurationDetector {
    fn flush_run(&self, run: &mut Vec<&DerivedFix>, stops: &mut Vec<StopCandidate>) {
        if run.is_empty() {
            return;
        }
        let duration_s: f64 = run.iter().filter_map(|d| d.time_diff_s).sum();
        if duration_s >= self.min_duration_s {
            let coords: Vec<(f64, f64)> = run.iter().map(|d| (d.fix.lat, d.fix.lon)).collect();
            let (lat, lon) = crate::geo_utils::mean_center(&coords);
            stops.push(StopCandidate {
                start_time: run.first().unwrap().fix.timestamp,
                end_time: run.last().unwrap().fix.timestamp,
                duration_s,
                lat,
                lon,
            });
        }
        run.clear();
    }
}

// ============================================================================
// Spatial staypoint detector
// ============================================================================

/// Stop detection by spatial dwell (staypoint extraction).
///
/// Starting from an anchor fix i, the candidate window [i, j] grows while
/// every fix stays within `distance_threshold_m` of the anchor. When the
/// window breaks, it becomes a stop if its time span reaches
/// `min_duration_s`; scanning then resumes after the window, otherwise the
/// anchor advances by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaypointDetector {
    /// Maximum distance in meters from the anchor fix. Default: 100.0
    pub distance_threshold_m: f64,
    /// Minimum dwell time span in seconds. Default: 300.0
    pub min_duration_s: f64,
}

impl Default for StaypointDetector {
    fn default() -> Self {
        Self {
            distance_threshold_m: 100.0,
            min_duration_s: 300.0,
        }
    }
}

impl StopDetector for StaypointDetector {
    fn detect_stops(&self, trace: &[DerivedFix]) -> Vec<StopCandidate> {
        let mut stops = Vec::new();
        let n = trace.len();
        let mut i = 0;

        while i < n {
            let anchor = &trace[i].fix;
            let mut j = i + 1;
            while j < n {
                let dist = haversine_distance(anchor.lat, anchor.lon, trace[j].fix.lat, trace[j].fix.lon);
                if dist > self.distance_threshold_m {
                    break;
                }
                j += 1;
            }

            // window is [i, j-1]
            if j - 1 > i {
                let start = trace[i].fix.timestamp;
                let end = trace[j - 1].fix.timestamp;
                let duration_s = (end - start).num_milliseconds() as f64 / 1000.0;
                if duration_s >= self.min_duration_s {
                    let coords: Vec<(f64, f64)> =
                        trace[i..j].iter().map(|d| (d.fix.lat, d.fix.lon)).collect();
                    let (lat, lon) = crate::geo_utils::mean_center(&coords);
                    stops.push(StopCandidate {
                        start_time: start,
                        end_time: end,
                        duration_s,
                        lat,
                        lon,
                    });
                    i = j;
                    continue;
                }
            }
            i += 1;
        }

        debug!("staypoint detector: {} stops", stops.len());
        stops
    }
}

// ============================================================================
// Move extraction
// ============================================================================

/// Configuration for extracting moves from the stop complement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveExtractionConfig {
    /// Minimum move duration in seconds. Default: 30.0
    pub min_move_duration_s: f64,
    /// Minimum time gap in seconds between the enclosing stops for the
    /// interval to count as travel rather than segmentation noise. Not
    /// applied to the segment after the last stop. Default: 900.0
    pub min_time_gap_s: f64,
}

impl Default for MoveExtractionConfig {
    fn default() -> Self {
        Self {
            min_move_duration_s: 30.0,
            min_time_gap_s: 900.0,
        }
    }
}

/// Extract move candidates from the intervals not covered by stops.
///
/// Walks the trace between consecutive stop boundaries (and before the
/// first / after the last stop). Each window with at least two fixes whose
/// span passes the duration and gap constraints yields a move; origin and
/// destination are the window's first and last fix, `dist_m` is their
/// endpoint-to-endpoint distance.
pub fn extract_moves(
    fixes: &[Fix],
    stops: &[StopCandidate],
    config: &MoveExtractionConfig,
) -> Vec<MoveCandidate> {
    let mut moves = Vec::new();
    if fixes.is_empty() {
        return moves;
    }

    let mut prev_end = fixes[0].timestamp;

    for stop in stops {
        let window: Vec<&Fix> = fixes
            .iter()
            .filter(|f| f.timestamp >= prev_end && f.timestamp <= stop.start_time)
            .collect();
        if window.len() >= 2 {
            let dt = (window.last().unwrap().timestamp - window[0].timestamp).num_milliseconds()
                as f64
                / 1000.0;
            let gap = (stop.start_time - prev_end).num_milliseconds() as f64 / 1000.0;
            if dt >= config.min_move_duration_s && gap >= config.min_time_gap_s {
                moves.push(build_move(&window, dt));
            }
        }
        prev_end = stop.end_time;
    }

    // trailing segment after the last stop: no gap constraint to apply
    let window: Vec<&Fix> = fixes.iter().filter(|f| f.timestamp >= prev_end).collect();
    if window.len() >= 2 {
        let dt = (window.last().unwrap().timestamp - window[0].timestamp).num_milliseconds() as f64
            / 1000.0;
        if dt >= config.min_move_duration_s {
            moves.push(build_move(&window, dt));
        }
    }

    debug!("extracted {} moves from {} stops", moves.len(), stops.len());
    moves
}

fn build_move(window: &[&Fix], duration_s: f64) -> MoveCandidate {
    let first = window[0];
    let last = window[window.len() - 1];
    MoveCandidate {
        start_time: first.timestamp,
        end_time: last.timestamp,
        duration_s,
        dist_m: fix_distance(first, last),
        origin_lat: first.lat,
        origin_lon: first.lon,
        dest_lat: last.lat,
        dest_lon: last.lon,
    }
}
