//! Per-fix kinematics: time deltas, great-circle distances and speeds.
//!
//! This is the first pipeline stage. It consumes a prepared (sorted,
//! validated) trace and produces an immutable [`DerivedFix`] sequence; every
//! later stage reads these fields and never recomputes them.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use crate::geo_utils::fix_distance;
use crate::{DerivedFix, Fix};

/// Configuration for kinematics derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicsConfig {
    /// Plausibility ceiling in km/h. Fixes whose instantaneous speed exceeds
    /// this are dropped from the derived sequence (GPS glitches produce
    /// teleport-like spikes). Default: 150.0
    pub max_speed_kmh: f64,

    /// Window size (samples) for the centered rolling mean producing
    /// `speed_kmh_smooth`. Default: 5
    pub smoothing_window: usize,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            max_speed_kmh: 150.0,
            smoothing_window: 5,
        }
    }
}

/// Coarse per-fix movement label derived from speed and dwell thresholds.
///
/// Feeds downstream reporting only; segmentation does not consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    Stop,
    SlowWalk,
    FastWalk,
    Transport,
    Unknown,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Stop => "stop",
            MovementType::SlowWalk => "slow_walk",
            MovementType::FastWalk => "fast_walk",
            MovementType::Transport => "transport",
            MovementType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate and chronologically sort a raw trace.
///
/// Rejects empty traces and non-finite/out-of-range coordinates early:
/// invalid coordinates must never reach distance math, where they would
/// corrupt every downstream stage. Duplicate timestamps survive sorting and
/// later yield undefined speeds (zero time delta).
pub fn prepare_trace(subject_id: &str, mut fixes: Vec<Fix>) -> Result<Vec<Fix>> {
    if fixes.is_empty() {
        return Err(ProfileError::EmptyTrace {
            subject_id: subject_id.to_string(),
        });
    }

    for (index, fix) in fixes.iter().enumerate() {
        if !fix.is_valid() {
            return Err(ProfileError::InvalidCoordinate {
                subject_id: subject_id.to_string(),
                index,
                lat: fix.lat,
                lon: fix.lon,
            });
        }
    }

    fixes.sort_by_key(|f| f.timestamp);
    Ok(fixes)
}

/// Derive kinematic fields over a prepared trace.
///
/// For each fix i > 0:
/// - `time_diff_s = t[i] - t[i-1]`
/// - `dist_m` = haversine distance to fix i-1
/// - `speed_kmh = dist_m / time_diff_s * 3.6`, undefined when the time
///   delta is zero/missing or the result is non-finite
///
/// Fixes whose speed exceeds `max_speed_kmh` are dropped afterwards; the
/// retained fields are not recomputed across the resulting gaps, matching
/// the filter-after-derivation order the thresholds were tuned against.
/// Finally `speed_kmh_smooth` is computed over the retained sequence.
pub fn derive_fixes(fixes: &[Fix], config: &KinematicsConfig) -> Vec<DerivedFix> {
    let mut derived: Vec<DerivedFix> = Vec::with_capacity(fixes.len());

    for (i, fix) in fixes.iter().enumerate() {
        if i == 0 {
            derived.push(DerivedFix {
                fix: *fix,
                time_diff_s: None,
                dist_m: None,
                speed_kmh: None,
                speed_kmh_smooth: None,
            });
            continue;
        }

        let prev = &fixes[i - 1];
        let dt = (fix.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
        let dist = fix_distance(prev, fix);

        let speed = if dt > 0.0 {
            let v = dist / dt * 3.6;
            v.is_finite().then_some(v)
        } else {
            None
        };

        derived.push(DerivedFix {
            fix: *fix,
            time_diff_s: Some(dt),
            dist_m: Some(dist),
            speed_kmh: speed,
            speed_kmh_smooth: None,
        });
    }

    let before = derived.len();
    derived.retain(|d| match d.speed_kmh {
        Some(v) => v <= config.max_speed_kmh,
        None => true,
    });
    if derived.len() < before {
        debug!(
            "dropped {} fixes above the {} km/h ceiling",
            before - derived.len(),
            config.max_speed_kmh
        );
    }

    smooth_speeds(&mut derived, config.smoothing_window);
    derived
}

/// Centered rolling mean over `speed_kmh`, ignoring undefined samples.
fn smooth_speeds(derived: &mut [DerivedFix], window: usize) {
    if window == 0 {
        return;
    }
    let half = window / 2;
    let n = derived.len();

    let smoothed: Vec<Option<f64>> = (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let values: Vec<f64> = derived[lo..=hi].iter().filter_map(|d| d.speed_kmh).collect();
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        })
        .collect();

    for (d, s) in derived.iter_mut().zip(smoothed) {
        d.speed_kmh_smooth = s;
    }
}

/// Total traveled distance in meters, ignoring undefined segments.
pub fn total_distance_m(derived: &[DerivedFix]) -> f64 {
    derived.iter().filter_map(|d| d.dist_m).sum()
}

/// Uniformly downsample a trace to at most `max_len` fixes.
///
/// Bounds pathological inputs (very high fix density makes the clustering
/// passes quadratic). Keeps the first and last fix.
pub fn downsample(fixes: Vec<Fix>, max_len: usize) -> Vec<Fix> {
    if max_len == 0 || fixes.len() <= max_len {
        return fixes;
    }
    warn!(
        "downsampling trace from {} to {} fixes",
        fixes.len(),
        max_len
    );
    let step = fixes.len() as f64 / max_len as f64;
    let mut out: Vec<Fix> = (0..max_len)
        .map(|i| fixes[(i as f64 * step) as usize])
        .collect();
    if let (Some(last_out), Some(last_in)) = (out.last_mut(), fixes.last()) {
        *last_out = *last_in;
    }
    out
}

/// Coarse movement label for one derived fix.
///
/// Below `slow_threshold_kmh` with a dwell of at least
/// `stop_min_duration_s` is a stop; then slow walk, fast walk (< 15 km/h)
/// and transport in order.
pub fn assign_movement_type(
    d: &DerivedFix,
    slow_threshold_kmh: f64,
    walk_threshold_kmh: f64,
    stop_min_duration_s: f64,
) -> MovementType {
    let (speed, duration) = match (d.speed_kmh, d.time_diff_s) {
        (Some(s), Some(t)) => (s, t),
        _ => return MovementType::Unknown,
    };

    if speed < slow_threshold_kmh && duration >= stop_min_duration_s {
        MovementType::Stop
    } else if speed < walk_threshold_kmh {
        MovementType::SlowWalk
    } else if speed < 15.0 {
        MovementType::FastWalk
    } else {
        MovementType::Transport
    }
}
