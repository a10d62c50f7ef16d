//! # Trace Profile
//!
//! Semantic mobility profiling from raw GPS traces.
//!
//! Given an ordered, per-subject sequence of timestamped lat/lon fixes,
//! this library derives:
//! - per-fix kinematics (time deltas, great-circle distances, speeds)
//! - stop/move segmentation of the trace
//! - canonical places from spatially clustered and merged stops
//! - Home/Work/Other classification of those places
//! - moves tagged with origin/destination place types
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch processing with rayon
//! - **`synthetic`** - Enable the synthetic trace generator (tests/demos)
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use traceprofile::{Fix, MobilityPipeline, PipelineConfig};
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
//! let fixes: Vec<Fix> = (0..20)
//!     .map(|i| Fix::new(t0 + chrono::Duration::seconds(60 * i), 48.8566, 2.3522))
//!     .collect();
//!
//! let pipeline = MobilityPipeline::new(PipelineConfig::default());
//! let profile = pipeline.run("subject-1", fixes).unwrap();
//! assert!(profile.moves.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, ProfileError, Result};

// Union-Find data structure for transitive place merging
pub mod union_find;
pub use union_find::UnionFind;

// Geographic utilities (distance, bounds, centroid calculations)
pub mod geo_utils;

// Per-fix kinematics derivation
pub mod kinematics;
pub use kinematics::{derive_fixes, prepare_trace, KinematicsConfig, MovementType};

// Stop/move segmentation
pub mod detect;
pub use detect::{
    extract_moves, MoveExtractionConfig, SpeedDurationDetector, StaypointDetector, StopDetector,
};

// Spatial clustering and merging of stops into canonical places
pub mod cluster;
pub use cluster::{
    cluster_stops_density, group_stops_by_time_and_space, merge_close_places, CloseMergeConfig,
    ClusterConfig, GroupingConfig, NoisePolicy,
};

// Home/Work/Other classification
pub mod classify;
pub use classify::{classify_places, ClassifierConfig, HourWindow};

// Move tagging against classified places
pub mod tag;
pub use tag::{tag_moves, TagConfig};

// Activity ground-truth cross-reference (pure lookup)
pub mod xref;
pub use xref::{match_place_activities, ActivityEvent};

// Engine components: trace storage and place spatial index
pub mod engine;
pub use engine::{PlaceIndex, TraceStore};

// Per-subject pipeline and batch runner
pub mod pipeline;
pub use pipeline::{DetectorKind, MobilityPipeline, MobilityProfile, PipelineConfig};

// Synthetic trace generation for tests and demos
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// One GPS observation: a zoned instant and a WGS84 coordinate.
///
/// Immutable once recorded; all derived fields live on [`DerivedFix`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
}

impl Fix {
    pub fn new(timestamp: DateTime<Utc>, lat: f64, lon: f64) -> Self {
        Self {
            timestamp,
            lat,
            lon,
        }
    }

    /// Check that the coordinates are finite and within WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A fix augmented with kinematic fields relative to its predecessor.
///
/// `None` encodes "undefined" (first fix, zero or missing time delta,
/// non-finite result) and is excluded from aggregates, never coerced to
/// zero, which would bias speed and distance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFix {
    pub fix: Fix,
    /// Seconds since the previous fix.
    pub time_diff_s: Option<f64>,
    /// Great-circle distance in meters to the previous fix.
    pub dist_m: Option<f64>,
    /// Instantaneous speed in km/h (`dist_m / time_diff_s * 3.6`).
    pub speed_kmh: Option<f64>,
    /// Centered rolling mean of `speed_kmh`; consumed only by
    /// speed-threshold segmentation, never by distance accounting.
    pub speed_kmh_smooth: Option<f64>,
}

/// A detected stationary interval, before any clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopCandidate {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_s: f64,
    /// Mean latitude of the member fixes.
    pub lat: f64,
    /// Mean longitude of the member fixes.
    pub lon: f64,
}

/// A travel interval between stops (or between a trace edge and a stop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCandidate {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_s: f64,
    /// Endpoint-to-endpoint great-circle distance in meters.
    pub dist_m: f64,
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat: f64,
    pub dest_lon: f64,
}

/// Aggregate of stops produced by clustering, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopGroup {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Sum of member durations (not `end_time - start_time`).
    pub duration_s: f64,
    pub lat: f64,
    pub lon: f64,
    /// Number of merged member stops.
    pub group_size: usize,
}

impl From<StopCandidate> for StopGroup {
    fn from(stop: StopCandidate) -> Self {
        Self {
            start_time: stop.start_time,
            end_time: stop.end_time,
            duration_s: stop.duration_s,
            lat: stop.lat,
            lon: stop.lon,
            group_size: 1,
        }
    }
}

/// Semantic role of a canonical place.
///
/// Precedence on fusion is `Home > Work > Other`; Home and Work groups are
/// never fused with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlaceType {
    Home,
    Work,
    Other,
}

impl PlaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceType::Home => "Home",
            PlaceType::Work => "Work",
            PlaceType::Other => "Other",
        }
    }

    /// The higher-precedence of two labels (`Home > Work > Other`).
    pub fn max_precedence(self, other: PlaceType) -> PlaceType {
        self.min(other)
    }
}

impl std::fmt::Display for PlaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified canonical place: one or more merged stop occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPlace {
    pub place_type: PlaceType,
    /// Earliest member start.
    pub start_time: DateTime<Utc>,
    /// Latest member end.
    pub end_time: DateTime<Utc>,
    /// Sum over member durations.
    pub duration_s: f64,
    /// Arithmetic mean latitude of the members.
    pub lat: f64,
    /// Arithmetic mean longitude of the members.
    pub lon: f64,
    /// Number of original stop occurrences merged into this place.
    pub group_size: usize,
    /// Member interval starts, kept for audit/evaluation round-trips.
    pub merged_starts: Vec<DateTime<Utc>>,
    /// Member interval ends, parallel to `merged_starts`.
    pub merged_ends: Vec<DateTime<Utc>>,
}

/// Place type of a move endpoint: a classified place, or no match in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointType {
    Home,
    Work,
    Other,
    Unknown,
}

impl EndpointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::Home => "Home",
            EndpointType::Work => "Work",
            EndpointType::Other => "Other",
            EndpointType::Unknown => "unknown",
        }
    }

    /// Whether this endpoint matched a classified place.
    pub fn is_known(&self) -> bool {
        !matches!(self, EndpointType::Unknown)
    }
}

impl From<PlaceType> for EndpointType {
    fn from(p: PlaceType) -> Self {
        match p {
            PlaceType::Home => EndpointType::Home,
            PlaceType::Work => EndpointType::Work,
            PlaceType::Other => EndpointType::Other,
        }
    }
}

impl std::fmt::Display for EndpointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A move annotated with origin/destination place types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedMove {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_s: f64,
    /// Endpoint-to-endpoint distance, computed before any snapping.
    pub dist_m: f64,
    /// Origin coordinate, possibly snapped to the matched place centroid.
    pub origin_lat: f64,
    pub origin_lon: f64,
    /// Destination coordinate, possibly snapped to the matched place centroid.
    pub dest_lat: f64,
    pub dest_lon: f64,
    pub origin_type: EndpointType,
    pub destination_type: EndpointType,
    /// Display label, e.g. `"Home → Work"`.
    pub transition: String,
}

/// Bounding box over a set of fixes or place centroids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Midpoint of the box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}
