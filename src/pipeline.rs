//! Per-subject mobility pipeline and batch runner.
//!
//! Stages run strictly sequentially within one trace; across subjects the
//! work is embarrassingly parallel, so the batch runner maps each subject
//! to one independent pipeline invocation. Degenerate intermediate results
//! (no stops, no moves, no Home/Work candidate) flow forward as empty sets;
//! only structurally invalid input aborts a subject, and never its
//! neighbors.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::classify::{classify_places, ClassifierConfig};
use crate::cluster::{
    cluster_stops_density, group_stops_by_time_and_space, merge_close_places, CloseMergeConfig,
    ClusterConfig, GroupingConfig,
};
use crate::detect::{
    extract_moves, MoveExtractionConfig, SpeedDurationDetector, StaypointDetector, StopDetector,
};
use crate::error::Result;
use crate::kinematics::{derive_fixes, downsample, prepare_trace, KinematicsConfig};
use crate::tag::{tag_moves, TagConfig};
use crate::{CanonicalPlace, DerivedFix, Fix, StopGroup, TaggedMove};

/// Which stop detection strategy the pipeline uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DetectorKind {
    /// Dwell below a speed threshold.
    SpeedDuration(SpeedDurationDetector),
    /// Spatial staypoint extraction.
    Staypoint(StaypointDetector),
}

impl Default for DetectorKind {
    fn default() -> Self {
        DetectorKind::Staypoint(StaypointDetector::default())
    }
}

impl StopDetector for DetectorKind {
    fn detect_stops(&self, trace: &[DerivedFix]) -> Vec<crate::StopCandidate> {
        match self {
            DetectorKind::SpeedDuration(d) => d.detect_stops(trace),
            DetectorKind::Staypoint(d) => d.detect_stops(trace),
        }
    }
}

/// All pipeline thresholds in one place.
///
/// Every value is domain tuning, not behavior: callers construct this from
/// their own settings source; nothing is hardcoded inside the stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub kinematics: KinematicsConfig,
    pub detector: DetectorKind,
    pub moves: MoveExtractionConfig,
    pub cluster: ClusterConfig,
    pub grouping: GroupingConfig,
    pub classifier: ClassifierConfig,
    pub close_merge: CloseMergeConfig,
    pub tagging: TagConfig,
    /// Traces longer than this are uniformly downsampled before derivation,
    /// bounding the quadratic clustering passes on pathological inputs.
    /// 0 disables the bound. Default: 200_000
    pub max_trace_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kinematics: KinematicsConfig::default(),
            detector: DetectorKind::default(),
            moves: MoveExtractionConfig::default(),
            cluster: ClusterConfig::default(),
            grouping: GroupingConfig::default(),
            classifier: ClassifierConfig::default(),
            close_merge: CloseMergeConfig::default(),
            tagging: TagConfig::default(),
            max_trace_len: 200_000,
        }
    }
}

/// The derived tables for one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobilityProfile {
    /// Classified canonical places, post close-merge.
    pub places: Vec<CanonicalPlace>,
    /// Tagged, filtered moves.
    pub moves: Vec<TaggedMove>,
    /// Stop detections before clustering (audit).
    pub raw_stop_count: usize,
    /// Move candidates before tagging/filtering (audit).
    pub raw_move_count: usize,
}

/// Runs the full profiling pipeline for one subject at a time.
pub struct MobilityPipeline {
    config: PipelineConfig,
}

impl MobilityPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Profile one subject's trace.
    ///
    /// Stages: prepare → derive kinematics → detect stops → extract moves →
    /// density cluster → time+space group → classify → close-merge → tag.
    pub fn run(&self, subject_id: &str, fixes: Vec<Fix>) -> Result<MobilityProfile> {
        let fixes = prepare_trace(subject_id, fixes)?;
        let fixes = if self.config.max_trace_len > 0 {
            downsample(fixes, self.config.max_trace_len)
        } else {
            fixes
        };

        let derived = derive_fixes(&fixes, &self.config.kinematics);
        // Moves are extracted over the retained fixes, consistent with the
        // speed-ceiling filter applied during derivation.
        let retained: Vec<Fix> = derived.iter().map(|d| d.fix).collect();

        let stops = self.config.detector.detect_stops(&derived);
        if stops.is_empty() {
            info!("subject '{}': no stops detected", subject_id);
        }
        let moves = extract_moves(&retained, &stops, &self.config.moves);

        let stop_groups: Vec<StopGroup> =
            cluster_stops_density(&stops, &self.config.cluster);
        let grouped = group_stops_by_time_and_space(&stop_groups, &self.config.grouping);
        if grouped.is_empty() && !stops.is_empty() {
            warn!("subject '{}': all stops lost in clustering", subject_id);
        }

        let classified = classify_places(&grouped, &self.config.classifier);
        let places = merge_close_places(&classified, &self.config.close_merge);

        let tagged = tag_moves(&moves, &places, &self.config.tagging);

        info!(
            "subject '{}': {} fixes → {} stops, {} moves → {} places, {} tagged moves",
            subject_id,
            retained.len(),
            stops.len(),
            moves.len(),
            places.len(),
            tagged.len()
        );

        Ok(MobilityProfile {
            places,
            moves: tagged,
            raw_stop_count: stops.len(),
            raw_move_count: moves.len(),
        })
    }

    /// Profile a batch of subjects, one independent run each.
    ///
    /// A failed subject yields its own `Err` entry and never affects the
    /// others. With the `parallel` feature the subjects are processed on
    /// the rayon pool.
    #[cfg(feature = "parallel")]
    pub fn run_batch(&self, traces: Vec<(String, Vec<Fix>)>) -> Vec<(String, Result<MobilityProfile>)> {
        use rayon::prelude::*;

        traces
            .into_par_iter()
            .map(|(subject_id, fixes)| {
                let result = self.run(&subject_id, fixes);
                if let Err(e) = &result {
                    warn!("subject '{}' failed: {}", subject_id, e);
                }
                (subject_id, result)
            })
            .collect()
    }

    /// Profile a batch of subjects sequentially.
    #[cfg(not(feature = "parallel"))]
    pub fn run_batch(&self, traces: Vec<(String, Vec<Fix>)>) -> Vec<(String, Result<MobilityProfile>)> {
        traces
            .into_iter()
            .map(|(subject_id, fixes)| {
                let result = self.run(&subject_id, fixes);
                if let Err(e) = &result {
                    warn!("subject '{}' failed: {}", subject_id, e);
                }
                (subject_id, result)
            })
            .collect()
    }
}
