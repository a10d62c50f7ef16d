//! Spatial clustering and merging of stops into canonical places.
//!
//! Three operations, applied in order by the pipeline:
//! 1. [`cluster_stops_density`]: density-based clustering of raw stop
//!    detections over the haversine metric (groups co-located stops that
//!    may be far apart in time).
//! 2. [`group_stops_by_time_and_space`]: sequential merge of clustered
//!    stops that are adjacent in both time and space.
//! 3. [`merge_close_places`]: post-classification transitive close merge
//!    via union-find, with the Home/Work fusion guard.

use log::debug;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, mean_center, meters_to_degrees, meters_to_degrees_lat};
use crate::union_find::UnionFind;
use crate::{CanonicalPlace, PlaceType, StopCandidate, StopGroup};

// ============================================================================
// Phase 1: density-based clustering
// ============================================================================

/// What to do with stops that no cluster absorbs.
///
/// The choice changes downstream place counts, so it is an explicit policy
/// rather than fixed behavior. With `min_samples = 1` nothing is noise and
/// the policy is moot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoisePolicy {
    /// Discard unclustered stops.
    Drop,
    /// Keep each unclustered stop as a singleton cluster.
    KeepAsSingletons,
}

/// Configuration for density-based stop clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Neighborhood radius in meters. Default: 150.0
    pub eps_m: f64,
    /// Minimum neighborhood size (the point itself included) for a stop to
    /// seed a cluster. Default: 1
    pub min_samples: usize,
    /// Handling of unclustered stops. Default: Drop
    pub noise_policy: NoisePolicy,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            eps_m: 150.0,
            min_samples: 1,
            noise_policy: NoisePolicy::Drop,
        }
    }
}

/// Density-cluster stop candidates over the haversine metric.
///
/// Classic DBSCAN with pairwise distance queries; per-subject stop counts
/// are tens to low hundreds, so the quadratic scan is acceptable; a fleet
/// scale implementation would swap in the R-tree here as well.
///
/// Each cluster aggregates to min start, max end, summed duration, mean
/// centroid and member count. Output is sorted by start time.
pub fn cluster_stops_density(stops: &[StopCandidate], config: &ClusterConfig) -> Vec<StopGroup> {
    if stops.is_empty() {
        return Vec::new();
    }

    const UNVISITED: i64 = -2;
    const NOISE: i64 = -1;

    let n = stops.len();
    let mut labels: Vec<i64> = vec![UNVISITED; n];
    let mut cluster_id: i64 = 0;

    let neighbors = |i: usize| -> Vec<usize> {
        (0..n)
            .filter(|&j| {
                haversine_distance(stops[i].lat, stops[i].lon, stops[j].lat, stops[j].lon)
                    <= config.eps_m
            })
            .collect()
    };

    for i in 0..n {
        if labels[i] != UNVISITED {
            continue;
        }
        let seeds = neighbors(i);
        if seeds.len() < config.min_samples {
            labels[i] = NOISE;
            continue;
        }

        labels[i] = cluster_id;
        let mut frontier = seeds;
        let mut k = 0;
        while k < frontier.len() {
            let j = frontier[k];
            k += 1;
            if labels[j] == NOISE {
                labels[j] = cluster_id;
            }
            if labels[j] != UNVISITED {
                continue;
            }
            labels[j] = cluster_id;
            let j_neighbors = neighbors(j);
            if j_neighbors.len() >= config.min_samples {
                frontier.extend(j_neighbors);
            }
        }
        cluster_id += 1;
    }

    let mut groups: Vec<StopGroup> = Vec::new();
    for c in 0..cluster_id {
        let members: Vec<&StopCandidate> = labels
            .iter()
            .zip(stops)
            .filter(|(l, _)| **l == c)
            .map(|(_, s)| s)
            .collect();
        groups.push(aggregate_stops(&members));
    }

    let noise_count = labels.iter().filter(|&&l| l == NOISE).count();
    match config.noise_policy {
        NoisePolicy::Drop => {
            if noise_count > 0 {
                debug!("dropping {} unclustered stops", noise_count);
            }
        }
        NoisePolicy::KeepAsSingletons => {
            for (l, s) in labels.iter().zip(stops) {
                if *l == NOISE {
                    groups.push(StopGroup::from(s.clone()));
                }
            }
        }
    }

    groups.sort_by_key(|g| g.start_time);
    debug!("density clustering: {} clusters from {} stops", groups.len(), n);
    groups
}

fn aggregate_stops(members: &[&StopCandidate]) -> StopGroup {
    let coords: Vec<(f64, f64)> = members.iter().map(|s| (s.lat, s.lon)).collect();
    let (lat, lon) = mean_center(&coords);
    StopGroup {
        start_time: members.iter().map(|s| s.start_time).min().unwrap(),
        end_time: members.iter().map(|s| s.end_time).max().unwrap(),
        duration_s: members.iter().map(|s| s.duration_s).sum(),
        lat,
        lon,
        group_size: members.len(),
    }
}

// ============================================================================
// Phase 2: sequential time+space grouping
// ============================================================================

/// Configuration for the sequential time+space merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Maximum gap in seconds between a group member's end and the next
    /// stop's start. Default: 600.0
    pub max_time_gap_s: f64,
    /// Maximum distance in meters between the previous member and the next
    /// stop. Default: 200.0
    pub max_distance_m: f64,
    /// Refuse to merge stops whose local calendar dates differ, even when
    /// close in clock time across midnight. Default: false
    pub same_day_only: bool,
    /// UTC offset in hours used for the calendar-day test. Default: 0
    pub utc_offset_hours: i32,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_time_gap_s: 600.0,
            max_distance_m: 200.0,
            same_day_only: false,
            utc_offset_hours: 0,
        }
    }
}

/// Merge stops that are adjacent in both time and space.
///
/// Stops are walked in start-time order; the next stop joins the open
/// group iff the gap to the previous member's end is within
/// `max_time_gap_s` AND the distance to the previous member is within
/// `max_distance_m` (and, optionally, both fall on the same local calendar
/// day). When either condition fails the group closes and a new one opens.
pub fn group_stops_by_time_and_space(stops: &[StopGroup], config: &GroupingConfig) -> Vec<StopGroup> {
    if stops.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&StopGroup> = stops.iter().collect();
    sorted.sort_by_key(|s| s.start_time);

    let mut grouped = Vec::new();
    let mut current: Vec<&StopGroup> = vec![sorted[0]];

    for curr in sorted.into_iter().skip(1) {
        let prev = current[current.len() - 1];
        let time_gap = (curr.start_time - prev.end_time).num_milliseconds() as f64 / 1000.0;
        let distance = haversine_distance(prev.lat, prev.lon, curr.lat, curr.lon);
        let same_day = !config.same_day_only
            || local_date(prev.end_time, config.utc_offset_hours)
                == local_date(curr.start_time, config.utc_offset_hours);

        if time_gap <= config.max_time_gap_s && distance <= config.max_distance_m && same_day {
            current.push(curr);
        } else {
            grouped.push(aggregate_groups(&current));
            current = vec![curr];
        }
    }
    grouped.push(aggregate_groups(&current));

    debug!(
        "time+space grouping: {} groups from {} stops",
        grouped.len(),
        stops.len()
    );
    grouped
}

fn local_date(t: chrono::DateTime<chrono::Utc>, offset_hours: i32) -> chrono::NaiveDate {
    let offset = chrono::FixedOffset::east_opt(offset_hours * 3600)
        .unwrap_or_else(|| chrono::FixedOffset::east_opt(0).unwrap());
    t.with_timezone(&offset).date_naive()
}

fn aggregate_groups(members: &[&StopGroup]) -> StopGroup {
    let coords: Vec<(f64, f64)> = members.iter().map(|s| (s.lat, s.lon)).collect();
    let (lat, lon) = mean_center(&coords);
    StopGroup {
        start_time: members.iter().map(|s| s.start_time).min().unwrap(),
        end_time: members.iter().map(|s| s.end_time).max().unwrap(),
        duration_s: members.iter().map(|s| s.duration_s).sum(),
        lat,
        lon,
        group_size: members.iter().map(|s| s.group_size).sum(),
    }
}

// ============================================================================
// Transitive close-stop merge (post-classification)
// ============================================================================

/// Configuration for the transitive close-place merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseMergeConfig {
    /// Distance in meters within which two places fuse (directly or via
    /// chained adjacency). Default: 100.0
    pub max_distance_m: f64,
}

impl Default for CloseMergeConfig {
    fn default() -> Self {
        Self {
            max_distance_m: 100.0,
        }
    }
}

/// Place centroid wrapper for R-tree candidate pruning.
#[derive(Debug, Clone)]
struct PlacePoint {
    index: usize,
    lat: f64,
    lon: f64,
}

impl RTreeObject for PlacePoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

/// Transitively merge places whose centroids are within `max_distance_m`.
///
/// Adjacency is resolved with union-find over place indices; the R-tree
/// prunes candidate pairs to a degree-space envelope before the haversine
/// refinement. A set containing a Home member and a set containing a Work
/// member are never unioned, directly or through chained Other members.
/// The fused label is the highest-precedence member label
/// (Home > Work > Other).
///
/// Single-member groups pass through unchanged, which makes the merge
/// idempotent: re-running it on its own output yields the same set.
pub fn merge_close_places(places: &[CanonicalPlace], config: &CloseMergeConfig) -> Vec<CanonicalPlace> {
    if places.is_empty() {
        return Vec::new();
    }

    let n = places.len();
    let points: Vec<PlacePoint> = places
        .iter()
        .enumerate()
        .map(|(index, p)| PlacePoint {
            index,
            lat: p.lat,
            lon: p.lon,
        })
        .collect();
    let tree = RTree::bulk_load(points);

    let mut uf: UnionFind<usize> = UnionFind::with_capacity(n);
    for i in 0..n {
        uf.make_set(i);
    }

    // Set-level labels, updated on union, guard Home/Work fusion.
    let mut has_home: Vec<bool> = places.iter().map(|p| p.place_type == PlaceType::Home).collect();
    let mut has_work: Vec<bool> = places.iter().map(|p| p.place_type == PlaceType::Work).collect();

    for (i, place) in places.iter().enumerate() {
        let deg_lat = meters_to_degrees_lat(config.max_distance_m);
        let deg_lon = meters_to_degrees(config.max_distance_m, place.lat);
        let envelope = AABB::from_corners(
            [place.lon - deg_lon, place.lat - deg_lat],
            [place.lon + deg_lon, place.lat + deg_lat],
        );

        let mut candidates: Vec<usize> = tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|p| p.index)
            .filter(|&j| j > i)
            .collect();
        candidates.sort_unstable();

        for j in candidates {
            let dist = haversine_distance(place.lat, place.lon, places[j].lat, places[j].lon);
            if dist > config.max_distance_m {
                continue;
            }
            let ri = uf.find(&i);
            let rj = uf.find(&j);
            if ri == rj {
                continue;
            }
            if (has_home[ri] && has_work[rj]) || (has_work[ri] && has_home[rj]) {
                continue;
            }
            uf.union(&i, &j);
            let r = uf.find(&i);
            has_home[r] = has_home[ri] || has_home[rj];
            has_work[r] = has_work[ri] || has_work[rj];
        }
    }

    let mut merged: Vec<CanonicalPlace> = uf
        .groups()
        .into_values()
        .map(|members| fuse_places(&members, places))
        .collect();
    merged.sort_by_key(|p| p.start_time);

    debug!("close merge: {} places from {}", merged.len(), n);
    merged
}

fn fuse_places(member_indices: &[usize], places: &[CanonicalPlace]) -> CanonicalPlace {
    if member_indices.len() == 1 {
        return places[member_indices[0]].clone();
    }

    let members: Vec<&CanonicalPlace> = member_indices.iter().map(|&i| &places[i]).collect();

    let place_type = members
        .iter()
        .map(|p| p.place_type)
        .fold(PlaceType::Other, PlaceType::max_precedence);

    let coords: Vec<(f64, f64)> = members.iter().map(|p| (p.lat, p.lon)).collect();
    let (lat, lon) = mean_center(&coords);

    // Keep merged_starts/merged_ends parallel: collect interval pairs from
    // every member, order by start.
    let mut intervals: Vec<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> =
        members
            .iter()
            .flat_map(|p| p.merged_starts.iter().copied().zip(p.merged_ends.iter().copied()))
            .collect();
    intervals.sort();
    let (merged_starts, merged_ends): (Vec<_>, Vec<_>) = intervals.into_iter().unzip();

    CanonicalPlace {
        place_type,
        start_time: members.iter().map(|p| p.start_time).min().unwrap(),
        end_time: members.iter().map(|p| p.end_time).max().unwrap(),
        duration_s: members.iter().map(|p| p.duration_s).sum(),
        lat,
        lon,
        group_size: members.iter().map(|p| p.group_size).sum(),
        merged_starts,
        merged_ends,
    }
}
