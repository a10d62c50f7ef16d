//! Move tagging: annotate moves with origin/destination place types.
//!
//! Each move endpoint is matched to the nearest classified place (R-tree
//! prefilter, haversine refinement); endpoints farther than `max_dist_m`
//! from every place stay `Unknown`. Implausible moves are filtered out.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::PlaceIndex;
use crate::{CanonicalPlace, EndpointType, MoveCandidate, PlaceType, TaggedMove};

/// Configuration for move tagging and filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    /// Maximum endpoint-to-place distance in meters for a type assignment.
    /// Default: 100.0
    pub max_dist_m: f64,
    /// Moves shorter than this (endpoint-to-endpoint meters) are discarded
    /// as sensor noise. Default: 50.0
    pub min_move_dist_m: f64,
    /// Moves longer than this (seconds) are discarded as implausible.
    /// Default: 21600.0 (6 hours)
    pub max_move_duration_s: f64,
    /// Snap matched Home/Work endpoints onto the place centroid for display
    /// consistency. Never alters `dist_m`/`duration_s`. Default: true
    pub snap_to_place: bool,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            max_dist_m: 100.0,
            min_move_dist_m: 50.0,
            max_move_duration_s: 21_600.0,
            snap_to_place: true,
        }
    }
}

/// Tag moves with origin/destination place types and filter non-moves.
///
/// Dropped: moves below `min_move_dist_m`, above `max_move_duration_s`, and
/// moves whose endpoints resolve to the same known type (clustering
/// artifacts). Two `Unknown` endpoints are kept: absence of a match is not
/// a type match.
pub fn tag_moves(
    moves: &[MoveCandidate],
    places: &[CanonicalPlace],
    config: &TagConfig,
) -> Vec<TaggedMove> {
    let index = PlaceIndex::build(places);
    let mut tagged = Vec::new();

    for m in moves {
        if m.dist_m < config.min_move_dist_m {
            continue;
        }
        if m.duration_s > config.max_move_duration_s {
            continue;
        }

        let origin = index.nearest_within(m.origin_lat, m.origin_lon, config.max_dist_m);
        let dest = index.nearest_within(m.dest_lat, m.dest_lon, config.max_dist_m);

        let origin_type = endpoint_type(origin, places);
        let destination_type = endpoint_type(dest, places);

        if origin_type.is_known() && origin_type == destination_type {
            continue;
        }

        let (origin_lat, origin_lon) =
            snapped_coords(m.origin_lat, m.origin_lon, origin, places, config);
        let (dest_lat, dest_lon) = snapped_coords(m.dest_lat, m.dest_lon, dest, places, config);

        tagged.push(TaggedMove {
            start_time: m.start_time,
            end_time: m.end_time,
            duration_s: m.duration_s,
            dist_m: m.dist_m,
            origin_lat,
            origin_lon,
            dest_lat,
            dest_lon,
            origin_type,
            destination_type,
            transition: format!("{} → {}", origin_type, destination_type),
        });
    }

    debug!("tagged {} of {} moves", tagged.len(), moves.len());
    tagged
}

fn endpoint_type(hit: Option<(usize, f64)>, places: &[CanonicalPlace]) -> EndpointType {
    match hit {
        Some((index, _)) => EndpointType::from(places[index].place_type),
        None => EndpointType::Unknown,
    }
}

/// Snapped display coordinates for an endpoint. Only Home/Work matches
/// snap; the semantic fields of the move are untouched.
fn snapped_coords(
    lat: f64,
    lon: f64,
    hit: Option<(usize, f64)>,
    places: &[CanonicalPlace],
    config: &TagConfig,
) -> (f64, f64) {
    if !config.snap_to_place {
        return (lat, lon);
    }
    match hit {
        Some((index, _))
            if matches!(places[index].place_type, PlaceType::Home | PlaceType::Work) =>
        {
            (places[index].lat, places[index].lon)
        }
        _ => (lat, lon),
    }
}
