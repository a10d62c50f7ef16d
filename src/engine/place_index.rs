//! Spatial index over classified place centroids.
//!
//! Uses an R-tree with degree-space envelopes for candidate pruning and
//! haversine refinement for the final metric decision, so radius arguments
//! stay in meters.

use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::{haversine_distance, meters_to_degrees, meters_to_degrees_lat};
use crate::CanonicalPlace;

/// Place centroid wrapper for R-tree indexing.
#[derive(Debug, Clone)]
pub struct PlaceEntry {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
}

impl RTreeObject for PlaceEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

/// R-tree over place centroids supporting nearest-within-radius queries.
#[derive(Debug, Default)]
pub struct PlaceIndex {
    tree: RTree<PlaceEntry>,
}

impl PlaceIndex {
    /// Build an index over a slice of places; entry indices refer back to
    /// positions in that slice.
    pub fn build(places: &[CanonicalPlace]) -> Self {
        let entries: Vec<PlaceEntry> = places
            .iter()
            .enumerate()
            .map(|(index, p)| PlaceEntry {
                index,
                lat: p.lat,
                lon: p.lon,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Nearest place within `radius_m` meters of a coordinate.
    ///
    /// Returns `(place index, distance in meters)`, or `None` when nothing
    /// lies inside the radius.
    pub fn nearest_within(&self, lat: f64, lon: f64, radius_m: f64) -> Option<(usize, f64)> {
        let deg_lat = meters_to_degrees_lat(radius_m);
        let deg_lon = meters_to_degrees(radius_m, lat);
        let envelope = AABB::from_corners([lon - deg_lon, lat - deg_lat], [lon + deg_lon, lat + deg_lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| (e.index, haversine_distance(lat, lon, e.lat, e.lon)))
            .filter(|(_, d)| *d <= radius_m)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
    }

    /// All places within `radius_m` meters of a coordinate, unsorted.
    pub fn within_radius(&self, lat: f64, lon: f64, radius_m: f64) -> Vec<(usize, f64)> {
        let deg_lat = meters_to_degrees_lat(radius_m);
        let deg_lon = meters_to_degrees(radius_m, lat);
        let envelope = AABB::from_corners([lon - deg_lon, lat - deg_lat], [lon + deg_lon, lat + deg_lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| (e.index, haversine_distance(lat, lon, e.lat, e.lon)))
            .filter(|(_, d)| *d <= radius_m)
            .collect()
    }

    /// Number of indexed places.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
