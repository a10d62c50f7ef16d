//! Geographic utilities: distances, bounds, centroid and unit conversions.
//!
//! All distances are great-circle (haversine) on a sphere with the IUGG
//! mean Earth radius. Downstream thresholds are tuned in meters; the
//! sphere-vs-ellipsoid difference (< 0.5%) is well inside GPS noise.

use crate::{Bounds, Fix};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude (approximately constant).
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Great-circle distance in meters between two lat/lon pairs (degrees).
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Great-circle distance in meters between two fixes.
pub fn fix_distance(a: &Fix, b: &Fix) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Convert a distance in meters to degrees of longitude at a given latitude.
///
/// Used to size R-tree query envelopes; results are refined with
/// [`haversine_distance`] afterwards.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let meters_per_degree = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_degree.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_degree
}

/// Convert a distance in meters to degrees of latitude.
pub fn meters_to_degrees_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

/// Compute the bounding box of a sequence of fixes.
pub fn compute_bounds(fixes: &[Fix]) -> Option<Bounds> {
    if fixes.is_empty() {
        return None;
    }
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lon = f64::MAX;
    let mut max_lon = f64::MIN;

    for f in fixes {
        min_lat = min_lat.min(f.lat);
        max_lat = max_lat.max(f.lat);
        min_lon = min_lon.min(f.lon);
        max_lon = max_lon.max(f.lon);
    }

    Some(Bounds {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    })
}

/// Arithmetic mean of a set of lat/lon pairs.
///
/// Returns `(0.0, 0.0)` for an empty input.
pub fn mean_center(coords: &[(f64, f64)]) -> (f64, f64) {
    if coords.is_empty() {
        return (0.0, 0.0);
    }
    let n = coords.len() as f64;
    let (sum_lat, sum_lon) = coords
        .iter()
        .fold((0.0, 0.0), |(la, lo), c| (la + c.0, lo + c.1));
    (sum_lat / n, sum_lon / n)
}
