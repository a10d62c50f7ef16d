//! Tests for the kinematics module

use chrono::{DateTime, Duration, TimeZone, Utc};
use traceprofile::kinematics::{
    assign_movement_type, derive_fixes, downsample, prepare_trace, total_distance_m,
    KinematicsConfig, MovementType,
};
use traceprofile::{Fix, ProfileError};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
}

fn fix_at(offset_s: i64, lat: f64, lon: f64) -> Fix {
    Fix::new(t0() + Duration::seconds(offset_s), lat, lon)
}

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[test]
fn test_prepare_rejects_empty_trace() {
    let err = prepare_trace("s1", vec![]).unwrap_err();
    assert!(matches!(err, ProfileError::EmptyTrace { .. }));
    assert!(err.to_string().contains("s1"));
}

#[test]
fn test_prepare_rejects_invalid_coordinates() {
    let fixes = vec![fix_at(0, 48.0, 2.0), fix_at(60, 991.0, 2.0)];
    let err = prepare_trace("s1", fixes).unwrap_err();
    assert!(matches!(
        err,
        ProfileError::InvalidCoordinate { index: 1, .. }
    ));
}

#[test]
fn test_prepare_rejects_nan() {
    let fixes = vec![fix_at(0, f64::NAN, 2.0)];
    assert!(prepare_trace("s1", fixes).is_err());
}

#[test]
fn test_prepare_sorts_by_timestamp() {
    let fixes = vec![fix_at(120, 48.0, 2.0), fix_at(0, 48.1, 2.0), fix_at(60, 48.2, 2.0)];
    let sorted = prepare_trace("s1", fixes).unwrap();
    assert!(sorted.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_first_fix_has_undefined_fields() {
    let fixes = vec![fix_at(0, 48.0, 2.0), fix_at(60, 48.001, 2.0)];
    let derived = derive_fixes(&fixes, &KinematicsConfig::default());
    assert_eq!(derived[0].time_diff_s, None);
    assert_eq!(derived[0].dist_m, None);
    assert_eq!(derived[0].speed_kmh, None);
}

#[test]
fn test_distance_and_speed_derivation() {
    // 0.001 deg latitude (~111 m) in 60 seconds: ~6.7 km/h
    let fixes = vec![fix_at(0, 48.0, 2.0), fix_at(60, 48.001, 2.0)];
    let derived = derive_fixes(&fixes, &KinematicsConfig::default());

    assert_eq!(derived[1].time_diff_s, Some(60.0));
    let dist = derived[1].dist_m.unwrap();
    assert!(approx_eq(dist, 111.2, 1.0));
    let speed = derived[1].speed_kmh.unwrap();
    assert!(approx_eq(speed, dist / 60.0 * 3.6, 1e-9));
}

#[test]
fn test_zero_time_delta_gives_undefined_speed() {
    // Same timestamp: distance defined, speed undefined - never zero
    let fixes = vec![fix_at(0, 48.0, 2.0), fix_at(0, 48.001, 2.0)];
    let derived = derive_fixes(&fixes, &KinematicsConfig::default());
    assert!(derived[1].dist_m.is_some());
    assert_eq!(derived[1].speed_kmh, None);
}

#[test]
fn test_dist_zero_iff_identical_coordinates() {
    let fixes = vec![
        fix_at(0, 48.0, 2.0),
        fix_at(60, 48.0, 2.0),
        fix_at(120, 48.001, 2.0),
    ];
    let derived = derive_fixes(&fixes, &KinematicsConfig::default());
    assert_eq!(derived[1].dist_m, Some(0.0));
    assert!(derived[2].dist_m.unwrap() > 0.0);
}

#[test]
fn test_speed_ceiling_drops_fixes() {
    // Second hop teleports ~11 km in 60 s (~667 km/h)
    let fixes = vec![
        fix_at(0, 48.0, 2.0),
        fix_at(60, 48.001, 2.0),
        fix_at(120, 48.1, 2.0),
    ];
    let derived = derive_fixes(&fixes, &KinematicsConfig::default());
    assert_eq!(derived.len(), 2);
    assert!(derived.iter().all(|d| d.fix.lat < 48.05));
}

#[test]
fn test_removing_fixes_never_increases_total_distance() {
    let fixes = vec![
        fix_at(0, 48.0, 2.0),
        fix_at(60, 48.001, 2.0),
        fix_at(120, 48.1, 2.0),
        fix_at(180, 48.101, 2.0),
    ];
    let permissive = KinematicsConfig {
        max_speed_kmh: 10_000.0,
        ..KinematicsConfig::default()
    };
    let all = total_distance_m(&derive_fixes(&fixes, &permissive));
    let filtered = total_distance_m(&derive_fixes(&fixes, &KinematicsConfig::default()));
    assert!(filtered <= all);
}

#[test]
fn test_total_distance_nonnegative() {
    let fixes: Vec<Fix> = (0..10).map(|i| fix_at(i * 60, 48.0 + i as f64 * 0.001, 2.0)).collect();
    let derived = derive_fixes(&fixes, &KinematicsConfig::default());
    assert!(derived.iter().all(|d| d.dist_m.unwrap_or(0.0) >= 0.0));
    assert!(total_distance_m(&derived) > 0.0);
}

#[test]
fn test_smoothing_preserves_constant_speed() {
    let fixes: Vec<Fix> = (0..10).map(|i| fix_at(i * 60, 48.0 + i as f64 * 0.001, 2.0)).collect();
    let derived = derive_fixes(&fixes, &KinematicsConfig::default());

    let raw = derived[5].speed_kmh.unwrap();
    let smooth = derived[5].speed_kmh_smooth.unwrap();
    assert!(approx_eq(raw, smooth, 0.05));
}

#[test]
fn test_single_fix_trace_is_all_undefined() {
    let derived = derive_fixes(&[fix_at(0, 48.0, 2.0)], &KinematicsConfig::default());
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].speed_kmh, None);
    assert_eq!(total_distance_m(&derived), 0.0);
}

#[test]
fn test_downsample_bounds_length() {
    let fixes: Vec<Fix> = (0..1000).map(|i| fix_at(i * 10, 48.0, 2.0)).collect();
    let down = downsample(fixes.clone(), 100);
    assert_eq!(down.len(), 100);
    assert_eq!(down[0], fixes[0]);
    assert_eq!(down[99], fixes[999]);

    // No-op below the bound
    assert_eq!(downsample(fixes.clone(), 2000).len(), 1000);
    // Zero disables the bound
    assert_eq!(downsample(fixes, 0).len(), 1000);
}

#[test]
fn test_movement_type_assignment() {
    let mk = |speed: Option<f64>, dt: Option<f64>| traceprofile::DerivedFix {
        fix: fix_at(0, 48.0, 2.0),
        time_diff_s: dt,
        dist_m: Some(0.0),
        speed_kmh: speed,
        speed_kmh_smooth: speed,
    };

    assert_eq!(
        assign_movement_type(&mk(Some(0.5), Some(120.0)), 1.0, 5.0, 60.0),
        MovementType::Stop
    );
    assert_eq!(
        assign_movement_type(&mk(Some(3.0), Some(30.0)), 1.0, 5.0, 60.0),
        MovementType::SlowWalk
    );
    assert_eq!(
        assign_movement_type(&mk(Some(10.0), Some(30.0)), 1.0, 5.0, 60.0),
        MovementType::FastWalk
    );
    assert_eq!(
        assign_movement_type(&mk(Some(80.0), Some(30.0)), 1.0, 5.0, 60.0),
        MovementType::Transport
    );
    assert_eq!(
        assign_movement_type(&mk(None, Some(30.0)), 1.0, 5.0, 60.0),
        MovementType::Unknown
    );
}
