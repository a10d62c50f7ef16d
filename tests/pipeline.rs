//! End-to-end pipeline tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use traceprofile::synthetic::commuter_week;
use traceprofile::{
    DetectorKind, Fix, KinematicsConfig, MobilityPipeline, PipelineConfig, PlaceType,
    ProfileError, StaypointDetector,
};

const HOME: (f64, f64) = (48.8566, 2.3522);
const WORK: (f64, f64) = (48.8900, 2.2400);
const WEEKEND: (f64, f64) = (48.8400, 2.4000);

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
}

fn fix_at(offset_s: i64, lat: f64, lon: f64) -> Fix {
    Fix::new(t0() + Duration::seconds(offset_s), lat, lon)
}

#[test]
fn test_stationary_trace_single_other_place() {
    // Eleven fixes at one coordinate over ten minutes: one place, no moves
    let fixes: Vec<Fix> = (0..=10).map(|i| fix_at(i * 60, 48.8566, 2.3522)).collect();

    let pipeline = MobilityPipeline::new(PipelineConfig::default());
    let profile = pipeline.run("s1", fixes).unwrap();

    assert_eq!(profile.raw_stop_count, 1);
    assert_eq!(profile.places.len(), 1);
    // Ten minutes is below the Work duration floor, so the place stays Other
    assert_eq!(profile.places[0].place_type, PlaceType::Other);
    assert!(profile.moves.is_empty());
}

#[test]
fn test_oscillating_trace_yields_moves_not_stops() {
    let fixes: Vec<Fix> = (0..=30)
        .map(|i| {
            if i % 2 == 0 {
                fix_at(i * 120, 48.8566, 2.3522)
            } else {
                fix_at(i * 120, 48.9016, 2.3522)
            }
        })
        .collect();

    let config = PipelineConfig {
        kinematics: KinematicsConfig {
            max_speed_kmh: 1000.0,
            ..KinematicsConfig::default()
        },
        ..PipelineConfig::default()
    };
    let profile = MobilityPipeline::new(config).run("s1", fixes).unwrap();

    assert_eq!(profile.raw_stop_count, 0);
    assert!(profile.places.is_empty());
    assert_eq!(profile.raw_move_count, 1);
}

#[test]
fn test_commuter_week_full_profile() {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    let fixes = commuter_week(7, HOME, WORK, WEEKEND, start);

    let pipeline = MobilityPipeline::new(PipelineConfig::default());
    let profile = pipeline.run("commuter", fixes).unwrap();

    let homes: Vec<_> = profile
        .places
        .iter()
        .filter(|p| p.place_type == PlaceType::Home)
        .collect();
    let works: Vec<_> = profile
        .places
        .iter()
        .filter(|p| p.place_type == PlaceType::Work)
        .collect();

    assert_eq!(homes.len(), 1, "places: {:?}", profile.places);
    assert_eq!(works.len(), 1);
    assert!((homes[0].lat - HOME.0).abs() < 0.001);
    assert!((works[0].lat - WORK.0).abs() < 0.001);
    // Nights dominate: home accumulates more dwell than work
    assert!(homes[0].duration_s > works[0].duration_s);

    // The weekend spot stays Other
    assert!(profile
        .places
        .iter()
        .any(|p| p.place_type == PlaceType::Other && (p.lat - WEEKEND.0).abs() < 0.001));

    // Commute moves are tagged with the classified endpoints
    assert!(profile.moves.iter().any(|m| m.transition == "Home → Work"));
    assert!(profile.moves.iter().any(|m| m.transition == "Work → Home"));

    for p in &profile.places {
        assert!(p.group_size >= 1);
        assert!(p.duration_s >= 0.0);
        assert!(p.end_time >= p.start_time);
    }
    for m in &profile.moves {
        assert!(m.dist_m >= 50.0);
        assert!(m.duration_s <= 21_600.0);
        assert!(m.end_time >= m.start_time);
    }
}

#[test]
fn test_speed_duration_detector_variant() {
    // The pipeline accepts either detector through the same seam
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    let fixes = commuter_week(11, HOME, WORK, WEEKEND, start);

    let config = PipelineConfig {
        detector: DetectorKind::SpeedDuration(Default::default()),
        ..PipelineConfig::default()
    };
    let profile = MobilityPipeline::new(config).run("commuter", fixes).unwrap();

    assert!(profile.raw_stop_count > 0);
    assert!(profile
        .places
        .iter()
        .any(|p| p.place_type == PlaceType::Home));
}

#[test]
fn test_single_fix_trace_is_degenerate_not_fatal() {
    let profile = MobilityPipeline::new(PipelineConfig::default())
        .run("s1", vec![fix_at(0, 48.8566, 2.3522)])
        .unwrap();
    assert!(profile.places.is_empty());
    assert!(profile.moves.is_empty());
}

#[test]
fn test_empty_trace_rejected() {
    let err = MobilityPipeline::new(PipelineConfig::default())
        .run("s1", vec![])
        .unwrap_err();
    assert!(matches!(err, ProfileError::EmptyTrace { .. }));
}

#[test]
fn test_batch_isolates_failures() {
    let good: Vec<Fix> = (0..=10).map(|i| fix_at(i * 60, 48.8566, 2.3522)).collect();
    let bad = vec![fix_at(0, 999.0, 2.3522)];

    let pipeline = MobilityPipeline::new(PipelineConfig::default());
    let mut results = pipeline.run_batch(vec![
        ("good".to_string(), good),
        ("bad".to_string(), bad),
    ]);
    results.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(results.len(), 2);
    let (_, bad_result) = &results[0];
    let (_, good_result) = &results[1];

    assert!(matches!(
        bad_result,
        Err(ProfileError::InvalidCoordinate { .. })
    ));
    assert!(good_result.is_ok());
    assert_eq!(good_result.as_ref().unwrap().places.len(), 1);
}

#[test]
fn test_max_trace_len_downsamples() {
    let fixes: Vec<Fix> = (0..=1000).map(|i| fix_at(i * 60, 48.8566, 2.3522)).collect();

    let config = PipelineConfig {
        max_trace_len: 100,
        ..PipelineConfig::default()
    };
    let profile = MobilityPipeline::new(config).run("s1", fixes).unwrap();

    // Still one long dwell after downsampling
    assert_eq!(profile.places.len(), 1);
}

#[test]
fn test_staypoint_threshold_configurable() {
    // A 200 m oscillation dwell: invisible at 100 m radius, a stop at 500 m
    let fixes: Vec<Fix> = (0..=20)
        .map(|i| {
            if i % 2 == 0 {
                fix_at(i * 60, 48.8566, 2.3522)
            } else {
                fix_at(i * 60, 48.8584, 2.3522)
            }
        })
        .collect();

    let tight = MobilityPipeline::new(PipelineConfig::default())
        .run("s1", fixes.clone())
        .unwrap();
    assert_eq!(tight.raw_stop_count, 0);

    let loose = PipelineConfig {
        detector: DetectorKind::Staypoint(StaypointDetector {
            distance_threshold_m: 500.0,
            min_duration_s: 300.0,
        }),
        ..PipelineConfig::default()
    };
    let profile = MobilityPipeline::new(loose).run("s1", fixes).unwrap();
    assert_eq!(profile.raw_stop_count, 1);
}
