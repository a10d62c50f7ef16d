//! Tests for the activity cross-reference lookup

use chrono::{DateTime, Duration, TimeZone, Utc};
use traceprofile::{match_place_activities, ActivityEvent, CanonicalPlace, PlaceType};
use traceprofile::xref::UNMATCHED_ACTIVITY;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
}

fn place(offset_s: i64, duration_s: i64) -> CanonicalPlace {
    let start = t0() + Duration::seconds(offset_s);
    let end = start + Duration::seconds(duration_s);
    CanonicalPlace {
        place_type: PlaceType::Other,
        start_time: start,
        end_time: end,
        duration_s: duration_s as f64,
        lat: 48.8566,
        lon: 2.3522,
        group_size: 1,
        merged_starts: vec![start],
        merged_ends: vec![end],
    }
}

fn event(offset_s: i64, label: &str) -> ActivityEvent {
    ActivityEvent {
        timestamp: t0() + Duration::seconds(offset_s),
        label: label.to_string(),
    }
}

#[test]
fn test_first_event_inside_interval_wins() {
    let places = vec![place(0, 3600)];
    let events = vec![event(600, "shopping"), event(1200, "lunch")];
    assert_eq!(match_place_activities(&places, &events), vec!["shopping"]);
}

#[test]
fn test_unmatched_place_gets_sentinel() {
    let places = vec![place(0, 600)];
    let events = vec![event(7200, "shopping")];
    assert_eq!(
        match_place_activities(&places, &events),
        vec![UNMATCHED_ACTIVITY]
    );
}

#[test]
fn test_events_sorted_before_matching() {
    // Unsorted input: the chronologically first in-interval event still wins
    let places = vec![place(0, 3600)];
    let events = vec![event(1200, "lunch"), event(600, "shopping")];
    assert_eq!(match_place_activities(&places, &events), vec!["shopping"]);
}

#[test]
fn test_one_label_per_place() {
    let places = vec![place(0, 600), place(7200, 600), place(14_400, 600)];
    let events = vec![event(300, "errand"), event(7500, "sport")];
    assert_eq!(
        match_place_activities(&places, &events),
        vec!["errand", "sport", UNMATCHED_ACTIVITY]
    );
}

#[test]
fn test_no_events_all_sentinel() {
    let places = vec![place(0, 600)];
    assert_eq!(match_place_activities(&places, &[]), vec![UNMATCHED_ACTIVITY]);
}
