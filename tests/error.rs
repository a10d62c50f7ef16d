//! Tests for error module

use traceprofile::error::{OptionExt, ProfileError};

#[test]
fn test_empty_trace_display() {
    let err = ProfileError::EmptyTrace {
        subject_id: "subject-9".to_string(),
    };
    assert!(err.to_string().contains("subject-9"));
    assert!(err.to_string().contains("empty"));
}

#[test]
fn test_invalid_coordinate_display() {
    let err = ProfileError::InvalidCoordinate {
        subject_id: "subject-9".to_string(),
        index: 17,
        lat: 999.0,
        lon: 2.35,
    };
    let msg = err.to_string();
    assert!(msg.contains("subject-9"));
    assert!(msg.contains("17"));
    assert!(msg.contains("999"));
}

#[test]
fn test_option_ext() {
    let none: Option<i32> = None;
    let result = none.ok_or_empty_trace("subject-9");
    assert!(matches!(result, Err(ProfileError::EmptyTrace { .. })));

    let some = Some(5).ok_or_empty_trace("subject-9");
    assert_eq!(some.unwrap(), 5);
}
