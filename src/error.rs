//! Unified error handling for the mobility pipeline.
//!
//! Structurally invalid input aborts processing for the affected subject
//! only; degenerate intermediate results (no stops, no moves, no Home
//! candidate) are NOT errors and flow forward as empty result sets.

use thiserror::Error;

/// Result type alias using [`ProfileError`].
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Errors produced while preparing or profiling a trace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// The subject has no GPS fixes at all.
    #[error("trace for subject '{subject_id}' is empty")]
    EmptyTrace { subject_id: String },

    /// A fix carries non-finite or out-of-range coordinates.
    ///
    /// `index` refers to the position in the input sequence before sorting.
    #[error(
        "fix {index} for subject '{subject_id}' has invalid coordinates ({lat}, {lon}); \
         expected finite lat in [-90, 90] and lon in [-180, 180]"
    )]
    InvalidCoordinate {
        subject_id: String,
        index: usize,
        lat: f64,
        lon: f64,
    },
}

/// Extension trait for converting `Option` into trace-shaped errors.
pub trait OptionExt<T> {
    /// Convert `None` into [`ProfileError::EmptyTrace`].
    fn ok_or_empty_trace(self, subject_id: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty_trace(self, subject_id: &str) -> Result<T> {
        self.ok_or_else(|| ProfileError::EmptyTrace {
            subject_id: subject_id.to_string(),
        })
    }
}
