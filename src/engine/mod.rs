//! # Engine components
//!
//! Focused subcomponents shared by the pipeline and the batch runner:
//! - `TraceStore` - per-subject raw fix storage
//! - `PlaceIndex` - R-tree over place centroids for nearest-place queries

pub mod place_index;
pub mod trace_store;

pub use place_index::PlaceIndex;
pub use trace_store::TraceStore;
