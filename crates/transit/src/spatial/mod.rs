//! Spatial indexing and geometry helpers.

pub mod index;
pub mod queries;

pub use index::SegmentIndex;
pub use queries::{bbox_contains, interpolation_fraction, planar_distance};
