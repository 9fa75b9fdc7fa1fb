//! edumap Geo - Geometry store, spatial index, and school analyses
//!
//! This crate validates school and district records into a geometry store,
//! indexes them for containment and radius queries, and computes the
//! per-district counts and proximity counts consumed by presentation layers.

pub mod aggregate;
pub mod grid;
pub mod index;
pub mod models;
pub mod proximity;
pub mod simplify;
pub mod store;
pub mod transform;
pub mod validation;

pub use aggregate::{count_by_containment, count_by_district, level_totals};
pub use index::{CandidateSet, SpatialIndex};
pub use proximity::{count_nearby, count_nearby_with_config};
pub use store::GeometryStore;
pub use transform::Projection;
