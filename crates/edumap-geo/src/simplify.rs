//! Load-time boundary simplification.
//!
//! Polygons are reduced with geo's Douglas-Peucker. A simplified polygon is
//! only accepted when it is still a valid polygon: simple rings, holes inside
//! the shell and no crossing rings. Otherwise the tolerance is halved and the
//! polygon retried, falling back to the input geometry.

use geo::{MultiPolygon, Polygon, Simplify, Validation};

/// Attempts before an unsimplifiable polygon is kept as is
const MAX_ATTEMPTS: usize = 4;

/// Simplify every polygon of a boundary
pub fn simplify_multi_polygon(shape: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(shape.iter().map(|p| simplify_polygon(p, tolerance)).collect())
}

/// Topology-preserving simplification of one polygon
pub fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    if tolerance.is_nan() || tolerance <= 0.0 {
        return polygon.clone();
    }

    let mut epsilon = tolerance;
    for _ in 0..MAX_ATTEMPTS {
        let candidate = polygon.simplify(epsilon);
        if candidate.is_valid() {
            return candidate;
        }
        epsilon /= 2.0;
    }

    tracing::debug!(points = polygon.exterior().0.len(), "Keeping polygon unsimplified");
    polygon.clone()
}
