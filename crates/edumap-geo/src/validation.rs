use crate::models::DistrictGeometry;
use edumap_core::error::{EdumapError, Result};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// Convert into an error naming the first problem of `record`
    pub fn into_result(self, record: &str) -> Result<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(EdumapError::validation(
                record,
                format!("{}: {}", first.location, first.reason),
            )),
        }
    }
}

/// Validate a district boundary.
///
/// Rings need four coordinates and finite values. Unclosed rings are not an
/// error; they are closed on conversion.
pub fn validate_district_geometry(geometry: &DistrictGeometry) -> ValidationResult {
    let mut result = ValidationResult::valid();
    let polygons = geometry.polygons();

    if polygons.is_empty() {
        result.add_error("MultiPolygon".to_string(), "geometry has no polygons".to_string());
        return result;
    }

    for (i, rings) in polygons.iter().enumerate() {
        let location = match geometry {
            DistrictGeometry::Polygon { .. } => "Polygon".to_string(),
            DistrictGeometry::MultiPolygon { .. } => format!("MultiPolygon[{}]", i),
        };

        if rings.is_empty() {
            result.add_error(location, "polygon has no exterior ring".to_string());
            continue;
        }

        for (j, ring) in rings.iter().enumerate() {
            let ring_location = if j == 0 {
                format!("{} exterior", location)
            } else {
                format!("{} interior[{}]", location, j - 1)
            };
            validate_ring(ring, ring_location, &mut result);
        }
    }

    result
}

fn validate_ring(ring: &[[f64; 2]], location: String, result: &mut ValidationResult) {
    // An open ring gains its closing coordinate later
    let closed = ring.first() == ring.last();
    let effective_len = if closed { ring.len() } else { ring.len() + 1 };

    if ring.is_empty() || effective_len < 4 {
        result.add_error(
            location.clone(),
            format!("ring must have at least 4 points, found {}", ring.len()),
        );
    }

    for (i, coord) in ring.iter().enumerate() {
        if !coord[0].is_finite() || !coord[1].is_finite() {
            result.add_error(format!("{}[{}]", location, i), "Coordinates must be finite".to_string());
        }
    }
}
