//! Geometry models for edumap-geo.
//!
//! This module re-exports canonical types from `edumap-core` and bridges
//! district boundaries to the `geo` crate types used for computation.

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};
use serde::Serialize;

// Re-export canonical types from edumap-core
pub use edumap_core::models::{
    CountResult, DistrictCode, DistrictGeometry, DistrictInput, EducationLevel, Extremum,
    ProximityEntry, ProximityResult, School, SchoolFilter, SchoolInput,
};

fn to_line_string(ring: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(ring.iter().map(|c| Coord { x: c[0], y: c[1] }).collect())
}

fn to_polygon(rings: &[Vec<[f64; 2]>]) -> Polygon<f64> {
    match rings.split_first() {
        Some((exterior, interiors)) => Polygon::new(
            to_line_string(exterior),
            interiors.iter().map(|ring| to_line_string(ring)).collect(),
        ),
        None => Polygon::new(LineString::new(vec![]), vec![]),
    }
}

fn from_line_string(ring: &LineString<f64>) -> Vec<[f64; 2]> {
    ring.coords().map(|c| [c.x, c.y]).collect()
}

/// Convert a district boundary to a geo::MultiPolygon
pub fn to_geo_multi_polygon(geometry: &DistrictGeometry) -> MultiPolygon<f64> {
    match geometry {
        DistrictGeometry::Polygon { coordinates } => {
            MultiPolygon::new(vec![to_polygon(coordinates)])
        }
        DistrictGeometry::MultiPolygon { coordinates } => {
            MultiPolygon::new(coordinates.iter().map(|rings| to_polygon(rings)).collect())
        }
    }
}

/// Convert a geo::MultiPolygon back to a boundary geometry
pub fn from_geo_multi_polygon(shape: &MultiPolygon<f64>) -> DistrictGeometry {
    let polygons: Vec<Vec<Vec<[f64; 2]>>> = shape
        .iter()
        .map(|p| {
            let mut rings = vec![from_line_string(p.exterior())];
            rings.extend(p.interiors().iter().map(from_line_string));
            rings
        })
        .collect();

    match <[_; 1]>::try_from(polygons) {
        Ok([single]) => DistrictGeometry::polygon(single),
        Err(polygons) => DistrictGeometry::multi_polygon(polygons),
    }
}

/// Validated district with its load-time simplified boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct District {
    pub code: DistrictCode,
    pub department: Option<String>,
    #[serde(skip)]
    shape: MultiPolygon<f64>,
    #[serde(skip)]
    bbox: Rect<f64>,
}

impl District {
    /// Wrap a shape; `None` when the shape has no extent
    pub(crate) fn new(
        code: DistrictCode,
        department: Option<String>,
        shape: MultiPolygon<f64>,
    ) -> Option<Self> {
        let bbox = shape.bounding_rect()?;
        Some(Self { code, department, shape, bbox })
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Bounding box in `[lon, lat]` space
    pub fn bbox(&self) -> Rect<f64> {
        self.bbox
    }

    /// Boundary in GeoJSON-compatible form, for presentation layers
    pub fn geometry(&self) -> DistrictGeometry {
        from_geo_multi_polygon(&self.shape)
    }

    /// Case-insensitive department comparison
    pub fn in_department(&self, department: &str) -> bool {
        self.department
            .as_deref()
            .is_some_and(|d| d.trim().eq_ignore_ascii_case(department.trim()))
    }
}
