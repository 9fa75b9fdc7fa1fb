//! District identifiers and boundary inputs.
//!
//! Districts are keyed by a fixed-width, zero-padded six digit code (the
//! UBIGEO used by the boundary layer and the school registry alike).

use crate::error::{EdumapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a normalized district code
pub const DISTRICT_CODE_WIDTH: usize = 6;

/// Normalized six digit district code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DistrictCode(String);

impl DistrictCode {
    /// Normalize a raw code into the fixed-width form.
    ///
    /// Accepts surrounding whitespace and the `.0` suffix spreadsheets leave on
    /// numeric columns; shorter codes are left-padded with zeros.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(EdumapError::validation(
                format!("district code '{}'", raw),
                "district code is empty",
            ));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(EdumapError::validation(
                format!("district code '{}'", raw),
                "district code must contain only digits",
            ));
        }
        if digits.len() > DISTRICT_CODE_WIDTH {
            return Err(EdumapError::validation(
                format!("district code '{}'", raw),
                format!("district code longer than {} digits", DISTRICT_CODE_WIDTH),
            ));
        }

        Ok(Self(format!("{:0>width$}", digits, width = DISTRICT_CODE_WIDTH)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistrictCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DistrictCode {
    type Error = EdumapError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DistrictCode> for String {
    fn from(code: DistrictCode) -> Self {
        code.0
    }
}

impl AsRef<str> for DistrictCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// GeoJSON-compatible boundary geometry in `[lon, lat]` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DistrictGeometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl DistrictGeometry {
    /// Create a single polygon geometry from its rings (exterior first)
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        DistrictGeometry::Polygon { coordinates: rings }
    }

    /// Create a multi polygon geometry
    pub fn multi_polygon(polygons: Vec<Vec<Vec<[f64; 2]>>>) -> Self {
        DistrictGeometry::MultiPolygon { coordinates: polygons }
    }

    /// Iterate over the polygons as ring lists
    pub fn polygons(&self) -> Vec<&Vec<Vec<[f64; 2]>>> {
        match self {
            DistrictGeometry::Polygon { coordinates } => vec![coordinates],
            DistrictGeometry::MultiPolygon { coordinates } => coordinates.iter().collect(),
        }
    }
}

/// District boundary as delivered by the boundary layer, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistrictInput {
    #[serde(default, alias = "IDDIST", deserialize_with = "super::lenient_string")]
    pub code: Option<String>,

    #[serde(default, alias = "DEPARTAMEN", alias = "Departamento")]
    pub department: Option<String>,

    #[serde(default)]
    pub geometry: Option<DistrictGeometry>,
}

impl DistrictInput {
    pub fn new(code: impl Into<String>, geometry: DistrictGeometry) -> Self {
        Self { code: Some(code.into()), department: None, geometry: Some(geometry) }
    }

    /// Attach the department the district belongs to
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }
}
