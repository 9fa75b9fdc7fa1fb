//! School point records.

use super::district::DistrictCode;
use crate::error::{EdumapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Education levels the dashboard reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    Inicial,
    Primaria,
    Secundaria,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 3] =
        [EducationLevel::Inicial, EducationLevel::Primaria, EducationLevel::Secundaria];

    /// Lower-case label as it appears inside level/modality strings
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Inicial => "inicial",
            EducationLevel::Primaria => "primaria",
            EducationLevel::Secundaria => "secundaria",
        }
    }

    /// Whether a normalized level/modality label belongs to this level.
    ///
    /// Labels such as `"inicial - jardín"` carry a modality suffix, so this is
    /// a substring match.
    pub fn matches(&self, label: &str) -> bool {
        label.contains(self.as_str())
    }
}

impl std::str::FromStr for EducationLevel {
    type Err = EdumapError;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim().to_lowercase();
        EducationLevel::ALL.into_iter().find(|level| level.matches(&label)).ok_or_else(|| {
            EdumapError::ConfigInvalid {
                key: "level".to_string(),
                reason: format!("Unknown education level: {}. Use inicial, primaria or secundaria", s),
            }
        })
    }
}

/// School row as delivered by the registry, before validation.
///
/// Field aliases follow the column headers of the national school listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolInput {
    #[serde(default, alias = "Código Modular", deserialize_with = "super::lenient_string")]
    pub id: Option<String>,

    #[serde(default, alias = "Latitud")]
    pub latitude: Option<f64>,

    #[serde(default, alias = "Longitud")]
    pub longitude: Option<f64>,

    #[serde(default, alias = "Ubigeo", deserialize_with = "super::lenient_string")]
    pub district_code: Option<String>,

    #[serde(default, alias = "Nivel / Modalidad")]
    pub level: Option<String>,

    #[serde(default, alias = "Departamento")]
    pub department: Option<String>,

    /// Columns outside the schema, passed through untouched
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl SchoolInput {
    /// Create an input row with every required field present
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        district_code: impl Into<String>,
        level: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            latitude: Some(latitude),
            longitude: Some(longitude),
            district_code: Some(district_code.into()),
            level: Some(level.into()),
            department: Some(department.into()),
            attributes: BTreeMap::new(),
        }
    }
}

/// Validated school record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub district: DistrictCode,
    /// Level/modality label, lower-cased
    pub level: String,
    pub department: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl School {
    /// Coordinates in `[lon, lat]` order
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Whether the school teaches the given level
    pub fn has_level(&self, level: EducationLevel) -> bool {
        level.matches(&self.level)
    }

    /// Case-insensitive department comparison
    pub fn in_department(&self, department: &str) -> bool {
        self.department.trim().eq_ignore_ascii_case(department.trim())
    }
}

impl TryFrom<SchoolInput> for School {
    type Error = EdumapError;

    fn try_from(input: SchoolInput) -> Result<Self> {
        let id = match input.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(EdumapError::validation("school <unknown>", "missing identifier")),
        };
        let record = format!("school {}", id);

        let latitude = input
            .latitude
            .ok_or_else(|| EdumapError::validation(&record, "missing latitude"))?;
        let longitude = input
            .longitude
            .ok_or_else(|| EdumapError::validation(&record, "missing longitude"))?;

        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(EdumapError::validation(
                &record,
                format!("latitude {} outside [-90, 90]", latitude),
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(EdumapError::validation(
                &record,
                format!("longitude {} outside [-180, 180]", longitude),
            ));
        }

        let raw_code = input
            .district_code
            .ok_or_else(|| EdumapError::validation(&record, "missing district code"))?;
        let district = DistrictCode::parse(&raw_code).map_err(|e| match e {
            EdumapError::Validation { reason, .. } => EdumapError::validation(&record, reason),
            other => other,
        })?;

        let level = match input.level.as_deref().map(str::trim) {
            Some(level) if !level.is_empty() => level.to_lowercase(),
            _ => return Err(EdumapError::validation(&record, "missing level")),
        };

        let department = match input.department.as_deref().map(str::trim) {
            Some(department) if !department.is_empty() => department.to_string(),
            _ => return Err(EdumapError::validation(&record, "missing department")),
        };

        Ok(School {
            id,
            latitude,
            longitude,
            district,
            level,
            department,
            attributes: input.attributes,
        })
    }
}
