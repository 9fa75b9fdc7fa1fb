use crate::error::{EdumapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Set programmatically by the embedding application
    Override,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Override => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Planar projection used for distance computations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    /// UTM zone picked from the mean position of the dataset
    #[default]
    Utm,
    /// Transverse Mercator centred on the dataset's mean longitude, unit scale
    Local,
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionKind::Utm => f.write_str("utm"),
            ProjectionKind::Local => f.write_str("local"),
        }
    }
}

/// Default simplification tolerance, in source coordinate units (degrees)
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.01;

/// Default proximity radius in metres
pub const DEFAULT_PROXIMITY_RADIUS_M: f64 = 5000.0;

/// Default largest accepted relative scale error of the planar projection
pub const DEFAULT_MAX_SCALE_ERROR: f64 = 0.005;

/// Layered configuration for edumap
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub simplify_tolerance: ConfigValue<f64>,
    pub proximity_radius_m: ConfigValue<f64>,
    pub grid_cell_m: ConfigValue<f64>,
    pub max_scale_error: ConfigValue<f64>,
    pub projection: ConfigValue<ProjectionKind>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            simplify_tolerance: ConfigValue::new(DEFAULT_SIMPLIFY_TOLERANCE, ConfigSource::Default),
            proximity_radius_m: ConfigValue::new(DEFAULT_PROXIMITY_RADIUS_M, ConfigSource::Default),
            grid_cell_m: ConfigValue::new(DEFAULT_PROXIMITY_RADIUS_M, ConfigSource::Default),
            max_scale_error: ConfigValue::new(DEFAULT_MAX_SCALE_ERROR, ConfigSource::Default),
            projection: ConfigValue::new(ProjectionKind::Utm, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| EdumapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(tolerance) = file_config.simplify_tolerance {
            self.simplify_tolerance.update(tolerance, ConfigSource::File);
        }

        if let Some(radius) = file_config.proximity_radius_m {
            self.proximity_radius_m.update(radius, ConfigSource::File);
        }

        if let Some(cell) = file_config.grid_cell_m {
            self.grid_cell_m.update(cell, ConfigSource::File);
        }

        if let Some(max_error) = file_config.max_scale_error {
            self.max_scale_error.update(max_error, ConfigSource::File);
        }

        if let Some(projection) = file_config.projection {
            self.projection.update(projection, ConfigSource::File);
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        load_f64_env("EDUMAP_SIMPLIFY_TOLERANCE", &mut self.simplify_tolerance);
        load_f64_env("EDUMAP_PROXIMITY_RADIUS_M", &mut self.proximity_radius_m);
        load_f64_env("EDUMAP_GRID_CELL_M", &mut self.grid_cell_m);
        load_f64_env("EDUMAP_MAX_SCALE_ERROR", &mut self.max_scale_error);

        // EDUMAP_PROJECTION
        if let Ok(projection_str) = env::var("EDUMAP_PROJECTION") {
            match parse_projection_kind(&projection_str) {
                Ok(kind) => self.projection.update(kind, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid EDUMAP_PROJECTION value '{}': expected utm or local",
                    projection_str
                ),
            }
        }

        self
    }

    /// Apply programmatic overrides
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(tolerance) = overrides.simplify_tolerance {
            self.simplify_tolerance.update(tolerance, ConfigSource::Override);
        }

        if let Some(radius) = overrides.proximity_radius_m {
            self.proximity_radius_m.update(radius, ConfigSource::Override);
        }

        if let Some(cell) = overrides.grid_cell_m {
            self.grid_cell_m.update(cell, ConfigSource::Override);
        }

        if let Some(max_error) = overrides.max_scale_error {
            self.max_scale_error.update(max_error, ConfigSource::Override);
        }

        if let Some(projection) = overrides.projection {
            self.projection.update(projection, ConfigSource::Override);
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        check_non_negative("simplify_tolerance", self.simplify_tolerance.value)?;
        check_positive("proximity_radius_m", self.proximity_radius_m.value)?;
        check_positive("grid_cell_m", self.grid_cell_m.value)?;
        check_positive("max_scale_error", self.max_scale_error.value)?;
        Ok(())
    }

    /// Grid cell size actually used by the point index.
    ///
    /// Never smaller than the proximity radius, so a default-radius query
    /// only touches the 3x3 neighbourhood of its cell.
    pub fn effective_grid_cell_m(&self) -> f64 {
        self.grid_cell_m.value.max(self.proximity_radius_m.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "simplify_tolerance".to_string(),
            (self.simplify_tolerance.value.to_string(), self.simplify_tolerance.source),
        );

        map.insert(
            "proximity_radius_m".to_string(),
            (self.proximity_radius_m.value.to_string(), self.proximity_radius_m.source),
        );

        map.insert(
            "grid_cell_m".to_string(),
            (self.grid_cell_m.value.to_string(), self.grid_cell_m.source),
        );

        map.insert(
            "max_scale_error".to_string(),
            (self.max_scale_error.value.to_string(), self.max_scale_error.source),
        );

        map.insert(
            "projection".to_string(),
            (self.projection.value.to_string(), self.projection.source),
        );

        map
    }
}

fn load_f64_env(var: &str, target: &mut ConfigValue<f64>) {
    if let Ok(raw) = env::var(var) {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => target.update(value, ConfigSource::Environment),
            _ => tracing::warn!("Invalid {} value '{}': expected a finite number", var, raw),
        }
    }
}

fn check_positive(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EdumapError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("must be a positive finite number, got {}", value),
        })
    }
}

fn check_non_negative(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EdumapError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("must be a non-negative finite number, got {}", value),
        })
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    simplify_tolerance: Option<f64>,
    proximity_radius_m: Option<f64>,
    grid_cell_m: Option<f64>,
    max_scale_error: Option<f64>,
    projection: Option<ProjectionKind>,
}

/// Programmatic configuration overrides
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub simplify_tolerance: Option<f64>,
    pub proximity_radius_m: Option<f64>,
    pub grid_cell_m: Option<f64>,
    pub max_scale_error: Option<f64>,
    pub projection: Option<ProjectionKind>,
}

/// Parse projection kind from string
pub fn parse_projection_kind(s: &str) -> Result<ProjectionKind> {
    match s.trim().to_lowercase().as_str() {
        "utm" => Ok(ProjectionKind::Utm),
        "local" | "tm" => Ok(ProjectionKind::Local),
        _ => Err(EdumapError::ConfigInvalid {
            key: "projection".to_string(),
            reason: format!("Invalid projection: {}. Use utm or local", s),
        }),
    }
}
