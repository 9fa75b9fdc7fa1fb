//! Planar projections for ground-distance computations
//!
//! Distances between schools are measured in a transverse Mercator plane on
//! the WGS84 ellipsoid, either a UTM zone or a zone centred on the data.
//! Coordinates are converted by PROJ; distortion is measured against geodesic
//! lengths on the ellipsoid.

use std::fmt;

use edumap_core::config::ProjectionKind;
use edumap_core::error::{EdumapError, Result};
use geo::{Distance, Geodesic, Point};
use proj::Proj;

const SOURCE_CRS: &str = "EPSG:4326";

/// Latitude limits of the UTM system
const UTM_MAX_LAT: f64 = 84.0;
const UTM_MIN_LAT: f64 = -80.0;

/// Step used to sample scale distortion, in degrees
const SCALE_STEP_DEG: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Utm { epsg: u32 },
    Local { lon0: f64 },
}

/// Planar projection used by a spatial index
pub struct Projection {
    target: Target,
    /// Latitude range accepted by `project`
    lat_range: (f64, f64),
    proj: Proj,
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("target", &self.target)
            .field("lat_range", &self.lat_range)
            .finish()
    }
}

impl Projection {
    /// WGS84 UTM zone `zone` (1..=60) in the given hemisphere
    pub fn utm(zone: u8, south: bool) -> Result<Self> {
        if !(1..=60).contains(&zone) {
            return Err(EdumapError::projection(format!("UTM zone {} outside 1..=60", zone)));
        }
        let epsg = if south { 32700 } else { 32600 } + u32::from(zone);
        let proj = new_proj(&format!("EPSG:{}", epsg))?;
        Ok(Self { target: Target::Utm { epsg }, lat_range: (UTM_MIN_LAT, UTM_MAX_LAT), proj })
    }

    /// Transverse Mercator centred on `lon0` with unit scale and no false origin
    pub fn local(lon0: f64) -> Result<Self> {
        if !lon0.is_finite() {
            return Err(EdumapError::projection(format!("non-finite central meridian {}", lon0)));
        }
        let definition = format!(
            "+proj=tmerc +lat_0=0 +lon_0={} +k=1 +x_0=0 +y_0=0 \
             +datum=WGS84 +units=m +no_defs +type=crs",
            lon0
        );
        let proj = new_proj(&definition)?;
        Ok(Self { target: Target::Local { lon0 }, lat_range: (-90.0, 90.0), proj })
    }

    /// Choose a projection for a set of `[lon, lat]` positions
    pub fn for_positions(kind: ProjectionKind, positions: &[[f64; 2]]) -> Result<Self> {
        let (lon, lat) = mean_position(positions);
        match kind {
            ProjectionKind::Utm => Self::utm(utm_zone(lon), lat < 0.0),
            ProjectionKind::Local => Self::local(lon),
        }
    }

    /// EPSG code of the target CRS, if it has one
    pub fn epsg(&self) -> Option<u32> {
        match self.target {
            Target::Utm { epsg } => Some(epsg),
            Target::Local { .. } => None,
        }
    }

    /// Human-readable description for logs
    pub fn describe(&self) -> String {
        match self.target {
            Target::Utm { epsg } => format!("UTM (EPSG:{})", epsg),
            Target::Local { lon0 } => format!("transverse Mercator lon0={:.4}", lon0),
        }
    }

    /// Project `[lon, lat]` degrees to planar metres
    pub fn project(&self, lon: f64, lat: f64) -> Result<[f64; 2]> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(EdumapError::projection(format!(
                "non-finite coordinate ({}, {})",
                lon, lat
            )));
        }
        if lat < self.lat_range.0 || lat > self.lat_range.1 {
            return Err(EdumapError::projection(format!(
                "latitude {} outside projection range [{}, {}]",
                lat, self.lat_range.0, self.lat_range.1
            )));
        }

        let (x, y) = self
            .proj
            .convert((lon, lat))
            .map_err(|e| EdumapError::projection(format!("Projection failed: {}", e)))?;
        if !x.is_finite() || !y.is_finite() {
            return Err(EdumapError::projection(format!(
                "{} has no finite position for ({}, {})",
                self.describe(),
                lon,
                lat
            )));
        }
        Ok([x, y])
    }

    /// Relative error of planar distance against ground distance near a point.
    ///
    /// Compares planar against geodesic length over short north and east steps.
    pub fn scale_error(&self, lon: f64, lat: f64) -> Result<f64> {
        let origin = self.project(lon, lat)?;
        let north_lat = if lat + SCALE_STEP_DEG > self.lat_range.1 {
            lat - SCALE_STEP_DEG
        } else {
            lat + SCALE_STEP_DEG
        };
        let east_lon = wrap_degrees(lon + SCALE_STEP_DEG);

        let mut worst: f64 = 0.0;
        for (step_lon, step_lat) in [(lon, north_lat), (east_lon, lat)] {
            let ground = Geodesic.distance(Point::new(lon, lat), Point::new(step_lon, step_lat));
            // east steps vanish near the poles
            if ground < 1.0 {
                continue;
            }
            let planar = planar_distance(origin, self.project(step_lon, step_lat)?);
            worst = worst.max((planar / ground - 1.0).abs());
        }
        Ok(worst)
    }

    /// Fail when any position is distorted beyond `max_scale_error`
    pub fn check_distortion(&self, positions: &[[f64; 2]], max_scale_error: f64) -> Result<()> {
        for &[lon, lat] in positions {
            let error = self.scale_error(lon, lat)?;
            if error > max_scale_error {
                return Err(EdumapError::projection(format!(
                    "{} distorts distances by {:.3}% at ({}, {}), limit is {:.3}%",
                    self.describe(),
                    error * 100.0,
                    lon,
                    lat,
                    max_scale_error * 100.0
                )));
            }
        }
        Ok(())
    }
}

fn new_proj(target: &str) -> Result<Proj> {
    Proj::new_known_crs(SOURCE_CRS, target, None).map_err(|e| {
        EdumapError::projection(format!(
            "Failed to create projection from {} to {}: {}",
            SOURCE_CRS, target, e
        ))
    })
}

/// Normalise a longitude into [-180, 180)
fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// UTM zone number containing a longitude
pub fn utm_zone(lon: f64) -> u8 {
    let zone = ((wrap_degrees(lon) + 180.0) / 6.0).floor() as i64 + 1;
    zone.clamp(1, 60) as u8
}

/// Euclidean distance between two planar points
pub fn planar_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn mean_position(positions: &[[f64; 2]]) -> (f64, f64) {
    if positions.is_empty() {
        return (0.0, 0.0);
    }
    let n = positions.len() as f64;
    let (lon, lat) =
        positions.iter().fold((0.0, 0.0), |(lon, lat), p| (lon + p[0], lat + p[1]));
    (lon / n, lat / n)
}
