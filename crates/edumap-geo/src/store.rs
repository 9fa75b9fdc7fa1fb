//! Immutable store of validated schools and districts.

use std::collections::{BTreeMap, HashMap};

use edumap_core::config::LayeredConfig;
use edumap_core::error::{EdumapError, Result};
use geo::CoordsIter;

use crate::models::{
    to_geo_multi_polygon, District, DistrictCode, DistrictInput, School, SchoolInput,
};
use crate::simplify::simplify_multi_polygon;
use crate::validation::validate_district_geometry;

/// Schools and districts of one dataset snapshot.
///
/// Records keep their input order, which is the order iteration, lookups by
/// slot and tie-breaks downstream rely on.
#[derive(Debug, Clone)]
pub struct GeometryStore {
    schools: Vec<School>,
    school_slots: HashMap<String, usize>,
    districts: Vec<District>,
    district_slots: BTreeMap<DistrictCode, usize>,
}

impl GeometryStore {
    /// Validate and load records.
    ///
    /// Every record is checked before failing; the first problem is returned
    /// and the total is logged.
    pub fn load(
        schools: Vec<SchoolInput>,
        districts: Vec<DistrictInput>,
        config: &LayeredConfig,
    ) -> Result<Self> {
        let tolerance = config.simplify_tolerance.value;
        let mut errors = Vec::new();

        let mut valid_schools = Vec::with_capacity(schools.len());
        let mut school_slots = HashMap::with_capacity(schools.len());
        for input in schools {
            match School::try_from(input) {
                Ok(school) => {
                    if school_slots.contains_key(&school.id) {
                        errors.push(EdumapError::validation(
                            format!("school {}", school.id),
                            "duplicate identifier",
                        ));
                        continue;
                    }
                    school_slots.insert(school.id.clone(), valid_schools.len());
                    valid_schools.push(school);
                }
                Err(e) => errors.push(e),
            }
        }

        let mut valid_districts = Vec::with_capacity(districts.len());
        let mut district_slots = BTreeMap::new();
        let mut simplified = 0usize;
        for input in districts {
            match load_district(input, tolerance) {
                Ok((district, reduced)) => {
                    if district_slots.contains_key(&district.code) {
                        errors.push(EdumapError::validation(
                            format!("district {}", district.code),
                            "duplicate district code",
                        ));
                        continue;
                    }
                    if reduced {
                        simplified += 1;
                    }
                    district_slots.insert(district.code.clone(), valid_districts.len());
                    valid_districts.push(district);
                }
                Err(e) => errors.push(e),
            }
        }

        if let Some(first) = errors.first() {
            tracing::warn!(invalid = errors.len(), first = %first, "Rejected dataset");
            return Err(errors.swap_remove(0));
        }

        tracing::debug!(simplified, tolerance, "Simplified district boundaries");
        tracing::info!(
            schools = valid_schools.len(),
            districts = valid_districts.len(),
            "Loaded geometry store"
        );

        Ok(Self {
            schools: valid_schools,
            school_slots,
            districts: valid_districts,
            district_slots,
        })
    }

    /// Build a store from records that are already validated
    fn from_parts(schools: Vec<School>, districts: Vec<District>) -> Self {
        let school_slots =
            schools.iter().enumerate().map(|(slot, s)| (s.id.clone(), slot)).collect();
        let district_slots =
            districts.iter().enumerate().map(|(slot, d)| (d.code.clone(), slot)).collect();
        Self { schools, school_slots, districts, district_slots }
    }

    /// Lazily iterate over schools matching `predicate`, in store order.
    ///
    /// The iterator is `Clone`, so a pass can be restarted from a saved copy.
    pub fn filter<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a School> + Clone + 'a
    where
        P: Fn(&School) -> bool + Clone + 'a,
    {
        self.schools.iter().filter(move |&school| predicate(school))
    }

    /// District boundary for a code
    pub fn by_district(&self, code: &DistrictCode) -> Result<&District> {
        self.district_slots
            .get(code)
            .map(|&slot| &self.districts[slot])
            .ok_or_else(|| EdumapError::not_found("District", code.as_str()))
    }

    /// Known district codes in ascending order
    pub fn district_codes(&self) -> impl Iterator<Item = &DistrictCode> + '_ {
        self.district_slots.keys()
    }

    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn school(&self, id: &str) -> Option<&School> {
        self.slot_of(id).map(|slot| &self.schools[slot])
    }

    /// Position of a school in store order
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.school_slots.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty() && self.districts.is_empty()
    }

    /// Restrict the store to one department.
    ///
    /// Districts without a department attribute are kept when a retained
    /// school references them.
    pub fn scoped_to_department(&self, department: &str) -> Result<Self> {
        let schools: Vec<School> =
            self.schools.iter().filter(|s| s.in_department(department)).cloned().collect();

        let referenced: std::collections::HashSet<&DistrictCode> =
            schools.iter().map(|s| &s.district).collect();
        let districts: Vec<District> = self
            .districts
            .iter()
            .filter(|d| match &d.department {
                Some(_) => d.in_department(department),
                None => referenced.contains(&d.code),
            })
            .cloned()
            .collect();

        if schools.is_empty() && districts.is_empty() {
            return Err(EdumapError::not_found("Department", department));
        }

        tracing::debug!(
            department,
            schools = schools.len(),
            districts = districts.len(),
            "Scoped geometry store"
        );
        Ok(Self::from_parts(schools, districts))
    }
}

/// Validate, convert and simplify one district; the flag reports whether
/// simplification dropped coordinates
fn load_district(input: DistrictInput, tolerance: f64) -> Result<(District, bool)> {
    let raw_code = match input.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => return Err(EdumapError::validation("district <unknown>", "missing district code")),
    };
    let record = format!("district {}", raw_code);

    let code = DistrictCode::parse(&raw_code).map_err(|e| match e {
        EdumapError::Validation { reason, .. } => EdumapError::validation(&record, reason),
        other => other,
    })?;
    let geometry =
        input.geometry.ok_or_else(|| EdumapError::validation(&record, "missing geometry"))?;
    validate_district_geometry(&geometry).into_result(&record)?;

    let shape = to_geo_multi_polygon(&geometry);
    let simplified = simplify_multi_polygon(&shape, tolerance);
    let reduced = simplified.coords_count() < shape.coords_count();

    let department = input.department.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
    let district = District::new(code, department, simplified)
        .ok_or_else(|| EdumapError::validation(&record, "boundary has no extent"))?;
    Ok((district, reduced))
}
