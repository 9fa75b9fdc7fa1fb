//! Read-only spatial index over a [`GeometryStore`].
//!
//! District boundaries go into an R-tree keyed by bounding box; containment
//! narrows by box first and then tests the exact boundary. Schools are
//! projected once into a metric plane and bucketed into a [`PointGrid`] for
//! radius queries.

use std::collections::BTreeSet;

use edumap_core::config::LayeredConfig;
use edumap_core::error::{EdumapError, Result};
use geo::{Intersects, Point};
use rstar::{RTree, RTreeObject, AABB};

use crate::grid::PointGrid;
use crate::models::{DistrictCode, School};
use crate::store::GeometryStore;
use crate::transform::{planar_distance, Projection};

/// District bounding box with its slot in the store
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDistrict {
    pub slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl IndexedDistrict {
    fn new(slot: usize, min: [f64; 2], max: [f64; 2]) -> Self {
        Self { slot, envelope: AABB::from_corners(min, max) }
    }
}

impl RTreeObject for IndexedDistrict {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Membership set over store schools, used to restrict radius queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    members: Vec<bool>,
    len: usize,
}

impl CandidateSet {
    pub fn contains(&self, slot: usize) -> bool {
        self.members.get(slot).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Spatial index borrowing an immutable store
#[derive(Debug)]
pub struct SpatialIndex<'s> {
    store: &'s GeometryStore,
    tree: RTree<IndexedDistrict>,
    projection: Projection,
    /// Planar position of each school, by store slot
    projected: Vec<[f64; 2]>,
    grid: PointGrid,
    max_scale_error: f64,
}

impl<'s> SpatialIndex<'s> {
    /// Build the index, choosing the projection from the store's schools
    pub fn build(store: &'s GeometryStore, config: &LayeredConfig) -> Result<Self> {
        config.validate()?;
        let positions: Vec<[f64; 2]> = store.schools().iter().map(School::lon_lat).collect();
        let projection = Projection::for_positions(config.projection.value, &positions)?;
        Self::build_with_projection(store, projection, config)
    }

    /// Build the index with an explicit projection
    pub fn build_with_projection(
        store: &'s GeometryStore,
        projection: Projection,
        config: &LayeredConfig,
    ) -> Result<Self> {
        config.validate()?;
        let max_scale_error = config.max_scale_error.value;

        let positions: Vec<[f64; 2]> = store.schools().iter().map(School::lon_lat).collect();
        projection.check_distortion(&positions, max_scale_error)?;

        let projected = positions
            .iter()
            .map(|&[lon, lat]| projection.project(lon, lat))
            .collect::<Result<Vec<_>>>()?;

        let mut grid = PointGrid::new(config.effective_grid_cell_m());
        for (slot, &[x, y]) in projected.iter().enumerate() {
            grid.insert(x, y, slot);
        }

        let indexed: Vec<IndexedDistrict> = store
            .districts()
            .iter()
            .enumerate()
            .map(|(slot, district)| {
                let (min, max) = (district.bbox().min(), district.bbox().max());
                IndexedDistrict::new(slot, [min.x, min.y], [max.x, max.y])
            })
            .collect();
        let tree = RTree::bulk_load(indexed);

        tracing::debug!(
            points = projected.len(),
            cells = grid.occupied_cells(),
            cell_size_m = grid.cell_size(),
            districts = tree.size(),
            projection = %projection.describe(),
            "Built spatial index"
        );

        Ok(Self { store, tree, projection, projected, grid, max_scale_error })
    }

    pub fn store(&self) -> &'s GeometryStore {
        self.store
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// District containing a school, boundary inclusive
    pub fn district_of(&self, school: &School) -> Option<&'s DistrictCode> {
        self.district_at(school.longitude, school.latitude)
    }

    /// District containing `(lon, lat)`.
    ///
    /// A point on a shared boundary belongs to the district earliest in
    /// store order.
    pub fn district_at(&self, lon: f64, lat: f64) -> Option<&'s DistrictCode> {
        let store: &'s GeometryStore = self.store;
        let point = Point::new(lon, lat);

        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .filter(|entry| store.districts()[entry.slot].shape().intersects(&point))
            .map(|entry| entry.slot)
            .min()
            .map(|slot| &store.districts()[slot].code)
    }

    /// Membership set for schools of this index's store
    pub fn candidates<'a, I>(&self, schools: I) -> Result<CandidateSet>
    where
        I: IntoIterator<Item = &'a School>,
    {
        let mut members = vec![false; self.projected.len()];
        let mut len = 0;
        for school in schools {
            let slot = self
                .store
                .slot_of(&school.id)
                .ok_or_else(|| EdumapError::not_found("School", school.id.as_str()))?;
            if !members[slot] {
                members[slot] = true;
                len += 1;
            }
        }
        Ok(CandidateSet { members, len })
    }

    /// Planar position of a school.
    ///
    /// Store members reuse their cached position; other schools are checked
    /// against the distortion limit first.
    pub fn planar_position(&self, school: &School) -> Result<[f64; 2]> {
        if let Some(slot) = self.store.slot_of(&school.id) {
            let cached = &self.store.schools()[slot];
            if cached.longitude == school.longitude && cached.latitude == school.latitude {
                return Ok(self.projected[slot]);
            }
        }

        let error = self.projection.scale_error(school.longitude, school.latitude)?;
        if error > self.max_scale_error {
            return Err(EdumapError::projection(format!(
                "query centre {} at ({}, {}) distorted by {:.3}%, limit is {:.3}%",
                school.id,
                school.longitude,
                school.latitude,
                error * 100.0,
                self.max_scale_error * 100.0
            )));
        }
        self.projection.project(school.longitude, school.latitude)
    }

    /// Ids of candidate schools within `radius_m` metres of `center`
    pub fn within(
        &self,
        center: &School,
        radius_m: f64,
        candidates: &CandidateSet,
    ) -> Result<BTreeSet<&'s str>> {
        check_radius(radius_m)?;
        let store: &'s GeometryStore = self.store;
        let origin = self.planar_position(center)?;

        Ok(self
            .grid
            .query(origin[0], origin[1], radius_m)
            .filter(|&slot| candidates.contains(slot))
            .filter(|&slot| planar_distance(origin, self.projected[slot]) <= radius_m)
            .map(|slot| store.schools()[slot].id.as_str())
            .collect())
    }
}

/// Radii must be finite and non-negative
pub(crate) fn check_radius(radius_m: f64) -> Result<()> {
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(EdumapError::validation(
            "radius",
            format!("radius must be a finite, non-negative number of metres, got {}", radius_m),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistrictGeometry, DistrictInput, SchoolInput};
    use edumap_core::config::ProjectionKind;

    fn square(x0: f64, y0: f64, size: f64) -> DistrictGeometry {
        DistrictGeometry::polygon(vec![vec![
            [x0, y0],
            [x0 + size, y0],
            [x0 + size, y0 + size],
            [x0, y0 + size],
            [x0, y0],
        ]])
    }

    fn school(id: &str, lon: f64, lat: f64) -> SchoolInput {
        SchoolInput::new(id, lat, lon, "110101", "primaria", "ICA")
    }

    fn ica_store() -> GeometryStore {
        GeometryStore::load(
            vec![
                school("a", -75.75, -14.05),
                school("b", -75.74, -14.05),
                school("c", -75.50, -14.05),
                school("d", -75.25, -14.25),
            ],
            vec![
                DistrictInput::new("110101", square(-76.0, -14.5, 0.5)),
                DistrictInput::new("110102", square(-75.5, -14.5, 0.5)),
            ],
            &LayeredConfig::with_defaults(),
        )
        .unwrap()
    }

    #[test]
    fn test_district_of() {
        let store = ica_store();
        let index = SpatialIndex::build(&store, &LayeredConfig::with_defaults()).unwrap();

        let a = store.school("a").unwrap();
        assert_eq!(index.district_of(a).map(|c| c.as_str()), Some("110101"));
        let d = store.school("d").unwrap();
        assert_eq!(index.district_of(d).map(|c| c.as_str()), Some("110102"));
        assert_eq!(index.district_at(-70.0, -14.0), None);
    }

    #[test]
    fn test_shared_boundary_goes_to_first_district() {
        let store = ica_store();
        let index = SpatialIndex::build(&store, &LayeredConfig::with_defaults()).unwrap();

        // school c sits on the shared edge at lon -75.5
        let c = store.school("c").unwrap();
        assert_eq!(index.district_of(c).map(|code| code.as_str()), Some("110101"));
    }

    #[test]
    fn test_within_filters_candidates_and_distance() {
        let store = ica_store();
        let index = SpatialIndex::build(&store, &LayeredConfig::with_defaults()).unwrap();
        let a = store.school("a").unwrap();

        let all = index.candidates(store.schools()).unwrap();
        let near: Vec<&str> = index.within(a, 5000.0, &all).unwrap().into_iter().collect();
        // b is about 1.1 km east, c about 27 km east
        assert_eq!(near, vec!["a", "b"]);

        let only_c = index.candidates(store.filter(|s| s.id == "c")).unwrap();
        assert!(index.within(a, 5000.0, &only_c).unwrap().is_empty());
        assert_eq!(index.within(a, 30_000.0, &only_c).unwrap().len(), 1);
    }

    #[test]
    fn test_candidates_reject_foreign_schools() {
        let store = ica_store();
        let index = SpatialIndex::build(&store, &LayeredConfig::with_defaults()).unwrap();
        let foreign = School::try_from(school("z", -75.0, -14.0)).unwrap();

        let err = index.candidates([&foreign]).unwrap_err();
        assert!(err.is_not_found());

        // foreign centres are fine
        let all = index.candidates(store.schools()).unwrap();
        assert_eq!(all.len(), 4);
        assert!(index.within(&foreign, 1.0, &all).unwrap().is_empty());
    }

    #[test]
    fn test_within_rejects_bad_radius() {
        let store = ica_store();
        let index = SpatialIndex::build(&store, &LayeredConfig::with_defaults()).unwrap();
        let a = store.school("a").unwrap();
        let all = index.candidates(store.schools()).unwrap();

        for radius in [-1.0, f64::NAN, f64::INFINITY] {
            let err = index.within(a, radius, &all).unwrap_err();
            assert!(matches!(err, EdumapError::Validation { .. }));
        }
    }

    #[test]
    fn test_within_radius_beyond_grid_cell() {
        let store = ica_store();
        let mut config = LayeredConfig::with_defaults();
        config.grid_cell_m.value = 1000.0;
        config.proximity_radius_m.value = 1000.0;
        let index = SpatialIndex::build(&store, &config).unwrap();
        let a = store.school("a").unwrap();
        let all = index.candidates(store.schools()).unwrap();

        // c is about 27 km east of a, d about 58 km south-east
        let ids = |radius| index.within(a, radius, &all).unwrap().into_iter().collect::<Vec<_>>();
        assert_eq!(ids(30_000.0), vec!["a", "b", "c"]);
        assert_eq!(ids(5.0e6), vec!["a", "b", "c", "d"]);
        assert_eq!(ids(1e300), vec!["a", "b", "c", "d"]);
        assert_eq!(ids(f64::MAX), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_build_rejects_distorted_projection() {
        let store = GeometryStore::load(
            vec![school("west", -80.0, -10.0), school("east", -62.0, -10.0)],
            vec![],
            &LayeredConfig::with_defaults(),
        )
        .unwrap();

        let err = SpatialIndex::build(&store, &LayeredConfig::with_defaults()).unwrap_err();
        assert!(matches!(err, EdumapError::Projection { .. }));
    }

    #[test]
    fn test_centre_outside_tolerance() {
        let store = ica_store();
        let mut config = LayeredConfig::with_defaults();
        config.projection.value = ProjectionKind::Local;
        let index = SpatialIndex::build(&store, &config).unwrap();
        let all = index.candidates(store.schools()).unwrap();

        let far = School::try_from(school("far", -60.0, -14.0)).unwrap();
        let err = index.within(&far, 5000.0, &all).unwrap_err();
        assert!(matches!(err, EdumapError::Projection { .. }));
    }

    #[test]
    fn test_explicit_projection() {
        let store = ica_store();
        let projection = Projection::local(-75.6).unwrap();
        let index =
            SpatialIndex::build_with_projection(&store, projection, &LayeredConfig::with_defaults())
                .unwrap();
        assert!(index.projection().describe().contains("lon0=-75.6000"));
        assert_eq!(index.store().schools().len(), 4);
    }
}
