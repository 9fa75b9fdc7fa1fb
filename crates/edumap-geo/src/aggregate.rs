//! Per-district aggregation of schools.

use std::collections::BTreeMap;

use crate::index::SpatialIndex;
use crate::models::{CountResult, EducationLevel, School};
use crate::store::GeometryStore;

/// Count matching schools per district using their district code.
///
/// Every known district is present, zero-filled. Schools whose code names no
/// known district are left out of the keys and counted as unmatched.
pub fn count_by_district<P>(store: &GeometryStore, predicate: P) -> CountResult
where
    P: Fn(&School) -> bool + Clone,
{
    let mut result = CountResult::zero_filled(store.district_codes());
    let mut unknown_codes = Vec::new();

    for school in store.filter(predicate) {
        if !result.record(&school.district) {
            unknown_codes.push(school.district.as_str());
        }
    }

    if !unknown_codes.is_empty() {
        unknown_codes.sort_unstable();
        unknown_codes.dedup();
        tracing::warn!(
            schools = result.unmatched(),
            codes = ?unknown_codes,
            "Schools reference unknown districts"
        );
    }
    tracing::info!(
        districts = result.len(),
        matched = result.total(),
        unmatched = result.unmatched(),
        "Counted schools by district"
    );

    result
}

/// Count matching schools per district by point-in-polygon containment.
///
/// Schools outside every boundary are counted as unmatched.
pub fn count_by_containment<P>(
    store: &GeometryStore,
    index: &SpatialIndex<'_>,
    predicate: P,
) -> CountResult
where
    P: Fn(&School) -> bool + Clone,
{
    let mut result = CountResult::zero_filled(store.district_codes());

    for school in store.filter(predicate) {
        match index.district_of(school) {
            Some(code) => {
                result.record(code);
            }
            None => result.record_unmatched(),
        }
    }

    if result.unmatched() > 0 {
        tracing::warn!(schools = result.unmatched(), "Schools outside every district boundary");
    }
    tracing::info!(
        districts = result.len(),
        matched = result.total(),
        "Counted schools by containment"
    );

    result
}

/// Number of schools offering each of `levels`.
///
/// A school whose label mentions several levels counts toward each.
pub fn level_totals<I>(store: &GeometryStore, levels: I) -> BTreeMap<EducationLevel, usize>
where
    I: IntoIterator<Item = EducationLevel>,
{
    levels
        .into_iter()
        .map(|level| (level, store.filter(move |s| s.has_level(level)).count()))
        .collect()
}
