//! Radius-based proximity counting between two school sets.

use edumap_core::config::LayeredConfig;
use edumap_core::error::{EdumapError, Result};

use crate::index::{check_radius, SpatialIndex};
use crate::models::{ProximityEntry, ProximityResult, School};

/// For each source, count the targets within `radius_m` metres.
///
/// Sources keep their input order in the result, and the extremes resolve
/// ties to the earliest source. Targets must belong to the index's store;
/// a source at distance zero from itself counts when it is also a target.
pub fn count_nearby<'a, S, T>(
    index: &SpatialIndex<'_>,
    sources: S,
    targets: T,
    radius_m: f64,
) -> Result<ProximityResult>
where
    S: IntoIterator<Item = &'a School>,
    T: IntoIterator<Item = &'a School>,
{
    let sources: Vec<&School> = sources.into_iter().collect();
    if sources.is_empty() {
        return Err(EdumapError::EmptyInput { which: "sources" });
    }
    let targets = index.candidates(targets)?;
    if targets.is_empty() {
        return Err(EdumapError::EmptyInput { which: "targets" });
    }
    check_radius(radius_m)?;

    let entries = sources
        .iter()
        .map(|source| {
            let count = index.within(source, radius_m, &targets)?.len();
            Ok(ProximityEntry { school_id: source.id.clone(), count })
        })
        .collect::<Result<Vec<_>>>()?;

    let result = ProximityResult::from_counts(radius_m, entries)?;
    tracing::info!(
        sources = result.len(),
        targets = targets.len(),
        radius_m,
        max = result.max.count,
        min = result.min.count,
        "Counted nearby schools"
    );
    Ok(result)
}

/// [`count_nearby`] with the configured `proximity_radius_m`
pub fn count_nearby_with_config<'a, S, T>(
    index: &SpatialIndex<'_>,
    sources: S,
    targets: T,
    config: &LayeredConfig,
) -> Result<ProximityResult>
where
    S: IntoIterator<Item = &'a School>,
    T: IntoIterator<Item = &'a School>,
{
    count_nearby(index, sources, targets, config.proximity_radius_m.value)
}
