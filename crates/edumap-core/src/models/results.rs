//! Analysis results handed to presentation layers.

use crate::error::{EdumapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::DistrictCode;

/// Per-district counts with left-join semantics.
///
/// Every known district is present; districts without matches hold zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResult {
    counts: BTreeMap<DistrictCode, usize>,

    /// Matching points whose district is not among the known districts
    unmatched: usize,
}

impl CountResult {
    /// Create a result holding zero for each known district
    pub fn zero_filled<'a, I>(districts: I) -> Self
    where
        I: IntoIterator<Item = &'a DistrictCode>,
    {
        Self { counts: districts.into_iter().map(|code| (code.clone(), 0)).collect(), unmatched: 0 }
    }

    /// Count one point for a district.
    ///
    /// Returns false (and records the point as unmatched) when the district
    /// is unknown; unknown districts are never added as keys.
    pub fn record(&mut self, district: &DistrictCode) -> bool {
        match self.counts.get_mut(district) {
            Some(count) => {
                *count += 1;
                true
            }
            None => {
                self.unmatched += 1;
                false
            }
        }
    }

    /// Record a point that could not be attributed to any district
    pub fn record_unmatched(&mut self) {
        self.unmatched += 1;
    }

    /// Count for a district, `None` if the district is unknown
    pub fn get(&self, district: &DistrictCode) -> Option<usize> {
        self.counts.get(district).copied()
    }

    /// Count for a district given as a raw code
    pub fn get_code(&self, code: &str) -> Option<usize> {
        DistrictCode::parse(code).ok().and_then(|code| self.get(&code))
    }

    /// Iterate districts in code order
    pub fn iter(&self) -> impl Iterator<Item = (&DistrictCode, usize)> {
        self.counts.iter().map(|(code, count)| (code, *count))
    }

    pub fn counts(&self) -> &BTreeMap<DistrictCode, usize> {
        &self.counts
    }

    pub fn unmatched(&self) -> usize {
        self.unmatched
    }

    /// Number of districts
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all district counts (unmatched points excluded)
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// The `n` districts with the most points, ties ordered by code
    pub fn top(&self, n: usize) -> Vec<(&DistrictCode, usize)> {
        let mut ranked: Vec<_> = self.iter().collect();
        // BTreeMap iteration is already code-ordered and the sort is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Distribution of district counts as `(bin_start, frequency)` pairs.
    ///
    /// Bins are `[start, start + bin_width)` from zero to the maximum count;
    /// empty bins in between are included.
    pub fn histogram(&self, bin_width: usize) -> Result<Vec<(usize, usize)>> {
        if bin_width == 0 {
            return Err(EdumapError::ConfigInvalid {
                key: "bin_width".to_string(),
                reason: "histogram bin width must be positive".to_string(),
            });
        }

        let max = match self.counts.values().max() {
            Some(max) => *max,
            None => return Ok(Vec::new()),
        };

        let mut bins = vec![0usize; max / bin_width + 1];
        for count in self.counts.values() {
            bins[count / bin_width] += 1;
        }

        Ok(bins.into_iter().enumerate().map(|(i, freq)| (i * bin_width, freq)).collect())
    }
}

/// Number of targets near one source point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProximityEntry {
    pub school_id: String,
    pub count: usize,
}

/// Source point achieving an extreme count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extremum {
    pub school_id: String,
    pub count: usize,
    /// Position of the source in the input order
    pub position: usize,
}

/// Proximity counts for a set of source points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityResult {
    pub radius_m: f64,
    pub entries: Vec<ProximityEntry>,
    pub max: Extremum,
    pub min: Extremum,
}

impl ProximityResult {
    /// Assemble a result from per-source counts in input order.
    ///
    /// Ties for the maximum or minimum resolve to the earliest entry.
    pub fn from_counts(radius_m: f64, entries: Vec<ProximityEntry>) -> Result<Self> {
        let first = entries.first().ok_or(EdumapError::EmptyInput { which: "sources" })?;

        let mut max = (0, first.count);
        let mut min = (0, first.count);
        for (position, entry) in entries.iter().enumerate().skip(1) {
            // strict comparisons keep the first occurrence on ties
            if entry.count > max.1 {
                max = (position, entry.count);
            }
            if entry.count < min.1 {
                min = (position, entry.count);
            }
        }

        let extremum = |(position, count): (usize, usize)| Extremum {
            school_id: entries[position].school_id.clone(),
            count,
            position,
        };
        let max = extremum(max);
        let min = extremum(min);

        Ok(Self { radius_m, entries, max, min })
    }

    /// Count for a source point
    pub fn count_for(&self, school_id: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.school_id == school_id).map(|e| e.count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean number of targets per source
    pub fn mean(&self) -> f64 {
        let total: usize = self.entries.iter().map(|e| e.count).sum();
        total as f64 / self.entries.len() as f64
    }
}
