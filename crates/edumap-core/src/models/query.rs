use serde::{Deserialize, Serialize};

use super::{DistrictCode, EducationLevel, School};

/// Declarative school predicate.
///
/// All set criteria must hold; an empty filter matches every school.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolFilter {
    pub level: Option<EducationLevel>,
    pub department: Option<String>,
    pub district: Option<DistrictCode>,
}

impl SchoolFilter {
    /// Create a filter that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on an education level
    pub fn level(mut self, level: EducationLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Filter on a department name (case-insensitive)
    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Filter on a district
    pub fn district(mut self, district: DistrictCode) -> Self {
        self.district = Some(district);
        self
    }

    /// Evaluate the filter against a school
    pub fn matches(&self, school: &School) -> bool {
        if let Some(level) = self.level {
            if !school.has_level(level) {
                return false;
            }
        }
        if let Some(department) = &self.department {
            if !school.in_department(department) {
                return false;
            }
        }
        if let Some(district) = &self.district {
            if &school.district != district {
                return false;
            }
        }
        true
    }

    /// Borrow the filter as a closure for store iteration
    pub fn as_predicate(&self) -> impl Fn(&School) -> bool + Clone + '_ {
        move |school| self.matches(school)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchoolInput;

    fn school(level: &str, department: &str, code: &str) -> School {
        School::try_from(SchoolInput::new("1", -14.0, -75.7, code, level, department)).unwrap()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(SchoolFilter::new().matches(&school("primaria", "ICA", "110101")));
    }

    #[test]
    fn test_combined_filter() {
        let filter = SchoolFilter::new().level(EducationLevel::Primaria).department("ica");

        assert!(filter.matches(&school("Primaria", "ICA", "110101")));
        assert!(!filter.matches(&school("Secundaria", "ICA", "110101")));
        assert!(!filter.matches(&school("Primaria", "LIMA", "150101")));
    }

    #[test]
    fn test_district_filter() {
        let filter = SchoolFilter::new().district(DistrictCode::parse("110101").unwrap());
        assert!(filter.matches(&school("primaria", "ICA", "110101")));
        assert!(!filter.matches(&school("primaria", "ICA", "110102")));
    }
}
