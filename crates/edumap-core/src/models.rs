pub mod district;
pub mod query;
pub mod results;
pub mod school;

pub use district::{DistrictCode, DistrictGeometry, DistrictInput, DISTRICT_CODE_WIDTH};
pub use query::SchoolFilter;
pub use results::{CountResult, Extremum, ProximityEntry, ProximityResult};
pub use school::{EducationLevel, School, SchoolInput};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Accept string or numeric cells for identifier-like columns.
///
/// Spreadsheet exports frequently type codes as numbers.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Some(i.to_string())),
            None => Ok(Some(n.to_string())),
        },
        Some(other) => Err(D::Error::custom(format!("expected string or number, found {}", other))),
    }
}
