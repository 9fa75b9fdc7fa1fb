//! End-to-end scenarios for loading, aggregation and proximity counting
//!
//! These tests verify that:
//! - District counts left-join over every known district
//! - Proximity counts use ground distance in metres
//! - Empty inputs fail explicitly instead of producing degenerate extremes
//! - Ties for the extremes resolve to the first source in input order

use edumap_core::config::{LayeredConfig, ProjectionKind};
use edumap_core::error::EdumapError;
use edumap_geo::models::{
    DistrictGeometry, DistrictInput, EducationLevel, SchoolFilter, SchoolInput,
};
use edumap_geo::{
    count_by_district, count_nearby, count_nearby_with_config, GeometryStore, Projection,
    SpatialIndex,
};
use geo::{Destination, Geodesic, Point};

fn square(x0: f64, y0: f64, size: f64) -> DistrictGeometry {
    DistrictGeometry::polygon(vec![vec![
        [x0, y0],
        [x0 + size, y0],
        [x0 + size, y0 + size],
        [x0, y0 + size],
        [x0, y0],
    ]])
}

fn school(id: &str, lon: f64, lat: f64, code: &str, level: &str) -> SchoolInput {
    SchoolInput::new(id, lat, lon, code, level, "ICA")
}

#[test]
fn test_count_inicial_by_district() {
    let store = GeometryStore::load(
        vec![
            school("s1", -75.75, -14.05, "006", "inicial"),
            school("s2", -75.74, -14.05, "006", "primaria"),
            school("s3", -75.65, -14.05, "012", "secundaria"),
        ],
        vec![
            DistrictInput::new("006", square(-75.8, -14.1, 0.1)),
            DistrictInput::new("012", square(-75.7, -14.1, 0.1)),
            DistrictInput::new("018", square(-75.6, -14.1, 0.1)),
        ],
        &LayeredConfig::with_defaults(),
    )
    .unwrap();

    let filter = SchoolFilter::new().level(EducationLevel::Inicial);
    let counts = count_by_district(&store, filter.as_predicate());

    let as_pairs: Vec<(&str, usize)> = counts.iter().map(|(code, n)| (code.as_str(), n)).collect();
    assert_eq!(as_pairs, vec![("000006", 1), ("000012", 0), ("000018", 0)]);
    assert_eq!(counts.unmatched(), 0);
}

#[test]
fn test_radius_counts_ground_distance() {
    // ground distances east of the origin
    let origin = Point::new(0.0, 0.0);
    let near = Geodesic.destination(origin, 90.0, 3000.0);
    let far = Geodesic.destination(origin, 90.0, 6000.0);

    let store = GeometryStore::load(
        vec![
            school("primary", 0.0, 0.0, "1", "primaria"),
            school("near", near.x(), near.y(), "1", "secundaria"),
            school("far", far.x(), far.y(), "1", "secundaria"),
        ],
        vec![],
        &LayeredConfig::with_defaults(),
    )
    .unwrap();
    let config = LayeredConfig::with_defaults();
    let index =
        SpatialIndex::build_with_projection(&store, Projection::local(0.0).unwrap(), &config)
            .unwrap();

    let primary = store.filter(|s| s.has_level(EducationLevel::Primaria));
    let secondary = store.filter(|s| s.has_level(EducationLevel::Secundaria));
    let result = count_nearby(&index, primary, secondary, 5000.0).unwrap();

    assert_eq!(result.count_for("primary"), Some(1));
    assert_eq!(result.radius_m, 5000.0);
}

#[test]
fn test_radius_from_configuration() {
    let store = GeometryStore::load(
        vec![
            school("primary", -75.70, -14.00, "110101", "primaria"),
            school("near", -75.69, -14.00, "110101", "secundaria"),
            school("far", -75.60, -14.00, "110101", "secundaria"),
        ],
        vec![],
        &LayeredConfig::with_defaults(),
    )
    .unwrap();

    // far is about 10.8 km east of primary
    let mut config = LayeredConfig::with_defaults();
    config.proximity_radius_m.value = 12_000.0;
    let index = SpatialIndex::build(&store, &config).unwrap();
    assert_eq!(index.projection().epsg(), Some(32718));

    let primary = store.filter(|s| s.has_level(EducationLevel::Primaria));
    let secondary = store.filter(|s| s.has_level(EducationLevel::Secundaria));
    let result = count_nearby_with_config(&index, primary, secondary, &config).unwrap();
    assert_eq!(result.radius_m, 12_000.0);
    assert_eq!(result.count_for("primary"), Some(2));
}

#[test]
fn test_empty_targets_fail() {
    let store = GeometryStore::load(
        vec![school("primary", -75.7, -14.0, "110101", "primaria")],
        vec![],
        &LayeredConfig::with_defaults(),
    )
    .unwrap();
    let index = SpatialIndex::build(&store, &LayeredConfig::with_defaults()).unwrap();

    let secondary = store.filter(|s| s.has_level(EducationLevel::Secundaria));
    let err = count_nearby(&index, store.schools(), secondary, 5000.0).unwrap_err();
    assert!(matches!(err, EdumapError::EmptyInput { which: "targets" }));
}

#[test]
fn test_tied_maximum_reports_first_source() {
    let mut rows = vec![
        school("a", -75.70, -14.00, "110101", "primaria"),
        school("b", -75.50, -14.00, "110101", "primaria"),
        school("c", -75.30, -14.00, "110101", "primaria"),
    ];
    // four secondaries around a and b, one around c
    for (source, lon) in [("a", -75.70), ("b", -75.50)] {
        for i in 1..=4 {
            let lat = -14.0 + 0.002 * f64::from(i);
            rows.push(school(&format!("{}{}", source, i), lon, lat, "110101", "secundaria"));
        }
    }
    rows.push(school("c1", -75.30, -14.002, "110101", "secundaria"));

    let store = GeometryStore::load(rows, vec![], &LayeredConfig::with_defaults()).unwrap();
    let index = SpatialIndex::build(&store, &LayeredConfig::with_defaults()).unwrap();

    let secondary = store.filter(|s| s.has_level(EducationLevel::Secundaria));
    let by_id = |ids: &[&str]| ids.iter().map(|id| store.school(id).unwrap()).collect::<Vec<_>>();

    let result = count_nearby(&index, by_id(&["a", "b", "c"]), secondary.clone(), 5000.0).unwrap();
    assert_eq!(result.count_for("a"), Some(4));
    assert_eq!(result.count_for("b"), Some(4));
    assert_eq!(result.max.school_id, "a");
    assert_eq!(result.max.position, 0);
    assert_eq!(result.min.school_id, "c");

    let reversed = count_nearby(&index, by_id(&["b", "a", "c"]), secondary, 5000.0).unwrap();
    assert_eq!(reversed.max.school_id, "b");
}

#[test]
fn test_department_scoped_analysis() {
    let store = GeometryStore::load(
        vec![
            school("ica1", -75.70, -14.00, "110101", "primaria"),
            school("ica2", -75.69, -14.00, "110101", "secundaria"),
            SchoolInput::new("lima1", -12.05, -77.04, "150101", "secundaria", "LIMA"),
        ],
        vec![
            DistrictInput::new("110101", square(-76.0, -14.5, 1.0)).with_department("ICA"),
            DistrictInput::new("150101", square(-77.5, -12.5, 1.0)).with_department("LIMA"),
        ],
        &LayeredConfig::with_defaults(),
    )
    .unwrap();

    let ica = store.scoped_to_department("Ica").unwrap();
    let mut config = LayeredConfig::with_defaults();
    config.projection.value = ProjectionKind::Local;
    let index = SpatialIndex::build(&ica, &config).unwrap();

    let primary = ica.filter(|s| s.has_level(EducationLevel::Primaria));
    let secondary = ica.filter(|s| s.has_level(EducationLevel::Secundaria));
    let result = count_nearby(&index, primary, secondary, 5000.0).unwrap();
    assert_eq!(result.count_for("ica1"), Some(1));

    // lima1 is not part of the scoped store
    let lima1 = store.school("lima1").unwrap();
    assert!(index.candidates([lima1]).unwrap_err().is_not_found());
}

#[test]
fn test_registry_rows_from_json() {
    let rows: Vec<SchoolInput> = serde_json::from_str(
        r#"[
            {
                "Código Modular": 512345,
                "Latitud": -14.07,
                "Longitud": -75.73,
                "Ubigeo": 110101,
                "Nivel / Modalidad": "Primaria",
                "Departamento": "ICA",
                "Nombre de IE": "IE 22350"
            }
        ]"#,
    )
    .unwrap();
    let districts: Vec<DistrictInput> = serde_json::from_str(
        r#"[
            {
                "IDDIST": "110101",
                "DEPARTAMEN": "ICA",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-76.0, -14.5], [-75.5, -14.5], [-75.5, -14.0], [-76.0, -14.0]]]
                }
            }
        ]"#,
    )
    .unwrap();

    let store = GeometryStore::load(rows, districts, &LayeredConfig::with_defaults()).unwrap();
    let school = store.school("512345").unwrap();
    assert_eq!(school.level, "primaria");
    assert_eq!(school.attributes["Nombre de IE"], "IE 22350");

    let counts = count_by_district(&store, |_| true);
    let json = serde_json::to_value(&counts).unwrap();
    assert_eq!(json["counts"]["110101"], 1);
    assert_eq!(json["unmatched"], 0);
}
