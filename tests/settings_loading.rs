use std::io::Write;

use species_summary::settings::Settings;
use species_summary::summary::SummaryParameters;
use species_summary::taxon::TaxonDimension;
use species_summary::temporal::PeriodMode;
use species_summary::SummaryError;

fn write_settings(name: &str, contents: &str) -> String {
    let path = std::env::temp_dir().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn defaults_without_a_file() {
    let settings = Settings::load(None).expect("settings");
    assert_eq!(settings.database, "gnlpoaura");
    assert_eq!(settings.observation_view, "src_lpodatas.v_c_observations");
    assert_eq!(settings.srid, 2154);
    assert_eq!(settings.output_schema, None);
}

#[test]
fn file_overrides_defaults_and_fills_the_catalog() {
    let path = write_settings(
        "species_summary_settings_test.json",
        r#"{
            "database": "local",
            "srid": 4326,
            "catalog": {
                "classe": ["Aves", "Mammalia"],
                "group2_inpn": ["Oiseaux"]
            }
        }"#,
    );
    let settings = Settings::load(Some(&path)).expect("settings");
    assert_eq!(settings.database, "local");
    assert_eq!(settings.srid, 4326);
    assert_eq!(settings.observation_view, "src_lpodatas.v_c_observations");
    assert_eq!(settings.catalog.values(TaxonDimension::Classe), ["Aves", "Mammalia"]);
    assert_eq!(settings.catalog.values(TaxonDimension::Group2Inpn), ["Oiseaux"]);
    assert!(settings.catalog.values(TaxonDimension::Regne).is_empty());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn index_based_request_resolves_against_settings() {
    let mut settings = Settings::default();
    settings.catalog = settings
        .catalog
        .with_values(TaxonDimension::Classe, ["Aves", "Mammalia"]);
    let parameters: SummaryParameters = serde_json::from_str(
        r#"{
            "label": "Synthèse",
            "features": [{"wkt": "POLYGON((0 0,1 0,1 1,0 0))", "single_part": true}],
            "taxa": {"classe": [1]},
            "period": "last_ten_years",
            "materialize": true
        }"#,
    )
    .expect("parameters");
    let request = parameters.clone().resolve(&settings).expect("request");
    assert_eq!(request.taxa.values(TaxonDimension::Classe), ["Mammalia"]);
    assert_eq!(request.period, PeriodMode::LastTenYears);
    assert!(request.materialize);
    assert_eq!(request.extra_where, "");

    let mut unknown = parameters;
    unknown.taxa.insert(TaxonDimension::Classe, vec![5]);
    assert!(matches!(unknown.resolve(&settings), Err(SummaryError::Configuration(_))));
}

fn parameters_with_feature(feature: &str) -> serde_json::Result<SummaryParameters> {
    serde_json::from_str(&format!(r#"{{"label": "Synthèse", "features": [{feature}]}}"#))
}

#[test]
fn request_features_are_classified_from_their_wkt() {
    let error = parameters_with_feature(r#"{"wkt": "LINESTRING(0 0,1 1)"}"#).unwrap_err();
    assert!(error.to_string().contains("polygons"), "{error}");
    assert!(parameters_with_feature(r#"{"wkt": "POINT(0 0)", "single_part": true}"#).is_err());

    // a mislabelled multipolygon still gets the multipolygon constructor
    let parameters = parameters_with_feature(
        r#"{"wkt": "MULTIPOLYGON(((0 0,1 0,1 1,0 0)))", "single_part": true}"#,
    )
    .expect("parameters");
    assert!(!parameters.features[0].single_part());
    let parameters = parameters_with_feature(r#"{"wkt": "polygon((0 0,1 0,1 1,0 0))"}"#).expect("parameters");
    assert!(parameters.features[0].single_part());
}
