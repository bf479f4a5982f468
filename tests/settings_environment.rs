use std::io::Write;

use species_summary::settings::Settings;

// Environment variables are process wide, hence a single test in its own binary.
#[test]
fn environment_overrides_defaults_and_file() {
    let path = std::env::temp_dir().join("species_summary_environment_test.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(br#"{"database": "from_file", "srid": 4326, "observation_view": "obs.v_file"}"#)
        .unwrap();
    let path = path.to_string_lossy().into_owned();

    unsafe {
        std::env::set_var("SPECIES_SUMMARY__DATABASE", "from_env");
        std::env::set_var("SPECIES_SUMMARY__SRID", "3857");
        std::env::set_var("SPECIES_SUMMARY__OUTPUT_SCHEMA", "resultats");
    }

    let settings = Settings::load(None).expect("settings from the environment");
    assert_eq!(settings.database, "from_env");
    assert_eq!(settings.srid, 3857);
    assert_eq!(settings.output_schema.as_deref(), Some("resultats"));
    assert_eq!(settings.observation_view, "src_lpodatas.v_c_observations");

    let settings = Settings::load(Some(&path)).expect("settings from file and environment");
    assert_eq!(settings.database, "from_env");
    assert_eq!(settings.srid, 3857);
    assert_eq!(settings.output_schema.as_deref(), Some("resultats"));
    // not set in the environment, so the file wins
    assert_eq!(settings.observation_view, "obs.v_file");

    unsafe {
        std::env::remove_var("SPECIES_SUMMARY__DATABASE");
        std::env::remove_var("SPECIES_SUMMARY__SRID");
        std::env::remove_var("SPECIES_SUMMARY__OUTPUT_SCHEMA");
    }
    let _ = std::fs::remove_file(&path);
}
