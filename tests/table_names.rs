use chrono::{Duration, NaiveDate, NaiveDateTime};
use species_summary::materialize::{layer_name, normalize, statements, table_name};

fn captured_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(9, 7, 2).unwrap()
}

#[test]
fn normalize_folds_case_and_accents() {
    let once = normalize("Tableau Synthèse");
    assert_eq!(once, "tableau_synthese");
    assert_eq!(normalize(&once), once);
    assert!(!once.contains(' '));
    assert!(once.is_ascii());
}

#[test]
fn normalize_is_idempotent_on_awkward_labels() {
    for label in [
        "Tableau synthèse espèces",
        "Çà et là – Ŷÿ",
        "Zone (Nord) / Sud: 50% #2!",
        "a-b~c d",
        "ÉLÉPHANT",
    ] {
        let once = normalize(label);
        assert_eq!(normalize(&once), once, "{label}");
        assert!(!once.contains(' '), "{label} -> {once}");
    }
}

#[test]
fn separators_and_punctuation() {
    assert_eq!(normalize("a-b~c d"), "a_b_c_d");
    assert_eq!(normalize("Zone (Nord) / Sud: 50% #2!"), "zone_nord__sud_50_2");
    assert_eq!(normalize("Çà et là"), "ca_et_la");
}

#[test]
fn table_name_carries_the_timestamp() {
    assert_eq!(
        table_name("Tableau synthèse espèces", captured_at()),
        "tableau_synthese_especes_20240305_090702"
    );
    assert_eq!(layer_name("Tableau synthèse espèces", captured_at()), "Tableau synthèse espèces 20240305_090702");
}

#[test]
fn one_second_apart_gives_distinct_tables() {
    let first = table_name("Synthèse", captured_at());
    let second = table_name("Synthèse", captured_at() + Duration::seconds(1));
    assert_ne!(first, second);
}

#[test]
fn exactly_one_create_statement() {
    let plain = statements(None, "t_20240305_090702", "SELECT 1");
    assert_eq!(plain, vec!["CREATE TABLE t_20240305_090702 AS SELECT 1".to_string()]);
    let qualified = statements(Some("resultats"), "t", "SELECT 1");
    assert_eq!(qualified, vec!["CREATE TABLE resultats.t AS SELECT 1".to_string()]);
}
