use std::collections::BTreeMap;

use species_summary::taxon::{TaxonCatalog, TaxonDimension, TaxonFilterSet};
use species_summary::SummaryError;

#[test]
fn empty_set_compiles_to_nothing() {
    assert_eq!(TaxonFilterSet::new().compile(), "");
    let explicit_empty = TaxonFilterSet::new().with(TaxonDimension::Classe, Vec::<String>::new());
    assert_eq!(explicit_empty.compile(), "");
    assert!(explicit_empty.is_empty());
}

#[test]
fn one_fragment_per_filtered_dimension() {
    let set = TaxonFilterSet::new()
        .with(TaxonDimension::Classe, ["Aves", "Mammalia"])
        .with(TaxonDimension::GroupeTaxo, ["Oiseaux"]);
    assert_eq!(
        set.compile(),
        " and groupe_taxo = ANY(array['Oiseaux']) and classe = ANY(array['Aves', 'Mammalia'])"
    );
}

#[test]
fn declaration_order_is_kept_whatever_the_insertion_order() {
    let mut set = TaxonFilterSet::new();
    for dimension in TaxonDimension::ALL.iter().rev() {
        set = set.with(*dimension, ["x"]);
    }
    let compiled = set.compile();
    assert_eq!(compiled.matches("= ANY(array['x'])").count(), 8);
    let positions: Vec<usize> = TaxonDimension::ALL
        .iter()
        .map(|d| compiled.find(&format!("{} = ANY", d.column())).expect("fragment present"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "fragments out of order: {compiled}");
    assert!(compiled.contains("obs.group1_inpn = ANY") && compiled.contains("obs.group2_inpn = ANY"));
    // stable across runs
    assert_eq!(compiled, set.compile());
}

#[test]
fn quotes_inside_values_are_doubled() {
    let set = TaxonFilterSet::new().with(TaxonDimension::Famille, ["L'Hér."]);
    assert_eq!(set.compile(), " and famille = ANY(array['L''Hér.'])");
}

#[test]
fn selections_resolve_against_the_catalog() {
    let catalog = TaxonCatalog::new()
        .with_values(TaxonDimension::Regne, ["Animalia", "Plantae", "Fungi"])
        .with_values(TaxonDimension::Ordre, ["Passeriformes"]);
    let mut selections = BTreeMap::new();
    selections.insert(TaxonDimension::Regne, vec![2, 0]);
    selections.insert(TaxonDimension::Ordre, vec![]);
    let set = TaxonFilterSet::resolve(&catalog, &selections).expect("resolved");
    assert_eq!(set.values(TaxonDimension::Regne), ["Fungi", "Animalia"]);
    assert_eq!(set.compile(), " and regne = ANY(array['Fungi', 'Animalia'])");
}

#[test]
fn out_of_range_selection_is_rejected() {
    let catalog = TaxonCatalog::new().with_values(TaxonDimension::Phylum, ["Chordata"]);
    let mut selections = BTreeMap::new();
    selections.insert(TaxonDimension::Phylum, vec![1]);
    match TaxonFilterSet::resolve(&catalog, &selections) {
        Err(SummaryError::Configuration(msg)) => assert!(msg.contains("phylum"), "{msg}"),
        other => panic!("expected a configuration error, got {other:?}"),
    }
}
