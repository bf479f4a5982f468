//! Taxonomic membership filters.
//!
//! Eight independent classification axes can restrict the observations. Each
//! non-empty axis becomes `<column> = ANY(array[...])`, and the axes are joined
//! with `and` in their declaration order so the compiled predicate is byte-stable.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Result, SummaryError};

// ------------- TaxonDimension -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonDimension {
    GroupeTaxo,
    Regne,
    Phylum,
    Classe,
    Ordre,
    Famille,
    Group1Inpn,
    Group2Inpn,
}

impl TaxonDimension {
    /// Declaration order, which is also the order of the compiled fragments.
    pub const ALL: [TaxonDimension; 8] = [
        TaxonDimension::GroupeTaxo,
        TaxonDimension::Regne,
        TaxonDimension::Phylum,
        TaxonDimension::Classe,
        TaxonDimension::Ordre,
        TaxonDimension::Famille,
        TaxonDimension::Group1Inpn,
        TaxonDimension::Group2Inpn,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            TaxonDimension::GroupeTaxo => "groupe_taxo",
            TaxonDimension::Regne => "regne",
            TaxonDimension::Phylum => "phylum",
            TaxonDimension::Classe => "classe",
            TaxonDimension::Ordre => "ordre",
            TaxonDimension::Famille => "famille",
            TaxonDimension::Group1Inpn => "obs.group1_inpn",
            TaxonDimension::Group2Inpn => "obs.group2_inpn",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaxonDimension::GroupeTaxo => "groupe_taxo",
            TaxonDimension::Regne => "regne",
            TaxonDimension::Phylum => "phylum",
            TaxonDimension::Classe => "classe",
            TaxonDimension::Ordre => "ordre",
            TaxonDimension::Famille => "famille",
            TaxonDimension::Group1Inpn => "group1_inpn",
            TaxonDimension::Group2Inpn => "group2_inpn",
        }
    }
}

// ------------- TaxonCatalog -------------
/// Allowed values per dimension, in the order the host presents them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TaxonCatalog {
    values: BTreeMap<TaxonDimension, Vec<String>>,
}

impl TaxonCatalog {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_values<I, S>(mut self, dimension: TaxonDimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values
            .insert(dimension, values.into_iter().map(Into::into).collect());
        self
    }
    pub fn values(&self, dimension: TaxonDimension) -> &[String] {
        self.values
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
    /// Turns index selections into values, refusing indexes outside the list.
    pub fn resolve(&self, dimension: TaxonDimension, indexes: &[usize]) -> Result<Vec<String>> {
        let values = self.values(dimension);
        indexes
            .iter()
            .map(|&i| {
                values.get(i).cloned().ok_or_else(|| {
                    SummaryError::Configuration(format!(
                        "index {i} is out of range for '{}' ({} known values)",
                        dimension.name(),
                        values.len()
                    ))
                })
            })
            .collect()
    }
}

/// Index-based selections as delivered by the host widgets.
pub type TaxonSelections = BTreeMap<TaxonDimension, Vec<usize>>;

// ------------- TaxonFilterSet -------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonFilterSet {
    values: BTreeMap<TaxonDimension, Vec<String>>,
}

impl TaxonFilterSet {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with<I, S>(mut self, dimension: TaxonDimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values
            .insert(dimension, values.into_iter().map(Into::into).collect());
        self
    }
    pub fn resolve(catalog: &TaxonCatalog, selections: &TaxonSelections) -> Result<Self> {
        let mut set = Self::new();
        for (dimension, indexes) in selections {
            set.values
                .insert(*dimension, catalog.resolve(*dimension, indexes)?);
        }
        Ok(set)
    }
    pub fn values(&self, dimension: TaxonDimension) -> &[String] {
        self.values
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
    pub fn is_empty(&self) -> bool {
        self.values.values().all(Vec::is_empty)
    }
    /// Compiles the set into a fragment carrying its own leading " and ", or
    /// nothing at all when no dimension is filtered.
    pub fn compile(&self) -> String {
        let fragments: Vec<String> = TaxonDimension::ALL
            .iter()
            .filter_map(|dimension| {
                let values = self.values(*dimension);
                if values.is_empty() {
                    None
                } else {
                    let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
                    Some(format!(
                        "{} = ANY(array[{}])",
                        dimension.column(),
                        quoted.join(", ")
                    ))
                }
            })
            .collect();
        if fragments.is_empty() {
            String::new()
        } else {
            format!(" and {}", fragments.join(" and "))
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
