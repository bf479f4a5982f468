//! Explicit configuration handed to every invocation.
//!
//! Settings come from an optional file and from `SPECIES_SUMMARY__*` environment
//! variables, the latter taking precedence.

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::geometry::DEFAULT_SRID;
use crate::taxon::TaxonCatalog;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the backend connection the host resolves.
    pub database: String,
    /// Schema-qualified observation view the summary reads from.
    pub observation_view: String,
    pub srid: u32,
    /// Schema receiving materialized tables, the backend default when absent.
    pub output_schema: Option<String>,
    pub catalog: TaxonCatalog,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: "gnlpoaura".to_string(),
            observation_view: "src_lpodatas.v_c_observations".to_string(),
            srid: DEFAULT_SRID,
            output_schema: None,
            catalog: TaxonCatalog::default(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("SPECIES_SUMMARY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
