//! species-summary – per-species summaries of biodiversity observations.
//!
//! Given a study area, optional taxonomic and temporal filters and a free-text
//! condition, the crate assembles one SQL query that aggregates the matching
//! observations of the store into a row per species, and optionally persists that
//! result as a table.
//!
//! ## Modules
//! * [`geometry`] – Study-area polygons and the array literal built from them.
//! * [`taxon`] – The eight taxonomic dimensions, their catalogue and membership filter.
//! * [`temporal`] – Period choices and the date predicate they compile to.
//! * [`clause`] – Assembly of the WHERE clause.
//! * [`template`] – The aggregation query and its grouping/projection check.
//! * [`materialize`] – Table naming and creation statements.
//! * [`summary`] – Orchestration of an invocation, returning a [`summary::DataSourceDescriptor`].
//! * [`backend`] – The [`backend::Backend`] seam, implemented for `rusqlite::Connection`.
//! * [`settings`] – Configuration loading.
//!
//! ## Quick Start
//! ```
//! use chrono::NaiveDate;
//! use species_summary::geometry::PolygonFeature;
//! use species_summary::settings::Settings;
//! use species_summary::summary::{SummaryRequest, SummaryTable};
//!
//! let area = PolygonFeature::from_wkt("POLYGON((0 0,1 0,1 1,0 0))").unwrap();
//! let request = SummaryRequest::new("Tableau synthèse espèces", vec![area]);
//! let captured_at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
//! let plan = SummaryTable::new(Settings::default()).plan(&request, captured_at).unwrap();
//! assert!(plan.select.contains("ST_PolygonFromText('POLYGON((0 0,1 0,1 1,0 0))', 2154)"));
//! ```
//!
//! ## Trust boundary
//! The free-text condition of a request is appended to the WHERE clause exactly as
//! written. It must only be filled in by users already trusted with the store.

pub mod backend;
pub mod clause;
pub mod error;
pub mod geometry;
pub mod materialize;
pub mod settings;
pub mod summary;
pub mod taxon;
pub mod template;
pub mod temporal;

pub use error::{Result, SummaryError};
