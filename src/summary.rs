//! Orchestration of one summary invocation.
//!
//! An invocation captures its timestamp once, compiles the filters, renders the
//! query and then either hands the query out as an inline subquery or runs the
//! statements creating a table from it. Materialization statements run one by
//! one without an enclosing transaction: a failure stops the sequence but does
//! not undo what already ran.

use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::clause;
use crate::error::{Result, SummaryError};
use crate::geometry::{study_area, FeatureSource, PolygonFeature};
use crate::materialize;
use crate::settings::Settings;
use crate::taxon::{TaxonFilterSet, TaxonSelections};
use crate::template::{QueryTemplate, ROW_ID_COLUMN};
use crate::temporal::{compile_period, PeriodMode};

// ------------- DataSourceDescriptor -------------
/// What the host needs to build a layer on top of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceDescriptor {
    /// Connection the layer is opened on.
    pub database: String,
    pub schema: Option<String>,
    /// A table name, or a parenthesized SELECT used as a pseudo-table.
    pub table: String,
    pub geometry_column: Option<String>,
    pub filter: String,
    pub key_column: String,
}

impl DataSourceDescriptor {
    /// The table or subquery as it would appear in a FROM clause.
    pub fn relation(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.table),
            None => self.table.clone(),
        }
    }
    pub fn is_subquery(&self) -> bool {
        self.table.starts_with('(')
    }
}

impl fmt::Display for DataSourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "dbname='{}' key='{}' table={} ({}) sql={}",
            self.database,
            self.key_column,
            self.relation(),
            self.geometry_column.as_deref().unwrap_or(""),
            self.filter
        )
    }
}

// ------------- Request -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub label: String,
    pub features: Vec<PolygonFeature>,
    pub taxa: TaxonFilterSet,
    pub period: PeriodMode,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Trusted SQL appended verbatim to the WHERE clause.
    pub extra_where: String,
    pub materialize: bool,
}

impl SummaryRequest {
    pub fn new(label: impl Into<String>, features: Vec<PolygonFeature>) -> Self {
        Self {
            label: label.into(),
            features,
            taxa: TaxonFilterSet::new(),
            period: PeriodMode::NoFilter,
            start_date: None,
            end_date: None,
            extra_where: String::new(),
            materialize: false,
        }
    }

    /// A request over the study area of a layer: its selection, or all of it.
    pub fn from_source<S: FeatureSource + ?Sized>(label: impl Into<String>, source: &S) -> Self {
        Self::new(label, study_area(source))
    }
}

/// A request whose taxon choices are indexes into the configured catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryParameters {
    pub label: String,
    pub features: Vec<PolygonFeature>,
    #[serde(default)]
    pub taxa: TaxonSelections,
    #[serde(default)]
    pub period: PeriodMode,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub extra_where: String,
    #[serde(default)]
    pub materialize: bool,
}

impl SummaryParameters {
    pub fn resolve(self, settings: &Settings) -> Result<SummaryRequest> {
        Ok(SummaryRequest {
            taxa: TaxonFilterSet::resolve(&settings.catalog, &self.taxa)?,
            label: self.label,
            features: self.features,
            period: self.period,
            start_date: self.start_date,
            end_date: self.end_date,
            extra_where: self.extra_where,
            materialize: self.materialize,
        })
    }
}

// ------------- QueryPlan -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub select: String,
    /// Empty unless materializing.
    pub statements: Vec<String>,
    pub table_name: Option<String>,
    pub layer_name: String,
}

// ------------- SummaryTable -------------
pub struct SummaryTable {
    settings: Settings,
    template: QueryTemplate,
}

impl SummaryTable {
    pub fn new(settings: Settings) -> Self {
        Self::with_template(settings, QueryTemplate::species_summary())
    }
    pub fn with_template(settings: Settings, template: QueryTemplate) -> Self {
        Self { settings, template }
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Compiles everything; touches no backend.
    pub fn plan(&self, request: &SummaryRequest, captured_at: NaiveDateTime) -> Result<QueryPlan> {
        let taxon_fragment = request.taxa.compile();
        let temporal_fragment = compile_period(
            request.period,
            captured_at,
            request.start_date.as_deref(),
            request.end_date.as_deref(),
        )?;
        let clause = clause::assemble(
            &request.features,
            self.settings.srid,
            &taxon_fragment,
            &temporal_fragment,
            &request.extra_where,
        )?;
        let select = self.template.render(&self.settings.observation_view, &clause)?;
        debug!(length = select.len(), "rendered summary query");
        let layer_name = materialize::layer_name(&request.label, captured_at);
        if request.materialize {
            let table = materialize::table_name(&request.label, captured_at);
            let statements =
                materialize::statements(self.settings.output_schema.as_deref(), &table, &select);
            Ok(QueryPlan { select, statements, table_name: Some(table), layer_name })
        } else {
            Ok(QueryPlan { select, statements: Vec::new(), table_name: None, layer_name })
        }
    }

    pub fn descriptor(&self, plan: &QueryPlan) -> DataSourceDescriptor {
        match &plan.table_name {
            Some(table) => DataSourceDescriptor {
                database: self.settings.database.clone(),
                schema: self.settings.output_schema.clone(),
                table: table.clone(),
                geometry_column: None,
                filter: String::new(),
                key_column: ROW_ID_COLUMN.to_string(),
            },
            None => DataSourceDescriptor {
                database: self.settings.database.clone(),
                schema: None,
                table: format!("({})", plan.select),
                geometry_column: None,
                filter: String::new(),
                key_column: ROW_ID_COLUMN.to_string(),
            },
        }
    }

    /// Runs an invocation stamped with the local clock.
    pub fn run<B: Backend + ?Sized>(&self, backend: &mut B, request: &SummaryRequest) -> Result<DataSourceDescriptor> {
        self.run_at(backend, request, Local::now().naive_local())
    }

    pub fn run_at<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        request: &SummaryRequest,
        captured_at: NaiveDateTime,
    ) -> Result<DataSourceDescriptor> {
        let plan = self.plan(request, captured_at)?;
        info!(database = %self.settings.database, layer = %plan.layer_name, "running summary");
        match &plan.table_name {
            Some(table) => {
                info!(table = %table, statements = plan.statements.len(), "materializing summary");
                for (i, statement) in plan.statements.iter().enumerate() {
                    debug!(step = i + 1, "executing statement");
                    if let Err(e) = backend.execute(statement) {
                        warn!(step = i + 1, error = %e, "statement failed, stopping");
                        return Err(e);
                    }
                }
            }
            None => info!(layer = %plan.layer_name, "summary delivered as inline subquery"),
        }
        let descriptor = self.descriptor(&plan);
        if !backend.is_usable(&descriptor)? {
            warn!(layer = %plan.layer_name, "data source is not usable");
            return Err(SummaryError::Validation(format!(
                "the data source for '{}' is not valid, check the backend logs",
                plan.layer_name
            )));
        }
        Ok(descriptor)
    }
}
