//! Dry-run front end: prints the query plan for a JSON request.
//!
//! Usage: `species-summary <request.json> [settings-file]`

use std::process::ExitCode;

use chrono::Local;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use species_summary::settings::Settings;
use species_summary::summary::{SummaryParameters, SummaryTable};
use species_summary::{Result, SummaryError};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(request_path) = args.first() else {
        eprintln!("usage: species-summary <request.json> [settings-file]");
        return ExitCode::from(2);
    };
    match plan(request_path, args.get(1).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "could not build the summary");
            ExitCode::FAILURE
        }
    }
}

fn plan(request_path: &str, settings_path: Option<&str>) -> Result<()> {
    let settings = Settings::load(settings_path)?;
    info!(database = %settings.database, view = %settings.observation_view, "settings loaded");
    let text = std::fs::read_to_string(request_path)
        .map_err(|e| SummaryError::Configuration(format!("cannot read {request_path}: {e}")))?;
    let parameters: SummaryParameters = serde_json::from_str(&text)
        .map_err(|e| SummaryError::Configuration(format!("malformed request: {e}")))?;
    let request = parameters.resolve(&settings)?;
    let summary = SummaryTable::new(settings);
    let plan = summary.plan(&request, Local::now().naive_local())?;

    println!("-- layer: {}", plan.layer_name);
    if let Some(table) = &plan.table_name {
        println!("-- table: {table}");
        for statement in &plan.statements {
            println!("{statement};");
        }
    } else {
        println!("{};", plan.select);
    }
    println!("-- source: {}", summary.descriptor(&plan));
    Ok(())
}
