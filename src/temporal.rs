//! Period filters on observation dates.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::{Result, SummaryError};

// date-time shapes the host date widget may send, besides plain dates and RFC 3339
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// The four period choices offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodMode {
    #[default]
    NoFilter,
    LastFiveYears,
    LastTenYears,
    ExplicitRange,
}

impl PeriodMode {
    pub const ALL: [PeriodMode; 4] = [
        PeriodMode::NoFilter,
        PeriodMode::LastFiveYears,
        PeriodMode::LastTenYears,
        PeriodMode::ExplicitRange,
    ];

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL.get(index).copied().ok_or_else(|| {
            SummaryError::Configuration(format!("unknown period choice {index}"))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalFilter {
    NoFilter,
    LastNYears(u32),
    ExplicitRange { start: NaiveDate, end: NaiveDate },
}

impl TemporalFilter {
    /// Builds the filter for a period choice, checking the explicit bounds when needed.
    pub fn from_mode(mode: PeriodMode, start: Option<&str>, end: Option<&str>) -> Result<Self> {
        match mode {
            PeriodMode::NoFilter => Ok(TemporalFilter::NoFilter),
            PeriodMode::LastFiveYears => TemporalFilter::last_years(5),
            PeriodMode::LastTenYears => TemporalFilter::last_years(10),
            PeriodMode::ExplicitRange => {
                let start = parse_bound("start", start)?;
                let end = parse_bound("end", end)?;
                TemporalFilter::range(start, end)
            }
        }
    }

    pub fn last_years(n: u32) -> Result<Self> {
        if n == 0 {
            return Err(SummaryError::Configuration(
                "a period of the last years needs at least one year".to_string(),
            ));
        }
        Ok(TemporalFilter::LastNYears(n))
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(SummaryError::Configuration(format!(
                "the start date {start} is after the end date {end}"
            )));
        }
        Ok(TemporalFilter::ExplicitRange { start, end })
    }

    /// Fragment with its own leading " and ", empty for no filter.
    ///
    /// The variants are public, so the invariants are checked again here.
    pub fn compile(&self, reference: NaiveDateTime) -> Result<String> {
        match self {
            TemporalFilter::NoFilter => Ok(String::new()),
            TemporalFilter::LastNYears(n) => {
                let first_year = i32::try_from(*n)
                    .ok()
                    .filter(|n| *n > 0)
                    .and_then(|n| reference.year().checked_sub(n))
                    .filter(|year| *year > 0)
                    .ok_or_else(|| {
                        SummaryError::Configuration(format!("cannot look back {n} years"))
                    })?;
                Ok(format!(" and obs.date_an >= {first_year}"))
            }
            TemporalFilter::ExplicitRange { start, end } if start > end => {
                Err(SummaryError::Configuration(format!(
                    "the start date {start} is after the end date {end}"
                )))
            }
            TemporalFilter::ExplicitRange { start, end } => {
                Ok(format!(
                    " and obs.date BETWEEN '{}' AND '{}'",
                    start.format("%Y-%m-%d"),
                    end.format("%Y-%m-%d")
                ))
            }
        }
    }
}

/// Compiles a period choice in one go.
pub fn compile_period(
    mode: PeriodMode,
    reference: NaiveDateTime,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<String> {
    TemporalFilter::from_mode(mode, start, end)?.compile(reference)
}

/// Date of an ISO date or date-time; the time itself must be well formed but is dropped.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|date_time| date_time.date())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|d| d.date_naive()))
}

fn parse_bound(which: &str, text: Option<&str>) -> Result<NaiveDate> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        None => Err(SummaryError::Configuration(format!(
            "an explicit period needs a {which} date"
        ))),
        Some(t) => parse_date(t).ok_or_else(|| {
            SummaryError::Configuration(format!("the {which} date '{t}' is not an ISO date"))
        }),
    }
}
