use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    /// Invalid or missing caller input, detected before any statement reaches the backend.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The data source was built but the backend reports it as unusable.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Failure returned by statement execution, carried verbatim.
    #[error("{0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, SummaryError>;

// Helper conversions
impl From<rusqlite::Error> for SummaryError {
    fn from(e: rusqlite::Error) -> Self { Self::Backend(e.to_string()) }
}
impl From<config::ConfigError> for SummaryError {
    fn from(e: config::ConfigError) -> Self { Self::Configuration(e.to_string()) }
}
