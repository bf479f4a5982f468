//! Statement execution against the observation store.

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::summary::DataSourceDescriptor;

/// The connection the summary runs against. It is borrowed for one invocation only.
pub trait Backend {
    /// Executes one statement; the backend's message is returned untouched on failure.
    fn execute(&mut self, sql: &str) -> Result<()>;
    /// Whether the described table or subquery can be read.
    fn is_usable(&mut self, source: &DataSourceDescriptor) -> Result<bool>;
}

impl Backend for Connection {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.execute_batch(sql)?;
        Ok(())
    }
    fn is_usable(&mut self, source: &DataSourceDescriptor) -> Result<bool> {
        let probe = format!("select * from {} limit 0", source.relation());
        match self.prepare(&probe) {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(error = %e, "data source probe failed");
                Ok(false)
            }
        }
    }
}
