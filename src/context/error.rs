//! Error types for data sources

use std::io;
use thiserror::Error;

/// Errors raised while running a command on a data source
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// The command could not be started
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The command ran but reported failure
    #[error("Command '{command}' failed (status {status:?}): {stderr}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The output was not valid UTF-8
    #[error("Command '{0}' produced invalid UTF-8")]
    InvalidOutput(String),
}
