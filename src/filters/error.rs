//! Error types for filter compilation
//!
//! Compiling a query either yields a complete filter tree or exactly one
//! [`FilterBuildError`]; a query is never partially applied.

use thiserror::Error;

/// Errors that can occur while compiling a filter query
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterBuildError {
    /// The query text could not be parsed at all
    #[error("An error occurred while parsing the query: {0}")]
    Syntax(String),

    /// A decide filter name is not registered
    #[error("Filter '{0}' is unknown")]
    UnknownFilter(String),

    /// A combine filter name is not registered
    #[error("Combine filter '{0}' is unknown")]
    UnknownCombineFilter(String),

    /// The default filter used for bare strings is not registered
    #[error("Default filter '{0}' is unknown")]
    UnknownDefaultFilter(String),

    /// A filter name is not a string
    #[error("Any filter name must be a string, got {0} instead")]
    InvalidFilterName(String),

    /// A filter node is not a single-key map
    #[error("Malformed filter: {0}")]
    MalformedNode(String),

    /// A decide filter rejected its pattern
    #[error("Invalid pattern for filter '{filter}': {reason}")]
    InvalidPattern { filter: String, reason: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
