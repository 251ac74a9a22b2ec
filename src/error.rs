//! Error types for loading tables and executing the query

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

/// Convenience alias used by every fallible function in the crate.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Everything that can stop a load or a query run.
///
/// Malformed input rows are not represented here: they are dropped by the
/// loaders and only show up in the debug log.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A required table file could not be opened.
    #[error("failed to open table file {}", path.display())]
    TableOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or seeking inside an already opened table file failed.
    #[error("failed to read table file {}", path.display())]
    TableRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    /// Dates are compared as strings, so only canonical `YYYY-MM-DD` is accepted.
    #[error("{name} must be a YYYY-MM-DD date, got {value:?}")]
    InvalidDate { name: &'static str, value: String },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("column {0} not found")]
    MissingColumn(String),

    #[error("column {name} is not {expected}")]
    ColumnType {
        name: String,
        expected: &'static str,
    },

    #[error("failed to spawn {phase} worker")]
    WorkerSpawn {
        phase: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{phase} worker {worker} panicked")]
    WorkerPanicked { phase: &'static str, worker: usize },

    #[error("failed to write results to {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
