//! Unified error types for the statistics service.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Unified error type for the statistics service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Dataset loading error.
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Malformed or unsatisfiable query.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dataset loading and parsing errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// A required dataset file does not exist.
    #[error("dataset file not found: {}", path.display())]
    MissingFile {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A dataset file could not be parsed.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A downloaded dataset was rejected.
    #[error("downloaded {name} is invalid: {reason}")]
    InvalidDownload {
        /// Dataset name.
        name: String,
        /// Reason for rejection.
        reason: String,
    },

    /// CSV error without file context.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised by accessor queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The start of a date range is after its end.
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange {
        /// Range start.
        from: NaiveDate,
        /// Range end.
        to: NaiveDate,
    },

    /// The requested location is not in the dataset.
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// A date format string could not be used.
    #[error("invalid date format: {0:?}")]
    InvalidDateFormat(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
