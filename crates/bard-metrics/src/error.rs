//! Error types for bard-metrics

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading metric files or writing the report
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("could not read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed table in {}: {}", .path.display(), .source)]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The file has a header but no data rows
    #[error("no data rows in {}", .0.display())]
    Empty(PathBuf),

    #[error("column {} not found in {}", .column, .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("no row keyed {} in {}", .key, .path.display())]
    MissingRow { path: PathBuf, key: String },

    #[error("column {} in {} holds non-numeric value {:?}", .column, .path.display(), .value)]
    NonNumeric {
        path: PathBuf,
        column: String,
        value: String,
    },

    #[error(
        "could not parse picard assay performance metrics from {}. It may be formatted incorrectly, or it may not match assay type {}",
        .path.display(),
        .assay
    )]
    AssayMismatch { path: PathBuf, assay: String },

    #[error("could not find any metrics to report")]
    NoMetrics,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
