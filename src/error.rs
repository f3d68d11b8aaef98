//! Error types for the ETL run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Errors that abort an ETL run.
///
/// None of these are retried internally; each one terminates the run before
/// the output files are rewritten.
#[derive(Error, Debug)]
pub enum EtlError {
    /// A required raw input file is absent
    #[error("Missing input file {}. Please check if the file exists.", .path.display())]
    MissingInput { path: PathBuf },

    /// Incremental mode was requested but there is no prior output to resume from
    #[error(
        "Missing output file {}. Run with PROCESS_ALL=1 to build outputs from scratch.",
        .path.display()
    )]
    MissingOutput { path: PathBuf },

    /// A store operation or chunk insert failed
    #[error("Query failed ({query}): {message}")]
    QueryExecution { query: String, message: String },

    /// An output partition that must carry a watermark has no rows
    #[error(
        "Cannot resolve {stream} watermark: no {stream} rows in {table}. A full run (PROCESS_ALL=1) is required."
    )]
    AmbiguousWatermark {
        stream: &'static str,
        table: &'static str,
    },

    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A CSV row that could not be parsed into its record type
    #[error("Invalid record in {} at row {row}: {message}", .path.display())]
    InvalidRecord {
        path: PathBuf,
        row: usize,
        message: String,
    },

    /// A configuration value that could not be interpreted
    #[error("Invalid value {value:?} for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        message: String,
    },
}
