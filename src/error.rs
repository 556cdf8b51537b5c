//! Error taxonomy for the pipeline.
//!
//! Only fatal conditions are errors. A failed clear or a failed report is
//! surfaced as a value (see [`crate::store::ClearOutcome`] and
//! [`crate::report::Report`]) so the caller can log it and carry on.

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neither the remote fetch nor the local cache produced a dataset.
    #[error("could not download data and local file '{}' is unavailable: {reason}", .path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A column the pipeline relies on is missing from the source.
    #[error("expected column `{column}` is missing from the dataset")]
    SchemaMismatch { column: String },

    /// An insert batch was rejected or could not be sent. Batches before
    /// `batch` remain written.
    #[error("failed to insert batch {batch} into {table} ({rows_written} rows already written): {reason}")]
    StoreWrite {
        table: String,
        batch: usize,
        rows_written: usize,
        reason: String,
    },

    #[error("configuration error for `{field}`: {message}")]
    Config { field: String, message: String },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn schema_mismatch(column: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            column: column.into(),
        }
    }

    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of a best-effort store request (clear or report query).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("store returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
