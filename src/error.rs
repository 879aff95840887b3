//! Typed errors for the corpus core.
//!
//! The cleaner, merger, store, and maintenance sweep return [`CorpusError`]
//! so callers can tell a schema problem (fix the producer) apart from an
//! I/O problem (skip the topic or abort the run). The CLI and orchestrator
//! wrap these in `anyhow` with context.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CorpusError>;

#[derive(Debug, Error)]
pub enum CorpusError {
    /// The designated field is not part of the batch's schema.
    #[error("column '{field}' not found in batch")]
    MissingField { field: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error at {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed progress log {} (row {row}): {reason}", .path.display())]
    MalformedLog {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),
}

impl CorpusError {
    pub fn missing_field(field: &str) -> Self {
        CorpusError::MissingField {
            field: field.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        CorpusError::Csv {
            path: path.into(),
            source,
        }
    }
}
