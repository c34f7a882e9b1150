//! Typed errors for the corpus pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`), matching this
//! workspace's convention of strongly-typed, composable error handling in
//! library crates.

use thiserror::Error;

/// Errors that can occur while running the extraction/retry/persistence
/// pipeline end to end.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// A durable-storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Export/serialization to the external file schema failed.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// The readiness gate could not classify the page within its timeout.
    #[error("readiness gate error: {0}")]
    Readiness(#[from] ReadinessError),

    /// The act extractor's response could not be validated.
    #[error("extraction validation error: {reason}")]
    Validation { reason: String },

    /// Configuration could not be loaded (this should be rare — config
    /// loading clamps out-of-range values rather than rejecting them).
    #[error("config error: {0}")]
    Config(String),
}

/// Errors from the durable persistence layer (C8).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend I/O error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("migration failed: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Backend(Box::new(e))
    }
}

/// Errors from the export writer (C10).
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing export: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the readiness gate (C5).
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("host signalling error: {0}")]
    Host(String),
}

/// Result type alias used throughout `corpus-core`.
pub type Result<T> = std::result::Result<T, CorpusError>;
