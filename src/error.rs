//! Error types for docmerge operations.
//!
//! Defines error types for the major subsystems:
//! - Template catalog scanning and resolution
//! - Document container open/save
//! - Tabular data-source loading
//! - Placeholder substitution
//! - Batch run preconditions

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building the template catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Template directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Template directory is not readable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No template documents found under {0}")]
    Empty(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a document container implementation.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Failed to open template '{path}': {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Failed to save document to '{path}': {reason}")]
    SaveFailed { path: PathBuf, reason: String },

    #[error("Malformed document in '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading the tabular data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Data source not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Data source has no header row: {0}")]
    MissingHeader(PathBuf),

    #[error("Failed to parse data source: {0}")]
    Parse(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while generating a single document.
#[derive(Debug, Error)]
pub enum SubstituteError {
    #[error("No placeholders to substitute; check the placeholder mapping")]
    EmptySubstitutionMap,

    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Run-level precondition errors. Any of these aborts the batch before the
/// first record is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No placeholders configured")]
    NoPlaceholders,

    #[error("Required columns missing from the data source: {0}")]
    MissingColumns(String),

    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
