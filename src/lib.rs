//! docmerge: batch generation of populated documents from a template and
//! a tabular data source.
//!
//! For each record the engine resolves an applicable template, substitutes
//! bracketed placeholders with per-record values, derives an output name,
//! and writes the result, checkpointing after every success so an
//! interrupted run can resume where it stopped.

// Core modules
pub mod batch;
pub mod catalog;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod container;
pub mod document;
pub mod error;
pub mod naming;
pub mod normalize;
pub mod report;
pub mod source;
pub mod substitute;

// Re-export commonly used error types
pub use config::ConfigError;
pub use error::{BatchError, CatalogError, ContainerError, SourceError, SubstituteError};
