//! Command-line interface for docmerge.
//!
//! Provides commands for running a batch generation, pre-flight
//! validation, catalog inspection, and configuration display.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
