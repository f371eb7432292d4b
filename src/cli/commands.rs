//! CLI command definitions for docmerge.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use crate::batch::{preflight, BatchRunner};
use crate::catalog::TemplateCatalog;
use crate::config::Config;
use crate::container::JsonContainer;

/// Batch document generator for templated documents and tabular data.
#[derive(Parser)]
#[command(name = "docmerge")]
#[command(about = "Generate populated documents from a template and a tabular data source")]
#[command(version)]
#[command(
    long_about = "docmerge fills templated documents from a tabular data source, one document per record.\n\nRuns are resumable: a checkpoint written after each successful record lets an interrupted batch continue where it stopped.\n\nExample usage:\n  docmerge run --fresh\n  docmerge validate\n  docmerge catalog --resolve Contrato"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (default: per-user config dir).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Process every record of the data source into generated documents.
    Run(RunArgs),

    /// Check run preconditions without generating anything.
    Validate,

    /// List discovered templates, optionally probing the resolver.
    Catalog(CatalogArgs),

    /// Show the effective configuration and its file path.
    ShowConfig,
}

/// Arguments for `docmerge run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Ignore an existing checkpoint and start from the first record.
    #[arg(long)]
    pub fresh: bool,

    /// Override the template directory.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Override the data-source file.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Override the output directory.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `docmerge catalog`.
#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Resolve this identifier against the catalog and show the match.
    #[arg(long)]
    pub resolve: Option<String>,
}

/// Parse command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Execute the parsed CLI command.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    match cli.command {
        Commands::Run(args) => run_batch(config, args),
        Commands::Validate => validate(config),
        Commands::Catalog(args) => inspect_catalog(config, args),
        Commands::ShowConfig => show_config(config, &config_path),
    }
}

fn run_batch(mut config: Config, args: RunArgs) -> anyhow::Result<()> {
    if let Some(templates) = args.templates {
        config.directories.templates = templates;
    }
    if let Some(data) = args.data {
        config.directories.data_source = data;
    }
    if let Some(output) = args.output {
        config.directories.output = output;
    }
    let config = config.normalized();
    config.validate()?;

    let runner = BatchRunner::new(config, Box::new(JsonContainer::new()));
    let summary = runner.run(args.fresh)?;

    println!(
        "Generated {}/{} documents ({} skipped, {} errors) in {:.1}s",
        summary.processed,
        summary.total,
        summary.skipped,
        summary.errors.len(),
        summary.elapsed.as_secs_f64()
    );
    if !summary.errors.is_empty() {
        println!("See the report in the output directory for error detail.");
    }
    Ok(())
}

fn validate(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let result = preflight(&config)?;

    println!(
        "Preconditions OK: {} records, {} templates",
        result.table.len(),
        result.catalog.len()
    );
    if result.warnings.is_empty() {
        println!("No warnings.");
    } else {
        for warning in &result.warnings {
            warn!("{warning}");
            println!("warning: {warning}");
        }
    }
    Ok(())
}

fn inspect_catalog(config: Config, args: CatalogArgs) -> anyhow::Result<()> {
    let catalog = TemplateCatalog::scan(&config.directories.templates)?;
    info!(templates = catalog.len(), "Catalog scanned");

    match args.resolve {
        Some(requested) => match catalog.resolve(&requested) {
            Some(entry) => println!("'{requested}' -> {}", entry.path.display()),
            None => {
                println!("'{requested}' -> not found");
                std::process::exit(1);
            }
        },
        None => {
            for entry in catalog.entries() {
                println!("{}", entry.path.display());
            }
        }
    }
    Ok(())
}

fn show_config(config: Config, path: &std::path::Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
