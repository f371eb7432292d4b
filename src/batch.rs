//! Batch orchestrator: the per-record generation loop.
//!
//! Drives the run end to end: pre-flight checks, per-record substitution
//! map building, template resolution, group-subfolder selection, output
//! naming, document generation, checkpointing and error accounting.
//! Records are processed strictly in source order, one at a time; a single
//! record's failure never aborts the run, only precondition failures do.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::catalog::TemplateCatalog;
use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::container::DocumentContainer;
use crate::error::BatchError;
use crate::naming::derive_file_name;
use crate::normalize::sanitize_file_name;
use crate::report;
use crate::source::{load_table, DataTable, Record};
use crate::substitute;

/// Fallback log identifier when no log placeholder is configured or the
/// record has no value for it.
const UNKNOWN_IDENTIFIER: &str = "unknown";

/// Terminal state of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Document generated and checkpoint advanced.
    Succeeded,
    /// Resolution, generation or filesystem failure; recorded, non-fatal.
    Failed,
    /// Index at or below the checkpoint on a resumed run.
    Skipped,
}

/// Detail of one failed record, kept in memory for the final report.
#[derive(Debug, Clone)]
pub struct RecordError {
    /// 1-based record index.
    pub index: usize,
    /// Value of the log-identifier placeholder for this record.
    pub log_name: String,
    /// Failure description.
    pub error: String,
    /// Template identifier involved, when applicable.
    pub template: Option<String>,
}

/// Accumulated detail for one unresolvable template identifier.
#[derive(Debug, Clone, Default)]
pub struct MissingTemplate {
    /// How many records requested this identifier.
    pub count: usize,
    /// Log identifiers of the affected records.
    pub affected: BTreeSet<String>,
}

/// Result of a completed batch run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Records in the data source.
    pub total: usize,
    /// Records that produced a document in this run.
    pub processed: usize,
    /// Records skipped by the resume checkpoint.
    pub skipped: usize,
    /// Terminal state of every record, in source order.
    pub outcomes: Vec<RecordOutcome>,
    /// Per-record failures, in occurrence order.
    pub errors: Vec<RecordError>,
    /// Missing-template tally, keyed by requested identifier.
    pub missing_templates: BTreeMap<String, MissingTemplate>,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Local>,
    /// Total run duration.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Documents per second over the run, zero when nothing was timed.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Everything pre-flight establishes before the first record.
#[derive(Debug)]
pub struct Preflight {
    pub table: DataTable,
    pub catalog: TemplateCatalog,
    /// Non-fatal findings (null cells in mapped columns, duplicate
    /// grouping values).
    pub warnings: Vec<String>,
}

/// Run the shared pre-flight checks: load the data source, verify every
/// mapped column exists, build the template catalog.
pub fn preflight(config: &Config) -> Result<Preflight, BatchError> {
    if config.placeholders.is_empty() {
        return Err(BatchError::NoPlaceholders);
    }

    let table = load_table(&config.directories.data_source)?;

    let required = config.placeholders.values().map(|s| s.column.as_str());
    let missing = table.missing_columns(required);
    if !missing.is_empty() {
        let detail = config
            .placeholders
            .iter()
            .filter(|(_, spec)| missing.contains(&spec.column))
            .map(|(name, spec)| format!("'{}' (for placeholder {})", spec.column, name))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(BatchError::MissingColumns(detail));
    }

    let catalog = TemplateCatalog::scan(&config.directories.templates)?;

    let mut warnings = Vec::new();
    for (name, spec) in &config.placeholders {
        let nulls = table.null_count(&spec.column);
        if nulls > 0 {
            warnings.push(format!(
                "{nulls} null values in column '{}' (for {name})",
                spec.column
            ));
        }
    }
    if config.organization.enabled && table.has_duplicates(&config.organization.column) {
        warnings.push(format!(
            "duplicate values in organization column '{}'",
            config.organization.column
        ));
    }

    Ok(Preflight {
        table,
        catalog,
        warnings,
    })
}

/// The batch runner: configuration plus the document-container
/// collaborator, driving the sequential record loop.
pub struct BatchRunner {
    config: Config,
    container: Box<dyn DocumentContainer>,
}

impl BatchRunner {
    pub fn new(config: Config, container: Box<dyn DocumentContainer>) -> Self {
        Self { config, container }
    }

    /// Process every record. `fresh` ignores an existing checkpoint.
    ///
    /// Returns the run summary on completion; only precondition failures
    /// return an error, and they leave no partial state behind.
    pub fn run(&self, fresh: bool) -> Result<RunSummary, BatchError> {
        let started_at = Local::now();
        let started = Instant::now();

        let Preflight {
            table,
            catalog,
            warnings,
        } = preflight(&self.config)?;
        for warning in &warnings {
            warn!("{warning}");
        }

        let output_root = self.config.directories.output.clone();
        fs::create_dir_all(&output_root).map_err(|source| BatchError::OutputDirFailed {
            path: output_root.clone(),
            source,
        })?;

        let resume_from = if fresh {
            0
        } else {
            match Checkpoint::load(&output_root) {
                Some(cp) => {
                    info!(last_record = cp.ultimo_registro, "Resuming from checkpoint");
                    cp.ultimo_registro
                }
                None => 0,
            }
        };

        let total = table.len();
        let cool_down = Duration::from_secs(self.config.general.retry_interval_secs);
        let mut processed = 0usize;
        let mut skipped = 0usize;
        let mut outcomes: Vec<RecordOutcome> = Vec::with_capacity(total);
        let mut errors: Vec<RecordError> = Vec::new();
        let mut missing_templates: BTreeMap<String, MissingTemplate> = BTreeMap::new();
        let mut created_groups: HashSet<String> = HashSet::new();

        info!(total, "Generating documents");

        for (idx, record) in table.records.iter().enumerate().map(|(i, r)| (i + 1, r)) {
            if idx <= resume_from {
                skipped += 1;
                outcomes.push(RecordOutcome::Skipped);
                continue;
            }

            let log_name = self.log_identifier(record);
            let substitutions = self.build_substitutions(record);

            // Template selection: per-record column or the first catalog
            // entry.
            let template = if self.config.template_selection.enabled {
                let requested = record.display(&self.config.template_selection.column);
                match catalog.resolve(&requested) {
                    Some(entry) => entry,
                    None => {
                        let tally = missing_templates.entry(requested.clone()).or_default();
                        tally.count += 1;
                        tally.affected.insert(log_name.clone());
                        errors.push(RecordError {
                            index: idx,
                            log_name: log_name.clone(),
                            error: format!("Template '{requested}' not found"),
                            template: Some(requested.clone()),
                        });
                        error!(index = idx, identifier = %log_name, template = %requested, "Template not found");
                        outcomes.push(RecordOutcome::Failed);
                        continue;
                    }
                }
            } else {
                // Pre-flight guarantees a non-empty catalog.
                match catalog.first() {
                    Some(entry) => entry,
                    None => unreachable!("catalog verified non-empty in preflight"),
                }
            };

            // Group subfolder, created once per distinct value.
            let target_dir = match self.group_dir(record, &output_root, &mut created_groups) {
                Ok(dir) => dir,
                Err(e) => {
                    errors.push(RecordError {
                        index: idx,
                        log_name: log_name.clone(),
                        error: e,
                        template: Some(template.file_name.clone()),
                    });
                    outcomes.push(RecordOutcome::Failed);
                    thread::sleep(cool_down);
                    continue;
                }
            };

            let file_name = derive_file_name(
                &self.config.general.file_name_pattern,
                record,
                idx,
                &table.headers,
            );
            let output_path = target_dir.join(&file_name);

            match substitute::generate(
                self.container.as_ref(),
                &template.path,
                &substitutions,
                &output_path,
            ) {
                Ok(_) => {
                    processed += 1;
                    outcomes.push(RecordOutcome::Succeeded);
                    if let Err(e) = Checkpoint::save(&output_root, idx) {
                        warn!(index = idx, error = %e, "Failed to save checkpoint");
                    }
                    info!(
                        index = idx,
                        total,
                        identifier = %log_name,
                        file = %file_name,
                        "Document generated"
                    );
                }
                Err(e) => {
                    error!(index = idx, identifier = %log_name, error = %e, "Record failed");
                    errors.push(RecordError {
                        index: idx,
                        log_name,
                        error: e.to_string(),
                        template: Some(template.file_name.clone()),
                    });
                    outcomes.push(RecordOutcome::Failed);
                    thread::sleep(cool_down);
                }
            }
        }

        Checkpoint::clear(&output_root);

        let summary = RunSummary {
            total,
            processed,
            skipped,
            outcomes,
            errors,
            missing_templates,
            started_at,
            elapsed: started.elapsed(),
        };

        info!(
            processed = summary.processed,
            total = summary.total,
            errors = summary.errors.len(),
            elapsed_secs = format!("{:.1}", summary.elapsed.as_secs_f64()),
            "Batch run finished"
        );

        // Report writing is best effort; a failed write never invalidates
        // the run.
        report::write(&output_root, &summary, &self.config, &catalog);

        Ok(summary)
    }

    /// Value identifying a record in logs and reports.
    fn log_identifier(&self, record: &Record) -> String {
        match self.config.log_column() {
            Some(column) => {
                let value = record.display(column);
                if value.is_empty() {
                    UNKNOWN_IDENTIFIER.to_string()
                } else {
                    value
                }
            }
            None => UNKNOWN_IDENTIFIER.to_string(),
        }
    }

    /// Build the substitution map for one record. Null and missing values
    /// degrade to the empty string rather than failing the record.
    fn build_substitutions(&self, record: &Record) -> HashMap<String, String> {
        self.config
            .placeholders
            .iter()
            .map(|(name, spec)| (Config::token(name), record.display(&spec.column)))
            .collect()
    }

    /// Destination directory for a record: the output root, or the group
    /// subfolder when organization is enabled.
    fn group_dir(
        &self,
        record: &Record,
        output_root: &Path,
        created: &mut HashSet<String>,
    ) -> Result<PathBuf, String> {
        if !self.config.organization.enabled {
            return Ok(output_root.to_path_buf());
        }

        let raw = record.display(&self.config.organization.column);
        let group = if self.config.organization.sanitize_names {
            sanitize_file_name(&raw)
        } else {
            raw
        };
        if group.is_empty() {
            return Ok(output_root.to_path_buf());
        }

        let dir = output_root.join(&group);
        if !created.contains(&group) {
            fs::create_dir_all(&dir)
                .map_err(|e| format!("Failed to create group folder '{group}': {e}"))?;
            created.insert(group);
        }
        Ok(dir)
    }
}
