//! Final plain-text run report.
//!
//! Summarizes a finished run for the operator: counts and timing, the
//! configuration used, every per-record error, the missing-template
//! breakdown (with affected identifiers capped to a short preview), and
//! the full catalog listing. Written best effort to the output root; a
//! failed write is reported and never invalidates the run.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::batch::RunSummary;
use crate::catalog::TemplateCatalog;
use crate::config::Config;

/// Report file name under the output root.
pub const REPORT_FILE: &str = "relatorio_geracao.txt";

/// Affected identifiers listed per missing template before the overflow
/// count takes over.
const AFFECTED_PREVIEW_LIMIT: usize = 5;

const RULE: &str = "==================================================";
const THIN_RULE: &str = "--------------------------------------------------";

/// Render the run report as plain text.
pub fn render(summary: &RunSummary, config: &Config, catalog: &TemplateCatalog) -> String {
    let mut out = String::new();

    out.push_str("DOCUMENT GENERATION REPORT\n");
    out.push_str(RULE);
    out.push_str("\n\n");
    out.push_str(&format!(
        "Date: {}\n",
        summary.started_at.format("%d/%m/%Y %H:%M:%S")
    ));
    out.push_str(&format!("Total records: {}\n", summary.total));
    out.push_str(&format!("Documents generated: {}\n", summary.processed));
    if summary.skipped > 0 {
        out.push_str(&format!(
            "Records skipped by checkpoint: {}\n",
            summary.skipped
        ));
    }
    out.push_str(&format!("Records with errors: {}\n", summary.errors.len()));
    out.push_str(&format!(
        "Total time: {:.1} seconds\n",
        summary.elapsed.as_secs_f64()
    ));
    if summary.elapsed.as_secs_f64() > 0.0 {
        out.push_str(&format!(
            "Average speed: {:.1} docs/second\n",
            summary.throughput()
        ));
    }
    out.push('\n');

    out.push_str("CONFIGURATION USED:\n");
    out.push_str(&format!(
        "- Template folder: {}\n",
        config.directories.templates.display()
    ));
    out.push_str(&format!(
        "- Data source: {}\n",
        config.directories.data_source.display()
    ));
    out.push_str(&format!(
        "- Output folder: {}\n",
        config.directories.output.display()
    ));
    out.push_str(&format!(
        "- Naming pattern: {}\n\n",
        config.general.file_name_pattern
    ));

    out.push_str("PLACEHOLDERS:\n");
    for (name, spec) in &config.placeholders {
        out.push_str(&format!(
            "- {name}: {} ({})\n",
            spec.description, spec.column
        ));
    }

    if summary.errors.is_empty() {
        out.push_str("\nNO ERRORS FOUND DURING PROCESSING\n");
    } else {
        out.push_str("\nDETAILED ERRORS:\n");
        out.push_str(RULE);
        out.push('\n');
        for err in &summary.errors {
            out.push_str(&format!("\n- RECORD #{}\n", err.index));
            out.push_str(&format!("  Identifier: {}\n", err.log_name));
            if let Some(template) = &err.template {
                out.push_str(&format!("  Template: {template}\n"));
            }
            out.push_str(&format!("  Error: {}\n", err.error));
            out.push_str(THIN_RULE);
            out.push('\n');
        }
    }

    if !summary.missing_templates.is_empty() {
        out.push_str("\nMISSING TEMPLATES DETECTED:\n");
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!(
            "Distinct missing templates: {}\n",
            summary.missing_templates.len()
        ));
        let occurrences: usize = summary.missing_templates.values().map(|m| m.count).sum();
        out.push_str(&format!("Total occurrences: {occurrences}\n"));

        for (template, tally) in &summary.missing_templates {
            out.push_str(&format!("\n- TEMPLATE: {template}\n"));
            out.push_str(&format!("  Occurrences: {}\n", tally.count));
            let shown = tally.affected.len().min(AFFECTED_PREVIEW_LIMIT);
            out.push_str(&format!(
                "  Affected identifiers ({shown} of {}):\n",
                tally.affected.len()
            ));
            for name in tally.affected.iter().take(AFFECTED_PREVIEW_LIMIT) {
                out.push_str(&format!("    - {name}\n"));
            }
            if tally.affected.len() > AFFECTED_PREVIEW_LIMIT {
                out.push_str(&format!(
                    "    ... and {} more\n",
                    tally.affected.len() - AFFECTED_PREVIEW_LIMIT
                ));
            }
            out.push_str(THIN_RULE);
            out.push('\n');
        }
    }

    out.push_str("\nTEMPLATES AVAILABLE:\n");
    out.push_str(RULE);
    out.push('\n');
    for entry in catalog.entries() {
        out.push_str(&format!("- {}\n", entry.file_name));
    }

    out
}

/// Render and write the report to the output root. Best effort: a write
/// failure is logged as a warning only.
pub fn write(output_dir: &Path, summary: &RunSummary, config: &Config, catalog: &TemplateCatalog) {
    let path = output_dir.join(REPORT_FILE);
    match fs::write(&path, render(summary, config, catalog)) {
        Ok(()) => info!(path = %path.display(), "Report written"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to write report"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{MissingTemplate, RecordError};
    use crate::config::PlaceholderSpec;
    use chrono::Local;
    use std::collections::{BTreeMap, BTreeSet};
    use std::time::Duration;

    fn summary_with(
        errors: Vec<RecordError>,
        missing: BTreeMap<String, MissingTemplate>,
    ) -> RunSummary {
        RunSummary {
            total: 10,
            processed: 8,
            skipped: 0,
            outcomes: Vec::new(),
            errors,
            missing_templates: missing,
            started_at: Local::now(),
            elapsed: Duration::from_secs(4),
        }
    }

    fn test_catalog() -> (tempfile::TempDir, TemplateCatalog) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Contrato.docx"), "{}").unwrap();
        let catalog = TemplateCatalog::scan(dir.path()).unwrap();
        (dir, catalog)
    }

    #[test]
    fn test_render_counts_and_catalog() {
        let (_dir, catalog) = test_catalog();
        let mut config = Config::default();
        config.placeholders.insert(
            "NOME".to_string(),
            PlaceholderSpec {
                description: "name".to_string(),
                column: "Nome".to_string(),
            },
        );

        let text = render(&summary_with(Vec::new(), BTreeMap::new()), &config, &catalog);

        assert!(text.contains("Total records: 10"));
        assert!(text.contains("Documents generated: 8"));
        assert!(text.contains("NO ERRORS FOUND"));
        assert!(text.contains("- NOME: name (Nome)"));
        assert!(text.contains("- Contrato.docx"));
    }

    #[test]
    fn test_render_error_detail() {
        let (_dir, catalog) = test_catalog();
        let errors = vec![RecordError {
            index: 3,
            log_name: "Maria".to_string(),
            error: "save failed".to_string(),
            template: Some("Contrato.docx".to_string()),
        }];

        let text = render(&summary_with(errors, BTreeMap::new()), &Config::default(), &catalog);

        assert!(text.contains("RECORD #3"));
        assert!(text.contains("Identifier: Maria"));
        assert!(text.contains("save failed"));
    }

    #[test]
    fn test_render_missing_templates_preview_cap() {
        let (_dir, catalog) = test_catalog();
        let mut affected = BTreeSet::new();
        for i in 0..8 {
            affected.insert(format!("emp{i}"));
        }
        let mut missing = BTreeMap::new();
        missing.insert(
            "Distrato".to_string(),
            MissingTemplate { count: 8, affected },
        );

        let text = render(&summary_with(Vec::new(), missing), &Config::default(), &catalog);

        assert!(text.contains("TEMPLATE: Distrato"));
        assert!(text.contains("Occurrences: 8"));
        assert!(text.contains("(5 of 8)"));
        assert!(text.contains("... and 3 more"));
    }

    #[test]
    fn test_write_is_best_effort() {
        let (_dir, catalog) = test_catalog();
        let out = tempfile::tempdir().unwrap();
        let summary = summary_with(Vec::new(), BTreeMap::new());

        write(out.path(), &summary, &Config::default(), &catalog);
        assert!(out.path().join(REPORT_FILE).exists());

        // Nonexistent directory must not panic.
        write(Path::new("/nonexistent/dir"), &summary, &Config::default(), &catalog);
    }
}
