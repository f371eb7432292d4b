//! Persisted configuration for batch runs.
//!
//! The configuration lives as JSON in a per-user application directory
//! and is loaded merged over defaults at startup. Directory paths are
//! cleaned on load (quotes stripped, doubled backslashes collapsed) and
//! the naming pattern is normalized to end in the document extension;
//! everything else is validated before a run starts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::normalize::clean_path;

/// Application directory name under the per-user config root.
const APP_DIR: &str = "docmerge";
/// Configuration file name.
const CONFIG_FILE: &str = "config.json";
/// Extension every naming pattern must end with.
const DOC_EXTENSION: &str = ".docx";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// IO error while reading or writing configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory paths consumed by a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directories {
    /// Directory scanned recursively for template documents.
    #[serde(default)]
    pub templates: PathBuf,
    /// Tabular data-source file (header row + one record per row).
    #[serde(default)]
    pub data_source: PathBuf,
    /// Root directory for generated documents, checkpoint and report.
    #[serde(default)]
    pub output: PathBuf,
}

/// One configured placeholder: what it means and which column feeds it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderSpec {
    /// Human description, echoed in the report.
    #[serde(default)]
    pub description: String,
    /// Data-source column that supplies the value.
    pub column: String,
}

/// General run options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralOptions {
    /// Naming pattern for generated documents; always ends in `.docx`.
    pub file_name_pattern: String,
    /// Declared retry count. Carried for config compatibility.
    pub retries: u32,
    /// Seconds slept after a failed record before continuing.
    pub retry_interval_secs: u64,
    /// Declared background-execution flag. Carried for config
    /// compatibility; process lifecycle is out of scope here.
    pub run_in_background: bool,
    /// Declared worker count. The run loop is single-threaded; this is an
    /// extension point, not a behavior.
    pub workers: usize,
}

impl Default for GeneralOptions {
    fn default() -> Self {
        Self {
            file_name_pattern: "Documento_[CONTADOR].docx".to_string(),
            retries: 3,
            retry_interval_secs: 2,
            run_in_background: true,
            workers: 4,
        }
    }
}

/// Output organization into per-group subfolders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub enabled: bool,
    /// Column whose value names the group subfolder.
    pub column: String,
    /// Sanitize group values before using them as folder names.
    pub sanitize_names: bool,
}

impl Default for Organization {
    fn default() -> Self {
        Self {
            enabled: false,
            column: String::new(),
            sanitize_names: true,
        }
    }
}

/// Per-record template selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSelection {
    pub enabled: bool,
    /// Column holding the requested template identifier.
    pub column: String,
}

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub directories: Directories,
    /// Placeholder name (without brackets) -> spec. Keys are unique by
    /// construction.
    pub placeholders: BTreeMap<String, PlaceholderSpec>,
    pub general: GeneralOptions,
    pub organization: Organization,
    pub template_selection: TemplateSelection,
    /// Placeholder whose value identifies a record in logs and reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_placeholder: Option<String>,
}

impl Config {
    /// Default per-user configuration path, with a current-directory
    /// fallback when no config directory is available.
    pub fn default_path() -> PathBuf {
        match dirs::config_dir() {
            Some(root) => root.join(APP_DIR).join(CONFIG_FILE),
            None => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Load configuration from `path`, merged over defaults. A missing
    /// file yields the defaults; a malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    /// Persist the configuration as pretty JSON, creating the parent
    /// directory when needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Clean user-supplied paths and guarantee the naming pattern ends in
    /// the document extension.
    pub fn normalized(mut self) -> Self {
        self.directories.templates = clean_pathbuf(&self.directories.templates);
        self.directories.data_source = clean_pathbuf(&self.directories.data_source);
        self.directories.output = clean_pathbuf(&self.directories.output);

        let pattern = &self.general.file_name_pattern;
        if !pattern.to_lowercase().ends_with(DOC_EXTENSION) {
            self.general.file_name_pattern = format!("{pattern}{DOC_EXTENSION}");
        }
        self
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directories.templates.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "templates directory is not set".to_string(),
            ));
        }
        if self.directories.data_source.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "data_source path is not set".to_string(),
            ));
        }
        if self.directories.output.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "output directory is not set".to_string(),
            ));
        }
        if self.general.file_name_pattern.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "file_name_pattern cannot be empty".to_string(),
            ));
        }
        if !self
            .general
            .file_name_pattern
            .to_lowercase()
            .ends_with(DOC_EXTENSION)
        {
            return Err(ConfigError::ValidationFailed(format!(
                "file_name_pattern must end with {DOC_EXTENSION}"
            )));
        }
        for (name, spec) in &self.placeholders {
            if name.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "placeholder names cannot be empty".to_string(),
                ));
            }
            if spec.column.is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "placeholder '{name}' has no source column"
                )));
            }
        }
        if self.organization.enabled && self.organization.column.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "organization is enabled but no grouping column is set".to_string(),
            ));
        }
        if self.template_selection.enabled && self.template_selection.column.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "template_selection is enabled but no column is set".to_string(),
            ));
        }
        if let Some(log_ph) = &self.log_placeholder {
            if !log_ph.is_empty() && !self.placeholders.contains_key(log_ph) {
                return Err(ConfigError::ValidationFailed(format!(
                    "log_placeholder '{log_ph}' is not a configured placeholder"
                )));
            }
        }
        Ok(())
    }

    /// The bracketed token written in templates for a placeholder name.
    pub fn token(name: &str) -> String {
        format!("[{name}]")
    }

    /// Source column of the log-identifier placeholder, if configured.
    pub fn log_column(&self) -> Option<&str> {
        let name = self.log_placeholder.as_deref()?;
        self.placeholders
            .get(name)
            .map(|spec| spec.column.as_str())
    }
}

fn clean_pathbuf(path: &Path) -> PathBuf {
    PathBuf::from(clean_path(&path.to_string_lossy()))
}
