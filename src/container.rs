//! Document container capability.
//!
//! The document-format library is an external collaborator: the engine
//! only needs "open a template into the tree" and "save the tree to a
//! path". [`DocumentContainer`] is that seam. The crate bundles
//! [`JsonContainer`], which stores the [`Document`] tree as JSON on disk,
//! so the binary and the test suite run end to end without a proprietary
//! format library; a real `.docx` container implements the same trait.

use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::ContainerError;

/// Capability for opening and saving templated documents.
pub trait DocumentContainer {
    /// Open a template file into the in-memory document tree.
    fn open(&self, path: &Path) -> Result<Document, ContainerError>;

    /// Persist a document tree to `path`.
    fn save(&self, document: &Document, path: &Path) -> Result<(), ContainerError>;
}

/// Container that (de)serializes the document tree as JSON, regardless of
/// the file extension it is asked to read or write.
#[derive(Debug, Clone, Default)]
pub struct JsonContainer;

impl JsonContainer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentContainer for JsonContainer {
    fn open(&self, path: &Path) -> Result<Document, ContainerError> {
        let raw = fs::read_to_string(path).map_err(|e| ContainerError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ContainerError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn save(&self, document: &Document, path: &Path) -> Result<(), ContainerError> {
        let json = serde_json::to_string_pretty(document)?;
        fs::write(path, json).map_err(|e| ContainerError::SaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
