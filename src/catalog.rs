//! Template catalog: recursive discovery and fuzzy resolution.
//!
//! The catalog is built once per run by scanning the template directory
//! recursively for document files, and is read-only during the record
//! loop. Resolution maps a free-text template identifier from the data
//! source to a concrete file through a fixed ladder of strategies, most
//! specific first; the first strategy that matches wins, with no
//! similarity scoring.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::CatalogError;
use crate::normalize::normalize_name;

/// File extensions recognized as template documents.
pub const DOC_EXTENSIONS: &[&str] = &["docx", "doc"];

/// One discovered template asset.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEntry {
    /// File name with extension.
    pub file_name: String,
    /// File name with the extension stripped.
    pub stem: String,
    /// Absolute (or scan-relative) path to the file.
    pub path: PathBuf,
}

/// The indexed set of discovered templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    entries: Vec<TemplateEntry>,
    by_name: HashMap<String, usize>,
    by_stem: HashMap<String, usize>,
    by_normalized: HashMap<String, usize>,
}

impl TemplateCatalog {
    /// Recursively scan `dir` for template documents and index them.
    ///
    /// Fails if the directory does not exist, cannot be walked, or holds
    /// no document files; an empty catalog is a run-level precondition
    /// failure.
    pub fn scan(dir: &Path) -> Result<Self, CatalogError> {
        if !dir.is_dir() {
            return Err(CatalogError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut catalog = TemplateCatalog::default();
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|e| {
                let path = dir.to_path_buf();
                match e.into_io_error() {
                    Some(source) => CatalogError::Unreadable { path, source },
                    None => CatalogError::DirectoryNotFound(path),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let has_doc_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| DOC_EXTENSIONS.iter().any(|d| d.eq_ignore_ascii_case(e)))
                .unwrap_or(false);
            if !has_doc_ext {
                continue;
            }

            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&file_name)
                .to_string();

            debug!(template = %file_name, "Template found");
            catalog.push(TemplateEntry {
                file_name,
                stem,
                path: path.to_path_buf(),
            });
        }

        if catalog.entries.is_empty() {
            return Err(CatalogError::Empty(dir.to_path_buf()));
        }

        info!(
            dir = %dir.display(),
            templates = catalog.entries.len(),
            "Template catalog built"
        );
        Ok(catalog)
    }

    fn push(&mut self, entry: TemplateEntry) {
        let idx = self.entries.len();
        self.by_name.insert(entry.file_name.clone(), idx);
        self.by_stem.insert(entry.stem.clone(), idx);
        self.by_normalized
            .insert(normalize_name(&entry.file_name), idx);
        self.by_normalized.insert(normalize_name(&entry.stem), idx);
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in discovery order.
    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    /// The first discovered template, used when per-record selection is
    /// disabled.
    pub fn first(&self) -> Option<&TemplateEntry> {
        self.entries.first()
    }

    /// Resolve a requested template identifier to a catalog entry.
    ///
    /// Strategy ladder, first match wins:
    /// 1. exact file name (with extension);
    /// 2. case-insensitive file name;
    /// 3. request with each known extension appended, exact;
    /// 4. exact stem;
    /// 5. case-insensitive stem;
    /// 6. any entry whose full path contains the request, case-insensitively;
    /// 7. normalized full file name;
    /// 8. normalized stem.
    pub fn resolve(&self, requested: &str) -> Option<&TemplateEntry> {
        // 1. exact file name
        if let Some(&idx) = self.by_name.get(requested) {
            return Some(&self.entries[idx]);
        }

        // 2. case-insensitive file name
        let requested_lower = requested.to_lowercase();
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.file_name.to_lowercase() == requested_lower)
        {
            return Some(entry);
        }

        // 3. request plus a known extension
        for ext in DOC_EXTENSIONS {
            if let Some(&idx) = self.by_name.get(&format!("{requested}.{ext}")) {
                return Some(&self.entries[idx]);
            }
        }

        // 4. exact stem
        let requested_stem = match requested.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => requested,
        };
        if let Some(&idx) = self.by_stem.get(requested_stem) {
            return Some(&self.entries[idx]);
        }

        // 5. case-insensitive stem
        let stem_lower = requested_stem.to_lowercase();
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.stem.to_lowercase() == stem_lower)
        {
            return Some(entry);
        }

        // 6. substring containment on the full path
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.path.to_string_lossy().to_lowercase().contains(&requested_lower))
        {
            return Some(entry);
        }

        // 7. normalized full file name
        if let Some(&idx) = self.by_normalized.get(&normalize_name(requested)) {
            return Some(&self.entries[idx]);
        }

        // 8. normalized stem
        if let Some(&idx) = self.by_normalized.get(&normalize_name(requested_stem)) {
            return Some(&self.entries[idx]);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn catalog_with(names: &[&str]) -> (tempfile::TempDir, TemplateCatalog) {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        let catalog = TemplateCatalog::scan(dir.path()).unwrap();
        (dir, catalog)
    }

    #[test]
    fn test_scan_recurses_and_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("A.docx"), "{}").unwrap();
        fs::write(dir.path().join("sub/B.doc"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let catalog = TemplateCatalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_scan_missing_dir_fails() {
        let err = TemplateCatalog::scan(Path::new("/nonexistent/templates"));
        assert!(matches!(err, Err(CatalogError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_scan_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "").unwrap();
        let err = TemplateCatalog::scan(dir.path());
        assert!(matches!(err, Err(CatalogError::Empty(_))));
    }

    #[test]
    fn test_resolve_exact_name() {
        let (_dir, catalog) = catalog_with(&["Contrato.docx"]);
        let entry = catalog.resolve("Contrato.docx").unwrap();
        assert_eq!(entry.file_name, "Contrato.docx");
    }

    #[test]
    fn test_resolve_case_insensitive_name() {
        let (_dir, catalog) = catalog_with(&["Contrato.docx"]);
        let entry = catalog.resolve("CONTRATO.DOCX").unwrap();
        assert_eq!(entry.file_name, "Contrato.docx");
    }

    #[test]
    fn test_resolve_appended_extension() {
        let (_dir, catalog) = catalog_with(&["Contrato.docx"]);
        let entry = catalog.resolve("Contrato").unwrap();
        assert_eq!(entry.file_name, "Contrato.docx");
    }

    #[test]
    fn test_resolve_stem_case_insensitive() {
        let (_dir, catalog) = catalog_with(&["Contrato.docx"]);
        let entry = catalog.resolve("contrato").unwrap();
        assert_eq!(entry.file_name, "Contrato.docx");
    }

    #[test]
    fn test_resolve_substring_in_path() {
        let (_dir, catalog) = catalog_with(&["Contrato Adm 2024.docx"]);
        let entry = catalog.resolve("adm 2024").unwrap();
        assert_eq!(entry.file_name, "Contrato Adm 2024.docx");
    }

    #[test]
    fn test_resolve_normalized_separators() {
        // "contrato_adm" only reaches "Contrato Adm.docx" once normalization
        // strips the underscore/space difference (tiers 7/8).
        let (_dir, catalog) = catalog_with(&["Contrato Adm.docx"]);
        let entry = catalog.resolve("contrato_adm").unwrap();
        assert_eq!(entry.file_name, "Contrato Adm.docx");
    }

    #[test]
    fn test_resolve_normalized_accents() {
        let (_dir, catalog) = catalog_with(&["Rescisão Padrão.docx"]);
        let entry = catalog.resolve("rescisao-padrao").unwrap();
        assert_eq!(entry.file_name, "Rescisão Padrão.docx");
    }

    #[test]
    fn test_resolve_not_found() {
        let (_dir, catalog) = catalog_with(&["Contrato.docx"]);
        assert!(catalog.resolve("Distrato").is_none());
    }

    #[test]
    fn test_resolve_no_partial_scoring() {
        // A genuinely different name must not resolve via any tier.
        let (_dir, catalog) = catalog_with(&["Contrato Adm.docx"]);
        assert!(catalog.resolve("contratoadmx").is_none());
    }
}
