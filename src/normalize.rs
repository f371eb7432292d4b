//! Free-text identifier normalization and filesystem-safe name cleanup.
//!
//! Template file names and spreadsheet values arrive with accents, mixed
//! case and inconsistent separators. The resolver compares them through
//! [`normalize_name`]; generated file and folder names go through
//! [`sanitize_file_name`] before touching the filesystem.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Characters that are invalid in file names on common filesystems.
static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("static regex"));

/// Runs of whitespace, collapsed to a single space by the sanitizer.
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Separator runs removed entirely by the normalizer.
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_\-]+").expect("static regex"));

/// Maximum length of a sanitized file-name stem.
const MAX_STEM_LEN: usize = 100;

/// Decompose accented characters to their base letters and drop any
/// non-ASCII remnants (combining marks included).
pub fn strip_accents(name: &str) -> String {
    name.nfkd().filter(char::is_ascii).collect()
}

/// Canonicalize a free-text identifier for fuzzy comparison.
///
/// Strips accents, lowercases, and removes whitespace, underscore and
/// hyphen runs. Total: empty input yields empty output.
pub fn normalize_name(name: &str) -> String {
    let ascii = strip_accents(name).to_lowercase();
    SEPARATOR_RUN.replace_all(&ascii, "").into_owned()
}

/// Make a name safe to use as a file or folder name.
///
/// Strips accents, replaces filesystem-invalid characters with `_`,
/// collapses whitespace runs, trims, and truncates to a bounded length.
pub fn sanitize_file_name(name: &str) -> String {
    let ascii = strip_accents(name);
    let replaced = INVALID_CHARS.replace_all(&ascii, "_");
    let collapsed = WHITESPACE_RUN.replace_all(&replaced, " ");
    let trimmed = collapsed.trim();
    trimmed.chars().take(MAX_STEM_LEN).collect()
}

/// Strip surrounding quotes and collapse doubled backslashes in a
/// user-supplied path string.
pub fn clean_path(path: &str) -> String {
    let trimmed = path
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string();
    trimmed.replace("\\\\", "\\")
}
