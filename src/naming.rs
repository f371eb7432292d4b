//! Output file-name derivation from the configured naming pattern.
//!
//! Special tokens are replaced first (`[CONTADOR]`, `[DATA]`, `[HORA]`),
//! then every header column's bracketed token is replaced with the
//! record's value, and finally the stem is passed through the filesystem
//! sanitizer with the extension re-appended. Uniqueness of generated
//! names is a configuration-time responsibility; a degenerate pattern can
//! collide.

use chrono::{DateTime, Local};

use crate::normalize::sanitize_file_name;
use crate::source::{Record, Value, DATE_DISPLAY_FORMAT};

/// Counter token, replaced with the record's 1-based index.
pub const TOKEN_COUNTER: &str = "[CONTADOR]";
/// Current-date token, `DD/MM/YYYY`.
pub const TOKEN_DATE: &str = "[DATA]";
/// Current-time token, `HHMMSS`.
pub const TOKEN_TIME: &str = "[HORA]";

/// Derive the output file name for one record at the current wall-clock
/// time.
pub fn derive_file_name(
    pattern: &str,
    record: &Record,
    counter: usize,
    headers: &[String],
) -> String {
    derive_file_name_at(pattern, record, counter, headers, Local::now())
}

/// [`derive_file_name`] with an explicit clock, for deterministic tests.
pub fn derive_file_name_at(
    pattern: &str,
    record: &Record,
    counter: usize,
    headers: &[String],
    now: DateTime<Local>,
) -> String {
    let mut name = pattern.to_string();
    name = name.replace(TOKEN_COUNTER, &counter.to_string());
    name = name.replace(TOKEN_DATE, &now.format(DATE_DISPLAY_FORMAT).to_string());
    name = name.replace(TOKEN_TIME, &now.format("%H%M%S").to_string());

    for column in headers {
        let token = format!("[{column}]");
        if !name.contains(&token) {
            continue;
        }
        let value = match record.get(column) {
            Some(Value::Date(d)) => d.format(DATE_DISPLAY_FORMAT).to_string(),
            Some(v) => v.display(),
            None => String::new(),
        };
        name = name.replace(&token, &value);
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
        None => (name, String::new()),
    };
    format!("{}{ext}", sanitize_file_name(&stem))
}
