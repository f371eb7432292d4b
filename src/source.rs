//! Tabular data source: typed values, records, and the CSV loader.
//!
//! The data source is a file whose first row names the columns. It is
//! loaded fully into memory once per run and is read-only afterwards; a
//! record's position in file order is the counter used by naming and
//! checkpointing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SourceError;

/// Date layouts accepted when parsing a field as a date.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Display layout for dates, used by substitution and naming.
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    /// Parse a raw field into the most specific type it matches.
    ///
    /// Empty (after trimming) is null; then date layouts, then a number,
    /// else text kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
                return Value::Date(date);
            }
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return Value::Number(n);
        }
        Value::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Format for substitution and file naming.
    ///
    /// Null is the empty string, dates are `DD/MM/YYYY`, and integral
    /// numbers drop the trailing `.0`.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Date(d) => d.format(DATE_DISPLAY_FORMAT).to_string(),
        }
    }
}

/// One row of the data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    /// The value of a column, if the column exists in this record.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// The display string for a column; missing and null both yield the
    /// empty string.
    pub fn display(&self, column: &str) -> String {
        self.get(column).map(Value::display).unwrap_or_default()
    }
}

/// The fully loaded data source: header order plus records in file order.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl DataTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Columns from `required` that are absent from the header row.
    pub fn missing_columns<'a>(&self, required: impl Iterator<Item = &'a str>) -> Vec<String> {
        required
            .filter(|col| !self.headers.iter().any(|h| h == col))
            .map(str::to_string)
            .collect()
    }

    /// Number of null cells in a column.
    pub fn null_count(&self, column: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.get(column).map(Value::is_null).unwrap_or(true))
            .count()
    }

    /// Whether a column holds any duplicated non-null display value.
    pub fn has_duplicates(&self, column: &str) -> bool {
        let mut seen = std::collections::HashSet::new();
        for record in &self.records {
            let value = record.display(column);
            if !value.is_empty() && !seen.insert(value) {
                return true;
            }
        }
        false
    }
}

/// Load a CSV data source whose first row is the header.
pub fn load_table(path: &Path) -> Result<DataTable, SourceError> {
    if !path.exists() {
        return Err(SourceError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(SourceError::MissingHeader(PathBuf::from(path)));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut values = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = row.get(i).map(Value::parse).unwrap_or(Value::Null);
            values.insert(header.clone(), value);
        }
        records.push(Record::new(values));
    }

    debug!(
        path = %path.display(),
        rows = records.len(),
        columns = headers.len(),
        "Data source loaded"
    );

    Ok(DataTable { headers, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_value_parse_types() {
        assert_eq!(Value::parse(""), Value::Null);
        assert_eq!(Value::parse("  "), Value::Null);
        assert_eq!(Value::parse("42"), Value::Number(42.0));
        assert_eq!(Value::parse("3.5"), Value::Number(3.5));
        assert_eq!(
            Value::parse("2024-01-31"),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert_eq!(
            Value::parse("31/01/2024"),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert_eq!(Value::parse("Maria"), Value::Text("Maria".to_string()));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.display(), "");
        assert_eq!(Value::Number(42.0).display(), "42");
        assert_eq!(Value::Number(3.5).display(), "3.5");
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(Value::Date(date).display(), "31/01/2024");
    }

    #[test]
    fn test_load_table_basic() {
        let (_dir, path) = write_csv("Nome,Idade,Admissao\nMaria,30,2020-02-01\nJoao,,\n");
        let table = load_table(&path).unwrap();

        assert_eq!(table.headers, vec!["Nome", "Idade", "Admissao"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].display("Nome"), "Maria");
        assert_eq!(table.records[0].display("Admissao"), "01/02/2020");
        assert!(table.records[1].get("Idade").unwrap().is_null());
    }

    #[test]
    fn test_load_table_missing_file() {
        let err = load_table(Path::new("/nonexistent/data.csv"));
        assert!(matches!(err, Err(SourceError::FileNotFound(_))));
    }

    #[test]
    fn test_missing_columns() {
        let (_dir, path) = write_csv("A,B\n1,2\n");
        let table = load_table(&path).unwrap();
        let missing = table.missing_columns(["A", "C", "D"].into_iter());
        assert_eq!(missing, vec!["C", "D"]);
    }

    #[test]
    fn test_null_count_and_duplicates() {
        let (_dir, path) = write_csv("Dept,Id\nRH,1\n,2\nRH,3\n");
        let table = load_table(&path).unwrap();
        assert_eq!(table.null_count("Dept"), 1);
        assert!(table.has_duplicates("Dept"));
        assert!(!table.has_duplicates("Id"));
        assert_eq!(table.null_count("Missing"), 3);
    }
}
