//! Alert Table - ordered sequence of alert records
//!
//! Row order is preserved end to end so predictions can be re-attached.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use super::record::{AlertRecord, FieldValue};
use crate::error::{TriageError, TriageResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertTable {
    rows: Vec<AlertRecord>,
}

impl AlertTable {
    pub fn new(rows: Vec<AlertRecord>) -> Self {
        Self { rows }
    }

    /// Read a CSV export (by `.csv` extension), a JSON document or a JSON Lines file
    pub fn load(path: &Path) -> TriageResult<Self> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let table = if is_csv {
            Self::from_csv_reader(File::open(path)?)?
        } else {
            Self::from_json_str(&std::fs::read_to_string(path)?)?
        };
        log::info!("Loaded {} alerts from {}", table.len(), path.display());
        Ok(table)
    }

    /// Flattened CSV: headers are dotted field names, empty cells are absent,
    /// numeric cells become numbers
    pub fn from_csv_reader<R: Read>(reader: R) -> TriageResult<Self> {
        let mut csv = csv::ReaderBuilder::new().from_reader(reader);
        let headers = csv.headers().map_err(csv_error)?.clone();

        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record.map_err(csv_error)?;
            let mut alert = AlertRecord::new();
            for (name, cell) in headers.iter().zip(record.iter()) {
                if name.is_empty() {
                    continue;
                }
                if let Some(value) = parse_cell(cell) {
                    alert.insert(name, value);
                }
            }
            rows.push(alert);
        }

        log::debug!("Parsed CSV: {} rows, {} columns", rows.len(), headers.len());
        Ok(Self { rows })
    }

    pub fn from_csv_str(content: &str) -> TriageResult<Self> {
        Self::from_csv_reader(content.as_bytes())
    }

    /// Parse a whole JSON document, falling back to one alert per line
    pub fn from_json_str(content: &str) -> TriageResult<Self> {
        match serde_json::from_str::<Value>(content) {
            Ok(value) => Self::from_json_value(&value),
            Err(_) => Self::from_json_lines(content),
        }
    }

    /// Accepts an alert list, a single alert, or a search response (`hits.hits[]._source`)
    pub fn from_json_value(value: &Value) -> TriageResult<Self> {
        if let Some(hits) = value.pointer("/hits/hits").and_then(Value::as_array) {
            let sources: Vec<Value> = hits
                .iter()
                .map(|hit| hit.get("_source").cloned().unwrap_or_else(|| hit.clone()))
                .collect();
            return Self::from_documents(&sources);
        }

        match value {
            Value::Array(items) => Self::from_documents(items),
            Value::Object(_) => Self::from_documents(std::slice::from_ref(value)),
            other => Err(TriageError::MalformedInput(format!(
                "expected alert object or list, got {}",
                json_kind(other)
            ))),
        }
    }

    fn from_json_lines(content: &str) -> TriageResult<Self> {
        let mut documents = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| {
                TriageError::MalformedInput(format!("line {}: {}", line_no + 1, e))
            })?;
            documents.push(value);
        }
        Self::from_documents(&documents)
    }

    fn from_documents(documents: &[Value]) -> TriageResult<Self> {
        let rows = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                AlertRecord::from_json(doc).ok_or_else(|| {
                    TriageError::MalformedInput(format!(
                        "alert {} is a {}, expected an object",
                        i,
                        json_kind(doc)
                    ))
                })
            })
            .collect::<TriageResult<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[AlertRecord] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [AlertRecord] {
        &mut self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AlertRecord> {
        self.rows.iter()
    }

    pub fn push(&mut self, record: AlertRecord) {
        self.rows.push(record);
    }

    /// True if any row carries the field
    pub fn has_column(&self, name: &str) -> bool {
        self.rows.iter().any(|r| r.contains(name))
    }

    /// Union of field names across all rows, sorted
    pub fn columns(&self) -> BTreeSet<&str> {
        self.rows.iter().flat_map(|r| r.field_names()).collect()
    }

    /// Names of `required` fields that no row carries
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required.iter().copied().filter(|c| !self.has_column(c)).collect()
    }
}

impl From<Vec<AlertRecord>> for AlertTable {
    fn from(rows: Vec<AlertRecord>) -> Self {
        Self::new(rows)
    }
}

impl<'a> IntoIterator for &'a AlertTable {
    type Item = &'a AlertRecord;
    type IntoIter = std::slice::Iter<'a, AlertRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn parse_cell(cell: &str) -> Option<FieldValue> {
    if cell.trim().is_empty() {
        return None;
    }
    match cell.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Some(FieldValue::Number(n)),
        _ => Some(FieldValue::Text(cell.to_string())),
    }
}

fn csv_error(err: csv::Error) -> TriageError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => TriageError::Io(e),
        _ => TriageError::MalformedInput(format!("CSV: {}", message)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
