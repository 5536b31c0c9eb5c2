//! In-memory tabular dataset.

use crate::error::{ModelbenchError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::io::Read;

/// A single row keyed by column name.
pub type Record = serde_json::Map<String, Value>;

/// Row-major table of JSON cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, checking that column names are unique and every row is full width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ModelbenchError::data_source("dataset has no columns"));
        }
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(ModelbenchError::data_source(format!(
                    "duplicate column '{col}'"
                )));
            }
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ModelbenchError::data_source(format!(
                "row {} has {} fields, expected {}",
                idx + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV with a header row. Cells become numbers when numeric,
    /// `null` when empty and strings otherwise.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| ModelbenchError::data_source(format!("unreadable CSV header: {e}")))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(ModelbenchError::data_source("CSV has no header row"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| ModelbenchError::data_source(format!("unparsable CSV: {e}")))?;
            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            rows.push(record.iter().map(parse_cell).collect());
        }

        Self::new(columns, rows)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Row `idx` as a [`Record`].
    pub fn record(&self, idx: usize) -> Option<Record> {
        let row = self.rows.get(idx)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        )
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        (0..self.rows.len()).filter_map(|idx| self.record(idx))
    }

    /// Rewrite numeric cells as strings in every column that also holds a
    /// non-numeric value. Afterwards each column is uniformly numeric or
    /// uniformly textual (besides nulls), whichever subset of rows is taken.
    /// Returns the names of the rewritten columns.
    pub fn unify_column_kinds(&mut self) -> Vec<String> {
        let mut rewritten = Vec::new();
        for (idx, name) in self.columns.iter().enumerate() {
            let mixed = self
                .rows
                .iter()
                .any(|row| !(row[idx].is_null() || row[idx].is_number()));
            if !mixed {
                continue;
            }
            let mut changed = false;
            for row in &mut self.rows {
                if let Value::Number(n) = &row[idx] {
                    row[idx] = Value::String(n.to_string());
                    changed = true;
                }
            }
            if changed {
                rewritten.push(name.clone());
            }
        }
        rewritten
    }

    /// New dataset holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

/// Convert one raw CSV cell into a JSON value.
pub fn parse_cell(raw: &str) -> Value {
    let s = raw.trim().trim_matches('"');
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = s.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(s.to_string())
}
