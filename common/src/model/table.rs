//! A small column-named table used for bulk loads and generator output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Reads a cell from a delimited file: blank is `Null`, then integer,
    /// then float, otherwise text.
    pub fn infer(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(cell.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// The type a column's values suggest, ignoring nulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalType {
    Boolean,
    Integer,
    Float,
    Text,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Row has {found} values but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
}

/// Rows of [`Value`]s under named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// A typed row that knows how to flatten itself into a [`Table`] row.
pub trait TableRecord {
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<Value>;
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_records<R: TableRecord>(records: &[R]) -> Self {
        Self {
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(TableRecord::values).collect(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
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

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Text wins over anything, floats over integers, integers over booleans.
    /// An all-null column counts as `Float`.
    pub fn natural_type(&self, index: usize) -> NaturalType {
        let mut seen = None;
        for value in self.column_values(index) {
            let ty = match value {
                Value::Null => continue,
                Value::Bool(_) => NaturalType::Boolean,
                Value::Int(_) => NaturalType::Integer,
                Value::Float(_) => NaturalType::Float,
                Value::Text(_) => return NaturalType::Text,
            };
            seen = Some(match (seen, ty) {
                (None, t) => t,
                (Some(NaturalType::Float), _) | (_, NaturalType::Float) => NaturalType::Float,
                (Some(NaturalType::Integer), _) | (_, NaturalType::Integer) => NaturalType::Integer,
                (Some(t), _) => t,
            });
        }
        seen.unwrap_or(NaturalType::Float)
    }

    /// Longest text value in characters, 0 when the column holds no text.
    pub fn max_text_width(&self, index: usize) -> usize {
        self.column_values(index)
            .filter_map(Value::as_text)
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0)
    }
}
