//! Reading delimited and spreadsheet files into header + string cells.
//!
//! Everything downstream works on [`RawTable`]; typing and validation happen
//! in the request and schema parsers, not here.

use crate::error::InputError;
use calamine::{open_workbook_auto, Data, Reader};
use common::model::table::{Table, Value};
use std::path::Path;

/// Supported input formats, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Result<Self, InputError> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            "xls" | "xlsx" | "ods" => Ok(FileFormat::Spreadsheet),
            other => Err(InputError::UnsupportedExtension(other.to_string())),
        }
    }
}

/// One data row with its 1-based position among data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell under `header` in `row`, trimmed; `None` when blank or absent.
    pub fn cell<'a>(&self, row: &'a RawRow, header: &str) -> Option<&'a str> {
        let index = self.column_index(header)?;
        row.cells
            .get(index)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Converts to a typed [`Table`], inferring each cell's value.
    pub fn to_table(&self) -> Result<Table, InputError> {
        let mut table = Table::new(self.headers.clone());
        for raw in &self.rows {
            let mut values: Vec<Value> = raw.cells.iter().map(|c| Value::infer(c)).collect();
            values.resize(self.headers.len(), Value::Null);
            table.push_row(values)?;
        }
        Ok(table)
    }
}

/// Reads `path`, skipping lines that start with `comment`.
pub fn read_table(path: &Path, comment: u8) -> Result<RawTable, InputError> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => read_delimited(path, b',', comment),
        FileFormat::Tsv => read_delimited(path, b'\t', comment),
        FileFormat::Spreadsheet => read_spreadsheet(path, comment),
    }
}

fn unreadable(path: &Path, reason: impl ToString) -> InputError {
    InputError::Unreadable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn read_delimited(path: &Path, delimiter: u8, comment: u8) -> Result<RawTable, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .comment(Some(comment))
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| unreadable(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| unreadable(path, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| unreadable(path, e))?;
        let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(RawRow {
            row: idx + 1,
            cells,
        });
    }

    Ok(RawTable { headers, rows })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Data::Int(i) => i.to_string(),
        // Spreadsheets store whole numbers as floats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

fn read_spreadsheet(path: &Path, comment: u8) -> Result<RawTable, InputError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable(path, "workbook has no worksheets"))?
        .map_err(|e| unreadable(path, e))?;

    let marker = char::from(comment);
    let mut lines = range
        .rows()
        .map(|r| r.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|cells| {
            !cells
                .first()
                .map(|c| c.trim_start().starts_with(marker))
                .unwrap_or(false)
        });

    let headers = lines
        .next()
        .ok_or_else(|| unreadable(path, "worksheet is empty"))?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows = lines
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .enumerate()
        .map(|(idx, cells)| RawRow {
            row: idx + 1,
            cells,
        })
        .collect();

    Ok(RawTable { headers, rows })
}
