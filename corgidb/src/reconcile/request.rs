//! Turning raw spreadsheet rows into validated [`ColumnRequest`]s and
//! [`SchemaDescription`]s.
//!
//! Every row is checked before anything is returned, so a bad row anywhere
//! in the file stops the run before the database is touched.

use crate::error::InputError;
use crate::tabular::{RawRow, RawTable};
use common::model::column_request::ColumnRequest;
use common::model::schema_description::SchemaDescription;
use common::model::sql::{ForeignKeySpec, Identifier, IdentifierError, SqlType};
use std::collections::HashSet;

pub const MY_COLNAME: &str = "MY_COLNAME";
pub const DB_COLNAME: &str = "DB_COLNAME";
pub const UNITS: &str = "UNITS";
pub const NEW_KEY: &str = "NEW_KEY";
pub const INDEXED: &str = "INDEXED";
pub const FOREIGN_KEY: &str = "FOREIGN_KEY";
pub const DESCRIPTION: &str = "DESCRIPTION";
pub const TABLE: &str = "TABLE";

pub const COLUMN_NAME: &str = "COLUMN_NAME";
pub const COMMENT: &str = "COMMENT";

const REQUEST_REQUIRED: &[&str] = &[MY_COLNAME, UNITS, DESCRIPTION, TABLE];
const REQUEST_OPTIONAL: &[&str] = &[DB_COLNAME, NEW_KEY, INDEXED, FOREIGN_KEY];

const SCHEMA_REQUIRED: &[&str] = &[COLUMN_NAME, COMMENT];
const SCHEMA_OPTIONAL: &[&str] = &[INDEXED, FOREIGN_KEY];

fn check_headers(raw: &RawTable, required: &[&str], optional: &[&str]) -> Result<(), InputError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|h| raw.column_index(h).is_none())
        .map(|h| h.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(InputError::MissingColumns(missing));
    }

    let unexpected: Vec<String> = raw
        .headers
        .iter()
        .filter(|h| !required.contains(&h.as_str()) && !optional.contains(&h.as_str()))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        return Err(InputError::UnexpectedColumns(unexpected));
    }
    Ok(())
}

fn parse_flag(row: usize, field: &'static str, cell: Option<&str>) -> Result<Option<bool>, InputError> {
    let Some(text) = cell else {
        return Ok(None);
    };
    match text.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" => Ok(Some(true)),
        "0" | "0.0" | "false" | "no" | "n" => Ok(Some(false)),
        _ => Err(InputError::InvalidField {
            row,
            field,
            value: text.to_string(),
        }),
    }
}

fn required<'a>(
    raw: &RawTable,
    row: &'a RawRow,
    field: &'static str,
) -> Result<&'a str, InputError> {
    raw.cell(row, field).ok_or(InputError::MissingField {
        row: row.row,
        field,
    })
}

fn named(row: usize) -> impl Fn(IdentifierError) -> InputError {
    move |source| InputError::InvalidName { row, source }
}

/// `"DOUBLE, solMass"` → (`DOUBLE`, `Some("solMass")`). Commas inside a
/// type's parentheses, as in `DECIMAL(10,3)`, belong to the type.
fn split_units(units: &str) -> (&str, Option<String>) {
    let mut depth = 0usize;
    let split = units.char_indices().find(|&(_, c)| {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return true,
            _ => {}
        }
        false
    });
    match split {
        Some((at, _)) => {
            let physical = units[at + 1..].trim();
            (units[..at].trim(), (!physical.is_empty()).then(|| physical.to_string()))
        }
        None => (units.trim(), None),
    }
}

/// Validates a change-request table.
pub fn parse_column_requests(raw: &RawTable) -> Result<Vec<ColumnRequest>, InputError> {
    check_headers(raw, REQUEST_REQUIRED, REQUEST_OPTIONAL)?;

    let mut seen = HashSet::new();
    let mut requests = Vec::with_capacity(raw.rows.len());

    for row in &raw.rows {
        let n = row.row;
        let source_name = required(raw, row, MY_COLNAME)?;
        let table_name = Identifier::parse(required(raw, row, TABLE)?).map_err(named(n))?;

        let (sql, physical_unit) = split_units(required(raw, row, UNITS)?);
        let sql_datatype = SqlType::parse(sql).map_err(named(n))?;

        let is_new = parse_flag(n, NEW_KEY, raw.cell(row, NEW_KEY))?.unwrap_or(false);
        let is_indexed = parse_flag(n, INDEXED, raw.cell(row, INDEXED))?.unwrap_or(false);

        let db_column_name = match raw.cell(row, DB_COLNAME) {
            Some(name) => name,
            None if is_new => source_name,
            None => {
                return Err(InputError::MissingField {
                    row: n,
                    field: DB_COLNAME,
                })
            }
        };
        let db_column_name = Identifier::parse(db_column_name).map_err(named(n))?;

        let foreign_key = raw
            .cell(row, FOREIGN_KEY)
            .map(ForeignKeySpec::parse)
            .transpose()
            .map_err(named(n))?;

        let key = (
            table_name.to_string(),
            db_column_name.as_str().to_ascii_lowercase(),
        );
        if !seen.insert(key) {
            return Err(InputError::DuplicateColumn {
                table: table_name.to_string(),
                column: db_column_name.to_string(),
            });
        }

        requests.push(ColumnRequest {
            source_name: source_name.to_string(),
            db_column_name,
            table_name,
            is_new,
            sql_datatype,
            physical_unit,
            is_indexed,
            foreign_key,
            description: raw.cell(row, DESCRIPTION).unwrap_or_default().to_string(),
            row: n,
        });
    }

    Ok(requests)
}

/// Validates a schema-description table.
pub fn parse_schema_description(raw: &RawTable) -> Result<Vec<SchemaDescription>, InputError> {
    check_headers(raw, SCHEMA_REQUIRED, SCHEMA_OPTIONAL)?;

    let mut seen = HashSet::new();
    let mut descriptions = Vec::with_capacity(raw.rows.len());

    for row in &raw.rows {
        let n = row.row;
        let column_name = Identifier::parse(required(raw, row, COLUMN_NAME)?).map_err(named(n))?;
        if !seen.insert(column_name.clone()) {
            return Err(InputError::DuplicateColumn {
                table: "schema description".to_string(),
                column: column_name.to_string(),
            });
        }
        let foreign_key = raw
            .cell(row, FOREIGN_KEY)
            .map(ForeignKeySpec::parse)
            .transpose()
            .map_err(named(n))?;

        descriptions.push(SchemaDescription {
            column_name,
            comment: required(raw, row, COMMENT)?.to_string(),
            indexed: parse_flag(n, INDEXED, raw.cell(row, INDEXED))?.unwrap_or(false),
            foreign_key,
        });
    }

    Ok(descriptions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, cells)| RawRow {
                    row: i + 1,
                    cells: cells.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        }
    }

    const HEADERS: &[&str] = &[
        "MY_COLNAME",
        "DB_COLNAME",
        "UNITS",
        "NEW_KEY",
        "DESCRIPTION",
        "TABLE",
    ];

    #[test]
    fn defaults_apply_to_new_columns() {
        let table = raw(
            HEADERS,
            &[&["st_lum", "", "STRING, solLum", "1", "Luminosity", "Stars"]],
        );
        let requests = parse_column_requests(&table).unwrap();
        let req = &requests[0];
        assert_eq!(req.db_column_name.as_str(), "st_lum");
        assert_eq!(req.sql_datatype.as_str(), "TEXT");
        assert_eq!(req.physical_unit.as_deref(), Some("solLum"));
        assert!(req.is_new);
        assert!(!req.is_indexed);
        assert!(req.foreign_key.is_none());
    }

    #[test]
    fn two_argument_types_keep_their_comma() {
        let table = raw(
            HEADERS,
            &[
                &["mass", "st_mass", "DECIMAL(10,3)", "1", "Mass", "Stars"],
                &["rad", "st_rad", "DECIMAL(10, 3), solRad", "1", "Radius", "Stars"],
            ],
        );
        let requests = parse_column_requests(&table).unwrap();
        assert_eq!(requests[0].sql_datatype.as_str(), "DECIMAL(10,3)");
        assert_eq!(requests[0].physical_unit, None);
        assert_eq!(requests[1].sql_datatype.as_str(), "DECIMAL(10, 3)");
        assert_eq!(requests[1].physical_unit.as_deref(), Some("solRad"));
    }

    #[test]
    fn missing_db_name_on_existing_column_is_fatal() {
        let table = raw(HEADERS, &[&["st_lum", "", "DOUBLE", "", "Luminosity", "Stars"]]);
        assert!(matches!(
            parse_column_requests(&table),
            Err(InputError::MissingField { row: 1, field: DB_COLNAME })
        ));
    }

    #[test]
    fn missing_units_is_fatal() {
        let table = raw(HEADERS, &[&["a", "a", "", "1", "x", "Stars"]]);
        assert!(matches!(
            parse_column_requests(&table),
            Err(InputError::MissingField { field: UNITS, .. })
        ));
    }

    #[test]
    fn header_set_is_checked() {
        let table = raw(&["MY_COLNAME", "UNITS", "TABLE"], &[]);
        assert!(matches!(
            parse_column_requests(&table),
            Err(InputError::MissingColumns(cols)) if cols == vec!["DESCRIPTION".to_string()]
        ));

        let table = raw(&["MY_COLNAME", "UNITS", "TABLE", "DESCRIPTION", "EXTRA"], &[]);
        assert!(matches!(
            parse_column_requests(&table),
            Err(InputError::UnexpectedColumns(cols)) if cols == vec!["EXTRA".to_string()]
        ));
    }

    #[test]
    fn bad_flag_is_reported_with_row() {
        let table = raw(HEADERS, &[&["a", "a", "DOUBLE", "maybe", "x", "Stars"]]);
        assert!(matches!(
            parse_column_requests(&table),
            Err(InputError::InvalidField { row: 1, field: NEW_KEY, .. })
        ));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let table = raw(
            HEADERS,
            &[
                &["a", "pl_a", "DOUBLE", "1", "x", "Planets"],
                &["b", "PL_A", "DOUBLE", "1", "y", "Planets"],
            ],
        );
        assert!(matches!(
            parse_column_requests(&table),
            Err(InputError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn injected_names_are_rejected() {
        let table = raw(HEADERS, &[&["a", "a; DROP TABLE x", "DOUBLE", "1", "x", "Stars"]]);
        assert!(matches!(
            parse_column_requests(&table),
            Err(InputError::InvalidName { row: 1, .. })
        ));
    }

    #[test]
    fn optional_constraint_columns() {
        let mut headers = HEADERS.to_vec();
        headers.extend(["INDEXED", "FOREIGN_KEY"]);
        let table = raw(
            &headers,
            &[&["st", "st_id", "INT", "1", "Star", "Planets", "yes", "Stars(st_id)"]],
        );
        let req = &parse_column_requests(&table).unwrap()[0];
        assert!(req.is_indexed);
        assert_eq!(req.foreign_key.as_ref().unwrap().to_string(), "Stars(st_id)");
    }

    #[test]
    fn schema_description_rows() {
        let table = raw(
            &["COLUMN_NAME", "COMMENT", "INDEXED", "FOREIGN_KEY"],
            &[
                &["pl_name", "Planet name", "1", ""],
                &["st_id", "Host star", "0", "Stars(st_id)"],
            ],
        );
        let schema = parse_schema_description(&table).unwrap();
        assert!(schema[0].indexed);
        assert!(schema[0].foreign_key.is_none());
        assert!(!schema[1].indexed);
        assert!(schema[1].foreign_key.is_some());
    }
}
