//! Replacing a table's contents and then reconciling its schema.

use super::comments::{reconcile_schema, ReconcileReport};
use crate::config::IngestOptions;
use crate::db::{Connection, TypeOverrides};
use crate::error::IngestError;
use common::model::schema_description::SchemaDescription;
use common::model::sql::{Identifier, SqlType};
use common::model::table::{NaturalType, Table};
use log::info;
use serde::Serialize;

// Longest VARCHAR that fits a utf8mb4 row alongside other columns.
const MAX_VARCHAR: usize = 16_383;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulateReport {
    pub rows: usize,
    pub reconcile: ReconcileReport,
}

/// Sizes every text column to its longest value.
pub fn text_width_overrides(data: &Table) -> TypeOverrides {
    data.columns()
        .iter()
        .enumerate()
        .filter(|(index, _)| data.natural_type(*index) == NaturalType::Text)
        .map(|(index, name)| {
            let width = data.max_text_width(index).max(1);
            let sql_type = if width > MAX_VARCHAR {
                SqlType::text()
            } else {
                SqlType::varchar(width)
            };
            (name.clone(), sql_type)
        })
        .collect()
}

/// Drops and reloads `table` from `data`, then applies `schema`'s comments
/// and constraints to it.
pub fn populate_table<C: Connection + ?Sized>(
    table: &Identifier,
    data: &Table,
    schema: &[SchemaDescription],
    conn: &mut C,
    options: &IngestOptions,
) -> Result<PopulateReport, IngestError> {
    let overrides = text_width_overrides(data);
    let rows = conn.bulk_load(table, data, &overrides)?;
    info!("Replaced {} with {} row(s)", table, rows);

    let reconcile = reconcile_schema(conn, table, schema, options.strict_schema)?;
    Ok(PopulateReport { rows, reconcile })
}
