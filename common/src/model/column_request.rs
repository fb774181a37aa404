use crate::model::sql::{ForeignKeySpec, Identifier, SqlType};
use serde::{Deserialize, Serialize};

/// One validated row of a column change request.
///
/// Rows come from a spreadsheet that lists, per target table, the columns to
/// add or create. After defaulting, every field below except `physical_unit`
/// and `foreign_key` is guaranteed present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRequest {
    /// Name used by the computation that produced the data (`MY_COLNAME`).
    pub source_name: String,
    /// Target column. Defaults to `source_name` for new columns.
    pub db_column_name: Identifier,
    pub table_name: Identifier,
    pub is_new: bool,
    /// Already normalised: `STRING` arrives here as `TEXT`.
    pub sql_datatype: SqlType,
    /// Physical unit noted after the comma in the `UNITS` cell, if any.
    pub physical_unit: Option<String>,
    pub is_indexed: bool,
    pub foreign_key: Option<ForeignKeySpec>,
    /// Becomes the column comment.
    pub description: String,
    /// 1-based data row in the source file, for error reporting.
    pub row: usize,
}
