use crate::model::sql::{ForeignKeySpec, Identifier};
use serde::{Deserialize, Serialize};

/// Canonical description of one column of a table.
///
/// A set of these is reconciled against the live table by exact column name:
/// the comment is applied to uncommented columns, `indexed` columns share one
/// index, and each `foreign_key` becomes its own constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub column_name: Identifier,
    pub comment: String,
    pub indexed: bool,
    pub foreign_key: Option<ForeignKeySpec>,
}

impl SchemaDescription {
    pub fn new(column_name: Identifier, comment: impl Into<String>) -> Self {
        Self {
            column_name,
            comment: comment.into(),
            indexed: false,
            foreign_key: None,
        }
    }
}
