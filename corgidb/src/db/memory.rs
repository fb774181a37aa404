//! An in-process [`Connection`] that applies statements to table metadata.
//!
//! It answers introspection the way MySQL does (including `SHOW CREATE TABLE`
//! text with comments), rejects statements a server would reject, and records
//! every statement it executed. Useful for previewing a change request and
//! for tests.

use super::{load_columns, Connection, TypeOverrides};
use crate::ddl::{quote_literal, ColumnSpec, Statement};
use crate::error::DbError;
use common::model::sql::{ForeignKeySpec, Identifier, SqlType};
use common::model::table::Table;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryColumn {
    pub name: String,
    pub definition: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTable {
    pub columns: Vec<MemoryColumn>,
    pub indexes: Vec<Vec<String>>,
    pub foreign_keys: Vec<(String, ForeignKeySpec)>,
    pub rows: usize,
}

impl MemoryTable {
    fn column(&self, name: &str) -> Option<&MemoryColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn column_mut(&mut self, name: &str) -> Option<&mut MemoryColumn> {
        self.columns.iter_mut().find(|c| c.name == name)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryConnection {
    tables: BTreeMap<String, MemoryTable>,
    executed: Vec<Statement>,
    fail_on: Option<usize>,
}

fn definition_for(sql_type: &SqlType) -> String {
    format!("{} DEFAULT NULL", sql_type.as_str().to_lowercase())
}

fn rejected(statement: &Statement, reason: impl Into<String>) -> DbError {
    DbError::Rejected {
        statement: statement.to_sql(),
        reason: reason.into(),
    }
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table whose columns are given as `(name, definition)` pairs,
    /// e.g. `("st_mass", "double DEFAULT NULL")`.
    pub fn with_table(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
        let table = MemoryTable {
            columns: columns
                .iter()
                .map(|(n, d)| MemoryColumn {
                    name: n.to_string(),
                    definition: d.to_string(),
                    comment: None,
                })
                .collect(),
            ..MemoryTable::default()
        };
        self.tables.insert(name.to_string(), table);
        self
    }

    /// Makes the `n`th executed statement (0-based, counted from now) fail.
    pub fn fail_on_statement(mut self, n: usize) -> Self {
        self.fail_on = Some(self.executed.len() + n);
        self
    }

    pub fn executed(&self) -> &[Statement] {
        &self.executed
    }

    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }

    pub fn column_comment(&self, table: &str, column: &str) -> Option<&str> {
        self.tables
            .get(table)?
            .column(column)?
            .comment
            .as_deref()
    }

    fn existing(&self, statement: &Statement) -> Result<&MemoryTable, DbError> {
        let name = statement.table().as_str();
        self.tables
            .get(name)
            .ok_or_else(|| rejected(statement, format!("Table '{}' doesn't exist", name)))
    }

    fn apply(&mut self, statement: &Statement) -> Result<(), DbError> {
        match statement {
            Statement::AddColumn { table, column } => {
                if self.existing(statement)?.column(column.name.as_str()).is_some() {
                    return Err(rejected(
                        statement,
                        format!("Duplicate column name '{}'", column.name),
                    ));
                }
                self.push_column(table, column);
            }
            Statement::CreateTable { table, columns } => {
                if self.tables.contains_key(table.as_str()) {
                    return Err(rejected(
                        statement,
                        format!("Table '{}' already exists", table),
                    ));
                }
                self.tables.insert(table.to_string(), MemoryTable::default());
                for column in columns {
                    self.push_column(table, column);
                }
            }
            Statement::AddIndex { table, columns } => {
                let existing = self.existing(statement)?;
                if columns.is_empty() {
                    return Err(rejected(statement, "Index needs at least one column"));
                }
                if let Some(missing) = columns.iter().find(|c| existing.column(c.as_str()).is_none()) {
                    return Err(rejected(
                        statement,
                        format!("Key column '{}' doesn't exist in table", missing),
                    ));
                }
                let names = columns.iter().map(|c| c.to_string()).collect();
                self.table_mut(table).indexes.push(names);
            }
            Statement::AddForeignKey {
                table,
                column,
                references,
            } => {
                if self.existing(statement)?.column(column.as_str()).is_none() {
                    return Err(rejected(
                        statement,
                        format!("Key column '{}' doesn't exist in table", column),
                    ));
                }
                let referenced = self
                    .tables
                    .get(references.table.as_str())
                    .and_then(|t| t.column(references.column.as_str()));
                if referenced.is_none() {
                    return Err(rejected(
                        statement,
                        format!("Failed to open the referenced table '{}'", references.table),
                    ));
                }
                self.table_mut(table)
                    .foreign_keys
                    .push((column.to_string(), references.clone()));
            }
            Statement::ChangeColumn {
                table,
                column,
                definition,
                comment,
            } => {
                if self.existing(statement)?.column(column.as_str()).is_none() {
                    return Err(rejected(
                        statement,
                        format!("Unknown column '{}'", column),
                    ));
                }
                if let Some(target) = self.table_mut(table).column_mut(column.as_str()) {
                    target.definition = definition.trim().to_string();
                    target.comment = Some(comment.clone());
                }
            }
        }
        Ok(())
    }

    fn table_mut(&mut self, table: &Identifier) -> &mut MemoryTable {
        self.tables.entry(table.to_string()).or_default()
    }

    fn push_column(&mut self, table: &Identifier, column: &ColumnSpec) {
        self.table_mut(table).columns.push(MemoryColumn {
            name: column.name.to_string(),
            definition: definition_for(&column.sql_type),
            comment: Some(column.comment.clone()),
        });
    }
}

impl Connection for MemoryConnection {
    fn execute(&mut self, statement: &Statement) -> Result<(), DbError> {
        if self.fail_on == Some(self.executed.len()) {
            self.fail_on = None;
            return Err(rejected(statement, "Injected failure"));
        }
        self.apply(statement)?;
        self.executed.push(statement.clone());
        Ok(())
    }

    fn show_tables(&mut self) -> Result<Vec<String>, DbError> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn show_columns(&mut self, table: &Identifier) -> Result<Vec<String>, DbError> {
        let existing = self
            .tables
            .get(table.as_str())
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))?;
        Ok(existing.columns.iter().map(|c| c.name.clone()).collect())
    }

    fn show_create_table(&mut self, table: &Identifier) -> Result<String, DbError> {
        let existing = self
            .tables
            .get(table.as_str())
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))?;
        let mut lines: Vec<String> = existing
            .columns
            .iter()
            .map(|c| match &c.comment {
                Some(comment) => format!(
                    "  `{}` {} COMMENT {}",
                    c.name,
                    c.definition,
                    quote_literal(comment)
                ),
                None => format!("  `{}` {}", c.name, c.definition),
            })
            .collect();
        for columns in &existing.indexes {
            let quoted: Vec<String> = columns.iter().map(|c| format!("`{}`", c)).collect();
            lines.push(format!("  KEY `{}` ({})", columns[0], quoted.join(",")));
        }
        for (column, references) in &existing.foreign_keys {
            lines.push(format!(
                "  CONSTRAINT `{}_ibfk` FOREIGN KEY (`{}`) REFERENCES `{}` (`{}`)",
                table, column, references.table, references.column
            ));
        }
        Ok(format!(
            "CREATE TABLE `{}` (\n{}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
            table,
            lines.join(",\n")
        ))
    }

    fn bulk_load(
        &mut self,
        table: &Identifier,
        data: &Table,
        overrides: &TypeOverrides,
    ) -> Result<usize, DbError> {
        let columns = load_columns(data, overrides)?;
        let fresh = MemoryTable {
            columns: columns
                .iter()
                .map(|(name, sql_type)| MemoryColumn {
                    name: name.to_string(),
                    definition: definition_for(sql_type),
                    comment: None,
                })
                .collect(),
            rows: data.len(),
            ..MemoryTable::default()
        };
        self.tables.insert(table.to_string(), fresh);
        Ok(data.len())
    }
}
