//! Diffing a change request against the live database.
//!
//! [`MigrationPlan::build`] only reads. It checks every table in the request
//! before returning, so an inconsistent request issues no statement at all.
//! [`MigrationPlan::apply`] then runs the statements in order: existing tables
//! first, new tables after. There is no transaction around the pass.

use super::constraints::constraint_statements;
use crate::db::Connection;
use crate::ddl::{ColumnSpec, Statement};
use crate::error::{InputError, IngestError};
use common::model::column_request::ColumnRequest;
use common::model::sql::{ForeignKeySpec, Identifier};
use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// What one table needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDiff {
    pub table: Identifier,
    /// Whether the table is already in the database.
    pub exists: bool,
    /// Every row of the request for this table, in file order.
    pub requested: Vec<ColumnRequest>,
    /// Requested columns the table lacks. For a new table, all of them.
    pub missing: Vec<ColumnRequest>,
}

fn column_spec(request: &ColumnRequest) -> ColumnSpec {
    ColumnSpec {
        name: request.db_column_name.clone(),
        sql_type: request.sql_datatype.clone(),
        comment: request.description.clone(),
    }
}

impl TableDiff {
    pub fn indexed(&self) -> Vec<Identifier> {
        self.requested
            .iter()
            .filter(|r| r.is_indexed)
            .map(|r| r.db_column_name.clone())
            .collect()
    }

    pub fn foreign_keys(&self) -> Vec<(Identifier, ForeignKeySpec)> {
        self.requested
            .iter()
            .filter_map(|r| {
                r.foreign_key
                    .as_ref()
                    .map(|fk| (r.db_column_name.clone(), fk.clone()))
            })
            .collect()
    }

    pub fn statements(&self) -> Vec<Statement> {
        let mut statements: Vec<Statement> = if self.exists {
            self.missing
                .iter()
                .map(|r| Statement::AddColumn {
                    table: self.table.clone(),
                    column: column_spec(r),
                })
                .collect()
        } else {
            vec![Statement::CreateTable {
                table: self.table.clone(),
                columns: self.missing.iter().map(column_spec).collect(),
            }]
        };
        statements.extend(constraint_statements(
            &self.table,
            &self.indexed(),
            &self.foreign_keys(),
        ));
        statements
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub altered_tables: Vec<String>,
    pub created_tables: Vec<String>,
    /// SQL of every statement executed, in order.
    pub statements: Vec<String>,
}

impl MigrationReport {
    pub fn summary(&self) -> String {
        format!(
            "{} statement(s): altered [{}], created [{}]",
            self.statements.len(),
            self.altered_tables.join(", "),
            self.created_tables.join(", ")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationPlan {
    pub diffs: Vec<TableDiff>,
}

impl MigrationPlan {
    /// Classifies requested tables and checks every requested column.
    ///
    /// Fails with [`InputError::NotMarkedNew`] when a column absent from a
    /// live table is not flagged new, and with [`InputError::AlreadyExists`]
    /// when a column flagged new is already there.
    pub fn build<C: Connection + ?Sized>(
        requests: &[ColumnRequest],
        conn: &mut C,
    ) -> Result<Self, IngestError> {
        let live: HashSet<String> = conn.show_tables()?.into_iter().collect();

        let mut grouped: BTreeMap<Identifier, Vec<ColumnRequest>> = BTreeMap::new();
        for request in requests {
            grouped
                .entry(request.table_name.clone())
                .or_default()
                .push(request.clone());
        }

        let mut existing = Vec::new();
        let mut created = Vec::new();

        for (table, requested) in grouped {
            if !live.contains(table.as_str()) {
                debug!("Table {} is new with {} column(s)", table, requested.len());
                created.push(TableDiff {
                    table,
                    exists: false,
                    missing: requested.clone(),
                    requested,
                });
                continue;
            }

            // MySQL column names are case-insensitive.
            let columns: HashSet<String> = conn
                .show_columns(&table)?
                .into_iter()
                .map(|name| name.to_ascii_lowercase())
                .collect();
            let (missing, present): (Vec<ColumnRequest>, Vec<ColumnRequest>) =
                requested.iter().cloned().partition(|r| {
                    !columns.contains(&r.db_column_name.as_str().to_ascii_lowercase())
                });

            let not_new: Vec<String> = missing
                .iter()
                .filter(|r| !r.is_new)
                .map(|r| r.db_column_name.to_string())
                .collect();
            if !not_new.is_empty() {
                return Err(InputError::NotMarkedNew {
                    table: table.to_string(),
                    columns: not_new,
                }
                .into());
            }

            let stale: Vec<String> = present
                .iter()
                .filter(|r| r.is_new)
                .map(|r| r.db_column_name.to_string())
                .collect();
            if !stale.is_empty() {
                return Err(InputError::AlreadyExists {
                    table: table.to_string(),
                    columns: stale,
                }
                .into());
            }

            debug!("Table {} gains {} column(s)", table, missing.len());
            existing.push(TableDiff {
                table,
                exists: true,
                requested,
                missing,
            });
        }

        existing.extend(created);
        Ok(Self { diffs: existing })
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.diffs.iter().flat_map(TableDiff::statements).collect()
    }

    pub fn apply<C: Connection + ?Sized>(&self, conn: &mut C) -> Result<MigrationReport, IngestError> {
        self.apply_with_progress(conn, |_, _| {})
    }

    /// Runs the plan, calling `progress` after each executed statement with
    /// the running count.
    pub fn apply_with_progress<C, F>(
        &self,
        conn: &mut C,
        mut progress: F,
    ) -> Result<MigrationReport, IngestError>
    where
        C: Connection + ?Sized,
        F: FnMut(usize, &Statement),
    {
        let mut report = MigrationReport::default();
        for diff in &self.diffs {
            for statement in diff.statements() {
                conn.execute(&statement)?;
                info!("{}", statement);
                report.statements.push(statement.to_sql());
                progress(report.statements.len(), &statement);
            }
            let tables = if diff.exists {
                &mut report.altered_tables
            } else {
                &mut report.created_tables
            };
            tables.push(diff.table.to_string());
        }
        Ok(report)
    }
}
