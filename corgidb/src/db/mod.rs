//! The database seam.
//!
//! Everything the reconciler needs from a live database goes through
//! [`Connection`]. [`mysql::MySqlConnection`] talks to a real server;
//! [`memory::MemoryConnection`] keeps tables in process for dry runs and tests.

pub mod describe;
pub mod memory;
pub mod mysql;

use crate::ddl::Statement;
use crate::error::{DbError, IngestError};
use common::model::sql::{Identifier, SqlType};
use common::model::table::{NaturalType, Table};
use std::collections::BTreeMap;

/// Column type overrides for a bulk load, keyed by column name.
pub type TypeOverrides = BTreeMap<String, SqlType>;

/// Blocking access to one database. Every call completes before the next.
pub trait Connection {
    fn execute(&mut self, statement: &Statement) -> Result<(), DbError>;

    fn show_tables(&mut self) -> Result<Vec<String>, DbError>;

    /// Column names in table order, as `SHOW COLUMNS` lists them.
    fn show_columns(&mut self, table: &Identifier) -> Result<Vec<String>, DbError>;

    /// Full `CREATE TABLE` text as the database reports it.
    fn show_create_table(&mut self, table: &Identifier) -> Result<String, DbError>;

    /// Drops `table` and recreates it from `data`; returns the number of
    /// rows written.
    fn bulk_load(
        &mut self,
        table: &Identifier,
        data: &Table,
        overrides: &TypeOverrides,
    ) -> Result<usize, DbError>;
}

/// Opens connections for work that runs away from the caller, such as
/// background jobs.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Connection + Send>, IngestError>;
}

/// Hands out copies of one in-memory database.
impl Connector for memory::MemoryConnection {
    fn connect(&self) -> Result<Box<dyn Connection + Send>, IngestError> {
        Ok(Box::new(self.clone()))
    }
}

/// Column type used for a loaded column when no override is given.
pub fn default_sql_type(data: &Table, index: usize) -> SqlType {
    match data.natural_type(index) {
        NaturalType::Boolean => SqlType::boolean(),
        NaturalType::Integer => SqlType::bigint(),
        NaturalType::Float => SqlType::double(),
        NaturalType::Text => SqlType::text(),
    }
}

/// Parses every column name of `data`; load targets must be valid identifiers.
pub fn load_columns(
    data: &Table,
    overrides: &TypeOverrides,
) -> Result<Vec<(Identifier, SqlType)>, DbError> {
    data.columns()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let column = Identifier::parse(name).map_err(|e| DbError::Rejected {
                statement: format!("bulk load column {}", name),
                reason: e.to_string(),
            })?;
            let sql_type = overrides
                .get(name)
                .cloned()
                .unwrap_or_else(|| default_sql_type(data, index));
            Ok((column, sql_type))
        })
        .collect()
}
