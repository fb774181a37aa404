//! [`Connection`] backed by a MySQL server.

use super::{load_columns, Connection, Connector, TypeOverrides};
use crate::config::DatabaseSettings;
use crate::ddl::Statement;
use crate::error::{DbError, IngestError};
use crate::secrets::{connect_stored, KeyringStore};
use ::mysql::prelude::Queryable;
use ::mysql::{Conn, OptsBuilder, Params, Row};
use common::model::sql::Identifier;
use common::model::table::{Table, Value};
use log::debug;

// MySQL allows at most 65535 placeholders per prepared statement.
const MAX_PLACEHOLDERS: usize = 60_000;

pub struct MySqlConnection {
    conn: Conn,
}

impl MySqlConnection {
    pub fn open(settings: &DatabaseSettings, password: &str) -> Result<Self, DbError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(settings.server.clone()))
            .tcp_port(settings.port)
            .user(Some(settings.username.clone()))
            .pass(Some(password.to_string()))
            .db_name(Some(settings.database.clone()));
        let conn = Conn::new(opts).map_err(|e| DbError::Connection {
            server: settings.server.clone(),
            reason: e.to_string(),
        })?;
        debug!(
            "Connected to {}/{} as {}",
            settings.server, settings.database, settings.username
        );
        Ok(Self { conn })
    }

    fn run(&mut self, sql: &str) -> Result<(), DbError> {
        self.conn.query_drop(sql).map_err(|e| DbError::Rejected {
            statement: sql.to_string(),
            reason: e.to_string(),
        })
    }

    fn rows(&mut self, sql: &str, table: &Identifier) -> Result<Vec<Row>, DbError> {
        self.conn.query::<Row, _>(sql).map_err(|e| DbError::Introspection {
            table: table.to_string(),
            reason: e.to_string(),
        })
    }
}

fn text_at(row: &Row, index: usize, table: &Identifier) -> Result<String, DbError> {
    match row.get_opt::<Option<String>, usize>(index) {
        Some(Ok(value)) => Ok(value.unwrap_or_default()),
        Some(Err(e)) => Err(DbError::Introspection {
            table: table.to_string(),
            reason: e.to_string(),
        }),
        None => Err(DbError::Introspection {
            table: table.to_string(),
            reason: format!("missing column {} in result", index),
        }),
    }
}

fn to_sql_value(value: &Value) -> ::mysql::Value {
    match value {
        Value::Null => ::mysql::Value::NULL,
        Value::Bool(b) => ::mysql::Value::Int(i64::from(*b)),
        Value::Int(i) => ::mysql::Value::Int(*i),
        // NaN and infinities have no column representation.
        Value::Float(f) if f.is_finite() => ::mysql::Value::Double(*f),
        Value::Float(_) => ::mysql::Value::NULL,
        Value::Text(s) => ::mysql::Value::Bytes(s.clone().into_bytes()),
    }
}

impl Connection for MySqlConnection {
    fn execute(&mut self, statement: &Statement) -> Result<(), DbError> {
        self.run(&statement.to_sql())
    }

    fn show_tables(&mut self) -> Result<Vec<String>, DbError> {
        self.conn
            .query::<String, _>("SHOW TABLES")
            .map_err(|e| DbError::Rejected {
                statement: "SHOW TABLES".to_string(),
                reason: e.to_string(),
            })
    }

    fn show_columns(&mut self, table: &Identifier) -> Result<Vec<String>, DbError> {
        let sql = format!("SHOW COLUMNS IN {}", table.quoted());
        self.rows(&sql, table)?
            .iter()
            .map(|row| text_at(row, 0, table))
            .collect()
    }

    fn show_create_table(&mut self, table: &Identifier) -> Result<String, DbError> {
        let sql = format!("SHOW CREATE TABLE {}", table.quoted());
        let rows = self.rows(&sql, table)?;
        let row = rows
            .first()
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))?;
        text_at(row, 1, table)
    }

    fn bulk_load(
        &mut self,
        table: &Identifier,
        data: &Table,
        overrides: &TypeOverrides,
    ) -> Result<usize, DbError> {
        let columns = load_columns(data, overrides)?;
        if columns.is_empty() {
            return Ok(0);
        }

        self.run(&format!("DROP TABLE IF EXISTS {}", table.quoted()))?;
        let body: Vec<String> = columns
            .iter()
            .map(|(name, sql_type)| format!("{} {}", name.quoted(), sql_type))
            .collect();
        self.run(&format!(
            "CREATE TABLE {} ({})",
            table.quoted(),
            body.join(", ")
        ))?;

        let names: Vec<String> = columns.iter().map(|(name, _)| name.quoted()).collect();
        let placeholder = format!("({})", vec!["?"; columns.len()].join(", "));
        let chunk_rows = (MAX_PLACEHOLDERS / columns.len()).max(1);

        let mut written = 0;
        for chunk in data.rows().chunks(chunk_rows) {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES {}",
                table.quoted(),
                names.join(", "),
                vec![placeholder.as_str(); chunk.len()].join(", ")
            );
            let params: Vec<::mysql::Value> = chunk.iter().flatten().map(to_sql_value).collect();
            self.conn
                .exec_drop(sql.as_str(), Params::Positional(params))
                .map_err(|e| DbError::Rejected {
                    statement: format!("INSERT INTO {} ({} rows)", table.quoted(), chunk.len()),
                    reason: e.to_string(),
                })?;
            written += chunk.len();
        }
        debug!("Inserted {} rows into {}", written, table);
        Ok(written)
    }
}

/// Connects with the password kept in the system keyring. Never prompts.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    pub settings: DatabaseSettings,
}

impl Connector for MySqlConnector {
    fn connect(&self) -> Result<Box<dyn Connection + Send>, IngestError> {
        let conn = connect_stored(&self.settings, &KeyringStore, MySqlConnection::open)?;
        Ok(Box::new(conn))
    }
}
