//! Error types for ingestion, reconciliation and curve generation.
//!
//! Three classes matter to callers:
//! - [`InputError`]: the request itself is wrong. Raised before any statement
//!   runs for the affected scope.
//! - [`DbError`]: the database refused a statement. Statements already issued
//!   in the same pass stay applied.
//! - Mismatches between a schema description and a live table are not errors
//!   at all unless strict mode is on, see [`IngestError::SchemaMismatch`].

use common::model::sql::IdentifierError;
use common::model::table::TableError;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with an input file or the request it describes.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Unsupported file extension '{0}': expected csv, tsv, xls, xlsx or ods")]
    UnsupportedExtension(String),

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Input is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Input has unexpected column(s): {}", .0.join(", "))]
    UnexpectedColumns(Vec<String>),

    #[error("Row {row}: missing required field {field}")]
    MissingField { row: usize, field: &'static str },

    #[error("Row {row}: invalid value '{value}' for {field}")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("Row {row}: {source}")]
    InvalidName {
        row: usize,
        #[source]
        source: IdentifierError,
    },

    #[error("Column {column} is requested more than once for table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error(
        "Some keys requested for table {table} do not exist in DB, but are not marked as new: {}",
        .columns.join(", ")
    )]
    NotMarkedNew { table: String, columns: Vec<String> },

    #[error(
        "Some keys requested for table {table} are marked as new but already exist in DB: {}",
        .columns.join(", ")
    )]
    AlreadyExists { table: String, columns: Vec<String> },

    #[error("Unknown change request '{0}'")]
    UnknownRequest(String),

    #[error("Upload is missing the '{0}' part")]
    MissingPart(&'static str),

    #[error(transparent)]
    Name(#[from] IdentifierError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Failures reported by the database or the driver talking to it.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Could not connect to {server}: {reason}")]
    Connection { server: String, reason: String },

    #[error("Statement rejected: {reason} [{statement}]")]
    Rejected { statement: String, reason: String },

    #[error("Table {0} does not exist")]
    UnknownTable(String),

    #[error("Unexpected introspection output for {table}: {reason}")]
    Introspection { table: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret store error for {service}: {reason}")]
    Store { service: String, reason: String },

    #[error("Password prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("No stored password for {user} on {server}")]
    NotStored { user: String, server: String },
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Simulation configuration error: {0}")]
    Config(String),

    #[error("Simulation failed for mode {mode}: {reason}")]
    Mode { mode: String, reason: String },
}

/// Top-level error for every public operation in this crate.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("Schema description and table {table} disagree on {mismatches} column(s)")]
    SchemaMismatch { table: String, mismatches: usize },
}

impl From<IdentifierError> for IngestError {
    fn from(value: IdentifierError) -> Self {
        IngestError::Input(InputError::Name(value))
    }
}
