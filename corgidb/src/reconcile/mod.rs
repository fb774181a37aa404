//! The schema reconciler.
//!
//! A change request goes through [`request`] (validate), [`plan`] (classify
//! and diff against the live database) and [`plan::MigrationPlan::apply`]
//! (additive DDL). [`populate::populate_table`] reloads a table and hands it
//! to [`comments`] for comment and constraint reconciliation.

pub mod comments;
pub mod constraints;
pub mod plan;
pub mod populate;
pub mod request;

pub use comments::{reconcile_schema, MismatchKind, ReconcileReport, SchemaWarning};
pub use plan::{MigrationPlan, MigrationReport, TableDiff};
pub use populate::{populate_table, PopulateReport};

use crate::config::IngestOptions;
use crate::db::Connection;
use crate::error::IngestError;
use crate::tabular::read_table;
use common::model::column_request::ColumnRequest;
use common::model::schema_description::SchemaDescription;
use common::model::sql::Identifier;
use log::info;
use std::path::Path;

pub fn load_column_requests(
    path: &Path,
    options: &IngestOptions,
) -> Result<Vec<ColumnRequest>, IngestError> {
    let raw = read_table(path, options.comment_marker)?;
    Ok(request::parse_column_requests(&raw)?)
}

pub fn load_schema_description(
    path: &Path,
    options: &IngestOptions,
) -> Result<Vec<SchemaDescription>, IngestError> {
    let raw = read_table(path, options.comment_marker)?;
    Ok(request::parse_schema_description(&raw)?)
}

/// Reads and validates a change-request file and plans it. Nothing is written.
pub fn plan_column_request<C: Connection + ?Sized>(
    path: &Path,
    conn: &mut C,
    options: &IngestOptions,
) -> Result<MigrationPlan, IngestError> {
    let requests = load_column_requests(path, options)?;
    MigrationPlan::build(&requests, conn)
}

/// Applies a change-request file to the database.
pub fn process_column_request<C: Connection + ?Sized>(
    path: &Path,
    conn: &mut C,
    options: &IngestOptions,
) -> Result<MigrationReport, IngestError> {
    let plan = plan_column_request(path, conn, options)?;
    let report = plan.apply(conn)?;
    info!("{}: {}", path.display(), report.summary());
    Ok(report)
}

/// [`populate_table`] with the data and schema description read from files.
pub fn populate_from_files<C: Connection + ?Sized>(
    table: &Identifier,
    data_path: &Path,
    schema_path: &Path,
    conn: &mut C,
    options: &IngestOptions,
) -> Result<PopulateReport, IngestError> {
    let schema = load_schema_description(schema_path, options)?;
    let data = read_table(data_path, options.comment_marker)?.to_table()?;
    populate_table(table, &data, &schema, conn, options)
}
