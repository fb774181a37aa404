//! Bringing live column comments and constraints in line with a schema
//! description.

use super::constraints::constraint_statements;
use crate::db::describe::{parse_create_table, ColumnDefinition};
use crate::db::Connection;
use crate::ddl::Statement;
use crate::error::IngestError;
use common::model::schema_description::SchemaDescription;
use common::model::sql::{ForeignKeySpec, Identifier};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MismatchKind {
    /// Live column with no schema row.
    MissingFromSchema,
    /// Schema row naming a column the table does not have.
    MissingFromTable,
    /// Schema row for a column that already carries a comment.
    AlreadyCommented,
}

impl MismatchKind {
    /// Whether strict mode turns this into an error.
    pub fn is_mismatch(self) -> bool {
        !matches!(self, MismatchKind::AlreadyCommented)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaWarning {
    pub table: String,
    pub column: String,
    pub kind: MismatchKind,
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MismatchKind::MissingFromSchema => write!(
                f,
                "{}.{} is present in table but missing from schema",
                self.table, self.column
            ),
            MismatchKind::MissingFromTable => write!(
                f,
                "{}.{} is present in schema but missing from table",
                self.table, self.column
            ),
            MismatchKind::AlreadyCommented => write!(
                f,
                "{}.{} already has a comment; left unchanged",
                self.table, self.column
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub warnings: Vec<SchemaWarning>,
    /// SQL of every statement executed, in order.
    pub statements: Vec<String>,
}

impl ReconcileReport {
    pub fn mismatches(&self) -> usize {
        self.warnings.iter().filter(|w| w.kind.is_mismatch()).count()
    }
}

/// Comment statements for one table, without touching the database.
///
/// `ddl` is the table's `SHOW CREATE TABLE` text. Columns that already have a
/// comment are never changed.
pub fn plan_comments(
    table: &Identifier,
    ddl: &str,
    schema: &[SchemaDescription],
) -> Result<(Vec<Statement>, Vec<SchemaWarning>), IngestError> {
    let live = parse_create_table(ddl);
    let warning = |column: &str, kind| SchemaWarning {
        table: table.to_string(),
        column: column.to_string(),
        kind,
    };

    let (commented, uncommented): (Vec<ColumnDefinition>, Vec<ColumnDefinition>) =
        live.into_iter().partition(ColumnDefinition::has_comment);

    let mut statements = Vec::new();
    let mut warnings = Vec::new();

    for column in &uncommented {
        match schema.iter().find(|s| s.column_name.as_str() == column.name) {
            Some(description) => statements.push(Statement::ChangeColumn {
                table: table.clone(),
                column: Identifier::parse(&column.name)?,
                definition: column.definition.clone(),
                comment: description.comment.clone(),
            }),
            None => warnings.push(warning(&column.name, MismatchKind::MissingFromSchema)),
        }
    }

    let uncommented: HashSet<&str> = uncommented.iter().map(|c| c.name.as_str()).collect();
    let commented: HashSet<&str> = commented.iter().map(|c| c.name.as_str()).collect();
    for description in schema {
        let name = description.column_name.as_str();
        if commented.contains(name) {
            warnings.push(warning(name, MismatchKind::AlreadyCommented));
        } else if !uncommented.contains(name) {
            warnings.push(warning(name, MismatchKind::MissingFromTable));
        }
    }

    Ok((statements, warnings))
}

/// Adds missing comments to `table` from `schema`.
///
/// Every mismatch is logged and returned. With `strict` set, any column-set
/// mismatch fails the call before a statement is issued.
pub fn reconcile_comments<C: Connection + ?Sized>(
    conn: &mut C,
    table: &Identifier,
    schema: &[SchemaDescription],
    strict: bool,
) -> Result<ReconcileReport, IngestError> {
    let ddl = conn.show_create_table(table)?;
    let (statements, warnings) = plan_comments(table, &ddl, schema)?;
    for w in &warnings {
        warn!("{}", w);
    }

    let mut report = ReconcileReport {
        warnings,
        statements: Vec::with_capacity(statements.len()),
    };
    if strict && report.mismatches() > 0 {
        return Err(IngestError::SchemaMismatch {
            table: table.to_string(),
            mismatches: report.mismatches(),
        });
    }

    for statement in statements {
        conn.execute(&statement)?;
        info!("{}", statement);
        report.statements.push(statement.to_sql());
    }
    Ok(report)
}

/// Applies the indexes and foreign keys `schema` asks for, limited to
/// columns the table actually has.
pub fn reconcile_constraints<C: Connection + ?Sized>(
    conn: &mut C,
    table: &Identifier,
    schema: &[SchemaDescription],
) -> Result<Vec<String>, IngestError> {
    let live: HashSet<String> = conn.show_columns(table)?.into_iter().collect();
    let present = |s: &&SchemaDescription| live.contains(s.column_name.as_str());

    let indexed: Vec<Identifier> = schema
        .iter()
        .filter(present)
        .filter(|s| s.indexed)
        .map(|s| s.column_name.clone())
        .collect();
    let foreign_keys: Vec<(Identifier, ForeignKeySpec)> = schema
        .iter()
        .filter(present)
        .filter_map(|s| {
            s.foreign_key
                .as_ref()
                .map(|fk| (s.column_name.clone(), fk.clone()))
        })
        .collect();

    let mut issued = Vec::new();
    for statement in constraint_statements(table, &indexed, &foreign_keys) {
        conn.execute(&statement)?;
        info!("{}", statement);
        issued.push(statement.to_sql());
    }
    Ok(issued)
}

/// Comments first, then constraints.
pub fn reconcile_schema<C: Connection + ?Sized>(
    conn: &mut C,
    table: &Identifier,
    schema: &[SchemaDescription],
    strict: bool,
) -> Result<ReconcileReport, IngestError> {
    let mut report = reconcile_comments(conn, table, schema, strict)?;
    report
        .statements
        .extend(reconcile_constraints(conn, table, schema)?);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDL: &str = "CREATE TABLE `Planets` (
  `pl_id` bigint NOT NULL AUTO_INCREMENT COMMENT 'Row id',
  `pl_name` varchar(13) DEFAULT NULL,
  `pl_orbper` double DEFAULT NULL,
  PRIMARY KEY (`pl_id`)
) ENGINE=InnoDB";

    fn describe(name: &str, comment: &str) -> SchemaDescription {
        SchemaDescription::new(Identifier::parse(name).unwrap(), comment.to_string())
    }

    fn planets() -> Identifier {
        Identifier::parse("Planets").unwrap()
    }

    #[test]
    fn change_column_keeps_the_definition() {
        let schema = vec![describe("pl_name", "Planet name"), describe("pl_orbper", "Period")];
        let (statements, warnings) = plan_comments(&planets(), DDL, &schema).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            statements[0].to_sql(),
            "ALTER TABLE `Planets` CHANGE COLUMN `pl_name` `pl_name` varchar(13) DEFAULT NULL COMMENT 'Planet name'"
        );
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn every_kind_of_mismatch_is_reported() {
        let schema = vec![describe("pl_id", "Id"), describe("pl_mass", "Mass"), describe("pl_name", "Name")];
        let (statements, warnings) = plan_comments(&planets(), DDL, &schema).unwrap();
        assert_eq!(statements.len(), 1);
        let kinds: Vec<(&str, MismatchKind)> = warnings
            .iter()
            .map(|w| (w.column.as_str(), w.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("pl_orbper", MismatchKind::MissingFromSchema),
                ("pl_id", MismatchKind::AlreadyCommented),
                ("pl_mass", MismatchKind::MissingFromTable),
            ]
        );
    }

    #[test]
    fn already_commented_is_not_a_mismatch() {
        assert!(MismatchKind::MissingFromSchema.is_mismatch());
        assert!(MismatchKind::MissingFromTable.is_mismatch());
        assert!(!MismatchKind::AlreadyCommented.is_mismatch());
    }
}
