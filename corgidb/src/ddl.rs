//! Additive DDL statements, one variant per kind of change.
//!
//! Names are [`Identifier`]s and render backtick-quoted; comments render as
//! escaped string literals. Nothing here can express `DROP` or a type change.

use common::model::sql::{ForeignKeySpec, Identifier, SqlType};
use std::fmt;

/// A column inside `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: Identifier,
    pub sql_type: SqlType,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    AddColumn {
        table: Identifier,
        column: ColumnSpec,
    },
    CreateTable {
        table: Identifier,
        columns: Vec<ColumnSpec>,
    },
    /// One index over all listed columns.
    AddIndex {
        table: Identifier,
        columns: Vec<Identifier>,
    },
    AddForeignKey {
        table: Identifier,
        column: Identifier,
        references: ForeignKeySpec,
    },
    /// Re-applies a column's current definition with a comment attached.
    /// `definition` is the type/nullability text reported by the database
    /// itself, never user input.
    ChangeColumn {
        table: Identifier,
        column: Identifier,
        definition: String,
        comment: String,
    },
}

impl Statement {
    pub fn table(&self) -> &Identifier {
        match self {
            Statement::AddColumn { table, .. }
            | Statement::CreateTable { table, .. }
            | Statement::AddIndex { table, .. }
            | Statement::AddForeignKey { table, .. }
            | Statement::ChangeColumn { table, .. } => table,
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            Statement::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {}",
                table.quoted(),
                column_definition(column)
            ),
            Statement::CreateTable { table, columns } => {
                let body: Vec<String> = columns.iter().map(column_definition).collect();
                format!("CREATE TABLE {} ({})", table.quoted(), body.join(", "))
            }
            Statement::AddIndex { table, columns } => format!(
                "ALTER TABLE {} ADD INDEX ({})",
                table.quoted(),
                quoted_list(columns)
            ),
            Statement::AddForeignKey {
                table,
                column,
                references,
            } => format!(
                "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE NO ACTION ON UPDATE NO ACTION",
                table.quoted(),
                column.quoted(),
                references.table.quoted(),
                references.column.quoted()
            ),
            Statement::ChangeColumn {
                table,
                column,
                definition,
                comment,
            } => format!(
                "ALTER TABLE {} CHANGE COLUMN {} {} {} COMMENT {}",
                table.quoted(),
                column.quoted(),
                column.quoted(),
                definition.trim(),
                quote_literal(comment)
            ),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn column_definition(column: &ColumnSpec) -> String {
    format!(
        "{} {} COMMENT {}",
        column.name.quoted(),
        column.sql_type,
        quote_literal(&column.comment)
    )
}

fn quoted_list(columns: &[Identifier]) -> String {
    columns
        .iter()
        .map(Identifier::quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Single-quoted MySQL string literal.
pub fn quote_literal(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('\'', "''");
    format!("'{}'", escaped)
}

/// Inverse of [`quote_literal`] applied to the text between the quotes.
pub fn unescape_literal(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[test]
    fn add_column_with_string_sentinel_renders_text() {
        let stmt = Statement::AddColumn {
            table: id("Planets"),
            column: ColumnSpec {
                name: id("pl_notes"),
                sql_type: SqlType::parse("STRING").unwrap(),
                comment: "Free-form notes".into(),
            },
        };
        assert_eq!(
            stmt.to_sql(),
            "ALTER TABLE `Planets` ADD COLUMN `pl_notes` TEXT COMMENT 'Free-form notes'"
        );
    }

    #[test]
    fn create_table_lists_every_column() {
        let stmt = Statement::CreateTable {
            table: id("Scenarios"),
            columns: vec![
                ColumnSpec {
                    name: id("scenario_name"),
                    sql_type: SqlType::varchar(32),
                    comment: "Scenario".into(),
                },
                ColumnSpec {
                    name: id("lam"),
                    sql_type: SqlType::double(),
                    comment: "Central wavelength (nm)".into(),
                },
            ],
        };
        assert_eq!(
            stmt.to_sql(),
            "CREATE TABLE `Scenarios` (`scenario_name` VARCHAR(32) COMMENT 'Scenario', \
             `lam` DOUBLE COMMENT 'Central wavelength (nm)')"
        );
    }

    #[test]
    fn index_and_foreign_key() {
        let index = Statement::AddIndex {
            table: id("Planets"),
            columns: vec![id("pl_name"), id("st_id")],
        };
        assert_eq!(index.to_sql(), "ALTER TABLE `Planets` ADD INDEX (`pl_name`, `st_id`)");

        let fk = Statement::AddForeignKey {
            table: id("Planets"),
            column: id("st_id"),
            references: ForeignKeySpec::parse("Stars(st_id)").unwrap(),
        };
        assert_eq!(
            fk.to_sql(),
            "ALTER TABLE `Planets` ADD FOREIGN KEY (`st_id`) REFERENCES `Stars`(`st_id`) \
             ON DELETE NO ACTION ON UPDATE NO ACTION"
        );
    }

    #[test]
    fn change_column_keeps_definition() {
        let stmt = Statement::ChangeColumn {
            table: id("Stars"),
            column: id("st_mass"),
            definition: "double DEFAULT NULL".into(),
            comment: "Stellar mass".into(),
        };
        assert_eq!(
            stmt.to_sql(),
            "ALTER TABLE `Stars` CHANGE COLUMN `st_mass` `st_mass` double DEFAULT NULL COMMENT 'Stellar mass'"
        );
    }

    #[test]
    fn literals_escape_and_unescape() {
        let text = r"Planet's mass \ Jupiter";
        let quoted = quote_literal(text);
        assert_eq!(quoted, r"'Planet''s mass \\ Jupiter'");
        assert_eq!(unescape_literal(&quoted[1..quoted.len() - 1]), text);
    }
}
