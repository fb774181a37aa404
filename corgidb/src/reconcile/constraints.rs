//! Index and foreign-key statements shared by table creation, column
//! addition and schema reconciliation.

use crate::ddl::Statement;
use common::model::sql::{ForeignKeySpec, Identifier};

/// One `ADD INDEX` over every indexed column, then one `ADD FOREIGN KEY` per
/// reference. Nothing at all when both lists are empty.
pub fn constraint_statements(
    table: &Identifier,
    indexed: &[Identifier],
    foreign_keys: &[(Identifier, ForeignKeySpec)],
) -> Vec<Statement> {
    let mut statements = Vec::with_capacity(foreign_keys.len() + 1);
    if !indexed.is_empty() {
        statements.push(Statement::AddIndex {
            table: table.clone(),
            columns: indexed.to_vec(),
        });
    }
    statements.extend(
        foreign_keys
            .iter()
            .map(|(column, references)| Statement::AddForeignKey {
                table: table.clone(),
                column: column.clone(),
                references: references.clone(),
            }),
    );
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[test]
    fn no_constraints_no_statements() {
        assert!(constraint_statements(&id("Stars"), &[], &[]).is_empty());
    }

    #[test]
    fn single_index_many_keys() {
        let statements = constraint_statements(
            &id("Planets"),
            &[id("pl_name"), id("pl_letter")],
            &[
                (id("st_id"), ForeignKeySpec::parse("Stars(st_id)").unwrap()),
                (id("sc_id"), ForeignKeySpec::parse("Scenarios(sc_id)").unwrap()),
            ],
        );
        assert_eq!(statements.len(), 3);
        assert!(matches!(&statements[0], Statement::AddIndex { columns, .. } if columns.len() == 2));
        assert!(matches!(statements[1], Statement::AddForeignKey { .. }));
        assert!(matches!(statements[2], Statement::AddForeignKey { .. }));
    }
}
