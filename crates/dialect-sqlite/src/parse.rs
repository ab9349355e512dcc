use drift_core::StatementParser;
use sqlparser::{
    ast::{AlterTableOperation, ObjectName, RenameTableNameKind, Statement},
    dialect::SQLiteDialect,
    parser::Parser,
};

/// Recovers rename semantics from raw SQLite statements via `sqlparser`.
/// `ALTER TABLE ... RENAME COLUMN` is the only way SQLite spells a column
/// rename, so the diff engine relies on this recovery.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteStatementParser;

fn parse_first(sql: &str) -> Option<Statement> {
    Parser::parse_sql(&SQLiteDialect {}, sql)
        .ok()?
        .into_iter()
        .next()
}

fn object_leaf(name: &ObjectName) -> Option<String> {
    name.0
        .last()
        .and_then(|part| part.as_ident())
        .map(|ident| ident.value.clone())
}

impl StatementParser for SqliteStatementParser {
    fn is_alter_table(&self, stmt: &str) -> bool {
        matches!(parse_first(stmt), Some(Statement::AlterTable { .. }))
    }

    fn rename_table(&self, stmt: &str) -> Option<(String, String)> {
        let Statement::AlterTable {
            name, operations, ..
        } = parse_first(stmt)?
        else {
            return None;
        };
        operations.iter().find_map(|operation| {
            let AlterTableOperation::RenameTable { table_name } = operation else {
                return None;
            };
            let table_name = match table_name {
                RenameTableNameKind::As(name) | RenameTableNameKind::To(name) => name,
            };
            Some((object_leaf(&name)?, object_leaf(table_name)?))
        })
    }

    fn rename_column(&self, stmt: &str) -> Option<(String, String, String)> {
        let Statement::AlterTable {
            name, operations, ..
        } = parse_first(stmt)?
        else {
            return None;
        };
        operations.iter().find_map(|operation| {
            let AlterTableOperation::RenameColumn {
                old_column_name,
                new_column_name,
            } = operation
            else {
                return None;
            };
            Some((
                object_leaf(&name)?,
                old_column_name.value.clone(),
                new_column_name.value.clone(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_column_rename() {
        let parser = SqliteStatementParser;
        let recovered = parser
            .rename_column("ALTER TABLE t RENAME COLUMN c1 TO c2")
            .unwrap();
        assert_eq!(
            recovered,
            ("t".to_string(), "c1".to_string(), "c2".to_string())
        );
    }

    #[test]
    fn recovers_table_rename() {
        let parser = SqliteStatementParser;
        let recovered = parser
            .rename_table("ALTER TABLE \"t\" RENAME TO \"t2\"")
            .unwrap();
        assert_eq!(recovered, ("t".to_string(), "t2".to_string()));
    }
}
