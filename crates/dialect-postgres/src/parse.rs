use drift_core::StatementParser;
use pg_query::protobuf::{ObjectType, node::Node as NodeEnum};

/// Recovers rename semantics from raw PostgreSQL statements via `pg_query`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresStatementParser;

fn first_node(sql: &str) -> Option<NodeEnum> {
    let parsed = pg_query::parse(sql).ok()?;
    let raw = parsed.protobuf.stmts.into_iter().next()?;
    raw.stmt?.node
}

impl StatementParser for PostgresStatementParser {
    fn is_alter_table(&self, stmt: &str) -> bool {
        match first_node(stmt) {
            Some(NodeEnum::AlterTableStmt(_)) => true,
            Some(NodeEnum::RenameStmt(rename)) => matches!(
                rename.rename_type(),
                ObjectType::ObjectTable | ObjectType::ObjectColumn
            ),
            _ => false,
        }
    }

    fn rename_table(&self, stmt: &str) -> Option<(String, String)> {
        let Some(NodeEnum::RenameStmt(rename)) = first_node(stmt) else {
            return None;
        };
        if rename.rename_type() != ObjectType::ObjectTable {
            return None;
        }
        let relation = rename.relation.as_ref()?;
        Some((relation.relname.clone(), rename.newname.clone()))
    }

    fn rename_column(&self, stmt: &str) -> Option<(String, String, String)> {
        let Some(NodeEnum::RenameStmt(rename)) = first_node(stmt) else {
            return None;
        };
        if rename.rename_type() != ObjectType::ObjectColumn {
            return None;
        }
        let relation = rename.relation.as_ref()?;
        Some((
            relation.relname.clone(),
            rename.subname.clone(),
            rename.newname.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_column_rename() {
        let parser = PostgresStatementParser;
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
        let parser = PostgresStatementParser;
        let recovered = parser.rename_table("ALTER TABLE old RENAME TO new_name").unwrap();
        assert_eq!(recovered, ("old".to_string(), "new_name".to_string()));
    }

    #[test]
    fn other_statements_are_not_alter_table() {
        let parser = PostgresStatementParser;
        assert!(parser.is_alter_table("ALTER TABLE t ADD COLUMN c int"));
        assert!(!parser.is_alter_table("CREATE TABLE t (c int)"));
        assert!(parser.rename_table("CREATE TABLE t (c int)").is_none());
    }
}
