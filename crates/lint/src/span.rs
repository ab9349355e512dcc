use std::collections::BTreeSet;

use drift_core::{Change, TableRef};

use crate::StmtChanges;

/// Answers "was this entity created inside this file?". Analyzers use it to
/// skip data-dependent warnings on brand-new objects: adding a unique index
/// to a table created two statements earlier cannot hit existing rows.
#[derive(Debug, Clone, Default)]
pub struct Span {
    added_schemas: BTreeSet<String>,
    added_tables: BTreeSet<(String, String)>,
    added_columns: BTreeSet<(String, String, String)>,
}

impl Span {
    pub fn from_changes(groups: &[StmtChanges]) -> Self {
        let mut span = Self::default();
        for group in groups {
            for change in &group.changes {
                match change {
                    Change::AddSchema { schema } => {
                        span.added_schemas.insert(schema.name.clone());
                    }
                    Change::AddTable { table } => {
                        span.added_tables
                            .insert((table.schema.clone(), table.name.clone()));
                        for column in &table.columns {
                            span.added_columns.insert((
                                table.schema.clone(),
                                table.name.clone(),
                                column.name.clone(),
                            ));
                        }
                    }
                    Change::AddColumn { table, column } => {
                        span.added_columns.insert((
                            table.schema.clone(),
                            table.name.clone(),
                            column.name.clone(),
                        ));
                    }
                    _ => {}
                }
            }
        }
        span
    }

    pub fn schema_added(&self, name: &str) -> bool {
        self.added_schemas.contains(name)
    }

    pub fn table_added(&self, table: &TableRef) -> bool {
        self.added_tables
            .contains(&(table.schema.clone(), table.name.clone()))
    }

    pub fn column_added(&self, table: &TableRef, column: &str) -> bool {
        self.added_columns.contains(&(
            table.schema.clone(),
            table.name.clone(),
            column.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::{Column, ColumnType, IntSize, Table, TypeKind};

    fn int_column(name: &str) -> Column {
        Column::new(
            name,
            ColumnType::new(
                TypeKind::Integer {
                    size: IntSize::Standard,
                    unsigned: false,
                },
                "int",
            ),
        )
    }

    #[test]
    fn add_table_marks_table_and_columns() {
        let mut table = Table::new("users");
        table.schema = "public".to_string();
        table.add_column(int_column("id"));

        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::AddTable { table }],
        }];
        let span = Span::from_changes(&groups);

        let table_ref = TableRef::new("public", "users");
        assert!(span.table_added(&table_ref));
        assert!(span.column_added(&table_ref, "id"));
        assert!(!span.column_added(&table_ref, "email"));
    }
}
