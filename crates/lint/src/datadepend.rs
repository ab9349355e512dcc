//! DD1xx — changes whose success depends on the data already in the table.
//!
//! A unique index over pre-existing columns can collide with duplicates; a
//! non-nullable column without a default cannot be added to a table that
//! already has rows. Objects created inside the same file are exempt (span
//! test).

use drift_core::{Change, IndexChange};

use crate::{Analyzer, AnalyzerOptions, Pass, Report};

pub struct DataDepend {
    options: AnalyzerOptions,
}

impl DataDepend {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }
}

impl Analyzer for DataDepend {
    fn name(&self) -> &'static str {
        "data_depend"
    }

    fn fatal(&self) -> bool {
        self.options.error
    }

    fn analyze(&self, pass: &Pass<'_>, report: &mut Report) {
        let span = pass.span();
        for group in pass.changes {
            let pos = pass.stmt_pos(group);
            for change in &group.changes {
                match change {
                    Change::AddIndex { table, index } if index.unique => {
                        let pre_existing = index
                            .column_names()
                            .iter()
                            .filter(|column| !span.column_added(table, column))
                            .map(|column| format!("{column:?}"))
                            .collect::<Vec<_>>();
                        if !pre_existing.is_empty() {
                            report.diagnostic(
                                "DD101",
                                pos,
                                format!(
                                    "Adding a unique index {:?} on column{} {} might fail in case \
                                     of duplicate entries",
                                    index.name,
                                    if pre_existing.len() == 1 { "" } else { "s" },
                                    pre_existing.join(", ")
                                ),
                            );
                        }
                    }
                    Change::ModifyIndex { table, to, change, .. } => {
                        if change.contains(IndexChange::UNIQUE)
                            && to.unique
                            && !span.table_added(table)
                        {
                            report.diagnostic(
                                "DD102",
                                pos,
                                format!(
                                    "Modifying index {:?} to unique might fail in case of \
                                     duplicate entries",
                                    to.name
                                ),
                            );
                        }
                    }
                    Change::AddColumn { table, column } => {
                        if !column.null
                            && column.default.is_none()
                            && column.generated.is_none()
                            && !span.table_added(table)
                        {
                            report.diagnostic(
                                "DD103",
                                pos,
                                format!(
                                    "Adding a non-nullable {:?} column {:?} will fail in case \
                                     table {:?} is not empty",
                                    column.ty.raw, column.name, table.name
                                ),
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SourceFile, StmtChanges};
    use drift_core::{Column, ColumnType, Index, IntSize, Table, TableRef, TypeKind};

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
    fn unique_index_on_existing_column_warns() {
        let file = SourceFile::parse("m.sql", "CREATE UNIQUE INDEX i ON users (email);");
        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::AddIndex {
                table: TableRef::new("public", "users"),
                index: Index::on_columns("i", ["email"]).unique(),
            }],
        }];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        DataDepend::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, "DD101");
        assert!(
            report.diagnostics[0]
                .text
                .contains("might fail in case of duplicate entries")
        );
    }

    #[test]
    fn unique_index_on_column_added_in_file_is_exempt() {
        let file = SourceFile::parse(
            "m.sql",
            "ALTER TABLE users ADD COLUMN email varchar(255);\nCREATE UNIQUE INDEX i ON users (email);",
        );
        let table = TableRef::new("public", "users");
        let email = Column::new(
            "email",
            ColumnType::new(
                TypeKind::String {
                    size: Some(255),
                    fixed: false,
                },
                "varchar(255)",
            ),
        )
        .nullable(true);
        let groups = vec![
            StmtChanges {
                stmt: 0,
                changes: vec![Change::AddColumn {
                    table: table.clone(),
                    column: email,
                }],
            },
            StmtChanges {
                stmt: 1,
                changes: vec![Change::AddIndex {
                    table,
                    index: Index::on_columns("i", ["email"]).unique(),
                }],
            },
        ];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        DataDepend::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn not_null_column_without_default_warns_with_type_and_table() {
        let file = SourceFile::parse("m.sql", "ALTER TABLE users ADD COLUMN b int NOT NULL;");
        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::AddColumn {
                table: TableRef::new("public", "users"),
                column: int_column("b"),
            }],
        }];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        DataDepend::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics[0].code, "DD103");
        assert_eq!(
            report.diagnostics[0].text,
            "Adding a non-nullable \"int\" column \"b\" will fail in case table \"users\" is not empty"
        );
    }

    #[test]
    fn new_table_columns_are_exempt() {
        let file = SourceFile::parse("m.sql", "CREATE TABLE t (b int NOT NULL);");
        let mut table = Table::new("t");
        table.schema = "public".to_string();
        table.add_column(int_column("b"));
        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![
                Change::AddTable { table },
                Change::AddColumn {
                    table: TableRef::new("public", "t"),
                    column: int_column("b"),
                },
            ],
        }];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        DataDepend::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert!(report.diagnostics.is_empty());
    }
}
