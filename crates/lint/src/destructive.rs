//! DS1xx — destructive changes.
//!
//! Flags schema, table, and column drops. When a dev-database probe is
//! available and confirms the dropped table holds no rows, the finding is
//! annotated so reviewers can approve it quickly.

use drift_core::Change;

use crate::{Analyzer, AnalyzerOptions, Pass, Report};

pub struct Destructive {
    options: AnalyzerOptions,
}

impl Destructive {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }
}

impl Analyzer for Destructive {
    fn name(&self) -> &'static str {
        "destructive"
    }

    fn fatal(&self) -> bool {
        self.options.error
    }

    fn analyze(&self, pass: &Pass<'_>, report: &mut Report) {
        for group in pass.changes {
            let pos = pass.stmt_pos(group);
            for change in &group.changes {
                match change {
                    Change::DropSchema { schema } => {
                        report.diagnostic(
                            "DS101",
                            pos,
                            format!("Dropping schema {:?}", schema.name),
                        );
                    }
                    Change::DropTable { table } => {
                        let mut text = format!("Dropping table {:?}", table.name);
                        if let Some(empty) = pass
                            .probe
                            .and_then(|probe| probe.table_empty(&table.schema, &table.name))
                            && empty
                        {
                            text.push_str(&format!(" (table {:?} holds no rows)", table.name));
                        }
                        report.diagnostic("DS102", pos, text);
                    }
                    Change::DropColumn { table, column } => {
                        report.diagnostic(
                            "DS103",
                            pos,
                            format!(
                                "Dropping non-virtual column {:?} from table {:?}",
                                column.name, table.name
                            ),
                        );
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
    use crate::{RowProbe, SourceFile, StmtChanges};
    use drift_core::{Column, ColumnType, IntSize, Table, TableRef, TypeKind};

    struct EmptyProbe;

    impl RowProbe for EmptyProbe {
        fn table_empty(&self, _schema: &str, _table: &str) -> Option<bool> {
            Some(true)
        }
    }

    fn drop_table_pass_file() -> (SourceFile, Vec<StmtChanges>) {
        let file = SourceFile::parse("m.sql", "DROP TABLE \"users\";");
        let mut table = Table::new("users");
        table.schema = "public".to_string();
        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::DropTable { table }],
        }];
        (file, groups)
    }

    #[test]
    fn drop_table_reports_ds102() {
        let (file, groups) = drop_table_pass_file();
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        Destructive::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, "DS102");
        assert_eq!(report.diagnostics[0].text, "Dropping table \"users\"");
    }

    #[test]
    fn empty_table_probe_annotates_finding() {
        let (file, groups) = drop_table_pass_file();
        let probe = EmptyProbe;
        let pass = Pass::new(&file, &groups, Some(&probe));
        let mut report = Report::new("m.sql");
        Destructive::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert!(report.diagnostics[0].text.contains("holds no rows"));
    }

    #[test]
    fn drop_column_reports_ds103() {
        let file = SourceFile::parse("m.sql", "ALTER TABLE t DROP COLUMN c;");
        let column = Column::new(
            "c",
            ColumnType::new(
                TypeKind::Integer {
                    size: IntSize::Standard,
                    unsigned: false,
                },
                "int",
            ),
        );
        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::DropColumn {
                table: TableRef::new("public", "t"),
                column,
            }],
        }];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        Destructive::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics[0].code, "DS103");
    }
}
