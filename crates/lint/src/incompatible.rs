//! BC1xx — backward-incompatible changes.
//!
//! Renames break existing readers and writers; type narrowing truncates or
//! rejects data already in place.

use drift_core::{Change, ColumnChange, type_narrows};

use crate::{Analyzer, AnalyzerOptions, Pass, Report};

pub struct BackwardIncompatible {
    options: AnalyzerOptions,
}

impl BackwardIncompatible {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }
}

impl Analyzer for BackwardIncompatible {
    fn name(&self) -> &'static str {
        "incompatible"
    }

    fn fatal(&self) -> bool {
        self.options.error
    }

    fn analyze(&self, pass: &Pass<'_>, report: &mut Report) {
        for group in pass.changes {
            let pos = pass.stmt_pos(group);
            for change in &group.changes {
                match change {
                    Change::RenameTable { from, to } => {
                        report.diagnostic(
                            "BC101",
                            pos,
                            format!(
                                "Renaming table {:?} to {:?} breaks existing clients",
                                from.name, to.name
                            ),
                        );
                    }
                    Change::RenameColumn { table, from, to } => {
                        report.diagnostic(
                            "BC102",
                            pos,
                            format!(
                                "Renaming column {from:?} to {to:?} in table {:?} breaks \
                                 existing clients",
                                table.name
                            ),
                        );
                    }
                    Change::ModifyColumn {
                        table,
                        from,
                        to,
                        change,
                    } => {
                        if change.contains(ColumnChange::TYPE)
                            && type_narrows(&from.ty.kind, &to.ty.kind)
                        {
                            report.diagnostic(
                                "BC103",
                                pos,
                                format!(
                                    "Narrowing column {:?} of table {:?} from {:?} to {:?} \
                                     may truncate data",
                                    to.name, table.name, from.ty.raw, to.ty.raw
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
    use drift_core::{Column, ColumnType, TableRef, TypeKind};

    fn varchar(name: &str, size: u64) -> Column {
        Column::new(
            name,
            ColumnType::new(
                TypeKind::String {
                    size: Some(size),
                    fixed: false,
                },
                format!("varchar({size})"),
            ),
        )
    }

    #[test]
    fn narrowing_varchar_fires_bc103() {
        let file = SourceFile::parse("m.sql", "ALTER TABLE t ALTER COLUMN c TYPE varchar(50);");
        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::ModifyColumn {
                table: TableRef::new("public", "t"),
                from: varchar("c", 100),
                to: varchar("c", 50),
                change: ColumnChange::TYPE,
            }],
        }];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        BackwardIncompatible::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, "BC103");
    }

    #[test]
    fn widening_is_fine() {
        let file = SourceFile::parse("m.sql", "ALTER TABLE t ALTER COLUMN c TYPE varchar(200);");
        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::ModifyColumn {
                table: TableRef::new("public", "t"),
                from: varchar("c", 100),
                to: varchar("c", 200),
                change: ColumnChange::TYPE,
            }],
        }];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        BackwardIncompatible::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn renames_fire_bc101_and_bc102() {
        let file = SourceFile::parse(
            "m.sql",
            "ALTER TABLE t RENAME TO t2;\nALTER TABLE t2 RENAME COLUMN a TO b;",
        );
        let groups = vec![
            StmtChanges {
                stmt: 0,
                changes: vec![Change::RenameTable {
                    from: TableRef::new("public", "t"),
                    to: TableRef::new("public", "t2"),
                }],
            },
            StmtChanges {
                stmt: 1,
                changes: vec![Change::RenameColumn {
                    table: TableRef::new("public", "t2"),
                    from: "a".to_string(),
                    to: "b".to_string(),
                }],
            },
        ];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        BackwardIncompatible::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        let codes = report
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.code.as_str())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["BC101", "BC102"]);
    }
}
