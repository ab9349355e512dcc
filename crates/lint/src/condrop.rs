//! CD101 — dropping a foreign-key constraint whose columns survive.
//!
//! When a foreign key goes away together with its local columns (or the
//! whole table), the drop is incidental. When every local column survives,
//! the constraint itself is being removed and referential integrity is
//! silently lost.

use drift_core::Change;

use crate::{Analyzer, AnalyzerOptions, Pass, Report};

pub struct ConstraintDrop {
    options: AnalyzerOptions,
}

impl ConstraintDrop {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }
}

impl Analyzer for ConstraintDrop {
    fn name(&self) -> &'static str {
        "constraint_drop"
    }

    fn fatal(&self) -> bool {
        self.options.error
    }

    fn analyze(&self, pass: &Pass<'_>, report: &mut Report) {
        let mut dropped_columns = Vec::new();
        let mut dropped_tables = Vec::new();
        for group in pass.changes {
            for change in &group.changes {
                match change {
                    Change::DropColumn { table, column } => {
                        dropped_columns.push((
                            table.schema.clone(),
                            table.name.clone(),
                            column.name.clone(),
                        ));
                    }
                    Change::DropTable { table } => {
                        dropped_tables.push((table.schema.clone(), table.name.clone()));
                    }
                    _ => {}
                }
            }
        }

        for group in pass.changes {
            let pos = pass.stmt_pos(group);
            for change in &group.changes {
                let Change::DropForeignKey { table, fk } = change else {
                    continue;
                };
                if dropped_tables.contains(&(table.schema.clone(), table.name.clone())) {
                    continue;
                }
                let any_column_dropped = fk.columns.iter().any(|column| {
                    dropped_columns.contains(&(
                        table.schema.clone(),
                        table.name.clone(),
                        column.clone(),
                    ))
                });
                if !any_column_dropped {
                    report.diagnostic(
                        "CD101",
                        pos,
                        format!("Dropping foreign-key constraint {:?}", fk.symbol),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SourceFile, StmtChanges};
    use drift_core::{Column, ColumnType, ForeignKey, IntSize, TableRef, TypeKind};

    fn fk(symbol: &str, columns: &[&str]) -> ForeignKey {
        let mut fk = ForeignKey::new(symbol, TableRef::new("public", "teams"));
        fk.columns = columns.iter().map(|column| column.to_string()).collect();
        fk.ref_columns = vec!["id".to_string()];
        fk
    }

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
    fn surviving_columns_fire_cd101() {
        let file = SourceFile::parse("m.sql", "ALTER TABLE users DROP CONSTRAINT fk_team;");
        let groups = vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::DropForeignKey {
                table: TableRef::new("public", "users"),
                fk: fk("fk_team", &["team_id"]),
            }],
        }];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        ConstraintDrop::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, "CD101");
        assert_eq!(
            report.diagnostics[0].text,
            "Dropping foreign-key constraint \"fk_team\""
        );
    }

    #[test]
    fn dropping_the_column_too_is_silent() {
        let file = SourceFile::parse(
            "m.sql",
            "ALTER TABLE users DROP CONSTRAINT fk_team;\nALTER TABLE users DROP COLUMN team_id;",
        );
        let table = TableRef::new("public", "users");
        let groups = vec![
            StmtChanges {
                stmt: 0,
                changes: vec![Change::DropForeignKey {
                    table: table.clone(),
                    fk: fk("fk_team", &["team_id"]),
                }],
            },
            StmtChanges {
                stmt: 1,
                changes: vec![Change::DropColumn {
                    table,
                    column: int_column("team_id"),
                }],
            },
        ];
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        ConstraintDrop::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert!(report.diagnostics.is_empty());
    }
}
