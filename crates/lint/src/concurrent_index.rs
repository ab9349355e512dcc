//! PG1xx — concurrent index safety (PostgreSQL).
//!
//! `CREATE INDEX CONCURRENTLY` cannot run inside a transaction, so a file
//! using it must carry the `drift:txmode none` directive (PG103). The
//! inverse holds too: building or dropping an index on a pre-existing table
//! without `CONCURRENTLY` blocks writes for the duration (PG101, PG102).

use drift_core::{Attr, Change, get_attr};

use crate::{Analyzer, AnalyzerOptions, Pass, Report};

const TXMODE_NONE: &str = "txmode none";

pub struct ConcurrentIndex {
    options: AnalyzerOptions,
}

impl ConcurrentIndex {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }
}

fn is_concurrent(attrs: &[Attr]) -> bool {
    matches!(get_attr(attrs, "concurrently"), Some(Attr::Concurrently))
}

impl Analyzer for ConcurrentIndex {
    fn name(&self) -> &'static str {
        "concurrent_index"
    }

    fn fatal(&self) -> bool {
        self.options.error
    }

    fn analyze(&self, pass: &Pass<'_>, report: &mut Report) {
        let span = pass.span();
        let has_txmode_none = pass.file.has_directive(TXMODE_NONE);

        for group in pass.changes {
            let pos = pass.stmt_pos(group);
            for change in &group.changes {
                match change {
                    Change::AddIndex { table, index } => {
                        if is_concurrent(&index.attrs) {
                            if !has_txmode_none {
                                report.diagnostic(
                                    "PG103",
                                    pos,
                                    format!(
                                        "Creating index {:?} concurrently requires the file \
                                         directive `drift:txmode none`",
                                        index.name
                                    ),
                                );
                            }
                        } else if !span.table_added(table) {
                            report.diagnostic(
                                "PG101",
                                pos,
                                format!(
                                    "Creating index {:?} non-concurrently on existing table \
                                     {:?} blocks writes; consider CONCURRENTLY",
                                    index.name, table.name
                                ),
                            );
                        }
                    }
                    Change::DropIndex { table, index } => {
                        if is_concurrent(&index.attrs) {
                            if !has_txmode_none {
                                report.diagnostic(
                                    "PG103",
                                    pos,
                                    format!(
                                        "Dropping index {:?} concurrently requires the file \
                                         directive `drift:txmode none`",
                                        index.name
                                    ),
                                );
                            }
                        } else if !span.table_added(table) {
                            report.diagnostic(
                                "PG102",
                                pos,
                                format!(
                                    "Dropping index {:?} non-concurrently on existing table \
                                     {:?} blocks queries; consider CONCURRENTLY",
                                    index.name, table.name
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
    use drift_core::{Index, TableRef};

    fn concurrent_index(name: &str) -> Index {
        let mut index = Index::on_columns(name, ["c"]);
        index.set_attr(Attr::Concurrently);
        index
    }

    fn add_index_groups(index: Index) -> Vec<StmtChanges> {
        vec![StmtChanges {
            stmt: 0,
            changes: vec![Change::AddIndex {
                table: TableRef::new("public", "t"),
                index,
            }],
        }]
    }

    #[test]
    fn concurrent_without_directive_fires_pg103() {
        let file = SourceFile::parse("m.sql", "CREATE INDEX CONCURRENTLY i1 ON t (c);");
        let groups = add_index_groups(concurrent_index("i1"));
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        ConcurrentIndex::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, "PG103");
    }

    #[test]
    fn directive_silences_pg103() {
        let file = SourceFile::parse(
            "m.sql",
            "-- drift:txmode none\nCREATE INDEX CONCURRENTLY i1 ON t (c);",
        );
        let groups = add_index_groups(concurrent_index("i1"));
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        ConcurrentIndex::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn non_concurrent_on_existing_table_fires_pg101() {
        let file = SourceFile::parse("m.sql", "CREATE INDEX i1 ON t (c);");
        let groups = add_index_groups(Index::on_columns("i1", ["c"]));
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        ConcurrentIndex::new(AnalyzerOptions::default()).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics[0].code, "PG101");
    }

    #[test]
    fn pg103_alone_stays_non_fatal_by_default() {
        let file = SourceFile::parse("m.sql", "CREATE INDEX CONCURRENTLY i1 ON t (c);");
        let groups = add_index_groups(concurrent_index("i1"));
        let pass = Pass::new(&file, &groups, None);
        let pipeline = crate::Pipeline::for_driver("postgres", None);
        let (report, fatal) = pipeline.run(&pass);

        assert!(report.diagnostics.iter().any(|d| d.code == "PG103"));
        assert!(fatal.is_none());
    }
}
