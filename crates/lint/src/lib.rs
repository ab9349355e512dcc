//! Change linter pipeline.
//!
//! Analyzers run over a [`Pass`] — a migration file plus the change stream
//! grouped by statement — and report [`Diagnostic`]s. The pipeline is
//! additive: every analyzer runs to completion and the collected [`Report`]
//! is emitted before a fatal result (an analyzer configured with
//! `error = true` that raised diagnostics) is returned.

mod concurrent_index;
mod condrop;
mod datadepend;
mod destructive;
mod incompatible;
mod naming;
mod span;

pub use concurrent_index::ConcurrentIndex;
pub use condrop::ConstraintDrop;
pub use datadepend::DataDepend;
pub use destructive::Destructive;
pub use incompatible::BackwardIncompatible;
pub use naming::Naming;
pub use span::Span;

use drift_core::{Change, LintFatal, PlanFormatter, Pos, Resource};
use serde::Serialize;

/// Prefix of structured comments controlling execution, e.g.
/// `-- drift:txmode none`.
pub const DIRECTIVE_PREFIX: &str = "drift:";

/// A single statement of a migration file with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub text: String,
    pub pos: Pos,
}

/// A migration file under lint: statements plus the directives found in its
/// leading comments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFile {
    pub name: String,
    pub statements: Vec<Stmt>,
    pub directives: Vec<String>,
}

impl SourceFile {
    /// Splits SQL text into statements (on `;` outside quotes) and collects
    /// `-- drift:` directives from the leading comment block.
    pub fn parse(name: impl Into<String>, sql: &str) -> Self {
        let mut directives = Vec::new();
        for line in sql.lines() {
            let trimmed = line.trim();
            if let Some(comment) = trimmed.strip_prefix("--") {
                let comment = comment.trim();
                if let Some(directive) = comment.strip_prefix(DIRECTIVE_PREFIX) {
                    directives.push(directive.trim().to_string());
                }
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }
            break;
        }

        let mut statements = Vec::new();
        let mut current = String::new();
        let mut start_line = 1usize;
        let mut line = 1usize;
        let mut in_string = false;
        for ch in sql.chars() {
            if ch == '\n' {
                line += 1;
            }
            if ch == '\'' {
                in_string = !in_string;
            }
            if ch == ';' && !in_string {
                let text = strip_comment_lines(&current);
                if !text.is_empty() {
                    statements.push(Stmt {
                        text,
                        pos: Pos {
                            line: start_line,
                            column: 1,
                        },
                    });
                }
                current.clear();
                start_line = line;
                continue;
            }
            if current.is_empty() && !ch.is_whitespace() {
                start_line = line;
            }
            current.push(ch);
        }
        let text = strip_comment_lines(&current);
        if !text.is_empty() {
            statements.push(Stmt {
                text,
                pos: Pos {
                    line: start_line,
                    column: 1,
                },
            });
        }

        Self {
            name: name.into(),
            statements,
            directives,
        }
    }

    pub fn has_directive(&self, directive: &str) -> bool {
        self.directives
            .iter()
            .any(|candidate| candidate == directive)
    }
}

fn strip_comment_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// The changes realised by one statement of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct StmtChanges {
    pub stmt: usize,
    pub changes: Vec<Change>,
}

/// Row-count probe backed by a dev-database connection. `None` means the
/// probe cannot answer and analyzers stay conservative.
pub trait RowProbe {
    fn table_empty(&self, schema: &str, table: &str) -> Option<bool>;
}

/// One linter run over one file.
pub struct Pass<'a> {
    pub file: &'a SourceFile,
    pub changes: &'a [StmtChanges],
    pub probe: Option<&'a dyn RowProbe>,
    span: Span,
}

impl<'a> Pass<'a> {
    pub fn new(
        file: &'a SourceFile,
        changes: &'a [StmtChanges],
        probe: Option<&'a dyn RowProbe>,
    ) -> Self {
        let span = Span::from_changes(changes);
        Self {
            file,
            changes,
            probe,
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Position of the statement a change group belongs to.
    pub fn stmt_pos(&self, group: &StmtChanges) -> Pos {
        self.file
            .statements
            .get(group.stmt)
            .map(|stmt| stmt.pos)
            .unwrap_or_default()
    }

    pub fn stmt_text(&self, group: &StmtChanges) -> &str {
        self.file
            .statements
            .get(group.stmt)
            .map(|stmt| stmt.text.as_str())
            .unwrap_or_default()
    }
}

/// A linter finding: stable code, source position, human-readable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    #[serde(serialize_with = "serialize_pos")]
    pub pos: Pos,
    pub text: String,
}

fn serialize_pos<S: serde::Serializer>(pos: &Pos, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&pos.to_string())
}

/// All diagnostics of one file, in analyzer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Report {
    pub file: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostic(&mut self, code: &str, pos: Pos, text: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            code: code.to_string(),
            pos,
            text: text.into(),
        });
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// A pluggable analysis over the planned change stream.
pub trait Analyzer {
    fn name(&self) -> &'static str;

    /// Whether diagnostics from this analyzer fail the pipeline.
    fn fatal(&self) -> bool;

    fn analyze(&self, pass: &Pass<'_>, report: &mut Report);
}

/// Per-analyzer options decoded from the declarative configuration block.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    pub error: bool,
    pub resource: Option<Resource>,
}

impl AnalyzerOptions {
    /// Options for the block named after the analyzer, absent blocks decode
    /// to defaults.
    pub fn from_config(config: Option<&Resource>, analyzer: &str) -> Self {
        let Some(block) = config.and_then(|config| {
            config
                .children
                .iter()
                .find(|child| child.kind == analyzer)
        }) else {
            return Self::default();
        };
        let error = block
            .attr("error")
            .and_then(|attr| attr.value.as_bool().ok())
            .unwrap_or(false);
        Self {
            error,
            resource: Some(block.clone()),
        }
    }

    pub fn string_option(&self, key: &str) -> Option<String> {
        self.resource
            .as_ref()?
            .attr(key)?
            .value
            .as_str()
            .ok()
            .map(str::to_string)
    }

    pub fn bool_option(&self, key: &str) -> Option<bool> {
        self.resource.as_ref()?.attr(key)?.value.as_bool().ok()
    }
}

/// The ordered analyzer set of one run.
pub struct Pipeline {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Pipeline {
    pub fn new(analyzers: Vec<Box<dyn Analyzer>>) -> Self {
        Self { analyzers }
    }

    /// The default analyzer set for a driver, configured from the
    /// declarative lint configuration (a `document` resource with one block
    /// per analyzer name).
    pub fn for_driver(driver: &str, config: Option<&Resource>) -> Self {
        let mut analyzers: Vec<Box<dyn Analyzer>> = vec![
            Box::new(Destructive::new(AnalyzerOptions::from_config(
                config,
                "destructive",
            ))),
            Box::new(ConstraintDrop::new(AnalyzerOptions::from_config(
                config,
                "constraint_drop",
            ))),
            Box::new(DataDepend::new(AnalyzerOptions::from_config(
                config,
                "data_depend",
            ))),
            Box::new(BackwardIncompatible::new(AnalyzerOptions::from_config(
                config,
                "incompatible",
            ))),
            Box::new(Naming::new(AnalyzerOptions::from_config(config, "naming"))),
        ];
        if driver == "postgres" {
            analyzers.push(Box::new(ConcurrentIndex::new(
                AnalyzerOptions::from_config(config, "concurrent_index"),
            )));
        }
        Self::new(analyzers)
    }

    /// Runs every analyzer, emitting one report for the pass. The report is
    /// always complete; the fatal result is returned alongside it.
    pub fn run(&self, pass: &Pass<'_>) -> (Report, Option<LintFatal>) {
        let mut report = Report::new(pass.file.name.clone());
        let mut fatal_diagnostics = 0usize;

        for analyzer in &self.analyzers {
            let before = report.diagnostics.len();
            analyzer.analyze(pass, &mut report);
            if analyzer.fatal() {
                fatal_diagnostics += report.diagnostics.len() - before;
            }
        }

        let fatal = (fatal_diagnostics > 0).then_some(LintFatal {
            diagnostics: fatal_diagnostics,
        });
        (report, fatal)
    }
}

/// Plans each change through the dialect formatter and assembles the
/// resulting SQL into a lintable file plus the change stream grouped by
/// statement. This is how a freshly planned migration is linted before it
/// is written or applied.
pub fn pass_parts_for_changes(
    formatter: &dyn PlanFormatter,
    file_name: &str,
    changes: &[Change],
) -> drift_core::Result<(SourceFile, Vec<StmtChanges>)> {
    let mut sql = String::new();
    let mut groups = Vec::new();
    let mut statement_index = 0usize;

    for change in changes {
        let plan = formatter.plan_changes(file_name, std::slice::from_ref(change))?;
        if plan.statements.is_empty() {
            continue;
        }
        groups.push(StmtChanges {
            stmt: statement_index,
            changes: vec![change.clone()],
        });
        for statement in &plan.statements {
            sql.push_str("-- ");
            sql.push_str(&statement.comment);
            sql.push('\n');
            sql.push_str(&statement.cmd);
            sql.push_str(";\n");
            statement_index += 1;
        }
    }

    Ok((SourceFile::parse(file_name, &sql), groups))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_collects_directives_and_statements() {
        let file = SourceFile::parse(
            "0001_init.sql",
            "-- drift:txmode none\n-- a comment\nCREATE TABLE t (id int);\nDROP TABLE old;\n",
        );
        assert_eq!(file.directives, vec!["txmode none".to_string()]);
        assert_eq!(file.statements.len(), 2);
        assert!(file.has_directive("txmode none"));
        assert_eq!(file.statements[0].text, "CREATE TABLE t (id int)");
    }

    #[test]
    fn semicolons_inside_strings_do_not_split() {
        let file = SourceFile::parse("f.sql", "INSERT INTO t VALUES ('a;b');");
        assert_eq!(file.statements.len(), 1);
    }

    #[test]
    fn analyzer_options_decode_error_flag() {
        let mut config = Resource::new("lint");
        let mut block = Resource::new("destructive");
        block.set_attr(drift_core::Attribute::new(
            "error",
            drift_core::Value::bool(true),
        ));
        config.children.push(block);

        let options = AnalyzerOptions::from_config(Some(&config), "destructive");
        assert!(options.error);
        let missing = AnalyzerOptions::from_config(Some(&config), "naming");
        assert!(!missing.error);
    }
}
