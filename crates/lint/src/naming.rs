//! NM1xx — naming policy.
//!
//! Matches created object names against a configured pattern. A global
//! `pattern` applies to everything; `table`, `column`, and `index` blocks
//! override it per resource kind, optionally with a custom message.

use drift_core::{Change, Pos, Resource};
use regex::Regex;

use crate::{Analyzer, AnalyzerOptions, Pass, Report};

struct Policy {
    pattern: Regex,
    message: Option<String>,
}

impl Policy {
    fn from_resource(resource: &Resource) -> Option<Self> {
        let pattern = resource.attr("pattern")?.value.as_str().ok()?;
        let pattern = Regex::new(pattern).ok()?;
        let message = resource
            .attr("message")
            .and_then(|attr| attr.value.as_str().ok())
            .map(str::to_string);
        Some(Self { pattern, message })
    }
}

pub struct Naming {
    options: AnalyzerOptions,
    global: Option<Policy>,
    table: Option<Policy>,
    column: Option<Policy>,
    index: Option<Policy>,
}

impl Naming {
    pub fn new(options: AnalyzerOptions) -> Self {
        let policy_for = |kind: &str| -> Option<Policy> {
            let resource = options.resource.as_ref()?;
            let block = resource.children.iter().find(|child| child.kind == kind)?;
            Policy::from_resource(block)
        };
        let global = options
            .resource
            .as_ref()
            .and_then(Policy::from_resource);
        Self {
            global,
            table: policy_for("table"),
            column: policy_for("column"),
            index: policy_for("index"),
            options,
        }
    }

    fn check(
        &self,
        report: &mut Report,
        pos: Pos,
        kind: &str,
        policy: Option<&Policy>,
        name: &str,
    ) {
        let Some(policy) = policy.or(self.global.as_ref()) else {
            return;
        };
        if policy.pattern.is_match(name) {
            return;
        }
        let text = match &policy.message {
            Some(message) => format!("{kind} named {name:?} violates the naming policy: {message}"),
            None => format!("{kind} named {name:?} violates the naming policy"),
        };
        report.diagnostic("NM101", pos, text);
    }
}

impl Analyzer for Naming {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn fatal(&self) -> bool {
        self.options.error
    }

    fn analyze(&self, pass: &Pass<'_>, report: &mut Report) {
        for group in pass.changes {
            let pos = pass.stmt_pos(group);
            for change in &group.changes {
                match change {
                    Change::AddTable { table } => {
                        self.check(report, pos, "Table", self.table.as_ref(), &table.name);
                    }
                    Change::AddColumn { column, .. } => {
                        self.check(report, pos, "Column", self.column.as_ref(), &column.name);
                    }
                    Change::AddIndex { index, .. } => {
                        self.check(report, pos, "Index", self.index.as_ref(), &index.name);
                    }
                    Change::AddSchema { schema } => {
                        self.check(report, pos, "Schema", None, &schema.name);
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
    use drift_core::{Attribute, Table, Value};

    fn options_with_pattern(pattern: &str) -> AnalyzerOptions {
        let mut block = Resource::new("naming");
        block.set_attr(Attribute::new("pattern", Value::string(pattern)));
        AnalyzerOptions {
            error: false,
            resource: Some(block),
        }
    }

    fn add_table_groups(name: &str) -> (SourceFile, Vec<StmtChanges>) {
        let file = SourceFile::parse("m.sql", &format!("CREATE TABLE {name} (id int);"));
        let mut table = Table::new(name);
        table.schema = "public".to_string();
        (
            file,
            vec![StmtChanges {
                stmt: 0,
                changes: vec![Change::AddTable { table }],
            }],
        )
    }

    #[test]
    fn violation_reports_nm101() {
        let (file, groups) = add_table_groups("UserAccounts");
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        Naming::new(options_with_pattern("^[a-z_]+$")).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, "NM101");
        assert_eq!(
            report.diagnostics[0].text,
            "Table named \"UserAccounts\" violates the naming policy"
        );
    }

    #[test]
    fn matching_names_pass() {
        let (file, groups) = add_table_groups("user_accounts");
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        Naming::new(options_with_pattern("^[a-z_]+$")).analyze(&pass, &mut report);

        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn per_resource_policy_overrides_global() {
        let mut block = Resource::new("naming");
        block.set_attr(Attribute::new("pattern", Value::string("^[a-z_]+$")));
        let mut table_block = Resource::new("table");
        table_block.set_attr(Attribute::new("pattern", Value::string("^tbl_")));
        table_block.set_attr(Attribute::new(
            "message",
            Value::string("tables start with tbl_"),
        ));
        block.children.push(table_block);
        let options = AnalyzerOptions {
            error: false,
            resource: Some(block),
        };

        let (file, groups) = add_table_groups("users");
        let pass = Pass::new(&file, &groups, None);
        let mut report = Report::new("m.sql");
        Naming::new(options).analyze(&pass, &mut report);

        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].text.contains("tables start with tbl_"));
    }
}
