use std::sync::Arc;

use crate::{Result, change::Change, schema::Realm};

/// One SQL command of a plan: the forward statement, a human-readable
/// comment, and a best-effort reverse statement for rollbacks. Operations
/// without a safe reverse (e.g. dropping a column that carries data) leave
/// `reverse` empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStatement {
    pub cmd: String,
    pub comment: String,
    pub reverse: Option<String>,
    pub transactional: bool,
}

impl PlanStatement {
    pub fn new(cmd: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            comment: comment.into(),
            reverse: None,
            transactional: true,
        }
    }

    #[must_use]
    pub fn with_reverse(mut self, reverse: impl Into<String>) -> Self {
        self.reverse = Some(reverse.into());
        self
    }

    #[must_use]
    pub fn non_transactional(mut self) -> Self {
        self.transactional = false;
        self
    }
}

/// An ordered sequence of SQL commands realising a change stream under one
/// dialect. `reversible` and `transactional` are aggregates over the
/// statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub name: String,
    pub statements: Vec<PlanStatement>,
}

impl Plan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, statement: PlanStatement) {
        self.statements.push(statement);
    }

    /// Every statement carries a reverse, so the plan can be rolled back.
    pub fn reversible(&self) -> bool {
        self.statements
            .iter()
            .all(|statement| statement.reverse.is_some())
    }

    /// Every statement may run inside a DDL transaction.
    pub fn transactional(&self) -> bool {
        self.statements
            .iter()
            .all(|statement| statement.transactional)
    }

    /// Renders the plan as SQL text with one comment line per command.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str("-- ");
            out.push_str(&statement.comment);
            out.push('\n');
            out.push_str(&statement.cmd);
            if !statement.cmd.ends_with(';') {
                out.push(';');
            }
            out.push('\n');
        }
        out
    }
}

/// Dialect-specific translation of an ordered change stream into SQL.
pub trait PlanFormatter: Send + Sync {
    fn dialect(&self) -> &'static str;

    fn plan_changes(&self, name: &str, changes: &[Change]) -> Result<Plan>;

    /// Formatters that need desired-state snapshots beyond what the change
    /// stream carries (SQLite table rebuilds) return a bound copy here.
    fn bind_desired(&self, _realm: &Realm) -> Option<Arc<dyn PlanFormatter>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_aggregates_follow_statements() {
        let mut plan = Plan::new("add_users");
        plan.push(
            PlanStatement::new("CREATE TABLE \"users\" (\"id\" int NOT NULL)", "Create table")
                .with_reverse("DROP TABLE \"users\""),
        );
        assert!(plan.reversible());
        assert!(plan.transactional());

        plan.push(
            PlanStatement::new("CREATE INDEX CONCURRENTLY \"i\" ON \"users\" (\"id\")", "Add index")
                .non_transactional(),
        );
        assert!(!plan.reversible());
        assert!(!plan.transactional());
    }

    #[test]
    fn render_pairs_comment_and_command() {
        let mut plan = Plan::new("p");
        plan.push(PlanStatement::new("DROP TABLE \"t\"", "Drop \"t\" table"));
        assert_eq!(plan.render(), "-- Drop \"t\" table\nDROP TABLE \"t\";\n");
    }
}
