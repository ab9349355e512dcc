use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    Result,
    change::Change,
    error::ExecError,
    plan::Plan,
    schema::{Realm, Schema},
};

/// Cooperative cancellation shared across driver calls. The core never
/// blocks on it; adapters poll between statements and abort without partial
/// mutation of the input snapshots.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ExecError::Cancelled.into());
        }
        Ok(())
    }
}

/// Introspection scope: which schemas to read and which objects to prune
/// (exclusion patterns, applied after reading).
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    pub schemas: Vec<String>,
    pub exclude: Vec<String>,
}

/// Reads the current state of a target database into the schema model.
/// Collections come back in deterministic (alphabetical) order.
pub trait Inspector {
    fn inspect_realm(&mut self, ctx: &Cancellation, opts: &InspectOptions) -> Result<Realm>;

    fn inspect_schema(
        &mut self,
        ctx: &Cancellation,
        name: &str,
        opts: &InspectOptions,
    ) -> Result<Schema>;

    /// Canonicalises a realm into the form the server would store it in,
    /// via a scoped dev database. The default keeps the realm untouched.
    fn normalize_realm(&mut self, _ctx: &Cancellation, realm: Realm) -> Result<Realm> {
        Ok(realm)
    }

    /// Verifies the target contains no schema objects yet.
    fn check_clean(&mut self, _ctx: &Cancellation) -> Result<()> {
        Ok(())
    }

    /// Row-count probe used by the linter to qualify data-dependent
    /// warnings. `false` is the conservative default.
    fn table_empty(&mut self, _ctx: &Cancellation, _schema: &str, _table: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Executes plans against a target database. Statements run inside one
/// transaction when the dialect supports transactional DDL; otherwise they
/// run sequentially and a failure aborts the remainder, leaving
/// already-applied statements in place.
pub trait Applier {
    fn apply_changes(&mut self, ctx: &Cancellation, changes: &[Change]) -> Result<()>;

    fn execute_plan(&mut self, ctx: &Cancellation, plan: &Plan) -> Result<()>;
}

/// Recovers rename semantics from raw statement text. ALTER statements are
/// the only ones the diff engine cannot reconstruct structurally.
pub trait StatementParser: Send + Sync {
    fn is_alter_table(&self, stmt: &str) -> bool;

    /// `(from, to)` when the statement renames a table.
    fn rename_table(&self, stmt: &str) -> Option<(String, String)>;

    /// `(table, from, to)` when the statement renames a column.
    fn rename_column(&self, stmt: &str) -> Option<(String, String, String)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_propagates_as_error() {
        let ctx = Cancellation::new();
        assert!(ctx.check().is_ok());
        ctx.cancel();
        assert!(matches!(
            ctx.check(),
            Err(crate::Error::Exec(ExecError::Cancelled))
        ));
    }
}
