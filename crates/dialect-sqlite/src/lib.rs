use std::sync::Arc;

use drift_core::{Dialect, DropPolicy, OverrideMap};

mod adapter;
mod parse;
mod plan;
mod types;

pub use adapter::{SqliteDriver, connect};
pub use parse::SqliteStatementParser;
pub use plan::SqlitePlan;
pub use types::{SqliteEquivalence, SqliteTypes};

pub const DIALECT_NAME: &str = "sqlite";

/// The SQLite dialect bundle for the registry. Table rebuilds disable
/// foreign-key enforcement around the shadow-table sequence.
pub fn dialect() -> Dialect {
    Dialect {
        name: DIALECT_NAME,
        types: Arc::new(SqliteTypes),
        formatter: Arc::new(SqliteTypes),
        plan: Arc::new(SqlitePlan::new()),
        stmt_parser: Arc::new(SqliteStatementParser),
        policy: Arc::new(SqliteEquivalence),
        overrides: OverrideMap::default(),
        drop_policy: DropPolicy::DisableForeignKeys,
    }
}
