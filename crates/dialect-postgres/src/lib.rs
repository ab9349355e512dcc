use std::sync::Arc;

use drift_core::{Dialect, DropPolicy, OverrideMap};

mod adapter;
mod inspect_queries;
mod parse;
mod plan;
mod types;

pub use adapter::{PostgresDriver, connect};
pub use parse::PostgresStatementParser;
pub use plan::PostgresPlan;
pub use types::{PostgresEquivalence, PostgresTypes};

pub const DIALECT_NAME: &str = "postgres";

/// The PostgreSQL dialect bundle for the registry.
pub fn dialect() -> Dialect {
    let mut overrides = OverrideMap::default();
    overrides
        .aliases
        .insert("collation".to_string(), "collate".to_string());

    Dialect {
        name: DIALECT_NAME,
        types: Arc::new(PostgresTypes),
        formatter: Arc::new(PostgresTypes),
        plan: Arc::new(PostgresPlan),
        stmt_parser: Arc::new(PostgresStatementParser),
        policy: Arc::new(PostgresEquivalence),
        overrides,
        drop_policy: DropPolicy::Plain,
    }
}
