use std::sync::Arc;

use drift_core::{Dialect, DropPolicy, OverrideMap};

mod adapter;
mod parse;
mod plan;
mod types;

pub use adapter::{MysqlDriver, connect};
pub use parse::MysqlStatementParser;
pub use plan::MysqlPlan;
pub use types::{Flavor, MysqlEquivalence, MysqlTypes};

/// The MySQL dialect bundle for the registry.
pub fn dialect() -> Dialect {
    bundle(Flavor::Mysql)
}

/// MariaDB shares the MySQL code paths behind a flavor flag.
pub fn mariadb_dialect() -> Dialect {
    bundle(Flavor::Mariadb)
}

fn bundle(flavor: Flavor) -> Dialect {
    let mut overrides = OverrideMap::default();
    overrides
        .aliases
        .insert("collation".to_string(), "collate".to_string());
    overrides
        .aliases
        .insert("character_set".to_string(), "charset".to_string());

    Dialect {
        name: flavor.dialect_name(),
        types: Arc::new(MysqlTypes { flavor }),
        formatter: Arc::new(MysqlTypes { flavor }),
        plan: Arc::new(MysqlPlan { flavor }),
        stmt_parser: Arc::new(MysqlStatementParser),
        policy: Arc::new(MysqlEquivalence { flavor }),
        overrides,
        drop_policy: DropPolicy::Plain,
    }
}
