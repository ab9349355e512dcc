use std::{collections::BTreeMap, sync::Arc};

use crate::{
    Result,
    diff::EquivalencePolicy,
    driver::StatementParser,
    error::{Error, FilePos, LoadError},
    plan::PlanFormatter,
    schema::ColumnType,
    value::{TypeCall, Value},
};

/// Driver names the engine knows about. Only a subset resolves to a bundle;
/// the rest fail with [`Error::NotRegistered`].
pub const KNOWN_DRIVERS: &[&str] = &["mysql", "mariadb", "postgres", "sqlite", "mssql", "spanner"];

/// Maps a generic type constructor (e.g. `varchar(255)`) to a resolved
/// dialect type, or fails with `UnsupportedType`.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, call: &TypeCall, pos: Option<FilePos>) -> Result<ColumnType>;
}

/// The reverse mapping: renders a resolved type in dialect SQL.
pub trait TypeFormatter: Send + Sync {
    fn format(&self, ty: &ColumnType) -> Result<String>;
}

/// Per-dialect attribute aliases and default values applied during decode.
/// Alias keys rewrite to canonical attribute keys; defaults fill attributes
/// a block of the given kind leaves unset.
#[derive(Debug, Clone, Default)]
pub struct OverrideMap {
    pub aliases: BTreeMap<String, String>,
    pub defaults: BTreeMap<String, BTreeMap<String, Value>>,
}

impl OverrideMap {
    pub fn canonical<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn default_for(&mut self, block_kind: &str, key: &str, value: Value) {
        self.defaults
            .entry(block_kind.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn defaults_for(&self, block_kind: &str) -> impl Iterator<Item = (&String, &Value)> {
        self.defaults
            .get(block_kind)
            .into_iter()
            .flat_map(|defaults| defaults.iter())
    }
}

/// How drops must be staged for this dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPolicy {
    #[default]
    Plain,
    /// Foreign-key enforcement is switched off around table rebuilds
    /// (SQLite).
    DisableForeignKeys,
}

/// Everything the engine needs to speak one dialect.
#[derive(Clone)]
pub struct Dialect {
    pub name: &'static str,
    pub types: Arc<dyn TypeResolver>,
    pub formatter: Arc<dyn TypeFormatter>,
    pub plan: Arc<dyn PlanFormatter>,
    pub stmt_parser: Arc<dyn StatementParser>,
    pub policy: Arc<dyn EquivalencePolicy>,
    pub overrides: OverrideMap,
    pub drop_policy: DropPolicy,
}

impl std::fmt::Debug for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialect").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Dialect {
    pub fn unsupported_type(&self, call: &TypeCall, pos: Option<FilePos>) -> Error {
        LoadError::UnsupportedType {
            type_repr: call.to_string(),
            dialect: self.name.to_string(),
            pos,
        }
        .into()
    }
}

/// Registry of dialect bundles keyed by driver name.
#[derive(Clone, Default)]
pub struct Registry {
    dialects: BTreeMap<&'static str, Arc<Dialect>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, dialect: Dialect) {
        self.dialects.insert(dialect.name, Arc::new(dialect));
    }

    pub fn get(&self, driver: &str) -> Result<Arc<Dialect>> {
        self.dialects
            .get(driver)
            .cloned()
            .ok_or_else(|| Error::NotRegistered(driver.to_string()))
    }

    pub fn registered(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.dialects.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_driver_is_not_registered() {
        let registry = Registry::new();
        let err = registry.get("spanner").unwrap_err();
        assert!(matches!(err, Error::NotRegistered(driver) if driver == "spanner"));
    }

    #[test]
    fn override_map_canonicalises_aliases() {
        let mut overrides = OverrideMap::default();
        overrides
            .aliases
            .insert("collation".to_string(), "collate".to_string());
        assert_eq!(overrides.canonical("collation"), "collate");
        assert_eq!(overrides.canonical("comment"), "comment");
    }
}
