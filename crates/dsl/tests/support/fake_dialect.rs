#![allow(dead_code)]

use std::sync::Arc;

use drift_core::{
    ColumnType, DefaultEquivalencePolicy, Dialect, DropPolicy, Error, FilePos, IntSize,
    LoadError, OverrideMap, Plan, PlanFormatter, Result, StatementParser, TimeKind, TypeCall,
    TypeFormatter, TypeKind, TypeResolver, Value,
};

/// A loader-only dialect for exercising the evaluator without pulling a
/// real dialect crate into the tests.
#[derive(Debug, Default, Clone, Copy)]
struct FakeTypes;

fn int_arg(call: &TypeCall, index: usize) -> Option<u32> {
    match call.args.get(index) {
        Some(Value::Literal(drift_core::Literal::Int(value))) => u32::try_from(*value).ok(),
        _ => None,
    }
}

impl TypeResolver for FakeTypes {
    fn resolve(&self, call: &TypeCall, pos: Option<FilePos>) -> Result<ColumnType> {
        let kind = match call.name.as_str() {
            "bool" => TypeKind::Bool,
            "int" => TypeKind::Integer {
                size: IntSize::Standard,
                unsigned: false,
            },
            "bigint" => TypeKind::Integer {
                size: IntSize::Big,
                unsigned: false,
            },
            "varchar" => TypeKind::String {
                size: int_arg(call, 0).map(u64::from),
                fixed: false,
            },
            "text" => TypeKind::String {
                size: None,
                fixed: false,
            },
            "decimal" => TypeKind::Decimal {
                precision: int_arg(call, 0),
                scale: int_arg(call, 1),
                unsigned: false,
            },
            "timestamp" => TypeKind::Time {
                kind: TimeKind::Timestamp {
                    with_timezone: false,
                },
                precision: None,
            },
            _ => {
                return Err(Error::Load(LoadError::UnsupportedType {
                    type_repr: call.to_string(),
                    dialect: "fake".to_string(),
                    pos,
                }));
            }
        };
        Ok(ColumnType::new(kind, call.to_string().replace(", ", ",")))
    }
}

impl TypeFormatter for FakeTypes {
    fn format(&self, ty: &ColumnType) -> Result<String> {
        Ok(ty.raw.clone())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FakePlan;

impl PlanFormatter for FakePlan {
    fn dialect(&self) -> &'static str {
        "fake"
    }

    fn plan_changes(&self, name: &str, _changes: &[drift_core::Change]) -> Result<Plan> {
        Ok(Plan::new(name))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FakeStatementParser;

impl StatementParser for FakeStatementParser {
    fn is_alter_table(&self, _stmt: &str) -> bool {
        false
    }

    fn rename_table(&self, _stmt: &str) -> Option<(String, String)> {
        None
    }

    fn rename_column(&self, _stmt: &str) -> Option<(String, String, String)> {
        None
    }
}

pub fn fake_dialect() -> Dialect {
    let mut overrides = OverrideMap::default();
    overrides
        .aliases
        .insert("collation".to_string(), "collate".to_string());
    fake_dialect_with_overrides(overrides)
}

pub fn fake_dialect_with_overrides(overrides: OverrideMap) -> Dialect {
    Dialect {
        name: "fake",
        types: Arc::new(FakeTypes),
        formatter: Arc::new(FakeTypes),
        plan: Arc::new(FakePlan),
        stmt_parser: Arc::new(FakeStatementParser),
        policy: Arc::new(DefaultEquivalencePolicy),
        overrides,
        drop_policy: DropPolicy::Plain,
    }
}
