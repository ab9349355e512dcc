use drift_core::{
    ColumnType, EquivalencePolicy, Error, FilePos, IntSize, LoadError, Result, TimeKind, TypeCall,
    TypeFormatter, TypeKind, TypeResolver, Value,
};

const DIALECT: &str = "sqlite";

/// SQLite types resolve through the five storage affinities; declared type
/// names are kept only as raw spellings.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteTypes;

fn int_arg(call: &TypeCall, index: usize) -> Option<u32> {
    match call.args.get(index) {
        Some(Value::Literal(drift_core::Literal::Int(value))) => u32::try_from(*value).ok(),
        _ => None,
    }
}

impl TypeResolver for SqliteTypes {
    fn resolve(&self, call: &TypeCall, pos: Option<FilePos>) -> Result<ColumnType> {
        let kind = match call.name.as_str() {
            "bool" | "boolean" => TypeKind::Bool,
            "int" | "integer" | "bigint" | "smallint" | "tinyint" => TypeKind::Integer {
                size: IntSize::Standard,
                unsigned: false,
            },
            "real" | "double" | "float" => TypeKind::Float {
                double: true,
                precision: None,
            },
            "decimal" | "numeric" => TypeKind::Decimal {
                precision: int_arg(call, 0),
                scale: int_arg(call, 1),
                unsigned: false,
            },
            "text" | "clob" => TypeKind::String {
                size: None,
                fixed: false,
            },
            "varchar" => TypeKind::String {
                size: int_arg(call, 0).map(u64::from),
                fixed: false,
            },
            "char" => TypeKind::String {
                size: Some(int_arg(call, 0).map(u64::from).unwrap_or(1)),
                fixed: true,
            },
            "blob" => TypeKind::Binary {
                size: None,
                fixed: false,
            },
            "date" => TypeKind::Time {
                kind: TimeKind::Date,
                precision: None,
            },
            "datetime" | "timestamp" => TypeKind::Time {
                kind: TimeKind::Timestamp {
                    with_timezone: false,
                },
                precision: None,
            },
            "json" => TypeKind::Json { binary: false },
            "uuid" => TypeKind::Uuid,
            _ => {
                return Err(Error::Load(LoadError::UnsupportedType {
                    type_repr: call.to_string(),
                    dialect: DIALECT.to_string(),
                    pos,
                }));
            }
        };
        let raw = render_type(&kind);
        Ok(ColumnType::new(kind, raw))
    }
}

impl TypeFormatter for SqliteTypes {
    fn format(&self, ty: &ColumnType) -> Result<String> {
        Ok(render_type(&ty.kind))
    }
}

pub(crate) fn render_type(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Bool => "bool".to_string(),
        TypeKind::Integer { .. } => "int".to_string(),
        TypeKind::Decimal {
            precision: Some(precision),
            scale: Some(scale),
            ..
        } => format!("decimal({precision},{scale})"),
        TypeKind::Decimal { .. } => "numeric".to_string(),
        TypeKind::Float { .. } => "real".to_string(),
        TypeKind::String { size, fixed } => match (size, fixed) {
            (Some(size), true) => format!("char({size})"),
            (Some(size), false) => format!("varchar({size})"),
            (None, _) => "text".to_string(),
        },
        TypeKind::Binary { .. } => "blob".to_string(),
        TypeKind::Enum { .. } => "text".to_string(),
        TypeKind::Time { kind, .. } => match kind {
            TimeKind::Date => "date".to_string(),
            TimeKind::Time { .. } => "text".to_string(),
            TimeKind::Timestamp { .. } => "datetime".to_string(),
        },
        TypeKind::Json { .. } => "json".to_string(),
        TypeKind::Uuid => "uuid".to_string(),
        TypeKind::Spatial(name) | TypeKind::Network(name) => name.clone(),
        TypeKind::Unsupported(raw) => raw.clone(),
    }
}

/// Maps a declared column type from `pragma table_info` back into the
/// neutral model along SQLite affinity rules.
pub(crate) fn parse_sqlite_type(raw: &str) -> ColumnType {
    let lowered = raw.trim().to_ascii_lowercase();
    let (base, args) = match lowered.find('(') {
        Some(open) => {
            let args = lowered[open + 1..]
                .trim_end_matches(')')
                .split(',')
                .filter_map(|arg| arg.trim().parse::<u32>().ok())
                .collect::<Vec<_>>();
            (lowered[..open].trim().to_string(), args)
        }
        None => (lowered.clone(), Vec::new()),
    };

    let kind = if base == "bool" || base == "boolean" {
        TypeKind::Bool
    } else if base.contains("int") {
        TypeKind::Integer {
            size: IntSize::Standard,
            unsigned: false,
        }
    } else if base == "varchar" {
        TypeKind::String {
            size: args.first().map(|size| u64::from(*size)),
            fixed: false,
        }
    } else if base == "char" || base == "character" {
        TypeKind::String {
            size: Some(args.first().map(|size| u64::from(*size)).unwrap_or(1)),
            fixed: true,
        }
    } else if base.contains("clob") || base.contains("text") {
        TypeKind::String {
            size: None,
            fixed: false,
        }
    } else if base.contains("blob") || base.is_empty() {
        TypeKind::Binary {
            size: None,
            fixed: false,
        }
    } else if base == "real" || base == "double" || base == "float" {
        TypeKind::Float {
            double: true,
            precision: None,
        }
    } else if base == "decimal" || base == "numeric" {
        TypeKind::Decimal {
            precision: args.first().copied(),
            scale: args.get(1).copied(),
            unsigned: false,
        }
    } else if base == "date" {
        TypeKind::Time {
            kind: TimeKind::Date,
            precision: None,
        }
    } else if base == "datetime" || base == "timestamp" {
        TypeKind::Time {
            kind: TimeKind::Timestamp {
                with_timezone: false,
            },
            precision: None,
        }
    } else if base == "json" {
        TypeKind::Json { binary: false }
    } else if base == "uuid" {
        TypeKind::Uuid
    } else {
        return ColumnType::unsupported(raw.trim());
    };

    ColumnType::new(kind, render_type_or_raw(raw, &base, &args))
}

fn render_type_or_raw(raw: &str, base: &str, args: &[u32]) -> String {
    match (base, args.first()) {
        ("varchar", Some(size)) => format!("varchar({size})"),
        _ => {
            let lowered = raw.trim().to_ascii_lowercase();
            if lowered.is_empty() {
                "blob".to_string()
            } else {
                lowered
            }
        }
    }
}

/// Declared types with the same affinity compare equal on SQLite.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteEquivalence;

impl EquivalencePolicy for SqliteEquivalence {
    fn types_equal(&self, left: &ColumnType, right: &ColumnType) -> bool {
        left.kind == right.kind
            || parse_sqlite_type(&left.raw).kind == parse_sqlite_type(&right.raw).kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_affinity_covers_int_spellings() {
        let policy = SqliteEquivalence;
        let declared = SqliteTypes.resolve(&TypeCall::named("integer"), None).unwrap();
        let stored = parse_sqlite_type("INT");
        assert!(policy.types_equal(&declared, &stored));
    }

    #[test]
    fn unknown_types_stay_opaque() {
        let ty = parse_sqlite_type("geography");
        assert_eq!(ty.kind, TypeKind::Unsupported("geography".to_string()));
    }

    #[test]
    fn unsupported_constructor_errors() {
        let err = SqliteTypes
            .resolve(&TypeCall::named("macaddr"), None)
            .unwrap_err();
        assert!(err.to_string().contains("sqlite"));
    }
}
