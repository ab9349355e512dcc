use drift_core::{
    ColumnType, EquivalencePolicy, Error, Expr, FilePos, IntSize, LoadError, Result, TimeKind,
    TypeCall, TypeFormatter, TypeKind, TypeResolver, Value,
};

const DIALECT: &str = "postgres";

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresTypes;

fn unsupported(call: &TypeCall, pos: Option<FilePos>) -> Error {
    LoadError::UnsupportedType {
        type_repr: call.to_string(),
        dialect: DIALECT.to_string(),
        pos,
    }
    .into()
}

fn int_arg(call: &TypeCall, index: usize) -> Option<u32> {
    match call.args.get(index) {
        Some(Value::Literal(drift_core::Literal::Int(value))) => u32::try_from(*value).ok(),
        _ => None,
    }
}

impl TypeResolver for PostgresTypes {
    fn resolve(&self, call: &TypeCall, pos: Option<FilePos>) -> Result<ColumnType> {
        let kind = match call.name.as_str() {
            "bool" | "boolean" => TypeKind::Bool,
            "smallint" | "int2" => TypeKind::Integer {
                size: IntSize::Small,
                unsigned: false,
            },
            "int" | "integer" | "int4" => TypeKind::Integer {
                size: IntSize::Standard,
                unsigned: false,
            },
            "bigint" | "int8" => TypeKind::Integer {
                size: IntSize::Big,
                unsigned: false,
            },
            "numeric" | "decimal" => TypeKind::Decimal {
                precision: int_arg(call, 0),
                scale: int_arg(call, 1),
                unsigned: false,
            },
            "real" | "float4" => TypeKind::Float {
                double: false,
                precision: None,
            },
            "float8" | "double" => TypeKind::Float {
                double: true,
                precision: None,
            },
            "float" => TypeKind::Float {
                double: int_arg(call, 0).is_none_or(|precision| precision > 24),
                precision: int_arg(call, 0),
            },
            "text" => TypeKind::String {
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
            "bytea" => TypeKind::Binary {
                size: None,
                fixed: false,
            },
            "date" => TypeKind::Time {
                kind: TimeKind::Date,
                precision: None,
            },
            "time" => TypeKind::Time {
                kind: TimeKind::Time {
                    with_timezone: false,
                },
                precision: int_arg(call, 0),
            },
            "timetz" => TypeKind::Time {
                kind: TimeKind::Time {
                    with_timezone: true,
                },
                precision: int_arg(call, 0),
            },
            "timestamp" => TypeKind::Time {
                kind: TimeKind::Timestamp {
                    with_timezone: false,
                },
                precision: int_arg(call, 0),
            },
            "timestamptz" => TypeKind::Time {
                kind: TimeKind::Timestamp {
                    with_timezone: true,
                },
                precision: int_arg(call, 0),
            },
            "json" => TypeKind::Json { binary: false },
            "jsonb" => TypeKind::Json { binary: true },
            "uuid" => TypeKind::Uuid,
            "inet" | "cidr" | "macaddr" | "macaddr8" => TypeKind::Network(call.name.clone()),
            "point" | "line" | "polygon" | "geometry" | "geography" => {
                TypeKind::Spatial(call.name.clone())
            }
            _ => return Err(unsupported(call, pos)),
        };
        let raw = render_type(&kind)?;
        Ok(ColumnType::new(kind, raw))
    }
}

impl TypeFormatter for PostgresTypes {
    fn format(&self, ty: &ColumnType) -> Result<String> {
        render_type(&ty.kind)
    }
}

fn render_type(kind: &TypeKind) -> Result<String> {
    Ok(match kind {
        TypeKind::Bool => "boolean".to_string(),
        TypeKind::Integer { size, unsigned } => {
            if *unsigned {
                return Err(render_error("unsigned integers"));
            }
            match size {
                IntSize::Small | IntSize::Tiny => "smallint".to_string(),
                IntSize::Standard | IntSize::Medium => "integer".to_string(),
                IntSize::Big => "bigint".to_string(),
            }
        }
        TypeKind::Decimal {
            precision,
            scale,
            unsigned,
        } => {
            if *unsigned {
                return Err(render_error("unsigned decimals"));
            }
            match (precision, scale) {
                (Some(precision), Some(scale)) => format!("numeric({precision},{scale})"),
                (Some(precision), None) => format!("numeric({precision})"),
                _ => "numeric".to_string(),
            }
        }
        TypeKind::Float { double, .. } => {
            if *double { "float8" } else { "float4" }.to_string()
        }
        TypeKind::String { size, fixed } => match (size, fixed) {
            (Some(size), true) => format!("char({size})"),
            (Some(size), false) => format!("varchar({size})"),
            (None, _) => "text".to_string(),
        },
        TypeKind::Binary { .. } => "bytea".to_string(),
        TypeKind::Enum { .. } => return Err(render_error("anonymous enum types")),
        TypeKind::Time { kind, precision } => {
            let base = match kind {
                TimeKind::Date => "date",
                TimeKind::Time {
                    with_timezone: false,
                } => "time",
                TimeKind::Time {
                    with_timezone: true,
                } => "timetz",
                TimeKind::Timestamp {
                    with_timezone: false,
                } => "timestamp",
                TimeKind::Timestamp {
                    with_timezone: true,
                } => "timestamptz",
            };
            match precision {
                Some(precision) => format!("{base}({precision})"),
                None => base.to_string(),
            }
        }
        TypeKind::Json { binary } => if *binary { "jsonb" } else { "json" }.to_string(),
        TypeKind::Uuid => "uuid".to_string(),
        TypeKind::Spatial(name) | TypeKind::Network(name) => name.clone(),
        TypeKind::Unsupported(raw) => raw.clone(),
    })
}

fn render_error(what: &str) -> Error {
    LoadError::UnsupportedType {
        type_repr: what.to_string(),
        dialect: DIALECT.to_string(),
        pos: None,
    }
    .into()
}

/// Maps `pg_catalog.format_type` output back into the neutral model, used
/// by introspection. Unknown spellings come back as opaque types.
pub(crate) fn parse_pg_type(raw: &str) -> ColumnType {
    let lowered = raw.trim().to_ascii_lowercase();
    let (base, args) = split_type_args(&lowered);

    let kind = match base.as_str() {
        "boolean" | "bool" => TypeKind::Bool,
        "smallint" | "int2" => TypeKind::Integer {
            size: IntSize::Small,
            unsigned: false,
        },
        "integer" | "int" | "int4" => TypeKind::Integer {
            size: IntSize::Standard,
            unsigned: false,
        },
        "bigint" | "int8" => TypeKind::Integer {
            size: IntSize::Big,
            unsigned: false,
        },
        "numeric" | "decimal" => TypeKind::Decimal {
            precision: args.first().copied(),
            scale: args.get(1).copied(),
            unsigned: false,
        },
        "real" | "float4" => TypeKind::Float {
            double: false,
            precision: None,
        },
        "double precision" | "float8" => TypeKind::Float {
            double: true,
            precision: None,
        },
        "text" => TypeKind::String {
            size: None,
            fixed: false,
        },
        "character varying" | "varchar" => TypeKind::String {
            size: args.first().map(|size| u64::from(*size)),
            fixed: false,
        },
        "character" | "char" | "bpchar" => TypeKind::String {
            size: Some(args.first().map(|size| u64::from(*size)).unwrap_or(1)),
            fixed: true,
        },
        "bytea" => TypeKind::Binary {
            size: None,
            fixed: false,
        },
        "date" => TypeKind::Time {
            kind: TimeKind::Date,
            precision: None,
        },
        "time without time zone" | "time" => TypeKind::Time {
            kind: TimeKind::Time {
                with_timezone: false,
            },
            precision: args.first().copied(),
        },
        "time with time zone" | "timetz" => TypeKind::Time {
            kind: TimeKind::Time {
                with_timezone: true,
            },
            precision: args.first().copied(),
        },
        "timestamp without time zone" | "timestamp" => TypeKind::Time {
            kind: TimeKind::Timestamp {
                with_timezone: false,
            },
            precision: args.first().copied(),
        },
        "timestamp with time zone" | "timestamptz" => TypeKind::Time {
            kind: TimeKind::Timestamp {
                with_timezone: true,
            },
            precision: args.first().copied(),
        },
        "json" => TypeKind::Json { binary: false },
        "jsonb" => TypeKind::Json { binary: true },
        "uuid" => TypeKind::Uuid,
        "inet" | "cidr" | "macaddr" | "macaddr8" => TypeKind::Network(base.to_string()),
        _ => return ColumnType::unsupported(raw.trim()),
    };

    match render_type(&kind) {
        Ok(rendered) => ColumnType::new(kind, rendered),
        Err(_) => ColumnType::unsupported(raw.trim()),
    }
}

/// `format_type` may put the modifier mid-name (`timestamp(3) with time
/// zone`), so the base is the name with the parenthesised part removed.
fn split_type_args(lowered: &str) -> (String, Vec<u32>) {
    let Some(open) = lowered.find('(') else {
        return (lowered.to_string(), Vec::new());
    };
    let Some(close) = lowered[open..].find(')').map(|offset| open + offset) else {
        return (lowered.to_string(), Vec::new());
    };
    let base = format!("{}{}", lowered[..open].trim_end(), &lowered[close + 1..]);
    let args = lowered[open + 1..close]
        .split(',')
        .filter_map(|arg| arg.trim().parse::<u32>().ok())
        .collect();
    (base.trim().to_string(), args)
}

/// PostgreSQL rewrites stored defaults, most visibly by appending casts
/// (`'a'::character varying`). Comparison strips top-level casts before the
/// shared textual normalisation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresEquivalence;

impl EquivalencePolicy for PostgresEquivalence {
    fn defaults_equal(&self, left: &Expr, right: &Expr) -> bool {
        normalize_default(left) == normalize_default(right)
    }
}

fn normalize_default(expr: &Expr) -> String {
    let normalized = expr.normalized();
    strip_cast(&normalized).to_string()
}

fn strip_cast(text: &str) -> &str {
    let mut depth = 0usize;
    let bytes = text.as_bytes();
    let mut in_string = false;
    for (index, &byte) in bytes.iter().enumerate() {
        match byte {
            b'\'' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => depth = depth.saturating_sub(1),
            b':' if !in_string
                && depth == 0
                && bytes.get(index + 1) == Some(&b':') =>
            {
                return text[..index].trim_end();
            }
            _ => {}
        }
    }
    text
}

pub static POSTGRES_EQUIVALENCE: PostgresEquivalence = PostgresEquivalence;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varchar_resolves_with_size() {
        let call = TypeCall {
            name: "varchar".to_string(),
            args: vec![Value::int(255)],
        };
        let ty = PostgresTypes.resolve(&call, None).unwrap();
        assert_eq!(ty.raw, "varchar(255)");
        assert_eq!(
            ty.kind,
            TypeKind::String {
                size: Some(255),
                fixed: false
            }
        );
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let call = TypeCall::named("tinyint");
        let err = PostgresTypes.resolve(&call, None).unwrap_err();
        assert!(err.to_string().contains("unsupported type"));
    }

    #[test]
    fn format_type_output_round_trips() {
        let ty = parse_pg_type("character varying(120)");
        assert_eq!(ty.raw, "varchar(120)");
        let ty = parse_pg_type("timestamp with time zone");
        assert_eq!(ty.raw, "timestamptz");
    }

    #[test]
    fn default_comparison_ignores_stored_casts() {
        let policy = PostgresEquivalence;
        assert!(policy.defaults_equal(
            &Expr::raw("'a'::character varying"),
            &Expr::string("a"),
        ));
        assert!(!policy.defaults_equal(&Expr::raw("'a'"), &Expr::raw("'b'")));
    }
}
