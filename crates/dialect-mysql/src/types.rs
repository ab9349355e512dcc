use drift_core::{
    ColumnType, EquivalencePolicy, Error, FilePos, IntSize, LoadError, Result, TimeKind, TypeCall,
    TypeFormatter, TypeKind, TypeResolver, Value,
};

/// MySQL and MariaDB differ in a handful of type spellings; the flavor
/// carries through the resolver and formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Mysql,
    Mariadb,
}

impl Flavor {
    pub fn dialect_name(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MysqlTypes {
    pub flavor: Flavor,
}

fn unsupported(flavor: Flavor, repr: String, pos: Option<FilePos>) -> Error {
    LoadError::UnsupportedType {
        type_repr: repr,
        dialect: flavor.dialect_name().to_string(),
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

fn string_args(call: &TypeCall) -> Vec<String> {
    call.args
        .iter()
        .filter_map(|arg| arg.as_str().ok().map(str::to_string))
        .collect()
}

impl TypeResolver for MysqlTypes {
    fn resolve(&self, call: &TypeCall, pos: Option<FilePos>) -> Result<ColumnType> {
        let kind = match call.name.as_str() {
            "bool" | "boolean" => TypeKind::Bool,
            "tinyint" => TypeKind::Integer {
                size: IntSize::Tiny,
                unsigned: false,
            },
            "smallint" => TypeKind::Integer {
                size: IntSize::Small,
                unsigned: false,
            },
            "mediumint" => TypeKind::Integer {
                size: IntSize::Medium,
                unsigned: false,
            },
            "int" | "integer" => TypeKind::Integer {
                size: IntSize::Standard,
                unsigned: false,
            },
            "bigint" => TypeKind::Integer {
                size: IntSize::Big,
                unsigned: false,
            },
            "decimal" | "numeric" => TypeKind::Decimal {
                precision: int_arg(call, 0),
                scale: int_arg(call, 1),
                unsigned: false,
            },
            "float" => TypeKind::Float {
                double: false,
                precision: int_arg(call, 0),
            },
            "double" => TypeKind::Float {
                double: true,
                precision: None,
            },
            // A varchar without a length is ambiguous on MySQL: the server
            // requires an explicit size.
            "varchar" => match int_arg(call, 0) {
                Some(size) => TypeKind::String {
                    size: Some(u64::from(size)),
                    fixed: false,
                },
                None => return Err(unsupported(self.flavor, call.to_string(), pos)),
            },
            "char" => TypeKind::String {
                size: Some(int_arg(call, 0).map(u64::from).unwrap_or(1)),
                fixed: true,
            },
            "text" | "tinytext" | "mediumtext" | "longtext" => TypeKind::String {
                size: None,
                fixed: false,
            },
            "binary" => TypeKind::Binary {
                size: int_arg(call, 0).map(u64::from),
                fixed: true,
            },
            "varbinary" => match int_arg(call, 0) {
                Some(size) => TypeKind::Binary {
                    size: Some(u64::from(size)),
                    fixed: false,
                },
                None => return Err(unsupported(self.flavor, call.to_string(), pos)),
            },
            "blob" | "tinyblob" | "mediumblob" | "longblob" => TypeKind::Binary {
                size: None,
                fixed: false,
            },
            "enum" => TypeKind::Enum {
                values: string_args(call),
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
            "datetime" => TypeKind::Time {
                kind: TimeKind::Timestamp {
                    with_timezone: false,
                },
                precision: int_arg(call, 0),
            },
            "timestamp" => TypeKind::Time {
                kind: TimeKind::Timestamp {
                    with_timezone: true,
                },
                precision: int_arg(call, 0),
            },
            "json" => TypeKind::Json { binary: false },
            "uuid" => match self.flavor {
                Flavor::Mariadb => TypeKind::Uuid,
                Flavor::Mysql => {
                    return Err(unsupported(self.flavor, call.to_string(), pos));
                }
            },
            "point" | "geometry" | "linestring" | "polygon" => {
                TypeKind::Spatial(call.name.clone())
            }
            _ => return Err(unsupported(self.flavor, call.to_string(), pos)),
        };
        let raw = render_type(self.flavor, &kind)?;
        Ok(ColumnType::new(kind, raw))
    }
}

impl TypeFormatter for MysqlTypes {
    fn format(&self, ty: &ColumnType) -> Result<String> {
        render_type(self.flavor, &ty.kind)
    }
}

pub(crate) fn render_type(flavor: Flavor, kind: &TypeKind) -> Result<String> {
    let unsigned_suffix = |unsigned: bool| if unsigned { " unsigned" } else { "" };
    Ok(match kind {
        TypeKind::Bool => "bool".to_string(),
        TypeKind::Integer { size, unsigned } => {
            let base = match size {
                IntSize::Tiny => "tinyint",
                IntSize::Small => "smallint",
                IntSize::Medium => "mediumint",
                IntSize::Standard => "int",
                IntSize::Big => "bigint",
            };
            format!("{base}{}", unsigned_suffix(*unsigned))
        }
        TypeKind::Decimal {
            precision,
            scale,
            unsigned,
        } => {
            let base = match (precision, scale) {
                (Some(precision), Some(scale)) => format!("decimal({precision},{scale})"),
                (Some(precision), None) => format!("decimal({precision})"),
                _ => "decimal".to_string(),
            };
            format!("{base}{}", unsigned_suffix(*unsigned))
        }
        TypeKind::Float { double, precision } => match (double, precision) {
            (true, _) => "double".to_string(),
            (false, Some(precision)) => format!("float({precision})"),
            (false, None) => "float".to_string(),
        },
        TypeKind::String { size, fixed } => match (size, fixed) {
            (Some(size), true) => format!("char({size})"),
            (Some(size), false) => format!("varchar({size})"),
            (None, _) => "longtext".to_string(),
        },
        TypeKind::Binary { size, fixed } => match (size, fixed) {
            (Some(size), true) => format!("binary({size})"),
            (Some(size), false) => format!("varbinary({size})"),
            (None, _) => "longblob".to_string(),
        },
        TypeKind::Enum { values } => {
            let rendered = values
                .iter()
                .map(|value| format!("'{}'", value.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(",");
            format!("enum({rendered})")
        }
        TypeKind::Time { kind, precision } => {
            let base = match kind {
                TimeKind::Date => "date",
                TimeKind::Time { .. } => "time",
                TimeKind::Timestamp {
                    with_timezone: false,
                } => "datetime",
                TimeKind::Timestamp {
                    with_timezone: true,
                } => "timestamp",
            };
            match precision {
                Some(precision) => format!("{base}({precision})"),
                None => base.to_string(),
            }
        }
        TypeKind::Json { .. } => match flavor {
            Flavor::Mysql => "json".to_string(),
            Flavor::Mariadb => "longtext".to_string(),
        },
        TypeKind::Uuid => match flavor {
            Flavor::Mariadb => "uuid".to_string(),
            Flavor::Mysql => {
                return Err(LoadError::UnsupportedType {
                    type_repr: "uuid".to_string(),
                    dialect: "mysql".to_string(),
                    pos: None,
                }
                .into());
            }
        },
        TypeKind::Spatial(name) | TypeKind::Network(name) => name.clone(),
        TypeKind::Unsupported(raw) => raw.clone(),
    })
}

/// Maps `information_schema.columns.COLUMN_TYPE` (e.g. `int(11) unsigned`)
/// back into the neutral model.
pub(crate) fn parse_mysql_type(flavor: Flavor, raw: &str) -> ColumnType {
    let lowered = raw.trim().to_ascii_lowercase();
    let unsigned = lowered.ends_with(" unsigned");
    let stripped = lowered.trim_end_matches(" unsigned");
    let (base, rest) = match stripped.find('(') {
        Some(open) => (&stripped[..open], Some(&stripped[open + 1..])),
        None => (stripped, None),
    };
    let args = rest
        .map(|inner| {
            inner
                .trim_end_matches(')')
                .split(',')
                .filter_map(|arg| arg.trim().parse::<u32>().ok())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let kind = match base {
        "tinyint" if args.first() == Some(&1) => TypeKind::Bool,
        "tinyint" => TypeKind::Integer {
            size: IntSize::Tiny,
            unsigned,
        },
        "smallint" => TypeKind::Integer {
            size: IntSize::Small,
            unsigned,
        },
        "mediumint" => TypeKind::Integer {
            size: IntSize::Medium,
            unsigned,
        },
        "int" | "integer" => TypeKind::Integer {
            size: IntSize::Standard,
            unsigned,
        },
        "bigint" => TypeKind::Integer {
            size: IntSize::Big,
            unsigned,
        },
        "decimal" | "numeric" => TypeKind::Decimal {
            precision: args.first().copied(),
            scale: args.get(1).copied(),
            unsigned,
        },
        "float" => TypeKind::Float {
            double: false,
            precision: args.first().copied(),
        },
        "double" => TypeKind::Float {
            double: true,
            precision: None,
        },
        "varchar" => TypeKind::String {
            size: args.first().map(|size| u64::from(*size)),
            fixed: false,
        },
        "char" => TypeKind::String {
            size: Some(args.first().map(|size| u64::from(*size)).unwrap_or(1)),
            fixed: true,
        },
        "text" | "tinytext" | "mediumtext" | "longtext" => TypeKind::String {
            size: None,
            fixed: false,
        },
        "binary" => TypeKind::Binary {
            size: args.first().map(|size| u64::from(*size)),
            fixed: true,
        },
        "varbinary" => TypeKind::Binary {
            size: args.first().map(|size| u64::from(*size)),
            fixed: false,
        },
        "blob" | "tinyblob" | "mediumblob" | "longblob" => TypeKind::Binary {
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
            precision: args.first().copied(),
        },
        "datetime" => TypeKind::Time {
            kind: TimeKind::Timestamp {
                with_timezone: false,
            },
            precision: args.first().copied(),
        },
        "timestamp" => TypeKind::Time {
            kind: TimeKind::Timestamp {
                with_timezone: true,
            },
            precision: args.first().copied(),
        },
        "json" => TypeKind::Json { binary: false },
        "uuid" => TypeKind::Uuid,
        _ if base.starts_with("enum") => {
            let values = rest
                .map(|inner| {
                    inner
                        .trim_end_matches(')')
                        .split(',')
                        .map(|value| value.trim().trim_matches('\'').to_string())
                        .collect()
                })
                .unwrap_or_default();
            TypeKind::Enum { values }
        }
        _ => return ColumnType::unsupported(raw.trim()),
    };

    match render_type(flavor, &kind) {
        Ok(rendered) => ColumnType::new(kind, rendered),
        Err(_) => ColumnType::unsupported(raw.trim()),
    }
}

/// The server normalises `int` to `int(11)` and friends; display widths are
/// ignored when comparing resolved kinds.
#[derive(Debug, Clone, Copy)]
pub struct MysqlEquivalence {
    pub flavor: Flavor,
}

impl EquivalencePolicy for MysqlEquivalence {
    fn types_equal(&self, left: &ColumnType, right: &ColumnType) -> bool {
        if left.kind == right.kind {
            return true;
        }
        parse_mysql_type(self.flavor, &left.raw).kind
            == parse_mysql_type(self.flavor, &right.raw).kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mysql() -> MysqlTypes {
        MysqlTypes {
            flavor: Flavor::Mysql,
        }
    }

    #[test]
    fn varchar_requires_a_size() {
        let err = mysql().resolve(&TypeCall::named("varchar"), None).unwrap_err();
        assert!(matches!(
            err,
            drift_core::Error::Load(LoadError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn display_widths_are_equivalent() {
        let policy = MysqlEquivalence {
            flavor: Flavor::Mysql,
        };
        let stored = parse_mysql_type(Flavor::Mysql, "int(11)");
        let declared = mysql().resolve(&TypeCall::named("int"), None).unwrap();
        assert!(policy.types_equal(&stored, &declared));
    }

    #[test]
    fn mariadb_spells_json_as_longtext() {
        let ty = render_type(
            Flavor::Mariadb,
            &TypeKind::Json { binary: false },
        )
        .unwrap();
        assert_eq!(ty, "longtext");
        let ty = render_type(Flavor::Mysql, &TypeKind::Json { binary: false }).unwrap();
        assert_eq!(ty, "json");
    }

    #[test]
    fn unsigned_round_trips() {
        let ty = parse_mysql_type(Flavor::Mysql, "bigint(20) unsigned");
        assert_eq!(ty.raw, "bigint unsigned");
        assert_eq!(
            ty.kind,
            TypeKind::Integer {
                size: IntSize::Big,
                unsigned: true
            }
        );
    }
}
