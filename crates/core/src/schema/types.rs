use std::fmt;

use crate::value::Literal;

/// Integer widths recognised across dialects. `Medium` only exists on
/// MySQL/MariaDB; formatters reject it elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntSize {
    Tiny,
    Small,
    Medium,
    Standard,
    Big,
}

/// Calendar/clock types. Precision lives on [`TypeKind::Time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    Date,
    Time { with_timezone: bool },
    Timestamp { with_timezone: bool },
}

/// Dialect-neutral column type vocabulary. Anything a dialect cannot map is
/// carried verbatim as `Unsupported` and re-emitted unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Bool,
    Integer {
        size: IntSize,
        unsigned: bool,
    },
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
        unsigned: bool,
    },
    Float {
        double: bool,
        precision: Option<u32>,
    },
    String {
        size: Option<u64>,
        fixed: bool,
    },
    Binary {
        size: Option<u64>,
        fixed: bool,
    },
    Enum {
        values: Vec<String>,
    },
    Time {
        kind: TimeKind,
        precision: Option<u32>,
    },
    Json {
        binary: bool,
    },
    Uuid,
    Spatial(String),
    Network(String),
    Unsupported(String),
}

/// A resolved column type: the neutral kind plus the dialect-rendered raw
/// form (e.g. `varchar(255)`), which is what plans print.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    pub kind: TypeKind,
    pub raw: String,
}

impl ColumnType {
    pub fn new(kind: TypeKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }

    /// An opaque type that no resolver understood.
    pub fn unsupported(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            kind: TypeKind::Unsupported(raw.clone()),
            raw,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Whether narrowing `from` into `to` may lose data. Used by the
/// backward-incompatibility analyzer, so unknown pairs answer `false`.
pub fn type_narrows(from: &TypeKind, to: &TypeKind) -> bool {
    match (from, to) {
        (TypeKind::String { size: Some(from), .. }, TypeKind::String { size: Some(to), .. })
        | (TypeKind::Binary { size: Some(from), .. }, TypeKind::Binary { size: Some(to), .. }) => {
            to < from
        }
        (TypeKind::Integer { size: from, .. }, TypeKind::Integer { size: to, .. }) => {
            int_rank(*to) < int_rank(*from)
        }
        (
            TypeKind::Decimal {
                precision: Some(from),
                ..
            },
            TypeKind::Decimal {
                precision: Some(to),
                ..
            },
        ) => to < from,
        _ => false,
    }
}

fn int_rank(size: IntSize) -> u8 {
    match size {
        IntSize::Tiny => 0,
        IntSize::Small => 1,
        IntSize::Medium => 2,
        IntSize::Standard => 3,
        IntSize::Big => 4,
    }
}

/// A default value or other SQL fragment attached to a column, check, or
/// index predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Raw(String),
}

impl Expr {
    pub fn raw(expr: impl Into<String>) -> Self {
        Self::Raw(expr.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Self::Literal(Literal::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::Literal(Literal::Bool(value))
    }

    /// Textual normalisation used for structural comparison: redundant outer
    /// parentheses are stripped and bare keywords are case-folded. Dialect
    /// policies refine this; the core never guesses server rewrites.
    pub fn normalized(&self) -> String {
        match self {
            Self::Literal(Literal::String(value)) => format!("'{value}'"),
            Self::Literal(Literal::Int(value)) => value.to_string(),
            Self::Literal(Literal::Float(value)) => value.to_string(),
            Self::Literal(Literal::Bool(value)) => {
                if *value { "TRUE" } else { "FALSE" }.to_string()
            }
            Self::Raw(raw) => normalize_expr_text(raw),
        }
    }
}

const FOLDED_KEYWORDS: &[&str] = &["true", "false", "null", "current_timestamp", "current_date"];

pub(crate) fn normalize_expr_text(raw: &str) -> String {
    let mut text = raw.trim();
    while let Some(inner) = strip_outer_parens(text) {
        text = inner;
    }

    let folded = FOLDED_KEYWORDS
        .iter()
        .find(|keyword| text.eq_ignore_ascii_case(keyword));
    match folded {
        Some(_) => text.to_ascii_uppercase(),
        None => text.to_string(),
    }
}

fn strip_outer_parens(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;

    // Only strip when the outer pair actually matches, so `(a) + (b)` is
    // left alone.
    let mut depth = 0usize;
    for ch in inner.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    Some(inner.trim())
}

/// Whether a generated column is materialised on disk or computed on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKind {
    Stored,
    Virtual,
}

/// A generation expression on a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub expr: String,
    pub kind: GeneratedKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalisation_strips_redundant_parens() {
        assert_eq!(normalize_expr_text("((1 + 2))"), "1 + 2");
        assert_eq!(normalize_expr_text("(a) + (b)"), "(a) + (b)");
    }

    #[test]
    fn normalisation_folds_keywords() {
        assert_eq!(Expr::raw("(true)").normalized(), "TRUE");
        assert_eq!(Expr::raw("now()").normalized(), "now()");
        assert_eq!(Expr::bool(false).normalized(), "FALSE");
    }

    #[test]
    fn varchar_narrowing_detected() {
        let wide = TypeKind::String {
            size: Some(100),
            fixed: false,
        };
        let narrow = TypeKind::String {
            size: Some(50),
            fixed: false,
        };
        assert!(type_narrows(&wide, &narrow));
        assert!(!type_narrows(&narrow, &wide));
    }
}
