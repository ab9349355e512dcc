use std::fmt;

use thiserror::Error;

/// Position of a token inside a declarative document, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Scalar literal carried by declarative attributes and model defaults.
///
/// Numbers keep their source form: integers round-trip through `i64`,
/// everything else through `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{value:?}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// A symbolic path such as `column.users.id`, resolved during decode.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefValue {
    pub path: Vec<String>,
}

impl RefValue {
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Last path element, the referenced object's own name.
    pub fn leaf(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

impl fmt::Display for RefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join("."))
    }
}

/// A dialect type constructor with ordered arguments, e.g. `varchar(255)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCall {
    pub name: String,
    pub args: Vec<Value>,
}

impl TypeCall {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for TypeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return f.write_str(&self.name);
        }
        write!(f, "{}(", self.name)?;
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Dialect-neutral value vocabulary shared by the declarative loader and the
/// override engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    List(Vec<Value>),
    Ref(RefValue),
    Type(TypeCall),
    Resource(Box<Resource>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Self::Literal(Literal::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::Literal(Literal::Bool(value))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Literal(Literal::String(_)) => "string",
            Self::Literal(Literal::Int(_)) => "int",
            Self::Literal(Literal::Float(_)) => "float",
            Self::Literal(Literal::Bool(_)) => "bool",
            Self::List(_) => "list",
            Self::Ref(_) => "ref",
            Self::Type(_) => "type",
            Self::Resource(_) => "resource",
        }
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Self::Literal(Literal::String(value)) => Ok(value),
            other => Err(ValueError::WrongKind {
                expected: "string",
                found: other.kind(),
            }),
        }
    }

    pub fn as_i64(&self) -> Result<i64, ValueError> {
        match self {
            Self::Literal(Literal::Int(value)) => Ok(*value),
            other => Err(ValueError::WrongKind {
                expected: "int",
                found: other.kind(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Self::Literal(Literal::Bool(value)) => Ok(*value),
            other => Err(ValueError::WrongKind {
                expected: "bool",
                found: other.kind(),
            }),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], ValueError> {
        match self {
            Self::List(values) => Ok(values),
            other => Err(ValueError::WrongKind {
                expected: "list",
                found: other.kind(),
            }),
        }
    }

    pub fn as_ref_value(&self) -> Result<&RefValue, ValueError> {
        match self {
            Self::Ref(reference) => Ok(reference),
            other => Err(ValueError::WrongKind {
                expected: "ref",
                found: other.kind(),
            }),
        }
    }

    /// Extracts a homogeneous list through a per-element conversion.
    pub fn list_of<T>(
        &self,
        convert: impl Fn(&Value) -> Result<T, ValueError>,
    ) -> Result<Vec<T>, ValueError> {
        self.as_list()?.iter().map(convert).collect()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => write!(f, "{literal}"),
            Self::List(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Ref(reference) => write!(f, "{reference}"),
            Self::Type(call) => write!(f, "{call}"),
            Self::Resource(resource) => write!(f, "{} {:?}", resource.kind, resource.name),
        }
    }
}

/// A single `key = value` entry of a resource block.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: Value,
    pub pos: Option<Pos>,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            pos: None,
        }
    }
}

/// A declarative block: a type label, an optional name label, attributes,
/// and child resources.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    pub kind: String,
    pub name: Option<String>,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Resource>,
    pub pos: Option<Pos>,
}

impl Resource {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn named(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// First attribute with the given key.
    pub fn attr(&self, key: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|attr| attr.key == key)
    }

    /// Replaces the attribute with the same key, or appends it. Keeps the
    /// one-entry-per-key invariant of attribute lists.
    pub fn set_attr(&mut self, attr: Attribute) {
        if let Some(existing) = self.attrs.iter_mut().find(|entry| entry.key == attr.key) {
            *existing = attr;
            return;
        }
        self.attrs.push(attr);
    }

    /// Recursive lookup of a child resource by type and name labels.
    pub fn resource(&self, kind: &str, name: &str) -> Option<&Resource> {
        for child in &self.children {
            if child.kind == kind && child.name.as_deref() == Some(name) {
                return Some(child);
            }
            if let Some(found) = child.resource(kind, name) {
                return Some(found);
            }
        }
        None
    }
}

/// Typed-extraction failures surfaced while decoding values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected a {expected} value, found {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
}

/// Equality over values that treats floats by their total order, so NaN
/// defaults compare stably during diffing.
pub fn value_total_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Literal(Literal::Float(left)), Value::Literal(Literal::Float(right))) => {
            left.total_cmp(right).is_eq()
        }
        (Value::List(left), Value::List(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right.iter())
                    .all(|(left, right)| value_total_eq(left, right))
        }
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_list_keeps_one_entry_per_key() {
        let mut resource = Resource::named("table", "users");
        resource.set_attr(Attribute::new("comment", Value::string("first")));
        resource.set_attr(Attribute::new("engine", Value::string("innodb")));
        resource.set_attr(Attribute::new("comment", Value::string("second")));

        assert_eq!(resource.attrs.len(), 2);
        assert_eq!(
            resource.attr("comment").unwrap().value,
            Value::string("second")
        );
    }

    #[test]
    fn typed_extraction_reports_found_kind() {
        let value = Value::int(42);
        let err = value.as_str().unwrap_err();
        assert_eq!(
            err,
            ValueError::WrongKind {
                expected: "string",
                found: "int"
            }
        );
    }

    #[test]
    fn list_extraction_converts_each_element() {
        let value = Value::List(vec![Value::string("a"), Value::string("b")]);
        let items = value
            .list_of(|value| value.as_str().map(str::to_string))
            .unwrap();
        assert_eq!(items, vec!["a".to_string(), "b".to_string()]);

        let mixed = Value::List(vec![Value::string("a"), Value::int(1)]);
        assert!(mixed.list_of(|value| value.as_str().map(str::to_string)).is_err());
    }

    #[test]
    fn resource_lookup_recurses() {
        let mut table = Resource::named("table", "users");
        table.children.push(Resource::named("column", "id"));
        let mut root = Resource::new("document");
        root.children.push(table);

        assert!(root.resource("column", "id").is_some());
        assert!(root.resource("column", "missing").is_none());
    }

    #[test]
    fn type_call_renders_constructor_form() {
        let call = TypeCall {
            name: "varchar".to_string(),
            args: vec![Value::int(255)],
        };
        assert_eq!(call.to_string(), "varchar(255)");
        assert_eq!(TypeCall::named("int").to_string(), "int");
    }

    #[test]
    fn nan_floats_compare_equal_under_total_order() {
        let left = Value::Literal(Literal::Float(f64::NAN));
        let right = Value::Literal(Literal::Float(f64::NAN));
        assert!(value_total_eq(&left, &right));
    }
}
