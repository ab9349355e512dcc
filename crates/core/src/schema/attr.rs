use crate::value::Value;

/// A dialect-scoped attribute attached to a realm, schema, table, column,
/// index, or foreign key. Closed variants cover the attributes the engine
/// understands; anything else is carried opaquely as `Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Charset(String),
    Collation(String),
    Comment(String),
    Engine(String),
    AutoIncrement(u64),
    Identity { seed: i64, increment: i64 },
    /// Non-key columns stored with an index (PostgreSQL INCLUDE).
    Include(Vec<String>),
    /// Index access method (btree, hash, gin, ...).
    IndexType(String),
    /// Build or drop the index without blocking writes (PostgreSQL).
    Concurrently,
    WithoutRowid,
    Unknown { key: String, value: Value },
}

impl Attr {
    /// Stable key identifying the attribute family; `Unknown` carries its
    /// own key.
    pub fn key(&self) -> &str {
        match self {
            Self::Charset(_) => "charset",
            Self::Collation(_) => "collate",
            Self::Comment(_) => "comment",
            Self::Engine(_) => "engine",
            Self::AutoIncrement(_) => "auto_increment",
            Self::Identity { .. } => "identity",
            Self::Include(_) => "include",
            Self::IndexType(_) => "type",
            Self::Concurrently => "concurrently",
            Self::WithoutRowid => "without_rowid",
            Self::Unknown { key, .. } => key,
        }
    }
}

/// Replaces the entry with the same key or appends. Attribute lists carry at
/// most one entry per key.
pub fn set_attr(attrs: &mut Vec<Attr>, attr: Attr) {
    if let Some(existing) = attrs.iter_mut().find(|entry| entry.key() == attr.key()) {
        *existing = attr;
        return;
    }
    attrs.push(attr);
}

/// First attribute with the given key.
pub fn get_attr<'a>(attrs: &'a [Attr], key: &str) -> Option<&'a Attr> {
    attrs.iter().find(|attr| attr.key() == key)
}

pub fn comment_of(attrs: &[Attr]) -> Option<&str> {
    attrs.iter().find_map(|attr| match attr {
        Attr::Comment(text) => Some(text.as_str()),
        _ => None,
    })
}

pub fn charset_of(attrs: &[Attr]) -> Option<&str> {
    attrs.iter().find_map(|attr| match attr {
        Attr::Charset(name) => Some(name.as_str()),
        _ => None,
    })
}

pub fn collation_of(attrs: &[Attr]) -> Option<&str> {
    attrs.iter().find_map(|attr| match attr {
        Attr::Collation(name) => Some(name.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attr_replaces_by_key() {
        let mut attrs = vec![Attr::Comment("old".to_string())];
        set_attr(&mut attrs, Attr::Comment("new".to_string()));
        set_attr(&mut attrs, Attr::Engine("innodb".to_string()));

        assert_eq!(attrs.len(), 2);
        assert_eq!(comment_of(&attrs), Some("new"));
    }

    #[test]
    fn unknown_attrs_keep_their_own_key() {
        let attr = Attr::Unknown {
            key: "fillfactor".to_string(),
            value: Value::int(70),
        };
        assert_eq!(attr.key(), "fillfactor");
    }
}
