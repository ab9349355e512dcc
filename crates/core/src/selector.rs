use crate::{
    error::LoadError,
    schema::{Realm, Schema, Table},
};

/// Object kinds addressable by a selector suffix, e.g. `[type=column]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    View,
    Enum,
    Function,
    Procedure,
    Column,
    Index,
    Trigger,
    Check,
}

impl ObjectKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "table" => Some(Self::Table),
            "view" => Some(Self::View),
            "enum" => Some(Self::Enum),
            "function" => Some(Self::Function),
            "procedure" => Some(Self::Procedure),
            "column" => Some(Self::Column),
            "index" => Some(Self::Index),
            "trigger" => Some(Self::Trigger),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    glob: String,
    kinds: Option<Vec<ObjectKind>>,
}

impl Segment {
    fn matches(&self, name: &str, kind: ObjectKind) -> bool {
        self.allows(kind) && glob_match(&self.glob, name)
    }

    fn allows(&self, kind: ObjectKind) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&kind),
            None => true,
        }
    }
}

/// A parsed exclusion pattern of one to three dot-separated glob segments:
/// `<schema>.<object>.<child>`, each optionally suffixed by a type selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

pub fn parse_pattern(raw: &str) -> Result<Pattern, LoadError> {
    let invalid = |message: &str| LoadError::Selector {
        pattern: raw.to_string(),
        message: message.to_string(),
    };

    let segments = split_segments(raw)
        .into_iter()
        .map(|segment| parse_segment(raw, &segment))
        .collect::<Result<Vec<_>, _>>()?;

    if segments.is_empty() || segments.len() > 3 {
        return Err(invalid("expected between one and three segments"));
    }
    if segments[0].kinds.is_some() {
        return Err(invalid("the schema segment takes no type selector"));
    }
    Ok(Pattern { segments })
}

/// Splits on `.` outside bracket expressions, so `t[a.b]` stays one segment.
fn split_segments(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            '.' if depth == 0 => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    segments.push(current);
    segments
}

fn parse_segment(pattern: &str, raw: &str) -> Result<Segment, LoadError> {
    let invalid = |message: String| LoadError::Selector {
        pattern: pattern.to_string(),
        message,
    };

    if let Some(start) = raw.find("[type=") {
        let Some(stripped) = raw[start..].strip_prefix("[type=") else {
            unreachable!("find guarantees the prefix");
        };
        let Some(list) = stripped.strip_suffix(']') else {
            return Err(invalid("unterminated type selector".to_string()));
        };
        let kinds = list
            .split('|')
            .map(|kind| {
                ObjectKind::parse(kind.trim())
                    .ok_or_else(|| invalid(format!("unknown object kind `{kind}`")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Segment {
            glob: raw[..start].to_string(),
            kinds: Some(kinds),
        });
    }

    Ok(Segment {
        glob: raw.to_string(),
        kinds: None,
    })
}

/// Removes every object whose path matches any pattern. Lower-level
/// exclusions prune child collections only; the exclusion order is
/// irrelevant (pruning commutes).
pub fn exclude(realm: &mut Realm, patterns: &[Pattern]) {
    for pattern in patterns {
        apply_pattern(realm, pattern);
    }
}

fn apply_pattern(realm: &mut Realm, pattern: &Pattern) {
    match pattern.segments.as_slice() {
        [schema_seg] => {
            realm
                .schemas
                .retain(|schema| !glob_match(&schema_seg.glob, &schema.name));
        }
        [schema_seg, object_seg] => {
            for schema in &mut realm.schemas {
                if glob_match(&schema_seg.glob, &schema.name) {
                    prune_schema_objects(schema, object_seg);
                }
            }
        }
        [schema_seg, object_seg, child_seg] => {
            for schema in &mut realm.schemas {
                if !glob_match(&schema_seg.glob, &schema.name) {
                    continue;
                }
                for table in &mut schema.tables {
                    if object_seg.matches(&table.name, ObjectKind::Table) {
                        prune_table_children(table, child_seg);
                    }
                }
            }
        }
        _ => {}
    }
}

fn prune_schema_objects(schema: &mut Schema, segment: &Segment) {
    schema
        .tables
        .retain(|table| !segment.matches(&table.name, ObjectKind::Table));
    schema
        .views
        .retain(|view| !segment.matches(&view.name, ObjectKind::View));
    schema
        .enums
        .retain(|decl| !segment.matches(&decl.name, ObjectKind::Enum));
    schema
        .funcs
        .retain(|func| !segment.matches(&func.name, ObjectKind::Function));
    schema
        .procs
        .retain(|proc| !segment.matches(&proc.name, ObjectKind::Procedure));
}

fn prune_table_children(table: &mut Table, segment: &Segment) {
    table
        .columns
        .retain(|column| !segment.matches(&column.name, ObjectKind::Column));
    table
        .indexes
        .retain(|index| !segment.matches(&index.name, ObjectKind::Index));
    table
        .triggers
        .retain(|trigger| !segment.matches(&trigger.name, ObjectKind::Trigger));
    table
        .checks
        .retain(|check| !segment.matches(&check.name, ObjectKind::Check));
}

/// Glob matching over `*`, `?`, and character classes (`[12]`, `[a-z]`).
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern = pattern.chars().collect::<Vec<_>>();
    let name = name.chars().collect::<Vec<_>>();
    match_at(&pattern, &name)
}

fn match_at(pattern: &[char], name: &[char]) -> bool {
    match pattern.first() {
        None => name.is_empty(),
        Some('*') => {
            (0..=name.len()).any(|skip| match_at(&pattern[1..], &name[skip..]))
        }
        Some('?') => !name.is_empty() && match_at(&pattern[1..], &name[1..]),
        Some('[') => {
            let Some(end) = pattern.iter().position(|ch| *ch == ']') else {
                return false;
            };
            let Some(first) = name.first() else {
                return false;
            };
            class_contains(&pattern[1..end], *first) && match_at(&pattern[end + 1..], &name[1..])
        }
        Some(ch) => name.first() == Some(ch) && match_at(&pattern[1..], &name[1..]),
    }
}

fn class_contains(class: &[char], ch: char) -> bool {
    let mut index = 0;
    while index < class.len() {
        if index + 2 < class.len() && class[index + 1] == '-' {
            if class[index] <= ch && ch <= class[index + 2] {
                return true;
            }
            index += 3;
            continue;
        }
        if class[index] == ch {
            return true;
        }
        index += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_classes_and_wildcards() {
        assert!(glob_match("s*", "sales"));
        assert!(glob_match("t[12]", "t1"));
        assert!(glob_match("t[12]", "t2"));
        assert!(!glob_match("t[12]", "t3"));
        assert!(glob_match("c?", "c1"));
        assert!(glob_match("[a-c]x", "bx"));
    }

    #[test]
    fn selector_restricts_kinds() {
        let pattern = parse_pattern("s*.t[12].c?[type=column]").unwrap();
        assert_eq!(pattern.segments.len(), 3);
        let child = &pattern.segments[2];
        assert!(child.matches("c1", ObjectKind::Column));
        assert!(!child.matches("c1", ObjectKind::Index));
    }

    #[test]
    fn schema_segment_rejects_selector() {
        assert!(parse_pattern("s*[type=table]").is_err());
    }

    #[test]
    fn multi_kind_selector_parses() {
        let pattern = parse_pattern("*.*[type=view|enum]").unwrap();
        let object = &pattern.segments[1];
        assert!(object.allows(ObjectKind::View));
        assert!(object.allows(ObjectKind::Enum));
        assert!(!object.allows(ObjectKind::Table));
    }
}
