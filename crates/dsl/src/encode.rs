use std::fmt::Write as _;

use drift_core::{
    Attr, Check, Column, EnumType, Expr, ForeignKey, Index, IndexPartKind, Literal, Realm,
    RefAction, Schema, Table, Trigger, TriggerEvent, TriggerTiming, TypeKind, Value, View,
};

/// Renders a realm back into declarative document text, the reverse of the
/// loader. Output is stable: objects appear in model order, attributes in a
/// fixed order per block kind.
pub fn encode_realm(realm: &Realm) -> String {
    let mut out = String::new();
    for schema in &realm.schemas {
        encode_schema(&mut out, schema);
    }
    for schema in &realm.schemas {
        for decl in &schema.enums {
            encode_enum(&mut out, schema, decl);
        }
        for table in &schema.tables {
            encode_table(&mut out, schema, table);
        }
        for view in &schema.views {
            encode_view(&mut out, schema, view);
        }
    }
    out
}

fn encode_schema(out: &mut String, schema: &Schema) {
    let _ = writeln!(out, "schema {} {{", quote(&schema.name));
    encode_attrs(out, 1, &schema.attrs);
    out.push_str("}\n");
}

fn encode_enum(out: &mut String, schema: &Schema, decl: &EnumType) {
    let _ = writeln!(out, "enum {} {{", quote(&decl.name));
    let _ = writeln!(out, "  schema = schema.{}", schema.name);
    let values = decl
        .values
        .iter()
        .map(|value| quote(value))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "  values = [{values}]");
    out.push_str("}\n");
}

fn encode_view(out: &mut String, schema: &Schema, view: &View) {
    let _ = writeln!(out, "view {} {{", quote(&view.name));
    let _ = writeln!(out, "  schema = schema.{}", schema.name);
    let _ = writeln!(out, "  as = {}", quote(&view.def));
    encode_attrs(out, 1, &view.attrs);
    out.push_str("}\n");
}

fn encode_table(out: &mut String, schema: &Schema, table: &Table) {
    let _ = writeln!(out, "table {} {{", quote(&table.name));
    let _ = writeln!(out, "  schema = schema.{}", schema.name);
    encode_attrs(out, 1, &table.attrs);

    for column in &table.columns {
        encode_column(out, column);
    }
    if let Some(pk) = &table.primary_key {
        out.push_str("  primary_key {\n");
        encode_part_columns(out, table, pk);
        out.push_str("  }\n");
    }
    for index in &table.indexes {
        encode_index(out, table, index);
    }
    for fk in &table.foreign_keys {
        encode_foreign_key(out, table, fk);
    }
    for check in &table.checks {
        encode_check(out, check);
    }
    for trigger in &table.triggers {
        encode_trigger(out, trigger);
    }
    out.push_str("}\n");
}

fn encode_column(out: &mut String, column: &Column) {
    let _ = writeln!(out, "  column {} {{", quote(&column.name));
    let _ = writeln!(out, "    type = {}", encode_type(column));
    let _ = writeln!(out, "    null = {}", column.null);
    if let Some(default) = &column.default {
        let _ = writeln!(out, "    default = {}", encode_expr(default));
    }
    if let Some(generated) = &column.generated {
        out.push_str("    as {\n");
        let _ = writeln!(out, "      expr = {}", quote(&generated.expr));
        let kind = match generated.kind {
            drift_core::GeneratedKind::Stored => "STORED",
            drift_core::GeneratedKind::Virtual => "VIRTUAL",
        };
        let _ = writeln!(out, "      type = {kind}");
        out.push_str("    }\n");
    }
    for attr in &column.attrs {
        if let Attr::Identity { seed, increment } = attr {
            out.push_str("    identity {\n");
            let _ = writeln!(out, "      seed = {seed}");
            let _ = writeln!(out, "      increment = {increment}");
            out.push_str("    }\n");
            continue;
        }
        encode_attr(out, 2, attr);
    }
    out.push_str("  }\n");
}

fn encode_type(column: &Column) -> String {
    match &column.ty.kind {
        TypeKind::Enum { .. } => format!("enum.{}", column.ty.raw),
        _ => column.ty.raw.clone(),
    }
}

fn encode_index(out: &mut String, table: &Table, index: &Index) {
    let _ = writeln!(out, "  index {} {{", quote(&index.name));
    if index.unique {
        out.push_str("    unique = true\n");
    }
    encode_part_columns(out, table, index);
    if let Some(predicate) = &index.predicate {
        let _ = writeln!(out, "    where = {}", quote(&raw_of(predicate)));
    }
    for attr in &index.attrs {
        match attr {
            Attr::Include(columns) => {
                let refs = columns
                    .iter()
                    .map(|column| format!("column.{}.{column}", table.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(out, "    include = [{refs}]");
            }
            Attr::IndexType(method) => {
                let _ = writeln!(out, "    type = {method}");
            }
            Attr::Concurrently => out.push_str("    concurrently = true\n"),
            other => encode_attr(out, 2, other),
        }
    }
    out.push_str("  }\n");
}

/// Simple column lists encode as `columns = [...]`; parts with directions,
/// prefixes, or expressions fall back to `on` blocks.
fn encode_part_columns(out: &mut String, table: &Table, index: &Index) {
    let simple = index
        .parts
        .iter()
        .all(|part| {
            matches!(part.kind, IndexPartKind::Column(_)) && !part.desc && part.prefix_len.is_none()
        });

    if simple {
        if index.parts.is_empty() {
            return;
        }
        let refs = index
            .parts
            .iter()
            .filter_map(|part| match &part.kind {
                IndexPartKind::Column(name) => {
                    Some(format!("column.{}.{name}", table.name))
                }
                IndexPartKind::Expr(_) => None,
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "    columns = [{refs}]");
        return;
    }

    for part in &index.parts {
        out.push_str("    on {\n");
        match &part.kind {
            IndexPartKind::Column(name) => {
                let _ = writeln!(out, "      column = column.{}.{name}", table.name);
            }
            IndexPartKind::Expr(expr) => {
                let _ = writeln!(out, "      expr = {}", quote(&raw_of(expr)));
            }
        }
        if part.desc {
            out.push_str("      desc = true\n");
        }
        if let Some(prefix) = part.prefix_len {
            let _ = writeln!(out, "      prefix = {prefix}");
        }
        out.push_str("    }\n");
    }
}

fn encode_foreign_key(out: &mut String, table: &Table, fk: &ForeignKey) {
    let _ = writeln!(out, "  foreign_key {} {{", quote(&fk.symbol));
    let columns = fk
        .columns
        .iter()
        .map(|column| format!("column.{}.{column}", table.name))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "    columns = [{columns}]");
    let ref_columns = fk
        .ref_columns
        .iter()
        .map(|column| format!("column.{}.{column}", fk.ref_table.name))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "    ref_columns = [{ref_columns}]");
    if fk.on_update != RefAction::NoAction {
        let _ = writeln!(out, "    on_update = {}", action_keyword(fk.on_update));
    }
    if fk.on_delete != RefAction::NoAction {
        let _ = writeln!(out, "    on_delete = {}", action_keyword(fk.on_delete));
    }
    out.push_str("  }\n");
}

fn encode_check(out: &mut String, check: &Check) {
    let _ = writeln!(out, "  check {} {{", quote(&check.name));
    let _ = writeln!(out, "    expr = {}", quote(&check.expr));
    out.push_str("  }\n");
}

fn encode_trigger(out: &mut String, trigger: &Trigger) {
    let _ = writeln!(out, "  trigger {} {{", quote(&trigger.name));
    let timing = match trigger.timing {
        TriggerTiming::Before => "BEFORE",
        TriggerTiming::After => "AFTER",
    };
    let _ = writeln!(out, "    timing = {timing}");
    let events = trigger
        .events
        .iter()
        .map(|event| match event {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        })
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "    events = [{events}]");
    if !trigger.for_each_row {
        out.push_str("    for_each_row = false\n");
    }
    let _ = writeln!(out, "    body = {}", quote(&trigger.body));
    out.push_str("  }\n");
}

fn encode_attrs(out: &mut String, depth: usize, attrs: &[Attr]) {
    for attr in attrs {
        encode_attr(out, depth, attr);
    }
}

fn encode_attr(out: &mut String, depth: usize, attr: &Attr) {
    let indent = "  ".repeat(depth);
    let line = match attr {
        Attr::Charset(value) => format!("charset = {}", quote(value)),
        Attr::Collation(value) => format!("collate = {}", quote(value)),
        Attr::Comment(value) => format!("comment = {}", quote(value)),
        Attr::Engine(value) => format!("engine = {}", quote(value)),
        Attr::AutoIncrement(value) => format!("auto_increment = {value}"),
        Attr::WithoutRowid => "without_rowid = true".to_string(),
        Attr::Concurrently => "concurrently = true".to_string(),
        Attr::IndexType(method) => format!("type = {method}"),
        Attr::Identity { seed, increment } => {
            format!("identity = [{seed}, {increment}]")
        }
        Attr::Include(columns) => format!("include = [{}]", columns.join(", ")),
        Attr::Unknown { key, value } => format!("{key} = {}", encode_value(value)),
    };
    let _ = writeln!(out, "{indent}{line}");
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::Literal(Literal::String(text)) => quote(text),
        other => other.to_string(),
    }
}

fn encode_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(Literal::String(text)) => quote(text),
        Expr::Literal(Literal::Int(value)) => value.to_string(),
        Expr::Literal(Literal::Float(value)) => value.to_string(),
        Expr::Literal(Literal::Bool(value)) => value.to_string(),
        Expr::Raw(raw) => format!("sql({})", quote(raw)),
    }
}

fn raw_of(expr: &Expr) -> String {
    match expr {
        Expr::Raw(raw) => raw.clone(),
        other => other.normalized(),
    }
}

fn action_keyword(action: RefAction) -> &'static str {
    match action {
        RefAction::NoAction => "NO_ACTION",
        RefAction::Restrict => "RESTRICT",
        RefAction::Cascade => "CASCADE",
        RefAction::SetNull => "SET_NULL",
        RefAction::SetDefault => "SET_DEFAULT",
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
