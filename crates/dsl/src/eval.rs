use std::collections::BTreeSet;

use drift_core::{
    Attr, Attribute, Check, Column, ColumnType, Dialect, EnumType, Expr, FilePos, ForeignKey, Func,
    Generated, GeneratedKind, Index, IndexPart, IndexPartKind, LoadError, Pos, Proc, Realm,
    RefAction, RefValue, Resource, Result, Schema, Table, TableRef, Trigger, TriggerEvent,
    TriggerTiming, TypeCall, TypeKind, Value, View,
};

use crate::parser::parse_document;

/// Attribute keys consumed structurally per block kind; everything else goes
/// through the override map into typed or opaque attributes.
const COLUMN_STRUCTURAL_KEYS: &[&str] = &["type", "null", "default", "unsigned"];
const TABLE_STRUCTURAL_KEYS: &[&str] = &["schema"];

/// Decodes a declarative document into a realm under the given dialect.
///
/// The evaluation runs in two passes: reference synthesis first (schema,
/// table, and column symbols), then a typed decode that resolves `type`
/// constructors through the dialect and applies its attribute overrides.
pub fn load_realm(source: &str, file: &str, dialect: &Dialect) -> Result<Realm> {
    let document = parse_document(source, file)?;
    let symbols = collect_symbols(&document);
    decode_document(&document, file, dialect, &symbols)
}

/// Pass 1: shallow walk discovering the named resources a document declares.
#[derive(Debug, Default)]
pub(crate) struct Symbols {
    paths: BTreeSet<String>,
}

impl Symbols {
    fn insert(&mut self, path: String) {
        self.paths.insert(path);
    }

    fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

fn collect_symbols(document: &Resource) -> Symbols {
    let mut symbols = Symbols::default();
    for block in &document.children {
        let Some(name) = &block.name else {
            continue;
        };
        match block.kind.as_str() {
            "schema" => symbols.insert(format!("schema.{name}")),
            "enum" => symbols.insert(format!("enum.{name}")),
            "table" => {
                symbols.insert(format!("table.{name}"));
                for child in &block.children {
                    if child.kind == "column"
                        && let Some(column) = &child.name
                    {
                        symbols.insert(format!("column.{name}.{column}"));
                    }
                }
            }
            _ => {}
        }
    }
    symbols
}

struct Decoder<'a> {
    file: &'a str,
    dialect: &'a Dialect,
    symbols: &'a Symbols,
}

fn decode_document(
    document: &Resource,
    file: &str,
    dialect: &Dialect,
    symbols: &Symbols,
) -> Result<Realm> {
    let decoder = Decoder {
        file,
        dialect,
        symbols,
    };
    let mut realm = Realm::new();

    for block in &document.children {
        if !matches!(
            block.kind.as_str(),
            "schema" | "table" | "enum" | "view" | "function" | "procedure"
        ) {
            return Err(decoder.syntax_error(
                block.pos,
                format!("unknown top-level block `{}`", block.kind),
            ));
        }
    }

    for block in &document.children {
        if block.kind == "schema" {
            realm.add_schema(decoder.decode_schema(block)?);
        }
    }
    for block in &document.children {
        match block.kind.as_str() {
            "enum" => {
                let (schema, decl) = decoder.decode_enum(block)?;
                decoder.schema_mut(&mut realm, &schema, block)?.add_enum(decl);
            }
            "function" => {
                let (schema, func) = decoder.decode_func(block)?;
                decoder.schema_mut(&mut realm, &schema, block)?.add_func(func);
            }
            "procedure" => {
                let (schema, proc) = decoder.decode_proc(block)?;
                decoder.schema_mut(&mut realm, &schema, block)?.add_proc(proc);
            }
            _ => {}
        }
    }
    for block in &document.children {
        if block.kind == "table" {
            let (schema, table) = decoder.decode_table(block, &realm)?;
            decoder.schema_mut(&mut realm, &schema, block)?.add_table(table);
        }
    }
    for block in &document.children {
        if block.kind == "view" {
            let (schema, view) = decoder.decode_view(block)?;
            decoder.schema_mut(&mut realm, &schema, block)?.add_view(view);
        }
    }

    Ok(realm)
}

impl Decoder<'_> {
    fn decode_schema(&self, block: &Resource) -> Result<Schema> {
        let name = self.block_name(block)?;
        let mut schema = Schema::new(name);
        self.apply_attrs(block, &[], &mut schema.attrs)?;
        Ok(schema)
    }

    fn decode_enum(&self, block: &Resource) -> Result<(String, EnumType)> {
        let name = self.block_name(block)?;
        let schema = self.schema_ref(block)?;
        let values_attr = self.require_attr(block, "values")?;
        let values = values_attr
            .value
            .list_of(|value| value.as_str().map(str::to_string))
            .map_err(|source| self.attr_error(values_attr, source))?;
        Ok((schema, EnumType::new(name, values)))
    }

    fn decode_func(&self, block: &Resource) -> Result<(String, Func)> {
        let name = self.block_name(block)?;
        let schema = self.schema_ref(block)?;
        let def = self.string_attr(block, "as")?.unwrap_or_default();
        Ok((
            schema,
            Func {
                name: name.to_string(),
                schema: String::new(),
                def,
            },
        ))
    }

    fn decode_proc(&self, block: &Resource) -> Result<(String, Proc)> {
        let name = self.block_name(block)?;
        let schema = self.schema_ref(block)?;
        let def = self.string_attr(block, "as")?.unwrap_or_default();
        Ok((
            schema,
            Proc {
                name: name.to_string(),
                schema: String::new(),
                def,
            },
        ))
    }

    fn decode_view(&self, block: &Resource) -> Result<(String, View)> {
        let name = self.block_name(block)?;
        let schema = self.schema_ref(block)?;
        let def = self.require_string(block, "as")?;
        let mut view = View::new(name, def);
        self.apply_attrs(block, &["schema", "as"], &mut view.attrs)?;
        Ok((schema, view))
    }

    fn decode_table(&self, block: &Resource, realm: &Realm) -> Result<(String, Table)> {
        let name = self.block_name(block)?;
        let schema = self.schema_ref(block)?;
        let mut table = Table::new(name);

        for child in &block.children {
            match child.kind.as_str() {
                "column" => {
                    let column = self.decode_column(child, &schema, realm)?;
                    table.add_column(column);
                }
                "primary_key" => {
                    let pk = self.decode_primary_key(child, name)?;
                    table.set_primary_key(pk);
                }
                "index" => {
                    let index = self.decode_index(child, name)?;
                    table.add_index(index);
                }
                "foreign_key" => {
                    let fk = self.decode_foreign_key(child, &schema, name, realm)?;
                    table.add_foreign_key(fk);
                }
                "check" => {
                    let check = self.decode_check(child)?;
                    table.add_check(check);
                }
                "trigger" => {
                    let trigger = self.decode_trigger(child)?;
                    table.add_trigger(trigger);
                }
                other => {
                    return Err(self.syntax_error(
                        child.pos,
                        format!("unknown block `{other}` in table {name:?}"),
                    ));
                }
            }
        }

        self.apply_attrs(block, TABLE_STRUCTURAL_KEYS, &mut table.attrs)?;
        Ok((schema, table))
    }

    fn decode_column(&self, block: &Resource, schema: &str, realm: &Realm) -> Result<Column> {
        let name = self.block_name(block)?;
        let type_attr = self
            .require_attr(block, "type")
            .map_err(|_| self.syntax_error(block.pos, format!("column {name:?} has no type")))?;

        let unsigned = match block.attr("unsigned") {
            Some(attr) => attr
                .value
                .as_bool()
                .map_err(|source| self.attr_error(attr, source))?,
            None => false,
        };
        let ty = self.resolve_type(type_attr, schema, realm, unsigned)?;
        let mut column = Column::new(name, ty);

        if let Some(attr) = block.attr("null") {
            column.null = attr
                .value
                .as_bool()
                .map_err(|source| self.attr_error(attr, source))?;
        }
        if let Some(attr) = block.attr("default") {
            column.default = Some(self.decode_expr(attr)?);
        }
        for child in &block.children {
            match child.kind.as_str() {
                "as" => {
                    column.generated = Some(self.decode_generated(child)?);
                }
                "identity" => {
                    let seed = self.int_attr(child, "seed")?.unwrap_or(1);
                    let increment = self.int_attr(child, "increment")?.unwrap_or(1);
                    column.set_attr(Attr::Identity { seed, increment });
                }
                other => {
                    return Err(self.syntax_error(
                        child.pos,
                        format!("unknown block `{other}` in column {name:?}"),
                    ));
                }
            }
        }

        self.apply_attrs(block, COLUMN_STRUCTURAL_KEYS, &mut column.attrs)?;
        Ok(column)
    }

    fn decode_generated(&self, block: &Resource) -> Result<Generated> {
        let expr = self.require_string(block, "expr")?;
        let kind = match block.attr("type") {
            Some(attr) => match self.keyword_of(attr)?.to_ascii_uppercase().as_str() {
                "STORED" => GeneratedKind::Stored,
                "VIRTUAL" => GeneratedKind::Virtual,
                other => {
                    return Err(self.syntax_error(
                        attr.pos,
                        format!("unknown generation kind `{other}`"),
                    ));
                }
            },
            None => GeneratedKind::Virtual,
        };
        Ok(Generated { expr, kind })
    }

    fn decode_primary_key(&self, block: &Resource, table: &str) -> Result<Index> {
        let mut pk = Index::new("");
        pk.unique = true;
        pk.parts = self.column_ref_parts(block, table)?;
        Ok(pk)
    }

    fn decode_index(&self, block: &Resource, table: &str) -> Result<Index> {
        let name = self.block_name(block)?;
        let mut index = Index::new(name);

        if let Some(attr) = block.attr("unique") {
            index.unique = attr
                .value
                .as_bool()
                .map_err(|source| self.attr_error(attr, source))?;
        }
        index.parts = self.column_ref_parts(block, table)?;
        for child in &block.children {
            if child.kind != "on" {
                return Err(self.syntax_error(
                    child.pos,
                    format!("unknown block `{}` in index {name:?}", child.kind),
                ));
            }
            index.parts.push(self.decode_index_part(child, table)?);
        }
        if let Some(attr) = block.attr("where") {
            let predicate = attr
                .value
                .as_str()
                .map_err(|source| self.attr_error(attr, source))?;
            index.predicate = Some(Expr::raw(predicate));
        }
        if let Some(attr) = block.attr("include") {
            let include = attr
                .value
                .list_of(|value| {
                    value
                        .as_ref_value()
                        .map(|reference| self.ref_leaf(reference))
                })
                .map_err(|source| self.attr_error(attr, source))?;
            index.set_attr(Attr::Include(include));
        }
        if let Some(attr) = block.attr("type") {
            index.set_attr(Attr::IndexType(self.keyword_of(attr)?));
        }
        if let Some(attr) = block.attr("concurrently")
            && attr
                .value
                .as_bool()
                .map_err(|source| self.attr_error(attr, source))?
        {
            index.set_attr(Attr::Concurrently);
        }
        self.apply_attrs(block, &["type"], &mut index.attrs)?;
        Ok(index)
    }

    fn decode_index_part(&self, block: &Resource, table: &str) -> Result<IndexPart> {
        let mut part = if let Some(attr) = block.attr("column") {
            let reference = attr
                .value
                .as_ref_value()
                .map_err(|source| self.attr_error(attr, source))?;
            self.check_column_ref(reference, table, attr)?;
            IndexPart::column(self.ref_leaf(reference))
        } else if let Some(attr) = block.attr("expr") {
            let expr = attr
                .value
                .as_str()
                .map_err(|source| self.attr_error(attr, source))?;
            IndexPart::expr(expr)
        } else {
            return Err(self.syntax_error(
                block.pos,
                "index part needs a `column` or `expr` attribute".to_string(),
            ));
        };

        if let Some(attr) = block.attr("desc") {
            part.desc = attr
                .value
                .as_bool()
                .map_err(|source| self.attr_error(attr, source))?;
        }
        if let Some(attr) = block.attr("prefix") {
            let prefix = attr
                .value
                .as_i64()
                .map_err(|source| self.attr_error(attr, source))?;
            part.prefix_len = u32::try_from(prefix).ok();
        }
        Ok(part)
    }

    fn decode_foreign_key(
        &self,
        block: &Resource,
        schema: &str,
        table: &str,
        realm: &Realm,
    ) -> Result<ForeignKey> {
        let symbol = self.block_name(block)?;
        let columns_attr = self.require_attr(block, "columns")?;
        let columns = self.column_refs(columns_attr, table)?;

        let ref_attr = self.require_attr(block, "ref_columns")?;
        let ref_refs = ref_attr
            .value
            .list_of(|value| value.as_ref_value().cloned())
            .map_err(|source| self.attr_error(ref_attr, source))?;
        let Some(first) = ref_refs.first() else {
            return Err(self.syntax_error(
                ref_attr.pos,
                format!("foreign key {symbol:?} has no referenced columns"),
            ));
        };
        let ref_table_name = self.ref_table_of(first, ref_attr)?;
        let ref_schema = realm
            .schemas
            .iter()
            .find(|candidate| candidate.table(&ref_table_name).is_some())
            .map(|candidate| candidate.name.clone())
            .unwrap_or_else(|| schema.to_string());

        let mut fk = ForeignKey::new(symbol, TableRef::new(ref_schema, ref_table_name));
        fk.columns = columns;
        fk.ref_columns = ref_refs
            .iter()
            .map(|reference| self.ref_leaf(reference))
            .collect();

        if let Some(attr) = block.attr("on_update") {
            fk.on_update = self.decode_ref_action(attr)?;
        }
        if let Some(attr) = block.attr("on_delete") {
            fk.on_delete = self.decode_ref_action(attr)?;
        }
        Ok(fk)
    }

    fn decode_check(&self, block: &Resource) -> Result<Check> {
        let name = self.block_name(block)?;
        let expr = self.require_string(block, "expr")?;
        Ok(Check::new(name, expr))
    }

    fn decode_trigger(&self, block: &Resource) -> Result<Trigger> {
        let name = self.block_name(block)?;
        let timing_attr = self.require_attr(block, "timing")?;
        let timing = match self.keyword_of(timing_attr)?.to_ascii_uppercase().as_str() {
            "BEFORE" => TriggerTiming::Before,
            "AFTER" => TriggerTiming::After,
            other => {
                return Err(self.syntax_error(
                    timing_attr.pos,
                    format!("unknown trigger timing `{other}`"),
                ));
            }
        };

        let events_attr = self.require_attr(block, "events")?;
        let events = events_attr
            .value
            .as_list()
            .map_err(|source| self.attr_error(events_attr, source))?
            .iter()
            .map(|value| {
                let keyword = match value {
                    Value::Ref(reference) => reference.to_string(),
                    other => other
                        .as_str()
                        .map_err(|source| {
                            drift_core::Error::from(self.attr_error(events_attr, source))
                        })?
                        .to_string(),
                };
                match keyword.to_ascii_uppercase().as_str() {
                    "INSERT" => Ok(TriggerEvent::Insert),
                    "UPDATE" => Ok(TriggerEvent::Update),
                    "DELETE" => Ok(TriggerEvent::Delete),
                    other => Err(self
                        .syntax_error(
                            events_attr.pos,
                            format!("unknown trigger event `{other}`"),
                        )
                        .into()),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let for_each_row = match block.attr("for_each_row") {
            Some(attr) => attr
                .value
                .as_bool()
                .map_err(|source| self.attr_error(attr, source))?,
            None => true,
        };
        let body = self.require_string(block, "body")?;
        Ok(Trigger {
            name: name.to_string(),
            table: String::new(),
            timing,
            events,
            for_each_row,
            body,
        })
    }

    fn decode_ref_action(&self, attr: &Attribute) -> Result<RefAction> {
        let keyword = self.keyword_of(attr)?;
        RefAction::parse(&keyword).ok_or_else(|| {
            self.syntax_error(attr.pos, format!("unknown referential action `{keyword}`"))
                .into()
        })
    }

    /// Resolves a column `type` attribute: a constructor goes through the
    /// dialect type resolver, an `enum.<name>` reference resolves to the
    /// declared enum's values.
    fn resolve_type(
        &self,
        attr: &Attribute,
        schema: &str,
        realm: &Realm,
        unsigned: bool,
    ) -> Result<ColumnType> {
        let mut resolved = match &attr.value {
            Value::Type(call) => self.dialect.types.resolve(call, self.file_pos(attr.pos))?,
            Value::Ref(reference) if reference.path.first().is_some_and(|kind| kind == "enum") => {
                let enum_name = self.ref_leaf(reference);
                if !self.symbols.contains(&format!("enum.{enum_name}")) {
                    return Err(self.unresolved(reference, attr.pos));
                }
                let values = realm
                    .schema(schema)
                    .and_then(|schema| schema.enum_type(&enum_name))
                    .map(|decl| decl.values.clone())
                    .unwrap_or_default();
                ColumnType::new(TypeKind::Enum { values }, enum_name)
            }
            Value::Ref(reference) if reference.path.len() == 1 => {
                let call = TypeCall::named(reference.path[0].clone());
                self.dialect.types.resolve(&call, self.file_pos(attr.pos))?
            }
            Value::Ref(reference) => return Err(self.unresolved(reference, attr.pos)),
            other => {
                return Err(self
                    .attr_error(
                        attr,
                        drift_core::ValueError::WrongKind {
                            expected: "type",
                            found: other.kind(),
                        },
                    )
                    .into());
            }
        };

        if unsigned {
            match &mut resolved.kind {
                TypeKind::Integer { unsigned, .. } | TypeKind::Decimal { unsigned, .. } => {
                    *unsigned = true;
                }
                _ => {}
            }
            resolved.raw = self.dialect.formatter.format(&resolved)?;
        }
        Ok(resolved)
    }

    fn decode_expr(&self, attr: &Attribute) -> Result<Expr> {
        match &attr.value {
            Value::Literal(literal) => Ok(Expr::Literal(literal.clone())),
            Value::Type(call) if call.name == "sql" => {
                let Some(first) = call.args.first() else {
                    return Err(
                        self.syntax_error(attr.pos, "sql() takes one argument".to_string())
                    );
                };
                let raw = first
                    .as_str()
                    .map_err(|source| self.attr_error(attr, source))?;
                Ok(Expr::raw(raw))
            }
            other => Err(self
                .attr_error(
                    attr,
                    drift_core::ValueError::WrongKind {
                        expected: "literal or sql()",
                        found: other.kind(),
                    },
                )
                .into()),
        }
    }

    /// Canonicalises remaining attribute keys through the dialect override
    /// map, writing known keys as typed attributes and unknown keys as
    /// opaque ones, then fills dialect defaults.
    fn apply_attrs(
        &self,
        block: &Resource,
        structural: &[&str],
        out: &mut Vec<Attr>,
    ) -> Result<()> {
        let handled = ["null", "default", "unique", "where", "include", "concurrently",
            "columns", "ref_columns", "on_update", "on_delete", "expr", "values", "as",
            "timing", "events", "for_each_row", "body", "prefix", "desc", "column", "seed",
            "increment"];
        for attr in &block.attrs {
            if structural.contains(&attr.key.as_str()) || handled.contains(&attr.key.as_str()) {
                continue;
            }
            let key = self.dialect.overrides.canonical(&attr.key).to_string();
            let typed = self.typed_attr(&key, attr)?;
            drift_core::set_attr(out, typed);
        }
        for (key, value) in self.dialect.overrides.defaults_for(&block.kind) {
            if drift_core::get_attr(out, key).is_none() {
                let attribute = Attribute::new(key.clone(), value.clone());
                let typed = self.typed_attr(key, &attribute)?;
                drift_core::set_attr(out, typed);
            }
        }
        Ok(())
    }

    fn typed_attr(&self, key: &str, attr: &Attribute) -> Result<Attr> {
        let as_string = |attr: &Attribute| -> Result<String> {
            Ok(attr
                .value
                .as_str()
                .map_err(|source| self.attr_error(attr, source))?
                .to_string())
        };
        Ok(match key {
            "comment" => Attr::Comment(as_string(attr)?),
            "charset" => Attr::Charset(as_string(attr)?),
            "collate" => Attr::Collation(as_string(attr)?),
            "engine" => Attr::Engine(as_string(attr)?),
            "auto_increment" => {
                let value = attr
                    .value
                    .as_i64()
                    .map_err(|source| self.attr_error(attr, source))?;
                Attr::AutoIncrement(value.max(0) as u64)
            }
            "without_rowid" => Attr::WithoutRowid,
            "type" => Attr::IndexType(self.keyword_of(attr)?),
            _ => Attr::Unknown {
                key: key.to_string(),
                value: attr.value.clone(),
            },
        })
    }

    /// A keyword attribute accepts either a bare identifier or a string.
    fn keyword_of(&self, attr: &Attribute) -> Result<String> {
        match &attr.value {
            Value::Ref(reference) if reference.path.len() == 1 => Ok(reference.path[0].clone()),
            Value::Literal(drift_core::Literal::String(text)) => Ok(text.clone()),
            other => Err(self
                .attr_error(
                    attr,
                    drift_core::ValueError::WrongKind {
                        expected: "keyword",
                        found: other.kind(),
                    },
                )
                .into()),
        }
    }

    fn column_ref_parts(&self, block: &Resource, table: &str) -> Result<Vec<IndexPart>> {
        let Some(attr) = block.attr("columns") else {
            return Ok(Vec::new());
        };
        Ok(self
            .column_refs(attr, table)?
            .into_iter()
            .map(IndexPart::column)
            .collect())
    }

    fn column_refs(&self, attr: &Attribute, table: &str) -> Result<Vec<String>> {
        let references = attr
            .value
            .list_of(|value| value.as_ref_value().cloned())
            .map_err(|source| self.attr_error(attr, source))?;
        references
            .iter()
            .map(|reference| {
                self.check_column_ref(reference, table, attr)?;
                Ok(self.ref_leaf(reference))
            })
            .collect()
    }

    /// `column.<table>.<name>` must resolve against the symbol table;
    /// `column.<name>` is shorthand for a column of the current table.
    fn check_column_ref(
        &self,
        reference: &RefValue,
        table: &str,
        attr: &Attribute,
    ) -> Result<()> {
        match reference.path.as_slice() {
            [kind, name] if kind == "column" => {
                if self.symbols.contains(&format!("column.{table}.{name}")) {
                    return Ok(());
                }
                Err(self.unresolved(reference, attr.pos))
            }
            [kind, _, _] if kind == "column" => {
                if self.symbols.contains(&reference.to_string()) {
                    return Ok(());
                }
                Err(self.unresolved(reference, attr.pos))
            }
            _ => Err(self.unresolved(reference, attr.pos)),
        }
    }

    fn ref_table_of(&self, reference: &RefValue, attr: &Attribute) -> Result<String> {
        match reference.path.as_slice() {
            [kind, table, _] if kind == "column" => {
                if !self.symbols.contains(&reference.to_string()) {
                    return Err(self.unresolved(reference, attr.pos));
                }
                Ok(table.clone())
            }
            _ => Err(self.unresolved(reference, attr.pos)),
        }
    }

    fn ref_leaf(&self, reference: &RefValue) -> String {
        reference.leaf().unwrap_or_default().to_string()
    }

    fn schema_ref(&self, block: &Resource) -> Result<String> {
        let attr = self.require_attr(block, "schema")?;
        let reference = attr
            .value
            .as_ref_value()
            .map_err(|source| self.attr_error(attr, source))?;
        match reference.path.as_slice() {
            [kind, name] if kind == "schema" => {
                if !self.symbols.contains(&format!("schema.{name}")) {
                    return Err(self.unresolved(reference, attr.pos));
                }
                Ok(name.clone())
            }
            _ => Err(self.unresolved(reference, attr.pos)),
        }
    }

    fn schema_mut<'r>(
        &self,
        realm: &'r mut Realm,
        name: &str,
        block: &Resource,
    ) -> Result<&'r mut Schema> {
        if realm.schema(name).is_none() {
            return Err(drift_core::Error::Load(LoadError::UnresolvedRef {
                reference: format!("schema.{name}"),
                pos: block.pos.map(|pos| FilePos::new(self.file, pos)),
            }));
        }
        Ok(realm.schema_mut(name).expect("checked above"))
    }

    fn block_name<'b>(&self, block: &'b Resource) -> Result<&'b str> {
        block.name.as_deref().ok_or_else(|| {
            self.syntax_error(block.pos, format!("{} block has no name label", block.kind))
                .into()
        })
    }

    fn require_attr<'b>(&self, block: &'b Resource, key: &str) -> Result<&'b Attribute> {
        block.attr(key).ok_or_else(|| {
            self.syntax_error(
                block.pos,
                format!("{} block is missing `{key}`", block.kind),
            )
            .into()
        })
    }

    fn require_string(&self, block: &Resource, key: &str) -> Result<String> {
        let attr = self.require_attr(block, key)?;
        Ok(attr
            .value
            .as_str()
            .map_err(|source| self.attr_error(attr, source))?
            .to_string())
    }

    fn string_attr(&self, block: &Resource, key: &str) -> Result<Option<String>> {
        match block.attr(key) {
            Some(attr) => Ok(Some(
                attr.value
                    .as_str()
                    .map_err(|source| self.attr_error(attr, source))?
                    .to_string(),
            )),
            None => Ok(None),
        }
    }

    fn int_attr(&self, block: &Resource, key: &str) -> Result<Option<i64>> {
        match block.attr(key) {
            Some(attr) => Ok(Some(
                attr.value
                    .as_i64()
                    .map_err(|source| self.attr_error(attr, source))?,
            )),
            None => Ok(None),
        }
    }

    fn attr_error(&self, attr: &Attribute, source: drift_core::ValueError) -> LoadError {
        LoadError::Attribute {
            key: attr.key.clone(),
            pos: self.file_pos(attr.pos),
            source,
        }
    }

    fn unresolved(&self, reference: &RefValue, pos: Option<Pos>) -> drift_core::Error {
        drift_core::Error::Load(LoadError::UnresolvedRef {
            reference: reference.to_string(),
            pos: self.file_pos(pos),
        })
    }

    fn syntax_error(&self, pos: Option<Pos>, message: String) -> drift_core::Error {
        drift_core::Error::Load(LoadError::Syntax {
            message,
            pos: self.file_pos(pos),
        })
    }

    fn file_pos(&self, pos: Option<Pos>) -> Option<FilePos> {
        pos.map(|pos| FilePos::new(self.file, pos))
    }
}
