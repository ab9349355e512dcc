use std::fmt;

use crate::{
    DiffError,
    schema::{
        attr::{Attr, comment_of, set_attr},
        types::{ColumnType, Expr, Generated},
    },
};

/// A table reference, possibly crossing schemas (foreign keys may point at a
/// table in another schema).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// The top of the object graph: every schema managed within one connection,
/// plus realm-scoped dialect attributes (e.g. a server default charset).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Realm {
    pub schemas: Vec<Schema>,
    pub attrs: Vec<Attr>,
}

impl Realm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schema(&mut self, schema: Schema) -> &mut Self {
        self.schemas.push(schema);
        self
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|schema| schema.name == name)
    }

    pub fn schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas.iter_mut().find(|schema| schema.name == name)
    }

    /// Walks the graph and fails fast on the first back-reference that does
    /// not point at its actual parent.
    pub fn validate(&self) -> Result<(), DiffError> {
        for schema in &self.schemas {
            schema.validate()?;
        }
        Ok(())
    }
}

/// A named namespace within a realm.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub funcs: Vec<Func>,
    pub procs: Vec<Proc>,
    pub enums: Vec<EnumType>,
    pub attrs: Vec<Attr>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
            views: Vec::new(),
            funcs: Vec::new(),
            procs: Vec::new(),
            enums: Vec::new(),
            attrs: Vec::new(),
        }
    }

    /// Installs the back-reference and takes ownership of the table.
    pub fn add_table(&mut self, mut table: Table) -> &mut Self {
        table.set_schema(&self.name);
        self.tables.push(table);
        self
    }

    pub fn add_view(&mut self, mut view: View) -> &mut Self {
        view.schema = self.name.clone();
        self.views.push(view);
        self
    }

    pub fn add_enum(&mut self, mut decl: EnumType) -> &mut Self {
        decl.schema = self.name.clone();
        self.enums.push(decl);
        self
    }

    pub fn add_func(&mut self, mut func: Func) -> &mut Self {
        func.schema = self.name.clone();
        self.funcs.push(func);
        self
    }

    pub fn add_proc(&mut self, mut proc: Proc) -> &mut Self {
        proc.schema = self.name.clone();
        self.procs.push(proc);
        self
    }

    /// Builder-style variant of [`Schema::add_table`].
    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|table| table.name == name)
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|view| view.name == name)
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enums.iter().find(|decl| decl.name == name)
    }

    fn validate(&self) -> Result<(), DiffError> {
        for table in &self.tables {
            if table.schema != self.name {
                return Err(backref_error(
                    format!("table {}", table.name),
                    &self.name,
                    &table.schema,
                ));
            }
            table.validate()?;
        }
        for view in &self.views {
            if view.schema != self.name {
                return Err(backref_error(
                    format!("view {}", view.name),
                    &self.name,
                    &view.schema,
                ));
            }
        }
        Ok(())
    }
}

/// A table: ordered columns, optional primary key, indexes, foreign keys,
/// checks, triggers, and dialect attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub schema: String,
    pub columns: Vec<Column>,
    pub primary_key: Option<Index>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
    pub checks: Vec<Check>,
    pub triggers: Vec<Trigger>,
    pub attrs: Vec<Attr>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: String::new(),
            columns: Vec::new(),
            primary_key: None,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            checks: Vec::new(),
            triggers: Vec::new(),
            attrs: Vec::new(),
        }
    }

    pub fn add_column(&mut self, mut column: Column) -> &mut Self {
        column.table = self.name.clone();
        self.columns.push(column);
        self
    }

    pub fn add_index(&mut self, mut index: Index) -> &mut Self {
        index.table = self.name.clone();
        self.indexes.push(index);
        self
    }

    pub fn add_foreign_key(&mut self, mut fk: ForeignKey) -> &mut Self {
        fk.table = self.name.clone();
        self.foreign_keys.push(fk);
        self
    }

    pub fn add_check(&mut self, check: Check) -> &mut Self {
        self.checks.push(check);
        self
    }

    pub fn add_trigger(&mut self, mut trigger: Trigger) -> &mut Self {
        trigger.table = self.name.clone();
        self.triggers.push(trigger);
        self
    }

    pub fn set_primary_key(&mut self, mut pk: Index) -> &mut Self {
        pk.table = self.name.clone();
        pk.unique = true;
        self.primary_key = Some(pk);
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        self.add_column(column);
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: Index) -> Self {
        self.add_index(index);
        self
    }

    #[must_use]
    pub fn with_primary_key(mut self, pk: Index) -> Self {
        self.set_primary_key(pk);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name == name)
    }

    pub fn foreign_key(&self, symbol: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.symbol == symbol)
    }

    pub fn check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|check| check.name == name)
    }

    pub fn comment(&self) -> Option<&str> {
        comment_of(&self.attrs)
    }

    pub fn set_attr(&mut self, attr: Attr) {
        set_attr(&mut self.attrs, attr);
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.schema.clone(), self.name.clone())
    }

    fn set_schema(&mut self, schema: &str) {
        self.schema = schema.to_string();
    }

    fn validate(&self) -> Result<(), DiffError> {
        let path = |child: &str| format!("{}.{}.{}", self.schema, self.name, child);
        for column in &self.columns {
            if column.table != self.name {
                return Err(backref_error(path(&column.name), &self.name, &column.table));
            }
        }
        for index in self.indexes.iter().chain(self.primary_key.as_ref()) {
            if index.table != self.name {
                return Err(backref_error(path(&index.name), &self.name, &index.table));
            }
            for part in &index.parts {
                if let IndexPartKind::Column(column) = &part.kind
                    && self.column(column).is_none()
                {
                    return Err(DiffError::BackRef {
                        object: path(&index.name),
                        expected: format!("column of {}", self.name),
                        found: column.clone(),
                    });
                }
            }
        }
        for fk in &self.foreign_keys {
            if fk.table != self.name {
                return Err(backref_error(path(&fk.symbol), &self.name, &fk.table));
            }
            for column in &fk.columns {
                if self.column(column).is_none() {
                    return Err(DiffError::BackRef {
                        object: path(&fk.symbol),
                        expected: format!("column of {}", self.name),
                        found: column.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn backref_error(object: String, expected: &str, found: &str) -> DiffError {
    DiffError::BackRef {
        object,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// A single table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub table: String,
    pub null: bool,
    pub ty: ColumnType,
    pub default: Option<Expr>,
    pub generated: Option<Generated>,
    pub attrs: Vec<Attr>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            table: String::new(),
            null: false,
            ty,
            default: None,
            generated: None,
            attrs: Vec::new(),
        }
    }

    #[must_use]
    pub fn nullable(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    pub fn comment(&self) -> Option<&str> {
        comment_of(&self.attrs)
    }

    pub fn set_attr(&mut self, attr: Attr) {
        set_attr(&mut self.attrs, attr);
    }
}

/// One ordered element of an index: a column with direction and optional
/// prefix length, or an opaque expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPart {
    pub kind: IndexPartKind,
    pub desc: bool,
    pub prefix_len: Option<u32>,
}

impl IndexPart {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            kind: IndexPartKind::Column(name.into()),
            desc: false,
            prefix_len: None,
        }
    }

    pub fn expr(expr: impl Into<String>) -> Self {
        Self {
            kind: IndexPartKind::Expr(Expr::Raw(expr.into())),
            desc: false,
            prefix_len: None,
        }
    }

    #[must_use]
    pub fn descending(mut self) -> Self {
        self.desc = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexPartKind {
    Column(String),
    Expr(Expr),
}

/// A secondary index or a primary key (primary keys are indexes whose
/// uniqueness is implied).
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub table: String,
    pub unique: bool,
    pub parts: Vec<IndexPart>,
    pub predicate: Option<Expr>,
    pub attrs: Vec<Attr>,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: String::new(),
            unique: false,
            parts: Vec::new(),
            predicate: None,
            attrs: Vec::new(),
        }
    }

    pub fn on_columns<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::new(name);
        index.parts = columns.into_iter().map(IndexPart::column).collect();
        index
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Names of the column parts, skipping expression parts.
    pub fn column_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match &part.kind {
                IndexPartKind::Column(name) => Some(name.as_str()),
                IndexPartKind::Expr(_) => None,
            })
            .collect()
    }

    pub fn set_attr(&mut self, attr: Attr) {
        set_attr(&mut self.attrs, attr);
    }
}

/// Referential action on delete/update of a referenced row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl RefAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "NO ACTION" | "NO_ACTION" => Some(Self::NoAction),
            "RESTRICT" => Some(Self::Restrict),
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" | "SET_NULL" => Some(Self::SetNull),
            "SET DEFAULT" | "SET_DEFAULT" => Some(Self::SetDefault),
            _ => None,
        }
    }
}

/// A foreign-key constraint. Local and referenced column lists are always
/// the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub symbol: String,
    pub table: String,
    pub columns: Vec<String>,
    pub ref_table: TableRef,
    pub ref_columns: Vec<String>,
    pub on_update: RefAction,
    pub on_delete: RefAction,
}

impl ForeignKey {
    pub fn new(symbol: impl Into<String>, ref_table: TableRef) -> Self {
        Self {
            symbol: symbol.into(),
            table: String::new(),
            columns: Vec::new(),
            ref_table,
            ref_columns: Vec::new(),
            on_update: RefAction::NoAction,
            on_delete: RefAction::NoAction,
        }
    }
}

/// A CHECK constraint with its boolean expression text.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: String,
    pub expr: String,
    pub attrs: Vec<Attr>,
}

impl Check {
    pub fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
            attrs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

/// A trigger attached to a table. The body is carried verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub name: String,
    pub table: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    pub for_each_row: bool,
    pub body: String,
}

/// A first-class enum type (PostgreSQL CREATE TYPE ... AS ENUM).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub schema: String,
    pub values: Vec<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            schema: String::new(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A view over one or more tables; the definition is carried verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub schema: String,
    pub def: String,
    pub attrs: Vec<Attr>,
}

impl View {
    pub fn new(name: impl Into<String>, def: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: String::new(),
            def: def.into(),
            attrs: Vec::new(),
        }
    }
}

/// A stored function, matched and replaced by definition text.
#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub name: String,
    pub schema: String,
    pub def: String,
}

/// A stored procedure, matched and replaced by definition text.
#[derive(Debug, Clone, PartialEq)]
pub struct Proc {
    pub name: String,
    pub schema: String,
    pub def: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::TypeKind;

    fn int_type() -> ColumnType {
        ColumnType::new(
            TypeKind::Integer {
                size: crate::schema::types::IntSize::Standard,
                unsigned: false,
            },
            "int",
        )
    }

    #[test]
    fn add_column_installs_back_reference() {
        let mut table = Table::new("users");
        table.add_column(Column::new("id", int_type()));
        let mut schema = Schema::new("public");
        schema.add_table(table);

        let table = schema.table("users").unwrap();
        assert_eq!(table.schema, "public");
        assert_eq!(table.column("id").unwrap().table, "users");
    }

    #[test]
    fn validate_rejects_foreign_column_pointer() {
        let mut table = Table::new("users");
        table.add_column(Column::new("id", int_type()));
        table.columns[0].table = "orders".to_string();
        let mut realm = Realm::new();
        let mut schema = Schema::new("public");
        schema.tables.push({
            let mut table = table;
            table.schema = "public".to_string();
            table
        });
        realm.add_schema(schema);

        assert!(matches!(
            realm.validate(),
            Err(DiffError::BackRef { .. })
        ));
    }

    #[test]
    fn index_parts_must_name_local_columns() {
        let mut table = Table::new("users");
        table.add_column(Column::new("id", int_type()));
        table.add_index(Index::on_columns("users_email", ["email"]));
        table.schema = "public".to_string();
        let mut realm = Realm::new();
        let mut schema = Schema::new("public");
        schema.tables.push(table);
        realm.add_schema(schema);

        assert!(realm.validate().is_err());
    }
}
