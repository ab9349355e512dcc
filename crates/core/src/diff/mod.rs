mod rename;
mod table;

pub use rename::{column_fingerprint, table_fingerprint};

use std::{
    collections::BTreeSet,
    sync::Arc,
};

use crate::{
    Result,
    change::{Change, Object},
    error::DiffError,
    ordering::sort_changes,
    schema::{Attr, ColumnType, Expr, Realm, Schema, Table},
};

/// Dialect hook refining structural equality. The default compares resolved
/// type kinds and textually normalised expressions; dialects override for
/// server-specific spellings (e.g. MySQL `INT` vs `INT(11)`).
pub trait EquivalencePolicy: Send + Sync {
    fn types_equal(&self, left: &ColumnType, right: &ColumnType) -> bool {
        left.kind == right.kind
    }

    fn defaults_equal(&self, left: &Expr, right: &Expr) -> bool {
        left.normalized() == right.normalized()
    }

    fn exprs_equal(&self, left: &str, right: &str) -> bool {
        Expr::raw(left).normalized() == Expr::raw(right).normalized()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEquivalencePolicy;

impl EquivalencePolicy for DefaultEquivalencePolicy {}

pub static DEFAULT_EQUIVALENCE_POLICY: DefaultEquivalencePolicy = DefaultEquivalencePolicy;

/// Side-information recovered from raw statements by the dialect statement
/// parsers. Hints are authoritative: a hinted pair is collapsed into a
/// rename even when fingerprints alone would not justify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameHint {
    Table {
        schema: String,
        from: String,
        to: String,
    },
    Column {
        schema: String,
        table: String,
        from: String,
        to: String,
    },
}

#[derive(Clone)]
pub struct DiffOptions {
    /// Collapse add/drop pairs with identical structural fingerprints into
    /// renames even without parser hints. Off by default: without hints the
    /// engine does not infer renames.
    pub detect_renames: bool,
    pub hints: Vec<RenameHint>,
    pub policy: Arc<dyn EquivalencePolicy>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            detect_renames: false,
            hints: Vec::new(),
            policy: Arc::new(DefaultEquivalencePolicy),
        }
    }
}

impl DiffOptions {
    #[must_use]
    pub fn with_hints(mut self, hints: Vec<RenameHint>) -> Self {
        self.hints = hints;
        self
    }
}

/// Structural differ over realms, schemas, and tables. Inputs are treated
/// as immutable snapshots; back-reference violations fail fast.
#[derive(Default)]
pub struct Differ {
    opts: DiffOptions,
}

impl Differ {
    #[must_use]
    pub fn new(opts: DiffOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.opts
    }

    /// Ordered change stream transforming `from` into `to`.
    pub fn realm_diff(&self, from: &Realm, to: &Realm) -> Result<Vec<Change>> {
        from.validate()?;
        to.validate()?;

        let mut changes = Vec::new();
        diff_attrs(&from.attrs, &to.attrs, &mut changes);

        for to_schema in &to.schemas {
            match from.schema(&to_schema.name) {
                Some(from_schema) => self.schema_changes(from_schema, to_schema, &mut changes)?,
                None => {
                    changes.push(Change::AddSchema {
                        schema: to_schema.clone(),
                    });
                    emit_schema_contents(to_schema, &mut changes);
                }
            }
        }
        for from_schema in &from.schemas {
            if to.schema(&from_schema.name).is_none() {
                changes.push(Change::DropSchema {
                    schema: from_schema.clone(),
                });
            }
        }

        Ok(sort_changes(changes))
    }

    pub fn schema_diff(&self, from: &Schema, to: &Schema) -> Result<Vec<Change>> {
        let mut changes = Vec::new();
        self.schema_changes(from, to, &mut changes)?;
        Ok(sort_changes(changes))
    }

    pub fn table_diff(&self, from: &Table, to: &Table) -> Result<Vec<Change>> {
        let mut changes = Vec::new();
        table::table_changes(&self.opts, from, to, &mut changes)?;
        Ok(sort_changes(changes))
    }

    fn schema_changes(
        &self,
        from: &Schema,
        to: &Schema,
        changes: &mut Vec<Change>,
    ) -> Result<()> {
        let mut attr_changes = Vec::new();
        diff_attrs(&from.attrs, &to.attrs, &mut attr_changes);
        if !attr_changes.is_empty() {
            changes.push(Change::ModifySchema {
                schema: to.name.clone(),
                changes: attr_changes,
            });
        }

        self.diff_tables(from, to, changes)?;
        diff_views(&self.opts, from, to, changes);
        diff_objects(from, to, changes);
        Ok(())
    }

    fn diff_tables(&self, from: &Schema, to: &Schema, changes: &mut Vec<Change>) -> Result<()> {
        let mut matched = BTreeSet::new();
        let mut pending = Vec::new();

        for to_table in &to.tables {
            if let Some(from_table) = from.table(&to_table.name) {
                matched.insert(from_table.name.clone());
                table::table_changes(&self.opts, from_table, to_table, changes)?;
                continue;
            }

            if let Some(from_name) = self.table_rename_hint(&to.name, &to_table.name)
                && let Some(from_table) = from.table(&from_name)
                && !matched.contains(&from_table.name)
                && to.table(&from_table.name).is_none()
            {
                matched.insert(from_table.name.clone());
                changes.push(Change::RenameTable {
                    from: from_table.table_ref(),
                    to: to_table.table_ref(),
                });
                table::table_changes(&self.opts, from_table, to_table, changes)?;
                continue;
            }

            pending.push(to_table);
        }

        for to_table in pending {
            if self.opts.detect_renames {
                let fingerprint = table_fingerprint(to_table);
                let candidates = from
                    .tables
                    .iter()
                    .filter(|from_table| {
                        !matched.contains(&from_table.name)
                            && to.table(&from_table.name).is_none()
                            && table_fingerprint(from_table) == fingerprint
                    })
                    .collect::<Vec<_>>();

                match candidates.as_slice() {
                    [] => {}
                    [from_table] => {
                        matched.insert(from_table.name.clone());
                        changes.push(Change::RenameTable {
                            from: from_table.table_ref(),
                            to: to_table.table_ref(),
                        });
                        table::table_changes(&self.opts, from_table, to_table, changes)?;
                        continue;
                    }
                    many => {
                        return Err(DiffError::AmbiguousChange {
                            object: format!("{}.{}", to.name, to_table.name),
                            candidates: many
                                .iter()
                                .map(|table| table.name.clone())
                                .collect(),
                        }
                        .into());
                    }
                }
            }

            emit_add_table(to_table, changes);
        }

        for from_table in &from.tables {
            if !matched.contains(&from_table.name) && to.table(&from_table.name).is_none() {
                changes.push(Change::DropTable {
                    table: from_table.clone(),
                });
            }
        }

        Ok(())
    }

    fn table_rename_hint(&self, schema: &str, to_table: &str) -> Option<String> {
        self.opts.hints.iter().find_map(|hint| match hint {
            RenameHint::Table {
                schema: hint_schema,
                from,
                to,
            } if hint_schema == schema && to == to_table => Some(from.clone()),
            _ => None,
        })
    }
}

/// A new table arrives as AddTable (columns, primary key, checks) plus
/// separate index/foreign-key/trigger additions, so ordering can run the
/// two-pass create-tables-then-add-keys sequence.
fn emit_add_table(table: &Table, changes: &mut Vec<Change>) {
    changes.push(Change::AddTable {
        table: table.clone(),
    });
    let table_ref = table.table_ref();
    for index in &table.indexes {
        changes.push(Change::AddIndex {
            table: table_ref.clone(),
            index: index.clone(),
        });
    }
    for fk in &table.foreign_keys {
        changes.push(Change::AddForeignKey {
            table: table_ref.clone(),
            fk: fk.clone(),
        });
    }
    for trigger in &table.triggers {
        changes.push(Change::AddTrigger {
            table: table_ref.clone(),
            trigger: trigger.clone(),
        });
    }
}

fn emit_schema_contents(schema: &Schema, changes: &mut Vec<Change>) {
    for decl in &schema.enums {
        changes.push(Change::AddObject {
            schema: schema.name.clone(),
            object: Object::Enum(decl.clone()),
        });
    }
    for func in &schema.funcs {
        changes.push(Change::AddObject {
            schema: schema.name.clone(),
            object: Object::Func(func.clone()),
        });
    }
    for proc in &schema.procs {
        changes.push(Change::AddObject {
            schema: schema.name.clone(),
            object: Object::Proc(proc.clone()),
        });
    }
    for table in &schema.tables {
        emit_add_table(table, changes);
    }
    for view in &schema.views {
        changes.push(Change::AddView { view: view.clone() });
    }
}

/// Attribute-list diff shared by realms, schemas, and tables.
pub(crate) fn diff_attrs(from: &[Attr], to: &[Attr], changes: &mut Vec<Change>) {
    for to_attr in to {
        match from.iter().find(|attr| attr.key() == to_attr.key()) {
            Some(from_attr) if from_attr != to_attr => changes.push(Change::ModifyAttr {
                from: from_attr.clone(),
                to: to_attr.clone(),
            }),
            Some(_) => {}
            None => changes.push(Change::AddAttr {
                attr: to_attr.clone(),
            }),
        }
    }
    for from_attr in from {
        if !to.iter().any(|attr| attr.key() == from_attr.key()) {
            changes.push(Change::DropAttr {
                attr: from_attr.clone(),
            });
        }
    }
}

fn diff_views(opts: &DiffOptions, from: &Schema, to: &Schema, changes: &mut Vec<Change>) {
    for to_view in &to.views {
        match from.view(&to_view.name) {
            Some(from_view) => {
                if !opts.policy.exprs_equal(&from_view.def, &to_view.def)
                    || from_view.attrs != to_view.attrs
                {
                    changes.push(Change::ModifyView {
                        from: from_view.clone(),
                        to: to_view.clone(),
                    });
                }
            }
            None => changes.push(Change::AddView {
                view: to_view.clone(),
            }),
        }
    }
    for from_view in &from.views {
        if to.view(&from_view.name).is_none() {
            changes.push(Change::DropView {
                view: from_view.clone(),
            });
        }
    }
}

fn diff_objects(from: &Schema, to: &Schema, changes: &mut Vec<Change>) {
    let from_objects = schema_objects(from);
    let to_objects = schema_objects(to);

    for to_object in &to_objects {
        let matched = from_objects
            .iter()
            .find(|object| object.kind() == to_object.kind() && object.name() == to_object.name());
        match matched {
            Some(from_object) if from_object != to_object => changes.push(Change::ModifyObject {
                schema: to.name.clone(),
                from: (*from_object).clone(),
                to: to_object.clone(),
            }),
            Some(_) => {}
            None => changes.push(Change::AddObject {
                schema: to.name.clone(),
                object: to_object.clone(),
            }),
        }
    }
    for from_object in &from_objects {
        let survives = to_objects
            .iter()
            .any(|object| object.kind() == from_object.kind() && object.name() == from_object.name());
        if !survives {
            changes.push(Change::DropObject {
                schema: from.name.clone(),
                object: from_object.clone(),
            });
        }
    }
}

fn schema_objects(schema: &Schema) -> Vec<Object> {
    let mut objects = Vec::new();
    objects.extend(schema.enums.iter().cloned().map(Object::Enum));
    objects.extend(schema.funcs.iter().cloned().map(Object::Func));
    objects.extend(schema.procs.iter().cloned().map(Object::Proc));
    objects
}
