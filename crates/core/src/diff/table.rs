use std::collections::BTreeSet;

use crate::{
    Result,
    change::{Change, ColumnChange, FkChange, IndexChange, PkChange},
    diff::{DiffOptions, EquivalencePolicy, column_fingerprint, diff_attrs},
    error::DiffError,
    schema::{Attr, Column, ForeignKey, GeneratedKind, Index, IndexPartKind, Table, TableRef},
};

/// Flat change stream for a matched (or rename-collapsed) table pair. All
/// emitted changes are scoped to `to`'s table reference.
pub(crate) fn table_changes(
    opts: &DiffOptions,
    from: &Table,
    to: &Table,
    changes: &mut Vec<Change>,
) -> Result<()> {
    let table_ref = to.table_ref();

    diff_columns(opts, &table_ref, from, to, changes)?;
    diff_primary_key(opts, &table_ref, from, to, changes);
    diff_indexes(opts, &table_ref, from, to, changes);
    diff_foreign_keys(&table_ref, from, to, changes);
    diff_checks(opts, &table_ref, from, to, changes);
    diff_triggers(&table_ref, from, to, changes);

    let mut attr_changes = Vec::new();
    diff_attrs(&from.attrs, &to.attrs, &mut attr_changes);
    if !attr_changes.is_empty() {
        changes.push(Change::ModifyTable {
            table: table_ref,
            changes: attr_changes,
        });
    }

    Ok(())
}

fn diff_columns(
    opts: &DiffOptions,
    table_ref: &TableRef,
    from: &Table,
    to: &Table,
    changes: &mut Vec<Change>,
) -> Result<()> {
    let mut matched = BTreeSet::new();
    let mut pending = Vec::new();

    for to_column in &to.columns {
        if let Some(from_column) = from.column(&to_column.name) {
            matched.insert(from_column.name.clone());
            push_modify_column(opts, table_ref, from_column, to_column, changes)?;
            continue;
        }

        if let Some(from_name) = column_rename_hint(opts, table_ref, from, &to_column.name)
            && let Some(from_column) = from.column(&from_name)
            && !matched.contains(&from_column.name)
            && to.column(&from_column.name).is_none()
        {
            matched.insert(from_column.name.clone());
            changes.push(Change::RenameColumn {
                table: table_ref.clone(),
                from: from_column.name.clone(),
                to: to_column.name.clone(),
            });
            push_modify_column(opts, table_ref, from_column, to_column, changes)?;
            continue;
        }

        pending.push(to_column);
    }

    for to_column in pending {
        if opts.detect_renames {
            let fingerprint = column_fingerprint(to_column);
            let candidates = from
                .columns
                .iter()
                .filter(|from_column| {
                    !matched.contains(&from_column.name)
                        && to.column(&from_column.name).is_none()
                        && column_fingerprint(from_column) == fingerprint
                })
                .collect::<Vec<_>>();

            match candidates.as_slice() {
                [] => {}
                [from_column] => {
                    matched.insert(from_column.name.clone());
                    changes.push(Change::RenameColumn {
                        table: table_ref.clone(),
                        from: from_column.name.clone(),
                        to: to_column.name.clone(),
                    });
                    continue;
                }
                many => {
                    return Err(DiffError::AmbiguousChange {
                        object: format!("{table_ref}.{}", to_column.name),
                        candidates: many.iter().map(|column| column.name.clone()).collect(),
                    }
                    .into());
                }
            }
        }

        changes.push(Change::AddColumn {
            table: table_ref.clone(),
            column: to_column.clone(),
        });
    }

    for from_column in &from.columns {
        if !matched.contains(&from_column.name) && to.column(&from_column.name).is_none() {
            changes.push(Change::DropColumn {
                table: table_ref.clone(),
                column: from_column.clone(),
            });
        }
    }

    Ok(())
}

fn column_rename_hint(
    opts: &DiffOptions,
    table_ref: &TableRef,
    from_table: &Table,
    to_column: &str,
) -> Option<String> {
    opts.hints.iter().find_map(|hint| match hint {
        crate::diff::RenameHint::Column {
            schema,
            table,
            from,
            to,
        } if schema == &table_ref.schema
            && (table == &table_ref.name || table == &from_table.name)
            && to == to_column =>
        {
            Some(from.clone())
        }
        _ => None,
    })
}

fn push_modify_column(
    opts: &DiffOptions,
    table_ref: &TableRef,
    from: &Column,
    to: &Column,
    changes: &mut Vec<Change>,
) -> Result<()> {
    let mask = column_mask(opts.policy.as_ref(), table_ref, from, to)?;
    if !mask.is_empty() {
        changes.push(Change::ModifyColumn {
            table: table_ref.clone(),
            from: from.clone(),
            to: to.clone(),
            change: mask,
        });
    }
    Ok(())
}

/// Computes the change mask for a matched column pair. Bits are assigned in
/// the fixed tie-break order: null > type > default > comment > attr.
fn column_mask(
    policy: &dyn EquivalencePolicy,
    table_ref: &TableRef,
    from: &Column,
    to: &Column,
) -> Result<ColumnChange> {
    let mut mask = ColumnChange::empty();

    if from.null != to.null {
        mask |= ColumnChange::NULL;
    }
    if !policy.types_equal(&from.ty, &to.ty) {
        mask |= ColumnChange::TYPE;
    }
    match (&from.default, &to.default) {
        (None, None) => {}
        (Some(left), Some(right)) if policy.defaults_equal(left, right) => {}
        _ => mask |= ColumnChange::DEFAULT,
    }
    if from.comment() != to.comment() {
        mask |= ColumnChange::COMMENT;
    }

    mask |= generated_mask(policy, table_ref, from, to)?;

    if crate::schema::collation_of(&from.attrs) != crate::schema::collation_of(&to.attrs) {
        mask |= ColumnChange::COLLATION;
    }
    if crate::schema::charset_of(&from.attrs) != crate::schema::charset_of(&to.attrs) {
        mask |= ColumnChange::CHARSET;
    }
    if !attrs_equal_excluding(&from.attrs, &to.attrs, &["comment", "collate", "charset"]) {
        mask |= ColumnChange::ATTR;
    }

    Ok(mask)
}

fn generated_mask(
    policy: &dyn EquivalencePolicy,
    table_ref: &TableRef,
    from: &Column,
    to: &Column,
) -> Result<ColumnChange> {
    match (&from.generated, &to.generated) {
        (None, None) => Ok(ColumnChange::empty()),
        (Some(left), Some(right)) => {
            if left.kind != right.kind {
                if left.kind == GeneratedKind::Stored || right.kind == GeneratedKind::Stored {
                    return Err(unsupported_generated(table_ref, to));
                }
                return Ok(ColumnChange::GENERATED);
            }
            if !policy.exprs_equal(&left.expr, &right.expr) {
                if left.kind == GeneratedKind::Stored {
                    return Err(unsupported_generated(table_ref, to));
                }
                return Ok(ColumnChange::GENERATED_EXPR);
            }
            Ok(ColumnChange::empty())
        }
        _ => Ok(ColumnChange::GENERATED),
    }
}

fn unsupported_generated(table_ref: &TableRef, column: &Column) -> crate::Error {
    DiffError::UnsupportedChange {
        object: format!("{table_ref}.{}", column.name),
        reason: "changing a stored generated column's expression requires a table rebuild"
            .to_string(),
    }
    .into()
}

fn diff_primary_key(
    opts: &DiffOptions,
    table_ref: &TableRef,
    from: &Table,
    to: &Table,
    changes: &mut Vec<Change>,
) {
    match (&from.primary_key, &to.primary_key) {
        (None, None) => {}
        (None, Some(pk)) => changes.push(Change::AddPrimaryKey {
            table: table_ref.clone(),
            pk: pk.clone(),
        }),
        (Some(pk), None) => changes.push(Change::DropPrimaryKey {
            table: table_ref.clone(),
            pk: pk.clone(),
        }),
        (Some(from_pk), Some(to_pk)) => {
            let mut mask = PkChange::empty();
            if !parts_equal(opts.policy.as_ref(), from_pk, to_pk) {
                mask |= PkChange::PARTS;
            }
            if !attrs_equal_excluding(&from_pk.attrs, &to_pk.attrs, &[]) {
                mask |= PkChange::ATTR;
            }
            if from_pk.unique != to_pk.unique {
                mask |= PkChange::UNIQUE;
            }
            if !mask.is_empty() {
                changes.push(Change::ModifyPrimaryKey {
                    table: table_ref.clone(),
                    from: from_pk.clone(),
                    to: to_pk.clone(),
                    change: mask,
                });
            }
        }
    }
}

fn diff_indexes(
    opts: &DiffOptions,
    table_ref: &TableRef,
    from: &Table,
    to: &Table,
    changes: &mut Vec<Change>,
) {
    let mut matched = BTreeSet::new();
    let mut pending = Vec::new();

    for to_index in &to.indexes {
        match from.index(&to_index.name) {
            Some(from_index) => {
                matched.insert(from_index.name.clone());
                let mask = index_mask(opts.policy.as_ref(), from_index, to_index);
                if !mask.is_empty() {
                    changes.push(Change::ModifyIndex {
                        table: table_ref.clone(),
                        from: from_index.clone(),
                        to: to_index.clone(),
                        change: mask,
                    });
                }
            }
            None => pending.push(to_index),
        }
    }

    for to_index in pending {
        if opts.detect_renames {
            let matched_rename = from.indexes.iter().find(|from_index| {
                !matched.contains(&from_index.name)
                    && to.index(&from_index.name).is_none()
                    && index_mask(opts.policy.as_ref(), from_index, to_index).is_empty()
            });
            if let Some(from_index) = matched_rename {
                matched.insert(from_index.name.clone());
                changes.push(Change::RenameIndex {
                    table: table_ref.clone(),
                    from: from_index.name.clone(),
                    to: to_index.name.clone(),
                });
                continue;
            }
        }
        changes.push(Change::AddIndex {
            table: table_ref.clone(),
            index: to_index.clone(),
        });
    }

    for from_index in &from.indexes {
        if !matched.contains(&from_index.name) && to.index(&from_index.name).is_none() {
            changes.push(Change::DropIndex {
                table: table_ref.clone(),
                index: from_index.clone(),
            });
        }
    }
}

fn index_mask(policy: &dyn EquivalencePolicy, from: &Index, to: &Index) -> IndexChange {
    let mut mask = IndexChange::empty();
    if from.unique != to.unique {
        mask |= IndexChange::UNIQUE;
    }
    if !parts_equal(policy, from, to) {
        mask |= IndexChange::PARTS;
    }
    let predicates_equal = match (&from.predicate, &to.predicate) {
        (None, None) => true,
        (Some(left), Some(right)) => policy.defaults_equal(left, right),
        _ => false,
    };
    if !predicates_equal {
        mask |= IndexChange::PREDICATE;
    }
    if crate::schema::get_attr(&from.attrs, "include") != crate::schema::get_attr(&to.attrs, "include")
    {
        mask |= IndexChange::INCLUDE;
    }
    if !attrs_equal_excluding(&from.attrs, &to.attrs, &["include"]) {
        mask |= IndexChange::ATTR;
    }
    mask
}

fn parts_equal(policy: &dyn EquivalencePolicy, from: &Index, to: &Index) -> bool {
    if from.parts.len() != to.parts.len() {
        return false;
    }
    from.parts.iter().zip(to.parts.iter()).all(|(left, right)| {
        left.desc == right.desc
            && left.prefix_len == right.prefix_len
            && match (&left.kind, &right.kind) {
                (IndexPartKind::Column(left), IndexPartKind::Column(right)) => left == right,
                (IndexPartKind::Expr(left), IndexPartKind::Expr(right)) => {
                    policy.defaults_equal(left, right)
                }
                _ => false,
            }
    })
}

fn diff_foreign_keys(table_ref: &TableRef, from: &Table, to: &Table, changes: &mut Vec<Change>) {
    for to_fk in &to.foreign_keys {
        match from.foreign_key(&to_fk.symbol) {
            Some(from_fk) => {
                let mask = fk_mask(from_fk, to_fk);
                if !mask.is_empty() {
                    changes.push(Change::ModifyForeignKey {
                        table: table_ref.clone(),
                        from: from_fk.clone(),
                        to: to_fk.clone(),
                        change: mask,
                    });
                }
            }
            None => changes.push(Change::AddForeignKey {
                table: table_ref.clone(),
                fk: to_fk.clone(),
            }),
        }
    }
    for from_fk in &from.foreign_keys {
        if to.foreign_key(&from_fk.symbol).is_none() {
            changes.push(Change::DropForeignKey {
                table: table_ref.clone(),
                fk: from_fk.clone(),
            });
        }
    }
}

fn fk_mask(from: &ForeignKey, to: &ForeignKey) -> FkChange {
    let mut mask = FkChange::empty();
    if from.columns != to.columns {
        mask |= FkChange::COLUMN;
    }
    if from.ref_columns != to.ref_columns {
        mask |= FkChange::REF_COLUMN;
    }
    if from.ref_table != to.ref_table {
        mask |= FkChange::REF_TABLE;
    }
    if from.on_update != to.on_update {
        mask |= FkChange::UPDATE_ACTION;
    }
    if from.on_delete != to.on_delete {
        mask |= FkChange::DELETE_ACTION;
    }
    mask
}

fn diff_checks(
    opts: &DiffOptions,
    table_ref: &TableRef,
    from: &Table,
    to: &Table,
    changes: &mut Vec<Change>,
) {
    for to_check in &to.checks {
        match from.check(&to_check.name) {
            Some(from_check) => {
                if !opts.policy.exprs_equal(&from_check.expr, &to_check.expr)
                    || from_check.attrs != to_check.attrs
                {
                    changes.push(Change::ModifyCheck {
                        table: table_ref.clone(),
                        from: from_check.clone(),
                        to: to_check.clone(),
                    });
                }
            }
            None => changes.push(Change::AddCheck {
                table: table_ref.clone(),
                check: to_check.clone(),
            }),
        }
    }
    for from_check in &from.checks {
        if to.check(&from_check.name).is_none() {
            changes.push(Change::DropCheck {
                table: table_ref.clone(),
                check: from_check.clone(),
            });
        }
    }
}

fn diff_triggers(table_ref: &TableRef, from: &Table, to: &Table, changes: &mut Vec<Change>) {
    let trigger_of = |table: &Table, name: &str| {
        table
            .triggers
            .iter()
            .find(|trigger| trigger.name == name)
            .cloned()
    };

    for to_trigger in &to.triggers {
        match trigger_of(from, &to_trigger.name) {
            Some(from_trigger) => {
                if from_trigger != *to_trigger {
                    changes.push(Change::DropTrigger {
                        table: table_ref.clone(),
                        trigger: from_trigger,
                    });
                    changes.push(Change::AddTrigger {
                        table: table_ref.clone(),
                        trigger: to_trigger.clone(),
                    });
                }
            }
            None => changes.push(Change::AddTrigger {
                table: table_ref.clone(),
                trigger: to_trigger.clone(),
            }),
        }
    }
    for from_trigger in &from.triggers {
        if trigger_of(to, &from_trigger.name).is_none() {
            changes.push(Change::DropTrigger {
                table: table_ref.clone(),
                trigger: from_trigger.clone(),
            });
        }
    }
}

/// Order-insensitive attribute comparison, skipping the keys handled by
/// dedicated mask bits.
fn attrs_equal_excluding(from: &[Attr], to: &[Attr], excluded: &[&str]) -> bool {
    let filter = |attrs: &[Attr]| -> Vec<Attr> {
        let mut kept = attrs
            .iter()
            .filter(|attr| !excluded.contains(&attr.key()))
            .cloned()
            .collect::<Vec<_>>();
        kept.sort_by(|left, right| left.key().cmp(right.key()));
        kept
    };
    filter(from) == filter(to)
}
