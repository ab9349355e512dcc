use std::collections::{BTreeMap, BTreeSet};

use crate::{change::Change, schema::Table};

#[derive(Debug, Clone)]
struct IndexedChange {
    original_index: usize,
    change: Change,
}

/// Coarse ordering buckets. Destructive groups run first (foreign keys
/// before the columns and tables they pin), then creations from the outside
/// in: schemas, first-class objects, tables, keys, views, indexes, triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PriorityGroup {
    DropTrigger = 1,
    DropView = 2,
    DropForeignKey = 3,
    DropIndex = 4,
    TableScoped = 5,
    DropTable = 6,
    DropObject = 7,
    DropSchema = 8,
    AddSchema = 9,
    AddObject = 10,
    AddTable = 11,
    AddForeignKey = 12,
    AddView = 13,
    AddIndex = 14,
    AddTrigger = 15,
    SchemaAttr = 16,
}

/// Within one table's bucket of scoped changes: renames first, then column
/// mutations, then keys and constraints, attributes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TableSubPriority {
    RenameTable = 0,
    RenameColumn = 1,
    DropCheck = 2,
    ModifyColumn = 3,
    AddColumn = 4,
    DropColumn = 5,
    PrimaryKey = 6,
    AddCheck = 7,
    TableAttr = 8,
}

/// Stable, deterministic ordering of a change stream: changes are grouped
/// by priority, each group keeps the original relative order, and the
/// create-table group is topologically sorted along foreign-key edges.
#[must_use]
pub fn sort_changes(changes: Vec<Change>) -> Vec<Change> {
    let mut grouped = BTreeMap::<PriorityGroup, Vec<IndexedChange>>::new();
    for (original_index, change) in changes.into_iter().enumerate() {
        grouped
            .entry(priority_group(&change))
            .or_default()
            .push(IndexedChange {
                original_index,
                change,
            });
    }

    let mut sorted = Vec::new();
    for (priority, entries) in grouped {
        let mut prioritized = match priority {
            PriorityGroup::AddTable => sort_add_tables(entries),
            PriorityGroup::TableScoped => sort_table_scoped(entries),
            _ => entries,
        };
        sorted.extend(prioritized.drain(..).map(|entry| entry.change));
    }

    sorted
}

fn priority_group(change: &Change) -> PriorityGroup {
    match change {
        Change::DropTrigger { .. } => PriorityGroup::DropTrigger,
        Change::DropView { .. } | Change::ModifyView { .. } => PriorityGroup::DropView,
        Change::DropForeignKey { .. } => PriorityGroup::DropForeignKey,
        Change::DropIndex { .. } => PriorityGroup::DropIndex,
        Change::RenameTable { .. }
        | Change::RenameColumn { .. }
        | Change::ModifyColumn { .. }
        | Change::AddColumn { .. }
        | Change::DropColumn { .. }
        | Change::AddPrimaryKey { .. }
        | Change::DropPrimaryKey { .. }
        | Change::ModifyPrimaryKey { .. }
        | Change::AddCheck { .. }
        | Change::DropCheck { .. }
        | Change::ModifyCheck { .. }
        | Change::ModifyTable { .. } => PriorityGroup::TableScoped,
        Change::DropTable { .. } => PriorityGroup::DropTable,
        Change::DropObject { .. } => PriorityGroup::DropObject,
        Change::DropSchema { .. } => PriorityGroup::DropSchema,
        Change::AddSchema { .. } => PriorityGroup::AddSchema,
        Change::AddObject { .. } | Change::ModifyObject { .. } => PriorityGroup::AddObject,
        Change::AddTable { .. } => PriorityGroup::AddTable,
        Change::AddForeignKey { .. } | Change::ModifyForeignKey { .. } => {
            PriorityGroup::AddForeignKey
        }
        Change::AddView { .. } => PriorityGroup::AddView,
        Change::AddIndex { .. } | Change::ModifyIndex { .. } | Change::RenameIndex { .. } => {
            PriorityGroup::AddIndex
        }
        Change::AddTrigger { .. } => PriorityGroup::AddTrigger,
        Change::ModifySchema { .. }
        | Change::AddAttr { .. }
        | Change::DropAttr { .. }
        | Change::ModifyAttr { .. } => PriorityGroup::SchemaAttr,
    }
}

fn sort_table_scoped(mut entries: Vec<IndexedChange>) -> Vec<IndexedChange> {
    let mut table_order = BTreeMap::<(String, String), usize>::new();
    let mut next_table_order = 0usize;

    for entry in &entries {
        if let Some(table_key) = table_key(&entry.change)
            && !table_order.contains_key(&table_key)
        {
            table_order.insert(table_key, next_table_order);
            next_table_order += 1;
        }
    }

    entries.sort_by_key(|entry| {
        let table_rank = table_key(&entry.change)
            .and_then(|table_key| table_order.get(&table_key).copied())
            .unwrap_or(usize::MAX);
        (
            table_rank,
            table_sub_priority(&entry.change),
            entry.original_index,
        )
    });
    entries
}

fn table_key(change: &Change) -> Option<(String, String)> {
    match change {
        Change::RenameTable { to, .. } => Some((to.schema.clone(), to.name.clone())),
        Change::RenameColumn { table, .. }
        | Change::ModifyColumn { table, .. }
        | Change::AddColumn { table, .. }
        | Change::DropColumn { table, .. }
        | Change::AddPrimaryKey { table, .. }
        | Change::DropPrimaryKey { table, .. }
        | Change::ModifyPrimaryKey { table, .. }
        | Change::AddCheck { table, .. }
        | Change::DropCheck { table, .. }
        | Change::ModifyCheck { table, .. }
        | Change::ModifyTable { table, .. } => Some((table.schema.clone(), table.name.clone())),
        _ => None,
    }
}

fn table_sub_priority(change: &Change) -> TableSubPriority {
    match change {
        Change::RenameTable { .. } => TableSubPriority::RenameTable,
        Change::RenameColumn { .. } => TableSubPriority::RenameColumn,
        Change::DropCheck { .. } => TableSubPriority::DropCheck,
        Change::ModifyColumn { .. } => TableSubPriority::ModifyColumn,
        Change::AddColumn { .. } => TableSubPriority::AddColumn,
        Change::DropColumn { .. } => TableSubPriority::DropColumn,
        Change::AddPrimaryKey { .. }
        | Change::DropPrimaryKey { .. }
        | Change::ModifyPrimaryKey { .. } => TableSubPriority::PrimaryKey,
        Change::AddCheck { .. } | Change::ModifyCheck { .. } => TableSubPriority::AddCheck,
        _ => TableSubPriority::TableAttr,
    }
}

fn sort_add_tables(entries: Vec<IndexedChange>) -> Vec<IndexedChange> {
    let mut index_by_table = BTreeMap::<(String, String), usize>::new();
    for (idx, entry) in entries.iter().enumerate() {
        if let Change::AddTable { table } = &entry.change {
            index_by_table.insert((table.schema.clone(), table.name.clone()), idx);
        }
    }

    let mut dependencies = vec![BTreeSet::<usize>::new(); entries.len()];
    for (idx, entry) in entries.iter().enumerate() {
        let Change::AddTable { table } = &entry.change else {
            continue;
        };
        add_table_dependencies(idx, table, &index_by_table, &mut dependencies);
    }

    topological_sort(entries, dependencies)
}

fn add_table_dependencies(
    idx: usize,
    table: &Table,
    index_by_table: &BTreeMap<(String, String), usize>,
    dependencies: &mut [BTreeSet<usize>],
) {
    let self_key = (table.schema.clone(), table.name.clone());
    for fk in &table.foreign_keys {
        let dependency_key = (fk.ref_table.schema.clone(), fk.ref_table.name.clone());
        if dependency_key == self_key {
            continue;
        }
        if let Some(dependency_index) = index_by_table.get(&dependency_key) {
            dependencies[idx].insert(*dependency_index);
        }
    }
}

fn topological_sort(
    entries: Vec<IndexedChange>,
    dependencies: Vec<BTreeSet<usize>>,
) -> Vec<IndexedChange> {
    let mut reverse_edges = vec![BTreeSet::<usize>::new(); entries.len()];
    for (idx, deps) in dependencies.iter().enumerate() {
        for dependency in deps {
            reverse_edges[*dependency].insert(idx);
        }
    }

    let mut remaining = dependencies.iter().map(BTreeSet::len).collect::<Vec<_>>();
    let mut ready = BTreeSet::<(usize, usize)>::new();
    for (idx, count) in remaining.iter().enumerate() {
        if *count == 0 {
            ready.insert((entries[idx].original_index, idx));
        }
    }

    let mut ordered_indexes = Vec::new();
    let mut visited = vec![false; entries.len()];
    while let Some((_, idx)) = ready.pop_first() {
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        ordered_indexes.push(idx);

        for dependent in &reverse_edges[idx] {
            if remaining[*dependent] == 0 {
                continue;
            }
            remaining[*dependent] -= 1;
            if remaining[*dependent] == 0 {
                ready.insert((entries[*dependent].original_index, *dependent));
            }
        }
    }

    // Foreign-key cycles leave unvisited entries; append them in original
    // order and let the separate AddForeignKey pass close the loop.
    if ordered_indexes.len() != entries.len() {
        let mut unresolved = (0..entries.len())
            .filter(|idx| !visited[*idx])
            .collect::<Vec<_>>();
        unresolved.sort_by_key(|idx| entries[*idx].original_index);
        ordered_indexes.extend(unresolved);
    }

    ordered_indexes
        .into_iter()
        .map(|idx| entries[idx].clone())
        .collect()
}
