use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Write as _,
    sync::Arc,
};

use drift_core::{
    Attr, Change, Column, Expr, ForeignKey, Index, IndexPartKind, Literal, Object, Plan,
    PlanError, PlanFormatter, PlanStatement, Realm, RefAction, Result, Table, TableRef, Trigger,
    TriggerEvent, TriggerTiming, get_attr,
};

const DIALECT: &str = "sqlite";
const SHADOW_PREFIX: &str = "_drift_new_";

/// Plans changes as SQLite DDL. Table mutations beyond a pure ADD COLUMN
/// run as a rebuild sequence: disable foreign keys, create a shadow table,
/// copy rows, drop the original, rename the shadow, recreate indexes,
/// re-enable foreign keys.
///
/// Rebuilds need the desired table snapshot, which the change stream does
/// not carry; [`PlanFormatter::bind_desired`] returns a bound copy holding
/// the snapshots.
#[derive(Debug, Default, Clone)]
pub struct SqlitePlan {
    tables: BTreeMap<(String, String), Table>,
}

impl SqlitePlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_desired(realm: &Realm) -> Self {
        let mut tables = BTreeMap::new();
        for schema in &realm.schemas {
            for table in &schema.tables {
                tables.insert((schema.name.clone(), table.name.clone()), table.clone());
            }
        }
        Self { tables }
    }

    fn desired_table(&self, table: &TableRef, change: &Change) -> Result<&Table> {
        self.tables
            .get(&(table.schema.clone(), table.name.clone()))
            .ok_or_else(|| {
                unsupported(
                    change,
                    "table rebuild requires the desired table snapshot (bind_desired)",
                )
            })
    }
}

fn unsupported(change: &Change, reason: &str) -> drift_core::Error {
    PlanError::Unsupported {
        dialect: DIALECT.to_string(),
        change: change.op_name().to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Table-scoped changes that fold into one rebuild batch when any of them
/// requires one.
fn run_table(change: &Change) -> Option<TableRef> {
    match change {
        Change::AddColumn { table, .. }
        | Change::DropColumn { table, .. }
        | Change::ModifyColumn { table, .. }
        | Change::AddPrimaryKey { table, .. }
        | Change::DropPrimaryKey { table, .. }
        | Change::ModifyPrimaryKey { table, .. }
        | Change::AddCheck { table, .. }
        | Change::DropCheck { table, .. }
        | Change::ModifyCheck { table, .. }
        | Change::AddForeignKey { table, .. }
        | Change::DropForeignKey { table, .. }
        | Change::ModifyForeignKey { table, .. } => Some(table.clone()),
        _ => None,
    }
}

/// A pure column addition keeps the simple ALTER path.
fn needs_rebuild(change: &Change) -> bool {
    !matches!(change, Change::AddColumn { .. })
}

impl PlanFormatter for SqlitePlan {
    fn dialect(&self) -> &'static str {
        DIALECT
    }

    fn bind_desired(&self, realm: &Realm) -> Option<Arc<dyn PlanFormatter>> {
        Some(Arc::new(Self::with_desired(realm)))
    }

    fn plan_changes(&self, name: &str, changes: &[Change]) -> Result<Plan> {
        let mut plan = Plan::new(name);
        let mut created = BTreeSet::new();
        let mut index = 0usize;

        while index < changes.len() {
            let change = &changes[index];

            if let Some(table) = run_table(change) {
                let created_here = created.contains(&(table.schema.clone(), table.name.clone()));
                let start = index;
                while index < changes.len() && run_table(&changes[index]).as_ref() == Some(&table)
                {
                    index += 1;
                }
                let run = &changes[start..index];

                if created_here {
                    // Constraints of a table created earlier in this plan
                    // are already inline in its CREATE TABLE.
                    continue;
                }
                if run.iter().any(needs_rebuild) {
                    self.emit_rebuild(&table, run, &mut plan)?;
                } else {
                    for change in run {
                        emit_simple_column_add(change, &mut plan)?;
                    }
                }
                continue;
            }

            self.emit_simple(change, &mut created, &mut plan)?;
            index += 1;
        }

        Ok(plan)
    }
}

fn emit_simple_column_add(change: &Change, plan: &mut Plan) -> Result<()> {
    let Change::AddColumn { table, column } = change else {
        return Err(unsupported(change, "expected a column addition"));
    };
    plan.push(
        PlanStatement::new(
            format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote(&table.name),
                render_column(column)
            ),
            change.describe(),
        )
        .with_reverse(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote(&table.name),
            quote(&column.name)
        ))
        .non_transactional(),
    );
    Ok(())
}

impl SqlitePlan {
    fn emit_rebuild(&self, table: &TableRef, run: &[Change], plan: &mut Plan) -> Result<()> {
        let first = run.first().expect("rebuild batches are non-empty");
        let desired = self.desired_table(table, first)?;

        let added_columns = run
            .iter()
            .filter_map(|change| match change {
                Change::AddColumn { column, .. } => Some(column.name.clone()),
                _ => None,
            })
            .collect::<BTreeSet<_>>();
        let survivors = desired
            .columns
            .iter()
            .filter(|column| {
                !added_columns.contains(&column.name) && column.generated.is_none()
            })
            .map(|column| quote(&column.name))
            .collect::<Vec<_>>();

        let shadow = format!("{SHADOW_PREFIX}{}", table.name);

        plan.push(
            PlanStatement::new(
                "PRAGMA foreign_keys = off",
                format!("Disable foreign keys before rebuilding {:?}", table.name),
            )
            .non_transactional(),
        );
        plan.push(
            PlanStatement::new(
                render_create_table(desired, &shadow),
                format!("Create shadow table for {:?}", table.name),
            )
            .non_transactional(),
        );
        plan.push(
            PlanStatement::new(
                format!(
                    "INSERT INTO {} ({}) SELECT {} FROM {}",
                    quote(&shadow),
                    survivors.join(", "),
                    survivors.join(", "),
                    quote(&table.name)
                ),
                format!("Copy rows from {:?}", table.name),
            )
            .non_transactional(),
        );
        plan.push(
            PlanStatement::new(
                format!("DROP TABLE {}", quote(&table.name)),
                format!("Drop the original {:?} table", table.name),
            )
            .non_transactional(),
        );
        plan.push(
            PlanStatement::new(
                format!(
                    "ALTER TABLE {} RENAME TO {}",
                    quote(&shadow),
                    quote(&table.name)
                ),
                format!("Rename shadow table to {:?}", table.name),
            )
            .non_transactional(),
        );
        for index in &desired.indexes {
            plan.push(
                PlanStatement::new(
                    render_create_index(table, index),
                    format!("Recreate index {:?}", index.name),
                )
                .non_transactional(),
            );
        }
        plan.push(
            PlanStatement::new(
                "PRAGMA foreign_keys = on",
                format!("Enable foreign keys after rebuilding {:?}", table.name),
            )
            .non_transactional(),
        );
        Ok(())
    }

    fn emit_simple(
        &self,
        change: &Change,
        created: &mut BTreeSet<(String, String)>,
        plan: &mut Plan,
    ) -> Result<()> {
        let comment = change.describe();
        match change {
            // SQLite has exactly one schema per file; `main` exists by
            // definition and needs no statement.
            Change::AddSchema { schema } | Change::DropSchema { schema } => {
                if schema.name != "main" {
                    return Err(unsupported(change, "SQLite manages a single schema"));
                }
            }
            Change::ModifySchema { .. } => {}
            Change::AddTable { table } => {
                created.insert((table.schema.clone(), table.name.clone()));
                plan.push(
                    PlanStatement::new(render_create_table(table, &table.name), comment)
                        .with_reverse(format!("DROP TABLE {}", quote(&table.name)))
                        .non_transactional(),
                );
            }
            Change::DropTable { table } => {
                plan.push(
                    PlanStatement::new(format!("DROP TABLE {}", quote(&table.name)), comment)
                        .non_transactional(),
                );
            }
            Change::RenameTable { from, to } => {
                plan.push(
                    PlanStatement::new(
                        format!(
                            "ALTER TABLE {} RENAME TO {}",
                            quote(&from.name),
                            quote(&to.name)
                        ),
                        comment,
                    )
                    .with_reverse(format!(
                        "ALTER TABLE {} RENAME TO {}",
                        quote(&to.name),
                        quote(&from.name)
                    ))
                    .non_transactional(),
                );
            }
            Change::RenameColumn { table, from, to } => {
                plan.push(
                    PlanStatement::new(
                        format!(
                            "ALTER TABLE {} RENAME COLUMN {} TO {}",
                            quote(&table.name),
                            quote(from),
                            quote(to)
                        ),
                        comment,
                    )
                    .with_reverse(format!(
                        "ALTER TABLE {} RENAME COLUMN {} TO {}",
                        quote(&table.name),
                        quote(to),
                        quote(from)
                    ))
                    .non_transactional(),
                );
            }
            Change::AddIndex { table, index } => {
                plan.push(
                    PlanStatement::new(render_create_index(table, index), comment)
                        .with_reverse(format!("DROP INDEX {}", quote(&index.name)))
                        .non_transactional(),
                );
            }
            Change::DropIndex { table, index } => {
                plan.push(
                    PlanStatement::new(format!("DROP INDEX {}", quote(&index.name)), comment)
                        .with_reverse(render_create_index(table, index))
                        .non_transactional(),
                );
            }
            Change::ModifyIndex { table, from, to, .. } => {
                plan.push(
                    PlanStatement::new(
                        format!("DROP INDEX {}", quote(&from.name)),
                        format!("Drop index {:?} to modify it", from.name),
                    )
                    .non_transactional(),
                );
                plan.push(
                    PlanStatement::new(render_create_index(table, to), comment)
                        .with_reverse(render_create_index(table, from))
                        .non_transactional(),
                );
            }
            Change::RenameIndex { table, from, to } => {
                let desired = self.desired_table(table, change)?;
                let Some(index) = desired.index(to) else {
                    return Err(unsupported(change, "renamed index is not in the snapshot"));
                };
                plan.push(
                    PlanStatement::new(
                        format!("DROP INDEX {}", quote(from)),
                        format!("Drop index {from:?} to rename it"),
                    )
                    .non_transactional(),
                );
                plan.push(
                    PlanStatement::new(render_create_index(table, index), comment)
                        .non_transactional(),
                );
            }
            Change::AddView { view } => {
                plan.push(
                    PlanStatement::new(
                        format!("CREATE VIEW {} AS {}", quote(&view.name), view.def),
                        comment,
                    )
                    .with_reverse(format!("DROP VIEW {}", quote(&view.name)))
                    .non_transactional(),
                );
            }
            Change::DropView { view } => {
                plan.push(
                    PlanStatement::new(format!("DROP VIEW {}", quote(&view.name)), comment)
                        .with_reverse(format!(
                            "CREATE VIEW {} AS {}",
                            quote(&view.name),
                            view.def
                        ))
                        .non_transactional(),
                );
            }
            Change::ModifyView { from, to } => {
                plan.push(
                    PlanStatement::new(
                        format!("DROP VIEW {}", quote(&from.name)),
                        format!("Drop view {:?} to modify it", from.name),
                    )
                    .non_transactional(),
                );
                plan.push(
                    PlanStatement::new(
                        format!("CREATE VIEW {} AS {}", quote(&to.name), to.def),
                        comment,
                    )
                    .with_reverse(format!(
                        "CREATE VIEW {} AS {}",
                        quote(&from.name),
                        from.def
                    ))
                    .non_transactional(),
                );
            }
            Change::AddTrigger { table, trigger } => {
                plan.push(
                    PlanStatement::new(render_create_trigger(table, trigger), comment)
                        .with_reverse(format!("DROP TRIGGER {}", quote(&trigger.name)))
                        .non_transactional(),
                );
            }
            Change::DropTrigger { table, trigger } => {
                plan.push(
                    PlanStatement::new(format!("DROP TRIGGER {}", quote(&trigger.name)), comment)
                        .with_reverse(render_create_trigger(table, trigger))
                        .non_transactional(),
                );
            }
            // Enums erase to text affinity; there is nothing to create.
            Change::AddObject {
                object: Object::Enum(_),
                ..
            }
            | Change::DropObject {
                object: Object::Enum(_),
                ..
            }
            | Change::ModifyObject {
                to: Object::Enum(_),
                ..
            } => {}
            Change::AddObject { .. } | Change::DropObject { .. } | Change::ModifyObject { .. } => {
                return Err(unsupported(change, "SQLite has no stored routines"));
            }
            Change::ModifyTable { .. } => {
                return Err(unsupported(change, "SQLite table options cannot be altered"));
            }
            Change::AddAttr { .. } | Change::DropAttr { .. } | Change::ModifyAttr { .. } => {}
            other => {
                return Err(unsupported(other, "change is handled by the rebuild path"));
            }
        }
        Ok(())
    }
}

fn render_create_table(table: &Table, name: &str) -> String {
    let mut parts = Vec::new();
    for column in &table.columns {
        parts.push(render_column(column));
    }
    if let Some(pk) = &table.primary_key {
        let columns = pk
            .parts
            .iter()
            .filter_map(|part| match &part.kind {
                IndexPartKind::Column(column) => Some(quote(column)),
                IndexPartKind::Expr(_) => None,
            })
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("PRIMARY KEY ({columns})"));
    }
    for check in &table.checks {
        parts.push(format!(
            "CONSTRAINT {} CHECK ({})",
            quote(&check.name),
            check.expr
        ));
    }
    for fk in &table.foreign_keys {
        parts.push(render_fk(fk));
    }

    let mut out = format!("CREATE TABLE {} ({})", quote(name), parts.join(", "));
    if matches!(
        get_attr(&table.attrs, "without_rowid"),
        Some(Attr::WithoutRowid)
    ) {
        out.push_str(" WITHOUT ROWID");
    }
    out
}

fn render_column(column: &Column) -> String {
    let mut out = format!("{} {}", quote(&column.name), column.ty.raw);
    out.push_str(if column.null { " NULL" } else { " NOT NULL" });
    if let Some(default) = &column.default {
        let _ = write!(out, " DEFAULT {}", render_expr(default));
    }
    if let Some(generated) = &column.generated {
        let kind = match generated.kind {
            drift_core::GeneratedKind::Stored => "STORED",
            drift_core::GeneratedKind::Virtual => "VIRTUAL",
        };
        let _ = write!(out, " GENERATED ALWAYS AS ({}) {kind}", generated.expr);
    }
    out
}

fn render_fk(fk: &ForeignKey) -> String {
    let mut out = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        quote(&fk.symbol),
        quote_list(&fk.columns),
        quote(&fk.ref_table.name),
        quote_list(&fk.ref_columns),
    );
    if fk.on_update != RefAction::NoAction {
        let _ = write!(out, " ON UPDATE {}", fk.on_update.as_sql());
    }
    if fk.on_delete != RefAction::NoAction {
        let _ = write!(out, " ON DELETE {}", fk.on_delete.as_sql());
    }
    out
}

fn render_create_index(table: &TableRef, index: &Index) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let parts = index
        .parts
        .iter()
        .map(|part| {
            let mut rendered = match &part.kind {
                IndexPartKind::Column(name) => quote(name),
                IndexPartKind::Expr(expr) => format!("({})", render_expr(expr)),
            };
            if part.desc {
                rendered.push_str(" DESC");
            }
            rendered
        })
        .collect::<Vec<_>>()
        .join(", ");
    let mut out = format!(
        "CREATE {unique}INDEX {} ON {} ({parts})",
        quote(&index.name),
        quote(&table.name)
    );
    if let Some(predicate) = &index.predicate {
        let _ = write!(out, " WHERE {}", render_expr(predicate));
    }
    out
}

fn render_create_trigger(table: &TableRef, trigger: &Trigger) -> String {
    let timing = match trigger.timing {
        TriggerTiming::Before => "BEFORE",
        TriggerTiming::After => "AFTER",
    };
    let event = trigger
        .events
        .first()
        .map(|event| match event {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        })
        .unwrap_or("INSERT");
    format!(
        "CREATE TRIGGER {} {timing} {event} ON {} FOR EACH ROW BEGIN {} END",
        quote(&trigger.name),
        quote(&table.name),
        trigger.body
    )
}

fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(Literal::String(text)) => format!("'{}'", text.replace('\'', "''")),
        Expr::Literal(Literal::Int(value)) => value.to_string(),
        Expr::Literal(Literal::Float(value)) => value.to_string(),
        Expr::Literal(Literal::Bool(value)) => if *value { "true" } else { "false" }.to_string(),
        Expr::Raw(raw) => raw.clone(),
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote(name))
        .collect::<Vec<_>>()
        .join(", ")
}
