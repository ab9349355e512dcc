use std::fmt::Write as _;

use drift_core::{
    Attr, Change, Check, Column, Expr, ForeignKey, Index, IndexPartKind, Literal, Object, Plan,
    PlanError, PlanFormatter, PlanStatement, RefAction, Result, Table, TableRef, Trigger,
    TriggerEvent, TriggerTiming, get_attr,
};

use crate::types::Flavor;

/// Plans changes as MySQL DDL. Consecutive table-level alterations against
/// the same table are batched into a single `ALTER TABLE` command.
#[derive(Debug, Clone, Copy)]
pub struct MysqlPlan {
    pub flavor: Flavor,
}

/// One clause of a batched `ALTER TABLE`, with its best-effort reverse.
struct AlterAction {
    action: String,
    reverse: Option<String>,
}

impl PlanFormatter for MysqlPlan {
    fn dialect(&self) -> &'static str {
        self.flavor.dialect_name()
    }

    fn plan_changes(&self, name: &str, changes: &[Change]) -> Result<Plan> {
        let mut plan = Plan::new(name);
        let mut index = 0usize;

        while index < changes.len() {
            if let Some(table) = batch_table(&changes[index]) {
                let start = index;
                while index < changes.len() && batch_table(&changes[index]).as_ref() == Some(&table)
                {
                    index += 1;
                }
                self.emit_alter_batch(&table, &changes[start..index], &mut plan)?;
                continue;
            }

            self.emit_single(&changes[index], &mut plan)?;
            index += 1;
        }

        Ok(plan)
    }
}

/// Table-scoped changes that fold into one ALTER TABLE statement.
fn batch_table(change: &Change) -> Option<TableRef> {
    match change {
        Change::AddColumn { table, .. }
        | Change::DropColumn { table, .. }
        | Change::ModifyColumn { table, .. }
        | Change::RenameColumn { table, .. }
        | Change::AddPrimaryKey { table, .. }
        | Change::DropPrimaryKey { table, .. }
        | Change::ModifyPrimaryKey { table, .. }
        | Change::AddCheck { table, .. }
        | Change::DropCheck { table, .. }
        | Change::ModifyCheck { table, .. }
        | Change::AddForeignKey { table, .. }
        | Change::DropForeignKey { table, .. }
        | Change::ModifyForeignKey { table, .. }
        | Change::AddIndex { table, .. }
        | Change::DropIndex { table, .. }
        | Change::ModifyIndex { table, .. }
        | Change::RenameIndex { table, .. }
        | Change::ModifyTable { table, .. } => Some(table.clone()),
        _ => None,
    }
}

impl MysqlPlan {
    fn emit_alter_batch(
        &self,
        table: &TableRef,
        changes: &[Change],
        plan: &mut Plan,
    ) -> Result<()> {
        let mut actions = Vec::new();
        for change in changes {
            self.alter_actions(change, &mut actions)?;
        }
        if actions.is_empty() {
            return Ok(());
        }

        let cmd = format!(
            "ALTER TABLE {} {}",
            quote(&table.name),
            actions
                .iter()
                .map(|action| action.action.clone())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let comment = if changes.len() == 1 {
            changes[0].describe()
        } else {
            format!("Modify {:?} table", table.name)
        };

        let mut statement = PlanStatement::new(cmd, comment).non_transactional();
        let reversible = actions.iter().all(|action| action.reverse.is_some());
        if reversible {
            let reverse = actions
                .iter()
                .rev()
                .filter_map(|action| action.reverse.clone())
                .collect::<Vec<_>>()
                .join(", ");
            statement = statement.with_reverse(format!(
                "ALTER TABLE {} {reverse}",
                quote(&table.name)
            ));
        }
        plan.push(statement);
        Ok(())
    }

    fn alter_actions(&self, change: &Change, actions: &mut Vec<AlterAction>) -> Result<()> {
        match change {
            Change::AddColumn { column, .. } => actions.push(AlterAction {
                action: format!("ADD COLUMN {}", self.render_column(column)?),
                reverse: Some(format!("DROP COLUMN {}", quote(&column.name))),
            }),
            Change::DropColumn { column, .. } => actions.push(AlterAction {
                action: format!("DROP COLUMN {}", quote(&column.name)),
                reverse: None,
            }),
            // MySQL redefines the whole column on change, so the mask only
            // gates whether the statement exists at all.
            Change::ModifyColumn { from, to, .. } => actions.push(AlterAction {
                action: format!("MODIFY COLUMN {}", self.render_column(to)?),
                reverse: Some(format!("MODIFY COLUMN {}", self.render_column(from)?)),
            }),
            Change::RenameColumn { from, to, .. } => actions.push(AlterAction {
                action: format!("RENAME COLUMN {} TO {}", quote(from), quote(to)),
                reverse: Some(format!("RENAME COLUMN {} TO {}", quote(to), quote(from))),
            }),
            Change::AddPrimaryKey { pk, .. } => actions.push(AlterAction {
                action: format!("ADD PRIMARY KEY ({})", part_list(pk)?),
                reverse: Some("DROP PRIMARY KEY".to_string()),
            }),
            Change::DropPrimaryKey { pk, .. } => actions.push(AlterAction {
                action: "DROP PRIMARY KEY".to_string(),
                reverse: Some(format!("ADD PRIMARY KEY ({})", part_list(pk)?)),
            }),
            Change::ModifyPrimaryKey { from, to, .. } => {
                actions.push(AlterAction {
                    action: "DROP PRIMARY KEY".to_string(),
                    reverse: Some(format!("ADD PRIMARY KEY ({})", part_list(from)?)),
                });
                actions.push(AlterAction {
                    action: format!("ADD PRIMARY KEY ({})", part_list(to)?),
                    reverse: Some("DROP PRIMARY KEY".to_string()),
                });
            }
            Change::AddCheck { check, .. } => actions.push(AlterAction {
                action: render_add_check(check),
                reverse: Some(format!("DROP CHECK {}", quote(&check.name))),
            }),
            Change::DropCheck { check, .. } => actions.push(AlterAction {
                action: format!("DROP CHECK {}", quote(&check.name)),
                reverse: Some(render_add_check(check)),
            }),
            Change::ModifyCheck { from, to, .. } => {
                actions.push(AlterAction {
                    action: format!("DROP CHECK {}", quote(&from.name)),
                    reverse: Some(render_add_check(from)),
                });
                actions.push(AlterAction {
                    action: render_add_check(to),
                    reverse: Some(format!("DROP CHECK {}", quote(&to.name))),
                });
            }
            Change::AddForeignKey { fk, .. } => actions.push(AlterAction {
                action: render_add_fk(fk),
                reverse: Some(format!("DROP FOREIGN KEY {}", quote(&fk.symbol))),
            }),
            Change::DropForeignKey { fk, .. } => actions.push(AlterAction {
                action: format!("DROP FOREIGN KEY {}", quote(&fk.symbol)),
                reverse: Some(render_add_fk(fk)),
            }),
            Change::ModifyForeignKey { from, to, .. } => {
                actions.push(AlterAction {
                    action: format!("DROP FOREIGN KEY {}", quote(&from.symbol)),
                    reverse: Some(render_add_fk(from)),
                });
                actions.push(AlterAction {
                    action: render_add_fk(to),
                    reverse: Some(format!("DROP FOREIGN KEY {}", quote(&to.symbol))),
                });
            }
            Change::AddIndex { index, .. } => actions.push(AlterAction {
                action: render_add_index(self.flavor, index)?,
                reverse: Some(format!("DROP INDEX {}", quote(&index.name))),
            }),
            Change::DropIndex { index, .. } => actions.push(AlterAction {
                action: format!("DROP INDEX {}", quote(&index.name)),
                reverse: render_add_index(self.flavor, index).ok(),
            }),
            Change::ModifyIndex { from, to, .. } => {
                actions.push(AlterAction {
                    action: format!("DROP INDEX {}", quote(&from.name)),
                    reverse: render_add_index(self.flavor, from).ok(),
                });
                actions.push(AlterAction {
                    action: render_add_index(self.flavor, to)?,
                    reverse: Some(format!("DROP INDEX {}", quote(&to.name))),
                });
            }
            Change::RenameIndex { from, to, .. } => actions.push(AlterAction {
                action: format!("RENAME INDEX {} TO {}", quote(from), quote(to)),
                reverse: Some(format!("RENAME INDEX {} TO {}", quote(to), quote(from))),
            }),
            Change::ModifyTable { changes, .. } => {
                for nested in changes {
                    actions.push(self.table_option_action(change, nested)?);
                }
            }
            other => {
                return Err(self.unsupported(other, "not a table-level alteration"));
            }
        }
        Ok(())
    }

    fn table_option_action(&self, change: &Change, nested: &Change) -> Result<AlterAction> {
        let attr = match nested {
            Change::AddAttr { attr } | Change::ModifyAttr { to: attr, .. } => attr,
            Change::DropAttr { attr } => {
                return match attr {
                    Attr::Comment(_) => Ok(AlterAction {
                        action: "COMMENT = ''".to_string(),
                        reverse: None,
                    }),
                    _ => Err(self.unsupported(change, "table option cannot be unset")),
                };
            }
            _ => return Err(self.unsupported(change, "unsupported table change")),
        };
        let action = match attr {
            Attr::Comment(text) => format!("COMMENT = {}", sql_string(text)),
            Attr::Engine(engine) => format!("ENGINE = {engine}"),
            Attr::Charset(charset) => format!("DEFAULT CHARACTER SET {charset}"),
            Attr::Collation(collation) => format!("COLLATE = {collation}"),
            Attr::AutoIncrement(value) => format!("AUTO_INCREMENT = {value}"),
            _ => return Err(self.unsupported(change, "unsupported table option")),
        };
        Ok(AlterAction {
            action,
            reverse: None,
        })
    }

    fn emit_single(&self, change: &Change, plan: &mut Plan) -> Result<()> {
        let comment = change.describe();
        match change {
            Change::AddSchema { schema } => {
                plan.push(
                    PlanStatement::new(
                        format!("CREATE DATABASE {}", quote(&schema.name)),
                        comment,
                    )
                    .with_reverse(format!("DROP DATABASE {}", quote(&schema.name)))
                    .non_transactional(),
                );
            }
            Change::DropSchema { schema } => {
                plan.push(
                    PlanStatement::new(format!("DROP DATABASE {}", quote(&schema.name)), comment)
                        .non_transactional(),
                );
            }
            Change::ModifySchema { .. } => {}
            Change::AddTable { table } => {
                plan.push(
                    PlanStatement::new(self.render_create_table(table)?, comment)
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
                        format!("RENAME TABLE {} TO {}", quote(&from.name), quote(&to.name)),
                        comment,
                    )
                    .with_reverse(format!(
                        "RENAME TABLE {} TO {}",
                        quote(&to.name),
                        quote(&from.name)
                    ))
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
                        format!("CREATE OR REPLACE VIEW {} AS {}", quote(&to.name), to.def),
                        comment,
                    )
                    .with_reverse(format!(
                        "CREATE OR REPLACE VIEW {} AS {}",
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
            // Enum objects have no standalone DDL on MySQL: the values are
            // inlined into the column type.
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
            Change::AddObject { object, .. } | Change::ModifyObject { to: object, .. } => {
                let def = match object {
                    Object::Func(func) => &func.def,
                    Object::Proc(proc) => &proc.def,
                    Object::Enum(_) => unreachable!("enum objects are matched above"),
                };
                plan.push(PlanStatement::new(def.clone(), comment).non_transactional());
            }
            Change::DropObject { object, .. } => {
                let (kind, name) = match object {
                    Object::Func(func) => ("FUNCTION", &func.name),
                    Object::Proc(proc) => ("PROCEDURE", &proc.name),
                    Object::Enum(_) => unreachable!("enum objects are matched above"),
                };
                plan.push(
                    PlanStatement::new(format!("DROP {kind} {}", quote(name)), comment)
                        .non_transactional(),
                );
            }
            Change::AddAttr { .. } | Change::DropAttr { .. } | Change::ModifyAttr { .. } => {}
            other => {
                return Err(self.unsupported(other, "change is table-scoped"));
            }
        }
        Ok(())
    }

    fn render_create_table(&self, table: &Table) -> Result<String> {
        let mut parts = Vec::new();
        for column in &table.columns {
            parts.push(self.render_column(column)?);
        }
        if let Some(pk) = &table.primary_key {
            parts.push(format!("PRIMARY KEY ({})", part_list(pk)?));
        }
        for check in &table.checks {
            parts.push(format!(
                "CONSTRAINT {} CHECK ({})",
                quote(&check.name),
                check.expr
            ));
        }

        let mut out = format!("CREATE TABLE {} ({})", quote(&table.name), parts.join(", "));
        if let Some(Attr::Engine(engine)) = get_attr(&table.attrs, "engine") {
            let _ = write!(out, " ENGINE = {engine}");
        }
        if let Some(Attr::Charset(charset)) = get_attr(&table.attrs, "charset") {
            let _ = write!(out, " DEFAULT CHARACTER SET {charset}");
        }
        if let Some(Attr::Collation(collation)) = get_attr(&table.attrs, "collate") {
            let _ = write!(out, " COLLATE = {collation}");
        }
        if let Some(comment) = table.comment() {
            let _ = write!(out, " COMMENT = {}", sql_string(comment));
        }
        Ok(out)
    }

    fn render_column(&self, column: &Column) -> Result<String> {
        let mut out = format!("{} {}", quote(&column.name), column.ty.raw);
        if let Some(Attr::Charset(charset)) = get_attr(&column.attrs, "charset") {
            let _ = write!(out, " CHARACTER SET {charset}");
        }
        if let Some(collation) = drift_core::collation_of(&column.attrs) {
            let _ = write!(out, " COLLATE {collation}");
        }
        if let Some(generated) = &column.generated {
            let kind = match generated.kind {
                drift_core::GeneratedKind::Stored => "STORED",
                drift_core::GeneratedKind::Virtual => "VIRTUAL",
            };
            let _ = write!(out, " GENERATED ALWAYS AS ({}) {kind}", generated.expr);
        }
        out.push_str(if column.null { " NULL" } else { " NOT NULL" });
        if let Some(default) = &column.default {
            let _ = write!(out, " DEFAULT {}", render_expr(default));
        }
        if matches!(
            get_attr(&column.attrs, "auto_increment"),
            Some(Attr::AutoIncrement(_))
        ) {
            out.push_str(" AUTO_INCREMENT");
        }
        if let Some(comment) = column.comment() {
            let _ = write!(out, " COMMENT {}", sql_string(comment));
        }
        Ok(out)
    }

    fn unsupported(&self, change: &Change, reason: &str) -> drift_core::Error {
        PlanError::Unsupported {
            dialect: self.flavor.dialect_name().to_string(),
            change: change.op_name().to_string(),
            reason: reason.to_string(),
        }
        .into()
    }
}

fn render_add_index(flavor: Flavor, index: &Index) -> Result<String> {
    if index.predicate.is_some() {
        return Err(PlanError::Unsupported {
            dialect: flavor.dialect_name().to_string(),
            change: "AddIndex".to_string(),
            reason: "partial indexes are not supported".to_string(),
        }
        .into());
    }
    let unique = if index.unique { "UNIQUE " } else { "" };
    let parts = index
        .parts
        .iter()
        .map(|part| {
            let mut rendered = match &part.kind {
                IndexPartKind::Column(name) => quote(name),
                IndexPartKind::Expr(expr) => format!("({})", render_expr(expr)),
            };
            if let Some(prefix) = part.prefix_len {
                let _ = write!(rendered, "({prefix})");
            }
            if part.desc {
                rendered.push_str(" DESC");
            }
            rendered
        })
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("ADD {unique}INDEX {} ({parts})", quote(&index.name)))
}

fn render_add_check(check: &Check) -> String {
    format!(
        "ADD CONSTRAINT {} CHECK ({})",
        quote(&check.name),
        check.expr
    )
}

fn render_add_fk(fk: &ForeignKey) -> String {
    let mut out = format!(
        "ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
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
        "CREATE TRIGGER {} {timing} {event} ON {} FOR EACH ROW {}",
        quote(&trigger.name),
        quote(&table.name),
        trigger.body
    )
}

fn part_list(index: &Index) -> Result<String> {
    let mut rendered = Vec::new();
    for part in &index.parts {
        match &part.kind {
            IndexPartKind::Column(name) => rendered.push(quote(name)),
            IndexPartKind::Expr(_) => {
                return Err(PlanError::Unsupported {
                    dialect: "mysql".to_string(),
                    change: "ModifyPrimaryKey".to_string(),
                    reason: "primary keys cannot contain expressions".to_string(),
                }
                .into());
            }
        }
    }
    Ok(rendered.join(", "))
}

fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(Literal::String(text)) => sql_string(text),
        Expr::Literal(Literal::Int(value)) => value.to_string(),
        Expr::Literal(Literal::Float(value)) => value.to_string(),
        Expr::Literal(Literal::Bool(value)) => if *value { "true" } else { "false" }.to_string(),
        Expr::Raw(raw) => raw.clone(),
    }
}

fn quote(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote(name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn sql_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
