use std::fmt::Write as _;

use drift_core::{
    Attr, Change, Check, Column, ColumnChange, Expr, ForeignKey, Index, IndexPartKind, Literal,
    Object, Plan, PlanError, PlanFormatter, PlanStatement, RefAction, Result, Table, TableRef,
    Trigger, TriggerEvent, TriggerTiming, View, get_attr,
};

const DIALECT: &str = "postgres";

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresPlan;

impl PlanFormatter for PostgresPlan {
    fn dialect(&self) -> &'static str {
        DIALECT
    }

    fn plan_changes(&self, name: &str, changes: &[Change]) -> Result<Plan> {
        let mut plan = Plan::new(name);
        for change in changes {
            emit(change, &mut plan)?;
        }
        Ok(plan)
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

fn emit(change: &Change, plan: &mut Plan) -> Result<()> {
    let comment = change.describe();
    match change {
        Change::AddSchema { schema } => {
            plan.push(
                PlanStatement::new(format!("CREATE SCHEMA {}", quote(&schema.name)), comment)
                    .with_reverse(format!("DROP SCHEMA {}", quote(&schema.name))),
            );
        }
        Change::DropSchema { schema } => {
            plan.push(PlanStatement::new(
                format!("DROP SCHEMA {} CASCADE", quote(&schema.name)),
                comment,
            ));
        }
        Change::AddTable { table } => {
            plan.push(
                PlanStatement::new(render_create_table(table)?, comment)
                    .with_reverse(format!("DROP TABLE {}", table_name(table))),
            );
        }
        Change::DropTable { table } => {
            plan.push(PlanStatement::new(
                format!("DROP TABLE {}", table_name(table)),
                comment,
            ));
        }
        Change::RenameTable { from, to } => {
            plan.push(
                PlanStatement::new(
                    format!(
                        "ALTER TABLE {} RENAME TO {}",
                        qualified(from),
                        quote(&to.name)
                    ),
                    comment,
                )
                .with_reverse(format!(
                    "ALTER TABLE {} RENAME TO {}",
                    qualified(to),
                    quote(&from.name)
                )),
            );
        }
        Change::AddColumn { table, column } => {
            plan.push(
                PlanStatement::new(
                    format!(
                        "ALTER TABLE {} ADD COLUMN {}",
                        qualified(table),
                        render_column(column)?
                    ),
                    comment,
                )
                .with_reverse(format!(
                    "ALTER TABLE {} DROP COLUMN {}",
                    qualified(table),
                    quote(&column.name)
                )),
            );
        }
        Change::DropColumn { table, column } => {
            plan.push(PlanStatement::new(
                format!(
                    "ALTER TABLE {} DROP COLUMN {}",
                    qualified(table),
                    quote(&column.name)
                ),
                comment,
            ));
        }
        Change::ModifyColumn {
            table,
            from,
            to,
            change: mask,
        } => {
            emit_modify_column(change, table, from, to, *mask, plan)?;
        }
        Change::RenameColumn { table, from, to } => {
            plan.push(
                PlanStatement::new(
                    format!(
                        "ALTER TABLE {} RENAME COLUMN {} TO {}",
                        qualified(table),
                        quote(from),
                        quote(to)
                    ),
                    comment,
                )
                .with_reverse(format!(
                    "ALTER TABLE {} RENAME COLUMN {} TO {}",
                    qualified(table),
                    quote(to),
                    quote(from)
                )),
            );
        }
        Change::AddIndex { table, index } => {
            let concurrent = is_concurrent(index);
            let statement =
                PlanStatement::new(render_create_index(table, index), comment).with_reverse(
                    format!("DROP INDEX {}", index_name(table, index)),
                );
            plan.push(if concurrent {
                statement.non_transactional()
            } else {
                statement
            });
        }
        Change::DropIndex { table, index } => {
            let concurrent = is_concurrent(index);
            let concurrently = if concurrent { " CONCURRENTLY" } else { "" };
            let statement = PlanStatement::new(
                format!("DROP INDEX{concurrently} {}", index_name(table, index)),
                comment,
            )
            .with_reverse(render_create_index(table, index));
            plan.push(if concurrent {
                statement.non_transactional()
            } else {
                statement
            });
        }
        Change::ModifyIndex { table, from, to, .. } => {
            plan.push(PlanStatement::new(
                format!("DROP INDEX {}", index_name(table, from)),
                format!("Drop index {:?} to modify it", from.name),
            ));
            plan.push(
                PlanStatement::new(render_create_index(table, to), comment)
                    .with_reverse(render_create_index(table, from)),
            );
        }
        Change::RenameIndex { table, from, to } => {
            plan.push(
                PlanStatement::new(
                    format!(
                        "ALTER INDEX {} RENAME TO {}",
                        scoped_name(table, from),
                        quote(to)
                    ),
                    comment,
                )
                .with_reverse(format!(
                    "ALTER INDEX {} RENAME TO {}",
                    scoped_name(table, to),
                    quote(from)
                )),
            );
        }
        Change::AddPrimaryKey { table, pk } => {
            plan.push(
                PlanStatement::new(
                    format!(
                        "ALTER TABLE {} ADD PRIMARY KEY ({})",
                        qualified(table),
                        part_columns(pk)?
                    ),
                    comment,
                )
                .with_reverse(format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    qualified(table),
                    pk_constraint(table)
                )),
            );
        }
        Change::DropPrimaryKey { table, .. } => {
            plan.push(PlanStatement::new(
                format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    qualified(table),
                    pk_constraint(table)
                ),
                comment,
            ));
        }
        Change::ModifyPrimaryKey { table, from, to, .. } => {
            plan.push(PlanStatement::new(
                format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    qualified(table),
                    pk_constraint(table)
                ),
                format!("Drop primary key of table {:?} to modify it", table.name),
            ));
            plan.push(
                PlanStatement::new(
                    format!(
                        "ALTER TABLE {} ADD PRIMARY KEY ({})",
                        qualified(table),
                        part_columns(to)?
                    ),
                    comment,
                )
                .with_reverse(format!(
                    "ALTER TABLE {} ADD PRIMARY KEY ({})",
                    qualified(table),
                    part_columns(from)?
                )),
            );
        }
        Change::AddForeignKey { table, fk } => {
            plan.push(
                PlanStatement::new(render_add_fk(table, fk), comment).with_reverse(format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    qualified(table),
                    quote(&fk.symbol)
                )),
            );
        }
        Change::DropForeignKey { table, fk } => {
            plan.push(
                PlanStatement::new(
                    format!(
                        "ALTER TABLE {} DROP CONSTRAINT {}",
                        qualified(table),
                        quote(&fk.symbol)
                    ),
                    comment,
                )
                .with_reverse(render_add_fk(table, fk)),
            );
        }
        Change::ModifyForeignKey { table, from, to, .. } => {
            plan.push(PlanStatement::new(
                format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    qualified(table),
                    quote(&from.symbol)
                ),
                format!("Drop foreign key {:?} to modify it", from.symbol),
            ));
            plan.push(
                PlanStatement::new(render_add_fk(table, to), comment)
                    .with_reverse(render_add_fk(table, from)),
            );
        }
        Change::AddCheck { table, check } => {
            plan.push(
                PlanStatement::new(render_add_check(table, check), comment).with_reverse(
                    format!(
                        "ALTER TABLE {} DROP CONSTRAINT {}",
                        qualified(table),
                        quote(&check.name)
                    ),
                ),
            );
        }
        Change::DropCheck { table, check } => {
            plan.push(
                PlanStatement::new(
                    format!(
                        "ALTER TABLE {} DROP CONSTRAINT {}",
                        qualified(table),
                        quote(&check.name)
                    ),
                    comment,
                )
                .with_reverse(render_add_check(table, check)),
            );
        }
        Change::ModifyCheck { table, from, to } => {
            plan.push(PlanStatement::new(
                format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    qualified(table),
                    quote(&from.name)
                ),
                format!("Drop check {:?} to modify it", from.name),
            ));
            plan.push(
                PlanStatement::new(render_add_check(table, to), comment)
                    .with_reverse(render_add_check(table, from)),
            );
        }
        Change::ModifyTable { table, changes } => {
            for nested in changes {
                emit_table_attr(change, table, nested, plan)?;
            }
        }
        Change::ModifySchema { .. } => {}
        Change::AddAttr { .. } | Change::DropAttr { .. } | Change::ModifyAttr { .. } => {
            return Err(unsupported(change, "realm attributes have no PostgreSQL form"));
        }
        Change::AddView { view } => {
            plan.push(
                PlanStatement::new(render_create_view(view, false), comment)
                    .with_reverse(format!("DROP VIEW {}", view_name(view))),
            );
        }
        Change::DropView { view } => {
            plan.push(
                PlanStatement::new(format!("DROP VIEW {}", view_name(view)), comment)
                    .with_reverse(render_create_view(view, false)),
            );
        }
        Change::ModifyView { from, to } => {
            plan.push(
                PlanStatement::new(render_create_view(to, true), comment)
                    .with_reverse(render_create_view(from, true)),
            );
        }
        Change::AddTrigger { table, trigger } => {
            plan.push(
                PlanStatement::new(render_create_trigger(table, trigger), comment).with_reverse(
                    format!(
                        "DROP TRIGGER {} ON {}",
                        quote(&trigger.name),
                        qualified(table)
                    ),
                ),
            );
        }
        Change::DropTrigger { table, trigger } => {
            plan.push(
                PlanStatement::new(
                    format!(
                        "DROP TRIGGER {} ON {}",
                        quote(&trigger.name),
                        qualified(table)
                    ),
                    comment,
                )
                .with_reverse(render_create_trigger(table, trigger)),
            );
        }
        Change::AddObject { schema, object } => match object {
            Object::Enum(decl) => {
                let values = decl
                    .values
                    .iter()
                    .map(|value| sql_string(value))
                    .collect::<Vec<_>>()
                    .join(", ");
                plan.push(
                    PlanStatement::new(
                        format!(
                            "CREATE TYPE {}.{} AS ENUM ({values})",
                            quote(schema),
                            quote(&decl.name)
                        ),
                        comment,
                    )
                    .with_reverse(format!("DROP TYPE {}.{}", quote(schema), quote(&decl.name))),
                );
            }
            Object::Func(func) => {
                plan.push(PlanStatement::new(func.def.clone(), comment).with_reverse(format!(
                    "DROP FUNCTION {}.{}",
                    quote(schema),
                    quote(&func.name)
                )));
            }
            Object::Proc(proc) => {
                plan.push(PlanStatement::new(proc.def.clone(), comment).with_reverse(format!(
                    "DROP PROCEDURE {}.{}",
                    quote(schema),
                    quote(&proc.name)
                )));
            }
        },
        Change::DropObject { schema, object } => {
            let (kind, name) = match object {
                Object::Enum(decl) => ("TYPE", &decl.name),
                Object::Func(func) => ("FUNCTION", &func.name),
                Object::Proc(proc) => ("PROCEDURE", &proc.name),
            };
            plan.push(PlanStatement::new(
                format!("DROP {kind} {}.{}", quote(schema), quote(name)),
                comment,
            ));
        }
        Change::ModifyObject { schema, from, to } => {
            emit_modify_object(change, schema, from, to, plan)?;
        }
    }
    Ok(())
}

fn emit_modify_column(
    change: &Change,
    table: &TableRef,
    from: &Column,
    to: &Column,
    mask: ColumnChange,
    plan: &mut Plan,
) -> Result<()> {
    let alter = |action: String| format!("ALTER TABLE {} {action}", qualified(table));
    let column = quote(&to.name);

    if mask.contains(ColumnChange::NULL) {
        let action = if to.null { "DROP" } else { "SET" };
        let reverse_action = if to.null { "SET" } else { "DROP" };
        plan.push(
            PlanStatement::new(
                alter(format!("ALTER COLUMN {column} {action} NOT NULL")),
                change.describe(),
            )
            .with_reverse(alter(format!(
                "ALTER COLUMN {column} {reverse_action} NOT NULL"
            ))),
        );
    }
    if mask.contains(ColumnChange::TYPE) {
        plan.push(
            PlanStatement::new(
                alter(format!("ALTER COLUMN {column} TYPE {}", to.ty.raw)),
                change.describe(),
            )
            .with_reverse(alter(format!("ALTER COLUMN {column} TYPE {}", from.ty.raw))),
        );
    }
    if mask.contains(ColumnChange::DEFAULT) {
        let forward = match &to.default {
            Some(default) => alter(format!(
                "ALTER COLUMN {column} SET DEFAULT {}",
                render_expr(default)
            )),
            None => alter(format!("ALTER COLUMN {column} DROP DEFAULT")),
        };
        let reverse = match &from.default {
            Some(default) => alter(format!(
                "ALTER COLUMN {column} SET DEFAULT {}",
                render_expr(default)
            )),
            None => alter(format!("ALTER COLUMN {column} DROP DEFAULT")),
        };
        plan.push(PlanStatement::new(forward, change.describe()).with_reverse(reverse));
    }
    if mask.contains(ColumnChange::COMMENT) {
        plan.push(
            PlanStatement::new(
                render_column_comment(table, to),
                change.describe(),
            )
            .with_reverse(render_column_comment(table, from)),
        );
    }
    if mask.contains(ColumnChange::GENERATED) || mask.contains(ColumnChange::GENERATED_EXPR) {
        return Err(unsupported(
            change,
            "changing a generation expression requires dropping and re-adding the column",
        ));
    }
    if mask.contains(ColumnChange::ATTR) {
        emit_identity_change(change, table, from, to, plan)?;
    }
    if mask.contains(ColumnChange::COLLATION) {
        plan.push(
            PlanStatement::new(
                alter(format!(
                    "ALTER COLUMN {column} TYPE {} COLLATE {}",
                    to.ty.raw,
                    quote(drift_core::collation_of(&to.attrs).unwrap_or("default"))
                )),
                change.describe(),
            ),
        );
    }
    Ok(())
}

fn emit_identity_change(
    change: &Change,
    table: &TableRef,
    from: &Column,
    to: &Column,
    plan: &mut Plan,
) -> Result<()> {
    let identity = |column: &Column| {
        column.attrs.iter().find_map(|attr| match attr {
            Attr::Identity { seed, increment } => Some((*seed, *increment)),
            _ => None,
        })
    };
    let alter = |action: String| format!("ALTER TABLE {} {action}", qualified(table));
    let column = quote(&to.name);

    match (identity(from), identity(to)) {
        (None, Some((seed, increment))) => {
            plan.push(
                PlanStatement::new(
                    alter(format!(
                        "ALTER COLUMN {column} ADD GENERATED BY DEFAULT AS IDENTITY \
                         (START WITH {seed} INCREMENT BY {increment})"
                    )),
                    change.describe(),
                )
                .with_reverse(alter(format!("ALTER COLUMN {column} DROP IDENTITY"))),
            );
        }
        (Some(_), None) => {
            plan.push(PlanStatement::new(
                alter(format!("ALTER COLUMN {column} DROP IDENTITY")),
                change.describe(),
            ));
        }
        (Some(_), Some((seed, increment))) => {
            plan.push(PlanStatement::new(
                alter(format!(
                    "ALTER COLUMN {column} SET GENERATED BY DEFAULT RESTART WITH {seed} \
                     SET INCREMENT BY {increment}"
                )),
                change.describe(),
            ));
        }
        (None, None) => {}
    }
    Ok(())
}

fn emit_table_attr(
    change: &Change,
    table: &TableRef,
    nested: &Change,
    plan: &mut Plan,
) -> Result<()> {
    let comment_sql = |text: &str| {
        format!(
            "COMMENT ON TABLE {} IS {}",
            qualified(table),
            sql_string(text)
        )
    };
    match nested {
        Change::AddAttr {
            attr: Attr::Comment(text),
        }
        | Change::ModifyAttr {
            to: Attr::Comment(text),
            ..
        } => {
            plan.push(PlanStatement::new(comment_sql(text), nested.describe()));
            Ok(())
        }
        Change::DropAttr {
            attr: Attr::Comment(_),
        } => {
            plan.push(PlanStatement::new(
                format!("COMMENT ON TABLE {} IS NULL", qualified(table)),
                nested.describe(),
            ));
            Ok(())
        }
        _ => Err(unsupported(change, "unsupported table attribute change")),
    }
}

fn emit_modify_object(
    change: &Change,
    schema: &str,
    from: &Object,
    to: &Object,
    plan: &mut Plan,
) -> Result<()> {
    match (from, to) {
        (Object::Enum(from_decl), Object::Enum(to_decl)) => {
            let removed = from_decl
                .values
                .iter()
                .any(|value| !to_decl.values.contains(value));
            if removed {
                return Err(unsupported(change, "PostgreSQL cannot drop enum values"));
            }
            for value in &to_decl.values {
                if !from_decl.values.contains(value) {
                    plan.push(PlanStatement::new(
                        format!(
                            "ALTER TYPE {}.{} ADD VALUE {}",
                            quote(schema),
                            quote(&to_decl.name),
                            sql_string(value)
                        ),
                        change.describe(),
                    ));
                }
            }
            Ok(())
        }
        (Object::Func(_), Object::Func(func)) => {
            plan.push(PlanStatement::new(func.def.clone(), change.describe()));
            Ok(())
        }
        (Object::Proc(_), Object::Proc(proc)) => {
            plan.push(PlanStatement::new(proc.def.clone(), change.describe()));
            Ok(())
        }
        _ => Err(unsupported(change, "object kinds do not match")),
    }
}

pub(crate) fn render_create_table(table: &Table) -> Result<String> {
    let mut parts = Vec::new();
    for column in &table.columns {
        parts.push(render_column(column)?);
    }
    if let Some(pk) = &table.primary_key {
        parts.push(format!("PRIMARY KEY ({})", part_columns(pk)?));
    }
    for check in &table.checks {
        parts.push(format!(
            "CONSTRAINT {} CHECK ({})",
            quote(&check.name),
            check.expr
        ));
    }
    Ok(format!(
        "CREATE TABLE {} ({})",
        table_name(table),
        parts.join(", ")
    ))
}

fn render_column(column: &Column) -> Result<String> {
    let mut out = format!("{} {}", quote(&column.name), column.ty.raw);
    if let Some(generated) = &column.generated {
        if generated.kind == drift_core::GeneratedKind::Virtual {
            return Err(PlanError::Unsupported {
                dialect: DIALECT.to_string(),
                change: "AddColumn".to_string(),
                reason: "PostgreSQL only supports stored generated columns".to_string(),
            }
            .into());
        }
        let _ = write!(out, " GENERATED ALWAYS AS ({}) STORED", generated.expr);
    }
    if column.null {
        out.push_str(" NULL");
    } else {
        out.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        let _ = write!(out, " DEFAULT {}", render_expr(default));
    }
    if let Some(Attr::Identity { seed, increment }) = get_attr(&column.attrs, "identity") {
        let _ = write!(
            out,
            " GENERATED BY DEFAULT AS IDENTITY (START WITH {seed} INCREMENT BY {increment})"
        );
    }
    Ok(out)
}

fn render_create_index(table: &TableRef, index: &Index) -> String {
    let mut out = String::from("CREATE ");
    if index.unique {
        out.push_str("UNIQUE ");
    }
    out.push_str("INDEX ");
    if is_concurrent(index) {
        out.push_str("CONCURRENTLY ");
    }
    let _ = write!(out, "{} ON {}", quote(&index.name), qualified(table));
    if let Some(Attr::IndexType(method)) = get_attr(&index.attrs, "type") {
        let _ = write!(out, " USING {method}");
    }
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
    let _ = write!(out, " ({parts})");
    if let Some(Attr::Include(columns)) = get_attr(&index.attrs, "include") {
        let include = columns
            .iter()
            .map(|column| quote(column))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, " INCLUDE ({include})");
    }
    if let Some(predicate) = &index.predicate {
        let _ = write!(out, " WHERE {}", render_expr(predicate));
    }
    out
}

fn render_add_fk(table: &TableRef, fk: &ForeignKey) -> String {
    let columns = quote_list(&fk.columns);
    let ref_columns = quote_list(&fk.ref_columns);
    let mut out = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({columns}) REFERENCES {}.{} ({ref_columns})",
        qualified(table),
        quote(&fk.symbol),
        quote(&fk.ref_table.schema),
        quote(&fk.ref_table.name),
    );
    if fk.on_update != RefAction::NoAction {
        let _ = write!(out, " ON UPDATE {}", fk.on_update.as_sql());
    }
    if fk.on_delete != RefAction::NoAction {
        let _ = write!(out, " ON DELETE {}", fk.on_delete.as_sql());
    }
    out
}

fn render_add_check(table: &TableRef, check: &Check) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({})",
        qualified(table),
        quote(&check.name),
        check.expr
    )
}

fn render_create_view(view: &View, or_replace: bool) -> String {
    let replace = if or_replace { "OR REPLACE " } else { "" };
    format!("CREATE {replace}VIEW {} AS {}", view_name(view), view.def)
}

fn render_create_trigger(table: &TableRef, trigger: &Trigger) -> String {
    let timing = match trigger.timing {
        TriggerTiming::Before => "BEFORE",
        TriggerTiming::After => "AFTER",
    };
    let events = trigger
        .events
        .iter()
        .map(|event| match event {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    let for_each = if trigger.for_each_row {
        "FOR EACH ROW"
    } else {
        "FOR EACH STATEMENT"
    };
    format!(
        "CREATE TRIGGER {} {timing} {events} ON {} {for_each} {}",
        quote(&trigger.name),
        qualified(table),
        trigger.body
    )
}

fn render_column_comment(table: &TableRef, column: &Column) -> String {
    match column.comment() {
        Some(text) => format!(
            "COMMENT ON COLUMN {}.{} IS {}",
            qualified(table),
            quote(&column.name),
            sql_string(text)
        ),
        None => format!(
            "COMMENT ON COLUMN {}.{} IS NULL",
            qualified(table),
            quote(&column.name)
        ),
    }
}

pub(crate) fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(Literal::String(text)) => sql_string(text),
        Expr::Literal(Literal::Int(value)) => value.to_string(),
        Expr::Literal(Literal::Float(value)) => value.to_string(),
        Expr::Literal(Literal::Bool(value)) => if *value { "true" } else { "false" }.to_string(),
        Expr::Raw(raw) => raw.clone(),
    }
}

fn part_columns(index: &Index) -> Result<String> {
    let mut rendered = Vec::new();
    for part in &index.parts {
        match &part.kind {
            IndexPartKind::Column(name) => rendered.push(quote(name)),
            IndexPartKind::Expr(_) => {
                return Err(PlanError::Unsupported {
                    dialect: DIALECT.to_string(),
                    change: "ModifyPrimaryKey".to_string(),
                    reason: "primary keys cannot contain expressions".to_string(),
                }
                .into());
            }
        }
    }
    Ok(rendered.join(", "))
}

fn is_concurrent(index: &Index) -> bool {
    matches!(get_attr(&index.attrs, "concurrently"), Some(Attr::Concurrently))
}

fn pk_constraint(table: &TableRef) -> String {
    quote(&format!("{}_pkey", table.name))
}

fn table_name(table: &Table) -> String {
    format!("{}.{}", quote(&table.schema), quote(&table.name))
}

fn view_name(view: &View) -> String {
    format!("{}.{}", quote(&view.schema), quote(&view.name))
}

fn qualified(table: &TableRef) -> String {
    format!("{}.{}", quote(&table.schema), quote(&table.name))
}

fn scoped_name(table: &TableRef, name: &str) -> String {
    format!("{}.{}", quote(&table.schema), quote(name))
}

fn index_name(table: &TableRef, index: &Index) -> String {
    scoped_name(table, &index.name)
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

fn sql_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
