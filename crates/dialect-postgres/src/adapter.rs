use postgres::{Client, NoTls, Row};

use drift_core::{
    Applier, Attr, Cancellation, Change, Check, Column, ExecError, ForeignKey, Index, IndexPart,
    InspectOptions, Inspector, Plan, PlanFormatter, RefAction, Result, Schema, Table, TableRef,
    EnumType, Realm, parse_pattern,
};

use crate::{inspect_queries, plan::PostgresPlan, types::parse_pg_type};

/// Synchronous PostgreSQL driver backing introspection and apply.
pub struct PostgresDriver {
    client: Client,
}

pub fn connect(url: &str) -> Result<PostgresDriver> {
    let client = Client::connect(url, NoTls)
        .map_err(|source| ExecError::introspect("connecting to PostgreSQL", source))?;
    Ok(PostgresDriver { client })
}

struct ColumnRow {
    name: String,
    data_type: String,
    not_null: bool,
    default_expr: Option<String>,
    is_identity: bool,
    comment: Option<String>,
}

fn decode_column_row(row: &Row) -> ColumnRow {
    ColumnRow {
        name: row.get("column_name"),
        data_type: row.get("data_type"),
        not_null: row.get("not_null"),
        default_expr: row.get("default_expr"),
        is_identity: row.get("is_identity"),
        comment: row.get("comment"),
    }
}

fn query_error(sql: &str, source: postgres::Error) -> drift_core::Error {
    ExecError::introspect(format!("query failed: {}", sql.trim()), source).into()
}

impl PostgresDriver {
    fn inspect_table(&mut self, schema: &str, name: &str) -> Result<Table> {
        let mut table = Table::new(name);

        let rows = self
            .client
            .query(inspect_queries::TABLE_COLUMNS_QUERY, &[&schema, &name])
            .map_err(|source| query_error(inspect_queries::TABLE_COLUMNS_QUERY, source))?;
        for row in &rows {
            let decoded = decode_column_row(row);
            let mut column = Column::new(decoded.name, parse_pg_type(&decoded.data_type));
            column.null = !decoded.not_null;
            if let Some(default_expr) = decoded.default_expr {
                column.default = Some(drift_core::Expr::raw(default_expr));
            }
            if decoded.is_identity {
                column.set_attr(Attr::Identity {
                    seed: 1,
                    increment: 1,
                });
            }
            if let Some(comment) = decoded.comment {
                column.set_attr(Attr::Comment(comment));
            }
            table.add_column(column);
        }

        let rows = self
            .client
            .query(inspect_queries::TABLE_INDEXES_QUERY, &[&schema, &name])
            .map_err(|source| query_error(inspect_queries::TABLE_INDEXES_QUERY, source))?;
        for row in &rows {
            let index_name: String = row.get("index_name");
            let is_unique: bool = row.get("is_unique");
            let is_primary: bool = row.get("is_primary");
            let predicate: Option<String> = row.get("predicate");
            let columns: Vec<String> = row.get("columns");

            let mut index = Index::new(index_name);
            index.unique = is_unique;
            index.parts = columns
                .into_iter()
                .map(|part| {
                    if part.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
                        IndexPart::column(part)
                    } else {
                        IndexPart::expr(part)
                    }
                })
                .collect();
            index.predicate = predicate.map(drift_core::Expr::raw);
            if is_primary {
                table.set_primary_key(index);
            } else {
                table.add_index(index);
            }
        }

        let rows = self
            .client
            .query(inspect_queries::TABLE_FOREIGN_KEYS_QUERY, &[&schema, &name])
            .map_err(|source| query_error(inspect_queries::TABLE_FOREIGN_KEYS_QUERY, source))?;
        for row in &rows {
            let symbol: String = row.get("constraint_name");
            let columns: Vec<String> = row.get("columns");
            let ref_schema: String = row.get("ref_schema");
            let ref_table: String = row.get("ref_table");
            let ref_columns: Vec<String> = row.get("ref_columns");
            let on_update: i8 = row.get("on_update");
            let on_delete: i8 = row.get("on_delete");

            let mut fk = ForeignKey::new(symbol, TableRef::new(ref_schema, ref_table));
            fk.columns = columns;
            fk.ref_columns = ref_columns;
            fk.on_update = decode_fk_action(on_update);
            fk.on_delete = decode_fk_action(on_delete);
            table.add_foreign_key(fk);
        }

        let rows = self
            .client
            .query(inspect_queries::TABLE_CHECKS_QUERY, &[&schema, &name])
            .map_err(|source| query_error(inspect_queries::TABLE_CHECKS_QUERY, source))?;
        for row in &rows {
            let check_name: String = row.get("constraint_name");
            let expr: Option<String> = row.get("expr");
            table.add_check(Check::new(check_name, expr.unwrap_or_default()));
        }

        Ok(table)
    }
}

fn decode_fk_action(code: i8) -> RefAction {
    match code as u8 as char {
        'r' => RefAction::Restrict,
        'c' => RefAction::Cascade,
        'n' => RefAction::SetNull,
        'd' => RefAction::SetDefault,
        _ => RefAction::NoAction,
    }
}

impl Inspector for PostgresDriver {
    fn inspect_realm(&mut self, ctx: &Cancellation, opts: &InspectOptions) -> Result<Realm> {
        let mut realm = Realm::new();
        let schema_names = if opts.schemas.is_empty() {
            let rows = self
                .client
                .query(inspect_queries::SCHEMA_NAMES_QUERY, &[])
                .map_err(|source| query_error(inspect_queries::SCHEMA_NAMES_QUERY, source))?;
            rows.iter().map(|row| row.get("schema_name")).collect()
        } else {
            opts.schemas.clone()
        };

        for name in schema_names {
            ctx.check()?;
            let schema = self.inspect_schema(ctx, &name, opts)?;
            realm.add_schema(schema);
        }

        let patterns = opts
            .exclude
            .iter()
            .map(|pattern| parse_pattern(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drift_core::exclude(&mut realm, &patterns);
        Ok(realm)
    }

    fn inspect_schema(
        &mut self,
        ctx: &Cancellation,
        name: &str,
        _opts: &InspectOptions,
    ) -> Result<Schema> {
        let mut schema = Schema::new(name);

        let rows = self
            .client
            .query(inspect_queries::ENUM_TYPES_QUERY, &[&name])
            .map_err(|source| query_error(inspect_queries::ENUM_TYPES_QUERY, source))?;
        for row in &rows {
            let enum_name: String = row.get("enum_name");
            let labels: Vec<String> = row.get("labels");
            schema.add_enum(EnumType::new(enum_name, labels));
        }

        let rows = self
            .client
            .query(inspect_queries::TABLE_NAMES_QUERY, &[&name])
            .map_err(|source| query_error(inspect_queries::TABLE_NAMES_QUERY, source))?;
        let table_names = rows
            .iter()
            .map(|row| row.get::<_, String>("table_name"))
            .collect::<Vec<_>>();
        for table_name in table_names {
            ctx.check()?;
            let table = self.inspect_table(name, &table_name)?;
            schema.add_table(table);
        }

        Ok(schema)
    }

    fn check_clean(&mut self, ctx: &Cancellation) -> Result<()> {
        let realm = self.inspect_realm(ctx, &InspectOptions::default())?;
        let dirty = realm
            .schemas
            .iter()
            .any(|schema| !schema.tables.is_empty() || !schema.enums.is_empty());
        if dirty {
            return Err(ExecError::Introspect {
                message: "target database is not clean".to_string(),
                source: None,
            }
            .into());
        }
        Ok(())
    }

    fn table_empty(&mut self, ctx: &Cancellation, schema: &str, table: &str) -> Result<bool> {
        ctx.check()?;
        let sql = format!(
            "{}\"{}\".\"{}\" LIMIT 1)",
            inspect_queries::TABLE_EMPTY_QUERY_PREFIX,
            schema.replace('"', "\"\""),
            table.replace('"', "\"\"")
        );
        let row = self
            .client
            .query_one(&sql, &[])
            .map_err(|source| query_error(&sql, source))?;
        Ok(row.get(0))
    }
}

impl Applier for PostgresDriver {
    fn apply_changes(&mut self, ctx: &Cancellation, changes: &[Change]) -> Result<()> {
        let plan = PostgresPlan.plan_changes("apply", changes)?;
        self.execute_plan(ctx, &plan)
    }

    /// DDL is transactional on PostgreSQL: fully-transactional plans run in
    /// one transaction; plans with concurrent statements fall back to
    /// sequential execution.
    fn execute_plan(&mut self, ctx: &Cancellation, plan: &Plan) -> Result<()> {
        if plan.transactional() {
            let mut tx = self
                .client
                .transaction()
                .map_err(|source| apply_error(0, 0, "BEGIN", source))?;
            for (index, statement) in plan.statements.iter().enumerate() {
                ctx.check()?;
                tx.batch_execute(&statement.cmd)
                    .map_err(|source| apply_error(index, 0, &statement.cmd, source))?;
            }
            tx.commit()
                .map_err(|source| apply_error(plan.statements.len(), 0, "COMMIT", source))?;
            return Ok(());
        }

        let mut applied = 0usize;
        for (index, statement) in plan.statements.iter().enumerate() {
            ctx.check()?;
            self.client
                .batch_execute(&statement.cmd)
                .map_err(|source| apply_error(index, applied, &statement.cmd, source))?;
            applied += 1;
        }
        Ok(())
    }
}

fn apply_error(
    statement_index: usize,
    applied: usize,
    sql: &str,
    source: postgres::Error,
) -> drift_core::Error {
    ExecError::Apply {
        statement_index,
        applied,
        sql: sql.to_string(),
        source: Some(Box::new(source)),
    }
    .into()
}
