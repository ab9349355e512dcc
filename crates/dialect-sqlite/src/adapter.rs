use rusqlite::Connection;

use drift_core::{
    Applier, Cancellation, Change, Column, ExecError, ForeignKey, Index, IndexPart,
    InspectOptions, Inspector, Plan, PlanFormatter, Realm, RefAction, Result, Schema, Table,
    TableRef, parse_pattern,
};

use crate::{plan::SqlitePlan, types::parse_sqlite_type};

const MAIN_SCHEMA: &str = "main";

const TABLE_NAMES_QUERY: &str = r"
SELECT name FROM sqlite_master
WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
ORDER BY name ASC";

/// SQLite driver backing introspection and apply, over a single database
/// file (or `:memory:`).
pub struct SqliteDriver {
    conn: Connection,
}

pub fn connect(path: &str) -> Result<SqliteDriver> {
    let conn = Connection::open(path)
        .map_err(|source| ExecError::introspect("opening SQLite database", source))?;
    Ok(SqliteDriver { conn })
}

fn query_error(sql: &str, source: rusqlite::Error) -> drift_core::Error {
    ExecError::introspect(format!("query failed: {}", sql.trim()), source).into()
}

impl SqliteDriver {
    fn inspect_table(&mut self, name: &str) -> Result<Table> {
        let mut table = Table::new(name);
        let mut pk_columns: Vec<(i64, String)> = Vec::new();

        let pragma = format!("PRAGMA table_info({})", quote(name));
        {
            let mut stmt = self
                .conn
                .prepare(&pragma)
                .map_err(|source| query_error(&pragma, source))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>("name")?,
                        row.get::<_, String>("type")?,
                        row.get::<_, bool>("notnull")?,
                        row.get::<_, Option<String>>("dflt_value")?,
                        row.get::<_, i64>("pk")?,
                    ))
                })
                .map_err(|source| query_error(&pragma, source))?;
            for row in rows {
                let (column_name, declared_type, not_null, default, pk) =
                    row.map_err(|source| query_error(&pragma, source))?;
                let mut column = Column::new(&column_name, parse_sqlite_type(&declared_type));
                column.null = !not_null;
                if let Some(default) = default {
                    column.default = Some(drift_core::Expr::raw(default));
                }
                if pk > 0 {
                    pk_columns.push((pk, column_name));
                }
                table.add_column(column);
            }
        }
        if !pk_columns.is_empty() {
            pk_columns.sort();
            let mut pk = Index::new("");
            pk.parts = pk_columns
                .into_iter()
                .map(|(_, column)| IndexPart::column(column))
                .collect();
            table.set_primary_key(pk);
        }

        let pragma = format!("PRAGMA index_list({})", quote(name));
        let index_rows: Vec<(String, bool, String)> = {
            let mut stmt = self
                .conn
                .prepare(&pragma)
                .map_err(|source| query_error(&pragma, source))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>("name")?,
                        row.get::<_, bool>("unique")?,
                        row.get::<_, String>("origin")?,
                    ))
                })
                .map_err(|source| query_error(&pragma, source))?;
            rows.collect::<std::result::Result<_, _>>()
                .map_err(|source| query_error(&pragma, source))?
        };
        for (index_name, unique, origin) in index_rows {
            // `c` marks explicitly created indexes; pk/unique constraint
            // side indexes come back as `pk`/`u`.
            if origin != "c" {
                continue;
            }
            let pragma = format!("PRAGMA index_info({})", quote(&index_name));
            let mut stmt = self
                .conn
                .prepare(&pragma)
                .map_err(|source| query_error(&pragma, source))?;
            let columns = stmt
                .query_map([], |row| row.get::<_, Option<String>>("name"))
                .map_err(|source| query_error(&pragma, source))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|source| query_error(&pragma, source))?;

            let mut index = Index::new(index_name);
            index.unique = unique;
            index.parts = columns
                .into_iter()
                .flatten()
                .map(IndexPart::column)
                .collect();
            table.add_index(index);
        }

        let pragma = format!("PRAGMA foreign_key_list({})", quote(name));
        let fk_rows: Vec<(i64, String, String, String, String, String)> = {
            let mut stmt = self
                .conn
                .prepare(&pragma)
                .map_err(|source| query_error(&pragma, source))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>("id")?,
                        row.get::<_, String>("table")?,
                        row.get::<_, String>("from")?,
                        row.get::<_, String>("to")?,
                        row.get::<_, String>("on_update")?,
                        row.get::<_, String>("on_delete")?,
                    ))
                })
                .map_err(|source| query_error(&pragma, source))?;
            rows.collect::<std::result::Result<_, _>>()
                .map_err(|source| query_error(&pragma, source))?
        };
        for (id, ref_table, from, to, on_update, on_delete) in fk_rows {
            let symbol = format!("{name}_fk_{id}");
            match table.foreign_keys.iter_mut().find(|fk| fk.symbol == symbol) {
                Some(fk) => {
                    fk.columns.push(from);
                    fk.ref_columns.push(to);
                }
                None => {
                    let mut fk =
                        ForeignKey::new(symbol, TableRef::new(MAIN_SCHEMA, ref_table));
                    fk.columns.push(from);
                    fk.ref_columns.push(to);
                    fk.on_update = RefAction::parse(&on_update).unwrap_or_default();
                    fk.on_delete = RefAction::parse(&on_delete).unwrap_or_default();
                    table.add_foreign_key(fk);
                }
            }
        }

        Ok(table)
    }
}

impl Inspector for SqliteDriver {
    fn inspect_realm(&mut self, ctx: &Cancellation, opts: &InspectOptions) -> Result<Realm> {
        let mut realm = Realm::new();
        let schema = self.inspect_schema(ctx, MAIN_SCHEMA, opts)?;
        realm.add_schema(schema);

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
        let table_names: Vec<String> = {
            let mut stmt = self
                .conn
                .prepare(TABLE_NAMES_QUERY)
                .map_err(|source| query_error(TABLE_NAMES_QUERY, source))?;
            let rows = stmt
                .query_map([], |row| row.get(0))
                .map_err(|source| query_error(TABLE_NAMES_QUERY, source))?;
            rows.collect::<std::result::Result<_, _>>()
                .map_err(|source| query_error(TABLE_NAMES_QUERY, source))?
        };
        for table_name in table_names {
            ctx.check()?;
            let table = self.inspect_table(&table_name)?;
            schema.add_table(table);
        }
        Ok(schema)
    }

    fn table_empty(&mut self, ctx: &Cancellation, _schema: &str, table: &str) -> Result<bool> {
        ctx.check()?;
        let sql = format!("SELECT NOT EXISTS (SELECT 1 FROM {} LIMIT 1)", quote(table));
        self.conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|source| query_error(&sql, source))
    }
}

impl Applier for SqliteDriver {
    fn apply_changes(&mut self, ctx: &Cancellation, changes: &[Change]) -> Result<()> {
        let plan = SqlitePlan::new().plan_changes("apply", changes)?;
        self.execute_plan(ctx, &plan)
    }

    /// Statements run sequentially; a failure aborts the remainder and
    /// leaves already-applied statements in place.
    fn execute_plan(&mut self, ctx: &Cancellation, plan: &Plan) -> Result<()> {
        let mut applied = 0usize;
        for (index, statement) in plan.statements.iter().enumerate() {
            ctx.check()?;
            self.conn
                .execute_batch(&format!("{};", statement.cmd))
                .map_err(|source| {
                    drift_core::Error::from(ExecError::Apply {
                        statement_index: index,
                        applied,
                        sql: statement.cmd.clone(),
                        source: Some(Box::new(source)),
                    })
                })?;
            applied += 1;
        }
        Ok(())
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
