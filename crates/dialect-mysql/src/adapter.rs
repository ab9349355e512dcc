use mysql::{Opts, Pool, PooledConn, prelude::Queryable};

use drift_core::{
    Applier, Attr, Cancellation, Change, Check, Column, ExecError, ForeignKey, Index, IndexPart,
    InspectOptions, Inspector, Plan, PlanFormatter, Realm, RefAction, Result, Schema, Table,
    TableRef, parse_pattern,
};

use crate::{
    plan::MysqlPlan,
    types::{Flavor, parse_mysql_type},
};

const COLUMNS_QUERY: &str = r"
SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT, EXTRA, COLUMN_COMMENT,
       CHARACTER_SET_NAME, COLLATION_NAME
FROM information_schema.COLUMNS
WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
ORDER BY ORDINAL_POSITION ASC";

const TABLES_QUERY: &str = r"
SELECT TABLE_NAME
FROM information_schema.TABLES
WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
ORDER BY TABLE_NAME ASC";

const INDEXES_QUERY: &str = r"
SELECT INDEX_NAME, NON_UNIQUE, COLUMN_NAME, SUB_PART, COLLATION
FROM information_schema.STATISTICS
WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
ORDER BY INDEX_NAME ASC, SEQ_IN_INDEX ASC";

const FOREIGN_KEYS_QUERY: &str = r"
SELECT k.CONSTRAINT_NAME, k.COLUMN_NAME, k.REFERENCED_TABLE_SCHEMA,
       k.REFERENCED_TABLE_NAME, k.REFERENCED_COLUMN_NAME,
       r.UPDATE_RULE, r.DELETE_RULE
FROM information_schema.KEY_COLUMN_USAGE k
JOIN information_schema.REFERENTIAL_CONSTRAINTS r
  ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA
 AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME
WHERE k.TABLE_SCHEMA = ? AND k.TABLE_NAME = ?
  AND k.REFERENCED_TABLE_NAME IS NOT NULL
ORDER BY k.CONSTRAINT_NAME ASC, k.ORDINAL_POSITION ASC";

const CHECKS_QUERY: &str = r"
SELECT t.CONSTRAINT_NAME, c.CHECK_CLAUSE
FROM information_schema.TABLE_CONSTRAINTS t
JOIN information_schema.CHECK_CONSTRAINTS c
  ON c.CONSTRAINT_SCHEMA = t.CONSTRAINT_SCHEMA
 AND c.CONSTRAINT_NAME = t.CONSTRAINT_NAME
WHERE t.TABLE_SCHEMA = ? AND t.TABLE_NAME = ? AND t.CONSTRAINT_TYPE = 'CHECK'
ORDER BY t.CONSTRAINT_NAME ASC";

/// Synchronous MySQL/MariaDB driver backing introspection and apply.
pub struct MysqlDriver {
    conn: PooledConn,
    flavor: Flavor,
}

pub fn connect(url: &str, flavor: Flavor) -> Result<MysqlDriver> {
    let opts = Opts::from_url(url)
        .map_err(|source| ExecError::introspect("parsing MySQL connection URL", source))?;
    let pool =
        Pool::new(opts).map_err(|source| ExecError::introspect("connecting to MySQL", source))?;
    let conn = pool
        .get_conn()
        .map_err(|source| ExecError::introspect("acquiring MySQL connection", source))?;
    Ok(MysqlDriver { conn, flavor })
}

fn query_error(sql: &str, source: mysql::Error) -> drift_core::Error {
    ExecError::introspect(format!("query failed: {}", sql.trim()), source).into()
}

impl MysqlDriver {
    fn inspect_table(&mut self, schema: &str, name: &str) -> Result<Table> {
        let mut table = Table::new(name);

        type ColumnRow = (
            String,
            String,
            String,
            Option<String>,
            String,
            String,
            Option<String>,
            Option<String>,
        );
        let rows: Vec<ColumnRow> = self
            .conn
            .exec(COLUMNS_QUERY, (schema, name))
            .map_err(|source| query_error(COLUMNS_QUERY, source))?;
        for (column_name, column_type, is_nullable, default, extra, comment, charset, collation) in
            rows
        {
            let mut column = Column::new(column_name, parse_mysql_type(self.flavor, &column_type));
            column.null = is_nullable.eq_ignore_ascii_case("YES");
            if let Some(default) = default {
                column.default = Some(drift_core::Expr::raw(default));
            }
            if extra.to_ascii_lowercase().contains("auto_increment") {
                column.set_attr(Attr::AutoIncrement(0));
            }
            if !comment.is_empty() {
                column.set_attr(Attr::Comment(comment));
            }
            if let Some(charset) = charset {
                column.set_attr(Attr::Charset(charset));
            }
            if let Some(collation) = collation {
                column.set_attr(Attr::Collation(collation));
            }
            table.add_column(column);
        }

        type IndexRow = (String, i64, String, Option<u32>, Option<String>);
        let rows: Vec<IndexRow> = self
            .conn
            .exec(INDEXES_QUERY, (schema, name))
            .map_err(|source| query_error(INDEXES_QUERY, source))?;
        for (index_name, non_unique, column_name, sub_part, collation) in rows {
            let mut part = IndexPart::column(column_name);
            part.prefix_len = sub_part;
            part.desc = collation.as_deref() == Some("D");

            if index_name == "PRIMARY" {
                match &mut table.primary_key {
                    Some(pk) => pk.parts.push(part),
                    None => {
                        let mut pk = Index::new("");
                        pk.parts.push(part);
                        table.set_primary_key(pk);
                    }
                }
                continue;
            }
            match table.indexes.iter_mut().find(|index| index.name == index_name) {
                Some(index) => index.parts.push(part),
                None => {
                    let mut index = Index::new(index_name);
                    index.unique = non_unique == 0;
                    index.parts.push(part);
                    table.add_index(index);
                }
            }
        }

        type FkRow = (String, String, String, String, String, String, String);
        let rows: Vec<FkRow> = self
            .conn
            .exec(FOREIGN_KEYS_QUERY, (schema, name))
            .map_err(|source| query_error(FOREIGN_KEYS_QUERY, source))?;
        for (symbol, column, ref_schema, ref_table, ref_column, update_rule, delete_rule) in rows {
            match table.foreign_keys.iter_mut().find(|fk| fk.symbol == symbol) {
                Some(fk) => {
                    fk.columns.push(column);
                    fk.ref_columns.push(ref_column);
                }
                None => {
                    let mut fk = ForeignKey::new(symbol, TableRef::new(ref_schema, ref_table));
                    fk.columns.push(column);
                    fk.ref_columns.push(ref_column);
                    fk.on_update = RefAction::parse(&update_rule).unwrap_or_default();
                    fk.on_delete = RefAction::parse(&delete_rule).unwrap_or_default();
                    table.add_foreign_key(fk);
                }
            }
        }

        let rows: Vec<(String, String)> = self
            .conn
            .exec(CHECKS_QUERY, (schema, name))
            .map_err(|source| query_error(CHECKS_QUERY, source))?;
        for (check_name, clause) in rows {
            table.add_check(Check::new(check_name, clause));
        }

        Ok(table)
    }
}

impl Inspector for MysqlDriver {
    fn inspect_realm(&mut self, ctx: &Cancellation, opts: &InspectOptions) -> Result<Realm> {
        let mut realm = Realm::new();
        let schema_names = if opts.schemas.is_empty() {
            let sql = "SELECT DATABASE()";
            let current: Option<String> = self
                .conn
                .query_first(sql)
                .map_err(|source| query_error(sql, source))?
                .flatten();
            current.into_iter().collect()
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
        let table_names: Vec<String> = self
            .conn
            .exec(TABLES_QUERY, (name,))
            .map_err(|source| query_error(TABLES_QUERY, source))?;
        for table_name in table_names {
            ctx.check()?;
            let table = self.inspect_table(name, &table_name)?;
            schema.add_table(table);
        }
        Ok(schema)
    }

    fn table_empty(&mut self, ctx: &Cancellation, schema: &str, table: &str) -> Result<bool> {
        ctx.check()?;
        let sql = format!(
            "SELECT NOT EXISTS (SELECT 1 FROM `{}`.`{}` LIMIT 1)",
            schema.replace('`', "``"),
            table.replace('`', "``")
        );
        let empty: Option<bool> = self
            .conn
            .query_first(&sql)
            .map_err(|source| query_error(&sql, source))?;
        Ok(empty.unwrap_or(false))
    }
}

impl Applier for MysqlDriver {
    fn apply_changes(&mut self, ctx: &Cancellation, changes: &[Change]) -> Result<()> {
        let plan = MysqlPlan {
            flavor: self.flavor,
        }
        .plan_changes("apply", changes)?;
        self.execute_plan(ctx, &plan)
    }

    /// MySQL DDL is not transactional: statements run sequentially and a
    /// failure aborts the remainder, leaving applied statements in place.
    fn execute_plan(&mut self, ctx: &Cancellation, plan: &Plan) -> Result<()> {
        let mut applied = 0usize;
        for (index, statement) in plan.statements.iter().enumerate() {
            ctx.check()?;
            self.conn.query_drop(&statement.cmd).map_err(|source| {
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
