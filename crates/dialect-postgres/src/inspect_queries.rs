pub(crate) const SCHEMA_NAMES_QUERY: &str = r#"
SELECT n.nspname AS schema_name
FROM pg_catalog.pg_namespace n
WHERE n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
  AND n.nspname NOT LIKE 'pg_temp_%'
ORDER BY n.nspname ASC;
"#;

pub(crate) const TABLE_NAMES_QUERY: &str = r#"
SELECT c.relname AS table_name
FROM pg_catalog.pg_class c
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
WHERE n.nspname = $1
  AND c.relkind = 'r'
  AND c.relispartition = false
ORDER BY c.relname ASC;
"#;

pub(crate) const TABLE_COLUMNS_QUERY: &str = r#"
SELECT
  a.attname AS column_name,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
  a.attnotnull AS not_null,
  pg_catalog.pg_get_expr(ad.adbin, ad.adrelid) AS default_expr,
  a.attidentity <> '' AS is_identity,
  col_description(c.oid, a.attnum) AS comment
FROM pg_catalog.pg_attribute a
INNER JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
WHERE n.nspname = $1
  AND c.relname = $2
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY a.attnum ASC;
"#;

pub(crate) const TABLE_INDEXES_QUERY: &str = r#"
SELECT
  ic.relname AS index_name,
  i.indisunique AS is_unique,
  i.indisprimary AS is_primary,
  pg_catalog.pg_get_expr(i.indpred, i.indrelid) AS predicate,
  ARRAY(
    SELECT pg_catalog.pg_get_indexdef(i.indexrelid, k + 1, true)
    FROM generate_subscripts(i.indkey, 1) AS k
    ORDER BY k
  ) AS columns
FROM pg_catalog.pg_index i
INNER JOIN pg_catalog.pg_class ic ON ic.oid = i.indexrelid
INNER JOIN pg_catalog.pg_class c ON c.oid = i.indrelid
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
WHERE n.nspname = $1
  AND c.relname = $2
ORDER BY ic.relname ASC;
"#;

pub(crate) const TABLE_FOREIGN_KEYS_QUERY: &str = r#"
SELECT
  con.conname AS constraint_name,
  ARRAY(
    SELECT a.attname
    FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
    INNER JOIN pg_catalog.pg_attribute a
      ON a.attrelid = con.conrelid AND a.attnum = k.attnum
    ORDER BY k.ord
  ) AS columns,
  rn.nspname AS ref_schema,
  rc.relname AS ref_table,
  ARRAY(
    SELECT a.attname
    FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
    INNER JOIN pg_catalog.pg_attribute a
      ON a.attrelid = con.confrelid AND a.attnum = k.attnum
    ORDER BY k.ord
  ) AS ref_columns,
  con.confupdtype AS on_update,
  con.confdeltype AS on_delete
FROM pg_catalog.pg_constraint con
INNER JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
INNER JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid
INNER JOIN pg_catalog.pg_namespace rn ON rc.relnamespace = rn.oid
WHERE n.nspname = $1
  AND c.relname = $2
  AND con.contype = 'f'
ORDER BY con.conname ASC;
"#;

pub(crate) const TABLE_CHECKS_QUERY: &str = r#"
SELECT
  con.conname AS constraint_name,
  pg_catalog.pg_get_expr(con.conbin, con.conrelid) AS expr
FROM pg_catalog.pg_constraint con
INNER JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
WHERE n.nspname = $1
  AND c.relname = $2
  AND con.contype = 'c'
ORDER BY con.conname ASC;
"#;

pub(crate) const ENUM_TYPES_QUERY: &str = r#"
SELECT
  t.typname AS enum_name,
  ARRAY(
    SELECT e.enumlabel
    FROM pg_catalog.pg_enum e
    WHERE e.enumtypid = t.oid
    ORDER BY e.enumsortorder
  ) AS labels
FROM pg_catalog.pg_type t
INNER JOIN pg_catalog.pg_namespace n ON t.typnamespace = n.oid
WHERE n.nspname = $1
  AND t.typtype = 'e'
ORDER BY t.typname ASC;
"#;

pub(crate) const TABLE_EMPTY_QUERY_PREFIX: &str = "SELECT NOT EXISTS (SELECT 1 FROM ";
