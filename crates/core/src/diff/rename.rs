use std::fmt::Write as _;

use crate::schema::{Column, IndexPartKind, Table};

/// Structural fingerprint of a column: resolved type, nullability, and the
/// normalised default. Two columns with equal fingerprints are candidates
/// for a drop/add pair collapsing into a rename.
pub fn column_fingerprint(column: &Column) -> String {
    let default = column
        .default
        .as_ref()
        .map(|expr| expr.normalized())
        .unwrap_or_default();
    format!("{}|null={}|default={default}", column.ty.raw, column.null)
}

/// Structural fingerprint of a table: its columns, primary key, index
/// shapes, and foreign-key shapes. Index and constraint names are left out
/// so renaming a table does not defeat the match through derived names.
pub fn table_fingerprint(table: &Table) -> String {
    let mut out = String::new();

    for column in &table.columns {
        let _ = writeln!(out, "column {} {}", column.name, column_fingerprint(column));
    }
    if let Some(pk) = &table.primary_key {
        let _ = writeln!(out, "pk {}", parts_fingerprint(pk));
    }
    for index in &table.indexes {
        let _ = writeln!(
            out,
            "index unique={} {}",
            index.unique,
            parts_fingerprint(index)
        );
    }
    for fk in &table.foreign_keys {
        let _ = writeln!(
            out,
            "fk {} -> {}.{} ({})",
            fk.columns.join(","),
            fk.ref_table.schema,
            fk.ref_table.name,
            fk.ref_columns.join(",")
        );
    }

    out
}

fn parts_fingerprint(index: &crate::schema::Index) -> String {
    let mut out = String::new();
    for part in &index.parts {
        match &part.kind {
            IndexPartKind::Column(name) => {
                let _ = write!(out, "{name}");
            }
            IndexPartKind::Expr(expr) => {
                let _ = write!(out, "({})", expr.normalized());
            }
        }
        if part.desc {
            out.push_str(" desc");
        }
        if let Some(len) = part.prefix_len {
            let _ = write!(out, "[{len}]");
        }
        out.push(';');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, Expr, Index, IntSize, TypeKind};

    fn int_column(name: &str) -> Column {
        Column::new(
            name,
            ColumnType::new(
                TypeKind::Integer {
                    size: IntSize::Standard,
                    unsigned: false,
                },
                "int",
            ),
        )
    }

    #[test]
    fn column_fingerprint_ignores_name() {
        assert_eq!(
            column_fingerprint(&int_column("c1")).split('|').skip(1).collect::<Vec<_>>(),
            column_fingerprint(&int_column("c2")).split('|').skip(1).collect::<Vec<_>>(),
        );
    }

    #[test]
    fn column_fingerprint_sees_defaults() {
        let plain = int_column("c");
        let defaulted = int_column("c").with_default(Expr::int(0));
        assert_ne!(column_fingerprint(&plain), column_fingerprint(&defaulted));
    }

    #[test]
    fn table_fingerprint_ignores_table_and_index_names() {
        let mut left = Table::new("t1");
        left.add_column(int_column("id"));
        left.add_index(Index::on_columns("t1_id_idx", ["id"]));

        let mut right = Table::new("t2");
        right.add_column(int_column("id"));
        right.add_index(Index::on_columns("t2_id_idx", ["id"]));

        assert_eq!(table_fingerprint(&left), table_fingerprint(&right));
    }
}
