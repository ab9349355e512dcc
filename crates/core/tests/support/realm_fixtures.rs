#![allow(dead_code)]

use drift_core::{
    Column, ColumnType, Expr, ForeignKey, Index, IntSize, Realm, Schema, Table, TableRef,
    TypeKind,
};

pub fn int_type() -> ColumnType {
    ColumnType::new(
        TypeKind::Integer {
            size: IntSize::Standard,
            unsigned: false,
        },
        "int",
    )
}

pub fn varchar_type(size: u64) -> ColumnType {
    ColumnType::new(
        TypeKind::String {
            size: Some(size),
            fixed: false,
        },
        format!("varchar({size})"),
    )
}

pub fn int_column(name: &str) -> Column {
    Column::new(name, int_type())
}

pub fn nullable_int_column(name: &str) -> Column {
    Column::new(name, int_type()).nullable(true)
}

pub fn defaulted_column(name: &str, default: i64) -> Column {
    Column::new(name, int_type()).with_default(Expr::int(default))
}

pub fn table_with_columns(name: &str, columns: &[Column]) -> Table {
    let mut table = Table::new(name);
    for column in columns {
        table.add_column(column.clone());
    }
    table
}

pub fn fk(symbol: &str, column: &str, ref_table: &str) -> ForeignKey {
    let mut fk = ForeignKey::new(symbol, TableRef::new("public", ref_table));
    fk.columns = vec![column.to_string()];
    fk.ref_columns = vec!["id".to_string()];
    fk
}

pub fn index_on(name: &str, column: &str) -> Index {
    Index::on_columns(name, [column])
}

pub fn realm_with(tables: Vec<Table>) -> Realm {
    let mut schema = Schema::new("public");
    for table in tables {
        schema.add_table(table);
    }
    let mut realm = Realm::new();
    realm.add_schema(schema);
    realm
}
