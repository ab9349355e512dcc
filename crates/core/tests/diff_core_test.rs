#[path = "support/realm_fixtures.rs"]
mod realm_fixtures;

use drift_core::{
    Attr, Change, ColumnChange, DiffOptions, Differ, Error, Expr, Generated, GeneratedKind,
    Schema, Table,
};
use realm_fixtures::{
    defaulted_column, int_column, nullable_int_column, realm_with, table_with_columns,
    varchar_type,
};

fn differ() -> Differ {
    Differ::new(DiffOptions::default())
}

#[test]
fn diffing_a_realm_with_itself_yields_nothing() {
    let realm = realm_with(vec![table_with_columns(
        "users",
        &[int_column("id"), nullable_int_column("age")],
    )]);
    let changes = differ().realm_diff(&realm, &realm).unwrap();
    assert!(changes.is_empty(), "unexpected changes: {changes:?}");
}

#[test]
fn new_table_produces_add_table() {
    let from = realm_with(vec![]);
    let to = realm_with(vec![table_with_columns("users", &[int_column("id")])]);

    let changes = differ().realm_diff(&from, &to).unwrap();
    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::AddTable { table } if table.name == "users"
    ));
}

#[test]
fn missing_table_produces_drop_with_snapshot() {
    let from = realm_with(vec![table_with_columns("users", &[int_column("id")])]);
    let to = realm_with(vec![]);

    let changes = differ().realm_diff(&from, &to).unwrap();
    assert_eq!(changes.len(), 1);
    let Change::DropTable { table } = &changes[0] else {
        panic!("expected DropTable, got {:?}", changes[0]);
    };
    assert_eq!(table.column("id").map(|column| column.name.as_str()), Some("id"));
}

#[test]
fn null_and_type_and_default_set_mask_bits_in_order() {
    let mut from_column = int_column("c");
    from_column.null = false;
    let mut to_column = int_column("c");
    to_column.null = true;
    to_column.ty = varchar_type(20);
    to_column.default = Some(Expr::string("x"));

    let from = realm_with(vec![table_with_columns("t", &[from_column])]);
    let to = realm_with(vec![table_with_columns("t", &[to_column])]);

    let changes = differ().realm_diff(&from, &to).unwrap();
    assert_eq!(changes.len(), 1);
    let Change::ModifyColumn { change, .. } = &changes[0] else {
        panic!("expected ModifyColumn, got {:?}", changes[0]);
    };
    assert_eq!(
        *change,
        ColumnChange::NULL | ColumnChange::TYPE | ColumnChange::DEFAULT
    );
}

#[test]
fn identity_attribute_change_sets_attr_bit_only() {
    let plain = int_column("id");
    let mut with_identity = int_column("id");
    with_identity.set_attr(Attr::Identity {
        seed: 1024,
        increment: 1,
    });

    let from = realm_with(vec![table_with_columns("users", &[plain])]);
    let to = realm_with(vec![table_with_columns("users", &[with_identity])]);

    let changes = differ().realm_diff(&from, &to).unwrap();
    assert_eq!(changes.len(), 1);
    let Change::ModifyColumn { change, .. } = &changes[0] else {
        panic!("expected ModifyColumn, got {:?}", changes[0]);
    };
    assert_eq!(*change, ColumnChange::ATTR);
}

#[test]
fn default_comparison_is_textually_normalised() {
    let mut from_column = int_column("c");
    from_column.default = Some(Expr::raw("(true)"));
    let mut to_column = int_column("c");
    to_column.default = Some(Expr::bool(true));

    let from = realm_with(vec![table_with_columns("t", &[from_column])]);
    let to = realm_with(vec![table_with_columns("t", &[to_column])]);

    let changes = differ().realm_diff(&from, &to).unwrap();
    assert!(changes.is_empty(), "unexpected changes: {changes:?}");
}

#[test]
fn stored_generated_expression_change_is_unsupported() {
    let generated = |expr: &str| {
        let mut column = int_column("total");
        column.generated = Some(Generated {
            expr: expr.to_string(),
            kind: GeneratedKind::Stored,
        });
        column
    };

    let from = realm_with(vec![table_with_columns("orders", &[generated("a + b")])]);
    let to = realm_with(vec![table_with_columns("orders", &[generated("a * b")])]);

    let err = differ().realm_diff(&from, &to).unwrap_err();
    assert!(matches!(err, Error::Diff(drift_core::DiffError::UnsupportedChange { .. })));
}

#[test]
fn virtual_generated_expression_change_sets_generated_expr_bit() {
    let generated = |expr: &str| {
        let mut column = int_column("total");
        column.generated = Some(Generated {
            expr: expr.to_string(),
            kind: GeneratedKind::Virtual,
        });
        column
    };

    let from = realm_with(vec![table_with_columns("orders", &[generated("a + b")])]);
    let to = realm_with(vec![table_with_columns("orders", &[generated("a * b")])]);

    let changes = differ().realm_diff(&from, &to).unwrap();
    let Change::ModifyColumn { change, .. } = &changes[0] else {
        panic!("expected ModifyColumn, got {:?}", changes[0]);
    };
    assert_eq!(*change, ColumnChange::GENERATED_EXPR);
}

#[test]
fn back_reference_mismatch_fails_fast() {
    let mut realm = realm_with(vec![table_with_columns("t", &[int_column("c")])]);
    realm.schemas[0].tables[0].columns[0].table = "other".to_string();

    let err = differ().realm_diff(&realm, &realm).unwrap_err();
    assert!(matches!(err, Error::Diff(drift_core::DiffError::BackRef { .. })));
}

#[test]
fn schema_add_flattens_into_contents() {
    let from = drift_core::Realm::new();
    let mut to = drift_core::Realm::new();
    let mut schema = Schema::new("analytics");
    let mut table = Table::new("events");
    table.add_column(int_column("id"));
    schema.add_table(table);
    to.add_schema(schema);

    let changes = differ().realm_diff(&from, &to).unwrap();
    let ops = changes.iter().map(Change::op_name).collect::<Vec<_>>();
    assert_eq!(ops, vec!["AddSchema", "AddTable"]);
}

#[test]
fn dropped_check_and_added_check_are_reported() {
    let mut from_table = table_with_columns("t", &[int_column("c")]);
    from_table.add_check(drift_core::Check::new("c_old", "c > 0"));
    let mut to_table = table_with_columns("t", &[int_column("c")]);
    to_table.add_check(drift_core::Check::new("c_new", "c > 1"));

    let from = realm_with(vec![from_table]);
    let to = realm_with(vec![to_table]);

    let changes = differ().realm_diff(&from, &to).unwrap();
    let ops = changes.iter().map(Change::op_name).collect::<Vec<_>>();
    assert_eq!(ops, vec!["DropCheck", "AddCheck"]);
}

#[test]
fn default_only_in_one_side_sets_default_bit() {
    let from = realm_with(vec![table_with_columns("t", &[int_column("c")])]);
    let to = realm_with(vec![table_with_columns("t", &[defaulted_column("c", 0)])]);

    let changes = differ().realm_diff(&from, &to).unwrap();
    let Change::ModifyColumn { change, .. } = &changes[0] else {
        panic!("expected ModifyColumn, got {:?}", changes[0]);
    };
    assert_eq!(*change, ColumnChange::DEFAULT);
}
