#[path = "support/realm_fixtures.rs"]
mod realm_fixtures;

use drift_core::{Change, DiffOptions, Differ, Error, RenameHint};
use realm_fixtures::{int_column, realm_with, table_with_columns};

fn column_rename_hint(table: &str, from: &str, to: &str) -> RenameHint {
    RenameHint::Column {
        schema: "public".to_string(),
        table: table.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[test]
fn without_hints_no_rename_is_inferred() {
    let from = realm_with(vec![table_with_columns("t", &[int_column("c1")])]);
    let to = realm_with(vec![table_with_columns("t", &[int_column("c2")])]);

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&from, &to)
        .unwrap();
    let ops = changes.iter().map(Change::op_name).collect::<Vec<_>>();
    assert_eq!(ops, vec!["AddColumn", "DropColumn"]);
}

#[test]
fn parser_hint_collapses_drop_add_into_rename() {
    let from = realm_with(vec![table_with_columns("t", &[int_column("c1")])]);
    let to = realm_with(vec![table_with_columns("t", &[int_column("c2")])]);

    let options =
        DiffOptions::default().with_hints(vec![column_rename_hint("t", "c1", "c2")]);
    let changes = Differ::new(options).realm_diff(&from, &to).unwrap();

    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::RenameColumn { from, to, .. } if from == "c1" && to == "c2"
    ));
}

#[test]
fn hinted_rename_still_reports_residual_changes() {
    let from = realm_with(vec![table_with_columns("t", &[int_column("c1")])]);
    let mut renamed = int_column("c2");
    renamed.null = true;
    let to = realm_with(vec![table_with_columns("t", &[renamed])]);

    let options =
        DiffOptions::default().with_hints(vec![column_rename_hint("t", "c1", "c2")]);
    let changes = Differ::new(options).realm_diff(&from, &to).unwrap();

    let ops = changes.iter().map(Change::op_name).collect::<Vec<_>>();
    assert_eq!(ops, vec!["RenameColumn", "ModifyColumn"]);
}

#[test]
fn fingerprint_detection_collapses_unique_match() {
    let from = realm_with(vec![table_with_columns("t", &[int_column("c1")])]);
    let to = realm_with(vec![table_with_columns("t", &[int_column("c2")])]);

    let mut options = DiffOptions::default();
    options.detect_renames = true;
    let changes = Differ::new(options).realm_diff(&from, &to).unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].op_name(), "RenameColumn");
}

#[test]
fn ambiguous_fingerprint_match_is_an_error() {
    let from = realm_with(vec![table_with_columns(
        "t",
        &[int_column("c1"), int_column("c2")],
    )]);
    let to = realm_with(vec![table_with_columns(
        "t",
        &[int_column("c3"), int_column("c4")],
    )]);

    let mut options = DiffOptions::default();
    options.detect_renames = true;
    let err = Differ::new(options).realm_diff(&from, &to).unwrap_err();
    assert!(matches!(
        err,
        Error::Diff(drift_core::DiffError::AmbiguousChange { .. })
    ));
}

#[test]
fn table_rename_hint_collapses_tables() {
    let from = realm_with(vec![table_with_columns("old_users", &[int_column("id")])]);
    let to = realm_with(vec![table_with_columns("users", &[int_column("id")])]);

    let options = DiffOptions::default().with_hints(vec![RenameHint::Table {
        schema: "public".to_string(),
        from: "old_users".to_string(),
        to: "users".to_string(),
    }]);
    let changes = Differ::new(options).realm_diff(&from, &to).unwrap();

    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::RenameTable { from, to } if from.name == "old_users" && to.name == "users"
    ));
}

#[test]
fn fingerprint_table_detection_requires_structural_equality() {
    let from = realm_with(vec![table_with_columns("old", &[int_column("id")])]);
    let to = realm_with(vec![table_with_columns(
        "fresh",
        &[int_column("id"), int_column("extra")],
    )]);

    let mut options = DiffOptions::default();
    options.detect_renames = true;
    let changes = Differ::new(options).realm_diff(&from, &to).unwrap();
    let ops = changes.iter().map(Change::op_name).collect::<Vec<_>>();
    assert_eq!(ops, vec!["DropTable", "AddTable"]);
}
