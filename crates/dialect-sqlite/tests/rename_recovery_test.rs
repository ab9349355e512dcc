use drift_core::{
    Change, DiffOptions, Differ, RenameHint, StatementParser,
};
use drift_dialect_sqlite::{SqliteStatementParser, dialect};

const CURRENT: &str = r#"
schema "main" {}
table "t" {
  schema = schema.main
  column "c1" {
    type = int
  }
}
"#;

const DESIRED: &str = r#"
schema "main" {}
table "t" {
  schema = schema.main
  column "c2" {
    type = int
  }
}
"#;

/// The drop/add pair collapses into a rename once the statement parser
/// reports `ALTER TABLE t RENAME COLUMN c1 TO c2`.
#[test]
fn recovered_statement_collapses_drop_add_into_rename() {
    let dialect = dialect();
    let current = drift_dsl::load_realm(CURRENT, "current.dft", &dialect).unwrap();
    let desired = drift_dsl::load_realm(DESIRED, "desired.dft", &dialect).unwrap();

    let parser = SqliteStatementParser;
    let (table, from, to) = parser
        .rename_column("ALTER TABLE t RENAME COLUMN c1 TO c2")
        .unwrap();
    let hints = vec![RenameHint::Column {
        schema: "main".to_string(),
        table,
        from,
        to,
    }];

    let changes = Differ::new(DiffOptions::default().with_hints(hints))
        .realm_diff(&current, &desired)
        .unwrap();

    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::RenameColumn { from, to, .. } if from == "c1" && to == "c2"
    ));
}

/// Without the parser hint the same pair stays a drop plus an add.
#[test]
fn without_recovery_the_pair_stays_drop_and_add() {
    let dialect = dialect();
    let current = drift_dsl::load_realm(CURRENT, "current.dft", &dialect).unwrap();
    let desired = drift_dsl::load_realm(DESIRED, "desired.dft", &dialect).unwrap();

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&current, &desired)
        .unwrap();
    let ops = changes.iter().map(Change::op_name).collect::<Vec<_>>();
    assert_eq!(ops, vec!["AddColumn", "DropColumn"]);
}
