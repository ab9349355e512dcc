use drift_core::{Change, DiffOptions, Differ, PlanFormatter};
use drift_dialect_postgres::{PostgresPlan, dialect};
use drift_testkit::assert_suite;

#[test]
fn yaml_plan_cases() {
    assert_suite(&dialect(), include_str!("testdata/plan_cases.yaml"));
}

#[test]
fn concurrent_index_statements_leave_the_transaction() {
    let dialect = dialect();
    let current = drift_dsl::load_realm(
        "schema \"public\" {}\ntable \"t\" { schema = schema.public\n column \"c\" { type = int } }",
        "current.dft",
        &dialect,
    )
    .unwrap();
    let desired = drift_dsl::load_realm(
        "schema \"public\" {}\ntable \"t\" { schema = schema.public\n column \"c\" { type = int }\n index \"i1\" { columns = [column.t.c]\n concurrently = true } }",
        "desired.dft",
        &dialect,
    )
    .unwrap();

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&current, &desired)
        .unwrap();
    let plan = PostgresPlan.plan_changes("m", &changes).unwrap();

    assert!(!plan.transactional());
    assert!(plan.statements[0].cmd.contains("CONCURRENTLY"));
}

#[test]
fn add_table_reverse_drops_it() {
    let dialect = dialect();
    let current = drift_dsl::load_realm("schema \"public\" {}", "current.dft", &dialect).unwrap();
    let desired = drift_dsl::load_realm(
        "schema \"public\" {}\ntable \"t\" { schema = schema.public\n column \"c\" { type = int } }",
        "desired.dft",
        &dialect,
    )
    .unwrap();

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&current, &desired)
        .unwrap();
    let plan = PostgresPlan.plan_changes("m", &changes).unwrap();

    assert!(plan.reversible());
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("DROP TABLE \"public\".\"t\"")
    );
}

#[test]
fn drop_column_has_no_reverse() {
    let dialect = dialect();
    let current = drift_dsl::load_realm(
        "schema \"public\" {}\ntable \"t\" { schema = schema.public\n column \"a\" { type = int }\n column \"b\" { type = int } }",
        "current.dft",
        &dialect,
    )
    .unwrap();
    let desired = drift_dsl::load_realm(
        "schema \"public\" {}\ntable \"t\" { schema = schema.public\n column \"a\" { type = int } }",
        "desired.dft",
        &dialect,
    )
    .unwrap();

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&current, &desired)
        .unwrap();
    assert!(matches!(&changes[0], Change::DropColumn { .. }));

    let plan = PostgresPlan.plan_changes("m", &changes).unwrap();
    assert!(!plan.reversible());
    assert!(plan.statements[0].reverse.is_none());
}
