#[path = "support/realm_fixtures.rs"]
mod realm_fixtures;

use drift_core::{Change, DiffOptions, Differ, Schema, Table, TableRef, sort_changes};
use realm_fixtures::{fk, index_on, int_column, nullable_int_column, realm_with, table_with_columns};

fn op_positions(changes: &[Change]) -> impl Fn(&str) -> usize + '_ {
    move |op_name| {
        changes
            .iter()
            .position(|change| change.op_name() == op_name)
            .unwrap_or_else(|| panic!("missing {op_name} in {changes:?}"))
    }
}

#[test]
fn add_foreign_key_follows_both_tables() {
    let mut users = table_with_columns("users", &[int_column("id"), int_column("team_id")]);
    users.add_foreign_key(fk("users_team_fk", "team_id", "teams"));
    let teams = table_with_columns("teams", &[int_column("id")]);

    let from = realm_with(vec![]);
    // Declared order puts the referencing table first on purpose.
    let to = realm_with(vec![users, teams]);

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&from, &to)
        .unwrap();
    let pos = op_positions(&changes);

    let fk_pos = pos("AddForeignKey");
    let users_pos = changes
        .iter()
        .position(
            |change| matches!(change, Change::AddTable { table } if table.name == "users"),
        )
        .unwrap();
    let teams_pos = changes
        .iter()
        .position(
            |change| matches!(change, Change::AddTable { table } if table.name == "teams"),
        )
        .unwrap();

    assert!(teams_pos < users_pos, "referenced table is created first");
    assert!(users_pos < fk_pos, "foreign keys are added after both tables");
}

#[test]
fn self_referencing_tables_still_create_then_link() {
    let mut tree = table_with_columns("tree", &[int_column("id"), nullable_int_column("parent")]);
    let mut self_fk = fk("tree_parent_fk", "parent", "tree");
    self_fk.ref_columns = vec!["id".to_string()];
    tree.add_foreign_key(self_fk);

    let from = realm_with(vec![]);
    let to = realm_with(vec![tree]);

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&from, &to)
        .unwrap();
    let pos = op_positions(&changes);
    assert!(pos("AddTable") < pos("AddForeignKey"));
}

#[test]
fn drop_foreign_key_precedes_drop_of_referenced_table() {
    let mut users = table_with_columns("users", &[int_column("id"), int_column("team_id")]);
    users.add_foreign_key(fk("users_team_fk", "team_id", "teams"));
    let teams = table_with_columns("teams", &[int_column("id")]);

    let from = realm_with(vec![users, teams]);
    let to = realm_with(vec![table_with_columns(
        "users",
        &[int_column("id"), int_column("team_id")],
    )]);

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&from, &to)
        .unwrap();
    let pos = op_positions(&changes);
    assert!(pos("DropForeignKey") < pos("DropTable"));
}

#[test]
fn add_schema_precedes_its_tables() {
    let from = drift_core::Realm::new();
    let mut to = drift_core::Realm::new();
    let mut schema = Schema::new("app");
    schema.add_table(table_with_columns("t", &[int_column("id")]));
    to.add_schema(schema);

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&from, &to)
        .unwrap();
    let pos = op_positions(&changes);
    assert!(pos("AddSchema") < pos("AddTable"));
}

#[test]
fn columns_are_added_before_their_indexes() {
    let from = realm_with(vec![table_with_columns("t", &[int_column("id")])]);
    let mut to_table = table_with_columns("t", &[int_column("id"), int_column("email")]);
    to_table.add_index(index_on("t_email", "email"));
    let to = realm_with(vec![to_table]);

    let changes = Differ::new(DiffOptions::default())
        .realm_diff(&from, &to)
        .unwrap();
    let pos = op_positions(&changes);
    assert!(pos("AddColumn") < pos("AddIndex"));
}

#[test]
fn sort_is_stable_for_same_group_changes() {
    let table_a = TableRef::new("public", "a");
    let table_b = TableRef::new("public", "b");
    let changes = vec![
        Change::AddColumn {
            table: table_a.clone(),
            column: int_column("c1"),
        },
        Change::AddColumn {
            table: table_b.clone(),
            column: int_column("c2"),
        },
        Change::AddColumn {
            table: table_a.clone(),
            column: int_column("c3"),
        },
    ];

    let sorted = sort_changes(changes);
    let names = sorted
        .iter()
        .map(|change| match change {
            Change::AddColumn { column, .. } => column.name.clone(),
            _ => unreachable!(),
        })
        .collect::<Vec<_>>();
    // Per-table clustering keeps the first-seen table first and preserves
    // declaration order within each table.
    assert_eq!(names, vec!["c1", "c3", "c2"]);
}

#[test]
fn drop_table_precedes_add_table_reusing_the_name() {
    let mut users_v2 = Table::new("users");
    users_v2.add_column(int_column("uuid"));
    let changes = vec![
        Change::AddTable {
            table: {
                let mut table = users_v2.clone();
                table.schema = "public".to_string();
                table
            },
        },
        Change::DropTable {
            table: {
                let mut table = table_with_columns("users", &[int_column("id")]);
                table.schema = "public".to_string();
                table
            },
        },
    ];

    let sorted = sort_changes(changes);
    assert_eq!(sorted[0].op_name(), "DropTable");
    assert_eq!(sorted[1].op_name(), "AddTable");
}
