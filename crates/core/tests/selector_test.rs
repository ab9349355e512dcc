#[path = "support/realm_fixtures.rs"]
mod realm_fixtures;

use drift_core::{Realm, Schema, exclude, parse_pattern};
use realm_fixtures::{index_on, int_column, table_with_columns};

fn sample_realm() -> Realm {
    let mut sales = Schema::new("sales");
    let mut t1 = table_with_columns("t1", &[int_column("c1"), int_column("d1")]);
    t1.add_index(index_on("c2", "c1"));
    sales.add_table(t1);
    sales.add_table(table_with_columns("t2", &[int_column("c1")]));
    sales.add_table(table_with_columns("archive", &[int_column("id")]));

    let mut support = Schema::new("support");
    support.add_table(table_with_columns("t1", &[int_column("c1")]));

    let mut realm = Realm::new();
    realm.add_schema(sales);
    realm.add_schema(support);
    realm
}

fn patterns(raw: &[&str]) -> Vec<drift_core::Pattern> {
    raw.iter()
        .map(|pattern| parse_pattern(pattern).unwrap())
        .collect()
}

#[test]
fn single_segment_excludes_whole_schemas() {
    let mut realm = sample_realm();
    exclude(&mut realm, &patterns(&["s*"]));
    assert!(realm.schemas.is_empty());
}

#[test]
fn two_segments_prune_schema_objects() {
    let mut realm = sample_realm();
    exclude(&mut realm, &patterns(&["sales.t[12]"]));

    let sales = realm.schema("sales").unwrap();
    assert!(sales.table("t1").is_none());
    assert!(sales.table("t2").is_none());
    assert!(sales.table("archive").is_some());
    // Other schemas are untouched.
    assert!(realm.schema("support").unwrap().table("t1").is_some());
}

#[test]
fn child_selector_prunes_only_matching_kind() {
    let mut realm = sample_realm();
    exclude(&mut realm, &patterns(&["s*.t[12].c?[type=column]"]));

    let t1 = realm.schema("sales").unwrap().table("t1").unwrap();
    assert!(t1.column("c1").is_none(), "c1 matches the glob and kind");
    assert!(t1.column("d1").is_some(), "d1 does not match the glob");
    assert!(t1.index("c2").is_some(), "indexes are excluded by kind");
}

#[test]
fn child_exclusion_without_kind_prunes_every_child_kind() {
    let mut realm = sample_realm();
    exclude(&mut realm, &patterns(&["sales.t1.c*"]));

    let t1 = realm.schema("sales").unwrap().table("t1").unwrap();
    assert!(t1.column("c1").is_none());
    assert!(t1.index("c2").is_none());
    assert!(t1.column("d1").is_some());
}

#[test]
fn exclusion_commutes() {
    let first = ["sales.t1.c*", "s*.t2"];
    let second = ["s*.t2", "sales.t1.c*"];

    let mut left = sample_realm();
    exclude(&mut left, &patterns(&first));
    let mut right = sample_realm();
    exclude(&mut right, &patterns(&second));

    assert_eq!(left, right);
}
