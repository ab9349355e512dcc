use drift_testkit::assert_suite;

#[test]
fn yaml_plan_cases() {
    assert_suite(
        &drift_dialect_mysql::dialect(),
        include_str!("testdata/plan_cases.yaml"),
    );
}

#[test]
fn mariadb_runs_the_shared_cases() {
    assert_suite(
        &drift_dialect_mysql::mariadb_dialect(),
        include_str!("testdata/plan_cases.yaml"),
    );
}
