use drift_testkit::assert_suite;

#[test]
fn yaml_plan_cases() {
    assert_suite(
        &drift_dialect_sqlite::dialect(),
        include_str!("testdata/plan_cases.yaml"),
    );
}
