use drift_core::{
    Change, Column, ColumnType, Index, IntSize, Plan, PlanFormatter, PlanStatement, Result,
    Table, TableRef, TypeKind,
};
use drift_lint::{Pass, Pipeline, pass_parts_for_changes};

/// A one-statement-per-change formatter, enough to build a lintable pass
/// without pulling a dialect crate into the tests.
struct EchoPlan;

impl PlanFormatter for EchoPlan {
    fn dialect(&self) -> &'static str {
        "echo"
    }

    fn plan_changes(&self, name: &str, changes: &[Change]) -> Result<Plan> {
        let mut plan = Plan::new(name);
        for change in changes {
            plan.push(PlanStatement::new(
                format!("SELECT '{}'", change.op_name()),
                change.describe(),
            ));
        }
        Ok(plan)
    }
}

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
fn pipeline_collects_across_analyzers_and_reports_fatal_at_the_end() {
    let table_ref = TableRef::new("public", "users");
    let mut dropped = Table::new("old");
    dropped.schema = "public".to_string();
    let changes = vec![
        Change::DropTable { table: dropped },
        Change::AddIndex {
            table: table_ref.clone(),
            index: Index::on_columns("users_email", ["email"]).unique(),
        },
        Change::AddColumn {
            table: table_ref,
            column: int_column("b"),
        },
    ];

    let (file, groups) =
        pass_parts_for_changes(&EchoPlan, "migration.sql", &changes).unwrap();
    assert_eq!(file.statements.len(), 3);
    assert_eq!(groups.len(), 3);

    let config = {
        let mut config = drift_core::Resource::new("lint");
        let mut destructive = drift_core::Resource::new("destructive");
        destructive.set_attr(drift_core::Attribute::new(
            "error",
            drift_core::Value::bool(true),
        ));
        config.children.push(destructive);
        config
    };

    let pass = Pass::new(&file, &groups, None);
    let pipeline = Pipeline::for_driver("mysql", Some(&config));
    let (report, fatal) = pipeline.run(&pass);

    let codes = report
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.code.as_str())
        .collect::<Vec<_>>();
    // Every analyzer contributed before the fatal result was computed.
    assert!(codes.contains(&"DS102"));
    assert!(codes.contains(&"DD101"));
    assert!(codes.contains(&"DD103"));

    let fatal = fatal.expect("destructive was configured fatal");
    assert_eq!(fatal.diagnostics, 1);
}

#[test]
fn non_fatal_configuration_returns_report_only() {
    let mut dropped = Table::new("old");
    dropped.schema = "public".to_string();
    let changes = vec![Change::DropTable { table: dropped }];

    let (file, groups) =
        pass_parts_for_changes(&EchoPlan, "migration.sql", &changes).unwrap();
    let pass = Pass::new(&file, &groups, None);
    let (report, fatal) = Pipeline::for_driver("mysql", None).run(&pass);

    assert_eq!(report.diagnostics.len(), 1);
    assert!(fatal.is_none());
}

#[test]
fn report_serializes_to_json() {
    let mut dropped = Table::new("old");
    dropped.schema = "public".to_string();
    let changes = vec![Change::DropTable { table: dropped }];

    let (file, groups) =
        pass_parts_for_changes(&EchoPlan, "migration.sql", &changes).unwrap();
    let pass = Pass::new(&file, &groups, None);
    let (report, _) = Pipeline::for_driver("mysql", None).run(&pass);

    let json = report.to_json();
    assert!(json.contains("\"DS102\""));
    assert!(json.contains("migration.sql"));
}
