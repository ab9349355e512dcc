#[path = "support/fake_dialect.rs"]
mod fake_dialect;

use drift_core::{Attr, Error, Expr, LoadError, RefAction, TypeKind};
use drift_dsl::load_realm;
use fake_dialect::fake_dialect;

const DOCUMENT: &str = r#"
schema "public" {}

enum "status" {
  schema = schema.public
  values = ["active", "retired"]
}

table "teams" {
  schema = schema.public
  column "id" {
    type = int
  }
  primary_key {
    columns = [column.teams.id]
  }
}

table "users" {
  schema = schema.public
  comment = "registered accounts"
  column "id" {
    type = int
  }
  column "name" {
    type = varchar(255)
    null = true
  }
  column "state" {
    type = enum.status
  }
  column "team_id" {
    type = int
    default = 0
  }
  primary_key {
    columns = [column.users.id]
  }
  index "users_name" {
    unique = true
    columns = [column.users.name]
  }
  foreign_key "users_team_fk" {
    columns = [column.users.team_id]
    ref_columns = [column.teams.id]
    on_delete = CASCADE
  }
  check "team_positive" {
    expr = "team_id >= 0"
  }
}
"#;

#[test]
fn decoded_realm_satisfies_back_reference_invariants() {
    let realm = load_realm(DOCUMENT, "schema.dft", &fake_dialect()).unwrap();
    realm.validate().unwrap();

    let public = realm.schema("public").unwrap();
    for table in &public.tables {
        assert_eq!(table.schema, "public");
        for column in &table.columns {
            assert_eq!(column.table, table.name);
        }
    }
}

#[test]
fn columns_resolve_types_through_the_dialect() {
    let realm = load_realm(DOCUMENT, "schema.dft", &fake_dialect()).unwrap();
    let users = realm.schema("public").unwrap().table("users").unwrap();

    let name = users.column("name").unwrap();
    assert!(name.null);
    assert_eq!(name.ty.raw, "varchar(255)");
    assert_eq!(
        name.ty.kind,
        TypeKind::String {
            size: Some(255),
            fixed: false
        }
    );

    let state = users.column("state").unwrap();
    assert_eq!(
        state.ty.kind,
        TypeKind::Enum {
            values: vec!["active".to_string(), "retired".to_string()]
        }
    );

    let team_id = users.column("team_id").unwrap();
    assert_eq!(team_id.default, Some(Expr::int(0)));
}

#[test]
fn foreign_keys_resolve_referenced_tables() {
    let realm = load_realm(DOCUMENT, "schema.dft", &fake_dialect()).unwrap();
    let users = realm.schema("public").unwrap().table("users").unwrap();

    let fk = users.foreign_key("users_team_fk").unwrap();
    assert_eq!(fk.columns, vec!["team_id".to_string()]);
    assert_eq!(fk.ref_table.name, "teams");
    assert_eq!(fk.ref_table.schema, "public");
    assert_eq!(fk.ref_columns, vec!["id".to_string()]);
    assert_eq!(fk.on_delete, RefAction::Cascade);
    assert_eq!(fk.on_update, RefAction::NoAction);
}

#[test]
fn table_comment_decodes_as_typed_attribute() {
    let realm = load_realm(DOCUMENT, "schema.dft", &fake_dialect()).unwrap();
    let users = realm.schema("public").unwrap().table("users").unwrap();
    assert_eq!(users.comment(), Some("registered accounts"));
}

#[test]
fn unknown_schema_reference_fails_with_position() {
    let document = "table \"t\" {\n  schema = schema.missing\n  column \"id\" { type = int }\n}\n";
    let err = load_realm(document, "bad.dft", &fake_dialect()).unwrap_err();

    let Error::Load(LoadError::UnresolvedRef { reference, pos }) = err else {
        panic!("expected UnresolvedRef, got {err:?}");
    };
    assert_eq!(reference, "schema.missing");
    let pos = pos.expect("reference errors carry a position");
    assert_eq!(pos.file, "bad.dft");
    assert_eq!(pos.pos.line, 2);
}

#[test]
fn unknown_column_reference_fails() {
    let document = r#"
schema "public" {}
table "t" {
  schema = schema.public
  column "id" { type = int }
  primary_key {
    columns = [column.t.nope]
  }
}
"#;
    let err = load_realm(document, "bad.dft", &fake_dialect()).unwrap_err();
    assert!(matches!(
        err,
        Error::Load(LoadError::UnresolvedRef { reference, .. }) if reference == "column.t.nope"
    ));
}

#[test]
fn unsupported_type_reports_dialect() {
    let document = r#"
schema "public" {}
table "t" {
  schema = schema.public
  column "c" { type = moneybags }
}
"#;
    let err = load_realm(document, "bad.dft", &fake_dialect()).unwrap_err();
    assert!(matches!(
        err,
        Error::Load(LoadError::UnsupportedType { dialect, .. }) if dialect == "fake"
    ));
}

#[test]
fn unknown_attribute_keys_become_opaque_attrs() {
    let document = r#"
schema "public" {}
table "t" {
  schema = schema.public
  fillfactor = 70
  column "id" { type = int }
}
"#;
    let realm = load_realm(document, "schema.dft", &fake_dialect()).unwrap();
    let table = realm.schema("public").unwrap().table("t").unwrap();
    let attr = drift_core::get_attr(&table.attrs, "fillfactor").unwrap();
    assert!(matches!(
        attr,
        Attr::Unknown { value, .. } if *value == drift_core::Value::int(70)
    ));
}

#[test]
fn alias_keys_canonicalise_through_overrides() {
    let document = r#"
schema "public" {}
table "t" {
  schema = schema.public
  column "name" {
    type = text
    collation = "nocase"
  }
}
"#;
    let realm = load_realm(document, "schema.dft", &fake_dialect()).unwrap();
    let column = realm
        .schema("public")
        .unwrap()
        .table("t")
        .unwrap()
        .column("name")
        .unwrap();
    assert_eq!(drift_core::collation_of(&column.attrs), Some("nocase"));
}

#[test]
fn dialect_defaults_fill_unset_attributes() {
    let mut overrides = drift_core::OverrideMap::default();
    overrides.default_for("table", "charset", drift_core::Value::string("utf8mb4"));
    let dialect = fake_dialect::fake_dialect_with_overrides(overrides);

    let document = r#"
schema "public" {}
table "t" {
  schema = schema.public
  column "id" { type = int }
}
"#;
    let realm = load_realm(document, "schema.dft", &dialect).unwrap();
    let table = realm.schema("public").unwrap().table("t").unwrap();
    assert_eq!(drift_core::charset_of(&table.attrs), Some("utf8mb4"));
    // Columns are a different block kind and stay untouched.
    assert!(drift_core::charset_of(&table.column("id").unwrap().attrs).is_none());
}

#[test]
fn generated_columns_and_identity_decode() {
    let document = r#"
schema "public" {}
table "t" {
  schema = schema.public
  column "id" {
    type = int
    identity {
      seed = 1024
      increment = 1
    }
  }
  column "double_id" {
    type = int
    as {
      expr = "id * 2"
      type = STORED
    }
  }
}
"#;
    let realm = load_realm(document, "schema.dft", &fake_dialect()).unwrap();
    let table = realm.schema("public").unwrap().table("t").unwrap();

    let id = table.column("id").unwrap();
    assert!(matches!(
        drift_core::get_attr(&id.attrs, "identity"),
        Some(Attr::Identity {
            seed: 1024,
            increment: 1
        })
    ));

    let generated = table.column("double_id").unwrap().generated.as_ref().unwrap();
    assert_eq!(generated.expr, "id * 2");
    assert_eq!(generated.kind, drift_core::GeneratedKind::Stored);
}
