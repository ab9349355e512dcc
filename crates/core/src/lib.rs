mod change;
mod diff;
mod driver;
mod error;
mod ordering;
mod plan;
mod registry;
mod schema;
mod selector;
mod value;

pub use change::{
    Change, ColumnChange, FkChange, IndexChange, Object, PkChange,
};
pub use diff::{
    DEFAULT_EQUIVALENCE_POLICY, DefaultEquivalencePolicy, DiffOptions, Differ, EquivalencePolicy,
    RenameHint, column_fingerprint, table_fingerprint,
};
pub use driver::{Applier, Cancellation, InspectOptions, Inspector, StatementParser};
pub use error::{
    DiffError, Error, ExecError, FilePos, LintFatal, LoadError, PlanError, Result,
};
pub use ordering::sort_changes;
pub use plan::{Plan, PlanFormatter, PlanStatement};
pub use registry::{
    Dialect, DropPolicy, KNOWN_DRIVERS, OverrideMap, Registry, TypeFormatter, TypeResolver,
};
pub use schema::{
    Attr, Check, Column, ColumnType, EnumType, Expr, ForeignKey, Func, Generated, GeneratedKind,
    Index, IndexPart, IndexPartKind, IntSize, Proc, Realm, RefAction, Schema, Table, TableRef,
    TimeKind, Trigger, TriggerEvent, TriggerTiming, TypeKind, View, charset_of, collation_of,
    comment_of, get_attr, set_attr, type_narrows,
};
pub use selector::{ObjectKind, Pattern, exclude, glob_match, parse_pattern};
pub use value::{Attribute, Literal, Pos, RefValue, Resource, TypeCall, Value, ValueError,
    value_total_eq,
};
