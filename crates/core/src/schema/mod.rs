mod attr;
mod model;
mod types;

pub use attr::{Attr, charset_of, collation_of, comment_of, get_attr, set_attr};
pub use model::{
    Check, Column, EnumType, ForeignKey, Func, Index, IndexPart, IndexPartKind, Proc, Realm,
    RefAction, Schema, Table, TableRef, Trigger, TriggerEvent, TriggerTiming, View,
};
pub use types::{
    ColumnType, Expr, Generated, GeneratedKind, IntSize, TimeKind, TypeKind, type_narrows,
};
