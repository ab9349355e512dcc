use bitflags::bitflags;

use crate::schema::{
    Attr, Check, Column, EnumType, ForeignKey, Func, Index, Proc, Schema, Table, TableRef, Trigger,
    View,
};

bitflags! {
    /// What changed between two versions of a column. Bits are assigned in
    /// the fixed tie-break order, so masks compare deterministically.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ColumnChange: u16 {
        const NULL = 1;
        const TYPE = 1 << 1;
        const DEFAULT = 1 << 2;
        const COMMENT = 1 << 3;
        const GENERATED = 1 << 4;
        const COLLATION = 1 << 5;
        const CHARSET = 1 << 6;
        const ATTR = 1 << 7;
        const GENERATED_EXPR = 1 << 8;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IndexChange: u8 {
        const UNIQUE = 1;
        const PARTS = 1 << 1;
        const PREDICATE = 1 << 2;
        const ATTR = 1 << 3;
        const INCLUDE = 1 << 4;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PkChange: u8 {
        const PARTS = 1;
        const ATTR = 1 << 1;
        const UNIQUE = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FkChange: u8 {
        const COLUMN = 1;
        const REF_COLUMN = 1 << 1;
        const REF_TABLE = 1 << 2;
        const UPDATE_ACTION = 1 << 3;
        const DELETE_ACTION = 1 << 4;
    }
}

/// A first-class schema object that is neither a table nor a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Enum(EnumType),
    Func(Func),
    Proc(Proc),
}

impl Object {
    pub fn name(&self) -> &str {
        match self {
            Self::Enum(decl) => &decl.name,
            Self::Func(func) => &func.name,
            Self::Proc(proc) => &proc.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Enum(_) => "enum",
            Self::Func(_) => "function",
            Self::Proc(_) => "procedure",
        }
    }
}

/// One step of a schema migration. Drop variants carry the full before
/// snapshot so plans can be reversed; Modify variants carry both sides plus
/// the change mask.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    AddSchema {
        schema: Schema,
    },
    DropSchema {
        schema: Schema,
    },
    ModifySchema {
        schema: String,
        changes: Vec<Change>,
    },
    AddTable {
        table: Table,
    },
    DropTable {
        table: Table,
    },
    ModifyTable {
        table: TableRef,
        changes: Vec<Change>,
    },
    RenameTable {
        from: TableRef,
        to: TableRef,
    },
    AddColumn {
        table: TableRef,
        column: Column,
    },
    DropColumn {
        table: TableRef,
        column: Column,
    },
    ModifyColumn {
        table: TableRef,
        from: Column,
        to: Column,
        change: ColumnChange,
    },
    RenameColumn {
        table: TableRef,
        from: String,
        to: String,
    },
    AddIndex {
        table: TableRef,
        index: Index,
    },
    DropIndex {
        table: TableRef,
        index: Index,
    },
    ModifyIndex {
        table: TableRef,
        from: Index,
        to: Index,
        change: IndexChange,
    },
    RenameIndex {
        table: TableRef,
        from: String,
        to: String,
    },
    AddPrimaryKey {
        table: TableRef,
        pk: Index,
    },
    DropPrimaryKey {
        table: TableRef,
        pk: Index,
    },
    ModifyPrimaryKey {
        table: TableRef,
        from: Index,
        to: Index,
        change: PkChange,
    },
    AddForeignKey {
        table: TableRef,
        fk: ForeignKey,
    },
    DropForeignKey {
        table: TableRef,
        fk: ForeignKey,
    },
    ModifyForeignKey {
        table: TableRef,
        from: ForeignKey,
        to: ForeignKey,
        change: FkChange,
    },
    AddCheck {
        table: TableRef,
        check: Check,
    },
    DropCheck {
        table: TableRef,
        check: Check,
    },
    ModifyCheck {
        table: TableRef,
        from: Check,
        to: Check,
    },
    AddAttr {
        attr: Attr,
    },
    DropAttr {
        attr: Attr,
    },
    ModifyAttr {
        from: Attr,
        to: Attr,
    },
    AddView {
        view: View,
    },
    DropView {
        view: View,
    },
    ModifyView {
        from: View,
        to: View,
    },
    AddTrigger {
        table: TableRef,
        trigger: Trigger,
    },
    DropTrigger {
        table: TableRef,
        trigger: Trigger,
    },
    AddObject {
        schema: String,
        object: Object,
    },
    DropObject {
        schema: String,
        object: Object,
    },
    ModifyObject {
        schema: String,
        from: Object,
        to: Object,
    },
}

impl Change {
    /// Short human description used as the plan comment for the change,
    /// e.g. `Create "users" table`.
    pub fn describe(&self) -> String {
        match self {
            Self::AddSchema { schema } => format!("Add new schema named {:?}", schema.name),
            Self::DropSchema { schema } => format!("Drop schema named {:?}", schema.name),
            Self::ModifySchema { schema, .. } => format!("Modify {schema:?} schema"),
            Self::AddTable { table } => format!("Create {:?} table", table.name),
            Self::DropTable { table } => format!("Drop {:?} table", table.name),
            Self::ModifyTable { table, .. } => format!("Modify {:?} table", table.name),
            Self::RenameTable { from, to } => {
                format!("Rename table from {:?} to {:?}", from.name, to.name)
            }
            Self::AddColumn { table, column } => {
                format!("Add column {:?} to table {:?}", column.name, table.name)
            }
            Self::DropColumn { table, column } => {
                format!("Drop column {:?} from table {:?}", column.name, table.name)
            }
            Self::ModifyColumn { table, to, .. } => {
                format!("Modify column {:?} of table {:?}", to.name, table.name)
            }
            Self::RenameColumn { table, from, to } => format!(
                "Rename column {from:?} to {to:?} in table {:?}",
                table.name
            ),
            Self::AddIndex { table, index } => {
                format!("Add index {:?} to table {:?}", index.name, table.name)
            }
            Self::DropIndex { table, index } => {
                format!("Drop index {:?} from table {:?}", index.name, table.name)
            }
            Self::ModifyIndex { table, to, .. } => {
                format!("Modify index {:?} on table {:?}", to.name, table.name)
            }
            Self::RenameIndex { table, from, to } => {
                format!("Rename index {from:?} to {to:?} on table {:?}", table.name)
            }
            Self::AddPrimaryKey { table, .. } => {
                format!("Add primary key to table {:?}", table.name)
            }
            Self::DropPrimaryKey { table, .. } => {
                format!("Drop primary key of table {:?}", table.name)
            }
            Self::ModifyPrimaryKey { table, .. } => {
                format!("Modify primary key of table {:?}", table.name)
            }
            Self::AddForeignKey { table, fk } => {
                format!("Add foreign key {:?} to table {:?}", fk.symbol, table.name)
            }
            Self::DropForeignKey { table, fk } => format!(
                "Drop foreign key {:?} from table {:?}",
                fk.symbol, table.name
            ),
            Self::ModifyForeignKey { table, to, .. } => {
                format!("Modify foreign key {:?} of table {:?}", to.symbol, table.name)
            }
            Self::AddCheck { table, check } => {
                format!("Add check {:?} to table {:?}", check.name, table.name)
            }
            Self::DropCheck { table, check } => {
                format!("Drop check {:?} from table {:?}", check.name, table.name)
            }
            Self::ModifyCheck { table, to, .. } => {
                format!("Modify check {:?} of table {:?}", to.name, table.name)
            }
            Self::AddAttr { attr } => format!("Set {:?} attribute", attr.key()),
            Self::DropAttr { attr } => format!("Unset {:?} attribute", attr.key()),
            Self::ModifyAttr { to, .. } => format!("Modify {:?} attribute", to.key()),
            Self::AddView { view } => format!("Create {:?} view", view.name),
            Self::DropView { view } => format!("Drop {:?} view", view.name),
            Self::ModifyView { to, .. } => format!("Modify {:?} view", to.name),
            Self::AddTrigger { table, trigger } => {
                format!("Add trigger {:?} to table {:?}", trigger.name, table.name)
            }
            Self::DropTrigger { table, trigger } => format!(
                "Drop trigger {:?} from table {:?}",
                trigger.name, table.name
            ),
            Self::AddObject { object, .. } => {
                format!("Create {} {:?}", object.kind(), object.name())
            }
            Self::DropObject { object, .. } => {
                format!("Drop {} {:?}", object.kind(), object.name())
            }
            Self::ModifyObject { to, .. } => format!("Modify {} {:?}", to.kind(), to.name()),
        }
    }

    /// The change variant name, used in error and lint messages.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::AddSchema { .. } => "AddSchema",
            Self::DropSchema { .. } => "DropSchema",
            Self::ModifySchema { .. } => "ModifySchema",
            Self::AddTable { .. } => "AddTable",
            Self::DropTable { .. } => "DropTable",
            Self::ModifyTable { .. } => "ModifyTable",
            Self::RenameTable { .. } => "RenameTable",
            Self::AddColumn { .. } => "AddColumn",
            Self::DropColumn { .. } => "DropColumn",
            Self::ModifyColumn { .. } => "ModifyColumn",
            Self::RenameColumn { .. } => "RenameColumn",
            Self::AddIndex { .. } => "AddIndex",
            Self::DropIndex { .. } => "DropIndex",
            Self::ModifyIndex { .. } => "ModifyIndex",
            Self::RenameIndex { .. } => "RenameIndex",
            Self::AddPrimaryKey { .. } => "AddPrimaryKey",
            Self::DropPrimaryKey { .. } => "DropPrimaryKey",
            Self::ModifyPrimaryKey { .. } => "ModifyPrimaryKey",
            Self::AddForeignKey { .. } => "AddForeignKey",
            Self::DropForeignKey { .. } => "DropForeignKey",
            Self::ModifyForeignKey { .. } => "ModifyForeignKey",
            Self::AddCheck { .. } => "AddCheck",
            Self::DropCheck { .. } => "DropCheck",
            Self::ModifyCheck { .. } => "ModifyCheck",
            Self::AddAttr { .. } => "AddAttr",
            Self::DropAttr { .. } => "DropAttr",
            Self::ModifyAttr { .. } => "ModifyAttr",
            Self::AddView { .. } => "AddView",
            Self::DropView { .. } => "DropView",
            Self::ModifyView { .. } => "ModifyView",
            Self::AddTrigger { .. } => "AddTrigger",
            Self::DropTrigger { .. } => "DropTrigger",
            Self::AddObject { .. } => "AddObject",
            Self::DropObject { .. } => "DropObject",
            Self::ModifyObject { .. } => "ModifyObject",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, IntSize, TypeKind};

    #[test]
    fn column_change_bits_follow_tie_break_order() {
        assert!(ColumnChange::NULL.bits() < ColumnChange::TYPE.bits());
        assert!(ColumnChange::TYPE.bits() < ColumnChange::DEFAULT.bits());
        assert!(ColumnChange::DEFAULT.bits() < ColumnChange::COMMENT.bits());
        assert!(ColumnChange::COMMENT.bits() < ColumnChange::ATTR.bits());
    }

    #[test]
    fn describe_names_the_object() {
        let table = Table::new("users");
        let change = Change::AddTable { table };
        assert_eq!(change.describe(), "Create \"users\" table");

        let column = Column::new(
            "id",
            ColumnType::new(
                TypeKind::Integer {
                    size: IntSize::Standard,
                    unsigned: false,
                },
                "int",
            ),
        );
        let change = Change::AddColumn {
            table: TableRef::new("public", "users"),
            column,
        };
        assert_eq!(change.describe(), "Add column \"id\" to table \"users\"");
    }
}
