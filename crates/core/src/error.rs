use std::fmt;

use thiserror::Error;

use crate::value::{Pos, ValueError};

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A position within a named source file, rendered as `file:line:col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePos {
    pub file: String,
    pub pos: Pos,
}

impl FilePos {
    pub fn new(file: impl Into<String>, pos: Pos) -> Self {
        Self {
            file: file.into(),
            pos,
        }
    }
}

impl fmt::Display for FilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.pos)
    }
}

fn format_pos(pos: Option<&FilePos>) -> String {
    match pos {
        Some(pos) => format!(" at {pos}"),
        None => String::new(),
    }
}

/// Failures while loading a declarative document into the schema model.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("syntax error{}: {message}", format_pos(pos.as_ref()))]
    Syntax {
        message: String,
        pos: Option<FilePos>,
    },
    #[error("unresolved reference `{reference}`{}", format_pos(pos.as_ref()))]
    UnresolvedRef {
        reference: String,
        pos: Option<FilePos>,
    },
    #[error("unsupported type `{type_repr}` for dialect `{dialect}`{}", format_pos(pos.as_ref()))]
    UnsupportedType {
        type_repr: String,
        dialect: String,
        pos: Option<FilePos>,
    },
    #[error("attribute `{key}`{}: {source}", format_pos(pos.as_ref()))]
    Attribute {
        key: String,
        pos: Option<FilePos>,
        source: ValueError,
    },
    #[error("invalid exclusion pattern `{pattern}`: {message}")]
    Selector { pattern: String, message: String },
}

/// Failures raised by the structural differ.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("unsupported change on `{object}`: {reason}")]
    UnsupportedChange { object: String, reason: String },
    #[error("ambiguous rename of `{object}`: candidates {candidates:?}")]
    AmbiguousChange {
        object: String,
        candidates: Vec<String>,
    },
    #[error("back-reference mismatch on `{object}`: parent is `{found}`, expected `{expected}`")]
    BackRef {
        object: String,
        expected: String,
        found: String,
    },
}

/// Failures while formatting a change stream into dialect SQL.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("dialect `{dialect}` cannot plan {change}: {reason}")]
    Unsupported {
        dialect: String,
        change: String,
        reason: String,
    },
}

/// Driver-boundary failures. The underlying driver message is preserved as
/// the error source.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("introspection failed: {message}")]
    Introspect {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },
    #[error("apply failed on statement {statement_index} after {applied} applied: {sql}")]
    Apply {
        statement_index: usize,
        applied: usize,
        sql: String,
        #[source]
        source: Option<BoxedError>,
    },
    #[error("operation cancelled")]
    Cancelled,
}

impl ExecError {
    pub fn introspect(message: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::Introspect {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// A lint pipeline that was configured as fatal and raised diagnostics.
#[derive(Debug, Error)]
#[error("lint failed: {diagnostics} diagnostics reported by fatal analyzers")]
pub struct LintFatal {
    pub diagnostics: usize,
}

/// Top-level error of the engine, layered by subsystem.
#[derive(Debug, Error)]
pub enum Error {
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("execution error: {0}")]
    Exec(#[from] ExecError),
    #[error("lint error: {0}")]
    Lint(#[from] LintFatal),
    #[error("driver `{0}` is not registered")]
    NotRegistered(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_renders_position() {
        let err = LoadError::UnresolvedRef {
            reference: "schema.missing".to_string(),
            pos: Some(FilePos::new("schema.dft", Pos { line: 4, column: 9 })),
        };
        assert_eq!(
            err.to_string(),
            "unresolved reference `schema.missing` at schema.dft:4:9"
        );
    }

    #[test]
    fn errors_wrap_into_layers() {
        let err: Error = DiffError::UnsupportedChange {
            object: "users.full_name".to_string(),
            reason: "cannot change stored generation expression".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Diff(_)));
        assert!(err.to_string().starts_with("diff error:"));
    }
}
