use std::{fmt, io, path::PathBuf};

use anyhow::Context as _;
use miette::Report;

const FILE_READ_CONTEXT: &str = "while reading declarative schema file";

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    Usage(String),
    ReadFile { path: PathBuf, source: io::Error },
    Core(drift_core::Error),
}

impl From<drift_core::Error> for CliError {
    fn from(value: drift_core::Error) -> Self {
        Self::Core(value)
    }
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::Usage(message) => format!("[usage] {message}"),
        CliError::ReadFile { path, source } => {
            let context = format!("{FILE_READ_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[io] {report}")
        }
        CliError::Core(source) => {
            let category = core_category(&source);
            let report = report_with_context(source, "while running the schema pipeline");
            format!("[{category}] {report}")
        }
    }
}

pub(crate) fn exit_code(error: &CliError) -> i32 {
    match error {
        CliError::Usage(_) => 2,
        _ => 1,
    }
}

fn core_category(error: &drift_core::Error) -> &'static str {
    match error {
        drift_core::Error::Load(_) => "load",
        drift_core::Error::Diff(_) => "diff",
        drift_core::Error::Plan(_) => "plan",
        drift_core::Error::Exec(_) => "exec",
        drift_core::Error::Lint(_) => "lint",
        drift_core::Error::NotRegistered(_) => "driver",
    }
}

fn report_with_context(
    source: impl std::error::Error + Send + Sync + 'static,
    context: impl fmt::Display,
) -> Report {
    let wrapped = anyhow::Error::new(source).context(context.to_string());
    Report::msg(format!("{wrapped:#}"))
}
