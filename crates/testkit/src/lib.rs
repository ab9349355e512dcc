//! YAML-driven test runner for dialect plan behavior.
//!
//! A case names a `current` and a `desired` declarative document; the
//! runner decodes both under the dialect, diffs them, plans the change
//! stream, and compares the rendered SQL (or the failure message) with the
//! expectation.

use std::collections::BTreeMap;

use serde::Deserialize;

use drift_core::{Dialect, DiffOptions, Differ, LoadError, Realm, Result};

const CASE_FILE_NAME: &str = "testcase.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestCase {
    pub current: String,
    pub desired: String,
    /// Expected rendered plan (comments included). Compared line-by-line
    /// after trimming.
    pub plan: Option<String>,
    /// Expected failure: a substring of the error message.
    pub error: Option<String>,
    /// Restrict to one dialect name; `!name` excludes instead.
    pub dialect: Option<String>,
    pub detect_renames: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

pub fn load_test_cases_from_str(yaml: &str) -> Result<BTreeMap<String, TestCase>> {
    serde_yaml::from_str(yaml).map_err(|source| {
        LoadError::Syntax {
            message: format!("{CASE_FILE_NAME}: {source}"),
            pos: None,
        }
        .into()
    })
}

pub fn matches_dialect(requirement: Option<&str>, current: &str) -> bool {
    let Some(requirement) = requirement.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };
    if let Some(excluded) = requirement.strip_prefix('!') {
        return excluded != current;
    }
    requirement == current
}

pub fn run_case(dialect: &Dialect, case: &TestCase) -> TestResult {
    if !matches_dialect(case.dialect.as_deref(), dialect.name) {
        return TestResult::Skipped(format!("requires dialect {:?}", case.dialect));
    }

    match run_case_impl(dialect, case) {
        Ok(rendered) => match &case.error {
            Some(expected) => TestResult::Failed(format!(
                "expected failure containing {expected:?}, got a plan:\n{rendered}"
            )),
            None => compare_plan(case, &rendered),
        },
        Err(err) => {
            let message = err.to_string();
            match &case.error {
                Some(expected) if message.contains(expected.trim()) => TestResult::Passed,
                Some(expected) => TestResult::Failed(format!(
                    "expected failure containing {expected:?}, got: {message}"
                )),
                None => TestResult::Failed(message),
            }
        }
    }
}

fn run_case_impl(dialect: &Dialect, case: &TestCase) -> Result<String> {
    let current = load_realm(dialect, &case.current, "current.dft")?;
    let desired = load_realm(dialect, &case.desired, "desired.dft")?;

    let mut options = DiffOptions::default();
    options.detect_renames = case.detect_renames;
    options.policy = dialect.policy.clone();
    let changes = Differ::new(options).realm_diff(&current, &desired)?;

    let formatter = dialect
        .plan
        .bind_desired(&desired)
        .unwrap_or_else(|| dialect.plan.clone());
    let plan = formatter.plan_changes("testcase", &changes)?;
    Ok(plan.render())
}

fn load_realm(dialect: &Dialect, document: &str, file: &str) -> Result<Realm> {
    drift_dsl::load_realm(document, file, dialect)
}

fn compare_plan(case: &TestCase, rendered: &str) -> TestResult {
    let Some(expected) = &case.plan else {
        return TestResult::Passed;
    };
    let normalize = |text: &str| {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    };
    if normalize(expected) == normalize(rendered) {
        TestResult::Passed
    } else {
        TestResult::Failed(format!(
            "plan mismatch\n--- expected ---\n{expected}\n--- actual ---\n{rendered}"
        ))
    }
}

/// Runs every case of a YAML suite and panics with a readable summary on
/// the first failure. Intended for dialect integration tests.
pub fn assert_suite(dialect: &Dialect, yaml: &str) {
    let cases = match load_test_cases_from_str(yaml) {
        Ok(cases) => cases,
        Err(err) => panic!("cannot load test cases: {err}"),
    };
    let mut failures = Vec::new();
    for (name, case) in &cases {
        match run_case(dialect, case) {
            TestResult::Passed | TestResult::Skipped(_) => {}
            TestResult::Failed(message) => failures.push(format!("{name}: {message}")),
        }
    }
    if !failures.is_empty() {
        panic!("{} case(s) failed:\n{}", failures.len(), failures.join("\n\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_requirements_match_and_exclude() {
        assert!(matches_dialect(None, "postgres"));
        assert!(matches_dialect(Some("postgres"), "postgres"));
        assert!(!matches_dialect(Some("postgres"), "mysql"));
        assert!(matches_dialect(Some("!postgres"), "mysql"));
        assert!(!matches_dialect(Some("!postgres"), "postgres"));
    }

    #[test]
    fn unknown_case_keys_are_rejected() {
        let yaml = "bad_case:\n  current: \"\"\n  desired: \"\"\n  bogus: 1\n";
        assert!(load_test_cases_from_str(yaml).is_err());
    }
}
