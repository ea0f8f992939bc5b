use anyhow::{Result, bail};
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};

use crate::test_case::INPUT_FILE;
use crate::{Expectation, TestCase, TestFailure, TestResults};

pub struct TestRunner {
    cases_dir: PathBuf,
}

impl TestRunner {
    pub fn new(cases_dir: impl Into<PathBuf>) -> Self {
        Self {
            cases_dir: cases_dir.into(),
        }
    }

    /// Discover and run all test cases
    pub fn run_all(&self) -> Result<TestResults> {
        let mut results = TestResults::new();

        for case_dir in self.discover_cases()? {
            match TestCase::load(&case_dir) {
                Ok(test_case) => match run_test_case(&test_case) {
                    Ok(()) => results.add_pass(),
                    Err(e) => results.add_failure(case_failure(&test_case, &e)),
                },
                Err(e) => {
                    results.add_failure(TestFailure::new(
                        case_dir.display().to_string(),
                        format!("Failed to load test case: {e:#}"),
                    ));
                }
            }
        }

        Ok(results)
    }

    /// Every directory below the cases directory that holds an input file
    fn discover_cases(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        walk_directory(&self.cases_dir, &mut dirs)?;
        dirs.sort();
        Ok(dirs)
    }
}

fn walk_directory(dir: &Path, dirs: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    if dir.join(INPUT_FILE).is_file() {
        dirs.push(dir.to_path_buf());
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_directory(&path, dirs)?;
        }
    }

    Ok(())
}

/// Names the case directory so a failure can be traced to its fixture files
fn case_failure(test_case: &TestCase, error: &anyhow::Error) -> TestFailure {
    TestFailure::new(
        &test_case.name,
        format!("{}: {error}", test_case.path.display()),
    )
}

fn run_test_case(test_case: &TestCase) -> Result<()> {
    let value = nix_expr::Value::from(test_case.input.clone());
    match (&test_case.expectation, nix_expr::to_string(&value)) {
        (Expectation::Output(expected), Ok(actual)) => {
            if *expected != actual {
                bail!("Output mismatch:\n{}", diff(expected, &actual));
            }
        }
        (Expectation::Output(_), Err(e)) => bail!("Conversion failed: {e}"),
        (Expectation::Error(expected), Err(e)) => {
            let actual = e.to_string();
            if *expected != actual {
                bail!("Error mismatch:\n{}", diff(expected, &actual));
            }
        }
        (Expectation::Error(expected), Ok(actual)) => {
            bail!("Expected error `{expected}`, but conversion produced:\n{actual}")
        }
    }
    Ok(())
}

fn diff(expected: &str, actual: &str) -> String {
    TextDiff::from_lines(expected, actual)
        .unified_diff()
        .header("expected", "actual")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(input: serde_json::Value, expectation: Expectation) -> TestCase {
        TestCase {
            name: "inline".to_string(),
            path: PathBuf::from("inline"),
            input,
            expectation,
        }
    }

    #[test]
    fn test_matching_output_passes() {
        let test_case = case(json!([1, 2]), Expectation::Output("[ 1 2 ]".to_string()));
        assert!(run_test_case(&test_case).is_ok());
    }

    #[test]
    fn test_mismatch_reports_diff() {
        let test_case = case(
            json!({"a": 1}),
            Expectation::Output("{\n  a = 2;\n}".to_string()),
        );
        let error = run_test_case(&test_case).unwrap_err().to_string();
        assert!(error.contains("-  a = 2;"));
        assert!(error.contains("+  a = 1;"));
    }

    #[test]
    fn test_failure_names_case_directory() {
        let test_case = case(json!(1), Expectation::Output("2".to_string()));
        let error = run_test_case(&test_case).unwrap_err();
        let failure = case_failure(&test_case, &error);
        assert_eq!(failure.test_name, "inline");
        assert!(failure.error.starts_with("inline: Output mismatch:"));
    }

    #[test]
    fn test_expected_error_passes() {
        let test_case = case(
            json!(u64::MAX),
            Expectation::Error(format!(
                "Unsupported value at (root): unsigned integer {} exceeds the Nix integer range",
                u64::MAX
            )),
        );
        assert!(run_test_case(&test_case).is_ok());
    }

    #[test]
    fn test_missing_cases_dir_is_empty() {
        let results = TestRunner::new("does-not-exist").run_all().unwrap();
        assert_eq!(results.total, 0);
        assert!(results.is_success());
    }
}
