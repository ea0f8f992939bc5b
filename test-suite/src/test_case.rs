use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

pub const INPUT_FILE: &str = "input.json";
pub const OUTPUT_FILE: &str = "output.nix";
pub const ERROR_FILE: &str = "error.txt";

/// What converting the input must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Exact Nix source.
    Output(String),
    /// Exact error message.
    Error(String),
}

/// One case directory: `input.json` plus either `output.nix` or `error.txt`.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub path: PathBuf,
    pub input: serde_json::Value,
    pub expectation: Expectation,
}

impl TestCase {
    pub fn load(dir: &Path) -> Result<Self> {
        let name = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let input_path = dir.join(INPUT_FILE);
        let input = fs::read_to_string(&input_path)
            .with_context(|| format!("Failed to read {}", input_path.display()))?;
        let input = serde_json::from_str(&input)
            .with_context(|| format!("Failed to parse {}", input_path.display()))?;

        let output_path = dir.join(OUTPUT_FILE);
        let error_path = dir.join(ERROR_FILE);
        let expectation = match (output_path.exists(), error_path.exists()) {
            (true, false) => Expectation::Output(read_expected(&output_path)?),
            (false, true) => Expectation::Error(read_expected(&error_path)?),
            (true, true) => bail!("{name}: both {OUTPUT_FILE} and {ERROR_FILE} are present"),
            (false, false) => bail!("{name}: neither {OUTPUT_FILE} nor {ERROR_FILE} is present"),
        };

        Ok(Self {
            name,
            path: dir.to_path_buf(),
            input,
            expectation,
        })
    }
}

/// Reads an expectation file, dropping the single trailing newline editors add.
fn read_expected(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let content = content.strip_suffix('\n').unwrap_or(&content);
    Ok(content.strip_suffix('\r').unwrap_or(content).to_string())
}
