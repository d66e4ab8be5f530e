//! Project configuration read from `pyproject.toml`.

use crate::collection::error::{CollectionError, CollectionResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const PYPROJECT: &str = "pyproject.toml";

/// Settings under `[tool.relaxed]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RelaxedConfig {
    /// Paths collected when none are given on the command line
    pub testpaths: Vec<String>,
    /// Glob patterns of directories and files never collected
    pub ignore: Vec<String>,
    /// Columns per nesting level in the verbose report
    pub indent: usize,
    /// Leave files the host collects on its own to the host
    pub skip_host_test_files: bool,
    pub host_test_files: Vec<String>,
}

impl Default for RelaxedConfig {
    fn default() -> Self {
        Self {
            testpaths: Vec::new(),
            ignore: Vec::new(),
            indent: 4,
            skip_host_test_files: false,
            host_test_files: vec!["test_*.py".into(), "*_test.py".into()],
        }
    }
}

impl RelaxedConfig {
    /// Indentation unit string for one nesting level
    pub fn indent_unit(&self) -> String {
        " ".repeat(self.indent)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Tool,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    relaxed: Option<RelaxedConfig>,
}

/// Read `[tool.relaxed]` from the root's `pyproject.toml`.
///
/// A missing file or table yields the defaults.
pub fn read_config(rootpath: &Path) -> CollectionResult<RelaxedConfig> {
    let path: PathBuf = rootpath.join(PYPROJECT);
    if !path.is_file() {
        return Ok(RelaxedConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let pyproject: PyProject =
        toml::from_str(&content).map_err(|e| CollectionError::ConfigError {
            path: path.clone(),
            message: e.message().to_string(),
        })?;

    Ok(pyproject.tool.relaxed.unwrap_or_default())
}
