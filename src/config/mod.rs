// src/config/mod.rs
//! Where a test finds its fixtures and which mode the VM runs in

use crate::provision::{ExecutionMode, ExecutionModeOracle, ProcessExecutionMode};
use crate::HarnessError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the fixtures directory
pub const FIXTURES_PATH_ENV: &str = "SNAPSHOT_HARNESS_FIXTURES";

/// Environment variable selecting `precompiled` or `jit`
pub const EXECUTION_MODE_ENV: &str = "SNAPSHOT_HARNESS_MODE";

/// Harness configuration
///
/// ```rust
/// use snapshot_harness::{ExecutionMode, HarnessConfig};
///
/// let config = HarnessConfig::from_json(
///     r#"{ "fixtures_path": "/tmp/fixtures", "execution_mode": "precompiled" }"#,
/// ).unwrap();
/// assert_eq!(config.execution_mode(), ExecutionMode::Precompiled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub fixtures_path: PathBuf,

    /// Falls back to the process-wide mode when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<ExecutionMode>,
}

impl HarnessConfig {
    pub fn new(fixtures_path: impl Into<PathBuf>) -> Self {
        Self {
            fixtures_path: fixtures_path.into(),
            execution_mode: None,
        }
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = Some(mode);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(json).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HarnessError> {
        let fixtures_path = lookup(FIXTURES_PATH_ENV)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| HarnessError::Config(format!("{FIXTURES_PATH_ENV} is not set")))?;

        let execution_mode = lookup(EXECUTION_MODE_ENV)
            .map(|mode| mode.parse::<ExecutionMode>())
            .transpose()
            .map_err(HarnessError::Config)?;

        Ok(Self {
            fixtures_path: PathBuf::from(fixtures_path),
            execution_mode,
        })
    }

    pub fn fixtures_path(&self) -> &Path {
        &self.fixtures_path
    }

    /// Configured mode, or the process-wide one
    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
            .unwrap_or_else(|| ProcessExecutionMode.execution_mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_json_without_mode() {
        let config = HarnessConfig::from_json(r#"{ "fixtures_path": "fixtures" }"#).unwrap();

        assert_eq!(config.fixtures_path(), Path::new("fixtures"));
        assert!(config.execution_mode.is_none());
    }

    #[test]
    fn test_from_json_rejects_unknown_mode() {
        let err = HarnessConfig::from_json(r#"{ "fixtures_path": "f", "execution_mode": "turbo" }"#)
            .unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_from_env_lookup() {
        let config = HarnessConfig::from_lookup(lookup_in(&[
            (FIXTURES_PATH_ENV, "/data/fixtures"),
            (EXECUTION_MODE_ENV, "precompiled"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            HarnessConfig::new("/data/fixtures").with_execution_mode(ExecutionMode::Precompiled)
        );
    }

    #[test]
    fn test_from_env_requires_fixtures_path() {
        assert!(HarnessConfig::from_lookup(lookup_in(&[])).is_err());
        assert!(HarnessConfig::from_lookup(lookup_in(&[(FIXTURES_PATH_ENV, "")])).is_err());
        assert!(HarnessConfig::from_lookup(lookup_in(&[
            (FIXTURES_PATH_ENV, "/f"),
            (EXECUTION_MODE_ENV, "bogus"),
        ]))
        .is_err());
    }

    #[test]
    fn test_from_env_without_mode_leaves_it_unset() {
        let config = HarnessConfig::from_lookup(lookup_in(&[(FIXTURES_PATH_ENV, "/f")])).unwrap();

        assert_eq!(config, HarnessConfig::new("/f"));
        assert!(config.execution_mode.is_none());
    }

    #[test]
    fn test_explicit_mode_wins() {
        let config = HarnessConfig::new("f").with_execution_mode(ExecutionMode::Precompiled);
        assert_eq!(config.execution_mode(), ExecutionMode::Precompiled);
    }
}
