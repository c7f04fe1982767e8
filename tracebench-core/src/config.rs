// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Every field has a default, so an absent config file is equivalent to an
//! empty one. Any present-but-invalid field is a ValidationError.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{TraceBenchError, TraceBenchResult, ValidationError};
use crate::types::{BenchmarkName, RunCount, DEFAULT_RUNS};

/// Raw harness configuration as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHarnessConfig {
    #[serde(default = "default_search_dirs")]
    search_dirs: Vec<String>,
    #[serde(default = "default_runs")]
    runs: u32,
    #[serde(default = "default_ready_timeout_ms")]
    ready_timeout_ms: u64,
    #[serde(default = "default_terminate_grace_ms")]
    terminate_grace_ms: u64,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

fn default_search_dirs() -> Vec<String> {
    vec!["benchmarks".to_string()]
}

fn default_runs() -> u32 {
    DEFAULT_RUNS
}

fn default_ready_timeout_ms() -> u64 {
    30_000
}

fn default_terminate_grace_ms() -> u64 {
    5_000
}

impl Default for RawHarnessConfig {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs(),
            runs: default_runs(),
            ready_timeout_ms: default_ready_timeout_ms(),
            terminate_grace_ms: default_terminate_grace_ms(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    harness: RawHarnessConfig,
}

/// Which benchmarks to run. Exact names only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// When non-empty, only these benchmarks run.
    pub include: BTreeSet<BenchmarkName>,
    /// These benchmarks never run.
    pub exclude: BTreeSet<BenchmarkName>,
}

impl Selection {
    /// Whether the named benchmark is selected.
    pub fn selects(&self, name: &BenchmarkName) -> bool {
        (self.include.is_empty() || self.include.contains(name)) && !self.exclude.contains(name)
    }
}

/// Validated harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directories scanned for plugin modules.
    pub search_dirs: Vec<PathBuf>,
    /// Measured iterations per benchmark.
    pub runs: RunCount,
    /// How long a daemon may take to report readiness.
    pub ready_timeout: Duration,
    /// How long a terminated daemon may take to exit before it is killed.
    pub terminate_grace: Duration,
    /// Benchmark filter.
    pub selection: Selection,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs().into_iter().map(PathBuf::from).collect(),
            runs: RunCount::default(),
            ready_timeout: Duration::from_millis(default_ready_timeout_ms()),
            terminate_grace: Duration::from_millis(default_terminate_grace_ms()),
            selection: Selection::default(),
        }
    }
}

/// Bounds for millisecond timeouts.
const MAX_TIMEOUT_MS: u64 = 600_000;

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> TraceBenchResult<HarnessConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(TraceBenchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TraceBenchError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load a config file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> TraceBenchResult<HarnessConfig> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(HarnessConfig::default())
        }
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> TraceBenchResult<HarnessConfig> {
        // An empty document parses as null, which means "all defaults"
        if content.trim().is_empty() {
            return Ok(HarnessConfig::default());
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| TraceBenchError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> TraceBenchResult<HarnessConfig> {
        let harness = raw.harness;

        if harness.search_dirs.is_empty() {
            return Err(ValidationError::SchemaValidation {
                message: "At least one search directory must be configured".to_string(),
            }
            .into());
        }

        if let Some(empty) = harness.search_dirs.iter().find(|d| d.trim().is_empty()) {
            return Err(ValidationError::InvalidFieldValue {
                field: "search_dirs",
                value: format!("{:?}", empty),
                reason: "Search directory cannot be empty".to_string(),
            }
            .into());
        }

        let runs = RunCount::new(harness.runs)?;

        let ready_timeout = Self::validate_timeout("ready_timeout_ms", harness.ready_timeout_ms)?;
        let terminate_grace =
            Self::validate_timeout("terminate_grace_ms", harness.terminate_grace_ms)?;

        let selection = Selection {
            include: Self::validate_names(harness.include)?,
            exclude: Self::validate_names(harness.exclude)?,
        };

        Ok(HarnessConfig {
            search_dirs: harness.search_dirs.into_iter().map(PathBuf::from).collect(),
            runs,
            ready_timeout,
            terminate_grace,
            selection,
        })
    }

    /// Validate a millisecond timeout (1..=600000).
    pub fn validate_timeout(field: &'static str, ms: u64) -> Result<Duration, ValidationError> {
        if ms == 0 || ms > MAX_TIMEOUT_MS {
            return Err(ValidationError::InvalidFieldValue {
                field,
                value: ms.to_string(),
                reason: format!("Must be between 1 and {}ms", MAX_TIMEOUT_MS),
            });
        }
        Ok(Duration::from_millis(ms))
    }

    fn validate_names(names: Vec<String>) -> Result<BTreeSet<BenchmarkName>, ValidationError> {
        names.into_iter().map(BenchmarkName::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.search_dirs, vec![PathBuf::from("benchmarks")]);
        assert_eq!(config.runs.get(), 10);
        assert_eq!(config.ready_timeout, Duration::from_secs(30));
        assert_eq!(config.terminate_grace, Duration::from_secs(5));
        assert!(config.selection.include.is_empty());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = ConfigLoader::load_string("").unwrap();
        assert_eq!(config.runs.get(), 10);
    }

    #[test]
    fn test_valid_config() {
        let yaml = r#"
harness:
  search_dirs: [benchmarks, extra]
  runs: 3
  ready_timeout_ms: 500
  include: [FirstCommand]
  exclude: [SessionSetupTime]
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(config.search_dirs.len(), 2);
        assert_eq!(config.runs.get(), 3);
        assert_eq!(config.ready_timeout, Duration::from_millis(500));

        let first = BenchmarkName::new("FirstCommand").unwrap();
        let session = BenchmarkName::new("SessionSetupTime").unwrap();
        let other = BenchmarkName::new("Other").unwrap();
        assert!(config.selection.selects(&first));
        assert!(!config.selection.selects(&session));
        assert!(!config.selection.selects(&other));
    }

    #[test]
    fn test_invalid_runs() {
        let yaml = "harness:\n  runs: 0\n";
        let result = ConfigLoader::load_string(yaml);
        assert!(matches!(result, Err(TraceBenchError::Validation(_))));
    }

    #[test]
    fn test_invalid_timeout() {
        let yaml = "harness:\n  ready_timeout_ms: 0\n";
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "harness:\n  runz: 5\n";
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(TraceBenchError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ConfigLoader::load_file("/nonexistent/tracebench.yaml"),
            Err(TraceBenchError::ConfigNotFound { .. })
        ));
        assert!(ConfigLoader::load_or_default("/nonexistent/tracebench.yaml").is_ok());
    }
}
