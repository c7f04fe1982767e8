// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Plugin discovery.
//!
//! Scans search directories (non-recursively) for `*.yaml` / `*.yml` plugin
//! modules and calls each module's registration entry point. A module that
//! fails to load is logged and skipped; it never hides its siblings.

use std::path::{Path, PathBuf};

use crate::config::HarnessConfig;
use crate::error::PluginError;
use crate::plugins::{PluginManifest, PluginSettings};
use crate::registry::BenchmarkRegistry;

/// What a discovery pass found.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Modules that loaded successfully.
    pub modules: Vec<PathBuf>,
    /// Benchmarks newly registered.
    pub registered: usize,
    /// Modules (or directories) that failed, with the reason.
    pub failures: Vec<PluginError>,
}

/// Loads plugin modules into a registry.
pub struct PluginLoader<'a> {
    config: &'a HarnessConfig,
}

impl<'a> PluginLoader<'a> {
    /// Create a loader that hands `config`'s timeouts to every plugin.
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    /// Discover modules in every configured search directory.
    pub fn discover(&self, registry: &mut BenchmarkRegistry) -> Discovery {
        self.discover_in(&self.config.search_dirs, registry)
    }

    /// Discover modules in the given directories.
    pub fn discover_in(&self, dirs: &[PathBuf], registry: &mut BenchmarkRegistry) -> Discovery {
        let mut discovery = Discovery::default();

        for dir in dirs {
            if !dir.is_dir() {
                tracing::warn!(dir = %dir.display(), "Search directory does not exist, skipping");
                continue;
            }

            let modules = match module_paths(dir) {
                Ok(modules) => modules,
                Err(e) => {
                    tracing::error!(dir = %dir.display(), error = %e, "Failed to scan directory");
                    discovery.failures.push(e);
                    continue;
                }
            };

            for path in modules {
                match self.load_module(&path, registry) {
                    Ok(count) => {
                        tracing::info!(module = %path.display(), benchmarks = count, "Loaded plugin module");
                        discovery.registered += count;
                        discovery.modules.push(path);
                    }
                    Err(e) => {
                        tracing::error!(module = %path.display(), error = %e, "Failed to load plugin module");
                        discovery.failures.push(e);
                    }
                }
            }
        }

        tracing::info!(
            modules = discovery.modules.len(),
            benchmarks = registry.len(),
            failures = discovery.failures.len(),
            "Discovery complete"
        );

        discovery
    }

    /// Load a single module file and register its benchmarks.
    pub fn load_module(
        &self,
        path: &Path,
        registry: &mut BenchmarkRegistry,
    ) -> Result<usize, PluginError> {
        let content = std::fs::read_to_string(path).map_err(|e| PluginError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let manifest = PluginManifest::parse(&content).map_err(|e| PluginError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base_dir = base_dir.canonicalize().unwrap_or(base_dir);
        let settings = PluginSettings::from_config(self.config, base_dir);

        manifest
            .register(&settings, registry)
            .map_err(|(name, source)| PluginError::InvalidBenchmark {
                name,
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Plugin module files directly inside `dir`, sorted by file name.
fn module_paths(dir: &Path) -> Result<Vec<PathBuf>, PluginError> {
    let entries = std::fs::read_dir(dir).map_err(|e| PluginError::Scan {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PluginError::Scan {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_module = path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false);
        if is_module && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GOOD: &str = r#"
benchmarks:
  - name: Echo
    kind: timed_command
    command: { program: "true" }
    metric: { name: t }
"#;

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = HarnessConfig::default();
        let mut registry = BenchmarkRegistry::new();

        let discovery = PluginLoader::new(&config)
            .discover_in(&[temp_dir.path().to_path_buf()], &mut registry);

        assert!(registry.is_empty());
        assert!(discovery.modules.is_empty());
        assert!(discovery.failures.is_empty());
    }

    #[test]
    fn test_broken_module_does_not_hide_siblings() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a_broken.yaml"), "benchmarks: [: nope").unwrap();
        std::fs::write(temp_dir.path().join("b_good.yml"), GOOD).unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "not a module").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested.yaml")).unwrap();

        let config = HarnessConfig::default();
        let mut registry = BenchmarkRegistry::new();
        let discovery = PluginLoader::new(&config)
            .discover_in(&[temp_dir.path().to_path_buf()], &mut registry);

        assert_eq!(registry.len(), 1);
        assert_eq!(discovery.registered, 1);
        assert_eq!(discovery.modules.len(), 1);
        assert_eq!(discovery.failures.len(), 1);
        assert!(matches!(discovery.failures[0], PluginError::Parse { .. }));
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let config = HarnessConfig::default();
        let mut registry = BenchmarkRegistry::new();
        let discovery = PluginLoader::new(&config)
            .discover_in(&[PathBuf::from("/nonexistent/benchmarks")], &mut registry);
        assert!(registry.is_empty());
        assert!(discovery.failures.is_empty());
    }

    #[test]
    fn test_duplicates_across_directories() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(first.path().join("echo.yaml"), GOOD).unwrap();
        std::fs::write(second.path().join("echo.yaml"), GOOD).unwrap();

        let config = HarnessConfig::default();
        let mut registry = BenchmarkRegistry::new();
        let discovery = PluginLoader::new(&config).discover_in(
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            &mut registry,
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(discovery.registered, 1);
        assert_eq!(discovery.modules.len(), 2);
    }
}
