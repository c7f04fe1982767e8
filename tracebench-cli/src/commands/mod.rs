// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod list;
pub mod run;
pub mod validate;

use anyhow::Context;
use tracebench_core::{
    BenchmarkName, BenchmarkRegistry, ConfigLoader, Discovery, HarnessConfig, PluginLoader,
    RunCount,
};

use crate::Cli;

/// Config file used when `--config` is not given. May be absent.
const DEFAULT_CONFIG: &str = "tracebench.yaml";

/// Load the config file and apply command-line overrides.
///
/// `--dir` and `--only` replace the configured lists; `--skip` adds to the
/// configured exclusions.
pub fn load_config(cli: &Cli) -> anyhow::Result<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_or_default(DEFAULT_CONFIG)
            .with_context(|| format!("loading {}", DEFAULT_CONFIG))?,
    };

    if !cli.dirs.is_empty() {
        config.search_dirs = cli.dirs.clone();
    }

    if let Some(runs) = cli.runs {
        config.runs = RunCount::new(runs).context("invalid --runs")?;
    }

    if !cli.only.is_empty() {
        config.selection.include = cli
            .only
            .iter()
            .map(BenchmarkName::new)
            .collect::<Result<_, _>>()
            .context("invalid --only")?;
    }

    for name in &cli.skip {
        config
            .selection
            .exclude
            .insert(BenchmarkName::new(name.as_str()).context("invalid --skip")?);
    }

    tracing::debug!(
        search_dirs = ?config.search_dirs,
        runs = config.runs.get(),
        ready_timeout_ms = config.ready_timeout.as_millis() as u64,
        "Resolved configuration"
    );

    Ok(config)
}

/// Discover every plugin module into a fresh registry.
pub fn discover(config: &HarnessConfig) -> (BenchmarkRegistry, Discovery) {
    let mut registry = BenchmarkRegistry::new();
    let discovery = PluginLoader::new(config).discover(&mut registry);
    (registry, discovery)
}
