// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `tracebench run` command - Run benchmarks and emit the report.

use std::process::ExitCode;

use anyhow::Context;
use tracebench_core::{Harness, JsonReporter};

use crate::Cli;

pub async fn execute(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = super::load_config(cli)?;
    let (registry, discovery) = super::discover(&config);

    for failure in &discovery.failures {
        tracing::warn!(error = %failure, "Plugin module skipped");
    }

    let mut harness = Harness::new(config.runs);

    // Ctrl-C drops the in-flight benchmark, which kills its daemon
    let report = tokio::select! {
        report = harness.run(&registry, &config.selection) => report,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, no report written");
            return Ok(ExitCode::from(130));
        }
    };

    let mut reporter = JsonReporter::new().pretty(cli.pretty);
    if let Some(path) = &cli.output {
        reporter = reporter.to_file(path);
    }
    reporter.emit(&report).context("writing report")?;

    let failures = report.failures();
    if failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(failed = ?failures, "Some benchmarks failed");
        Ok(ExitCode::FAILURE)
    }
}
