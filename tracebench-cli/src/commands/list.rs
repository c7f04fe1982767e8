// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `tracebench list` command - List discovered benchmarks.

use std::process::ExitCode;

use crate::Cli;

pub async fn execute(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = super::load_config(cli)?;
    let (registry, _) = super::discover(&config);

    if registry.is_empty() {
        println!("No benchmarks found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<24} {:<8} {:<10} METRICS", "NAME", "VERSION", "SELECTED");
    for def in registry.iter() {
        let metrics: Vec<_> = def
            .metrics()
            .iter()
            .map(|(name, descriptor)| format!("{} ({})", name, descriptor.unit))
            .collect();
        let selected = if config.selection.selects(def.name()) {
            "yes"
        } else {
            "no"
        };
        println!(
            "{:<24} {:<8} {:<10} {}",
            def.name().as_str(),
            def.version(),
            selected,
            metrics.join(", ")
        );
    }
    println!();
    println!("Total: {} benchmark(s)", registry.len());

    Ok(ExitCode::SUCCESS)
}
