// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `tracebench validate` command - Validate configuration and plugin modules.

use std::process::ExitCode;

use crate::Cli;

pub async fn execute(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = match super::load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {:#}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("✓ Configuration is valid");
    println!();
    println!("Harness Settings:");
    println!("  Runs:              {}", config.runs);
    println!("  Ready Timeout:     {}ms", config.ready_timeout.as_millis());
    println!("  Terminate Grace:   {}ms", config.terminate_grace.as_millis());
    for dir in &config.search_dirs {
        println!("  Search Directory:  {}", dir.display());
    }
    println!();

    let (registry, discovery) = super::discover(&config);

    println!("Modules ({}):", discovery.modules.len());
    for module in &discovery.modules {
        println!("  ✓ {}", module.display());
    }
    for failure in &discovery.failures {
        println!("  ✗ {}", failure);
    }
    println!();
    println!("Benchmarks ({}):", registry.len());
    for def in registry.iter() {
        println!("  - {} (version {})", def.name(), def.version());
    }

    if discovery.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
