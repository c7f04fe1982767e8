// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Tracebench CLI
//!
//! Command-line interface for the tracebench harness. The JSON report is the
//! only thing written to stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Tracebench - benchmark harness for tracing daemons
#[derive(Parser)]
#[command(name = "tracebench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path [default: tracebench.yaml, optional]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory to search for plugin modules (repeatable)
    #[arg(short = 'd', long = "dir", global = true)]
    pub dirs: Vec<PathBuf>,

    /// Number of measured runs per benchmark
    #[arg(short = 'n', long, global = true)]
    pub runs: Option<u32>,

    /// Only run the named benchmark (repeatable)
    #[arg(long, global = true)]
    pub only: Vec<String>,

    /// Skip the named benchmark (repeatable)
    #[arg(long, global = true)]
    pub skip: Vec<String>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Indent the JSON report
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the selected benchmarks and print the report (default)
    Run,

    /// List discovered benchmarks
    List,

    /// Validate the configuration and every plugin module
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over -v
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch to command handlers
    match cli.command {
        None | Some(Commands::Run) => commands::run::execute(&cli).await,
        Some(Commands::List) => commands::list::execute(&cli).await,
        Some(Commands::Validate) => commands::validate::execute(&cli).await,
    }
}
