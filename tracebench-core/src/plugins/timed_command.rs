// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `timed_command`: wall-clock time of one command, optionally run against a
//! daemon that is started (untimed) before every iteration.

use async_trait::async_trait;

use super::{stop_daemon, DaemonSpec, PluginSettings};
use crate::error::BenchmarkError;
use crate::metrics::RunResult;
use crate::plugin::Benchmark;
use crate::process::{CommandSpec, DaemonProcess};

/// Measures command duration in seconds.
#[derive(Debug)]
pub struct TimedCommand {
    daemon: Option<DaemonSpec>,
    command: CommandSpec,
    metric: String,
    settings: PluginSettings,
    running: Option<DaemonProcess>,
}

impl TimedCommand {
    /// Create an instance that records into `metric`.
    pub fn new(
        daemon: Option<DaemonSpec>,
        command: CommandSpec,
        metric: String,
        settings: PluginSettings,
    ) -> Self {
        Self {
            daemon,
            command,
            metric,
            settings,
            running: None,
        }
    }
}

#[async_trait]
impl Benchmark for TimedCommand {
    async fn pre_run(&mut self) -> Result<(), BenchmarkError> {
        if let Some(spec) = &self.daemon {
            let (daemon, startup) = spec.start(&self.settings).await?;
            tracing::debug!(
                pid = daemon.pid(),
                startup_ms = startup.as_millis() as u64,
                "Daemon ready for timed command"
            );
            self.running = Some(daemon);
        }
        Ok(())
    }

    async fn run(&mut self) -> Result<RunResult, BenchmarkError> {
        let elapsed = self.command.run_timed(&self.settings.base_dir).await?;
        Ok(RunResult::new().with(self.metric.as_str(), elapsed.as_secs_f64()))
    }

    async fn post_run(&mut self) -> Result<(), BenchmarkError> {
        stop_daemon(&mut self.running, self.settings.terminate_grace).await
    }

    async fn teardown(&mut self) -> Result<(), BenchmarkError> {
        stop_daemon(&mut self.running, self.settings.terminate_grace).await
    }
}
