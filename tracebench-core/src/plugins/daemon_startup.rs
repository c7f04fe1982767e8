// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `daemon_startup`: time from spawning a daemon to its readiness notification.

use async_trait::async_trait;

use super::{stop_daemon, DaemonSpec, PluginSettings};
use crate::error::{BenchmarkError, ReadinessError};
use crate::metrics::RunResult;
use crate::plugin::Benchmark;
use crate::process::DaemonProcess;
use crate::readiness::ArmedProbe;

/// Measures daemon startup latency in seconds.
#[derive(Debug)]
pub struct DaemonStartup {
    daemon: DaemonSpec,
    metric: String,
    settings: PluginSettings,
    probe: Option<ArmedProbe>,
    running: Option<DaemonProcess>,
}

impl DaemonStartup {
    /// Create an instance that records into `metric`.
    pub fn new(daemon: DaemonSpec, metric: String, settings: PluginSettings) -> Self {
        Self {
            daemon,
            metric,
            settings,
            probe: None,
            running: None,
        }
    }
}

#[async_trait]
impl Benchmark for DaemonStartup {
    async fn pre_run(&mut self) -> Result<(), BenchmarkError> {
        // Armed here so the notification cannot race the spawn in run()
        self.probe = Some(self.daemon.arm()?);
        Ok(())
    }

    async fn run(&mut self) -> Result<RunResult, BenchmarkError> {
        let probe = self.probe.as_mut().ok_or(ReadinessError::NotArmed)?;
        let (daemon, startup) = DaemonProcess::spawn_ready(
            &self.daemon.command,
            &self.settings.base_dir,
            probe,
            self.settings.ready_timeout,
        )
        .await?;
        self.running = Some(daemon);

        Ok(RunResult::new().with(self.metric.as_str(), startup.as_secs_f64()))
    }

    async fn post_run(&mut self) -> Result<(), BenchmarkError> {
        self.probe = None;
        stop_daemon(&mut self.running, self.settings.terminate_grace).await
    }

    async fn teardown(&mut self) -> Result<(), BenchmarkError> {
        self.probe = None;
        stop_daemon(&mut self.running, self.settings.terminate_grace).await
    }
}
