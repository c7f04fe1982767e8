// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Daemon and command process management.
//!
//! Spawns daemons behind an armed readiness probe, times commands, and
//! terminates daemons with SIGTERM followed by SIGKILL after a grace period.
//! Child stdout goes to our stderr so stdout only ever carries the report.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::Deserialize;
use tokio::process::{Child, Command};

use crate::error::{BenchmarkError, ProcessError};
use crate::readiness::ArmedProbe;

/// A program invocation as declared in a plugin manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    /// Program to execute, looked up in PATH.
    pub program: String,
    /// Arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Working directory; relative paths resolve against the plugin directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a spec for a program with arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Build a tokio command rooted at `base_dir`.
    fn command(&self, base_dir: &Path) -> Command {
        let cwd = match &self.cwd {
            Some(cwd) if cwd.is_absolute() => cwd.clone(),
            Some(cwd) => base_dir.join(cwd),
            None => base_dir.to_path_buf(),
        };

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(&self.env)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(std::io::stderr())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command
    }

    /// Run the command to completion and return how long it took.
    /// A non-zero exit status is an error.
    pub async fn run_timed(&self, base_dir: &Path) -> Result<Duration, BenchmarkError> {
        let mut command = self.command(base_dir);

        let started = Instant::now();
        let status = command
            .status()
            .await
            .map_err(|e| ProcessError::SpawnFailed {
                program: self.program.clone(),
                source: e,
            })?;
        let elapsed = started.elapsed();

        if !status.success() {
            return Err(BenchmarkError::CommandFailed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }

        tracing::debug!(
            program = %self.program,
            elapsed_ms = elapsed.as_millis() as u64,
            "Command completed"
        );

        Ok(elapsed)
    }
}

/// A spawned daemon.
///
/// Killed on drop if it was not terminated explicitly.
#[derive(Debug)]
pub struct DaemonProcess {
    /// Program name, for errors and logs.
    program: String,
    /// Child process handle.
    child: Child,
    /// Process ID.
    pid: u32,
    /// When the spawn was requested.
    spawned_at: Instant,
}

impl DaemonProcess {
    /// Spawn a daemon whose readiness will be reported through `probe`.
    ///
    /// The probe must already be armed; its environment (if any) is passed to
    /// the child.
    pub fn spawn(
        spec: &CommandSpec,
        base_dir: &Path,
        probe: &ArmedProbe,
    ) -> Result<Self, ProcessError> {
        let mut command = spec.command(base_dir);
        if let Some((key, path)) = probe.child_env() {
            command.env(key, path);
        }

        // Startup latency includes the cost of fork/exec
        let spawned_at = Instant::now();
        let child = command.spawn().map_err(|e| ProcessError::SpawnFailed {
            program: spec.program.clone(),
            source: e,
        })?;

        let pid = child.id().ok_or_else(|| ProcessError::NoPid {
            program: spec.program.clone(),
        })?;

        tracing::debug!(
            program = %spec.program,
            pid = pid,
            probe = %probe.describe(),
            "Spawned daemon"
        );

        Ok(Self {
            program: spec.program.clone(),
            child,
            pid,
            spawned_at,
        })
    }

    /// Spawn a daemon and wait until it reports readiness.
    ///
    /// Returns the daemon and the time from spawn to readiness. On timeout
    /// the daemon is killed before the error is returned.
    pub async fn spawn_ready(
        spec: &CommandSpec,
        base_dir: &Path,
        probe: &mut ArmedProbe,
        timeout: Duration,
    ) -> Result<(Self, Duration), BenchmarkError> {
        let mut daemon = Self::spawn(spec, base_dir, probe)?;

        match probe.wait(timeout).await {
            Ok(ready_at) => {
                let startup = ready_at.saturating_duration_since(daemon.spawned_at);
                tracing::debug!(
                    program = %daemon.program,
                    pid = daemon.pid,
                    elapsed_ms = startup.as_millis() as u64,
                    "Daemon reported ready"
                );
                Ok((daemon, startup))
            }
            Err(e) => {
                tracing::warn!(
                    program = %daemon.program,
                    pid = daemon.pid,
                    error = %e,
                    "Daemon did not become ready, killing it"
                );
                // The readiness error is what matters to the caller
                let _ = daemon.child.kill().await;
                Err(e.into())
            }
        }
    }

    /// Get the process ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send SIGTERM, wait up to `grace`, then SIGKILL. Always reaps the child.
    pub async fn terminate(mut self, grace: Duration) -> Result<ExitStatus, ProcessError> {
        // Already exited on its own
        if let Some(status) = self
            .child
            .try_wait()
            .map_err(|e| self.wait_failed(e))?
        {
            return Ok(status);
        }

        let pid = Pid::from_raw(self.pid as i32);
        kill(pid, Signal::SIGTERM).map_err(|e| ProcessError::SignalFailed {
            program: self.program.clone(),
            pid: self.pid,
            source: e,
        })?;

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => status.map_err(|e| self.wait_failed(e)),
            Err(_) => {
                tracing::warn!(
                    program = %self.program,
                    pid = self.pid,
                    grace_ms = grace.as_millis() as u64,
                    "Daemon ignored SIGTERM, killing it"
                );
                self.child.kill().await.map_err(|e| self.wait_failed(e))?;
                self.child.wait().await.map_err(|e| self.wait_failed(e))
            }
        }
    }

    fn wait_failed(&self, source: std::io::Error) -> ProcessError {
        ProcessError::WaitFailed {
            program: self.program.clone(),
            source,
        }
    }
}
