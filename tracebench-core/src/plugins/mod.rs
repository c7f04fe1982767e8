// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Plugin modules declared in YAML manifests.
//!
//! A manifest lists benchmarks; each entry picks one of the built-in kinds:
//!
//! ```yaml
//! benchmarks:
//!   - name: FirstCommand
//!     version: 1
//!     kind: daemon_startup
//!     daemon:
//!       program: lttng-sessiond
//!       args: ["--sig-parent"]
//!       ready: { via: signal, signal: SIGUSR1 }
//!     metric:
//!       name: time_to_sigusr1
//!       description: Time from spawning lttng-sessiond to SIGUSR1
//! ```
//!
//! [`PluginManifest::register`] is the module's registration entry point.

mod daemon_startup;
mod timed_command;

pub use daemon_startup::DaemonStartup;
pub use timed_command::TimedCommand;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{ConfigLoader, HarnessConfig};
use crate::error::{BenchmarkError, ReadinessError, TraceBenchError, ValidationError};
use crate::metrics::MetricDescriptor;
use crate::plugin::BenchmarkDef;
use crate::process::{CommandSpec, DaemonProcess};
use crate::readiness::{ArmedProbe, ReadinessProbe};
use crate::registry::BenchmarkRegistry;

/// Settings every plugin instance needs from the harness.
#[derive(Debug, Clone)]
pub struct PluginSettings {
    /// Directory relative command paths resolve against.
    pub base_dir: PathBuf,
    /// Readiness timeout.
    pub ready_timeout: Duration,
    /// SIGTERM grace period for daemons.
    pub terminate_grace: Duration,
}

impl PluginSettings {
    /// Settings for plugins found in `base_dir`.
    pub fn from_config(config: &HarnessConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ready_timeout: config.ready_timeout,
            terminate_grace: config.terminate_grace,
        }
    }
}

/// A long-lived process plus how it reports readiness.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDaemonSpec")]
pub struct DaemonSpec {
    pub command: CommandSpec,
    /// Absent means "ready once spawned".
    pub ready: Option<ReadinessProbe>,
}

/// Daemon keys as written in a manifest: the command fields plus `ready`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDaemonSpec {
    program: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    cwd: Option<PathBuf>,
    #[serde(default)]
    ready: Option<ReadinessProbe>,
}

impl From<RawDaemonSpec> for DaemonSpec {
    fn from(raw: RawDaemonSpec) -> Self {
        Self {
            command: CommandSpec {
                program: raw.program,
                args: raw.args,
                env: raw.env,
                cwd: raw.cwd,
            },
            ready: raw.ready,
        }
    }
}

impl DaemonSpec {
    /// Arm the readiness probe. Call before spawning.
    pub fn arm(&self) -> Result<ArmedProbe, ReadinessError> {
        match &self.ready {
            Some(probe) => probe.arm(),
            None => Ok(ArmedProbe::Immediate),
        }
    }

    /// Spawn the daemon and wait for readiness.
    pub async fn start(
        &self,
        settings: &PluginSettings,
    ) -> Result<(DaemonProcess, Duration), BenchmarkError> {
        let mut probe = self.arm()?;
        DaemonProcess::spawn_ready(
            &self.command,
            &settings.base_dir,
            &mut probe,
            settings.ready_timeout,
        )
        .await
    }
}

/// Terminate and reap a daemon slot if it holds one.
pub(crate) async fn stop_daemon(
    slot: &mut Option<DaemonProcess>,
    grace: Duration,
) -> Result<(), BenchmarkError> {
    if let Some(daemon) = slot.take() {
        let pid = daemon.pid();
        let status = daemon.terminate(grace).await?;
        tracing::debug!(pid = pid, status = %status, "Daemon stopped");
    }
    Ok(())
}

/// Built-in benchmark kinds.
#[derive(Debug, Clone)]
pub enum PluginKind {
    /// Time from spawning a daemon to its readiness notification.
    DaemonStartup { daemon: DaemonSpec },
    /// Time to run a command, optionally against a running daemon.
    TimedCommand {
        daemon: Option<DaemonSpec>,
        command: CommandSpec,
    },
}

fn default_version() -> u32 {
    1
}

fn default_unit() -> String {
    "seconds".to_string()
}

fn default_interpretation() -> String {
    "lower is better".to_string()
}

/// The single metric a built-in kind reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestMetric {
    pub name: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_interpretation")]
    pub interpretation: String,
    #[serde(default)]
    pub description: String,
}

/// One benchmark declared in a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawManifestEntry")]
pub struct ManifestEntry {
    pub name: String,
    pub version: u32,
    pub metric: ManifestMetric,
    pub metadata: Map<String, Value>,
    pub params: Map<String, Value>,
    /// Overrides the harness readiness timeout for this benchmark.
    pub ready_timeout_ms: Option<u64>,
    pub kind: PluginKind,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KindTag {
    DaemonStartup,
    TimedCommand,
}

/// Every key a manifest entry may carry, across all kinds.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifestEntry {
    name: String,
    #[serde(default = "default_version")]
    version: u32,
    kind: KindTag,
    metric: ManifestMetric,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(default)]
    params: Map<String, Value>,
    #[serde(default)]
    ready_timeout_ms: Option<u64>,
    #[serde(default)]
    daemon: Option<DaemonSpec>,
    #[serde(default)]
    command: Option<CommandSpec>,
}

impl TryFrom<RawManifestEntry> for ManifestEntry {
    type Error = ValidationError;

    fn try_from(raw: RawManifestEntry) -> Result<Self, Self::Error> {
        let context = || format!("benchmark '{}'", raw.name);
        let kind = match raw.kind {
            KindTag::DaemonStartup => {
                if raw.command.is_some() {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "command",
                        value: raw.name.clone(),
                        reason: "daemon_startup benchmarks do not take a command".to_string(),
                    });
                }
                PluginKind::DaemonStartup {
                    daemon: raw.daemon.ok_or_else(|| ValidationError::MissingRequiredField {
                        field: "daemon",
                        context: context(),
                    })?,
                }
            }
            KindTag::TimedCommand => PluginKind::TimedCommand {
                command: raw.command.ok_or_else(|| ValidationError::MissingRequiredField {
                    field: "command",
                    context: context(),
                })?,
                daemon: raw.daemon,
            },
        };

        Ok(Self {
            name: raw.name,
            version: raw.version,
            metric: raw.metric,
            metadata: raw.metadata,
            params: raw.params,
            ready_timeout_ms: raw.ready_timeout_ms,
            kind,
        })
    }
}

impl ManifestEntry {
    /// Validate the entry and turn it into a registrable definition.
    pub fn into_def(self, settings: &PluginSettings) -> Result<BenchmarkDef, ValidationError> {
        let mut settings = settings.clone();
        if let Some(ms) = self.ready_timeout_ms {
            settings.ready_timeout = ConfigLoader::validate_timeout("ready_timeout_ms", ms)?;
        }

        let metric = self.metric.name.clone();
        let builder = BenchmarkDef::builder(self.name.clone())
            .version(self.version)
            .metric(
                self.metric.name,
                MetricDescriptor::new(
                    self.metric.unit,
                    self.metric.interpretation,
                    self.metric.description,
                ),
            )
            .metadata_map(self.metadata)
            .params(self.params);

        match self.kind {
            PluginKind::DaemonStartup { daemon } => {
                if daemon.ready.is_none() {
                    return Err(ValidationError::MissingRequiredField {
                        field: "daemon.ready",
                        context: format!("daemon_startup benchmark '{}'", self.name),
                    });
                }
                Self::check_program(&daemon.command, &self.name)?;
                builder.build(move || {
                    DaemonStartup::new(daemon.clone(), metric.clone(), settings.clone())
                })
            }
            PluginKind::TimedCommand { daemon, command } => {
                Self::check_program(&command, &self.name)?;
                if let Some(daemon) = &daemon {
                    Self::check_program(&daemon.command, &self.name)?;
                }
                builder.build(move || {
                    TimedCommand::new(
                        daemon.clone(),
                        command.clone(),
                        metric.clone(),
                        settings.clone(),
                    )
                })
            }
        }
    }

    fn check_program(command: &CommandSpec, name: &str) -> Result<(), ValidationError> {
        if command.program.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "program",
                value: String::new(),
                reason: format!("Program of benchmark '{}' cannot be empty", name),
            });
        }
        Ok(())
    }
}

/// A parsed plugin module.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    #[serde(default)]
    pub benchmarks: Vec<ManifestEntry>,
}

impl PluginManifest {
    /// Parse a manifest from YAML.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty module declares nothing
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Registration entry point.
    ///
    /// Every entry is validated before anything is registered, so a module
    /// is either loaded whole or not at all. Names that are already
    /// registered are skipped with a warning. Returns the number registered.
    pub fn register(
        self,
        settings: &PluginSettings,
        registry: &mut BenchmarkRegistry,
    ) -> Result<usize, (String, ValidationError)> {
        let defs = self
            .benchmarks
            .into_iter()
            .map(|entry| {
                let name = entry.name.clone();
                entry.into_def(settings).map_err(|e| (name, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut registered = 0;
        for def in defs {
            match registry.register(def) {
                Ok(()) => registered += 1,
                Err(TraceBenchError::DuplicateBenchmark { name }) => {
                    tracing::warn!(benchmark = %name, "Duplicate benchmark ignored");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Benchmark not registered");
                }
            }
        }
        Ok(registered)
    }
}
