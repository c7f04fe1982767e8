// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Host metadata collection.
//!
//! Gathers platform facts once per invocation and merges them with each
//! benchmark's own metadata. Every source file must exist and parse; there
//! are no fallback values.
//!
//! ## Collected Data
//!
//! - **platform**: `uname(2)` tuple
//! - **processor**: `model name` from `/proc/cpuinfo`
//! - **nproc**: logical CPU count
//! - **cpu_online / cpu_possible**: raw CPU ranges from sysfs
//! - **memory_MiB**: `MemTotal` from `/proc/meminfo`
//! - **os-release**: key/value pairs from `/etc/os-release`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MetadataError;

/// Where host facts are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub cpu_possible: PathBuf,
    pub cpu_online: PathBuf,
    pub cpuinfo: PathBuf,
    pub meminfo: PathBuf,
    pub os_release: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self::under("/")
    }
}

impl HostPaths {
    /// The standard file layout below `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            cpu_possible: root.join("sys/devices/system/cpu/possible"),
            cpu_online: root.join("sys/devices/system/cpu/online"),
            cpuinfo: root.join("proc/cpuinfo"),
            meminfo: root.join("proc/meminfo"),
            os_release: root.join("etc/os-release"),
        }
    }
}

/// `uname(2)` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub system: String,
    pub node: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    pub processor: String,
}

impl PlatformInfo {
    /// Query the running kernel.
    pub fn current() -> Result<Self, MetadataError> {
        let uts = nix::sys::utsname::uname()?;
        let machine = uts.machine().to_string_lossy().into_owned();
        Ok(Self {
            system: uts.sysname().to_string_lossy().into_owned(),
            node: uts.nodename().to_string_lossy().into_owned(),
            release: uts.release().to_string_lossy().into_owned(),
            version: uts.version().to_string_lossy().into_owned(),
            processor: machine.clone(),
            machine,
        })
    }
}

/// Generic host metadata attached to every benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMetadata {
    pub platform: PlatformInfo,
    /// CPU model; `None` on architectures whose cpuinfo has no model name.
    pub processor: Option<String>,
    pub nproc: usize,
    pub cpu_online: String,
    pub cpu_possible: String,
    #[serde(rename = "memory_MiB")]
    pub memory_mib: f64,
    #[serde(rename = "os-release")]
    pub os_release: BTreeMap<String, String>,
}

impl HostMetadata {
    /// Read every fact from `paths`.
    pub fn collect(paths: &HostPaths) -> Result<Self, MetadataError> {
        Ok(Self {
            platform: PlatformInfo::current()?,
            processor: parse_cpu_model(&read(&paths.cpuinfo)?),
            nproc: num_cpus::get(),
            cpu_online: parse_cpu_set(&paths.cpu_online, &read(&paths.cpu_online)?)?,
            cpu_possible: parse_cpu_set(&paths.cpu_possible, &read(&paths.cpu_possible)?)?,
            memory_mib: parse_mem_total_mib(&paths.meminfo, &read(&paths.meminfo)?)?,
            os_release: parse_os_release(&paths.os_release, &read(&paths.os_release)?)?,
        })
    }

    /// Generic metadata with `specific` merged on top; specific keys win.
    pub fn merged_with(&self, specific: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in specific {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// Collects host metadata, caching the first successful result.
#[derive(Debug, Default)]
pub struct MetadataCollector {
    paths: HostPaths,
    cached: Option<HostMetadata>,
}

impl MetadataCollector {
    /// Collector reading from the given paths.
    pub fn new(paths: HostPaths) -> Self {
        Self {
            paths,
            cached: None,
        }
    }

    /// Host metadata, collected on first use. Failures are not cached.
    pub fn collect(&mut self) -> Result<&HostMetadata, MetadataError> {
        let metadata = match self.cached.take() {
            Some(metadata) => metadata,
            None => {
                let metadata = HostMetadata::collect(&self.paths)?;
                tracing::debug!(
                    processor = ?metadata.processor,
                    nproc = metadata.nproc,
                    memory_mib = metadata.memory_mib,
                    "Collected host metadata"
                );
                metadata
            }
        };
        Ok(self.cached.insert(metadata))
    }
}

fn read(path: &Path) -> Result<String, MetadataError> {
    std::fs::read_to_string(path).map_err(|e| MetadataError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

/// First `model name` value in cpuinfo.
pub fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|l| l.starts_with("model name"))
        .and_then(|l| l.split(':').nth(1))
        .map(|s| s.trim().to_string())
}

/// First line of a sysfs CPU range file, e.g. `0-7`.
pub fn parse_cpu_set(path: &Path, content: &str) -> Result<String, MetadataError> {
    match content.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() => Ok(line.to_string()),
        _ => Err(MetadataError::Malformed {
            path: path.to_path_buf(),
            reason: "empty CPU set".to_string(),
        }),
    }
}

/// `MemTotal` in MiB; the file reports kB.
pub fn parse_mem_total_mib(path: &Path, meminfo: &str) -> Result<f64, MetadataError> {
    let malformed = |reason: &str| MetadataError::Malformed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let line = meminfo
        .lines()
        .find(|l| l.starts_with("MemTotal:"))
        .ok_or_else(|| malformed("no MemTotal line"))?;

    let kb = line["MemTotal:".len()..]
        .split_whitespace()
        .next()
        .ok_or_else(|| malformed("MemTotal has no value"))?
        .parse::<u64>()
        .map_err(|_| malformed("MemTotal is not a number"))?;

    Ok(kb as f64 / 1024.0)
}

/// `KEY=value` pairs with surrounding quotes stripped from values.
/// Blank lines and comments are skipped.
pub fn parse_os_release(
    path: &Path,
    content: &str,
) -> Result<BTreeMap<String, String>, MetadataError> {
    let mut data = BTreeMap::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| MetadataError::Malformed {
            path: path.to_path_buf(),
            reason: format!("line without '=': {}", line),
        })?;
        data.insert(
            key.to_string(),
            value.trim_matches(|c| c == '"' || c == '\'').to_string(),
        );
    }
    Ok(data)
}
