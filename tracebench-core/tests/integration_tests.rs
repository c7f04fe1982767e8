// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end integration tests for tracebench.
//!
//! These tests go from plugin modules on disk through discovery, the run
//! protocol and metadata collection to the JSON report.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Stdio};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tracebench_core::{
    Benchmark, BenchmarkDef, BenchmarkError, BenchmarkOutcome, BenchmarkRegistry, ConfigLoader,
    Harness, HarnessConfig, HostPaths, JsonReporter, MetricDescriptor, Phase, PluginLoader,
    RunCount, RunResult, Selection,
};

/// Host files under a temp root so metadata is deterministic.
fn fake_host() -> TempDir {
    let root = TempDir::new().expect("Failed to create temp dir");
    for (rel, content) in [
        ("sys/devices/system/cpu/possible", "0-7\n"),
        ("sys/devices/system/cpu/online", "0-7\n"),
        ("proc/cpuinfo", "processor\t: 0\nmodel name\t: Integration CPU\n"),
        ("proc/meminfo", "MemTotal:       16384000 kB\nMemFree: 1 kB\n"),
        ("etc/os-release", "NAME=\"Test Linux\"\nID=test\n"),
    ] {
        let path = root.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    root
}

fn harness(runs: u32, host: &TempDir) -> Harness {
    Harness::new(RunCount::new(runs).unwrap()).with_host_paths(HostPaths::under(host.path()))
}

fn discover(config: &HarnessConfig, dir: &Path) -> BenchmarkRegistry {
    let mut registry = BenchmarkRegistry::new();
    let discovery = PluginLoader::new(config).discover_in(&[dir.to_path_buf()], &mut registry);
    assert!(
        discovery.failures.is_empty(),
        "unexpected discovery failures: {:?}",
        discovery.failures
    );
    registry
}

fn has_program(program: &str) -> bool {
    Command::new("sh")
        .args(["-c", &format!("command -v {}", program)])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

struct Dummy;

#[async_trait]
impl Benchmark for Dummy {
    async fn run(&mut self) -> Result<RunResult, BenchmarkError> {
        Ok(RunResult::new().with("x", 1))
    }
}

/// Emits 1, 2, 1, 2, ... across runs of one instance.
struct Alternating {
    next: i64,
}

#[async_trait]
impl Benchmark for Alternating {
    async fn run(&mut self) -> Result<RunResult, BenchmarkError> {
        let value = self.next;
        self.next = if value == 1 { 2 } else { 1 };
        Ok(RunResult::new().with("x", value))
    }
}

#[tokio::test]
async fn test_empty_directory_yields_empty_report() {
    let plugins = TempDir::new().unwrap();
    let host = fake_host();
    let config = HarnessConfig::default();

    let registry = discover(&config, plugins.path());
    let report = harness(10, &host).run(&registry, &Selection::default()).await;

    assert_eq!(JsonReporter::new().render(&report).unwrap(), "{}");
}

#[tokio::test]
async fn test_dummy_report_shape() {
    let host = fake_host();
    let mut registry = BenchmarkRegistry::new();
    registry
        .register(
            BenchmarkDef::builder("Dummy")
                .version(3)
                .metric("x", MetricDescriptor::new("count", "n/a", "A constant"))
                .metadata("memory_MiB", "overridden")
                .build(|| Dummy)
                .unwrap(),
        )
        .unwrap();

    let report = harness(10, &host).run(&registry, &Selection::default()).await;
    let value = serde_json::to_value(&report).unwrap();
    let dummy = &value["Dummy"];

    assert_eq!(dummy["version"], 3);
    assert_eq!(
        dummy["metrics"],
        json!({"x": {"unit": "count", "interpretation": "n/a", "description": "A constant"}})
    );
    assert_eq!(dummy["data"], json!({"x": [1, 1, 1, 1, 1, 1, 1, 1, 1, 1]}));
    assert_eq!(dummy["config"], json!({"runs": 10}));

    let metadata = &dummy["metadata"];
    assert_eq!(metadata["processor"], "Integration CPU");
    assert_eq!(metadata["cpu_possible"], "0-7");
    assert_eq!(metadata["os-release"]["NAME"], "Test Linux");
    assert_eq!(metadata["memory_MiB"], "overridden");
    assert!(metadata["nproc"].as_u64().unwrap() > 0);
    assert!(metadata["platform"]["system"].is_string());
}

#[tokio::test]
async fn test_timed_command_manifest() {
    let plugins = TempDir::new().unwrap();
    std::fs::create_dir(plugins.path().join("data")).unwrap();
    std::fs::write(plugins.path().join("data/input.txt"), "payload\n").unwrap();
    std::fs::write(
        plugins.path().join("commands.yaml"),
        r#"
benchmarks:
  - name: CatInput
    version: 2
    kind: timed_command
    command:
      program: cat
      args: [data/input.txt]
    metric:
      name: cat_time
      description: Time to cat a file relative to the module
    params:
      input: data/input.txt
  - name: AlwaysFails
    kind: timed_command
    command: { program: "false" }
    metric: { name: t }
"#,
    )
    .unwrap();

    let host = fake_host();
    let config = HarnessConfig::default();
    let registry = discover(&config, plugins.path());
    assert_eq!(registry.len(), 2);

    let report = harness(3, &host).run(&registry, &Selection::default()).await;
    assert_eq!(report.failures(), vec!["AlwaysFails"]);

    let cat = report.get("CatInput").unwrap().completed().unwrap();
    assert_eq!(cat.version, 2);
    assert_eq!(cat.metrics.iter().next().unwrap().1.unit, "seconds");
    assert_eq!(cat.config.params["input"], "data/input.txt");
    let values = &cat.data["cat_time"];
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| v.as_f64().unwrap() >= 0.0));

    match report.get("AlwaysFails").unwrap() {
        BenchmarkOutcome::Failed(failed) => {
            assert_eq!(failed.phase, Phase::Run);
            assert_eq!(failed.completed_runs, 0);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_selection_filters_benchmarks() {
    let plugins = TempDir::new().unwrap();
    std::fs::write(
        plugins.path().join("pair.yml"),
        r#"
benchmarks:
  - name: First
    kind: timed_command
    command: { program: "true" }
    metric: { name: t }
  - name: Second
    kind: timed_command
    command: { program: "true" }
    metric: { name: t }
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_string("harness:\n  exclude: [First]\n").unwrap();
    let registry = discover(&config, plugins.path());
    let host = fake_host();

    let report = harness(1, &host).run(&registry, &config.selection).await;
    assert_eq!(report.len(), 1);
    assert!(report.get("Second").is_some());
}

#[tokio::test]
async fn test_daemon_startup_signal_readiness() {
    let plugins = TempDir::new().unwrap();
    std::fs::write(
        plugins.path().join("startup.yaml"),
        r#"
benchmarks:
  - name: SignalStartup
    kind: daemon_startup
    daemon:
      program: sh
      args: ["-c", "kill -USR1 $PPID; exec sleep 30"]
      ready: { via: signal, signal: SIGUSR1 }
    metric:
      name: time_to_sigusr1
"#,
    )
    .unwrap();

    let host = fake_host();
    let config = HarnessConfig::default();
    let registry = discover(&config, plugins.path());

    let report = harness(2, &host).run(&registry, &Selection::default()).await;
    let result = report
        .get("SignalStartup")
        .and_then(BenchmarkOutcome::completed)
        .expect("startup benchmark should complete");

    let values = &result.data["time_to_sigusr1"];
    assert_eq!(values.len(), 2);
    assert!(values.iter().all(|v| v.as_f64().unwrap() > 0.0));
}

#[tokio::test]
async fn test_readiness_timeout_fails_benchmark() {
    let plugins = TempDir::new().unwrap();
    std::fs::write(
        plugins.path().join("silent.yaml"),
        r#"
benchmarks:
  - name: SilentDaemon
    kind: daemon_startup
    ready_timeout_ms: 200
    daemon:
      program: sleep
      args: ["30"]
      ready: { via: signal, signal: SIGUSR2 }
    metric:
      name: startup
"#,
    )
    .unwrap();

    let host = fake_host();
    let config = HarnessConfig::default();
    let registry = discover(&config, plugins.path());

    let report = harness(3, &host).run(&registry, &Selection::default()).await;
    match report.get("SilentDaemon").unwrap() {
        BenchmarkOutcome::Failed(failed) => {
            assert_eq!(failed.phase, Phase::Run);
            assert_eq!(failed.completed_runs, 0);
            assert!(failed.error.contains("readiness"), "error: {}", failed.error);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_daemon_startup_socket_readiness() {
    if !has_program("python3") {
        eprintln!("python3 not available, skipping");
        return;
    }

    let plugins = TempDir::new().unwrap();
    std::fs::write(
        plugins.path().join("notify.py"),
        r#"import os
import socket
import time
sock = socket.socket(socket.AF_UNIX, socket.SOCK_STREAM)
sock.connect(os.environ['TRACEBENCH_READY_SOCKET'])
sock.send(b'READY')
sock.close()
time.sleep(30)
"#,
    )
    .unwrap();
    std::fs::write(
        plugins.path().join("socket.yaml"),
        r#"
benchmarks:
  - name: SocketStartup
    kind: daemon_startup
    daemon:
      program: python3
      args: [notify.py]
      ready: { via: socket }
    metric:
      name: time_to_ready
"#,
    )
    .unwrap();

    let host = fake_host();
    let config = HarnessConfig::default();
    let registry = discover(&config, plugins.path());

    let report = harness(2, &host).run(&registry, &Selection::default()).await;
    let result = report
        .get("SocketStartup")
        .and_then(BenchmarkOutcome::completed)
        .expect("socket benchmark should complete");
    assert_eq!(result.data["time_to_ready"].len(), 2);
}

#[tokio::test]
async fn test_timed_command_against_daemon() {
    let plugins = TempDir::new().unwrap();
    std::fs::write(
        plugins.path().join("with_daemon.yaml"),
        r#"
benchmarks:
  - name: CommandWithDaemon
    kind: timed_command
    daemon:
      program: sleep
      args: ["30"]
    command:
      program: "true"
    metric:
      name: command_time
"#,
    )
    .unwrap();

    let host = fake_host();
    let config = ConfigLoader::load_string("harness:\n  terminate_grace_ms: 1000\n").unwrap();
    let registry = discover(&config, plugins.path());

    let report = harness(2, &host).run(&registry, &Selection::default()).await;
    let result = report
        .get("CommandWithDaemon")
        .and_then(BenchmarkOutcome::completed)
        .expect("benchmark should complete");
    assert_eq!(result.data["command_time"].len(), 2);
}

#[tokio::test]
async fn test_report_file_round_trip() {
    let host = fake_host();
    let mut registry = BenchmarkRegistry::new();
    registry
        .register(
            BenchmarkDef::builder("Dummy")
                .metric("x", MetricDescriptor::seconds("x"))
                .build(|| Dummy)
                .unwrap(),
        )
        .unwrap();

    let report = harness(2, &host).run(&registry, &Selection::default()).await;

    let out = TempDir::new().unwrap();
    let path = out.path().join("report.json");
    JsonReporter::new().pretty(true).to_file(&path).emit(&report).unwrap();

    let loaded = JsonReporter::load(&path).unwrap();
    assert_eq!(loaded, report);
    let data = &loaded.get("Dummy").unwrap().completed().unwrap().data;
    assert_eq!(data["x"], vec![Value::from(1), Value::from(1)]);
}

#[tokio::test]
async fn test_alternating_values_in_report() {
    let host = fake_host();
    let mut registry = BenchmarkRegistry::new();
    registry
        .register(
            BenchmarkDef::builder("Alternating")
                .metric("x", MetricDescriptor::new("count", "n/a", "Alternates 1 and 2"))
                .build(|| Alternating { next: 1 })
                .unwrap(),
        )
        .unwrap();

    let report = Harness::new(RunCount::default())
        .with_host_paths(HostPaths::under(host.path()))
        .run(&registry, &Selection::default())
        .await;

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["Alternating"]["data"]["x"], json!([1, 2, 1, 2, 1, 2, 1, 2, 1, 2]));
    assert_eq!(value["Alternating"]["config"], json!({"runs": 10}));
}

#[tokio::test]
async fn test_repeated_invocations_share_shape() {
    let plugins = TempDir::new().unwrap();
    std::fs::write(
        plugins.path().join("repeat.yaml"),
        r#"
benchmarks:
  - name: TrueCommand
    version: 4
    kind: timed_command
    command: { program: "true" }
    metric:
      name: true_time
      description: Time to run true
    metadata:
      tracer: none
    params:
      mode: plain
"#,
    )
    .unwrap();

    let host = fake_host();
    let config = HarnessConfig::default();
    let registry = discover(&config, plugins.path());

    let first = harness(3, &host).run(&registry, &Selection::default()).await;
    let second = harness(3, &host).run(&registry, &Selection::default()).await;

    let first = first.get("TrueCommand").and_then(BenchmarkOutcome::completed).unwrap();
    let second = second.get("TrueCommand").and_then(BenchmarkOutcome::completed).unwrap();

    assert_eq!(first.version, second.version);
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.config, second.config);
    let keys = |metadata: &serde_json::Map<String, Value>| {
        metadata.keys().cloned().collect::<BTreeSet<_>>()
    };
    assert_eq!(keys(&first.metadata), keys(&second.metadata));
    assert_eq!(first.metadata["tracer"], "none");
    assert_eq!(first.data["true_time"].len(), second.data["true_time"].len());
}
