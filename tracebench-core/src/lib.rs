//! Tracebench Core Library
//!
//! Benchmark harness for tracing daemons. Discovers benchmark plugins,
//! drives each one through a fixed-count run protocol, attaches host
//! metadata, and emits a single JSON report.

pub mod config;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod metrics;
pub mod plugin;
pub mod plugins;
pub mod process;
pub mod readiness;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigLoader, HarnessConfig, Selection};
pub use error::{BenchmarkError, PluginError, TraceBenchError, TraceBenchResult, ValidationError};
pub use loader::{Discovery, PluginLoader};
pub use metadata::{HostMetadata, HostPaths, MetadataCollector};
pub use metrics::{
    AggregatedResult, BenchmarkOutcome, FailedRun, MetricDescriptor, MetricSet, Report, RunResult,
};
pub use plugin::{Benchmark, BenchmarkDef};
pub use registry::BenchmarkRegistry;
pub use reporter::JsonReporter;
pub use runner::{run_benchmark, Harness};
pub use state::{LifecycleTracker, Phase};
pub use types::{BenchmarkName, ReadySignal, RunCount};
