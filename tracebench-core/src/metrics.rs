// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Report data model.
//!
//! These types are what a benchmark declares (`MetricDescriptor`), what one
//! iteration produces (`RunResult`) and what the harness emits
//! (`AggregatedResult`, `FailedRun`, `Report`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::state::Phase;

/// Describes one metric a benchmark reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    /// Unit of the reported values (e.g. "seconds").
    pub unit: String,
    /// How to read the values (e.g. "lower is better").
    pub interpretation: String,
    /// Free-form description.
    pub description: String,
}

impl MetricDescriptor {
    /// Create a new metric descriptor.
    pub fn new(
        unit: impl Into<String>,
        interpretation: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            interpretation: interpretation.into(),
            description: description.into(),
        }
    }

    /// A duration in seconds where lower is better.
    pub fn seconds(description: impl Into<String>) -> Self {
        Self::new("seconds", "lower is better", description)
    }
}

/// Declared metrics of a benchmark, keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<String, MetricDescriptor>);

impl MetricSet {
    /// Create an empty metric set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric. Later declarations of the same name replace earlier ones;
    /// `validate` is where duplicates from external sources are rejected.
    pub fn with(mut self, name: impl Into<String>, descriptor: MetricDescriptor) -> Self {
        self.0.insert(name.into(), descriptor);
        self
    }

    /// Check whether a metric is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of declared metrics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no metric is declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over declared metrics in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricDescriptor)> {
        self.0.iter()
    }

    /// Schema check performed once at registration time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            return Err(ValidationError::SchemaValidation {
                message: "At least one metric must be declared".to_string(),
            });
        }

        for (name, descriptor) in &self.0 {
            if name.trim().is_empty() {
                return Err(ValidationError::InvalidFieldValue {
                    field: "metrics",
                    value: format!("{:?}", name),
                    reason: "Metric names cannot be empty".to_string(),
                });
            }
            if descriptor.unit.trim().is_empty() {
                return Err(ValidationError::InvalidFieldValue {
                    field: "unit",
                    value: name.clone(),
                    reason: "Metric unit cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Metric values produced by one `run()` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunResult(BTreeMap<String, Value>);

impl RunResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value for a metric.
    pub fn with(mut self, metric: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(metric, value);
        self
    }

    /// Record a value for a metric in place.
    pub fn insert(&mut self, metric: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(metric.into(), value.into());
    }

    /// Get a recorded value.
    pub fn get(&self, metric: &str) -> Option<&Value> {
        self.0.get(metric)
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for RunResult {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Run parameters recorded alongside the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Number of measured iterations.
    pub runs: u32,
    /// Per-benchmark parameters declared by the plugin.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

/// Summary of one completed benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Benchmark version as declared by the plugin.
    pub version: u32,
    /// Declared metrics.
    pub metrics: MetricSet,
    /// Host metadata merged with benchmark metadata.
    pub metadata: Map<String, Value>,
    /// Metric name to values in iteration order.
    pub data: BTreeMap<String, Vec<Value>>,
    /// Run parameters.
    pub config: RunSettings,
}

/// Marker for failure records in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStatus {
    Failed,
}

/// A benchmark that did not complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRun {
    /// Always `failed`.
    pub status: FailureStatus,
    /// Benchmark version as declared by the plugin.
    pub version: u32,
    /// Phase in which the failure happened.
    pub phase: Phase,
    /// Rendered error.
    pub error: String,
    /// Iterations that completed before the failure.
    pub completed_runs: u32,
}

/// What the harness records for one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BenchmarkOutcome {
    Completed(AggregatedResult),
    Failed(FailedRun),
}

impl BenchmarkOutcome {
    /// Whether the benchmark failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The aggregated result, if the benchmark completed.
    pub fn completed(&self) -> Option<&AggregatedResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed(_) => None,
        }
    }
}

/// The harness output: benchmark name to outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(BTreeMap<String, BenchmarkOutcome>);

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an outcome for a benchmark.
    pub fn insert(&mut self, name: impl Into<String>, outcome: BenchmarkOutcome) {
        self.0.insert(name.into(), outcome);
    }

    /// Look up a benchmark outcome.
    pub fn get(&self, name: &str) -> Option<&BenchmarkOutcome> {
        self.0.get(name)
    }

    /// Number of benchmarks in the report.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of benchmarks that failed.
    pub fn failures(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Iterate over entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BenchmarkOutcome)> {
        self.0.iter()
    }
}
