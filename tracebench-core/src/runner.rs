// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark runner.
//!
//! Drives each benchmark through its lifecycle, one at a time:
//!
//! ```text
//! metadata → setup → (pre_run → run → post_run) × N → teardown
//! ```
//!
//! Teardown runs exactly once for every instance that was created, whether
//! or not an earlier phase failed. A failing benchmark yields a
//! [`FailedRun`] record and the harness moves on to the next one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use crate::config::Selection;
use crate::metadata::{HostPaths, MetadataCollector};
use crate::metrics::{
    AggregatedResult, BenchmarkOutcome, FailedRun, FailureStatus, MetricSet, Report, RunResult,
    RunSettings,
};
use crate::plugin::{Benchmark, BenchmarkDef};
use crate::registry::BenchmarkRegistry;
use crate::state::{LifecycleTracker, Phase};
use crate::types::{BenchmarkName, RunCount};

/// Collects per-iteration results into per-metric sequences.
#[derive(Debug)]
pub struct Aggregator<'a> {
    benchmark: &'a BenchmarkName,
    declared: &'a MetricSet,
    data: BTreeMap<String, Vec<Value>>,
    warned: BTreeSet<String>,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator for one benchmark.
    pub fn new(benchmark: &'a BenchmarkName, declared: &'a MetricSet) -> Self {
        Self {
            benchmark,
            declared,
            data: BTreeMap::new(),
            warned: BTreeSet::new(),
        }
    }

    /// Append every value of one iteration's result.
    ///
    /// Keys missing from the declared metrics are kept, with a warning the
    /// first time each one shows up.
    pub fn record(&mut self, result: RunResult) {
        for (metric, value) in result {
            if !self.declared.contains(&metric) && self.warned.insert(metric.clone()) {
                tracing::warn!(
                    benchmark = %self.benchmark,
                    metric = %metric,
                    "Run reported an undeclared metric"
                );
            }
            self.data.entry(metric).or_default().push(value);
        }
    }

    /// The aggregated sequences.
    pub fn finish(self) -> BTreeMap<String, Vec<Value>> {
        self.data
    }
}

/// Where and why a benchmark stopped.
#[derive(Debug)]
struct Failure {
    phase: Phase,
    completed_runs: u32,
    error: String,
}

impl Failure {
    fn at(tracker: &LifecycleTracker, error: impl fmt::Display) -> Self {
        Self {
            phase: tracker.phase(),
            completed_runs: tracker.completed_runs(),
            error: error.to_string(),
        }
    }
}

fn advance(tracker: &mut LifecycleTracker, phase: Phase) -> Result<(), Failure> {
    tracker
        .transition_to(phase)
        .map_err(|e| Failure::at(tracker, e))
}

/// Run one benchmark to completion or failure.
pub async fn run_benchmark(
    def: &BenchmarkDef,
    runs: RunCount,
    collector: &mut MetadataCollector,
) -> BenchmarkOutcome {
    let mut tracker = LifecycleTracker::new(def.name().clone());

    tracing::info!(benchmark = %def.name(), runs = runs.get(), "Starting benchmark");

    match execute(def, runs, collector, &mut tracker).await {
        Ok(result) => {
            tracing::info!(
                benchmark = %def.name(),
                elapsed_ms = tracker.elapsed().as_millis() as u64,
                "Benchmark completed"
            );
            BenchmarkOutcome::Completed(result)
        }
        Err(failure) => {
            tracing::error!(
                benchmark = %def.name(),
                phase = failure.phase.name(),
                completed_runs = failure.completed_runs,
                error = %failure.error,
                "Benchmark failed"
            );
            BenchmarkOutcome::Failed(FailedRun {
                status: FailureStatus::Failed,
                version: def.version(),
                phase: failure.phase,
                error: failure.error,
                completed_runs: failure.completed_runs,
            })
        }
    }
}

async fn execute(
    def: &BenchmarkDef,
    runs: RunCount,
    collector: &mut MetadataCollector,
    tracker: &mut LifecycleTracker,
) -> Result<AggregatedResult, Failure> {
    advance(tracker, Phase::Metadata)?;
    let metadata = match collector.collect() {
        Ok(host) => host.merged_with(def.metadata()),
        Err(e) => {
            let failure = Failure::at(tracker, e);
            advance(tracker, Phase::Finished)?;
            return Err(failure);
        }
    };

    advance(tracker, Phase::Setup)?;
    let mut instance = def.instantiate();
    let mut aggregator = Aggregator::new(def.name(), def.metrics());

    let outcome = drive(instance.as_mut(), runs, tracker, &mut aggregator).await;

    // Guarded teardown: reached on success and on every failure above
    advance(tracker, Phase::Teardown)?;
    let teardown = instance.teardown().await;
    let teardown_failure = teardown.err().map(|e| Failure::at(tracker, e));
    advance(tracker, Phase::Finished)?;

    match (outcome, teardown_failure) {
        (Err(failure), Some(teardown)) => {
            tracing::warn!(
                benchmark = %def.name(),
                error = %teardown.error,
                "Teardown failed after an earlier failure"
            );
            Err(failure)
        }
        (Err(failure), None) | (Ok(()), Some(failure)) => Err(failure),
        (Ok(()), None) => Ok(AggregatedResult {
            version: def.version(),
            metrics: def.metrics().clone(),
            metadata,
            data: aggregator.finish(),
            config: RunSettings {
                runs: runs.get(),
                params: def.params().clone(),
            },
        }),
    }
}

async fn drive(
    instance: &mut dyn Benchmark,
    runs: RunCount,
    tracker: &mut LifecycleTracker,
    aggregator: &mut Aggregator<'_>,
) -> Result<(), Failure> {
    instance.setup().await.map_err(|e| Failure::at(tracker, e))?;

    for iteration in 0..runs.get() {
        advance(tracker, Phase::PreRun)?;
        instance.pre_run().await.map_err(|e| Failure::at(tracker, e))?;

        advance(tracker, Phase::Run)?;
        let result = instance.run().await.map_err(|e| Failure::at(tracker, e))?;
        tracing::debug!(iteration = iteration, result = ?result, "Run finished");
        aggregator.record(result);

        advance(tracker, Phase::PostRun)?;
        instance.post_run().await.map_err(|e| Failure::at(tracker, e))?;
    }

    Ok(())
}

/// Runs registered benchmarks and assembles the report.
#[derive(Debug)]
pub struct Harness {
    runs: RunCount,
    collector: MetadataCollector,
}

impl Harness {
    /// Create a harness that runs each benchmark `runs` times.
    pub fn new(runs: RunCount) -> Self {
        Self {
            runs,
            collector: MetadataCollector::default(),
        }
    }

    /// Read host metadata from somewhere other than the real host.
    pub fn with_host_paths(mut self, paths: HostPaths) -> Self {
        self.collector = MetadataCollector::new(paths);
        self
    }

    /// Run every selected benchmark in name order.
    pub async fn run(&mut self, registry: &BenchmarkRegistry, selection: &Selection) -> Report {
        let selected = registry.selected(selection);
        let mut report = Report::new();

        for def in &selected {
            let outcome = run_benchmark(def, self.runs, &mut self.collector).await;
            report.insert(def.name().to_string(), outcome);
        }

        let failures = report.failures().len();
        tracing::info!(
            benchmarks = report.len(),
            failures = failures,
            "Harness finished"
        );

        report
    }
}
