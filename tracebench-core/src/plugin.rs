// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The benchmark plugin contract.
//!
//! A plugin is described by a [`BenchmarkDef`]: static facts (name, version,
//! declared metrics, metadata, parameters) plus a factory that builds a fresh
//! [`Benchmark`] instance for every harness run. The instance implements the
//! lifecycle the runner drives:
//!
//! ```text
//! setup → (pre_run → run → post_run) × N → teardown
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BenchmarkError, ValidationError};
use crate::metrics::{MetricDescriptor, MetricSet, RunResult};
use crate::types::BenchmarkName;

/// Lifecycle of one benchmark instance.
///
/// Only `run` is required; the other hooks default to doing nothing.
#[async_trait]
pub trait Benchmark: Send {
    /// One-time resource acquisition.
    async fn setup(&mut self) -> Result<(), BenchmarkError> {
        Ok(())
    }

    /// Per-iteration preparation. May wait for a readiness condition.
    async fn pre_run(&mut self) -> Result<(), BenchmarkError> {
        Ok(())
    }

    /// The measured operation.
    async fn run(&mut self) -> Result<RunResult, BenchmarkError>;

    /// Per-iteration cleanup.
    async fn post_run(&mut self) -> Result<(), BenchmarkError> {
        Ok(())
    }

    /// Final resource release. Called exactly once per instance.
    async fn teardown(&mut self) -> Result<(), BenchmarkError> {
        Ok(())
    }
}

type Factory = Box<dyn Fn() -> Box<dyn Benchmark> + Send + Sync>;

/// A registered benchmark.
pub struct BenchmarkDef {
    name: BenchmarkName,
    version: u32,
    metrics: MetricSet,
    metadata: Map<String, Value>,
    params: Map<String, Value>,
    factory: Factory,
}

impl BenchmarkDef {
    /// Start building a definition.
    pub fn builder(name: impl Into<String>) -> BenchmarkDefBuilder {
        BenchmarkDefBuilder {
            name: name.into(),
            version: 1,
            metrics: MetricSet::new(),
            metadata: Map::new(),
            params: Map::new(),
        }
    }

    /// Benchmark name (report key).
    pub fn name(&self) -> &BenchmarkName {
        &self.name
    }

    /// Benchmark version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Declared metrics.
    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    /// Benchmark-specific metadata, merged over host metadata.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Per-benchmark parameters recorded in the report config.
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Build a fresh instance.
    pub fn instantiate(&self) -> Box<dyn Benchmark> {
        (self.factory)()
    }
}

impl fmt::Debug for BenchmarkDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchmarkDef")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BenchmarkDef`]. Validation happens in `build`.
pub struct BenchmarkDefBuilder {
    name: String,
    version: u32,
    metrics: MetricSet,
    metadata: Map<String, Value>,
    params: Map<String, Value>,
}

impl BenchmarkDefBuilder {
    /// Set the version.
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Declare a metric.
    pub fn metric(mut self, name: impl Into<String>, descriptor: MetricDescriptor) -> Self {
        self.metrics = self.metrics.with(name, descriptor);
        self
    }

    /// Add a benchmark-specific metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        // Plain data always serializes; anything else is recorded as null
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.metadata.insert(key.into(), value);
        self
    }

    /// Replace benchmark-specific metadata.
    pub fn metadata_map(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Replace per-benchmark parameters.
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Validate and attach the factory.
    pub fn build<F, B>(self, factory: F) -> Result<BenchmarkDef, ValidationError>
    where
        F: Fn() -> B + Send + Sync + 'static,
        B: Benchmark + 'static,
    {
        let name = BenchmarkName::new(self.name)?;
        self.metrics.validate()?;

        Ok(BenchmarkDef {
            name,
            version: self.version,
            metrics: self.metrics,
            metadata: self.metadata,
            params: self.params,
            factory: Box::new(move || Box::new(factory())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant;

    #[async_trait]
    impl Benchmark for Constant {
        async fn run(&mut self) -> Result<RunResult, BenchmarkError> {
            Ok(RunResult::new().with("x", 1))
        }
    }

    #[test]
    fn test_builder_validates_schema() {
        let missing_metrics = BenchmarkDef::builder("Constant").build(|| Constant);
        assert!(matches!(
            missing_metrics,
            Err(ValidationError::SchemaValidation { .. })
        ));

        let bad_name = BenchmarkDef::builder("not valid")
            .metric("x", MetricDescriptor::seconds("x"))
            .build(|| Constant);
        assert!(bad_name.is_err());
    }

    #[tokio::test]
    async fn test_instances_are_fresh() {
        let def = BenchmarkDef::builder("Constant")
            .version(3)
            .metric("x", MetricDescriptor::new("count", "n/a", "constant"))
            .metadata("tracer", "lttng")
            .build(|| Constant)
            .unwrap();

        assert_eq!(def.version(), 3);
        assert_eq!(def.metadata()["tracer"], "lttng");

        let mut a = def.instantiate();
        let mut b = def.instantiate();
        a.setup().await.unwrap();
        assert_eq!(a.run().await.unwrap().get("x"), Some(&Value::from(1)));
        assert_eq!(b.run().await.unwrap().get("x"), Some(&Value::from(1)));
    }
}
