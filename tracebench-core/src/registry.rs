// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark registry.
//!
//! Holds every registered [`BenchmarkDef`] keyed by name. Names are unique;
//! iteration is in name order so runs and reports are deterministic.

use std::collections::BTreeMap;

use crate::config::Selection;
use crate::error::{TraceBenchError, TraceBenchResult};
use crate::plugin::BenchmarkDef;
use crate::types::BenchmarkName;

/// Registry of benchmarks available to the harness.
#[derive(Debug, Default)]
pub struct BenchmarkRegistry {
    benchmarks: BTreeMap<BenchmarkName, BenchmarkDef>,
}

impl BenchmarkRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a benchmark.
    /// Returns DuplicateBenchmark if the name is already taken.
    pub fn register(&mut self, def: BenchmarkDef) -> TraceBenchResult<()> {
        if self.benchmarks.contains_key(def.name()) {
            return Err(TraceBenchError::DuplicateBenchmark {
                name: def.name().to_string(),
            });
        }

        tracing::debug!(
            benchmark = %def.name(),
            version = def.version(),
            metrics = def.metrics().len(),
            "Registered benchmark"
        );

        self.benchmarks.insert(def.name().clone(), def);
        Ok(())
    }

    /// Look up a benchmark by name.
    pub fn get(&self, name: &BenchmarkName) -> Option<&BenchmarkDef> {
        self.benchmarks.get(name)
    }

    /// Check if a benchmark exists.
    pub fn contains(&self, name: &BenchmarkName) -> bool {
        self.benchmarks.contains_key(name)
    }

    /// Get the number of registered benchmarks.
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Iterate over all benchmarks in name order.
    pub fn iter(&self) -> impl Iterator<Item = &BenchmarkDef> {
        self.benchmarks.values()
    }

    /// Benchmarks picked by a selection, in name order.
    ///
    /// Included names that are not registered are logged, not fatal.
    pub fn selected<'a>(&'a self, selection: &'a Selection) -> Vec<&'a BenchmarkDef> {
        for name in &selection.include {
            if !self.contains(name) {
                tracing::warn!(benchmark = %name, "Selected benchmark is not registered");
            }
        }

        self.benchmarks
            .values()
            .filter(|def| selection.selects(def.name()))
            .collect()
    }
}
