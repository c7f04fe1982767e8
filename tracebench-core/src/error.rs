// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for tracebench.
//!
//! Every failure the harness can observe has an explicit variant. Library
//! code never returns `Box<dyn Error>` or `anyhow::Result`; the CLI binary is
//! the only place where errors are erased.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::state::Phase;

/// Top-level error type for the harness.
#[derive(Debug, Error)]
pub enum TraceBenchError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Discovery and Registration
    // =========================================================================
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Benchmark already registered: {name}")]
    DuplicateBenchmark { name: String },

    // =========================================================================
    // Host Metadata
    // =========================================================================
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    // =========================================================================
    // Reporting
    // =========================================================================
    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Validation errors reject a config file or a plugin declaration outright.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown signal name: {name}")]
    UnknownSignal { name: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Failures while loading a plugin module from a search directory.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Failed to read plugin module {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse plugin module {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid benchmark '{name}' in {path}: {source}")]
    InvalidBenchmark {
        name: String,
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Failed to scan search directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Host metadata collection errors. There is no fallback value.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("uname failed: {0}")]
    Uname(#[from] nix::Error),
}

/// Daemon and command process errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {program}: {source}")]
    WaitFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to signal {program} (pid {pid}): {source}")]
    SignalFailed {
        program: String,
        pid: u32,
        #[source]
        source: nix::Error,
    },

    #[error("{program} exited before reporting a pid")]
    NoPid { program: String },
}

/// Readiness notification errors.
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("Failed to watch {signal}: {source}")]
    Watch {
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Readiness socket error: {reason}")]
    Socket { reason: String },

    #[error("Process did not report readiness within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Readiness channel closed before a notification arrived")]
    Closed,

    #[error("Readiness probe was not armed before spawning")]
    NotArmed,
}

/// Errors returned by benchmark lifecycle methods.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: String },

    #[error("Invalid lifecycle state: {0}")]
    State(#[from] StateTransitionError),

    #[error("{reason}")]
    Failed { reason: String },
}

impl BenchmarkError {
    /// Convenience constructor for ad-hoc failures in plugin code.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Lifecycle state machine errors.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to} for benchmark {benchmark}")]
    InvalidTransition {
        benchmark: String,
        from: Phase,
        to: Phase,
    },
}

/// Result type alias using TraceBenchError.
pub type TraceBenchResult<T> = Result<T, TraceBenchError>;
