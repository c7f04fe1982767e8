// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! All types validate their invariants at creation time, so a value that
//! exists is a value the harness can use.

use std::fmt;
use std::str::FromStr;

use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default number of measured iterations per benchmark.
pub const DEFAULT_RUNS: u32 = 10;
/// Upper bound on the run count accepted from config or the command line.
const MAX_RUNS: u32 = 10_000;
/// Upper bound on benchmark name length.
const MAX_NAME_LEN: usize = 128;

/// Validated benchmark name.
/// Non-empty, alphanumeric with hyphens/underscores/dots, max 128 chars.
/// Names are the report keys, so they must be stable and printable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BenchmarkName(String);

impl BenchmarkName {
    /// Create a new BenchmarkName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "name",
                value: name,
                reason: "Benchmark name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_NAME_LEN {
            return Err(ValidationError::InvalidFieldValue {
                field: "name",
                value: name.clone(),
                reason: format!(
                    "Benchmark name too long: {} chars (max {})",
                    name.len(),
                    MAX_NAME_LEN
                ),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(ValidationError::InvalidFieldValue {
                field: "name",
                value: name,
                reason: "Benchmark name must contain only alphanumeric characters, hyphens, underscores, and dots".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BenchmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BenchmarkName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BenchmarkName> for String {
    fn from(name: BenchmarkName) -> Self {
        name.0
    }
}

/// Validated number of measured iterations.
/// Must be in range 1-10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RunCount(u32);

impl RunCount {
    /// Create a new RunCount with validation.
    pub fn new(runs: u32) -> Result<Self, ValidationError> {
        if runs == 0 || runs > MAX_RUNS {
            return Err(ValidationError::InvalidFieldValue {
                field: "runs",
                value: runs.to_string(),
                reason: format!("Must be between 1 and {}", MAX_RUNS),
            });
        }
        Ok(Self(runs))
    }

    /// Get the inner value.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for RunCount {
    fn default() -> Self {
        Self(DEFAULT_RUNS)
    }
}

impl fmt::Display for RunCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for RunCount {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RunCount> for u32 {
    fn from(runs: RunCount) -> Self {
        runs.0
    }
}

/// Signal a child uses to announce readiness.
///
/// Accepts `SIGUSR1` as well as the short form `USR1`. Signals that cannot be
/// caught or that indicate a crash are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReadySignal(Signal);

impl ReadySignal {
    /// Parse and validate a signal name.
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        let upper = name.trim().to_ascii_uppercase();
        let full = if upper.starts_with("SIG") {
            upper
        } else {
            format!("SIG{}", upper)
        };

        let signal = Signal::from_str(&full).map_err(|_| ValidationError::UnknownSignal {
            name: name.to_string(),
        })?;

        if matches!(
            signal,
            Signal::SIGKILL
                | Signal::SIGSTOP
                | Signal::SIGSEGV
                | Signal::SIGILL
                | Signal::SIGFPE
                | Signal::SIGBUS
        ) {
            return Err(ValidationError::InvalidFieldValue {
                field: "signal",
                value: name.to_string(),
                reason: "Signal cannot be used as a readiness notification".to_string(),
            });
        }

        Ok(Self(signal))
    }

    /// Get the underlying signal.
    pub fn signal(&self) -> Signal {
        self.0
    }

    /// Get the canonical name (e.g. `SIGUSR1`).
    pub fn name(&self) -> &'static str {
        self.0.as_str()
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self(Signal::SIGUSR1)
    }
}

impl fmt::Display for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<String> for ReadySignal {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReadySignal> for String {
    fn from(signal: ReadySignal) -> Self {
        signal.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_name_valid() {
        assert!(BenchmarkName::new("FirstCommand").is_ok());
        assert!(BenchmarkName::new("session-load_time.v2").is_ok());
    }

    #[test]
    fn test_benchmark_name_invalid() {
        assert!(BenchmarkName::new("").is_err());
        assert!(BenchmarkName::new("has space").is_err());
        assert!(BenchmarkName::new("a".repeat(129)).is_err());
    }

    #[test]
    fn test_run_count_bounds() {
        assert_eq!(RunCount::default().get(), 10);
        assert!(RunCount::new(0).is_err());
        assert!(RunCount::new(1).is_ok());
        assert!(RunCount::new(10_001).is_err());
    }

    #[test]
    fn test_ready_signal_parse() {
        assert_eq!(ReadySignal::parse("SIGUSR1").unwrap().signal(), Signal::SIGUSR1);
        assert_eq!(ReadySignal::parse("usr2").unwrap().signal(), Signal::SIGUSR2);
        assert_eq!(ReadySignal::default().name(), "SIGUSR1");
    }

    #[test]
    fn test_ready_signal_rejects_uncatchable() {
        assert!(matches!(
            ReadySignal::parse("SIGKILL"),
            Err(ValidationError::InvalidFieldValue { .. })
        ));
        assert!(matches!(
            ReadySignal::parse("SIGNOPE"),
            Err(ValidationError::UnknownSignal { .. })
        ));
    }
}
