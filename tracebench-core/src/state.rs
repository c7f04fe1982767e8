// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark lifecycle state machine with typed transitions.
//!
//! Implements the run protocol:
//! Pending → Metadata → Setup → (PreRun → Run → PostRun)×N → Teardown → Finished.
//! Any active phase may jump to Teardown so resources are released after a
//! failure. Invalid transitions result in StateTransitionError.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::StateTransitionError;
use crate::types::BenchmarkName;

/// Lifecycle phases of one benchmark execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Registered, nothing executed yet.
    Pending,
    /// Collecting and merging host metadata.
    Metadata,
    /// One-time resource acquisition.
    Setup,
    /// Per-iteration preparation (e.g. waiting for a daemon).
    PreRun,
    /// The measured operation.
    Run,
    /// Per-iteration cleanup.
    PostRun,
    /// Final resource release.
    Teardown,
    /// Terminal state.
    Finished,
}

impl Phase {
    /// Get the phase name for error messages and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Metadata => "metadata",
            Self::Setup => "setup",
            Self::PreRun => "pre_run",
            Self::Run => "run",
            Self::PostRun => "post_run",
            Self::Teardown => "teardown",
            Self::Finished => "finished",
        }
    }

    /// Whether an instance exists and teardown is owed.
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Setup | Self::PreRun | Self::Run | Self::PostRun
        )
    }

    /// Check if transition to the target phase is valid.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Metadata) |
            (Self::Metadata, Self::Setup) |
            (Self::Setup, Self::PreRun) |
            (Self::PreRun, Self::Run) |
            (Self::Run, Self::PostRun) |
            // Next iteration
            (Self::PostRun, Self::PreRun) |
            (Self::Teardown, Self::Finished) |
            // Metadata failure: nothing was instantiated
            (Self::Metadata, Self::Finished)
        ) || (self.is_active() && target == Self::Teardown)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Tracks one benchmark through its lifecycle.
/// Enforces the protocol order and counts completed iterations.
#[derive(Debug)]
pub struct LifecycleTracker {
    benchmark: BenchmarkName,
    phase: Phase,
    started: Instant,
    completed_runs: u32,
}

impl LifecycleTracker {
    /// Create a tracker in the Pending phase.
    pub fn new(benchmark: BenchmarkName) -> Self {
        Self {
            benchmark,
            phase: Phase::Pending,
            started: Instant::now(),
            completed_runs: 0,
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of iterations whose post_run completed.
    pub fn completed_runs(&self) -> u32 {
        self.completed_runs
    }

    /// Time since the tracker was created.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    /// Attempt to move to a new phase.
    pub fn transition_to(&mut self, target: Phase) -> Result<(), StateTransitionError> {
        if !self.phase.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                benchmark: self.benchmark.to_string(),
                from: self.phase,
                to: target,
            });
        }

        tracing::trace!(
            benchmark = %self.benchmark,
            from = self.phase.name(),
            to = target.name(),
            "Phase transition"
        );

        if self.phase == Phase::PostRun {
            self.completed_runs += 1;
        }
        self.phase = target;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tracker() -> LifecycleTracker {
        LifecycleTracker::new(BenchmarkName::new("Dummy").unwrap())
    }

    #[test]
    fn test_initial_phase() {
        let tracker = make_tracker();
        assert_eq!(tracker.phase(), Phase::Pending);
        assert_eq!(tracker.completed_runs(), 0);
        assert!(!tracker.phase().is_active());
    }

    #[test]
    fn test_full_protocol() {
        let mut tracker = make_tracker();
        tracker.transition_to(Phase::Metadata).unwrap();
        tracker.transition_to(Phase::Setup).unwrap();
        for _ in 0..3 {
            tracker.transition_to(Phase::PreRun).unwrap();
            tracker.transition_to(Phase::Run).unwrap();
            tracker.transition_to(Phase::PostRun).unwrap();
        }
        tracker.transition_to(Phase::Teardown).unwrap();
        tracker.transition_to(Phase::Finished).unwrap();

        assert_eq!(tracker.completed_runs(), 3);
        assert!(!tracker.phase().is_active());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut tracker = make_tracker();

        // Pending → Run (invalid)
        assert!(tracker.transition_to(Phase::Run).is_err());
        assert_eq!(tracker.phase(), Phase::Pending);

        // Pending → Teardown (nothing to tear down)
        assert!(tracker.transition_to(Phase::Teardown).is_err());
    }

    #[test]
    fn test_abort_to_teardown_from_run() {
        let mut tracker = make_tracker();
        tracker.transition_to(Phase::Metadata).unwrap();
        tracker.transition_to(Phase::Setup).unwrap();
        tracker.transition_to(Phase::PreRun).unwrap();
        tracker.transition_to(Phase::Run).unwrap();
        assert!(tracker.phase().is_active());

        tracker.transition_to(Phase::Teardown).unwrap();
        assert_eq!(tracker.completed_runs(), 0);
        assert!(tracker.transition_to(Phase::Teardown).is_err());
    }
}
