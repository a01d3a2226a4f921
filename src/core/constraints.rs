use std::sync::Arc;

use tracing::warn;

use crate::error::{MatchError, Result};
use crate::models::{CandidateProfile, JobProfile};

/// A rule that can eliminate a candidate/job pairing outright.
///
/// `evaluate` returns whether the pair satisfies the rule. An `Err` is
/// treated conservatively by the aggregator: the pair is considered invalid.
pub trait HardConstraint: Send + Sync {
    fn name(&self) -> &str;
    /// Informational ordering hint; does not change evaluation semantics.
    fn priority(&self) -> u8 {
        0
    }
    fn evaluate(&self, candidate: &CandidateProfile, job: &JobProfile) -> Result<bool>;
}

/// A rule that adds a bounded penalty instead of eliminating the pair.
///
/// `violation` reports the degree of violation in [0,1]; the applied penalty
/// is `min(max_penalty, degree * max_penalty)`. An `Err` contributes zero
/// penalty and is logged, never aborting the whole evaluation.
pub trait SoftConstraint: Send + Sync {
    fn name(&self) -> &str;
    fn priority(&self) -> u8 {
        0
    }
    fn max_penalty(&self) -> f64;
    fn violation(&self, candidate: &CandidateProfile, job: &JobProfile) -> Result<f64>;
}

/// Penalty for a violation degree, clamped into [0, max_penalty].
pub fn penalty_for(degree: f64, max_penalty: f64) -> f64 {
    (degree.max(0.0) * max_penalty).min(max_penalty).max(0.0)
}

/// Aggregated evaluation of all enabled constraints for one pair.
#[derive(Debug, Clone)]
pub struct ConstraintReport {
    pub is_valid: bool,
    /// Sum of soft-constraint penalties; 0 when the pair is invalid.
    pub penalty: f64,
    pub violations: Vec<String>,
}

impl ConstraintReport {
    fn valid() -> Self {
        Self {
            is_valid: true,
            penalty: 0.0,
            violations: Vec::new(),
        }
    }
}

struct RegisteredHard {
    constraint: Arc<dyn HardConstraint>,
    enabled: bool,
}

struct RegisteredSoft {
    constraint: Arc<dyn SoftConstraint>,
    enabled: bool,
}

/// Registry and aggregator for hard and soft constraints.
///
/// Hard constraints are evaluated first and short-circuit on the first
/// failure; soft penalties are then summed. The engine serializes
/// registration behind a lock; evaluation only reads.
#[derive(Default)]
pub struct ConstraintSet {
    hard: Vec<RegisteredHard>,
    soft: Vec<RegisteredSoft>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_hard(&mut self, constraint: Arc<dyn HardConstraint>) -> Result<()> {
        if self.contains(constraint.name()) {
            return Err(MatchError::InvalidInput(format!(
                "constraint '{}' is already registered",
                constraint.name()
            )));
        }
        self.hard.push(RegisteredHard {
            constraint,
            enabled: true,
        });
        self.hard
            .sort_by_key(|r| std::cmp::Reverse(r.constraint.priority()));
        Ok(())
    }

    pub fn register_soft(&mut self, constraint: Arc<dyn SoftConstraint>) -> Result<()> {
        if self.contains(constraint.name()) {
            return Err(MatchError::InvalidInput(format!(
                "constraint '{}' is already registered",
                constraint.name()
            )));
        }
        self.soft.push(RegisteredSoft {
            constraint,
            enabled: true,
        });
        self.soft
            .sort_by_key(|r| std::cmp::Reverse(r.constraint.priority()));
        Ok(())
    }

    /// Enable or disable a constraint by name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        for registered in &mut self.hard {
            if registered.constraint.name() == name {
                registered.enabled = enabled;
                return Ok(());
            }
        }
        for registered in &mut self.soft {
            if registered.constraint.name() == name {
                registered.enabled = enabled;
                return Ok(());
            }
        }
        Err(MatchError::InvalidInput(format!(
            "unknown constraint '{name}'"
        )))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hard.iter().any(|r| r.constraint.name() == name)
            || self.soft.iter().any(|r| r.constraint.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.hard.is_empty() && self.soft.is_empty()
    }

    /// Evaluate every enabled constraint against one pair.
    pub fn evaluate_pair(
        &self,
        candidate: &CandidateProfile,
        job: &JobProfile,
    ) -> ConstraintReport {
        let mut report = ConstraintReport::valid();

        for registered in self.hard.iter().filter(|r| r.enabled) {
            let name = registered.constraint.name();
            match registered.constraint.evaluate(candidate, job) {
                Ok(true) => {}
                Ok(false) => {
                    report.is_valid = false;
                    report.penalty = 0.0;
                    report.violations.push(format!(
                        "hard constraint '{name}' failed for ({}, {})",
                        candidate.id, job.id
                    ));
                    return report;
                }
                Err(e) => {
                    // Failing hard constraint: safe default is pair invalid
                    warn!("hard constraint '{name}' errored, treating pair as invalid: {e}");
                    report.is_valid = false;
                    report.penalty = 0.0;
                    report
                        .violations
                        .push(format!("hard constraint '{name}' errored: {e}"));
                    return report;
                }
            }
        }

        for registered in self.soft.iter().filter(|r| r.enabled) {
            let name = registered.constraint.name();
            match registered.constraint.violation(candidate, job) {
                Ok(degree) if degree > 0.0 => {
                    let penalty = penalty_for(degree, registered.constraint.max_penalty());
                    report.penalty += penalty;
                    report.violations.push(format!(
                        "soft constraint '{name}' violated (degree {degree:.3}, penalty {penalty:.3})"
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    // A broken soft constraint never aborts the evaluation
                    warn!("soft constraint '{name}' errored, contributing zero penalty: {e}");
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for ConstraintSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintSet")
            .field("hard", &self.hard.len())
            .field("soft", &self.soft.len())
            .finish()
    }
}
