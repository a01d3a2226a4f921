use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One-to-one assignment produced by the Hungarian solver.
///
/// `rows` and `cols` are parallel index arrays into the solved cost matrix;
/// `total_cost` always equals the sum of the selected matrix entries (the
/// solver re-verifies this before returning).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    #[serde(rename = "executionTime")]
    pub execution_time: Duration,
    pub algorithm: String,
    #[serde(rename = "optimalityVerified")]
    pub optimality_verified: bool,
}

impl AssignmentResult {
    /// Iterate the assignment as (row, col) pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().copied().zip(self.cols.iter().copied())
    }
}

/// Stability classification of a matching, re-verified after constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityLevel {
    /// Zero blocking pairs.
    Stable,
    /// Blocking pairs at or below 10% of the matched pairs.
    WeakStable,
    Unstable,
}

/// A matched candidate/job pair with both one-sided scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPair {
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    #[serde(rename = "jobId")]
    pub job_id: String,
    /// The job's desirability to the candidate, in [0,1].
    #[serde(rename = "candidateScore")]
    pub candidate_score: f64,
    /// The candidate's desirability to the job, in [0,1].
    #[serde(rename = "jobScore")]
    pub job_score: f64,
    #[serde(rename = "stabilityScore")]
    pub stability_score: f64,
    /// Harmonic mean of the two one-sided scores; 0 when either side is 0.
    #[serde(rename = "mutualScore")]
    pub mutual_score: f64,
    #[serde(default)]
    pub violations: Vec<String>,
}

impl MatchPair {
    /// Harmonic mean of two one-sided scores.
    pub fn mutual_score_of(candidate_score: f64, job_score: f64) -> f64 {
        if candidate_score <= 0.0 || job_score <= 0.0 {
            return 0.0;
        }
        2.0 * candidate_score * job_score / (candidate_score + job_score)
    }
}

/// Aggregate statistics over one matching run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingStatistics {
    #[serde(rename = "candidateMatchRate")]
    pub candidate_match_rate: f64,
    #[serde(rename = "jobMatchRate")]
    pub job_match_rate: f64,
    #[serde(rename = "blockingPairs")]
    pub blocking_pairs: usize,
    #[serde(rename = "averageMutualScore")]
    pub average_mutual_score: f64,
    #[serde(rename = "constraintViolations")]
    pub constraint_violations: usize,
}

/// Full output of one bidirectional matching run. Created fresh per call and
/// never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingResult {
    pub pairs: Vec<MatchPair>,
    #[serde(rename = "unmatchedCandidates")]
    pub unmatched_candidates: Vec<String>,
    #[serde(rename = "unmatchedJobs")]
    pub unmatched_jobs: Vec<String>,
    pub stability: StabilityLevel,
    /// Sum of per-pair mutual scores.
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "executionTime")]
    pub execution_time: Duration,
    pub statistics: MatchingStatistics,
    #[serde(rename = "computedAt")]
    pub computed_at: DateTime<Utc>,
}
