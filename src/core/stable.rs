use std::collections::VecDeque;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::constraints::ConstraintSet;
use crate::core::matrix::CostMatrix;
use crate::error::{MatchError, Result};
use crate::models::{
    CandidateProfile, JobProfile, MatchPair, MatchingResult, MatchingStatistics, Preference,
    StabilityLevel,
};

/// Which side proposes during deferred acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Candidates propose; best outcome for candidates.
    CandidateOptimal,
    /// Jobs propose; best outcome for employers.
    EmployerOptimal,
    /// Run both, keep whichever totals the higher mutual satisfaction.
    /// Ties favor the candidate-optimal run.
    Balanced,
}

/// Two-sided preference tables derived from one cost matrix.
///
/// Candidates score a job as `1 − cost`; jobs score a candidate the same way
/// plus a small bias rewarding experience above the job's minimum and
/// penalizing under-qualification. `*_rank` tables are 1-based (1 = most
/// preferred) and unique per actor.
struct PreferenceTables {
    candidate_scores: Vec<Vec<f64>>,
    job_scores: Vec<Vec<f64>>,
    /// candidate_order[i] = job indices, most preferred first.
    candidate_order: Vec<Vec<usize>>,
    job_order: Vec<Vec<usize>>,
    /// candidate_rank[i][j] = rank of job j in candidate i's list.
    candidate_rank: Vec<Vec<usize>>,
    job_rank: Vec<Vec<usize>>,
}

impl PreferenceTables {
    fn derive(
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
        matrix: &CostMatrix,
        bonus_cap: f64,
        penalty_cap: f64,
    ) -> Self {
        let n = candidates.len();
        let m = jobs.len();

        let mut candidate_scores = vec![vec![0.0; m]; n];
        let mut job_scores = vec![vec![0.0; n]; m];
        for i in 0..n {
            for j in 0..m {
                let base = 1.0 - matrix.get(i, j);
                candidate_scores[i][j] = base.clamp(0.0, 1.0);
                let bias = experience_bias(&candidates[i], &jobs[j], bonus_cap, penalty_cap);
                job_scores[j][i] = (base + bias).clamp(0.0, 1.0);
            }
        }

        let order_of = |scores: &[f64]| -> Vec<usize> {
            let mut order: Vec<usize> = (0..scores.len()).collect();
            order.sort_by(|&a, &b| {
                scores[b]
                    .partial_cmp(&scores[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(&b))
            });
            order
        };
        let ranks_of = |order: &[usize]| -> Vec<usize> {
            let mut ranks = vec![0; order.len()];
            for (position, &target) in order.iter().enumerate() {
                ranks[target] = position + 1;
            }
            ranks
        };

        let candidate_order: Vec<Vec<usize>> =
            candidate_scores.iter().map(|s| order_of(s)).collect();
        let job_order: Vec<Vec<usize>> = job_scores.iter().map(|s| order_of(s)).collect();
        let candidate_rank = candidate_order.iter().map(|o| ranks_of(o)).collect();
        let job_rank = job_order.iter().map(|o| ranks_of(o)).collect();

        Self {
            candidate_scores,
            job_scores,
            candidate_order,
            job_order,
            candidate_rank,
            job_rank,
        }
    }
}

/// Job-side scoring bias: reward experience above the minimum (capped),
/// penalize under-qualification proportionally to the deficit (capped).
fn experience_bias(
    candidate: &CandidateProfile,
    job: &JobProfile,
    bonus_cap: f64,
    penalty_cap: f64,
) -> f64 {
    let years = candidate.experience_years;
    let min = job.min_experience;
    if years >= min {
        (0.01 * (years - min)).min(bonus_cap)
    } else {
        -((min - years) / min.max(1.0) * penalty_cap).min(penalty_cap)
    }
}

struct StrategyOutcome {
    /// Final (candidate index, job index, candidate_score, job_score, violations).
    pairs: Vec<(usize, usize, f64, f64, Vec<String>)>,
    unmatched_candidates: Vec<usize>,
    unmatched_jobs: Vec<usize>,
    blocking_pairs: Vec<(usize, usize)>,
    constraint_violations: usize,
}

/// Deferred-acceptance matcher producing mutually stable candidate/job
/// assignments, with constraint pruning and post-hoc stability verification.
#[derive(Debug, Clone)]
pub struct BidirectionalMatcher {
    /// Proposal cap; exhaustion degrades to a partial result, never an error.
    max_iterations: usize,
    experience_bonus_cap: f64,
    experience_penalty_cap: f64,
    /// Blocking pairs at or below this fraction of matches are WeakStable.
    weak_stability_threshold: f64,
}

impl Default for BidirectionalMatcher {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            experience_bonus_cap: 0.05,
            experience_penalty_cap: 0.1,
            weak_stability_threshold: 0.10,
        }
    }
}

impl BidirectionalMatcher {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Match candidates against jobs under the given strategy.
    ///
    /// `matrix` must have shape (#candidates, #jobs); pass the matrix from
    /// the generator that scored these profiles. Empty input on either side
    /// returns a valid zero-match result.
    pub fn find_matches(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
        strategy: MatchStrategy,
        matrix: &CostMatrix,
        constraints: &ConstraintSet,
    ) -> Result<MatchingResult> {
        if matrix.rows() != candidates.len() || matrix.cols() != jobs.len() {
            return Err(MatchError::InvalidInput(format!(
                "matrix shape {}x{} does not match {} candidates x {} jobs",
                matrix.rows(),
                matrix.cols(),
                candidates.len(),
                jobs.len()
            )));
        }

        let started = Instant::now();

        if candidates.is_empty() || jobs.is_empty() {
            return Ok(Self::empty_result(candidates, jobs, started));
        }

        let tables = PreferenceTables::derive(
            candidates,
            jobs,
            matrix,
            self.experience_bonus_cap,
            self.experience_penalty_cap,
        );

        let outcome = match strategy {
            MatchStrategy::CandidateOptimal => {
                self.run_strategy(candidates, jobs, &tables, constraints, true)
            }
            MatchStrategy::EmployerOptimal => {
                self.run_strategy(candidates, jobs, &tables, constraints, false)
            }
            MatchStrategy::Balanced => {
                let candidate_run =
                    self.run_strategy(candidates, jobs, &tables, constraints, true);
                let employer_run =
                    self.run_strategy(candidates, jobs, &tables, constraints, false);
                if Self::total_mutual(&employer_run) > Self::total_mutual(&candidate_run) {
                    employer_run
                } else {
                    candidate_run
                }
            }
        };

        Ok(self.assemble(candidates, jobs, outcome, started))
    }

    /// Ranked preference lists for both sides, for explainability.
    pub fn preferences(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
        matrix: &CostMatrix,
    ) -> Result<(Vec<Preference>, Vec<Preference>)> {
        if matrix.rows() != candidates.len() || matrix.cols() != jobs.len() {
            return Err(MatchError::InvalidInput(
                "matrix shape does not match the profile lists".into(),
            ));
        }
        let tables = PreferenceTables::derive(
            candidates,
            jobs,
            matrix,
            self.experience_bonus_cap,
            self.experience_penalty_cap,
        );

        let mut candidate_prefs = Vec::new();
        for (i, order) in tables.candidate_order.iter().enumerate() {
            for (position, &j) in order.iter().enumerate() {
                candidate_prefs.push(Preference {
                    actor_id: candidates[i].id.clone(),
                    target_id: jobs[j].id.clone(),
                    score: tables.candidate_scores[i][j],
                    rank: position + 1,
                    reasons: Vec::new(),
                });
            }
        }
        let mut job_prefs = Vec::new();
        for (j, order) in tables.job_order.iter().enumerate() {
            for (position, &i) in order.iter().enumerate() {
                job_prefs.push(Preference {
                    actor_id: jobs[j].id.clone(),
                    target_id: candidates[i].id.clone(),
                    score: tables.job_scores[j][i],
                    rank: position + 1,
                    reasons: Vec::new(),
                });
            }
        }
        Ok((candidate_prefs, job_prefs))
    }

    fn total_mutual(outcome: &StrategyOutcome) -> f64 {
        outcome
            .pairs
            .iter()
            .map(|&(_, _, cs, js, _)| MatchPair::mutual_score_of(cs, js))
            .sum()
    }

    /// One full strategy run: deferred acceptance, constraint pass, stability
    /// verification.
    fn run_strategy(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
        tables: &PreferenceTables,
        constraints: &ConstraintSet,
        candidates_propose: bool,
    ) -> StrategyOutcome {
        let n = candidates.len();
        let m = jobs.len();

        // Map the run onto proposer/receiver index spaces
        let tentative: Vec<(usize, usize)> = if candidates_propose {
            self.deferred_acceptance(&tables.candidate_order, &tables.job_rank)
                .into_iter()
                .enumerate()
                .filter_map(|(i, job)| job.map(|j| (i, j)))
                .collect()
        } else {
            self.deferred_acceptance(&tables.job_order, &tables.candidate_rank)
                .into_iter()
                .enumerate()
                .filter_map(|(j, cand)| cand.map(|i| (i, j)))
                .collect()
        };

        // Constraint pass over the tentative matching
        let mut pairs: Vec<(usize, usize, f64, f64, Vec<String>)> = Vec::new();
        let mut constraint_violations = 0usize;
        let mut matched_candidate = vec![None; n];
        let mut matched_job = vec![None; m];

        for (i, j) in tentative {
            let report = constraints.evaluate_pair(&candidates[i], &jobs[j]);
            constraint_violations += report.violations.len();
            if !report.is_valid {
                debug!(
                    candidate = %candidates[i].id,
                    job = %jobs[j].id,
                    "pair removed by hard constraint"
                );
                continue;
            }
            let candidate_score =
                (tables.candidate_scores[i][j] - report.penalty).max(0.0);
            let job_score = (tables.job_scores[j][i] - report.penalty).max(0.0);
            matched_candidate[i] = Some(j);
            matched_job[j] = Some(i);
            pairs.push((i, j, candidate_score, job_score, report.violations));
        }
        pairs.sort_by_key(|&(i, _, _, _, _)| i);

        // Stability verification is mandatory: constraint removals can break
        // the deferred-acceptance guarantee
        let mut blocking_pairs = Vec::new();
        for i in 0..n {
            for j in 0..m {
                if matched_candidate[i] == Some(j) {
                    continue;
                }
                let candidate_prefers = match matched_candidate[i] {
                    None => true,
                    Some(current) => tables.candidate_rank[i][j] < tables.candidate_rank[i][current],
                };
                if !candidate_prefers {
                    continue;
                }
                let job_prefers = match matched_job[j] {
                    None => true,
                    Some(current) => tables.job_rank[j][i] < tables.job_rank[j][current],
                };
                if job_prefers {
                    blocking_pairs.push((i, j));
                }
            }
        }

        StrategyOutcome {
            pairs,
            unmatched_candidates: (0..n).filter(|&i| matched_candidate[i].is_none()).collect(),
            unmatched_jobs: (0..m).filter(|&j| matched_job[j].is_none()).collect(),
            blocking_pairs,
            constraint_violations,
        }
    }

    /// Deferred acceptance: free proposers propose down their lists, holders
    /// keep whichever proposal they rank better. The pop order of the free
    /// queue does not affect the stable outcome.
    ///
    /// Returns, per proposer, the receiver index it holds at termination.
    fn deferred_acceptance(
        &self,
        proposer_order: &[Vec<usize>],
        receiver_rank: &[Vec<usize>],
    ) -> Vec<Option<usize>> {
        let n = proposer_order.len();
        let mut next_proposal = vec![0usize; n];
        let mut proposer_match: Vec<Option<usize>> = vec![None; n];
        let mut receiver_match: Vec<Option<usize>> = vec![None; receiver_rank.len()];
        let mut free: VecDeque<usize> = (0..n).collect();

        let mut proposals = 0usize;
        while let Some(proposer) = free.pop_front() {
            if next_proposal[proposer] >= proposer_order[proposer].len() {
                // List exhausted: stays permanently unmatched
                continue;
            }
            if proposals >= self.max_iterations {
                warn!(
                    proposals,
                    "proposal cap reached, returning partial matching"
                );
                break;
            }
            proposals += 1;

            let receiver = proposer_order[proposer][next_proposal[proposer]];
            next_proposal[proposer] += 1;

            match receiver_match[receiver] {
                None => {
                    receiver_match[receiver] = Some(proposer);
                    proposer_match[proposer] = Some(receiver);
                }
                Some(held) => {
                    if receiver_rank[receiver][proposer] < receiver_rank[receiver][held] {
                        proposer_match[held] = None;
                        free.push_back(held);
                        receiver_match[receiver] = Some(proposer);
                        proposer_match[proposer] = Some(receiver);
                    } else {
                        free.push_back(proposer);
                    }
                }
            }
        }

        proposer_match
    }

    fn assemble(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
        outcome: StrategyOutcome,
        started: Instant,
    ) -> MatchingResult {
        // Per-actor involvement in blocking pairs feeds the per-pair
        // stability score
        let mut candidate_blocking = vec![0usize; candidates.len()];
        let mut job_blocking = vec![0usize; jobs.len()];
        for &(i, j) in &outcome.blocking_pairs {
            candidate_blocking[i] += 1;
            job_blocking[j] += 1;
        }

        let pairs: Vec<MatchPair> = outcome
            .pairs
            .iter()
            .map(|&(i, j, candidate_score, job_score, ref violations)| {
                let involved = candidate_blocking[i] + job_blocking[j];
                MatchPair {
                    candidate_id: candidates[i].id.clone(),
                    job_id: jobs[j].id.clone(),
                    candidate_score,
                    job_score,
                    stability_score: 1.0 / (1.0 + involved as f64),
                    mutual_score: MatchPair::mutual_score_of(candidate_score, job_score),
                    violations: violations.clone(),
                }
            })
            .collect();

        let blocking = outcome.blocking_pairs.len();
        let stability = if blocking == 0 {
            StabilityLevel::Stable
        } else if (blocking as f64) <= self.weak_stability_threshold * pairs.len() as f64 {
            StabilityLevel::WeakStable
        } else {
            StabilityLevel::Unstable
        };

        let total_score: f64 = pairs.iter().map(|p| p.mutual_score).sum();
        let average_mutual_score = if pairs.is_empty() {
            0.0
        } else {
            total_score / pairs.len() as f64
        };

        let statistics = MatchingStatistics {
            candidate_match_rate: rate(pairs.len(), candidates.len()),
            job_match_rate: rate(pairs.len(), jobs.len()),
            blocking_pairs: blocking,
            average_mutual_score,
            constraint_violations: outcome.constraint_violations,
        };

        debug!(
            matched = pairs.len(),
            blocking,
            ?stability,
            "matching assembled"
        );

        MatchingResult {
            pairs,
            unmatched_candidates: outcome
                .unmatched_candidates
                .iter()
                .map(|&i| candidates[i].id.clone())
                .collect(),
            unmatched_jobs: outcome
                .unmatched_jobs
                .iter()
                .map(|&j| jobs[j].id.clone())
                .collect(),
            stability,
            total_score,
            execution_time: started.elapsed(),
            statistics,
            computed_at: Utc::now(),
        }
    }

    fn empty_result(
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
        started: Instant,
    ) -> MatchingResult {
        MatchingResult {
            pairs: Vec::new(),
            unmatched_candidates: candidates.iter().map(|c| c.id.clone()).collect(),
            unmatched_jobs: jobs.iter().map(|j| j.id.clone()).collect(),
            stability: StabilityLevel::Stable,
            total_score: 0.0,
            execution_time: started.elapsed(),
            statistics: MatchingStatistics {
                candidate_match_rate: 0.0,
                job_match_rate: 0.0,
                blocking_pairs: 0,
                average_mutual_score: 0.0,
                constraint_violations: 0,
            },
            computed_at: Utc::now(),
        }
    }
}

fn rate(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}
