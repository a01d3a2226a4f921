use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::constraints::ConstraintSet;
use crate::core::criteria::{self, MatchQualityPredictor, SkillSimilarity, NEUTRAL_COST};
use crate::core::transforms::Transform;
use crate::error::{MatchError, Result};
use crate::models::{CandidateProfile, JobProfile};

/// Dense candidates × jobs cost matrix, row-major.
///
/// Produced per matching call; after generation all entries are finite and
/// min-max normalized into [0,1] (0.5 everywhere when all raw costs are
/// equal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Zero-filled matrix. Either dimension may be 0.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from nested rows; fails when row lengths differ.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(MatchError::InvalidInput(
                "matrix rows have unequal lengths".into(),
            ));
        }
        Ok(Self {
            rows: rows.len(),
            cols: n_cols,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn entries(&self) -> &[f64] {
        &self.data
    }

    /// Min-max normalize all entries into [0,1]; a constant matrix becomes
    /// 0.5 everywhere.
    pub fn normalize(&mut self) {
        if self.data.is_empty() {
            return;
        }
        let min = self.data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        if span < 1e-12 {
            self.data.fill(0.5);
            return;
        }
        for v in &mut self.data {
            *v = (*v - min) / span;
        }
    }

    /// Lossless downcast of the entries to `f32` for memory-constrained
    /// callers. Returns `None` when any entry would lose more than
    /// `tolerance`; never applied by default.
    pub fn try_downcast_f32(&self, tolerance: f64) -> Option<Vec<f32>> {
        let mut out = Vec::with_capacity(self.data.len());
        for &v in &self.data {
            let narrow = v as f32;
            if (f64::from(narrow) - v).abs() > tolerance {
                return None;
            }
            out.push(narrow);
        }
        Some(out)
    }
}

/// Weighted, transformed criterion registration.
#[derive(Debug, Clone)]
pub struct CriterionWeight {
    pub name: String,
    /// Weight in [0,1]; enabled weights should sum to ≈1.
    pub weight: f64,
    pub transform: Transform,
    /// Set when the raw metric is a similarity that must become a cost.
    pub invert: bool,
    /// Clamp the raw value into [0,1] before transforming.
    pub normalize: bool,
    pub params: HashMap<String, f64>,
    pub enabled: bool,
}

impl CriterionWeight {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            transform: Transform::Linear,
            invert: false,
            normalize: true,
            params: HashMap::new(),
            enabled: true,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Per-criterion cost decomposition for one pair, for explainability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostComponent {
    pub raw: f64,
    pub transformed: f64,
    pub weighted: f64,
}

/// Combines weighted, transformed criteria into a full cost matrix.
///
/// Criterion configuration is read-mostly shared state: generation takes a
/// read lock per call, weight updates take the write lock, so every request
/// sees a consistent snapshot.
pub struct CostMatrixGenerator {
    criteria: RwLock<Vec<CriterionWeight>>,
    skill_similarity: Option<Arc<dyn SkillSimilarity>>,
    quality_predictor: Option<Arc<dyn MatchQualityPredictor>>,
}

impl Default for CostMatrixGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CostMatrixGenerator {
    /// Generator with the five built-in criteria at their default weights.
    pub fn new() -> Self {
        Self::with_criteria(Self::default_criteria())
    }

    pub fn with_criteria(criteria: Vec<CriterionWeight>) -> Self {
        let generator = Self {
            criteria: RwLock::new(criteria),
            skill_similarity: None,
            quality_predictor: None,
        };
        generator.warn_on_weight_drift();
        generator
    }

    pub fn with_skill_similarity(mut self, service: Arc<dyn SkillSimilarity>) -> Self {
        self.skill_similarity = Some(service);
        self
    }

    pub fn with_quality_predictor(mut self, service: Arc<dyn MatchQualityPredictor>) -> Self {
        self.quality_predictor = Some(service);
        self
    }

    /// Default criterion set; weights sum to 1.
    pub fn default_criteria() -> Vec<CriterionWeight> {
        const DEFAULT_WEIGHTS: [f64; 5] = [0.30, 0.25, 0.15, 0.15, 0.15];
        criteria::BUILTIN_CRITERIA
            .iter()
            .zip(DEFAULT_WEIGHTS)
            .map(|(&name, weight)| CriterionWeight::new(name, weight))
            .collect()
    }

    /// Register an additional criterion. Names must stay unique.
    pub fn register(&self, criterion: CriterionWeight) -> Result<()> {
        let mut criteria = self.criteria.write();
        if criteria.iter().any(|c| c.name == criterion.name) {
            return Err(MatchError::InvalidInput(format!(
                "criterion '{}' is already registered",
                criterion.name
            )));
        }
        criteria.push(criterion);
        drop(criteria);
        self.warn_on_weight_drift();
        Ok(())
    }

    /// Update one criterion's weight at runtime.
    pub fn update_weight(&self, name: &str, weight: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&weight) || !weight.is_finite() {
            return Err(MatchError::InvalidInput(format!(
                "weight {weight} for '{name}' is outside [0,1]"
            )));
        }
        {
            let mut criteria = self.criteria.write();
            let criterion = criteria.iter_mut().find(|c| c.name == name).ok_or_else(|| {
                MatchError::InvalidInput(format!("unknown criterion '{name}'"))
            })?;
            criterion.weight = weight;
        }
        self.warn_on_weight_drift();
        Ok(())
    }

    /// Enable or disable a criterion without unregistering it.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let mut criteria = self.criteria.write();
        let criterion = criteria
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| MatchError::InvalidInput(format!("unknown criterion '{name}'")))?;
        criterion.enabled = enabled;
        Ok(())
    }

    /// Snapshot of the current criterion configuration.
    pub fn criteria(&self) -> Vec<CriterionWeight> {
        self.criteria.read().clone()
    }

    fn warn_on_weight_drift(&self) {
        let sum: f64 = self
            .criteria
            .read()
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.weight)
            .sum();
        if (sum - 1.0).abs() > 0.05 {
            warn!("enabled criterion weights sum to {sum:.3}, expected ≈1.0");
        }
    }

    /// Generate the full candidates × jobs cost matrix, normalized into
    /// [0,1]. Empty inputs yield an appropriately shaped empty matrix.
    ///
    /// When a constraint set is supplied, pairs failing a hard constraint are
    /// forced above every feasible cost (the matrix maximum after
    /// normalization) and soft penalties are added to the pair cost before
    /// normalization.
    pub fn generate(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
        constraints: Option<&ConstraintSet>,
    ) -> Result<CostMatrix> {
        for candidate in candidates {
            candidate.validate()?;
        }
        for job in jobs {
            job.validate()?;
        }

        let mut matrix = CostMatrix::new(candidates.len(), jobs.len());
        if matrix.is_empty() {
            return Ok(matrix);
        }

        let criteria = self.criteria.read();
        let mut eliminated: Vec<(usize, usize)> = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            for (j, job) in jobs.iter().enumerate() {
                let mut cost = self.pair_cost(&criteria, candidate, job);
                if let Some(set) = constraints {
                    let report = set.evaluate_pair(candidate, job);
                    if !report.is_valid {
                        eliminated.push((i, j));
                    }
                    cost += report.penalty;
                }
                matrix.set(i, j, cost);
            }
        }
        drop(criteria);

        // Eliminated edges sit strictly above every feasible cost
        if !eliminated.is_empty() {
            let ceiling = matrix
                .entries()
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
                + 1.0;
            for (i, j) in eliminated {
                matrix.set(i, j, ceiling);
            }
        }

        matrix.normalize();
        debug!(
            rows = matrix.rows(),
            cols = matrix.cols(),
            "generated cost matrix"
        );
        Ok(matrix)
    }

    /// Per-criterion cost decomposition for one pair. Summing the weighted
    /// components reproduces the pair's pre-normalization cost.
    pub fn cost_breakdown(
        &self,
        candidate: &CandidateProfile,
        job: &JobProfile,
    ) -> BTreeMap<String, CostComponent> {
        let criteria = self.criteria.read();
        let mut breakdown = BTreeMap::new();
        for criterion in criteria.iter().filter(|c| c.enabled) {
            let raw = self.raw_cost(criterion, candidate, job);
            let transformed = Self::shaped_cost(criterion, raw);
            breakdown.insert(
                criterion.name.clone(),
                CostComponent {
                    raw,
                    transformed,
                    weighted: criterion.weight * transformed,
                },
            );
        }
        breakdown
    }

    fn pair_cost(
        &self,
        criteria: &[CriterionWeight],
        candidate: &CandidateProfile,
        job: &JobProfile,
    ) -> f64 {
        criteria
            .iter()
            .filter(|c| c.enabled)
            .map(|criterion| {
                let raw = self.raw_cost(criterion, candidate, job);
                criterion.weight * Self::shaped_cost(criterion, raw)
            })
            .sum()
    }

    fn shaped_cost(criterion: &CriterionWeight, raw: f64) -> f64 {
        let raw = if criterion.normalize {
            raw.clamp(0.0, 1.0)
        } else {
            raw
        };
        let transformed = criterion.transform.apply(raw);
        if criterion.invert {
            1.0 - transformed
        } else {
            transformed
        }
    }

    fn raw_cost(
        &self,
        criterion: &CriterionWeight,
        candidate: &CandidateProfile,
        job: &JobProfile,
    ) -> f64 {
        match criterion.name.as_str() {
            "skills_match" => {
                criteria::skills_cost(candidate, job, self.skill_similarity.as_deref())
            }
            "experience_match" => criteria::experience_cost(candidate, job),
            "salary_compatibility" => criteria::salary_cost(candidate, job),
            "location_match" => criteria::location_cost(candidate, job),
            "overall_fit" => {
                criteria::overall_fit_cost(candidate, job, self.quality_predictor.as_deref())
            }
            unknown => {
                warn!("unknown criterion '{unknown}', scoring neutrally");
                NEUTRAL_COST
            }
        }
    }
}

impl std::fmt::Debug for CostMatrixGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostMatrixGenerator")
            .field("criteria", &self.criteria.read().len())
            .field("skill_similarity", &self.skill_similarity.is_some())
            .field("quality_predictor", &self.quality_predictor.is_some())
            .finish()
    }
}
