use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::config::Settings;
use crate::core::constraints::{ConstraintSet, HardConstraint, SoftConstraint};
use crate::core::criteria::{MatchQualityPredictor, SkillSimilarity};
use crate::core::matrix::{CostComponent, CostMatrix, CostMatrixGenerator, CriterionWeight};
use crate::core::solver::{AssignmentAlgorithm, HungarianSolver};
use crate::core::stable::{BidirectionalMatcher, MatchStrategy};
use crate::error::Result;
use crate::models::{
    AssignmentResult, CandidateProfile, JobProfile, MatchingResult, Preference,
};

/// Facade wiring the cost-matrix generator, the assignment solver, the
/// bidirectional matcher and the constraint registry behind one API.
///
/// Individual solve/match calls are synchronous and independent; the shared
/// configuration (criterion weights, constraints) is read-mostly and guarded
/// so each call sees a consistent snapshot.
pub struct MatchEngine {
    generator: CostMatrixGenerator,
    solver: HungarianSolver,
    matcher: BidirectionalMatcher,
    constraints: RwLock<ConstraintSet>,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchEngine {
    /// Engine with default criteria, bounds and no constraints.
    pub fn new() -> Self {
        Self {
            generator: CostMatrixGenerator::new(),
            solver: HungarianSolver::default(),
            matcher: BidirectionalMatcher::default(),
            constraints: RwLock::new(ConstraintSet::new()),
        }
    }

    /// Engine configured from loaded settings (weights and bounds).
    pub fn from_settings(settings: &Settings) -> Self {
        let weights = &settings.scoring.weights;
        let criteria = vec![
            CriterionWeight::new("skills_match", weights.skills),
            CriterionWeight::new("experience_match", weights.experience),
            CriterionWeight::new("salary_compatibility", weights.salary),
            CriterionWeight::new("location_match", weights.location),
            CriterionWeight::new("overall_fit", weights.overall_fit),
        ];
        let engine = Self {
            generator: CostMatrixGenerator::with_criteria(criteria),
            solver: HungarianSolver::new(settings.matching.max_matrix_dimension),
            matcher: BidirectionalMatcher::new(settings.matching.max_iterations),
            constraints: RwLock::new(ConstraintSet::new()),
        };
        info!(
            max_iterations = settings.matching.max_iterations,
            max_matrix_dimension = settings.matching.max_matrix_dimension,
            "match engine configured from settings"
        );
        engine
    }

    pub fn with_skill_similarity(mut self, service: Arc<dyn SkillSimilarity>) -> Self {
        self.generator = self.generator.with_skill_similarity(service);
        self
    }

    pub fn with_quality_predictor(mut self, service: Arc<dyn MatchQualityPredictor>) -> Self {
        self.generator = self.generator.with_quality_predictor(service);
        self
    }

    /// Generate the normalized candidates × jobs cost matrix.
    ///
    /// Registered constraints are applied here so the assignment path honors
    /// them: hard failures force the pair to the matrix maximum, soft
    /// penalties are folded into the pair cost.
    pub fn generate_cost_matrix(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
    ) -> Result<CostMatrix> {
        let constraints = self.constraints.read();
        self.generator.generate(candidates, jobs, Some(&constraints))
    }

    /// Per-criterion cost decomposition for one pair.
    pub fn cost_breakdown(
        &self,
        candidate: &CandidateProfile,
        job: &JobProfile,
    ) -> BTreeMap<String, CostComponent> {
        self.generator.cost_breakdown(candidate, job)
    }

    pub fn update_criterion_weight(&self, name: &str, weight: f64) -> Result<()> {
        self.generator.update_weight(name, weight)
    }

    pub fn set_criterion_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        self.generator.set_enabled(name, enabled)
    }

    pub fn register_criterion(&self, criterion: CriterionWeight) -> Result<()> {
        self.generator.register(criterion)
    }

    /// Solve the one-to-one assignment over a cost matrix.
    pub fn solve_assignment(
        &self,
        matrix: &CostMatrix,
        algorithm: AssignmentAlgorithm,
        maximize: bool,
    ) -> Result<AssignmentResult> {
        self.solver.solve(matrix, algorithm, maximize)
    }

    /// Run the bidirectional stable matcher. When `matrix` is `None` the
    /// engine generates one from the current criterion configuration, without
    /// constraint effects: the matcher applies the registered constraints
    /// itself after tentative matching.
    pub fn find_matches(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
        strategy: MatchStrategy,
        matrix: Option<&CostMatrix>,
    ) -> Result<MatchingResult> {
        let generated;
        let matrix = match matrix {
            Some(m) => m,
            None => {
                generated = self.generator.generate(candidates, jobs, None)?;
                &generated
            }
        };
        let constraints = self.constraints.read();
        self.matcher
            .find_matches(candidates, jobs, strategy, matrix, &constraints)
    }

    /// Ranked preference lists derived from a generated matrix.
    pub fn preferences(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobProfile],
    ) -> Result<(Vec<Preference>, Vec<Preference>)> {
        let matrix = self.generator.generate(candidates, jobs, None)?;
        self.matcher.preferences(candidates, jobs, &matrix)
    }

    pub fn register_hard_constraint(&self, constraint: Arc<dyn HardConstraint>) -> Result<()> {
        self.constraints.write().register_hard(constraint)
    }

    pub fn register_soft_constraint(&self, constraint: Arc<dyn SoftConstraint>) -> Result<()> {
        self.constraints.write().register_soft(constraint)
    }

    pub fn set_constraint_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        self.constraints.write().set_enabled(name, enabled)
    }
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("generator", &self.generator)
            .field("constraints", &*self.constraints.read())
            .finish()
    }
}
