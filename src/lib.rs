//! Talent Algo - candidate-to-job matching engine
//!
//! This library implements the combinatorial core of a two-sided matching
//! system: multi-criteria cost matrix generation, a globally optimal
//! assignment solver (Kuhn–Munkres), a hard/soft constraint layer, and a
//! bidirectional stable matcher (Gale–Shapley-style deferred acceptance with
//! stability verification).
//!
//! Everything runs in-process and synchronously; callers own profile storage,
//! transport and any auto-tuning that adjusts the weights exposed here.

pub mod config;
pub mod core;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use core::{
    AssignmentAlgorithm, BidirectionalMatcher, CostMatrix, CostMatrixGenerator, CriterionWeight,
    HungarianSolver, MatchEngine, MatchStrategy, Transform,
};
pub use error::{MatchError, Result};
pub use models::{
    AssignmentResult, CandidateProfile, JobProfile, MatchPair, MatchingResult, StabilityLevel,
};
