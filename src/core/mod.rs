//! Core matching engine: criteria, cost matrices, the assignment solver,
//! the constraint system and the bidirectional stable matcher.

pub mod constraints;
pub mod criteria;
pub mod engine;
pub mod matrix;
pub mod solver;
pub mod stable;
pub mod transforms;

pub use engine::MatchEngine;
pub use matrix::{CostMatrix, CostMatrixGenerator, CriterionWeight};
pub use solver::{AssignmentAlgorithm, HungarianSolver};
pub use stable::{BidirectionalMatcher, MatchStrategy};
pub use transforms::Transform;
