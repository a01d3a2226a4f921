//! Domain and result models for the matching engine.

pub mod domain;
pub mod results;

pub use domain::{Availability, CandidateProfile, EducationLevel, JobProfile, Preference, Urgency};
pub use results::{
    AssignmentResult, MatchPair, MatchingResult, MatchingStatistics, StabilityLevel,
};
