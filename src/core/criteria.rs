use std::collections::HashSet;

use tracing::warn;

use crate::error::Result;
use crate::models::{Availability, CandidateProfile, JobProfile, Urgency};

/// Externally injected skills-similarity service (e.g. an embedding model).
///
/// Returns a normalized similarity in [0,1]. Criteria fall back to their
/// heuristic path when a call fails.
pub trait SkillSimilarity: Send + Sync {
    fn similarity(&self, candidate: &CandidateProfile, job: &JobProfile) -> Result<f64>;
}

/// Externally injected match-quality predictor returning a score in [0,1].
pub trait MatchQualityPredictor: Send + Sync {
    fn predict(&self, candidate: &CandidateProfile, job: &JobProfile) -> Result<f64>;
}

/// Names of the built-in criteria, in the order they are registered.
pub const BUILTIN_CRITERIA: [&str; 5] = [
    "skills_match",
    "experience_match",
    "salary_compatibility",
    "location_match",
    "overall_fit",
];

/// Neutral cost used when a criterion has no data to work with or its name
/// is unknown.
pub const NEUTRAL_COST: f64 = 0.5;

fn normalized_set(items: &[String]) -> HashSet<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Skill-match cost: 1 − similarity.
///
/// Similarity is Jaccard over case-folded skill sets, with a bonus capped at
/// 0.1 for moderate over-qualification (candidate lists more skills than the
/// job requires while still overlapping). When an external similarity service
/// is injected its score is used instead, with Jaccard as the fallback on
/// failure.
pub fn skills_cost(
    candidate: &CandidateProfile,
    job: &JobProfile,
    similarity: Option<&dyn SkillSimilarity>,
) -> f64 {
    if let Some(service) = similarity {
        match service.similarity(candidate, job) {
            Ok(score) => return (1.0 - score.clamp(0.0, 1.0)).clamp(0.0, 1.0),
            Err(e) => {
                warn!(
                    candidate = %candidate.id,
                    job = %job.id,
                    "skill similarity service failed, falling back to Jaccard: {e}"
                );
            }
        }
    }

    let candidate_skills = normalized_set(&candidate.skills);
    let required = normalized_set(&job.required_skills);

    // A job with no skill requirements cannot be missed
    if required.is_empty() {
        return 0.0;
    }
    if candidate_skills.is_empty() {
        return 1.0;
    }

    let intersection = candidate_skills.intersection(&required).count() as f64;
    let union = candidate_skills.union(&required).count() as f64;
    let jaccard = intersection / union;

    // Moderate over-qualification earns a small bonus
    let mut similarity = jaccard;
    if intersection > 0.0 && candidate_skills.len() > required.len() {
        let extra = (candidate_skills.len() - required.len()) as f64;
        let bonus = (0.1 * extra / required.len() as f64).min(0.1);
        similarity = (similarity + bonus).min(1.0);
    }

    1.0 - similarity
}

/// Experience cost: 0 inside the job's band, linear deficit below the
/// minimum, and a soft penalty capped at 0.3 above the maximum.
pub fn experience_cost(candidate: &CandidateProfile, job: &JobProfile) -> f64 {
    let years = candidate.experience_years;
    let min = job.min_experience;
    let max = job.max_experience.unwrap_or(f64::INFINITY);

    if years >= min && years <= max {
        return 0.0;
    }
    if years < min {
        let deficit = min - years;
        return (deficit / min.max(1.0)).min(1.0);
    }
    let excess = years - max;
    (excess / max).min(0.3)
}

/// Salary cost: 0 when the expectation falls in the job's range, otherwise
/// the gap relative to the nearest bound, capped at 1. Missing data on either
/// side scores neutrally.
pub fn salary_cost(candidate: &CandidateProfile, job: &JobProfile) -> f64 {
    let (expected, (lower, upper)) = match (candidate.expected_salary, job.salary_range) {
        (Some(e), Some(range)) => (e, range),
        _ => return NEUTRAL_COST,
    };

    if expected >= lower && expected <= upper {
        return 0.0;
    }
    if expected < lower {
        if lower <= 0.0 {
            return 0.0;
        }
        return ((lower - expected) / lower).min(1.0);
    }
    if upper <= 0.0 {
        return 1.0;
    }
    ((expected - upper) / upper).min(1.0)
}

/// Location cost: 0 on an exact case-insensitive match, otherwise
/// 1 − token-overlap ratio across comma-separated components. Missing data
/// on either side scores neutrally.
pub fn location_cost(candidate: &CandidateProfile, job: &JobProfile) -> f64 {
    let (candidate_loc, job_loc) = match (&candidate.location, &job.location) {
        (Some(c), Some(j)) => (c, j),
        _ => return NEUTRAL_COST,
    };

    if candidate_loc.trim().eq_ignore_ascii_case(job_loc.trim()) {
        return 0.0;
    }

    let tokens = |s: &str| -> HashSet<String> {
        s.split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    };
    let a = tokens(candidate_loc);
    let b = tokens(job_loc);
    if a.is_empty() || b.is_empty() {
        return NEUTRAL_COST;
    }

    let intersection = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    1.0 - intersection / union
}

/// Overall-fit cost: 1 − mean of the factors that are actually available
/// (education ordinal comparison, language coverage, urgency/availability
/// compatibility). Delegates to an injected quality predictor when present,
/// with this heuristic as the fallback on failure.
pub fn overall_fit_cost(
    candidate: &CandidateProfile,
    job: &JobProfile,
    predictor: Option<&dyn MatchQualityPredictor>,
) -> f64 {
    if let Some(service) = predictor {
        match service.predict(candidate, job) {
            Ok(quality) => return (1.0 - quality.clamp(0.0, 1.0)).clamp(0.0, 1.0),
            Err(e) => {
                warn!(
                    candidate = %candidate.id,
                    job = %job.id,
                    "quality predictor failed, using heuristic fit: {e}"
                );
            }
        }
    }

    let mut factors: Vec<f64> = Vec::with_capacity(3);

    if let (Some(have), Some(need)) = (candidate.education, job.required_education) {
        let factor = if have >= need {
            1.0
        } else {
            f64::from(have.ordinal()) / f64::from(need.ordinal())
        };
        factors.push(factor);
    }

    if !job.required_languages.is_empty() {
        let spoken = normalized_set(&candidate.languages);
        let required = normalized_set(&job.required_languages);
        if !required.is_empty() {
            let covered = required.intersection(&spoken).count() as f64;
            factors.push(covered / required.len() as f64);
        }
    }

    if let Some(availability) = candidate.availability {
        factors.push(urgency_compatibility(job.urgency, availability));
    }

    if factors.is_empty() {
        return NEUTRAL_COST;
    }
    let mean = factors.iter().sum::<f64>() / factors.len() as f64;
    1.0 - mean
}

/// Compatibility of a job's urgency with a candidate's start availability.
fn urgency_compatibility(urgency: Urgency, availability: Availability) -> f64 {
    let wait_weeks: f64 = match availability {
        Availability::Immediate => 0.0,
        Availability::TwoWeeks => 2.0,
        Availability::OneMonth => 4.0,
        Availability::ThreeMonths => 13.0,
    };
    let tolerance_weeks = match urgency {
        Urgency::Critical => 1.0,
        Urgency::High => 3.0,
        Urgency::Normal => 8.0,
        Urgency::Low => 16.0,
    };
    if wait_weeks <= tolerance_weeks {
        1.0
    } else {
        (tolerance_weeks / wait_weeks).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;
    use crate::models::EducationLevel;

    fn candidate_with_skills(skills: &[&str]) -> CandidateProfile {
        let mut c = CandidateProfile::new("c1");
        c.skills = skills.iter().map(|s| s.to_string()).collect();
        c
    }

    fn job_with_skills(skills: &[&str]) -> JobProfile {
        let mut j = JobProfile::new("j1");
        j.required_skills = skills.iter().map(|s| s.to_string()).collect();
        j
    }

    struct FixedSimilarity(f64);
    impl SkillSimilarity for FixedSimilarity {
        fn similarity(&self, _: &CandidateProfile, _: &JobProfile) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct BrokenService;
    impl SkillSimilarity for BrokenService {
        fn similarity(&self, _: &CandidateProfile, _: &JobProfile) -> Result<f64> {
            Err(MatchError::Collaborator("model offline".into()))
        }
    }

    #[test]
    fn test_skills_exact_match_is_free() {
        let c = candidate_with_skills(&["rust", "sql"]);
        let j = job_with_skills(&["Rust", "SQL"]);
        assert!(skills_cost(&c, &j, None) < 1e-9);
    }

    #[test]
    fn test_skills_disjoint_is_full_cost() {
        let c = candidate_with_skills(&["cobol"]);
        let j = job_with_skills(&["rust", "sql"]);
        assert!((skills_cost(&c, &j, None) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_skills_overqualification_bonus_capped() {
        let exact = candidate_with_skills(&["rust", "sql"]);
        let extra = candidate_with_skills(&["rust", "sql", "go", "python", "k8s"]);
        let j = job_with_skills(&["rust", "sql"]);

        let exact_cost = skills_cost(&exact, &j, None);
        let extra_cost = skills_cost(&extra, &j, None);
        // Over-qualification dilutes Jaccard but the bonus claws back ≤ 0.1
        let jaccard = 2.0 / 5.0;
        assert!(extra_cost >= 1.0 - (jaccard + 0.1) - 1e-9);
        assert!(exact_cost < extra_cost);
    }

    #[test]
    fn test_skills_no_requirements() {
        let c = candidate_with_skills(&[]);
        let j = job_with_skills(&[]);
        assert_eq!(skills_cost(&c, &j, None), 0.0);
    }

    #[test]
    fn test_skills_service_used_when_present() {
        let c = candidate_with_skills(&["cobol"]);
        let j = job_with_skills(&["rust"]);
        let service = FixedSimilarity(0.9);
        let cost = skills_cost(&c, &j, Some(&service));
        assert!((cost - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_skills_service_failure_falls_back() {
        let c = candidate_with_skills(&["rust"]);
        let j = job_with_skills(&["rust"]);
        let cost = skills_cost(&c, &j, Some(&BrokenService));
        assert!(cost < 1e-9, "should fall back to Jaccard");
    }

    #[test]
    fn test_experience_in_band() {
        let mut c = CandidateProfile::new("c1");
        c.experience_years = 5.0;
        let mut j = JobProfile::new("j1");
        j.min_experience = 3.0;
        j.max_experience = Some(8.0);
        assert_eq!(experience_cost(&c, &j), 0.0);
    }

    #[test]
    fn test_experience_deficit() {
        let mut c = CandidateProfile::new("c1");
        c.experience_years = 2.0;
        let mut j = JobProfile::new("j1");
        j.min_experience = 4.0;
        assert!((experience_cost(&c, &j) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_experience_excess_soft_capped() {
        let mut c = CandidateProfile::new("c1");
        c.experience_years = 30.0;
        let mut j = JobProfile::new("j1");
        j.min_experience = 1.0;
        j.max_experience = Some(5.0);
        assert!((experience_cost(&c, &j) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_experience_no_upper_bound() {
        let mut c = CandidateProfile::new("c1");
        c.experience_years = 25.0;
        let mut j = JobProfile::new("j1");
        j.min_experience = 2.0;
        assert_eq!(experience_cost(&c, &j), 0.0);
    }

    #[test]
    fn test_salary_in_range() {
        let mut c = CandidateProfile::new("c1");
        c.expected_salary = Some(70_000.0);
        let mut j = JobProfile::new("j1");
        j.salary_range = Some((60_000.0, 80_000.0));
        assert_eq!(salary_cost(&c, &j), 0.0);
    }

    #[test]
    fn test_salary_above_range() {
        let mut c = CandidateProfile::new("c1");
        c.expected_salary = Some(100_000.0);
        let mut j = JobProfile::new("j1");
        j.salary_range = Some((60_000.0, 80_000.0));
        assert!((salary_cost(&c, &j) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_salary_missing_data_neutral() {
        let c = CandidateProfile::new("c1");
        let mut j = JobProfile::new("j1");
        j.salary_range = Some((60_000.0, 80_000.0));
        assert_eq!(salary_cost(&c, &j), NEUTRAL_COST);
    }

    #[test]
    fn test_location_exact_match() {
        let mut c = CandidateProfile::new("c1");
        c.location = Some("Berlin".to_string());
        let mut j = JobProfile::new("j1");
        j.location = Some("berlin".to_string());
        assert_eq!(location_cost(&c, &j), 0.0);
    }

    #[test]
    fn test_location_token_overlap() {
        let mut c = CandidateProfile::new("c1");
        c.location = Some("Berlin, Germany".to_string());
        let mut j = JobProfile::new("j1");
        j.location = Some("Munich, Germany".to_string());
        // one shared token of three distinct
        assert!((location_cost(&c, &j) - (1.0 - 1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_location_missing_neutral() {
        let c = CandidateProfile::new("c1");
        let mut j = JobProfile::new("j1");
        j.location = Some("Berlin".to_string());
        assert_eq!(location_cost(&c, &j), NEUTRAL_COST);
    }

    #[test]
    fn test_fit_education_meets_requirement() {
        let mut c = CandidateProfile::new("c1");
        c.education = Some(EducationLevel::Master);
        let mut j = JobProfile::new("j1");
        j.required_education = Some(EducationLevel::Bachelor);
        assert!(overall_fit_cost(&c, &j, None) < 1e-9);
    }

    #[test]
    fn test_fit_education_below_requirement() {
        let mut c = CandidateProfile::new("c1");
        c.education = Some(EducationLevel::Bachelor);
        let mut j = JobProfile::new("j1");
        j.required_education = Some(EducationLevel::Doctorate);
        let cost = overall_fit_cost(&c, &j, None);
        assert!((cost - (1.0 - 3.0 / 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fit_languages_partial_coverage() {
        let mut c = CandidateProfile::new("c1");
        c.languages = vec!["english".to_string()];
        let mut j = JobProfile::new("j1");
        j.required_languages = vec!["english".to_string(), "german".to_string()];
        let cost = overall_fit_cost(&c, &j, None);
        assert!((cost - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_fit_no_data_is_neutral() {
        let c = CandidateProfile::new("c1");
        let j = JobProfile::new("j1");
        assert_eq!(overall_fit_cost(&c, &j, None), NEUTRAL_COST);
    }

    #[test]
    fn test_urgency_availability() {
        assert_eq!(
            urgency_compatibility(Urgency::Critical, Availability::Immediate),
            1.0
        );
        assert!(urgency_compatibility(Urgency::Critical, Availability::ThreeMonths) < 0.1);
        assert_eq!(
            urgency_compatibility(Urgency::Low, Availability::ThreeMonths),
            1.0
        );
    }
}
