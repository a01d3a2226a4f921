use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

/// Ordinal education levels, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl EducationLevel {
    /// 1-based ordinal used by the overall-fit heuristic.
    pub fn ordinal(&self) -> u8 {
        match self {
            EducationLevel::HighSchool => 1,
            EducationLevel::Associate => 2,
            EducationLevel::Bachelor => 3,
            EducationLevel::Master => 4,
            EducationLevel::Doctorate => 5,
        }
    }
}

/// How soon a candidate can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Immediate,
    TwoWeeks,
    OneMonth,
    ThreeMonths,
}

/// How urgently a job needs to be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Normal,
    High,
    Critical,
}

/// Candidate profile with skills, experience and preference data.
///
/// Owned by the caller and treated as immutable for the duration of one
/// matching request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(rename = "experienceYears", default)]
    pub experience_years: f64,
    #[serde(rename = "expectedSalary", default)]
    pub expected_salary: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub education: Option<EducationLevel>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub availability: Option<Availability>,
    /// Externally computed embedding features, consumed only by an injected
    /// similarity collaborator.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl CandidateProfile {
    /// Minimal profile with empty defaults, used as a builder base.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            skills: Vec::new(),
            experience_years: 0.0,
            expected_salary: None,
            location: None,
            education: None,
            languages: Vec::new(),
            availability: None,
            embedding: None,
        }
    }

    /// Validate invariants once, at request entry.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(MatchError::InvalidInput("candidate id is empty".into()));
        }
        if !self.experience_years.is_finite() || self.experience_years < 0.0 {
            return Err(MatchError::InvalidInput(format!(
                "candidate '{}' has invalid experience: {}",
                self.id, self.experience_years
            )));
        }
        if let Some(salary) = self.expected_salary {
            if !salary.is_finite() || salary < 0.0 {
                return Err(MatchError::InvalidInput(format!(
                    "candidate '{}' has invalid salary expectation: {}",
                    self.id, salary
                )));
            }
        }
        Ok(())
    }
}

/// Job opening profile with requirements and range data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProfile {
    pub id: String,
    #[serde(rename = "requiredSkills", default)]
    pub required_skills: Vec<String>,
    #[serde(rename = "minExperience", default)]
    pub min_experience: f64,
    #[serde(rename = "maxExperience", default)]
    pub max_experience: Option<f64>,
    /// (lower, upper) annual salary bounds.
    #[serde(rename = "salaryRange", default)]
    pub salary_range: Option<(f64, f64)>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "requiredEducation", default)]
    pub required_education: Option<EducationLevel>,
    #[serde(rename = "requiredLanguages", default)]
    pub required_languages: Vec<String>,
    #[serde(default = "default_urgency")]
    pub urgency: Urgency,
    /// Historical performance features for the quality predictor.
    #[serde(default)]
    pub history: Option<Vec<f32>>,
}

fn default_urgency() -> Urgency {
    Urgency::Normal
}

impl JobProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            required_skills: Vec::new(),
            min_experience: 0.0,
            max_experience: None,
            salary_range: None,
            location: None,
            required_education: None,
            required_languages: Vec::new(),
            urgency: Urgency::Normal,
            history: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(MatchError::InvalidInput("job id is empty".into()));
        }
        if !self.min_experience.is_finite() || self.min_experience < 0.0 {
            return Err(MatchError::InvalidInput(format!(
                "job '{}' has invalid min experience: {}",
                self.id, self.min_experience
            )));
        }
        if let Some(max) = self.max_experience {
            if !max.is_finite() || max < self.min_experience {
                return Err(MatchError::InvalidInput(format!(
                    "job '{}' has max experience below min: {}",
                    self.id, max
                )));
            }
        }
        if let Some((lower, upper)) = self.salary_range {
            if !lower.is_finite() || !upper.is_finite() || lower < 0.0 || upper < lower {
                return Err(MatchError::InvalidInput(format!(
                    "job '{}' has invalid salary range: ({}, {})",
                    self.id, lower, upper
                )));
            }
        }
        Ok(())
    }
}

/// One ranked entry in an actor's preference list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preference {
    #[serde(rename = "actorId")]
    pub actor_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub score: f64,
    /// 1 = most preferred; ranks are unique per actor.
    pub rank: usize,
    #[serde(default)]
    pub reasons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_ordering() {
        assert!(EducationLevel::Doctorate > EducationLevel::Bachelor);
        assert!(EducationLevel::HighSchool < EducationLevel::Associate);
        assert_eq!(EducationLevel::Master.ordinal(), 4);
    }

    #[test]
    fn test_candidate_validation() {
        let mut candidate = CandidateProfile::new("c1");
        assert!(candidate.validate().is_ok());

        candidate.experience_years = f64::NAN;
        assert!(candidate.validate().is_err());

        candidate.experience_years = 3.0;
        candidate.expected_salary = Some(-100.0);
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn test_job_validation() {
        let mut job = JobProfile::new("j1");
        assert!(job.validate().is_ok());

        job.salary_range = Some((80_000.0, 60_000.0));
        assert!(job.validate().is_err());

        job.salary_range = Some((60_000.0, 80_000.0));
        job.min_experience = 5.0;
        job.max_experience = Some(2.0);
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(CandidateProfile::new("").validate().is_err());
        assert!(JobProfile::new("").validate().is_err());
    }

    #[test]
    fn test_profile_serde_round_trip() {
        let mut candidate = CandidateProfile::new("c1");
        candidate.skills = vec!["rust".to_string()];
        candidate.education = Some(EducationLevel::Master);

        let json = serde_json::to_string(&candidate).unwrap();
        let back: CandidateProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "c1");
        assert_eq!(back.education, Some(EducationLevel::Master));
    }
}
