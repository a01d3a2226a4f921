use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    /// Proposal cap for the deferred-acceptance loop.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Per-axis cap on solver input matrices.
    #[serde(default = "default_max_matrix_dimension")]
    pub max_matrix_dimension: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_matrix_dimension: default_max_matrix_dimension(),
        }
    }
}

fn default_max_iterations() -> usize {
    1000
}
fn default_max_matrix_dimension() -> usize {
    10_000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_skills_weight")]
    pub skills: f64,
    #[serde(default = "default_experience_weight")]
    pub experience: f64,
    #[serde(default = "default_salary_weight")]
    pub salary: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_overall_fit_weight")]
    pub overall_fit: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            skills: default_skills_weight(),
            experience: default_experience_weight(),
            salary: default_salary_weight(),
            location: default_location_weight(),
            overall_fit: default_overall_fit_weight(),
        }
    }
}

fn default_skills_weight() -> f64 { 0.30 }
fn default_experience_weight() -> f64 { 0.25 }
fn default_salary_weight() -> f64 { 0.15 }
fn default_location_weight() -> f64 { 0.15 }
fn default_overall_fit_weight() -> f64 { 0.15 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with TALENT__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g. TALENT__MATCHING__MAX_ITERATIONS -> matching.max_iterations
            .add_source(
                Environment::with_prefix("TALENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("TALENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
