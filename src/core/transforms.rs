use std::fmt;
use std::sync::Arc;

/// Caller-supplied transform function.
pub type CustomFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Transform applied to a raw criterion cost before weighting.
///
/// All variants map [0,1] into [0,1]; inputs are clamped to that range first.
#[derive(Clone)]
pub enum Transform {
    /// Identity.
    Linear,
    /// `cost^alpha`; amplifies separation between good and bad pairs.
    Exponential { alpha: f64 },
    /// `ln(1 + cost) / ln 2`; compresses separation.
    Logarithmic,
    /// `1 / (1 + e^(-steepness * (cost - midpoint)))`.
    Sigmoid { steepness: f64, midpoint: f64 },
    Custom(CustomFn),
}

impl Transform {
    /// Exponential with the default amplification factor.
    pub fn exponential() -> Self {
        Transform::Exponential { alpha: 2.0 }
    }

    /// Sigmoid centered at 0.5 with a moderate slope.
    pub fn sigmoid() -> Self {
        Transform::Sigmoid {
            steepness: 10.0,
            midpoint: 0.5,
        }
    }

    pub fn apply(&self, cost: f64) -> f64 {
        let cost = cost.clamp(0.0, 1.0);
        match self {
            Transform::Linear => cost,
            Transform::Exponential { alpha } => cost.powf(*alpha),
            Transform::Logarithmic => (1.0 + cost).ln() / std::f64::consts::LN_2,
            Transform::Sigmoid {
                steepness,
                midpoint,
            } => 1.0 / (1.0 + (-steepness * (cost - midpoint)).exp()),
            Transform::Custom(f) => f(cost).clamp(0.0, 1.0),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Linear => write!(f, "Linear"),
            Transform::Exponential { alpha } => write!(f, "Exponential({alpha})"),
            Transform::Logarithmic => write!(f, "Logarithmic"),
            Transform::Sigmoid {
                steepness,
                midpoint,
            } => write!(f, "Sigmoid({steepness}, {midpoint})"),
            Transform::Custom(_) => write!(f, "Custom"),
        }
    }
}
