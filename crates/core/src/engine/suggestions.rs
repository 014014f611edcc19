//! Which change to a controllable growing factor would raise a yield estimate.

use serde::{Deserialize, Serialize};

use crate::domain::crop::CropProfile;
use crate::domain::levels::Level;
use crate::engine::estimator::{YieldEstimate, YieldEstimator, YieldInputs};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustableFactor {
    SoilFertility,
    WaterAvailability,
}

impl AdjustableFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoilFertility => "soil_fertility",
            Self::WaterAvailability => "water_availability",
        }
    }

    fn advice(&self, level: Level) -> String {
        match self {
            Self::SoilFertility => format!("Increase soil fertility to {}", level.as_str()),
            Self::WaterAvailability => {
                format!("Adjust irrigation to achieve {} water availability", level.as_str())
            }
        }
    }

    fn apply(&self, inputs: &YieldInputs, level: Level) -> YieldInputs {
        let mut adjusted = inputs.clone();
        match self {
            Self::SoilFertility => adjusted.soil_fertility = level.as_str().to_string(),
            Self::WaterAvailability => adjusted.water_availability = level.as_str().to_string(),
        }
        adjusted
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YieldSuggestion {
    pub factor: AdjustableFactor,
    pub level: Level,
    pub suggestion: String,
    /// Gain in total yield over the current estimate, always positive.
    pub potential_improvement: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub current: YieldEstimate,
    /// Largest improvement first; ties keep soil fertility ahead of water.
    pub suggestions: Vec<YieldSuggestion>,
}

/// Re-estimates with every level of soil fertility and water availability,
/// one factor at a time, and keeps the levels that beat the current total.
pub fn optimization_suggestions<E>(
    estimator: &E,
    crop: &CropProfile,
    inputs: &YieldInputs,
) -> OptimizationReport
where
    E: YieldEstimator + ?Sized,
{
    let current = estimator.estimate(crop, inputs);

    let mut suggestions: Vec<YieldSuggestion> =
        [AdjustableFactor::SoilFertility, AdjustableFactor::WaterAvailability]
            .into_iter()
            .flat_map(|factor| Level::ALL.into_iter().map(move |level| (factor, level)))
            .filter_map(|(factor, level)| {
                let candidate = estimator.estimate(crop, &factor.apply(inputs, level));
                let improvement = candidate.total_yield - current.total_yield;
                (improvement > 0.0).then(|| YieldSuggestion {
                    factor,
                    level,
                    suggestion: factor.advice(level),
                    potential_improvement: improvement,
                })
            })
            .collect();
    suggestions.sort_by(|a, b| b.potential_improvement.total_cmp(&a.potential_improvement));

    OptimizationReport { current, suggestions }
}
