//! Converts qualitative growing factors plus management quality into a
//! quantitative yield estimate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::crop::{CropName, CropProfile};
use crate::domain::levels::{CompatibilityLevel, Level};

/// Multiplier applied when a level is not recognized.
pub const NEUTRAL_SOIL_FACTOR: f64 = 1.0;
pub const NEUTRAL_WATER_FACTOR: f64 = 1.0;
pub const NEUTRAL_CLIMATE_FACTOR: f64 = 0.9;

const PESSIMISTIC_MARGIN: f64 = 0.9;
const OPTIMISTIC_MARGIN: f64 = 1.1;
const RANGE_LOW: f64 = 0.8;
const RANGE_HIGH: f64 = 1.2;

/// Caller-supplied estimation inputs. Levels are free-form so that unrecognized
/// values degrade to neutral multipliers instead of failing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YieldInputs {
    pub soil_fertility: String,
    pub water_availability: String,
    pub climate_match: String,
    /// Proxy for farming practice quality; clamped to `[0, 1]`.
    pub management_quality: f64,
    /// Hectares.
    pub land_area: f64,
}

impl YieldInputs {
    pub fn from_levels(
        soil_fertility: &str,
        water_availability: Level,
        climate_match: CompatibilityLevel,
        management_quality: f64,
        land_area: f64,
    ) -> Self {
        Self {
            soil_fertility: soil_fertility.to_string(),
            water_availability: water_availability.as_str().to_string(),
            climate_match: climate_match.as_str().to_string(),
            management_quality,
            land_area,
        }
    }
}

/// Every qualitative level and the multiplier it produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YieldFactors {
    pub soil_fertility: String,
    pub soil_factor: f64,
    pub water_availability: String,
    pub water_factor: f64,
    pub climate_match: String,
    pub climate_factor: f64,
    pub management_quality: f64,
    pub combined_factor: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct YieldBand {
    pub low: f64,
    pub expected: f64,
    pub high: f64,
}

impl YieldBand {
    pub fn around(expected: f64) -> Self {
        Self { low: expected * RANGE_LOW, expected, high: expected * RANGE_HIGH }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YieldEstimate {
    pub crop_name: CropName,
    pub per_area_yield: f64,
    pub total_yield: f64,
    pub range: YieldBand,
    pub land_area: f64,
    pub unit: String,
    pub factors: YieldFactors,
}

pub trait YieldEstimator: Send + Sync {
    fn estimate(&self, crop: &CropProfile, inputs: &YieldInputs) -> YieldEstimate;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicYieldEstimator;

impl YieldEstimator for DeterministicYieldEstimator {
    fn estimate(&self, crop: &CropProfile, inputs: &YieldInputs) -> YieldEstimate {
        estimate_yield(crop, inputs)
    }
}

pub fn soil_factor(soil_fertility: &str) -> f64 {
    match Level::parse(soil_fertility) {
        Some(Level::Low) => 0.7,
        Some(Level::Medium) => 1.0,
        Some(Level::High) => 1.3,
        None => {
            debug!(
                event_name = "yield.estimate.unrecognized_level",
                factor = "soil_fertility",
                value = soil_fertility,
                "defaulting to neutral multiplier"
            );
            NEUTRAL_SOIL_FACTOR
        }
    }
}

pub fn water_factor(water_availability: &str) -> f64 {
    match Level::parse(water_availability) {
        Some(Level::Low) => 0.6,
        Some(Level::Medium) => 1.0,
        Some(Level::High) => 1.2,
        None => {
            debug!(
                event_name = "yield.estimate.unrecognized_level",
                factor = "water_availability",
                value = water_availability,
                "defaulting to neutral multiplier"
            );
            NEUTRAL_WATER_FACTOR
        }
    }
}

pub fn climate_factor(climate_match: &str) -> f64 {
    match CompatibilityLevel::parse(climate_match) {
        Some(CompatibilityLevel::Poor) => 0.6,
        Some(CompatibilityLevel::Fair) => 0.9,
        Some(CompatibilityLevel::Good) => 1.0,
        Some(CompatibilityLevel::Excellent) => 1.2,
        None => {
            debug!(
                event_name = "yield.estimate.unrecognized_level",
                factor = "climate_match",
                value = climate_match,
                "defaulting to neutral multiplier"
            );
            NEUTRAL_CLIMATE_FACTOR
        }
    }
}

fn clamp_management(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Linear interpolation between the pessimistic adjusted minimum
/// (management 0) and the optimistic adjusted maximum (management 1).
pub fn estimate_yield(crop: &CropProfile, inputs: &YieldInputs) -> YieldEstimate {
    let soil = soil_factor(&inputs.soil_fertility);
    let water = water_factor(&inputs.water_availability);
    let climate = climate_factor(&inputs.climate_match);
    let combined = soil * water * climate;

    let adjusted_min = crop.base_yield_min * combined * PESSIMISTIC_MARGIN;
    let adjusted_max = crop.base_yield_max * combined * OPTIMISTIC_MARGIN;

    let management = clamp_management(inputs.management_quality);
    let per_area_yield = adjusted_min + management * (adjusted_max - adjusted_min);
    let total_yield = per_area_yield * inputs.land_area;

    YieldEstimate {
        crop_name: crop.name.clone(),
        per_area_yield,
        total_yield,
        range: YieldBand::around(total_yield),
        land_area: inputs.land_area,
        unit: crop.yield_unit.clone(),
        factors: YieldFactors {
            soil_fertility: inputs.soil_fertility.clone(),
            soil_factor: soil,
            water_availability: inputs.water_availability.clone(),
            water_factor: water,
            climate_match: inputs.climate_match.clone(),
            climate_factor: climate,
            management_quality: management,
            combined_factor: combined,
        },
    }
}
