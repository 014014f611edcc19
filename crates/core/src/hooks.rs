//! Best-effort notification to an external model after each new observation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::observation::YieldObservation;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("model update rejected: {0}")]
    Rejected(String),
    #[error("model update transport failed: {0}")]
    Transport(String),
}

/// Numeric encoding of an observation as the external model consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
    pub soil_ph: f64,
    pub soil_fertility: u8,
    pub water_availability: u8,
    pub season: u8,
}

impl FeatureVector {
    pub fn from_observation(observation: &YieldObservation) -> Self {
        Self {
            temperature: observation.conditions.temperature,
            rainfall: observation.conditions.rainfall,
            humidity: observation.conditions.humidity,
            soil_ph: observation.conditions.soil_ph,
            soil_fertility: level_ordinal(&observation.soil_fertility),
            water_availability: level_ordinal(&observation.water_availability),
            season: season_ordinal(&observation.season),
        }
    }

    pub fn as_array(&self) -> [f64; 7] {
        [
            self.temperature,
            self.rainfall,
            self.humidity,
            self.soil_ph,
            f64::from(self.soil_fertility),
            f64::from(self.water_availability),
            f64::from(self.season),
        ]
    }
}

/// low=1, medium=2, anything else=3.
pub fn level_ordinal(level: &str) -> u8 {
    match level.trim().to_ascii_lowercase().as_str() {
        "low" => 1,
        "medium" => 2,
        _ => 3,
    }
}

/// spring=1, summer=2, fall=3, anything else=4.
pub fn season_ordinal(season: &str) -> u8 {
    match season.trim().to_ascii_lowercase().as_str() {
        "spring" => 1,
        "summer" => 2,
        "fall" => 3,
        _ => 4,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelUpdate {
    pub dispatch_id: Uuid,
    /// Lowercased; the model keys crops case-insensitively.
    pub crop_name: String,
    pub features: FeatureVector,
    pub observed_yield: f64,
}

impl ModelUpdate {
    pub fn from_observation(observation: &YieldObservation) -> Self {
        Self {
            dispatch_id: Uuid::new_v4(),
            crop_name: observation.crop_name.0.to_lowercase(),
            features: FeatureVector::from_observation(observation),
            observed_yield: observation.actual_yield,
        }
    }
}

#[async_trait]
pub trait ModelUpdateHook: Send + Sync {
    async fn notify(&self, update: ModelUpdate) -> Result<(), HookError>;
}

#[derive(Clone, Debug, Default)]
pub struct NoopModelUpdateHook;

#[async_trait]
impl ModelUpdateHook for NoopModelUpdateHook {
    async fn notify(&self, _update: ModelUpdate) -> Result<(), HookError> {
        Ok(())
    }
}

/// Writes each update to the log instead of a remote model.
#[derive(Clone, Debug, Default)]
pub struct TracingModelUpdateHook;

#[async_trait]
impl ModelUpdateHook for TracingModelUpdateHook {
    async fn notify(&self, update: ModelUpdate) -> Result<(), HookError> {
        info!(
            event_name = "yield.model_hook.dispatched",
            dispatch_id = %update.dispatch_id,
            crop_name = %update.crop_name,
            observed_yield = update.observed_yield,
            features = ?update.features.as_array(),
            "model update dispatched"
        );
        Ok(())
    }
}

/// Keeps every update it receives; optionally fails each call after recording.
#[derive(Clone, Debug, Default)]
pub struct RecordingModelUpdateHook {
    updates: Arc<Mutex<Vec<ModelUpdate>>>,
    failure: Option<HookError>,
}

impl RecordingModelUpdateHook {
    pub fn failing(error: HookError) -> Self {
        Self { updates: Arc::default(), failure: Some(error) }
    }

    pub fn updates(&self) -> Vec<ModelUpdate> {
        match self.updates.lock() {
            Ok(updates) => updates.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ModelUpdateHook for RecordingModelUpdateHook {
    async fn notify(&self, update: ModelUpdate) -> Result<(), HookError> {
        match self.updates.lock() {
            Ok(mut updates) => updates.push(update),
            Err(poisoned) => poisoned.into_inner().push(update),
        }

        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{
        level_ordinal, season_ordinal, FeatureVector, HookError, ModelUpdate, ModelUpdateHook,
        RecordingModelUpdateHook, TracingModelUpdateHook,
    };
    use crate::domain::crop::CropName;
    use crate::domain::location::LocationName;
    use crate::domain::observation::{GrowingConditions, ObservationId, YieldObservation};

    fn observation() -> YieldObservation {
        YieldObservation {
            id: ObservationId(3),
            crop_name: CropName("Basmati Rice".to_string()),
            location_name: LocationName("punjab".to_string()),
            season: "Summer".to_string(),
            year: 2024,
            actual_yield: 4.8,
            conditions: GrowingConditions {
                temperature: 31.0,
                rainfall: 900.0,
                humidity: 72.0,
                soil_ph: 6.8,
            },
            soil_fertility: "high".to_string(),
            water_availability: "LOW".to_string(),
            farmer_id: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ordinals_follow_model_encoding() {
        assert_eq!(level_ordinal("low"), 1);
        assert_eq!(level_ordinal("Medium"), 2);
        assert_eq!(level_ordinal("high"), 3);
        assert_eq!(level_ordinal("unknown"), 3);
        assert_eq!(season_ordinal("spring"), 1);
        assert_eq!(season_ordinal("summer"), 2);
        assert_eq!(season_ordinal("fall"), 3);
        assert_eq!(season_ordinal("rainy"), 4);
    }

    #[test]
    fn update_carries_lowercased_crop_and_features() {
        let update = ModelUpdate::from_observation(&observation());

        assert_eq!(update.crop_name, "basmati rice");
        assert_eq!(update.observed_yield, 4.8);
        assert_eq!(
            update.features,
            FeatureVector {
                temperature: 31.0,
                rainfall: 900.0,
                humidity: 72.0,
                soil_ph: 6.8,
                soil_fertility: 3,
                water_availability: 1,
                season: 2,
            }
        );
        assert_eq!(update.features.as_array()[6], 2.0);
    }

    #[tokio::test]
    async fn recording_hook_keeps_updates_even_when_failing() {
        let hook = RecordingModelUpdateHook::failing(HookError::Transport("offline".to_string()));

        let result = hook.notify(ModelUpdate::from_observation(&observation())).await;
        assert_eq!(result, Err(HookError::Transport("offline".to_string())));
        assert_eq!(hook.updates().len(), 1);
    }

    #[tokio::test]
    async fn tracing_hook_always_accepts() {
        let result = TracingModelUpdateHook.notify(ModelUpdate::from_observation(&observation())).await;
        assert_eq!(result, Ok(()));
    }
}
