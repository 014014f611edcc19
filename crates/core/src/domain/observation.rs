use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::crop::CropName;
use crate::domain::location::LocationName;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservationId(pub i64);

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Environmental conditions measured while the crop was grown.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowingConditions {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Millimetres.
    pub rainfall: f64,
    /// Relative humidity percent.
    pub humidity: f64,
    pub soil_ph: f64,
}

/// A farmer submission before the store assigns it an id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewYieldObservation {
    pub crop_name: CropName,
    pub location_name: LocationName,
    pub season: String,
    pub year: i32,
    pub actual_yield: f64,
    pub conditions: GrowingConditions,
    pub soil_fertility: String,
    pub water_availability: String,
    pub farmer_id: Option<String>,
    pub notes: Option<String>,
}

impl NewYieldObservation {
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("crop_name", self.crop_name.0.as_str()),
            ("location_name", self.location_name.0.as_str()),
            ("season", self.season.as_str()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(DomainError::InvariantViolation(format!(
                "yield observation {field} must not be empty"
            )));
        }

        if !(1000..=9999).contains(&self.year) {
            return Err(DomainError::InvariantViolation(format!(
                "yield observation year {} is not a four-digit year",
                self.year
            )));
        }

        let numeric = [
            ("actual_yield", self.actual_yield),
            ("temperature", self.conditions.temperature),
            ("rainfall", self.conditions.rainfall),
            ("humidity", self.conditions.humidity),
            ("soil_ph", self.conditions.soil_ph),
        ];
        if let Some((field, value)) =
            numeric.iter().find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(DomainError::InvariantViolation(format!(
                "yield observation {field} must be a non-negative number, got {value}"
            )));
        }

        Ok(())
    }

    pub fn into_observation(self, id: ObservationId, created_at: DateTime<Utc>) -> YieldObservation {
        YieldObservation {
            id,
            crop_name: self.crop_name,
            location_name: self.location_name,
            season: self.season,
            year: self.year,
            actual_yield: self.actual_yield,
            conditions: self.conditions,
            soil_fertility: self.soil_fertility,
            water_availability: self.water_availability,
            farmer_id: self.farmer_id,
            notes: self.notes,
            created_at,
        }
    }
}

/// Append-only record of a harvest outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YieldObservation {
    pub id: ObservationId,
    pub crop_name: CropName,
    pub location_name: LocationName,
    pub season: String,
    pub year: i32,
    pub actual_yield: f64,
    pub conditions: GrowingConditions,
    pub soil_fertility: String,
    pub water_availability: String,
    pub farmer_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{GrowingConditions, NewYieldObservation, ObservationId};
    use crate::domain::crop::CropName;
    use crate::domain::location::LocationName;
    use crate::errors::DomainError;

    fn submission() -> NewYieldObservation {
        NewYieldObservation {
            crop_name: CropName("Wheat".to_string()),
            location_name: LocationName("punjab".to_string()),
            season: "winter".to_string(),
            year: 2024,
            actual_yield: 4.2,
            conditions: GrowingConditions {
                temperature: 18.0,
                rainfall: 650.0,
                humidity: 55.0,
                soil_ph: 7.1,
            },
            soil_fertility: "high".to_string(),
            water_availability: "medium".to_string(),
            farmer_id: Some("farmer-17".to_string()),
            notes: None,
        }
    }

    #[test]
    fn valid_submission_passes() {
        submission().validate().expect("valid submission");
    }

    #[test]
    fn two_digit_year_is_rejected() {
        let mut observation = submission();
        observation.year = 24;

        let error = observation.validate().expect_err("year must have four digits");
        assert!(matches!(error, DomainError::InvariantViolation(message) if message.contains("four-digit")));
    }

    #[test]
    fn negative_measurement_is_rejected() {
        let mut observation = submission();
        observation.conditions.rainfall = -1.0;

        let error = observation.validate().expect_err("negative rainfall");
        assert!(matches!(error, DomainError::InvariantViolation(message) if message.contains("rainfall")));
    }

    #[test]
    fn into_observation_keeps_submitted_fields() {
        let created_at = Utc::now();
        let stored = submission().into_observation(ObservationId(7), created_at);

        assert_eq!(stored.id, ObservationId(7));
        assert_eq!(stored.crop_name.0, "Wheat");
        assert_eq!(stored.farmer_id.as_deref(), Some("farmer-17"));
        assert_eq!(stored.created_at, created_at);
    }
}
