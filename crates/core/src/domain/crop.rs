use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CropName(pub String);

impl fmt::Display for CropName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered set of category tags (soil types, climates, seasons, ...).
///
/// Persisted in the legacy comma-joined form, e.g. `loamy,sandy loam,clay`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            tags.into_iter()
                .map(Into::into)
                .map(|tag: String| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect(),
        )
    }

    pub fn from_encoded(encoded: &str) -> Self {
        Self::new(encoded.split(','))
    }

    pub fn encoded(&self) -> String {
        self.0.join(",")
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Exact tag membership.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|candidate| candidate == tag)
    }

    pub fn contains_ignore_case(&self, tag: &str) -> bool {
        self.0.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag.trim()))
    }

    /// Substring match against the comma-joined encoding, so `sand` matches `sandy`.
    pub fn encoded_contains(&self, token: &str) -> bool {
        self.encoded().contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Inclusive numeric bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Parses the legacy `min-max` form, e.g. `6.0-7.5` or `-5-30`.
    pub fn from_encoded(encoded: &str) -> Option<Self> {
        let encoded = encoded.trim();
        encoded.char_indices().filter(|(index, c)| *c == '-' && *index > 0).find_map(|(index, _)| {
            let min = encoded[..index].trim().parse::<f64>().ok()?;
            let max = encoded[index + 1..].trim().parse::<f64>().ok()?;
            Some(Self::new(min, max))
        })
    }

    pub fn encoded(&self) -> String {
        format!("{}-{}", self.min, self.max)
    }

    fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub name: CropName,
    pub soil_types: CategorySet,
    pub climates: CategorySet,
    pub seasons: CategorySet,
    pub water_need: String,
    pub humidity_preference: CategorySet,
    pub soil_fertility: CategorySet,
    pub base_yield_min: f64,
    pub base_yield_max: f64,
    pub yield_unit: String,
    /// Soil pH the crop tolerates, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_range: Option<ValueRange>,
    /// Growing temperature in degrees Celsius, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_range: Option<ValueRange>,
}

impl CropProfile {
    pub const DEFAULT_YIELD_UNIT: &'static str = "tons";

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.0.trim().is_empty() {
            return Err(DomainError::InvariantViolation("crop name must not be empty".to_string()));
        }

        let sets = [
            ("soil_types", &self.soil_types),
            ("climates", &self.climates),
            ("seasons", &self.seasons),
            ("humidity_preference", &self.humidity_preference),
            ("soil_fertility", &self.soil_fertility),
        ];
        if let Some((field, _)) = sets.iter().find(|(_, set)| set.is_empty()) {
            return Err(DomainError::InvariantViolation(format!(
                "crop `{}` has an empty {field} set",
                self.name
            )));
        }

        if self.water_need.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "crop `{}` has no water need",
                self.name
            )));
        }

        let finite = self.base_yield_min.is_finite() && self.base_yield_max.is_finite();
        if !finite || self.base_yield_min < 0.0 {
            return Err(DomainError::InvariantViolation(format!(
                "crop `{}` base yield must be finite and non-negative",
                self.name
            )));
        }

        if self.base_yield_min > self.base_yield_max {
            return Err(DomainError::InvariantViolation(format!(
                "crop `{}` base yield min {} exceeds max {}",
                self.name, self.base_yield_min, self.base_yield_max
            )));
        }

        let ranges = [("ph_range", self.ph_range), ("temperature_range", self.temperature_range)];
        if let Some((field, _)) =
            ranges.iter().find(|(_, range)| range.is_some_and(|range| !range.is_well_formed()))
        {
            return Err(DomainError::InvariantViolation(format!(
                "crop `{}` has a malformed {field}",
                self.name
            )));
        }

        Ok(())
    }

    /// The climate used for compatibility lookups: the first one listed.
    pub fn primary_climate(&self) -> Option<&str> {
        self.climates.first()
    }
}
