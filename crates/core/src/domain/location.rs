use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::domain::crop::CategorySet;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationName(pub String);

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeasonMonths {
    pub season: String,
    pub months: Vec<String>,
}

/// Season → months mapping in declared order.
///
/// Months are expected to be unique across seasons; when they are not, the
/// first declared season wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeasonMapping {
    entries: Vec<SeasonMonths>,
}

impl SeasonMapping {
    pub fn new(entries: Vec<SeasonMonths>) -> Self {
        Self { entries }
    }

    /// Decodes the legacy JSON object form: `{"winter": ["december", ...], ...}`.
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw).map_err(|error| {
            DomainError::InvariantViolation(format!("malformed season mapping: {error}"))
        })
    }

    pub fn to_json(&self) -> String {
        let object = self
            .entries
            .iter()
            .map(|entry| (entry.season.clone(), serde_json::Value::from(entry.months.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object).to_string()
    }

    pub fn entries(&self) -> &[SeasonMonths] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First season (declared order) whose months contain `month`, ignoring case.
    pub fn season_for_month(&self, month: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.months.iter().any(|candidate| candidate.eq_ignore_ascii_case(month)))
            .map(|entry| entry.season.as_str())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for entry in &self.entries {
            if entry.season.trim().is_empty() {
                return Err(DomainError::InvariantViolation(
                    "season mapping contains an unnamed season".to_string(),
                ));
            }
            if entry.months.is_empty() {
                return Err(DomainError::InvariantViolation(format!(
                    "season `{}` has no months",
                    entry.season
                )));
            }
        }
        Ok(())
    }
}

impl Serialize for SeasonMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.season, &entry.months)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeasonMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // serde_json's map keeps insertion order (preserve_order), which carries
        // the declared season order through.
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut entries = Vec::with_capacity(object.len());

        for (season, months) in object {
            let months = months
                .as_array()
                .ok_or_else(|| de::Error::custom(format!("season `{season}` must map to a list")))?
                .iter()
                .map(|month| {
                    month.as_str().map(str::to_string).ok_or_else(|| {
                        de::Error::custom(format!("season `{season}` contains a non-string month"))
                    })
                })
                .collect::<Result<Vec<_>, D::Error>>()?;
            entries.push(SeasonMonths { season, months });
        }

        Ok(Self { entries })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationProfile {
    pub name: LocationName,
    /// Ordered; the first entry is the location's default soil type.
    pub soil_types: CategorySet,
    pub climate: String,
    pub rainfall: String,
    pub humidity: Option<String>,
    pub seasons: SeasonMapping,
}

impl LocationProfile {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.0.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "location name must not be empty".to_string(),
            ));
        }
        if self.climate.trim().is_empty() || self.rainfall.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "location `{}` requires climate and rainfall categories",
                self.name
            )));
        }
        self.seasons.validate()
    }

    pub fn default_soil_type(&self) -> Option<&str> {
        self.soil_types.first()
    }
}
