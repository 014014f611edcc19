use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Ordinal three-step rating shared by soil fertility, water need, rainfall and
/// water availability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Low, Level::Medium, Level::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn parse_strict(kind: &'static str, value: &str) -> Result<Self, DomainError> {
        Self::parse(value)
            .ok_or_else(|| DomainError::UnknownCategory { kind, value: value.to_string() })
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Climate suitability, ordered worst to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityLevel {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl CompatibilityLevel {
    pub const ALL: [CompatibilityLevel; 4] = [
        CompatibilityLevel::Poor,
        CompatibilityLevel::Fair,
        CompatibilityLevel::Good,
        CompatibilityLevel::Excellent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "poor" => Some(Self::Poor),
            "fair" => Some(Self::Fair),
            "good" => Some(Self::Good),
            "excellent" => Some(Self::Excellent),
            _ => None,
        }
    }

    pub fn parse_strict(value: &str) -> Result<Self, DomainError> {
        Self::parse(value).ok_or_else(|| DomainError::UnknownCategory {
            kind: "climate match",
            value: value.to_string(),
        })
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
