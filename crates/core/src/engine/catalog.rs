use serde::{Deserialize, Serialize};

use crate::domain::crop::{CategorySet, CropProfile};
use crate::errors::DomainError;

/// How query tokens are compared against a crop's category sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Token is a substring of the comma-joined set (`sand` matches `sandy`).
    /// Compatible with legacy-encoded catalog data.
    #[default]
    Substring,
    /// Token must equal one of the set's tags.
    SetMembership,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Substring => "substring",
            Self::SetMembership => "set_membership",
        }
    }

    fn matches(&self, set: &CategorySet, token: &str) -> bool {
        match self {
            Self::Substring => set.encoded_contains(token),
            Self::SetMembership => set.contains(token),
        }
    }
}

impl std::str::FromStr for MatchMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "set_membership" => Ok(Self::SetMembership),
            other => Err(DomainError::UnknownCategory { kind: "match mode", value: other.to_string() }),
        }
    }
}

/// Environmental constraints a recommended crop must satisfy.
///
/// Soil type, climate and season are mandatory and case-sensitive. The optional
/// filters impose no constraint when absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropQuery {
    pub soil_type: String,
    pub climate: String,
    pub season: String,
    pub humidity: Option<String>,
    pub soil_fertility: Option<String>,
}

impl CropQuery {
    pub fn new(
        soil_type: impl Into<String>,
        climate: impl Into<String>,
        season: impl Into<String>,
    ) -> Self {
        Self {
            soil_type: soil_type.into(),
            climate: climate.into(),
            season: season.into(),
            humidity: None,
            soil_fertility: None,
        }
    }

    pub fn with_humidity(mut self, humidity: Option<String>) -> Self {
        self.humidity = humidity;
        self
    }

    pub fn with_soil_fertility(mut self, soil_fertility: Option<String>) -> Self {
        self.soil_fertility = soil_fertility;
        self
    }
}

const CORE_POINTS: u32 = 3;
const PREFERENCE_POINTS: u32 = 2;
const RANGE_POINTS: u32 = 1;

/// Lowest match percentage [`Catalog::rank`] keeps.
pub const MIN_MATCH_PERCENT: f64 = 60.0;

/// Conditions scored by [`Catalog::rank`].
///
/// Soil type, climate and season always count. The optional conditions count
/// only when supplied, and the range conditions only for crops that carry the
/// matching range.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RankQuery {
    pub soil_type: String,
    pub climate: String,
    pub season: String,
    pub humidity: Option<String>,
    pub soil_fertility: Option<String>,
    pub soil_ph: Option<f64>,
    pub temperature: Option<f64>,
}

impl From<&CropQuery> for RankQuery {
    fn from(query: &CropQuery) -> Self {
        Self {
            soil_type: query.soil_type.clone(),
            climate: query.climate.clone(),
            season: query.season.clone(),
            humidity: query.humidity.clone(),
            soil_fertility: query.soil_fertility.clone(),
            soil_ph: None,
            temperature: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDetails {
    pub total_score: u32,
    pub max_possible: u32,
    pub matched: Vec<&'static str>,
    pub missed: Vec<&'static str>,
}

impl ScoreDetails {
    fn score(&mut self, criterion: &'static str, points: u32, matched: bool) {
        self.max_possible += points;
        if matched {
            self.total_score += points;
            self.matched.push(criterion);
        } else {
            self.missed.push(criterion);
        }
    }

    pub fn match_percent(&self) -> f64 {
        if self.max_possible == 0 {
            return 0.0;
        }
        f64::from(self.total_score) / f64::from(self.max_possible) * 100.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedCrop<'c> {
    pub crop: &'c CropProfile,
    pub match_percent: f64,
    pub score_details: ScoreDetails,
}

/// Read-only crop reference data in storage order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    crops: Vec<CropProfile>,
    match_mode: MatchMode,
}

impl Catalog {
    pub fn new(crops: Vec<CropProfile>) -> Self {
        Self { crops, match_mode: MatchMode::default() }
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn crops(&self) -> &[CropProfile] {
        &self.crops
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Crop detail lookup; names compare case-insensitively.
    pub fn find(&self, name: &str) -> Option<&CropProfile> {
        let name = name.trim();
        self.crops.iter().find(|crop| crop.name.0.eq_ignore_ascii_case(name))
    }

    /// Every crop satisfying all active constraints, in storage order.
    pub fn filter(&self, query: &CropQuery) -> Vec<&CropProfile> {
        self.crops.iter().filter(|crop| self.accepts(crop, query)).collect()
    }

    /// Partial-credit alternative to [`Catalog::filter`]: every crop scoring at
    /// least [`MIN_MATCH_PERCENT`], best first, ties in storage order.
    ///
    /// Category tags compare case-insensitively and exactly, whatever the
    /// catalog's match mode.
    pub fn rank(&self, query: &RankQuery) -> Vec<RankedCrop<'_>> {
        let mut ranked: Vec<RankedCrop<'_>> = self
            .crops
            .iter()
            .map(|crop| {
                let score_details = score(crop, query);
                RankedCrop { crop, match_percent: score_details.match_percent(), score_details }
            })
            .filter(|ranked| ranked.match_percent >= MIN_MATCH_PERCENT)
            .collect();
        ranked.sort_by(|a, b| b.match_percent.total_cmp(&a.match_percent));
        ranked
    }

    fn accepts(&self, crop: &CropProfile, query: &CropQuery) -> bool {
        let mode = self.match_mode;

        mode.matches(&crop.soil_types, &query.soil_type)
            && mode.matches(&crop.climates, &query.climate)
            && mode.matches(&crop.seasons, &query.season)
            && query
                .humidity
                .as_deref()
                .map_or(true, |humidity| mode.matches(&crop.humidity_preference, humidity))
            && query
                .soil_fertility
                .as_deref()
                .map_or(true, |fertility| mode.matches(&crop.soil_fertility, fertility))
    }
}

fn score(crop: &CropProfile, query: &RankQuery) -> ScoreDetails {
    let mut details = ScoreDetails::default();

    details.score("soil_type", CORE_POINTS, crop.soil_types.contains_ignore_case(&query.soil_type));
    details.score("climate", CORE_POINTS, crop.climates.contains_ignore_case(&query.climate));
    details.score("season", CORE_POINTS, crop.seasons.contains_ignore_case(&query.season));

    if let Some(humidity) = query.humidity.as_deref() {
        let matched = crop.humidity_preference.contains_ignore_case(humidity);
        details.score("humidity", PREFERENCE_POINTS, matched);
    }
    if let Some(fertility) = query.soil_fertility.as_deref() {
        let matched = crop.soil_fertility.contains_ignore_case(fertility);
        details.score("soil_fertility", PREFERENCE_POINTS, matched);
    }

    if let (Some(ph), Some(range)) = (query.soil_ph, crop.ph_range) {
        details.score("soil_ph", RANGE_POINTS, range.contains(ph));
    }
    if let (Some(temperature), Some(range)) = (query.temperature, crop.temperature_range) {
        details.score("temperature", RANGE_POINTS, range.contains(temperature));
    }

    details
}
