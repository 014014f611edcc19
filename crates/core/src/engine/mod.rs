pub mod catalog;
pub mod compatibility;
pub mod estimator;
pub mod history;
pub mod season;
pub mod suggestions;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::crop::{CropName, CropProfile};
use crate::domain::levels::{CompatibilityLevel, Level};
use crate::domain::location::{LocationName, LocationProfile};

use self::{
    catalog::{Catalog, CropQuery, RankQuery, RankedCrop},
    compatibility::{climate_match, water_availability},
    estimator::{DeterministicYieldEstimator, YieldEstimate, YieldEstimator, YieldInputs},
    season::{resolve_season, SeasonResolution},
    suggestions::{optimization_suggestions, OptimizationReport},
};

pub const DEFAULT_MANAGEMENT_QUALITY: f64 = 0.8;
pub const FALLBACK_SOIL_TYPE: &str = "loamy";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvisorSettings {
    pub default_management_quality: f64,
    /// Used when a location lists no soil types.
    pub fallback_soil_type: String,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            default_management_quality: DEFAULT_MANAGEMENT_QUALITY,
            fallback_soil_type: FALLBACK_SOIL_TYPE.to_string(),
        }
    }
}

/// Caller-supplied values that take precedence over the location profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOverrides {
    pub humidity: Option<String>,
    pub soil_fertility: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationRecommendation {
    pub location: LocationName,
    pub season: SeasonResolution,
    pub query: CropQuery,
    pub crops: Vec<CropProfile>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationEstimate {
    pub location: LocationName,
    pub climate_match: CompatibilityLevel,
    pub water_availability: Level,
    pub estimate: YieldEstimate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCrop {
    pub name: CropName,
    pub water_need: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSeason {
    pub season: String,
    pub months: Vec<String>,
    pub crops: Vec<CalendarCrop>,
}

/// Composes season resolution, catalog filtering, compatibility lookups and
/// yield estimation for location-driven flows.
pub struct AdvisorRuntime<E = DeterministicYieldEstimator> {
    estimator: E,
    settings: AdvisorSettings,
}

impl<E> AdvisorRuntime<E> {
    pub fn new(estimator: E, settings: AdvisorSettings) -> Self {
        Self { estimator, settings }
    }

    pub fn settings(&self) -> &AdvisorSettings {
        &self.settings
    }
}

impl Default for AdvisorRuntime<DeterministicYieldEstimator> {
    fn default() -> Self {
        Self::new(DeterministicYieldEstimator, AdvisorSettings::default())
    }
}

impl<E> AdvisorRuntime<E>
where
    E: YieldEstimator,
{
    pub fn recommend<'c>(&self, catalog: &'c Catalog, query: &CropQuery) -> Vec<&'c CropProfile> {
        catalog.filter(query)
    }

    /// The query a location implies on `today`: its default soil type, its
    /// climate, the active season and its humidity unless overridden.
    pub fn location_query(
        &self,
        location: &LocationProfile,
        today: NaiveDate,
        overrides: &LocationOverrides,
    ) -> (SeasonResolution, CropQuery) {
        let season = resolve_season(&location.seasons, today);
        let soil_type =
            location.default_soil_type().unwrap_or(self.settings.fallback_soil_type.as_str());
        let humidity = overrides.humidity.clone().or_else(|| location.humidity.clone());

        let query = CropQuery::new(soil_type, location.climate.clone(), season.season.clone())
            .with_humidity(humidity)
            .with_soil_fertility(overrides.soil_fertility.clone());
        (season, query)
    }

    /// Builds the query from the location profile and the season active on
    /// `today`, then filters the catalog with it.
    pub fn recommend_for_location(
        &self,
        catalog: &Catalog,
        location: &LocationProfile,
        today: NaiveDate,
        overrides: &LocationOverrides,
    ) -> LocationRecommendation {
        let (season, query) = self.location_query(location, today, overrides);
        let crops = catalog.filter(&query).into_iter().cloned().collect();

        LocationRecommendation { location: location.name.clone(), season, query, crops }
    }

    pub fn rank<'c>(&self, catalog: &'c Catalog, query: &RankQuery) -> Vec<RankedCrop<'c>> {
        catalog.rank(query)
    }

    pub fn estimate(&self, crop: &CropProfile, inputs: &YieldInputs) -> YieldEstimate {
        self.estimator.estimate(crop, inputs)
    }

    /// Climate match uses the crop's first listed climate. Management falls
    /// back to the configured default when not supplied.
    pub fn estimate_for_location(
        &self,
        crop: &CropProfile,
        location: &LocationProfile,
        soil_fertility: &str,
        land_area: f64,
        management_quality: Option<f64>,
    ) -> LocationEstimate {
        let (climate, water, inputs) =
            self.location_inputs(crop, location, soil_fertility, land_area, management_quality);

        LocationEstimate {
            location: location.name.clone(),
            climate_match: climate,
            water_availability: water,
            estimate: self.estimator.estimate(crop, &inputs),
        }
    }

    /// Optimization hints starting from the inputs `estimate_for_location` uses.
    pub fn suggest_for_location(
        &self,
        crop: &CropProfile,
        location: &LocationProfile,
        soil_fertility: &str,
        land_area: f64,
        management_quality: Option<f64>,
    ) -> OptimizationReport {
        let (_, _, inputs) =
            self.location_inputs(crop, location, soil_fertility, land_area, management_quality);
        optimization_suggestions(&self.estimator, crop, &inputs)
    }

    fn location_inputs(
        &self,
        crop: &CropProfile,
        location: &LocationProfile,
        soil_fertility: &str,
        land_area: f64,
        management_quality: Option<f64>,
    ) -> (CompatibilityLevel, Level, YieldInputs) {
        let climate = climate_match(crop.primary_climate().unwrap_or_default(), &location.climate);
        let water = water_availability(&crop.water_need, &location.rainfall);
        let inputs = YieldInputs::from_levels(
            soil_fertility,
            water,
            climate,
            management_quality.unwrap_or(self.settings.default_management_quality),
            land_area,
        );
        (climate, water, inputs)
    }

    /// Seasons in declared order with the crops whose season tags include them.
    pub fn crop_calendar(&self, catalog: &Catalog, location: &LocationProfile) -> Vec<CalendarSeason> {
        location
            .seasons
            .entries()
            .iter()
            .map(|entry| CalendarSeason {
                season: entry.season.clone(),
                months: entry.months.clone(),
                crops: catalog
                    .crops()
                    .iter()
                    .filter(|crop| crop.seasons.contains(&entry.season))
                    .map(|crop| CalendarCrop {
                        name: crop.name.clone(),
                        water_need: crop.water_need.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}
