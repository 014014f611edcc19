use agriwiz_core::domain::crop::CropProfile;
use agriwiz_core::engine::catalog::{RankQuery, RankedCrop, ScoreDetails, MIN_MATCH_PERCENT};
use agriwiz_core::engine::season::SeasonResolution;
use agriwiz_core::{AdvisorRuntime, DeterministicYieldEstimator, LocationOverrides};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use crate::commands::recommend::explicit_query;
use crate::commands::{find_location, load_catalog, with_store, CommandResult, Failure};

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Derive soil, climate, humidity and season from a stored location.
    #[arg(long, conflicts_with_all = ["soil", "climate", "season"])]
    pub location: Option<String>,
    #[arg(long, required_unless_present = "location")]
    pub soil: Option<String>,
    #[arg(long, required_unless_present = "location")]
    pub climate: Option<String>,
    #[arg(long, required_unless_present = "location")]
    pub season: Option<String>,
    #[arg(long)]
    pub humidity: Option<String>,
    #[arg(long)]
    pub soil_fertility: Option<String>,
    /// Scored against crops that declare a pH range.
    #[arg(long)]
    pub soil_ph: Option<f64>,
    /// Degrees Celsius; scored against crops that declare a temperature range.
    #[arg(long, allow_negative_numbers = true)]
    pub temperature: Option<f64>,
    /// Day used to resolve the season for `--location` (defaults to today).
    #[arg(long, requires = "location")]
    pub date: Option<NaiveDate>,
}

impl RankArgs {
    fn validate_readings(&self) -> Result<(), Failure> {
        if let Some(ph) = self.soil_ph {
            if !ph.is_finite() || !(0.0..=14.0).contains(&ph) {
                return Err(("invalid_input", format!("soil pH must be within 0..=14, got {ph}"), 5));
            }
        }
        if let Some(temperature) = self.temperature {
            if !temperature.is_finite() {
                return Err(("invalid_input", format!("temperature must be finite, got {temperature}"), 5));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RankedEntry {
    match_percent: f64,
    score_details: ScoreDetails,
    crop: CropProfile,
}

impl From<RankedCrop<'_>> for RankedEntry {
    fn from(ranked: RankedCrop<'_>) -> Self {
        Self {
            match_percent: ranked.match_percent,
            score_details: ranked.score_details,
            crop: ranked.crop.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RankOutput {
    query: RankQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    season: Option<SeasonResolution>,
    min_match_percent: f64,
    crops: Vec<RankedEntry>,
}

pub fn run(args: RankArgs) -> CommandResult {
    with_store(
        "rank",
        |config, pool| async move {
            args.validate_readings()?;
            let catalog = load_catalog(&config, &pool).await?;
            let runtime = AdvisorRuntime::new(DeterministicYieldEstimator, config.advisor_settings());

            let (location, season, query) = match args.location {
                Some(name) => {
                    let location = find_location(&pool, &name).await?;
                    let today = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());
                    let overrides = LocationOverrides {
                        humidity: args.humidity,
                        soil_fertility: args.soil_fertility,
                    };
                    let (season, query) = runtime.location_query(&location, today, &overrides);
                    (Some(location.name.0), Some(season), query)
                }
                None => {
                    let query = explicit_query(args.soil, args.climate, args.season)?
                        .with_humidity(args.humidity)
                        .with_soil_fertility(args.soil_fertility);
                    (None, None, query)
                }
            };
            let query = RankQuery {
                soil_ph: args.soil_ph,
                temperature: args.temperature,
                ..RankQuery::from(&query)
            };

            let crops = runtime.rank(&catalog, &query).into_iter().map(RankedEntry::from).collect();
            Ok::<_, Failure>(RankOutput {
                query,
                location,
                season,
                min_match_percent: MIN_MATCH_PERCENT,
                crops,
            })
        },
        |output| {
            let message = format!("{} crops at or above {}% match", output.crops.len(), MIN_MATCH_PERCENT);
            CommandResult::success_with_data("rank", message, &output)
        },
    )
}
