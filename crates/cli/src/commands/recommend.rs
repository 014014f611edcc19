use agriwiz_core::domain::crop::CropProfile;
use agriwiz_core::engine::catalog::{CropQuery, MatchMode};
use agriwiz_core::engine::season::SeasonResolution;
use agriwiz_core::{AdvisorRuntime, DeterministicYieldEstimator, LocationOverrides};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use crate::commands::{find_location, load_catalog, with_store, CommandResult, Failure};

#[derive(Debug, Args)]
pub struct RecommendArgs {
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
    /// Day used to resolve the season for `--location` (defaults to today).
    #[arg(long, requires = "location")]
    pub date: Option<NaiveDate>,
    /// Overrides `engine.match_mode` for this query.
    #[arg(long)]
    pub match_mode: Option<MatchMode>,
}

#[derive(Debug, Serialize)]
struct RecommendOutput {
    query: CropQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    season: Option<SeasonResolution>,
    match_mode: MatchMode,
    crops: Vec<CropProfile>,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    with_store(
        "recommend",
        |config, pool| async move {
            let mut catalog = load_catalog(&config, &pool).await?;
            if let Some(match_mode) = args.match_mode {
                catalog = catalog.with_match_mode(match_mode);
            }
            let runtime = AdvisorRuntime::new(DeterministicYieldEstimator, config.advisor_settings());

            let output = match args.location {
                Some(name) => {
                    let location = find_location(&pool, &name).await?;
                    let today = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());
                    let overrides = LocationOverrides {
                        humidity: args.humidity,
                        soil_fertility: args.soil_fertility,
                    };
                    let recommendation =
                        runtime.recommend_for_location(&catalog, &location, today, &overrides);

                    RecommendOutput {
                        query: recommendation.query,
                        location: Some(recommendation.location.0),
                        season: Some(recommendation.season),
                        match_mode: catalog.match_mode(),
                        crops: recommendation.crops,
                    }
                }
                None => {
                    let query = explicit_query(args.soil, args.climate, args.season)?
                        .with_humidity(args.humidity)
                        .with_soil_fertility(args.soil_fertility);
                    let crops = runtime.recommend(&catalog, &query).into_iter().cloned().collect();

                    RecommendOutput {
                        query,
                        location: None,
                        season: None,
                        match_mode: catalog.match_mode(),
                        crops,
                    }
                }
            };

            Ok::<_, Failure>(output)
        },
        |output| {
            let message = format!("{} matching crops", output.crops.len());
            CommandResult::success_with_data("recommend", message, &output)
        },
    )
}

pub(crate) fn explicit_query(
    soil: Option<String>,
    climate: Option<String>,
    season: Option<String>,
) -> Result<CropQuery, Failure> {
    match (soil, climate, season) {
        (Some(soil), Some(climate), Some(season)) => Ok(CropQuery::new(soil, climate, season)),
        _ => Err((
            "invalid_input",
            "--soil, --climate and --season are required without --location".to_string(),
            5u8,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::explicit_query;

    #[test]
    fn explicit_query_requires_all_three_constraints() {
        let query = explicit_query(
            Some("loamy".to_string()),
            Some("subtropical".to_string()),
            Some("winter".to_string()),
        )
        .expect("complete query");
        assert_eq!(query.season, "winter");

        let error = explicit_query(Some("loamy".to_string()), None, None).expect_err("incomplete");
        assert_eq!(error.0, "invalid_input");
    }
}
