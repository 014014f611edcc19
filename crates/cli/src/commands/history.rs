use agriwiz_core::domain::crop::CropName;
use agriwiz_core::domain::location::LocationName;
use agriwiz_core::domain::observation::YieldObservation;
use agriwiz_core::engine::history::{ConditionRanges, OptimalConditionsSummary, ValueRange};
use agriwiz_db::{ObservationRepository, SqlObservationRepository};
use chrono::Datelike;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::commands::{repository_failure, with_store, CommandResult, Failure};

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// Mean yield for a crop, location and season from a cutoff year onward.
    Average {
        #[arg(long)]
        crop: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        season: String,
        /// Defaults to the current year minus `engine.history_window_years`.
        #[arg(long)]
        since_year: Option<i32>,
    },
    /// Highest yield recorded for a crop at a location.
    Max {
        #[arg(long)]
        crop: String,
        #[arg(long)]
        location: String,
    },
    /// Top observations whose conditions fall inside every range.
    Best(BestArgs),
    /// Averages over a crop's observations whose yield beats the crop's mean.
    Optimal {
        #[arg(long)]
        crop: String,
    },
    /// Observations for a crop, location and season, most recent year first.
    List {
        #[arg(long)]
        crop: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        season: String,
    },
    /// Everything a farmer has submitted.
    Farmer {
        #[arg(long)]
        id: String,
    },
    /// Crop and location names that have at least one observation.
    Names,
}

#[derive(Debug, Args)]
pub struct BestArgs {
    #[arg(long)]
    pub crop: String,
    #[arg(long, allow_negative_numbers = true)]
    pub min_temperature: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub max_temperature: f64,
    #[arg(long)]
    pub min_rainfall: f64,
    #[arg(long)]
    pub max_rainfall: f64,
    #[arg(long)]
    pub min_humidity: f64,
    #[arg(long)]
    pub max_humidity: f64,
    /// Defaults to `engine.best_conditions_limit`.
    #[arg(long)]
    pub limit: Option<usize>,
}

impl BestArgs {
    fn ranges(&self) -> ConditionRanges {
        ConditionRanges {
            temperature: ValueRange::new(self.min_temperature, self.max_temperature),
            rainfall: ValueRange::new(self.min_rainfall, self.max_rainfall),
            humidity: ValueRange::new(self.min_humidity, self.max_humidity),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum HistoryReport {
    Average { crop: String, location: String, season: String, since_year: i32, average_yield: f64 },
    Max { crop: String, location: String, max_yield: Option<f64> },
    Optimal { crop: String, summary: Option<OptimalConditionsSummary> },
    Observations { observations: Vec<YieldObservation> },
    Names { crops: Vec<String>, locations: Vec<String> },
}

impl HistoryReport {
    fn summary(&self) -> String {
        match self {
            Self::Average { average_yield, since_year, .. } => {
                format!("average yield {average_yield:.2} since {since_year}")
            }
            Self::Max { max_yield: Some(max_yield), .. } => format!("max yield {max_yield:.2}"),
            Self::Max { max_yield: None, .. } => "no observations recorded".to_string(),
            Self::Optimal { summary: Some(summary), .. } => {
                format!("optimal conditions over {} observations", summary.count)
            }
            Self::Optimal { summary: None, .. } => {
                "no observations above the crop's mean yield".to_string()
            }
            Self::Observations { observations } => format!("{} observations", observations.len()),
            Self::Names { crops, locations } => {
                format!("{} crops across {} locations", crops.len(), locations.len())
            }
        }
    }
}

pub fn run(command: HistoryCommand) -> CommandResult {
    with_store(
        "history",
        |config, pool| async move {
            let repository = SqlObservationRepository::new(pool);

            let report = match command {
                HistoryCommand::Average { crop, location, season, since_year } => {
                    let since_year = since_year.unwrap_or_else(|| {
                        config.history_cutoff_year(chrono::Local::now().year())
                    });
                    let average_yield = repository
                        .average_yield(
                            &CropName(crop.clone()),
                            &LocationName(location.clone()),
                            &season,
                            since_year,
                        )
                        .await
                        .map_err(repository_failure)?;
                    HistoryReport::Average { crop, location, season, since_year, average_yield }
                }
                HistoryCommand::Max { crop, location } => {
                    let max_yield = repository
                        .max_yield(&CropName(crop.clone()), &LocationName(location.clone()))
                        .await
                        .map_err(repository_failure)?;
                    HistoryReport::Max { crop, location, max_yield }
                }
                HistoryCommand::Best(args) => {
                    let limit = args.limit.unwrap_or(config.engine.best_conditions_limit as usize);
                    let observations = repository
                        .best_conditions(&CropName(args.crop.clone()), &args.ranges(), limit)
                        .await
                        .map_err(repository_failure)?;
                    HistoryReport::Observations { observations }
                }
                HistoryCommand::Optimal { crop } => {
                    let summary = repository
                        .optimal_conditions(&CropName(crop.clone()))
                        .await
                        .map_err(repository_failure)?;
                    HistoryReport::Optimal { crop, summary }
                }
                HistoryCommand::List { crop, location, season } => {
                    let observations = repository
                        .history(&CropName(crop), &LocationName(location), &season)
                        .await
                        .map_err(repository_failure)?;
                    HistoryReport::Observations { observations }
                }
                HistoryCommand::Farmer { id } => {
                    let observations =
                        repository.farmer_history(&id).await.map_err(repository_failure)?;
                    HistoryReport::Observations { observations }
                }
                HistoryCommand::Names => HistoryReport::Names {
                    crops: repository.distinct_crops().await.map_err(repository_failure)?,
                    locations: repository.distinct_locations().await.map_err(repository_failure)?,
                },
            };

            Ok::<_, Failure>(report)
        },
        |report| CommandResult::success_with_data("history", report.summary(), &report),
    )
}
