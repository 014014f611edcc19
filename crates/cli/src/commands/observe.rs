use std::sync::Arc;

use agriwiz_core::config::ModelHookConfig;
use agriwiz_core::domain::crop::CropName;
use agriwiz_core::domain::location::LocationName;
use agriwiz_core::domain::observation::{GrowingConditions, NewYieldObservation};
use agriwiz_core::hooks::{ModelUpdateHook, NoopModelUpdateHook, TracingModelUpdateHook};
use agriwiz_db::{ObservationRecorder, SqlObservationRepository};
use clap::Args;

use crate::commands::{repository_failure, with_store, CommandResult, Failure};

#[derive(Debug, Args)]
pub struct ObserveArgs {
    #[arg(long)]
    pub crop: String,
    #[arg(long)]
    pub location: String,
    #[arg(long)]
    pub season: String,
    #[arg(long)]
    pub year: i32,
    /// Measured yield per hectare.
    #[arg(long = "yield")]
    pub actual_yield: f64,
    /// Degrees Celsius; must be non-negative.
    #[arg(long)]
    pub temperature: f64,
    #[arg(long)]
    pub rainfall: f64,
    #[arg(long)]
    pub humidity: f64,
    #[arg(long)]
    pub soil_ph: f64,
    #[arg(long, default_value = "medium")]
    pub soil_fertility: String,
    #[arg(long, default_value = "medium")]
    pub water_availability: String,
    #[arg(long)]
    pub farmer_id: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl ObserveArgs {
    fn into_observation(self) -> NewYieldObservation {
        NewYieldObservation {
            crop_name: CropName(self.crop),
            location_name: LocationName(self.location),
            season: self.season,
            year: self.year,
            actual_yield: self.actual_yield,
            conditions: GrowingConditions {
                temperature: self.temperature,
                rainfall: self.rainfall,
                humidity: self.humidity,
                soil_ph: self.soil_ph,
            },
            soil_fertility: self.soil_fertility,
            water_availability: self.water_availability,
            farmer_id: self.farmer_id,
            notes: self.notes,
        }
    }
}

pub(crate) fn model_hook(config: &ModelHookConfig) -> Arc<dyn ModelUpdateHook> {
    if config.enabled {
        Arc::new(TracingModelUpdateHook)
    } else {
        Arc::new(NoopModelUpdateHook)
    }
}

pub fn run(args: ObserveArgs) -> CommandResult {
    with_store(
        "observe",
        |config, pool| async move {
            let recorder = ObservationRecorder::new(
                Arc::new(SqlObservationRepository::new(pool)),
                model_hook(&config.model_hook),
            );
            let (stored, dispatch) = recorder
                .record_and_track(args.into_observation())
                .await
                .map_err(repository_failure)?;
            // Drain the hook before the runtime shuts down; dispatch never fails.
            let _ = dispatch.await;

            Ok::<_, Failure>(stored)
        },
        |stored| {
            let message = format!("recorded observation {}", stored.id);
            CommandResult::success_with_data("observe", message, &stored)
        },
    )
}
