use agriwiz_core::domain::levels::Level;
use agriwiz_core::errors::ApplicationError;
use agriwiz_core::{AdvisorRuntime, DeterministicYieldEstimator};
use clap::Args;

use crate::commands::{
    application_failure, find_crop, find_location, with_store, CommandResult, Failure,
};

#[derive(Debug, Args)]
pub struct EstimateArgs {
    #[arg(long)]
    pub crop: String,
    #[arg(long)]
    pub location: String,
    #[arg(long, default_value = "medium")]
    pub soil_fertility: String,
    /// Hectares under cultivation.
    #[arg(long, default_value_t = 1.0)]
    pub land_area: f64,
    /// Practice quality in `[0, 1]`; defaults to `engine.default_management_quality`.
    #[arg(long)]
    pub management: Option<f64>,
    /// Reject soil fertility values other than low, medium and high.
    #[arg(long)]
    pub strict: bool,
}

impl EstimateArgs {
    pub(crate) fn validate(&self) -> Result<(), Failure> {
        if self.strict {
            Level::parse_strict("soil_fertility", &self.soil_fertility)
                .map_err(|error| application_failure(ApplicationError::Domain(error)))?;
        }
        validate_land_area(self.land_area)
    }
}

pub fn run(args: EstimateArgs) -> CommandResult {
    with_store(
        "estimate",
        |config, pool| async move {
            args.validate()?;

            let crop = find_crop(&pool, &args.crop).await?;
            let location = find_location(&pool, &args.location).await?;
            let runtime = AdvisorRuntime::new(DeterministicYieldEstimator, config.advisor_settings());

            Ok::<_, Failure>(runtime.estimate_for_location(
                &crop,
                &location,
                &args.soil_fertility,
                args.land_area,
                args.management,
            ))
        },
        |estimate| {
            let message = format!(
                "{} at {}: {:.2} {} total",
                estimate.estimate.crop_name,
                estimate.location,
                estimate.estimate.total_yield,
                estimate.estimate.unit
            );
            CommandResult::success_with_data("estimate", message, &estimate)
        },
    )
}

fn validate_land_area(land_area: f64) -> Result<(), Failure> {
    if land_area.is_finite() && land_area >= 0.0 {
        return Ok(());
    }
    Err(("invalid_input", format!("land area must be a non-negative number, got {land_area}"), 5))
}
