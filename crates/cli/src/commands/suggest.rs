use agriwiz_core::engine::suggestions::OptimizationReport;
use agriwiz_core::{AdvisorRuntime, DeterministicYieldEstimator};
use serde::Serialize;

use crate::commands::estimate::EstimateArgs;
use crate::commands::{find_crop, find_location, with_store, CommandResult, Failure};

#[derive(Debug, Serialize)]
struct SuggestOutput {
    location: String,
    #[serde(flatten)]
    report: OptimizationReport,
}

impl SuggestOutput {
    fn summary(&self) -> String {
        let crop = &self.report.current.crop_name;
        match self.report.suggestions.first() {
            Some(best) => format!(
                "{} adjustments raise {crop} at {}; best: {} (+{:.2} {})",
                self.report.suggestions.len(),
                self.location,
                best.suggestion,
                best.potential_improvement,
                self.report.current.unit
            ),
            None => format!("no adjustment raises {crop} at {}", self.location),
        }
    }
}

pub fn run(args: EstimateArgs) -> CommandResult {
    with_store(
        "suggest",
        |config, pool| async move {
            args.validate()?;

            let crop = find_crop(&pool, &args.crop).await?;
            let location = find_location(&pool, &args.location).await?;
            let runtime = AdvisorRuntime::new(DeterministicYieldEstimator, config.advisor_settings());

            let report = runtime.suggest_for_location(
                &crop,
                &location,
                &args.soil_fertility,
                args.land_area,
                args.management,
            );
            Ok::<_, Failure>(SuggestOutput { location: location.name.0, report })
        },
        |output| CommandResult::success_with_data("suggest", output.summary(), &output),
    )
}
