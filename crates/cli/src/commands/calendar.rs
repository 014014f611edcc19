use agriwiz_core::{AdvisorRuntime, DeterministicYieldEstimator};
use clap::Args;

use crate::commands::{find_location, load_catalog, with_store, CommandResult, Failure};

#[derive(Debug, Args)]
pub struct CalendarArgs {
    #[arg(long)]
    pub location: String,
}

pub fn run(args: CalendarArgs) -> CommandResult {
    with_store(
        "calendar",
        |config, pool| async move {
            let catalog = load_catalog(&config, &pool).await?;
            let location = find_location(&pool, &args.location).await?;
            let runtime = AdvisorRuntime::new(DeterministicYieldEstimator, config.advisor_settings());
            Ok::<_, Failure>(runtime.crop_calendar(&catalog, &location))
        },
        |calendar| {
            let message = format!("{} seasons", calendar.len());
            CommandResult::success_with_data("calendar", message, &calendar)
        },
    )
}
