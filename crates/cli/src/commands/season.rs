use agriwiz_core::engine::season::resolve_season;
use chrono::NaiveDate;
use clap::Args;

use crate::commands::{find_location, with_store, CommandResult, Failure};

#[derive(Debug, Args)]
pub struct SeasonArgs {
    #[arg(long)]
    pub location: String,
    /// Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run(args: SeasonArgs) -> CommandResult {
    with_store(
        "season",
        |_config, pool| async move {
            let location = find_location(&pool, &args.location).await?;
            let date = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());
            Ok::<_, Failure>(resolve_season(&location.seasons, date))
        },
        |resolution| {
            let message = format!(
                "{} ({}, from {})",
                resolution.season,
                resolution.month,
                resolution.source.as_str()
            );
            CommandResult::success_with_data("season", message, &resolution)
        },
    )
}
