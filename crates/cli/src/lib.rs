pub mod commands;
pub mod logging;

use agriwiz_core::config::{AppConfig, LoadOptions};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::calendar::CalendarArgs;
use commands::estimate::EstimateArgs;
use commands::forget::ForgetArgs;
use commands::history::HistoryCommand;
use commands::observe::ObserveArgs;
use commands::rank::RankArgs;
use commands::recommend::RecommendArgs;
use commands::season::SeasonArgs;

#[derive(Debug, Parser)]
#[command(
    name = "agriwiz",
    about = "Crop recommendation and yield estimation CLI",
    long_about = "Recommend crops for soil, climate and season, estimate yields for a location, and keep a history of observed harvests.",
    after_help = "Examples:\n  agriwiz migrate\n  agriwiz seed\n  agriwiz recommend --location punjab --date 2024-07-10\n  agriwiz estimate --crop Wheat --location punjab --soil-fertility high --land-area 2.5\n  agriwiz rank --soil loamy --climate temperate --season winter --soil-ph 6.5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the sample crop catalog and locations, then verify them")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity, schema and catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List crops suited to explicit conditions or to a stored location")]
    Recommend(RecommendArgs),
    #[command(about = "Score every crop against the conditions and keep the close matches")]
    Rank(RankArgs),
    #[command(about = "Estimate the yield of a crop grown at a stored location")]
    Estimate(EstimateArgs),
    #[command(about = "Suggest soil fertility or water changes that raise an estimate")]
    Suggest(EstimateArgs),
    #[command(about = "Resolve the season active at a location on a date")]
    Season(SeasonArgs),
    #[command(about = "Show each season of a location with the crops that grow in it")]
    Calendar(CalendarArgs),
    #[command(about = "Record an observed harvest")]
    Observe(ObserveArgs),
    #[command(about = "Delete a recorded harvest")]
    Forget(ForgetArgs),
    #[command(subcommand, about = "Query recorded harvests")]
    History(HistoryCommand),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    if let Err(error) = logging::init(&config.logging) {
        eprintln!("{error}");
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Recommend(args) => commands::recommend::run(args),
        Command::Rank(args) => commands::rank::run(args),
        Command::Estimate(args) => commands::estimate::run(args),
        Command::Suggest(args) => commands::suggest::run(args),
        Command::Season(args) => commands::season::run(args),
        Command::Calendar(args) => commands::calendar::run(args),
        Command::Observe(args) => commands::observe::run(args),
        Command::Forget(args) => commands::forget::run(args),
        Command::History(command) => commands::history::run(command),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
