use agriwiz_db::{SampleDataset, SeedResult};
use serde::Serialize;

use crate::commands::{with_store, CommandResult, Failure};

#[derive(Debug, Serialize)]
struct SeedOutput {
    crops_inserted: i64,
    locations_inserted: i64,
}

pub fn run() -> CommandResult {
    with_store(
        "seed",
        |_config, pool| async move {
            let seed_result = SampleDataset::load(&pool)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

            let verification = SampleDataset::verify(&pool)
                .await
                .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

            if !verification.all_present {
                return Err(verification_failure(&verification.checks));
            }
            Ok::<_, Failure>(seed_result)
        },
        |SeedResult { crops_inserted, locations_inserted }| {
            let message = if crops_inserted == 0 && locations_inserted == 0 {
                "sample catalog already present".to_string()
            } else {
                format!("loaded {crops_inserted} crops and {locations_inserted} locations")
            };
            CommandResult::success_with_data(
                "seed",
                message,
                &SeedOutput { crops_inserted, locations_inserted },
            )
        },
    )
}

fn verification_failure(checks: &[(&'static str, bool)]) -> Failure {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    let message = if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    };
    ("seed_verification", message, 6u8)
}
