use agriwiz_db::migrations;

use crate::commands::{with_store, CommandResult};

pub fn run() -> CommandResult {
    with_store(
        "migrate",
        |_config, pool| async move {
            migrations::applied_versions(&pool)
                .await
                .map_err(|error| ("migration", error.to_string(), 5u8))
        },
        |versions| {
            let latest = versions.last().copied().unwrap_or_default();
            CommandResult::success_with_data(
                "migrate",
                format!("applied pending migrations (schema version {latest})"),
                &versions,
            )
        },
    )
}
