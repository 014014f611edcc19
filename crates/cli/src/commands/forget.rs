use agriwiz_core::domain::observation::ObservationId;
use agriwiz_db::{ObservationRepository, SqlObservationRepository};
use clap::Args;
use tracing::info;

use crate::commands::{not_found, repository_failure, with_store, CommandResult, Failure};

#[derive(Debug, Args)]
pub struct ForgetArgs {
    /// Observation id returned by `observe`.
    #[arg(long)]
    pub id: i64,
}

pub fn run(args: ForgetArgs) -> CommandResult {
    with_store(
        "forget",
        |_config, pool| async move {
            let id = ObservationId(args.id);
            let removed = SqlObservationRepository::new(pool)
                .delete(id)
                .await
                .map_err(repository_failure)?;
            if !removed {
                return Err(not_found("observation", id.to_string()));
            }

            info!(
                event_name = "yield.observation.deleted",
                observation_id = %id,
                "yield observation deleted"
            );
            Ok::<_, Failure>(id)
        },
        |id| CommandResult::success("forget", format!("deleted observation {id}")),
    )
}
