use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use agriwiz_core::domain::observation::{NewYieldObservation, YieldObservation};
use agriwiz_core::hooks::{ModelUpdate, ModelUpdateHook};

use crate::repositories::{ObservationRepository, RepositoryError};

/// Appends observations and notifies the model hook without waiting on it.
#[derive(Clone)]
pub struct ObservationRecorder {
    repository: Arc<dyn ObservationRepository>,
    hook: Arc<dyn ModelUpdateHook>,
}

impl ObservationRecorder {
    pub fn new(repository: Arc<dyn ObservationRepository>, hook: Arc<dyn ModelUpdateHook>) -> Self {
        Self { repository, hook }
    }

    pub fn repository(&self) -> &Arc<dyn ObservationRepository> {
        &self.repository
    }

    pub async fn record(
        &self,
        observation: NewYieldObservation,
    ) -> Result<YieldObservation, RepositoryError> {
        let (stored, _dispatch) = self.record_and_track(observation).await?;
        Ok(stored)
    }

    /// Same as [`Self::record`], also returning the hook dispatch task so
    /// callers that must drain it (tests, short-lived processes) can await it.
    /// The task never resolves to an error.
    pub async fn record_and_track(
        &self,
        observation: NewYieldObservation,
    ) -> Result<(YieldObservation, JoinHandle<()>), RepositoryError> {
        let stored = self.repository.append(observation).await?;
        info!(
            event_name = "yield.observation.appended",
            observation_id = %stored.id,
            crop_name = %stored.crop_name,
            location_name = %stored.location_name,
            "yield observation recorded"
        );

        let dispatch = dispatch_model_update(Arc::clone(&self.hook), &stored);
        Ok((stored, dispatch))
    }
}

fn dispatch_model_update(hook: Arc<dyn ModelUpdateHook>, observation: &YieldObservation) -> JoinHandle<()> {
    let update = ModelUpdate::from_observation(observation);
    let observation_id = observation.id;
    let dispatch_id = update.dispatch_id;

    tokio::spawn(async move {
        // The inner task isolates hook panics from the supervising task.
        let outcome = tokio::spawn(async move { hook.notify(update).await }).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => warn!(
                event_name = "yield.model_hook.failed",
                observation_id = %observation_id,
                correlation_id = %dispatch_id,
                error = %error,
                "model update hook failed"
            ),
            Err(join_error) => warn!(
                event_name = "yield.model_hook.failed",
                observation_id = %observation_id,
                correlation_id = %dispatch_id,
                error = %join_error,
                "model update hook panicked"
            ),
        }
    })
}
