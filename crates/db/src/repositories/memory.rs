use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use agriwiz_core::domain::crop::{CropName, CropProfile};
use agriwiz_core::domain::location::{LocationName, LocationProfile};
use agriwiz_core::domain::observation::{NewYieldObservation, ObservationId, YieldObservation};
use agriwiz_core::engine::history::{ConditionRanges, OptimalConditionsSummary, YieldHistory};

use super::observation::observation_timestamp;
use super::{CropRepository, LocationRepository, ObservationRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCropRepository {
    crops: RwLock<Vec<CropProfile>>,
}

impl InMemoryCropRepository {
    pub fn with_crops(crops: Vec<CropProfile>) -> Self {
        Self { crops: RwLock::new(crops) }
    }
}

#[async_trait::async_trait]
impl CropRepository for InMemoryCropRepository {
    async fn list_all(&self) -> Result<Vec<CropProfile>, RepositoryError> {
        Ok(self.crops.read().await.clone())
    }

    async fn find_by_name(&self, name: &CropName) -> Result<Option<CropProfile>, RepositoryError> {
        let crops = self.crops.read().await;
        Ok(crops.iter().find(|crop| same_name(&crop.name.0, &name.0)).cloned())
    }

    async fn upsert(&self, crop: CropProfile) -> Result<(), RepositoryError> {
        crop.validate()?;

        let mut crops = self.crops.write().await;
        match crops.iter_mut().find(|existing| same_name(&existing.name.0, &crop.name.0)) {
            // The stored spelling of the name wins, as with the SQL store.
            Some(existing) => *existing = CropProfile { name: existing.name.clone(), ..crop },
            None => crops.push(crop),
        }
        Ok(())
    }

    async fn delete(&self, name: &CropName) -> Result<bool, RepositoryError> {
        let mut crops = self.crops.write().await;
        let before = crops.len();
        crops.retain(|crop| !same_name(&crop.name.0, &name.0));
        Ok(crops.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryLocationRepository {
    locations: RwLock<Vec<LocationProfile>>,
}

impl InMemoryLocationRepository {
    pub fn with_locations(locations: Vec<LocationProfile>) -> Self {
        Self { locations: RwLock::new(locations) }
    }
}

#[async_trait::async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn list_all(&self) -> Result<Vec<LocationProfile>, RepositoryError> {
        Ok(self.locations.read().await.clone())
    }

    async fn find_by_name(
        &self,
        name: &LocationName,
    ) -> Result<Option<LocationProfile>, RepositoryError> {
        let locations = self.locations.read().await;
        Ok(locations.iter().find(|location| same_name(&location.name.0, &name.0)).cloned())
    }

    async fn upsert(&self, location: LocationProfile) -> Result<(), RepositoryError> {
        location.validate()?;

        let mut locations = self.locations.write().await;
        match locations.iter_mut().find(|existing| same_name(&existing.name.0, &location.name.0)) {
            Some(existing) => {
                *existing = LocationProfile { name: existing.name.clone(), ..location }
            }
            None => locations.push(location),
        }
        Ok(())
    }

    async fn delete(&self, name: &LocationName) -> Result<bool, RepositoryError> {
        let mut locations = self.locations.write().await;
        let before = locations.len();
        locations.retain(|location| !same_name(&location.name.0, &name.0));
        Ok(locations.len() != before)
    }
}

#[derive(Default)]
struct ObservationLog {
    last_id: i64,
    observations: Vec<YieldObservation>,
}

/// Process-local observation store. Aggregates delegate to [`YieldHistory`]
/// so both stores share one definition of each statistic.
#[derive(Default)]
pub struct InMemoryObservationRepository {
    log: RwLock<ObservationLog>,
}

impl InMemoryObservationRepository {
    /// Appends with an explicit timestamp. Lets tests pin newest-first ordering.
    pub async fn append_at(
        &self,
        observation: NewYieldObservation,
        created_at: DateTime<Utc>,
    ) -> Result<YieldObservation, RepositoryError> {
        observation.validate()?;

        let mut log = self.log.write().await;
        log.last_id += 1;
        let stored = observation.into_observation(ObservationId(log.last_id), created_at);
        log.observations.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait::async_trait]
impl ObservationRepository for InMemoryObservationRepository {
    async fn append(
        &self,
        observation: NewYieldObservation,
    ) -> Result<YieldObservation, RepositoryError> {
        self.append_at(observation, observation_timestamp()).await
    }

    async fn delete(&self, id: ObservationId) -> Result<bool, RepositoryError> {
        let mut log = self.log.write().await;
        let before = log.observations.len();
        log.observations.retain(|observation| observation.id != id);
        Ok(log.observations.len() != before)
    }

    async fn find_by_id(
        &self,
        id: ObservationId,
    ) -> Result<Option<YieldObservation>, RepositoryError> {
        let log = self.log.read().await;
        Ok(log.observations.iter().find(|observation| observation.id == id).cloned())
    }

    async fn snapshot(&self) -> Result<Vec<YieldObservation>, RepositoryError> {
        Ok(self.log.read().await.observations.clone())
    }

    async fn history(
        &self,
        crop: &CropName,
        location: &LocationName,
        season: &str,
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        let log = self.log.read().await;
        Ok(owned(YieldHistory::new(&log.observations).history(&crop.0, &location.0, season)))
    }

    async fn for_crop(&self, crop: &CropName) -> Result<Vec<YieldObservation>, RepositoryError> {
        let log = self.log.read().await;
        Ok(owned(YieldHistory::new(&log.observations).for_crop(&crop.0)))
    }

    async fn for_location(
        &self,
        location: &LocationName,
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        let log = self.log.read().await;
        Ok(owned(YieldHistory::new(&log.observations).for_location(&location.0)))
    }

    async fn farmer_history(
        &self,
        farmer_id: &str,
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        let log = self.log.read().await;
        Ok(owned(YieldHistory::new(&log.observations).farmer_history(farmer_id)))
    }

    async fn distinct_crops(&self) -> Result<Vec<String>, RepositoryError> {
        let log = self.log.read().await;
        Ok(YieldHistory::new(&log.observations).distinct_crops())
    }

    async fn distinct_locations(&self) -> Result<Vec<String>, RepositoryError> {
        let log = self.log.read().await;
        Ok(YieldHistory::new(&log.observations).distinct_locations())
    }

    async fn average_yield(
        &self,
        crop: &CropName,
        location: &LocationName,
        season: &str,
        since_year: i32,
    ) -> Result<f64, RepositoryError> {
        let log = self.log.read().await;
        Ok(YieldHistory::new(&log.observations).average_yield(
            &crop.0,
            &location.0,
            season,
            since_year,
        ))
    }

    async fn max_yield(
        &self,
        crop: &CropName,
        location: &LocationName,
    ) -> Result<Option<f64>, RepositoryError> {
        let log = self.log.read().await;
        Ok(YieldHistory::new(&log.observations).max_yield(&crop.0, &location.0))
    }

    async fn best_conditions(
        &self,
        crop: &CropName,
        ranges: &ConditionRanges,
        limit: usize,
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        let log = self.log.read().await;
        Ok(owned(YieldHistory::new(&log.observations).best_conditions(&crop.0, ranges, limit)))
    }

    async fn optimal_conditions(
        &self,
        crop: &CropName,
    ) -> Result<Option<OptimalConditionsSummary>, RepositoryError> {
        let log = self.log.read().await;
        Ok(YieldHistory::new(&log.observations).optimal_conditions(&crop.0))
    }
}

fn same_name(stored: &str, requested: &str) -> bool {
    stored.eq_ignore_ascii_case(requested.trim())
}

fn owned(observations: Vec<&YieldObservation>) -> Vec<YieldObservation> {
    observations.into_iter().cloned().collect()
}
