use async_trait::async_trait;
use thiserror::Error;

use agriwiz_core::domain::crop::{CropName, CropProfile};
use agriwiz_core::domain::location::{LocationName, LocationProfile};
use agriwiz_core::domain::observation::{NewYieldObservation, ObservationId, YieldObservation};
use agriwiz_core::engine::history::{ConditionRanges, OptimalConditionsSummary};
use agriwiz_core::errors::{ApplicationError, DomainError};

pub mod crop;
pub mod location;
pub mod memory;
pub mod observation;

pub use crop::SqlCropRepository;
pub use location::SqlLocationRepository;
pub use memory::{InMemoryCropRepository, InMemoryLocationRepository, InMemoryObservationRepository};
pub use observation::SqlObservationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Domain(domain) => Self::Domain(domain),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Crop reference data. Names compare case-insensitively; listing keeps
/// storage (insertion) order.
#[async_trait]
pub trait CropRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<CropProfile>, RepositoryError>;
    async fn find_by_name(&self, name: &CropName) -> Result<Option<CropProfile>, RepositoryError>;
    async fn upsert(&self, crop: CropProfile) -> Result<(), RepositoryError>;
    async fn delete(&self, name: &CropName) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<LocationProfile>, RepositoryError>;
    async fn find_by_name(
        &self,
        name: &LocationName,
    ) -> Result<Option<LocationProfile>, RepositoryError>;
    async fn upsert(&self, location: LocationProfile) -> Result<(), RepositoryError>;
    async fn delete(&self, name: &LocationName) -> Result<bool, RepositoryError>;
}

/// Append-only yield history. Every read is a snapshot of the store at call
/// time; crop and location names match exactly.
#[async_trait]
pub trait ObservationRepository: Send + Sync {
    async fn append(
        &self,
        observation: NewYieldObservation,
    ) -> Result<YieldObservation, RepositoryError>;

    async fn delete(&self, id: ObservationId) -> Result<bool, RepositoryError>;

    async fn find_by_id(&self, id: ObservationId)
        -> Result<Option<YieldObservation>, RepositoryError>;

    /// All observations in storage order.
    async fn snapshot(&self) -> Result<Vec<YieldObservation>, RepositoryError>;

    /// Most recent year first.
    async fn history(
        &self,
        crop: &CropName,
        location: &LocationName,
        season: &str,
    ) -> Result<Vec<YieldObservation>, RepositoryError>;

    async fn for_crop(&self, crop: &CropName) -> Result<Vec<YieldObservation>, RepositoryError>;

    async fn for_location(
        &self,
        location: &LocationName,
    ) -> Result<Vec<YieldObservation>, RepositoryError>;

    async fn farmer_history(&self, farmer_id: &str)
        -> Result<Vec<YieldObservation>, RepositoryError>;

    async fn distinct_crops(&self) -> Result<Vec<String>, RepositoryError>;

    async fn distinct_locations(&self) -> Result<Vec<String>, RepositoryError>;

    /// Zero when nothing matches.
    async fn average_yield(
        &self,
        crop: &CropName,
        location: &LocationName,
        season: &str,
        since_year: i32,
    ) -> Result<f64, RepositoryError>;

    async fn max_yield(
        &self,
        crop: &CropName,
        location: &LocationName,
    ) -> Result<Option<f64>, RepositoryError>;

    async fn best_conditions(
        &self,
        crop: &CropName,
        ranges: &ConditionRanges,
        limit: usize,
    ) -> Result<Vec<YieldObservation>, RepositoryError>;

    async fn optimal_conditions(
        &self,
        crop: &CropName,
    ) -> Result<Option<OptimalConditionsSummary>, RepositoryError>;
}
