pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod recorder;
pub mod repositories;

pub use connection::{connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{SampleDataset, SeedResult, VerificationResult};
pub use recorder::ObservationRecorder;
pub use repositories::{
    CropRepository, InMemoryCropRepository, InMemoryLocationRepository,
    InMemoryObservationRepository, LocationRepository, ObservationRepository, RepositoryError,
    SqlCropRepository, SqlLocationRepository, SqlObservationRepository,
};
