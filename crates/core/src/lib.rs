pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod hooks;

pub use domain::crop::{CategorySet, CropName, CropProfile, ValueRange};
pub use domain::levels::{CompatibilityLevel, Level};
pub use domain::location::{LocationName, LocationProfile, SeasonMapping, SeasonMonths};
pub use domain::observation::{
    GrowingConditions, NewYieldObservation, ObservationId, YieldObservation,
};
pub use engine::catalog::{Catalog, CropQuery, MatchMode, RankQuery, RankedCrop, ScoreDetails};
pub use engine::estimator::{
    DeterministicYieldEstimator, YieldBand, YieldEstimate, YieldEstimator, YieldFactors,
    YieldInputs,
};
pub use engine::history::{ConditionRanges, OptimalConditionsSummary, YieldHistory};
pub use engine::season::{SeasonResolution, SeasonSource};
pub use engine::suggestions::{
    optimization_suggestions, AdjustableFactor, OptimizationReport, YieldSuggestion,
};
pub use engine::{
    AdvisorRuntime, AdvisorSettings, CalendarCrop, CalendarSeason, LocationEstimate,
    LocationOverrides, LocationRecommendation,
};
pub use errors::{ApplicationError, DomainError};
pub use hooks::{
    FeatureVector, HookError, ModelUpdate, ModelUpdateHook, NoopModelUpdateHook,
    RecordingModelUpdateHook, TracingModelUpdateHook,
};
