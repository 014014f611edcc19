pub mod calendar;
pub mod config;
pub mod doctor;
pub mod estimate;
pub mod forget;
pub mod history;
pub mod migrate;
pub mod observe;
pub mod rank;
pub mod recommend;
pub mod season;
pub mod seed;
pub mod suggest;

use agriwiz_core::config::{AppConfig, LoadOptions};
use agriwiz_core::domain::crop::{CropName, CropProfile};
use agriwiz_core::domain::location::{LocationName, LocationProfile};
use agriwiz_core::engine::catalog::Catalog;
use agriwiz_core::errors::ApplicationError;
use agriwiz_db::{
    connect_with_config, migrations, CropRepository, DbPool, LocationRepository, RepositoryError,
    SqlCropRepository, SqlLocationRepository,
};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(
                    command,
                    "serialization",
                    format!("failed to serialize command data: {error}"),
                    3,
                );
            }
        };

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    fn from_failure(command: &str, (error_class, message, exit_code): Failure) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// `(error_class, message, exit_code)` raised inside a command's async body.
pub(crate) type Failure = (&'static str, String, u8);

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Runs `body` against a migrated pool on a fresh current-thread runtime and
/// renders its outcome. The pool is closed whether or not `body` succeeds.
pub(crate) fn with_store<T, F, Fut>(
    command: &str,
    body: F,
    render: impl FnOnce(T) -> CommandResult,
) -> CommandResult
where
    F: FnOnce(AppConfig, DbPool) -> Fut,
    Fut: std::future::Future<Output = Result<T, Failure>>,
{
    let config = match load_config(command) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_store(&config).await?;
        let outcome = body(config, pool.clone()).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(value) => render(value),
        Err(failure) => CommandResult::from_failure(command, failure),
    }
}

pub(crate) async fn open_store(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) fn application_failure(error: ApplicationError) -> Failure {
    let exit_code = match error {
        ApplicationError::NotFound { .. } => 6,
        ApplicationError::Configuration(_) => 2,
        ApplicationError::Domain(_) | ApplicationError::Persistence(_) => 5,
    };
    (error.error_class(), error.to_string(), exit_code)
}

pub(crate) fn repository_failure(error: RepositoryError) -> Failure {
    application_failure(ApplicationError::from(error))
}

pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Failure {
    application_failure(ApplicationError::NotFound { entity, key: key.into() })
}

pub(crate) async fn load_catalog(config: &AppConfig, pool: &DbPool) -> Result<Catalog, Failure> {
    let crops = SqlCropRepository::new(pool.clone()).list_all().await.map_err(repository_failure)?;
    Ok(Catalog::new(crops).with_match_mode(config.engine.match_mode))
}

pub(crate) async fn find_crop(pool: &DbPool, name: &str) -> Result<CropProfile, Failure> {
    SqlCropRepository::new(pool.clone())
        .find_by_name(&CropName(name.to_string()))
        .await
        .map_err(repository_failure)?
        .ok_or_else(|| not_found("crop", name))
}

pub(crate) async fn find_location(pool: &DbPool, name: &str) -> Result<LocationProfile, Failure> {
    SqlLocationRepository::new(pool.clone())
        .find_by_name(&LocationName(name.to_string()))
        .await
        .map_err(repository_failure)?
        .ok_or_else(|| not_found("location", name))
}

#[cfg(test)]
mod tests {
    use agriwiz_core::errors::{ApplicationError, DomainError};
    use serde_json::Value;

    use super::{application_failure, not_found, CommandResult};

    #[test]
    fn failure_payload_carries_class_and_exit_code() {
        let result = CommandResult::failure("estimate", "not_found", "crop `Kale` was not found", 6);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 6);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "not_found");
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn success_payload_embeds_data() {
        let result = CommandResult::success_with_data("season", "resolved", &vec!["winter"]);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["error_class"], Value::Null);
        assert_eq!(payload["data"][0], "winter");
    }

    #[test]
    fn application_errors_map_to_exit_codes() {
        assert_eq!(not_found("location", "atlantis").2, 6);
        assert_eq!(
            application_failure(ApplicationError::Domain(DomainError::InvariantViolation(
                "bad".to_string()
            ))),
            ("invalid_input", "domain invariant violation: bad".to_string(), 5)
        );
        assert_eq!(application_failure(ApplicationError::Persistence("locked".to_string())).2, 5);
    }
}
