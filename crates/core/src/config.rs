use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::catalog::MatchMode;
use crate::engine::history::DEFAULT_BEST_CONDITIONS_LIMIT;
use crate::engine::{AdvisorSettings, DEFAULT_MANAGEMENT_QUALITY, FALLBACK_SOIL_TYPE};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    pub model_hook: ModelHookConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub match_mode: MatchMode,
    pub default_management_quality: f64,
    pub history_window_years: u32,
    pub best_conditions_limit: u32,
}

#[derive(Clone, Debug)]
pub struct ModelHookConfig {
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub match_mode: Option<MatchMode>,
    pub model_hook_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://agriwiz.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            engine: EngineConfig {
                match_mode: MatchMode::Substring,
                default_management_quality: DEFAULT_MANAGEMENT_QUALITY,
                history_window_years: 5,
                best_conditions_limit: DEFAULT_BEST_CONDITIONS_LIMIT as u32,
            },
            model_hook: ModelHookConfig { enabled: false },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("agriwiz.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn advisor_settings(&self) -> AdvisorSettings {
        AdvisorSettings {
            default_management_quality: self.engine.default_management_quality,
            fallback_soil_type: FALLBACK_SOIL_TYPE.to_string(),
        }
    }

    /// First year included in average-yield queries run during `current_year`.
    pub fn history_cutoff_year(&self, current_year: i32) -> i32 {
        let window = i32::try_from(self.engine.history_window_years).unwrap_or(i32::MAX);
        current_year.saturating_sub(window)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(match_mode) = engine.match_mode {
                self.engine.match_mode = match_mode;
            }
            if let Some(quality) = engine.default_management_quality {
                self.engine.default_management_quality = quality;
            }
            if let Some(years) = engine.history_window_years {
                self.engine.history_window_years = years;
            }
            if let Some(limit) = engine.best_conditions_limit {
                self.engine.best_conditions_limit = limit;
            }
        }

        if let Some(model_hook) = patch.model_hook {
            if let Some(enabled) = model_hook.enabled {
                self.model_hook.enabled = enabled;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AGRIWIZ_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("AGRIWIZ_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("AGRIWIZ_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("AGRIWIZ_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("AGRIWIZ_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("AGRIWIZ_LOGGING_LEVEL").or_else(|| read_env("AGRIWIZ_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AGRIWIZ_LOGGING_FORMAT").or_else(|| read_env("AGRIWIZ_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("AGRIWIZ_ENGINE_MATCH_MODE") {
            self.engine.match_mode =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "AGRIWIZ_ENGINE_MATCH_MODE".to_string(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = read_env("AGRIWIZ_ENGINE_DEFAULT_MANAGEMENT_QUALITY") {
            self.engine.default_management_quality =
                parse_f64("AGRIWIZ_ENGINE_DEFAULT_MANAGEMENT_QUALITY", &value)?;
        }
        if let Some(value) = read_env("AGRIWIZ_ENGINE_HISTORY_WINDOW_YEARS") {
            self.engine.history_window_years =
                parse_u32("AGRIWIZ_ENGINE_HISTORY_WINDOW_YEARS", &value)?;
        }
        if let Some(value) = read_env("AGRIWIZ_ENGINE_BEST_CONDITIONS_LIMIT") {
            self.engine.best_conditions_limit =
                parse_u32("AGRIWIZ_ENGINE_BEST_CONDITIONS_LIMIT", &value)?;
        }

        if let Some(value) = read_env("AGRIWIZ_MODEL_HOOK_ENABLED") {
            self.model_hook.enabled = parse_bool("AGRIWIZ_MODEL_HOOK_ENABLED", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(match_mode) = overrides.match_mode {
            self.engine.match_mode = match_mode;
        }
        if let Some(enabled) = overrides.model_hook_enabled {
            self.model_hook.enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_logging(&self.logging)?;
        validate_engine(&self.engine)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("agriwiz.toml"), PathBuf::from("config/agriwiz.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

const MAX_HISTORY_WINDOW_YEARS: u32 = 200;

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    let quality = engine.default_management_quality;
    if !quality.is_finite() || !(0.0..=1.0).contains(&quality) {
        return Err(ConfigError::Validation(
            "engine.default_management_quality must be within 0.0..=1.0".to_string(),
        ));
    }

    if engine.history_window_years > MAX_HISTORY_WINDOW_YEARS {
        return Err(ConfigError::Validation(format!(
            "engine.history_window_years must be in range 0..={MAX_HISTORY_WINDOW_YEARS}"
        )));
    }

    if engine.best_conditions_limit == 0 || engine.best_conditions_limit > 50 {
        return Err(ConfigError::Validation(
            "engine.best_conditions_limit must be in range 1..=50".to_string(),
        ));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    logging: Option<LoggingPatch>,
    engine: Option<EnginePatch>,
    model_hook: Option<ModelHookPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    match_mode: Option<MatchMode>,
    default_management_quality: Option<f64>,
    history_window_years: Option<u32>,
    best_conditions_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelHookPatch {
    enabled: Option<bool>,
}
