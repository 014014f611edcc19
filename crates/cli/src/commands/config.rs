use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use agriwiz_core::config::AppConfig;
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let entries = effective_entries(&config, config_file_doc.as_ref(), config_file_path.as_deref());

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        &entries,
    )
}

fn effective_entries(
    config: &AppConfig,
    doc: Option<&Value>,
    path: Option<&Path>,
) -> Vec<ConfigEntry> {
    let rows: [(&'static str, String, &[&str]); 10] = [
        ("database.url", config.database.url.clone(), &["AGRIWIZ_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["AGRIWIZ_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["AGRIWIZ_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["AGRIWIZ_LOGGING_LEVEL", "AGRIWIZ_LOG_LEVEL"],
        ),
        (
            "logging.format",
            config.logging.format.as_str().to_string(),
            &["AGRIWIZ_LOGGING_FORMAT", "AGRIWIZ_LOG_FORMAT"],
        ),
        (
            "engine.match_mode",
            config.engine.match_mode.as_str().to_string(),
            &["AGRIWIZ_ENGINE_MATCH_MODE"],
        ),
        (
            "engine.default_management_quality",
            config.engine.default_management_quality.to_string(),
            &["AGRIWIZ_ENGINE_DEFAULT_MANAGEMENT_QUALITY"],
        ),
        (
            "engine.history_window_years",
            config.engine.history_window_years.to_string(),
            &["AGRIWIZ_ENGINE_HISTORY_WINDOW_YEARS"],
        ),
        (
            "engine.best_conditions_limit",
            config.engine.best_conditions_limit.to_string(),
            &["AGRIWIZ_ENGINE_BEST_CONDITIONS_LIMIT"],
        ),
        (
            "model_hook.enabled",
            config.model_hook.enabled.to_string(),
            &["AGRIWIZ_MODEL_HOOK_ENABLED"],
        ),
    ];

    rows.into_iter()
        .map(|(key, value, env_keys)| ConfigEntry {
            key,
            value,
            source: field_source(key, env_keys, doc, path),
        })
        .collect()
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("agriwiz.toml"), PathBuf::from("config/agriwiz.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use agriwiz_core::config::AppConfig;
    use toml::Value;

    use super::{contains_path, effective_entries, field_source};

    #[test]
    fn nested_keys_are_found_in_file_documents() {
        let doc: Value = "[engine]\nmatch_mode = \"set_membership\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "engine.match_mode"));
        assert!(!contains_path(&doc, "engine.best_conditions_limit"));
        assert!(!contains_path(&doc, "logging.level"));
    }

    #[test]
    fn file_source_names_the_path() {
        let doc: Value = "[logging]\nlevel = \"debug\"\n".parse().expect("toml");

        let source = field_source(
            "logging.level",
            &["AGRIWIZ_TEST_UNSET_LOGGING_LEVEL"],
            Some(&doc),
            Some(Path::new("agriwiz.toml")),
        );
        assert_eq!(source, "file (agriwiz.toml)");
        assert_eq!(
            field_source("database.url", &["AGRIWIZ_TEST_UNSET_DATABASE_URL"], Some(&doc), None),
            "default"
        );
    }

    #[test]
    fn every_section_is_reported() {
        let entries = effective_entries(&AppConfig::default(), None, None);
        let keys: Vec<&str> = entries.iter().map(|entry| entry.key).collect();

        assert!(keys.contains(&"engine.match_mode"));
        assert!(keys.contains(&"model_hook.enabled"));
        let hook = entries.iter().find(|entry| entry.key == "model_hook.enabled").expect("hook");
        assert_eq!(hook.value, "false");
    }
}
