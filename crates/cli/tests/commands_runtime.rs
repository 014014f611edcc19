use std::env;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use agriwiz_cli::commands::estimate::EstimateArgs;
use agriwiz_cli::commands::forget::ForgetArgs;
use agriwiz_cli::commands::history::HistoryCommand;
use agriwiz_cli::commands::observe::ObserveArgs;
use agriwiz_cli::commands::rank::RankArgs;
use agriwiz_cli::commands::recommend::RecommendArgs;
use agriwiz_cli::commands::season::SeasonArgs;
use agriwiz_cli::commands::{
    estimate, forget, history, migrate, observe, rank, recommend, season, seed, suggest,
};
use chrono::NaiveDate;
use serde_json::Value;

#[test]
fn migrate_reports_applied_versions() {
    with_file_database(|| {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert!(payload["data"].as_array().is_some_and(|versions| !versions.is_empty()));
    });
}

#[test]
fn invalid_match_mode_is_a_config_failure() {
    with_env(
        &[("AGRIWIZ_DATABASE_URL", "sqlite::memory:"), ("AGRIWIZ_ENGINE_MATCH_MODE", "fuzzy")],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 2, "expected config validation failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_file_database(|| {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "first seed: {}", first.output);
        let first = parse_payload(&first.output);
        assert_eq!(first["data"]["crops_inserted"], 30);

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "second seed: {}", second.output);
        let second = parse_payload(&second.output);
        assert_eq!(second["data"]["crops_inserted"], 0);
        assert_eq!(second["data"]["locations_inserted"], 0);
    });
}

#[test]
fn recommend_by_location_resolves_season_from_mapping() {
    with_file_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = recommend::run(RecommendArgs {
            location: Some("Punjab".to_string()),
            soil: None,
            climate: None,
            season: None,
            humidity: None,
            soil_fertility: None,
            date: NaiveDate::from_ymd_opt(2024, 7, 10),
            match_mode: None,
        });
        assert_eq!(result.exit_code, 0, "recommend: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["season"]["season"], "summer");
        assert_eq!(payload["data"]["season"]["source"], "mapping");
        assert_eq!(payload["data"]["crops"][0]["name"], "Corn");
    });
}

#[test]
fn rank_scores_partial_matches_best_first() {
    with_file_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = rank::run(RankArgs {
            location: None,
            soil: Some("loamy".to_string()),
            climate: Some("temperate".to_string()),
            season: Some("winter".to_string()),
            humidity: None,
            soil_fertility: None,
            soil_ph: Some(6.5),
            temperature: None,
            date: None,
        });
        assert_eq!(result.exit_code, 0, "rank: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "rank");
        assert_eq!(payload["data"]["min_match_percent"], 60.0);
        let crops = payload["data"]["crops"].as_array().expect("ranked crops");
        assert_eq!(crops[0]["crop"]["name"], "Wheat");
        assert_eq!(crops[0]["match_percent"], 100.0);

        let percents: Vec<f64> =
            crops.iter().filter_map(|entry| entry["match_percent"].as_f64()).collect();
        assert_eq!(percents.len(), crops.len());
        assert!(percents.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(percents.iter().all(|percent| *percent >= 60.0));
        // Sample crops declare no pH range, so pH never adds to the maximum.
        assert!(crops.iter().all(|entry| entry["score_details"]["max_possible"] == 9));
        assert!(crops.iter().any(|entry| entry["match_percent"].as_f64() < Some(100.0)));
    });
}

#[test]
fn rank_rejects_implausible_soil_ph() {
    with_file_database(|| {
        let result = rank::run(RankArgs {
            location: Some("punjab".to_string()),
            soil: None,
            climate: None,
            season: None,
            humidity: None,
            soil_fertility: None,
            soil_ph: Some(19.0),
            temperature: None,
            date: None,
        });
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn suggest_lists_input_changes_that_raise_the_estimate() {
    with_file_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = suggest::run(EstimateArgs {
            crop: "Wheat".to_string(),
            location: "punjab".to_string(),
            soil_fertility: "low".to_string(),
            land_area: 2.0,
            management: None,
            strict: false,
        });
        assert_eq!(result.exit_code, 0, "suggest: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["location"], "punjab");
        assert_eq!(payload["data"]["current"]["crop_name"], "Wheat");
        let suggestions = payload["data"]["suggestions"].as_array().expect("suggestions");
        let picked: Vec<(&str, &str)> = suggestions
            .iter()
            .filter_map(|suggestion| {
                Some((suggestion["factor"].as_str()?, suggestion["level"].as_str()?))
            })
            .collect();
        assert_eq!(
            picked,
            vec![
                ("soil_fertility", "high"),
                ("soil_fertility", "medium"),
                ("water_availability", "high"),
            ]
        );
        assert!(suggestions.iter().all(|suggestion| {
            suggestion["potential_improvement"].as_f64().is_some_and(|gain| gain > 0.0)
        }));
    });
}

#[test]
fn suggest_for_unknown_location_is_not_found() {
    with_file_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = suggest::run(EstimateArgs {
            crop: "Wheat".to_string(),
            location: "atlantis".to_string(),
            soil_fertility: "medium".to_string(),
            land_area: 1.0,
            management: None,
            strict: false,
        });
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["command"], "suggest");
    });
}

#[test]
fn season_reports_resolved_month() {
    with_file_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = season::run(SeasonArgs {
            location: "punjab".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 7, 10),
        });
        assert_eq!(result.exit_code, 0, "season: {}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["month"], "july");
        assert_eq!(payload["data"]["season"], "summer");
    });
}

#[test]
fn estimate_for_unknown_crop_is_not_found() {
    with_file_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = estimate::run(EstimateArgs {
            crop: "Dragonfruit".to_string(),
            location: "punjab".to_string(),
            soil_fertility: "high".to_string(),
            land_area: 2.0,
            management: None,
            strict: false,
        });
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "estimate");
        assert_eq!(payload["error_class"], "not_found");
    });
}

#[test]
fn strict_estimate_rejects_unknown_fertility() {
    with_file_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = estimate::run(EstimateArgs {
            crop: "Wheat".to_string(),
            location: "punjab".to_string(),
            soil_fertility: "superb".to_string(),
            land_area: 2.0,
            management: None,
            strict: true,
        });
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["error_class"], "unknown_category");
    });
}

#[test]
fn observed_harvests_feed_history_until_forgotten() {
    with_file_database(|| {
        let recorded = observe::run(wheat_observation(2023, 3.4));
        assert_eq!(recorded.exit_code, 0, "observe: {}", recorded.output);
        let id = parse_payload(&recorded.output)["data"]["id"].as_i64().expect("observation id");
        assert_eq!(observe::run(wheat_observation(2021, 2.6)).exit_code, 0);

        let listed = history::run(HistoryCommand::List {
            crop: "Wheat".to_string(),
            location: "punjab".to_string(),
            season: "winter".to_string(),
        });
        let listed = parse_payload(&listed.output);
        let years: Vec<i64> = listed["data"]["observations"]
            .as_array()
            .expect("observations")
            .iter()
            .filter_map(|observation| observation["year"].as_i64())
            .collect();
        assert_eq!(years, vec![2023, 2021]);

        let max = history::run(HistoryCommand::Max {
            crop: "Wheat".to_string(),
            location: "punjab".to_string(),
        });
        assert_eq!(parse_payload(&max.output)["data"]["max_yield"], 3.4);

        let forgotten = forget::run(ForgetArgs { id });
        assert_eq!(forgotten.exit_code, 0, "forget: {}", forgotten.output);

        let again = forget::run(ForgetArgs { id });
        assert_eq!(again.exit_code, 6);

        let max = history::run(HistoryCommand::Max {
            crop: "Wheat".to_string(),
            location: "punjab".to_string(),
        });
        assert_eq!(parse_payload(&max.output)["data"]["max_yield"], 2.6);
    });
}

#[test]
fn invalid_observation_is_rejected_without_storing() {
    with_file_database(|| {
        let result = observe::run(wheat_observation(99, 3.0));
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");

        let names = history::run(HistoryCommand::Names);
        let names = parse_payload(&names.output);
        assert_eq!(names["data"]["crops"], Value::Array(Vec::new()));
    });
}

fn wheat_observation(year: i32, actual_yield: f64) -> ObserveArgs {
    ObserveArgs {
        crop: "Wheat".to_string(),
        location: "punjab".to_string(),
        season: "winter".to_string(),
        year,
        actual_yield,
        temperature: 18.0,
        rainfall: 420.0,
        humidity: 55.0,
        soil_ph: 7.1,
        soil_fertility: "high".to_string(),
        water_availability: "medium".to_string(),
        farmer_id: Some("farmer-7".to_string()),
        notes: None,
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

fn with_file_database(test_fn: impl FnOnce()) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir.path().join("agriwiz.db"));
    with_env(&[("AGRIWIZ_DATABASE_URL", url.as_str())], test_fn);
}

fn database_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "AGRIWIZ_DATABASE_URL",
        "AGRIWIZ_DATABASE_MAX_CONNECTIONS",
        "AGRIWIZ_DATABASE_TIMEOUT_SECS",
        "AGRIWIZ_LOGGING_LEVEL",
        "AGRIWIZ_LOGGING_FORMAT",
        "AGRIWIZ_LOG_LEVEL",
        "AGRIWIZ_LOG_FORMAT",
        "AGRIWIZ_ENGINE_MATCH_MODE",
        "AGRIWIZ_ENGINE_DEFAULT_MANAGEMENT_QUALITY",
        "AGRIWIZ_ENGINE_HISTORY_WINDOW_YEARS",
        "AGRIWIZ_ENGINE_BEST_CONDITIONS_LIMIT",
        "AGRIWIZ_MODEL_HOOK_ENABLED",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
