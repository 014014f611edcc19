use agriwiz_core::config::{AppConfig, LoadOptions};
use agriwiz_db::{connect_with_config, migrations, CropRepository, SqlCropRepository};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Read-only readiness report. Never applies migrations or seeds data.
pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

const STORE_CHECKS: [&str; 3] = ["database_connectivity", "schema_migrations", "crop_catalog"];

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_store(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(
                STORE_CHECKS
                    .into_iter()
                    .map(|name| skipped(name, "skipped because configuration did not load")),
            );
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_store(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let mut checks = vec![DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            }];
            checks.extend(
                STORE_CHECKS[1..]
                    .iter()
                    .map(|name| skipped(*name, "skipped because the runtime did not start")),
            );
            return checks;
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                let mut checks = vec![DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to connect to database: {error}"),
                }];
                checks.extend(
                    STORE_CHECKS[1..]
                        .iter()
                        .map(|name| skipped(*name, "skipped because the database is unreachable")),
                );
                return checks;
            }
        };

        let mut checks = vec![DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        }];

        let applied = migrations::applied_versions(&pool).await;
        let schema_ready = matches!(&applied, Ok(versions) if !versions.is_empty());
        checks.push(match applied {
            Ok(versions) if !versions.is_empty() => DoctorCheck {
                name: "schema_migrations",
                status: CheckStatus::Pass,
                details: format!("applied versions: {versions:?}"),
            },
            Ok(_) => DoctorCheck {
                name: "schema_migrations",
                status: CheckStatus::Fail,
                details: "no migrations applied; run `agriwiz migrate`".to_string(),
            },
            Err(error) => DoctorCheck {
                name: "schema_migrations",
                status: CheckStatus::Fail,
                details: format!("could not read migration history: {error}"),
            },
        });

        checks.push(if schema_ready {
            check_catalog(&SqlCropRepository::new(pool.clone())).await
        } else {
            skipped("crop_catalog", "skipped because the schema is not migrated")
        });

        pool.close().await;
        checks
    })
}

async fn check_catalog(crops: &impl CropRepository) -> DoctorCheck {
    match crops.list_all().await {
        Ok(crops) if !crops.is_empty() => DoctorCheck {
            name: "crop_catalog",
            status: CheckStatus::Pass,
            details: format!("{} crops available", crops.len()),
        },
        Ok(_) => DoctorCheck {
            name: "crop_catalog",
            status: CheckStatus::Fail,
            details: "crop catalog is empty; run `agriwiz seed`".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "crop_catalog",
            status: CheckStatus::Fail,
            details: format!("failed to read crop catalog: {error}"),
        },
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: reason.to_string() }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
