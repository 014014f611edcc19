use chrono::NaiveDate;

use agriwiz_core::domain::location::LocationName;
use agriwiz_core::engine::season::SeasonSource;
use agriwiz_core::{AdvisorRuntime, Catalog, LocationOverrides};
use agriwiz_db::migrations;
use agriwiz_db::{
    connect_with_settings, CropRepository, LocationRepository, SampleDataset, SqlCropRepository,
    SqlLocationRepository,
};

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

async fn seeded_pool() -> SeedContractTestResult<sqlx::SqlitePool> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    SampleDataset::load(&pool).await.map_err(|error| format!("seed: {error}"))?;
    Ok(pool)
}

fn date(year: i32, month: u32, day: u32) -> SeedContractTestResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| "invalid date".to_string())
}

#[test]
fn seed_sql_fixture_is_idempotent_and_covers_sample_locations() -> SeedContractTestResult {
    let fixture_sql = SampleDataset::SQL;

    require_eq!(fixture_sql.matches("ON CONFLICT(name) DO NOTHING").count(), 2);
    for location in ["'punjab'", "'kerala'", "'california'"] {
        require!(fixture_sql.contains(location), "fixture must seed {location}");
    }
    require!(
        fixture_sql.contains(r#""summer":["may","june","july"],"rainy":["july""#),
        "punjab must list july under summer before rainy"
    );
    Ok(())
}

#[tokio::test]
async fn seeded_catalog_rows_pass_domain_validation() -> SeedContractTestResult {
    let pool = seeded_pool().await?;
    let crops = SqlCropRepository::new(pool.clone())
        .list_all()
        .await
        .map_err(|error| format!("list crops: {error}"))?;

    require_eq!(crops.len(), 30);
    require_eq!(crops[0].name.0, "Rice", "storage order starts with the first seeded crop");
    for crop in &crops {
        crop.validate().map_err(|error| format!("{}: {error}", crop.name))?;
        require!(crop.base_yield_max > 0.0, "{} must have a positive yield ceiling", crop.name);
        require_eq!(crop.yield_unit, "tons");
    }

    pool.close().await;
    Ok(())
}

#[tokio::test]
async fn punjab_july_recommendation_follows_first_declared_season() -> SeedContractTestResult {
    let pool = seeded_pool().await?;
    let crops = SqlCropRepository::new(pool.clone())
        .list_all()
        .await
        .map_err(|error| format!("list crops: {error}"))?;
    let punjab = SqlLocationRepository::new(pool.clone())
        .find_by_name(&LocationName("Punjab".to_string()))
        .await
        .map_err(|error| format!("find punjab: {error}"))?
        .ok_or_else(|| "punjab should be seeded".to_string())?;

    let runtime: AdvisorRuntime = AdvisorRuntime::default();
    let recommendation = runtime.recommend_for_location(
        &Catalog::new(crops),
        &punjab,
        date(2024, 7, 10)?,
        &LocationOverrides::default(),
    );

    require_eq!(recommendation.season.season, "summer");
    require_eq!(recommendation.season.source, SeasonSource::Mapping);
    require_eq!(recommendation.query.soil_type, "loamy");
    require_eq!(recommendation.query.humidity.as_deref(), Some("medium"));

    let names: Vec<&str> = recommendation.crops.iter().map(|crop| crop.name.0.as_str()).collect();
    require_eq!(
        names,
        vec!["Corn", "Cotton", "Tomato", "Soybean", "Sunflower", "Chili Pepper"]
    );

    pool.close().await;
    Ok(())
}

#[tokio::test]
async fn kerala_calendar_lists_seasons_in_declared_order() -> SeedContractTestResult {
    let pool = seeded_pool().await?;
    let crops = SqlCropRepository::new(pool.clone())
        .list_all()
        .await
        .map_err(|error| format!("list crops: {error}"))?;
    let kerala = SqlLocationRepository::new(pool.clone())
        .find_by_name(&LocationName("kerala".to_string()))
        .await
        .map_err(|error| format!("find kerala: {error}"))?
        .ok_or_else(|| "kerala should be seeded".to_string())?;

    let runtime: AdvisorRuntime = AdvisorRuntime::default();
    let calendar = runtime.crop_calendar(&Catalog::new(crops), &kerala);
    let seasons: Vec<&str> = calendar.iter().map(|entry| entry.season.as_str()).collect();
    require_eq!(seasons, vec!["winter", "summer", "rainy", "spring"]);

    let rainy = calendar
        .iter()
        .find(|entry| entry.season == "rainy")
        .ok_or_else(|| "rainy season missing".to_string())?;
    require_eq!(rainy.months.len(), 6);
    require!(rainy.crops.iter().any(|crop| crop.name.0 == "Black Pepper"));

    pool.close().await;
    Ok(())
}
