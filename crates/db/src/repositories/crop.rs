use sqlx::{sqlite::SqliteRow, Row};

use agriwiz_core::domain::crop::{CategorySet, CropName, CropProfile, ValueRange};

use super::{CropRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCropRepository {
    pool: DbPool,
}

impl SqlCropRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CropRepository for SqlCropRepository {
    async fn list_all(&self) -> Result<Vec<CropProfile>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                name,
                soil_types,
                climates,
                seasons,
                water_need,
                humidity_preference,
                soil_fertility,
                base_yield_min,
                base_yield_max,
                yield_unit,
                ph_range,
                temperature_range
             FROM crops
             ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(crop_from_row).collect()
    }

    async fn find_by_name(&self, name: &CropName) -> Result<Option<CropProfile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                name,
                soil_types,
                climates,
                seasons,
                water_need,
                humidity_preference,
                soil_fertility,
                base_yield_min,
                base_yield_max,
                yield_unit,
                ph_range,
                temperature_range
             FROM crops
             WHERE name = ?",
        )
        .bind(name.0.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(crop_from_row).transpose()
    }

    async fn upsert(&self, crop: CropProfile) -> Result<(), RepositoryError> {
        crop.validate()?;

        sqlx::query(
            "INSERT INTO crops (
                name,
                soil_types,
                climates,
                seasons,
                water_need,
                humidity_preference,
                soil_fertility,
                base_yield_min,
                base_yield_max,
                yield_unit,
                ph_range,
                temperature_range
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                soil_types = excluded.soil_types,
                climates = excluded.climates,
                seasons = excluded.seasons,
                water_need = excluded.water_need,
                humidity_preference = excluded.humidity_preference,
                soil_fertility = excluded.soil_fertility,
                base_yield_min = excluded.base_yield_min,
                base_yield_max = excluded.base_yield_max,
                yield_unit = excluded.yield_unit,
                ph_range = excluded.ph_range,
                temperature_range = excluded.temperature_range",
        )
        .bind(&crop.name.0)
        .bind(crop.soil_types.encoded())
        .bind(crop.climates.encoded())
        .bind(crop.seasons.encoded())
        .bind(&crop.water_need)
        .bind(crop.humidity_preference.encoded())
        .bind(crop.soil_fertility.encoded())
        .bind(crop.base_yield_min)
        .bind(crop.base_yield_max)
        .bind(&crop.yield_unit)
        .bind(crop.ph_range.map(|range| range.encoded()))
        .bind(crop.temperature_range.map(|range| range.encoded()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, name: &CropName) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM crops WHERE name = ?").bind(name.0.trim()).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn crop_from_row(row: SqliteRow) -> Result<CropProfile, RepositoryError> {
    Ok(CropProfile {
        name: CropName(row.try_get("name")?),
        soil_types: CategorySet::from_encoded(&row.try_get::<String, _>("soil_types")?),
        climates: CategorySet::from_encoded(&row.try_get::<String, _>("climates")?),
        seasons: CategorySet::from_encoded(&row.try_get::<String, _>("seasons")?),
        water_need: row.try_get("water_need")?,
        humidity_preference: CategorySet::from_encoded(
            &row.try_get::<String, _>("humidity_preference")?,
        ),
        soil_fertility: CategorySet::from_encoded(&row.try_get::<String, _>("soil_fertility")?),
        base_yield_min: row.try_get("base_yield_min")?,
        base_yield_max: row.try_get("base_yield_max")?,
        yield_unit: row.try_get("yield_unit")?,
        ph_range: range_from_row(&row, "ph_range")?,
        temperature_range: range_from_row(&row, "temperature_range")?,
    })
}

fn range_from_row(row: &SqliteRow, column: &str) -> Result<Option<ValueRange>, RepositoryError> {
    let Some(encoded) = row.try_get::<Option<String>, _>(column)? else {
        return Ok(None);
    };
    ValueRange::from_encoded(&encoded).map(Some).ok_or_else(|| {
        RepositoryError::Decode(format!("crops.{column} is not a `min-max` range: {encoded}"))
    })
}

#[cfg(test)]
mod tests {
    use agriwiz_core::domain::crop::{CategorySet, CropName, CropProfile, ValueRange};

    use super::SqlCropRepository;
    use crate::migrations;
    use crate::repositories::{CropRepository, RepositoryError};
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn crop(name: &str, soils: &str) -> CropProfile {
        CropProfile {
            name: CropName(name.to_string()),
            soil_types: CategorySet::from_encoded(soils),
            climates: CategorySet::from_encoded("temperate,subtropical"),
            seasons: CategorySet::from_encoded("winter,spring"),
            water_need: "medium".to_string(),
            humidity_preference: CategorySet::from_encoded("low,medium"),
            soil_fertility: CategorySet::from_encoded("medium,high"),
            base_yield_min: 3.0,
            base_yield_max: 5.5,
            yield_unit: "tons".to_string(),
            ph_range: None,
            temperature_range: None,
        }
    }

    #[tokio::test]
    async fn sql_crop_repo_round_trip_keeps_storage_order() {
        let pool = setup_pool().await;
        let repo = SqlCropRepository::new(pool.clone());

        repo.upsert(crop("Wheat", "loamy,sandy loam")).await.expect("save wheat");
        repo.upsert(crop("Barley", "loamy,clay loam")).await.expect("save barley");

        let all = repo.list_all().await.expect("list");
        let names: Vec<_> = all.iter().map(|crop| crop.name.0.as_str()).collect();
        assert_eq!(names, vec!["Wheat", "Barley"]);
        assert_eq!(all[0], crop("Wheat", "loamy,sandy loam"));

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_crop_repo_upsert_updates_in_place_and_lookup_ignores_case() {
        let pool = setup_pool().await;
        let repo = SqlCropRepository::new(pool.clone());

        repo.upsert(crop("Wheat", "loamy")).await.expect("save");
        repo.upsert(crop("Barley", "loamy")).await.expect("save");
        repo.upsert(crop("Wheat", "alluvial")).await.expect("update");

        let found = repo.find_by_name(&CropName("WHEAT".to_string())).await.expect("find");
        assert_eq!(found.map(|crop| crop.soil_types.encoded()), Some("alluvial".to_string()));

        let names: Vec<_> =
            repo.list_all().await.expect("list").into_iter().map(|crop| crop.name.0).collect();
        assert_eq!(names, vec!["Wheat".to_string(), "Barley".to_string()]);

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_crop_repo_keeps_optional_growing_ranges() {
        let pool = setup_pool().await;
        let repo = SqlCropRepository::new(pool.clone());

        let mut wheat = crop("Wheat", "loamy");
        wheat.ph_range = Some(ValueRange::new(6.0, 7.5));
        wheat.temperature_range = Some(ValueRange::new(-5.0, 25.0));
        repo.upsert(wheat.clone()).await.expect("save wheat");
        repo.upsert(crop("Barley", "loamy")).await.expect("save barley");

        let all = repo.list_all().await.expect("list");
        assert_eq!(all[0], wheat);
        assert_eq!(all[1].ph_range, None);

        sqlx::query("UPDATE crops SET ph_range = 'acidic' WHERE name = 'Barley'")
            .execute(&pool)
            .await
            .expect("corrupt range");
        let error = repo.list_all().await.expect_err("undecodable range");
        assert!(matches!(error, RepositoryError::Decode(message) if message.contains("ph_range")));

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_crop_repo_rejects_inverted_yield_range() {
        let pool = setup_pool().await;
        let repo = SqlCropRepository::new(pool.clone());

        let mut invalid = crop("Wheat", "loamy");
        invalid.base_yield_min = 9.0;

        let error = repo.upsert(invalid).await.expect_err("min above max");
        assert!(matches!(error, RepositoryError::Domain(_)));
        assert!(repo.list_all().await.expect("list").is_empty());

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_crop_repo_delete_reports_whether_a_row_was_removed() {
        let pool = setup_pool().await;
        let repo = SqlCropRepository::new(pool.clone());
        repo.upsert(crop("Wheat", "loamy")).await.expect("save");

        assert!(repo.delete(&CropName("wheat".to_string())).await.expect("delete"));
        assert!(!repo.delete(&CropName("wheat".to_string())).await.expect("delete again"));
        assert!(repo.find_by_name(&CropName("Wheat".to_string())).await.expect("find").is_none());

        pool.close().await;
    }
}
