use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Versions recorded as applied, ascending.
pub async fn applied_versions(pool: &DbPool) -> Result<Vec<i64>, sqlx::Error> {
    let exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if exists == 0 {
        return Ok(Vec::new());
    }

    sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version")
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::{applied_versions, run_pending};
    use crate::{connect_with_settings, migrations::MIGRATOR};

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "crops",
        "locations",
        "yield_observations",
        "idx_yield_observations_crop_location_season_year",
        "idx_yield_observations_farmer_id",
        "idx_yield_observations_created_at",
    ];

    async fn table_count(pool: &sqlx::SqlitePool, table: &str) -> i64 {
        sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(pool)
        .await
        .expect("check table")
        .get::<i64, _>("count")
    }

    #[tokio::test]
    async fn migrations_create_baseline_tables() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        assert!(applied_versions(&pool).await.expect("versions before").is_empty());

        run_pending(&pool).await.expect("run migrations");

        for table in ["crops", "locations", "yield_observations"] {
            assert_eq!(table_count(&pool, table).await, 1, "{table} should exist");
        }
        let range_columns: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('crops')
             WHERE name IN ('ph_range', 'temperature_range')",
        )
        .fetch_one(&pool)
        .await
        .expect("inspect crops columns");
        assert_eq!(range_columns, 2);
        assert_eq!(applied_versions(&pool).await.expect("versions after"), vec![1, 2]);
    }

    #[tokio::test]
    async fn migrations_are_reversible() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        assert_eq!(table_count(&pool, "yield_observations").await, 0);
        assert_eq!(table_count(&pool, "crops").await, 0);
    }

    #[tokio::test]
    async fn migrations_up_down_up_preserves_schema_signature() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let initial_signature = managed_schema_signature(&pool).await;
        assert_eq!(
            initial_signature.len(),
            MANAGED_SCHEMA_OBJECTS.len(),
            "initial migration pass should create all managed schema objects",
        );

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");
        assert!(
            managed_schema_signature(&pool).await.is_empty(),
            "managed schema objects should be removed after full undo",
        );

        run_pending(&pool).await.expect("re-run migrations");
        assert_eq!(
            managed_schema_signature(&pool).await,
            initial_signature,
            "up/down/up should preserve migration-managed schema signature",
        );
    }

    #[tokio::test]
    async fn observation_year_check_rejects_two_digit_years() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let result = sqlx::query(
            "INSERT INTO yield_observations (
                crop_name, location_name, season, year, actual_yield, temperature, rainfall,
                humidity, soil_ph, soil_fertility, water_availability, created_at
             ) VALUES ('Wheat', 'punjab', 'winter', 24, 4.0, 20.0, 600.0, 50.0, 7.0,
                       'medium', 'medium', '2024-01-01T00:00:00.000000Z')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    async fn managed_schema_signature(pool: &sqlx::SqlitePool) -> Vec<(String, String, String)> {
        let mut signature: Vec<(String, String, String)> = sqlx::query(
            "SELECT type, name, IFNULL(sql, '') AS sql
             FROM sqlite_master
             WHERE type IN ('table', 'index')",
        )
        .fetch_all(pool)
        .await
        .expect("load schema objects")
        .into_iter()
        .filter_map(|row| {
            let name = row.get::<String, _>("name");
            if MANAGED_SCHEMA_OBJECTS.contains(&name.as_str()) {
                Some((row.get::<String, _>("type"), name, row.get::<String, _>("sql")))
            } else {
                None
            }
        })
        .collect();
        signature.sort();
        signature
    }
}
