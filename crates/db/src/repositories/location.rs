use sqlx::{sqlite::SqliteRow, Row};
use tracing::warn;

use agriwiz_core::domain::crop::CategorySet;
use agriwiz_core::domain::location::{LocationName, LocationProfile, SeasonMapping};

use super::{LocationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLocationRepository {
    pool: DbPool,
}

impl SqlLocationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LocationRepository for SqlLocationRepository {
    async fn list_all(&self) -> Result<Vec<LocationProfile>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT name, soil_types, climate, rainfall, humidity, seasons_json
             FROM locations
             ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(location_from_row).collect()
    }

    async fn find_by_name(
        &self,
        name: &LocationName,
    ) -> Result<Option<LocationProfile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT name, soil_types, climate, rainfall, humidity, seasons_json
             FROM locations
             WHERE name = ?",
        )
        .bind(name.0.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(location_from_row).transpose()
    }

    async fn upsert(&self, location: LocationProfile) -> Result<(), RepositoryError> {
        location.validate()?;

        sqlx::query(
            "INSERT INTO locations (name, soil_types, climate, rainfall, humidity, seasons_json)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                soil_types = excluded.soil_types,
                climate = excluded.climate,
                rainfall = excluded.rainfall,
                humidity = excluded.humidity,
                seasons_json = excluded.seasons_json",
        )
        .bind(&location.name.0)
        .bind(location.soil_types.encoded())
        .bind(&location.climate)
        .bind(&location.rainfall)
        .bind(location.humidity.as_deref())
        .bind(location.seasons.to_json())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, name: &LocationName) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM locations WHERE name = ?")
            .bind(name.0.trim())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn location_from_row(row: SqliteRow) -> Result<LocationProfile, RepositoryError> {
    let name = LocationName(row.try_get("name")?);
    let seasons_json = row.try_get::<String, _>("seasons_json")?;

    // A broken mapping must not hide the location; season resolution falls
    // back to the calendar default.
    let seasons = SeasonMapping::from_json(&seasons_json).unwrap_or_else(|error| {
        warn!(
            event_name = "season.mapping.malformed",
            location_name = %name,
            error = %error,
            "ignoring stored season mapping"
        );
        SeasonMapping::default()
    });

    Ok(LocationProfile {
        soil_types: CategorySet::from_encoded(&row.try_get::<String, _>("soil_types")?),
        climate: row.try_get("climate")?,
        rainfall: row.try_get("rainfall")?,
        humidity: row.try_get("humidity")?,
        seasons,
        name,
    })
}
