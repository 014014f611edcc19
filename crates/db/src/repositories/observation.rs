use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use agriwiz_core::domain::crop::CropName;
use agriwiz_core::domain::location::LocationName;
use agriwiz_core::domain::observation::{
    GrowingConditions, NewYieldObservation, ObservationId, YieldObservation,
};
use agriwiz_core::engine::history::{ConditionRanges, OptimalConditionsSummary};

use super::{ObservationRepository, RepositoryError};
use crate::DbPool;

const OBSERVATION_COLUMNS: &str = "id,
    crop_name,
    location_name,
    season,
    year,
    actual_yield,
    temperature,
    rainfall,
    humidity,
    soil_ph,
    soil_fertility,
    water_availability,
    farmer_id,
    notes,
    created_at";

pub struct SqlObservationRepository {
    pool: DbPool,
}

impl SqlObservationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn select_where(
        &self,
        clause: &str,
        binds: &[&str],
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        let sql = format!("SELECT {OBSERVATION_COLUMNS} FROM yield_observations {clause}");
        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(*value);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(observation_from_row).collect()
    }
}

/// Timestamps are stored at microsecond precision so values read back compare
/// equal to what `append` returned.
pub(crate) fn observation_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[async_trait::async_trait]
impl ObservationRepository for SqlObservationRepository {
    async fn append(
        &self,
        observation: NewYieldObservation,
    ) -> Result<YieldObservation, RepositoryError> {
        observation.validate()?;
        let created_at = observation_timestamp();

        let result = sqlx::query(
            "INSERT INTO yield_observations (
                crop_name,
                location_name,
                season,
                year,
                actual_yield,
                temperature,
                rainfall,
                humidity,
                soil_ph,
                soil_fertility,
                water_availability,
                farmer_id,
                notes,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&observation.crop_name.0)
        .bind(&observation.location_name.0)
        .bind(&observation.season)
        .bind(i64::from(observation.year))
        .bind(observation.actual_yield)
        .bind(observation.conditions.temperature)
        .bind(observation.conditions.rainfall)
        .bind(observation.conditions.humidity)
        .bind(observation.conditions.soil_ph)
        .bind(&observation.soil_fertility)
        .bind(&observation.water_availability)
        .bind(observation.farmer_id.as_deref())
        .bind(observation.notes.as_deref())
        .bind(created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        let id = ObservationId(result.last_insert_rowid());
        Ok(observation.into_observation(id, created_at))
    }

    async fn delete(&self, id: ObservationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM yield_observations WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(
        &self,
        id: ObservationId,
    ) -> Result<Option<YieldObservation>, RepositoryError> {
        let sql = format!("SELECT {OBSERVATION_COLUMNS} FROM yield_observations WHERE id = ?");
        let row = sqlx::query(&sql).bind(id.0).fetch_optional(&self.pool).await?;

        row.map(observation_from_row).transpose()
    }

    async fn snapshot(&self) -> Result<Vec<YieldObservation>, RepositoryError> {
        self.select_where("ORDER BY id ASC", &[]).await
    }

    async fn history(
        &self,
        crop: &CropName,
        location: &LocationName,
        season: &str,
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        self.select_where(
            "WHERE crop_name = ? AND location_name = ? AND season = ?
             ORDER BY year DESC, id ASC",
            &[crop.0.as_str(), location.0.as_str(), season],
        )
        .await
    }

    async fn for_crop(&self, crop: &CropName) -> Result<Vec<YieldObservation>, RepositoryError> {
        self.select_where("WHERE crop_name = ? ORDER BY created_at DESC, id DESC", &[crop.0.as_str()])
            .await
    }

    async fn for_location(
        &self,
        location: &LocationName,
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        self.select_where(
            "WHERE location_name = ? ORDER BY created_at DESC, id DESC",
            &[location.0.as_str()],
        )
        .await
    }

    async fn farmer_history(
        &self,
        farmer_id: &str,
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        self.select_where("WHERE farmer_id = ? ORDER BY created_at DESC, id DESC", &[farmer_id])
            .await
    }

    async fn distinct_crops(&self) -> Result<Vec<String>, RepositoryError> {
        let crops =
            sqlx::query_scalar("SELECT DISTINCT crop_name FROM yield_observations ORDER BY crop_name")
                .fetch_all(&self.pool)
                .await?;
        Ok(crops)
    }

    async fn distinct_locations(&self) -> Result<Vec<String>, RepositoryError> {
        let locations = sqlx::query_scalar(
            "SELECT DISTINCT location_name FROM yield_observations ORDER BY location_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    async fn average_yield(
        &self,
        crop: &CropName,
        location: &LocationName,
        season: &str,
        since_year: i32,
    ) -> Result<f64, RepositoryError> {
        let average: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(actual_yield)
             FROM yield_observations
             WHERE crop_name = ? AND location_name = ? AND season = ? AND year >= ?",
        )
        .bind(&crop.0)
        .bind(&location.0)
        .bind(season)
        .bind(i64::from(since_year))
        .fetch_one(&self.pool)
        .await?;

        Ok(average.unwrap_or(0.0))
    }

    async fn max_yield(
        &self,
        crop: &CropName,
        location: &LocationName,
    ) -> Result<Option<f64>, RepositoryError> {
        let max = sqlx::query_scalar(
            "SELECT MAX(actual_yield)
             FROM yield_observations
             WHERE crop_name = ? AND location_name = ?",
        )
        .bind(&crop.0)
        .bind(&location.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    async fn best_conditions(
        &self,
        crop: &CropName,
        ranges: &ConditionRanges,
        limit: usize,
    ) -> Result<Vec<YieldObservation>, RepositoryError> {
        let sql = format!(
            "SELECT {OBSERVATION_COLUMNS}
             FROM yield_observations
             WHERE crop_name = ?
               AND temperature BETWEEN ? AND ?
               AND rainfall BETWEEN ? AND ?
               AND humidity BETWEEN ? AND ?
             ORDER BY actual_yield DESC, id ASC
             LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(&crop.0)
            .bind(ranges.temperature.min)
            .bind(ranges.temperature.max)
            .bind(ranges.rainfall.min)
            .bind(ranges.rainfall.max)
            .bind(ranges.humidity.min)
            .bind(ranges.humidity.max)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(observation_from_row).collect()
    }

    async fn optimal_conditions(
        &self,
        crop: &CropName,
    ) -> Result<Option<OptimalConditionsSummary>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                AVG(actual_yield) AS avg_yield,
                AVG(temperature) AS avg_temperature,
                AVG(rainfall) AS avg_rainfall,
                AVG(humidity) AS avg_humidity,
                AVG(soil_ph) AS avg_soil_ph,
                COUNT(*) AS count
             FROM yield_observations
             WHERE crop_name = ?1
               AND actual_yield > (
                   SELECT AVG(actual_yield) FROM yield_observations WHERE crop_name = ?1
               )",
        )
        .bind(&crop.0)
        .fetch_one(&self.pool)
        .await?;

        let count = row.try_get::<i64, _>("count")?;
        if count == 0 {
            return Ok(None);
        }

        Ok(Some(OptimalConditionsSummary {
            avg_yield: row.try_get("avg_yield")?,
            avg_temperature: row.try_get("avg_temperature")?,
            avg_rainfall: row.try_get("avg_rainfall")?,
            avg_humidity: row.try_get("avg_humidity")?,
            avg_soil_ph: row.try_get("avg_soil_ph")?,
            count: usize::try_from(count).map_err(|_| {
                RepositoryError::Decode(format!("invalid observation count: {count}"))
            })?,
        }))
    }
}

fn observation_from_row(row: SqliteRow) -> Result<YieldObservation, RepositoryError> {
    let year = row.try_get::<i64, _>("year")?;

    Ok(YieldObservation {
        id: ObservationId(row.try_get("id")?),
        crop_name: CropName(row.try_get("crop_name")?),
        location_name: LocationName(row.try_get("location_name")?),
        season: row.try_get("season")?,
        year: i32::try_from(year)
            .map_err(|_| RepositoryError::Decode(format!("invalid value for `year`: {year}")))?,
        actual_yield: row.try_get("actual_yield")?,
        conditions: GrowingConditions {
            temperature: row.try_get("temperature")?,
            rainfall: row.try_get("rainfall")?,
            humidity: row.try_get("humidity")?,
            soil_ph: row.try_get("soil_ph")?,
        },
        soil_fertility: row.try_get("soil_fertility")?,
        water_availability: row.try_get("water_availability")?,
        farmer_id: row.try_get("farmer_id")?,
        notes: row.try_get("notes")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
