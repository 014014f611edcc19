use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Crop names the sample catalog must contain after a load.
const SEED_CROPS: &[&str] = &[
    "Rice",
    "Wheat",
    "Corn",
    "Cotton",
    "Sugarcane",
    "Potato",
    "Tomato",
    "Soybean",
    "Barley",
    "Oats",
    "Chickpea",
    "Mustard",
    "Groundnut",
    "Sunflower",
    "Mango",
    "Banana",
    "Coffee",
    "Tea",
    "Cashew",
    "Coconut",
    "Orange",
    "Apple",
    "Grape",
    "Onion",
    "Garlic",
    "Turmeric",
    "Ginger",
    "Chili Pepper",
    "Cardamom",
    "Black Pepper",
];

const SEED_LOCATIONS: &[&str] = &["punjab", "kerala", "california"];

/// Deterministic sample catalog and locations for local runs and tests.
///
/// Loading is idempotent: rows that already exist (by name) are left as they
/// are, so operator edits survive a re-seed.
pub struct SampleDataset;

impl SampleDataset {
    pub const SQL: &'static str = include_str!("../../../config/fixtures/agriwiz_seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let crops_before = count(pool, "crops").await?;
        let locations_before = count(pool, "locations").await?;

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(Self::SQL).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(SeedResult {
            crops_inserted: count(pool, "crops").await? - crops_before,
            locations_inserted: count(pool, "locations").await? - locations_before,
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for name in SEED_CROPS {
            let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM crops WHERE name = ?1)")
                .bind(name)
                .fetch_one(pool)
                .await?;
            checks.push((*name, exists == 1));
        }

        for name in SEED_LOCATIONS {
            let exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM locations WHERE name = ?1)")
                    .bind(name)
                    .fetch_one(pool)
                    .await?;
            checks.push((*name, exists == 1));
        }

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the sample rows only; observations are never touched.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        sqlx::query(&format!("DELETE FROM crops WHERE name IN {}", sql_array_from_names(SEED_CROPS)))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "DELETE FROM locations WHERE name IN {}",
            sql_array_from_names(SEED_LOCATIONS)
        ))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn count(pool: &DbPool, table: &str) -> Result<i64, RepositoryError> {
    let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}")).fetch_one(pool).await?;
    Ok(count)
}

fn sql_array_from_names(names: &[&str]) -> String {
    let quoted = names
        .iter()
        .map(|name| format!("'{}'", name.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub crops_inserted: i64,
    pub locations_inserted: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
