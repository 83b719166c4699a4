//! PostgreSQL store: connection pool, migrations, sighting/alert writes

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use super::{SightingStore, StoreError, WatchlistStore};
use crate::types::{normalize_plate, Alert, CustomWatchlistEntry, Priority, SightingRecord};

/// Create a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Run database migrations from the migrations/ directory
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Migrations complete");
    Ok(())
}

/// Map unique-key violations to `Duplicate`, everything else to `Database`.
fn classify(e: sqlx::Error, key: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(key.to_string())
        }
        _ => StoreError::Database(e),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SightingStore for PgStore {
    async fn insert_sighting(&self, rec: &SightingRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO plate_sightings (
                sighting_id, vehicle_id, trip_id, plate_number, plate_state,
                confidence, timestamp, gps_lat, gps_lng,
                rego_status, rego_expiry, vehicle_make, vehicle_model,
                vehicle_year, vehicle_colour, vin,
                stolen_flag, stolen_jurisdiction, stolen_date,
                wovr_status, wovr_type, ppsr_encumbered,
                watchlist_hit, watchlist_priority)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                       $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)"#,
        )
        .bind(rec.sighting_id)
        .bind(&rec.vehicle_id)
        .bind(&rec.trip_id)
        .bind(&rec.plate_number)
        .bind(&rec.plate_state)
        .bind(rec.confidence)
        .bind(rec.timestamp)
        .bind(rec.gps_lat)
        .bind(rec.gps_lng)
        .bind(&rec.rego_status)
        .bind(&rec.rego_expiry)
        .bind(&rec.vehicle_make)
        .bind(&rec.vehicle_model)
        .bind(rec.vehicle_year)
        .bind(&rec.vehicle_colour)
        .bind(&rec.vin)
        .bind(rec.stolen_flag)
        .bind(&rec.stolen_jurisdiction)
        .bind(&rec.stolen_date)
        .bind(&rec.wovr_status)
        .bind(&rec.wovr_type)
        .bind(rec.ppsr_encumbered)
        .bind(&rec.watchlist_hit)
        .bind(rec.watchlist_priority.map(Priority::as_str))
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, &rec.sighting_id.to_string()))?;

        Ok(())
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        let details = serde_json::json!({
            "vehicle": alert.vehicle,
            "watchlist_hit": alert.hit,
        });
        let vehicle = alert.vehicle.as_ref();

        sqlx::query(
            r#"INSERT INTO watchlist_alerts (
                alert_id, sighting_id, plate_number, vehicle_id, jurisdiction,
                alert_type, source, priority, reason,
                vehicle_make, vehicle_model, vehicle_colour,
                gps_lat, gps_lng, timestamp, details, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                       $13, $14, $15, $16, $17)"#,
        )
        .bind(alert.alert_id)
        .bind(alert.sighting_id)
        .bind(&alert.plate_number)
        .bind(&alert.vehicle_id)
        .bind(&alert.jurisdiction)
        .bind(alert.hit.kind.as_str())
        .bind(alert.hit.source.as_str())
        .bind(alert.hit.priority.as_str())
        .bind(&alert.hit.reason)
        .bind(vehicle.and_then(|v| v.make.clone()))
        .bind(vehicle.and_then(|v| v.model.clone()))
        .bind(vehicle.and_then(|v| v.colour.clone()))
        .bind(alert.location.lat)
        .bind(alert.location.lng)
        .bind(alert.timestamp)
        .bind(&details)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, &alert.alert_id.to_string()))?;

        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait]
impl WatchlistStore for PgStore {
    async fn find_entry(&self, plate: &str) -> Result<Option<CustomWatchlistEntry>, StoreError> {
        // Operators may key entries with separators or lower case; compare in
        // the same canonical form intake uses (idx_plate_watchlist_normalized).
        let row: Option<(String, String, Option<String>, Option<String>)> = sqlx::query_as(
            r#"SELECT plate_number, reason, priority, notes
               FROM plate_watchlist
               WHERE upper(regexp_replace(plate_number, '[^A-Za-z0-9]', '', 'g')) = $1
               ORDER BY created_at DESC
               LIMIT 1"#,
        )
        .bind(normalize_plate(plate))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(plate_number, reason, priority, notes)| CustomWatchlistEntry {
            plate_number,
            reason,
            priority,
            notes,
        }))
    }
}
