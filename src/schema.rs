//! Database schema management for the heatmap catalog.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the catalog schema (idempotent).
///
/// Three tables: `devices`, `dates` (unique per device/date), and
/// `attribute_data` (unique per date/attribute, holding the artifact
/// location). Safe to call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            device_id TEXT PRIMARY KEY
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dates (
            date_id   SERIAL PRIMARY KEY,
            device_id TEXT REFERENCES devices(device_id) ON DELETE CASCADE,
            date      TEXT NOT NULL,
            UNIQUE (device_id, date)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attribute_data (
            attribute_id   SERIAL PRIMARY KEY,
            date_id        INT REFERENCES dates(date_id) ON DELETE CASCADE,
            attribute_name TEXT NOT NULL,
            csv_path       TEXT NOT NULL,
            UNIQUE (date_id, attribute_name)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic index for the per-device date listing
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_dates_device_id
            ON dates (device_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
