//! Heatmap catalog: the relational record of which artifact exists for each
//! (device, date, attribute) triple.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::Attribute;

// ---

/// Seam to the catalog store.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Record the artifact location for a triple, insert-or-update on the
    /// unique `(device, date, attribute)` key. Parent device and date rows
    /// are upserted first so referential structure always holds.
    async fn upsert_artifact(
        &self,
        device_id: &str,
        date: &str,
        attribute: Attribute,
        location: &str,
    ) -> Result<()>;

    /// All known device ids, ordered.
    async fn devices(&self) -> Result<Vec<String>>;

    /// All dates with at least one artifact for a device, ordered.
    async fn dates_for(&self, device_id: &str) -> Result<Vec<String>>;
}

// ---

/// PostgreSQL-backed catalog.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        PgCatalog { pool }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn upsert_artifact(
        &self,
        device_id: &str,
        date: &str,
        attribute: Attribute,
        location: &str,
    ) -> Result<()> {
        // ---
        // One transaction per key; concurrent upserts for the same key
        // serialize on the unique constraints rather than application locks.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO devices (device_id)
            VALUES ($1)
            ON CONFLICT (device_id) DO NOTHING
            "#,
        )
        .bind(device_id)
        .execute(&mut *tx)
        .await?;

        let date_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO dates (device_id, date)
            VALUES ($1, $2)
            ON CONFLICT (device_id, date) DO UPDATE
            SET date = EXCLUDED.date
            RETURNING date_id
            "#,
        )
        .bind(device_id)
        .bind(date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO attribute_data (date_id, attribute_name, csv_path)
            VALUES ($1, $2, $3)
            ON CONFLICT (date_id, attribute_name) DO UPDATE
            SET csv_path = EXCLUDED.csv_path
            "#,
        )
        .bind(date_id)
        .bind(attribute.name())
        .bind(location)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn devices(&self) -> Result<Vec<String>> {
        // ---
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT device_id FROM devices ORDER BY device_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn dates_for(&self, device_id: &str) -> Result<Vec<String>> {
        // ---
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT date FROM dates WHERE device_id = $1 ORDER BY date")
                .bind(device_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}
