use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::FeatureRow;
use crate::store::HistoryStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Message history kept in Postgres, ordered by insertion sequence.
#[derive(Clone)]
pub struct PgHistory {
    pool: PgPool,
}

impl PgHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent rows for a customer with their timestamps, newest first.
    pub async fn timeline(
        &self,
        customer_id: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<(DateTime<Utc>, FeatureRow)>> {
        let rows = sqlx::query(
            r#"
            SELECT features, created_at
            FROM churn_signal.message_features
            WHERE customer_id = $1
            ORDER BY seq DESC
            LIMIT $2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut timeline = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(features): Json<FeatureRow> = row.try_get("features")?;
            timeline.push((row.try_get("created_at")?, features));
        }
        Ok(timeline)
    }
}

impl HistoryStore for PgHistory {
    async fn append(&self, customer_id: &str, row: FeatureRow) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO churn_signal.message_features (id, customer_id, features)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(Json(row))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, customer_id: &str) -> anyhow::Result<Option<Vec<FeatureRow>>> {
        let rows = sqlx::query(
            "SELECT features FROM churn_signal.message_features WHERE customer_id = $1 ORDER BY seq",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(features): Json<FeatureRow> = row.try_get("features")?;
            history.push(features);
        }
        Ok(Some(history))
    }
}
