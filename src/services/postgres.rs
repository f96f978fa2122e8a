use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::MatchEvent;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// Pool tuning, mirrors the `[database]` config section
#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// PostgreSQL client for recommendation events
///
/// Keeps track of which candidates a user already acted on (viewed,
/// dismissed, contacted, proposed a trade to) so `/matches/find` stops
/// recommending them.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connect and run the embedded migrations
    pub async fn connect(database_url: &str, options: PoolOptions) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.acquire_timeout)
            .idle_timeout(options.idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Build a client whose connections are opened on first use
    ///
    /// Does not run migrations.
    pub fn connect_lazy(database_url: &str, options: PoolOptions) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Record that a user acted on a recommended candidate, returning the row id
    ///
    /// A later event for the same pair replaces the earlier one and keeps its id.
    pub async fn record_event(&self, event: &MatchEvent) -> Result<i64, PostgresError> {
        let query = r#"
            INSERT INTO match_events (user_id, target_user_id, event_type, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, target_user_id)
            DO UPDATE SET
                event_type = EXCLUDED.event_type,
                created_at = EXCLUDED.created_at
            RETURNING id
        "#;

        let event_id: i64 = sqlx::query_scalar(query)
            .bind(&event.user_id)
            .bind(&event.target_user_id)
            .bind(event.event_type)
            .bind(event.created_at)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded match event {}: {} -> {} ({})",
            event_id,
            event.user_id,
            event.target_user_id,
            event.event_type.as_str()
        );

        Ok(event_id)
    }

    /// IDs of every candidate the user already acted on
    pub async fn get_seen_ids(&self, user_id: &str) -> Result<Vec<String>, PostgresError> {
        let query = r#"
            SELECT target_user_id
            FROM match_events
            WHERE user_id = $1
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let seen_ids: Vec<String> = rows
            .iter()
            .map(|row| row.try_get::<String, _>("target_user_id"))
            .collect::<Result<_, _>>()?;

        tracing::debug!("User {} has acted on {} candidates", user_id, seen_ids.len());

        Ok(seen_ids)
    }

    /// Forget every event for a user, returning how many were removed
    pub async fn clear_events(&self, user_id: &str) -> Result<u64, PostgresError> {
        let result = sqlx::query("DELETE FROM match_events WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            "Cleared {} match events for user {}",
            result.rows_affected(),
            user_id
        );

        Ok(result.rows_affected())
    }

    /// Per-type counts for a user
    pub async fn get_event_stats(&self, user_id: &str) -> Result<EventStats, PostgresError> {
        let query = r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE event_type = 'viewed') AS viewed,
                COUNT(*) FILTER (WHERE event_type = 'dismissed') AS dismissed,
                COUNT(*) FILTER (WHERE event_type = 'contacted') AS contacted,
                COUNT(*) FILTER (WHERE event_type = 'trade_proposed') AS trade_proposed,
                MAX(created_at) AS last_event_at
            FROM match_events
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query).bind(user_id).fetch_one(&self.pool).await?;

        Ok(EventStats {
            user_id: user_id.to_string(),
            total: row.try_get("total")?,
            viewed: row.try_get("viewed")?,
            dismissed: row.try_get("dismissed")?,
            contacted: row.try_get("contacted")?,
            trade_proposed: row.try_get("trade_proposed")?,
            last_event_at: row.try_get("last_event_at")?,
        })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Counts of a user's recommendation events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub user_id: String,
    pub total: i64,
    pub viewed: i64,
    pub dismissed: i64,
    pub contacted: i64,
    pub trade_proposed: i64,
    pub last_event_at: Option<chrono::DateTime<chrono::Utc>>,
}
