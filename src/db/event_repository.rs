use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::Event;

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT id, title, activity, details, created_by, created_at
             FROM events ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch events: {e}");
            AppError::db_query("Failed to fetch events", e)
        })
    }

    pub async fn save(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query(
            "INSERT INTO events (id, title, activity, details, created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.activity)
        .bind(&event.details)
        .bind(&event.created_by)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save event {}: {e}", event.id);
            AppError::db_query("Failed to save event", e)
        })?;
        Ok(event.clone())
    }
}
