use sqlx::PgPool;
use sqlx::Row;
use tracing::error;

use crate::errors::AppError;
use crate::models::{PrivateProfile, ProfilePreferences, PublicProfile, UserProfileContext};

/// Read-only access to the profile table. Profiles are written by the
/// account subsystem; the chat service only loads them as prompt context.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_context(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProfileContext>, AppError> {
        let row = sqlx::query(
            "SELECT first_name, age, gender, hobbies, preferred_vibes
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch profile for user {user_id}: {e}");
            AppError::db_query(format!("Failed to fetch profile for user {user_id}"), e)
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let first_name: String = row.try_get("first_name")
            .map_err(|e| AppError::db_query("Failed to read first_name", e))?;
        let age: Option<i32> = row.try_get("age")
            .map_err(|e| AppError::db_query("Failed to read age", e))?;
        let gender: Option<String> = row.try_get("gender")
            .map_err(|e| AppError::db_query("Failed to read gender", e))?;
        let hobbies: Option<String> = row.try_get("hobbies")
            .map_err(|e| AppError::db_query("Failed to read hobbies", e))?;
        let preferred_vibes: Option<Vec<String>> = row.try_get("preferred_vibes")
            .map_err(|e| AppError::db_query("Failed to read preferred_vibes", e))?;

        let private = match (hobbies, preferred_vibes) {
            (None, None) => None,
            (hobbies, vibes) => Some(PrivateProfile {
                hobbies,
                preferences: vibes.map(|preferred_vibes| ProfilePreferences {
                    preferred_vibes: Some(preferred_vibes),
                }),
            }),
        };

        Ok(Some(UserProfileContext {
            public: Some(PublicProfile { first_name, age, gender }),
            private,
        }))
    }
}
