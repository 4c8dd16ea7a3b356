use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    profile::{Profile, ProfileStatus},
    role::Role,
};
use crate::utils::errors::AppError;

pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    /// Profile junto con su role asignado (si existe)
    pub async fn find_with_role(&self, id: Uuid) -> Result<Option<(Profile, Option<Role>)>, AppError> {
        let Some(profile) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let role = match profile.role_id {
            Some(role_id) => {
                sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
                    .bind(role_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        Ok(Some((profile, role)))
    }

    pub async fn list(&self) -> Result<Vec<Profile>, AppError> {
        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles ORDER BY full_name NULLS LAST, email",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    pub async fn assign_role(&self, id: Uuid, role_id: Option<Uuid>) -> Result<Profile, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET role_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(profile)
    }

    pub async fn set_status(&self, id: Uuid, status: ProfileStatus) -> Result<Profile, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(profile)
    }
}
