use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::models::audit::{AuditLog, DropdownSetting};
use crate::utils::errors::AppError;

pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        actor_id: Uuid,
        action: &str,
        target_type: &str,
        target_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> Result<AuditLog, AppError> {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (actor_id, action, target_type, target_id, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(actor_id)
        .bind(action)
        .bind(target_type)
        .bind(target_id)
        .bind(Json(details))
        .fetch_one(&self.pool)
        .await?;
        Ok(log)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditLog>, AppError> {
        let logs = sqlx::query_as::<_, AuditLog>("SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }

    pub async fn dropdowns(&self, category: Option<&str>) -> Result<Vec<DropdownSetting>, AppError> {
        let settings = sqlx::query_as::<_, DropdownSetting>(
            "SELECT * FROM dropdown_settings WHERE ($1::text IS NULL OR category = $1) ORDER BY category",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(settings)
    }

    pub async fn upsert_dropdown(
        &self,
        category: &str,
        options: &[String],
        updated_by: Uuid,
    ) -> Result<DropdownSetting, AppError> {
        let setting = sqlx::query_as::<_, DropdownSetting>(
            r#"
            INSERT INTO dropdown_settings (category, options, updated_by, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (category) DO UPDATE SET
                options = EXCLUDED.options,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(category)
        .bind(Json(options))
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(setting)
    }
}
