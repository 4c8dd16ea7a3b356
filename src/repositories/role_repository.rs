use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::dto::user_dto::UpdateRoleRequest;
use crate::models::role::{Permissions, Role};
use crate::utils::errors::AppError;

pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY is_system_role DESC, name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        permissions: &Permissions,
    ) -> Result<Role, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description, is_system_role, permissions)
            VALUES ($1, $2, FALSE, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(Json(permissions))
        .fetch_one(&self.pool)
        .await?;
        Ok(role)
    }

    pub async fn update(&self, current: Role, request: UpdateRoleRequest) -> Result<Role, AppError> {
        let permissions = request.permissions.unwrap_or(current.permissions.0);

        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = $2, description = $3, permissions = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(current.id)
        .bind(request.name.map(|n| n.trim().to_string()).unwrap_or(current.name))
        .bind(request.description.or(current.description))
        .bind(Json(permissions))
        .fetch_one(&self.pool)
        .await?;
        Ok(role)
    }

    /// Cantidad de profiles que tienen asignado el role
    pub async fn assigned_count(&self, id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE role_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
