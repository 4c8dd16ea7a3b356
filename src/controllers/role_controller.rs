//! Controller de roles
//!
//! Los roles de sistema no pueden renombrarse ni eliminarse, y un role
//! asignado a algún usuario tampoco puede eliminarse.

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::user_dto::{CreateRoleRequest, UpdateRoleRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::role::Role;
use crate::repositories::{AuditRepository, RoleRepository};
use crate::utils::errors::{forbidden_error, not_found_error, AppError};

pub fn check_role_update(role: &Role, request: &UpdateRoleRequest) -> Result<(), AppError> {
    let renamed = request
        .name
        .as_deref()
        .map_or(false, |name| name.trim() != role.name);
    if role.is_system_role && renamed {
        return Err(forbidden_error("rename role", "system roles cannot be renamed"));
    }
    Ok(())
}

pub fn check_role_delete(role: &Role, assigned_users: i64) -> Result<(), AppError> {
    if role.is_system_role {
        return Err(forbidden_error("delete role", "system roles cannot be deleted"));
    }
    if assigned_users > 0 {
        return Err(AppError::Conflict(format!(
            "Role '{}' is assigned to {} user(s); reassign them first",
            role.name, assigned_users
        )));
    }
    Ok(())
}

pub struct RoleController {
    roles: RoleRepository,
    audit: AuditRepository,
}

impl RoleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            roles: RoleRepository::new(pool.clone()),
            audit: AuditRepository::new(pool),
        }
    }

    async fn load(&self, id: Uuid) -> Result<Role, AppError> {
        self.roles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Role", &id.to_string()))
    }

    pub async fn list(&self, user: &AuthenticatedUser) -> Result<ApiResponse<Vec<Role>>, AppError> {
        user.require("user_management.view")?;
        Ok(ApiResponse::success(self.roles.list().await?))
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<Role>, AppError> {
        user.require("user_management.view")?;
        Ok(ApiResponse::success(self.load(id).await?))
    }

    pub async fn create(&self, user: &AuthenticatedUser, request: CreateRoleRequest) -> Result<ApiResponse<Role>, AppError> {
        user.require("user_management.create")?;
        request.validate()?;

        let role = self
            .roles
            .create(request.name.trim(), request.description.as_deref(), &request.permissions)
            .await?;
        self.audit
            .record(user.id(), "role.create", "role", Some(role.id), json!({ "name": role.name }))
            .await?;

        tracing::info!("🛡️ Role '{}' created by {}", role.name, user.id());
        Ok(ApiResponse::success_with_message(role, "Role created successfully"))
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateRoleRequest,
    ) -> Result<ApiResponse<Role>, AppError> {
        user.require("user_management.edit")?;
        request.validate()?;

        let current = self.load(id).await?;
        check_role_update(&current, &request)?;

        let permissions_changed = request.permissions.is_some();
        let role = self.roles.update(current, request).await?;
        self.audit
            .record(
                user.id(),
                "role.update",
                "role",
                Some(role.id),
                json!({ "name": role.name, "permissions_changed": permissions_changed }),
            )
            .await?;

        Ok(ApiResponse::success_with_message(role, "Role updated successfully"))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        user.require("user_management.delete")?;

        let role = self.load(id).await?;
        let assigned = self.roles.assigned_count(role.id).await?;
        check_role_delete(&role, assigned)?;

        self.roles.delete(role.id).await?;
        self.audit
            .record(user.id(), "role.delete", "role", Some(role.id), json!({ "name": role.name }))
            .await?;

        tracing::info!("🗑️ Role '{}' deleted by {}", role.name, user.id());
        Ok(ApiResponse::message("Role deleted successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Permissions;
    use chrono::Utc;
    use sqlx::types::Json;

    fn role(name: &str, is_system_role: bool) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            is_system_role,
            permissions: Json(Permissions::all_false()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rename(name: Option<&str>) -> UpdateRoleRequest {
        UpdateRoleRequest {
            name: name.map(str::to_string),
            description: None,
            permissions: Some(Permissions::all_true()),
        }
    }

    #[test]
    fn test_system_role_cannot_be_renamed() {
        let admin = role("Admin", true);
        assert!(matches!(check_role_update(&admin, &rename(Some("Boss"))), Err(AppError::Forbidden(_))));
        // Mismo nombre o sin nombre: sólo cambian permisos
        assert!(check_role_update(&admin, &rename(Some("Admin"))).is_ok());
        assert!(check_role_update(&admin, &rename(None)).is_ok());
        assert!(check_role_update(&role("Sales", false), &rename(Some("Closers"))).is_ok());
    }

    #[test]
    fn test_role_delete_rules() {
        assert!(matches!(check_role_delete(&role("Admin", true), 0), Err(AppError::Forbidden(_))));
        assert!(matches!(check_role_delete(&role("Sales", false), 3), Err(AppError::Conflict(_))));
        assert!(check_role_delete(&role("Sales", false), 0).is_ok());
    }
}
