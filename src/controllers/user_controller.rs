//! Controller de usuarios
//!
//! Este módulo contiene la administración de usuarios: asignación de role,
//! activación, reseteo de contraseña e impersonación. Cada acción de
//! administración queda registrada en `audit_logs`.

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::user_dto::{
    AssignRoleRequest, CurrentUserResponse, ImpersonationResponse, ResetPasswordRequest,
    ResetPasswordResponse, UpdateUserStatusRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    audit::AuditLog,
    profile::{Profile, ProfileStatus, ProfileWithRole},
    role::Role,
};
use crate::repositories::{AuditRepository, ProfileRepository, RoleRepository};
use crate::services::{
    auth_admin_service::{generate_password, AuthAdminClient},
    authorization_service,
};
use crate::utils::{
    errors::{bad_request_error, forbidden_error, not_found_error, AppError},
    jwt::{generate_impersonation_token, JwtConfig},
};

pub const DEFAULT_AUDIT_LIMIT: i64 = 100;
pub const MAX_AUDIT_LIMIT: i64 = 500;

/// Los administradores no pueden ser modificados desde la gestión de usuarios
pub fn check_admin_target(operation: &str, profile: &Profile, role: Option<&Role>) -> Result<(), AppError> {
    if authorization_service::is_admin(Some(profile), role) {
        return Err(forbidden_error(operation, "target user is an administrator"));
    }
    Ok(())
}

pub fn check_status_change(actor_id: Uuid, target_id: Uuid, status: ProfileStatus) -> Result<(), AppError> {
    if actor_id == target_id && status == ProfileStatus::Inactive {
        return Err(bad_request_error("You cannot deactivate your own account"));
    }
    Ok(())
}

pub fn check_impersonation(actor_id: Uuid, profile: &Profile, role: Option<&Role>) -> Result<(), AppError> {
    if actor_id == profile.id {
        return Err(bad_request_error("You cannot impersonate yourself"));
    }
    check_admin_target("impersonate user", profile, role)?;
    if !profile.is_active() {
        return Err(forbidden_error("impersonate user", "target account is inactive"));
    }
    Ok(())
}

pub fn clamp_audit_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, MAX_AUDIT_LIMIT)
}

pub struct UserController {
    profiles: ProfileRepository,
    roles: RoleRepository,
    audit: AuditRepository,
}

impl UserController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool.clone()),
            roles: RoleRepository::new(pool.clone()),
            audit: AuditRepository::new(pool),
        }
    }

    async fn load(&self, id: Uuid) -> Result<(Profile, Option<Role>), AppError> {
        self.profiles
            .find_with_role(id)
            .await?
            .ok_or_else(|| not_found_error("User", &id.to_string()))
    }

    pub async fn list(&self, user: &AuthenticatedUser) -> Result<ApiResponse<Vec<Profile>>, AppError> {
        user.require("user_management.view")?;
        Ok(ApiResponse::success(self.profiles.list().await?))
    }

    pub fn me(&self, user: &AuthenticatedUser) -> ApiResponse<CurrentUserResponse> {
        ApiResponse::success(CurrentUserResponse {
            is_admin: user.is_admin(),
            impersonated_by: user.impersonated_by,
            user: ProfileWithRole {
                profile: user.profile.clone(),
                role_data: user.role.clone(),
            },
        })
    }

    pub async fn assign_role(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: AssignRoleRequest,
    ) -> Result<ApiResponse<Profile>, AppError> {
        user.require("user_management.edit")?;

        let (target, role) = self.load(id).await?;
        check_admin_target("change role", &target, role.as_ref())?;

        if let Some(role_id) = request.role_id {
            let new_role = self
                .roles
                .find_by_id(role_id)
                .await?
                .ok_or_else(|| not_found_error("Role", &role_id.to_string()))?;
            if new_role.is_admin_role() {
                user.require_admin()?;
            }
        }

        let profile = self.profiles.assign_role(target.id, request.role_id).await?;
        self.audit
            .record(
                user.id(),
                "user.assign_role",
                "profile",
                Some(profile.id),
                json!({ "previous_role_id": target.role_id, "role_id": request.role_id }),
            )
            .await?;

        Ok(ApiResponse::success_with_message(profile, "Role assigned successfully"))
    }

    pub async fn set_status(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateUserStatusRequest,
    ) -> Result<ApiResponse<Profile>, AppError> {
        user.require("user_management.edit")?;
        check_status_change(user.id(), id, request.status)?;

        let (target, role) = self.load(id).await?;
        check_admin_target("change status", &target, role.as_ref())?;

        let profile = self.profiles.set_status(target.id, request.status).await?;
        self.audit
            .record(
                user.id(),
                "user.set_status",
                "profile",
                Some(profile.id),
                json!({ "previous": target.status, "status": request.status.as_str() }),
            )
            .await?;

        tracing::info!("👤 User {} is now {}", profile.id, request.status.as_str());
        Ok(ApiResponse::success_with_message(profile, "Status updated successfully"))
    }

    pub async fn reset_password(
        &self,
        user: &AuthenticatedUser,
        auth_admin: &AuthAdminClient,
        id: Uuid,
        request: ResetPasswordRequest,
    ) -> Result<ApiResponse<ResetPasswordResponse>, AppError> {
        user.require("user_management.edit")?;
        request.validate()?;

        let (target, role) = self.load(id).await?;
        if target.id != user.id() {
            check_admin_target("reset password", &target, role.as_ref())?;
        }

        let (password, generated) = match request.password {
            Some(password) => (password, false),
            None => (generate_password(), true),
        };
        auth_admin.set_password(target.id, &password).await?;

        self.audit
            .record(
                user.id(),
                "user.reset_password",
                "profile",
                Some(target.id),
                json!({ "generated": generated }),
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            ResetPasswordResponse {
                user_id: target.id,
                temporary_password: generated.then_some(password),
            },
            "Password reset successfully",
        ))
    }

    pub async fn impersonate(
        &self,
        user: &AuthenticatedUser,
        jwt: &JwtConfig,
        id: Uuid,
    ) -> Result<ApiResponse<ImpersonationResponse>, AppError> {
        user.require_admin()?;
        if user.impersonated_by.is_some() {
            return Err(forbidden_error("impersonate user", "already impersonating"));
        }

        let (target, role) = self.load(id).await?;
        check_impersonation(user.id(), &target, role.as_ref())?;

        let (access_token, expires_at) =
            generate_impersonation_token(target.id, target.email.clone(), user.id(), jwt)?;

        self.audit
            .record(
                user.id(),
                "user.impersonate",
                "profile",
                Some(target.id),
                json!({ "expires_at": expires_at }),
            )
            .await?;

        tracing::warn!("🎭 Admin {} is impersonating {}", user.id(), target.id);
        Ok(ApiResponse::success(ImpersonationResponse {
            access_token,
            token_type: "Bearer",
            expires_at,
            user_id: target.id,
            impersonated_by: user.id(),
        }))
    }

    pub async fn audit_logs(&self, user: &AuthenticatedUser, limit: Option<i64>) -> Result<ApiResponse<Vec<AuditLog>>, AppError> {
        user.require_admin()?;
        let logs = self.audit.recent(clamp_audit_limit(limit)).await?;
        Ok(ApiResponse::success(logs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::fixtures::profile;

    #[test]
    fn test_admin_targets_are_protected() {
        assert!(check_admin_target("change role", &profile("admin"), None).is_err());
        assert!(check_admin_target("change role", &profile("seller"), None).is_ok());
    }

    #[test]
    fn test_cannot_deactivate_self() {
        let me = Uuid::new_v4();
        assert!(check_status_change(me, me, ProfileStatus::Inactive).is_err());
        assert!(check_status_change(me, me, ProfileStatus::Active).is_ok());
        assert!(check_status_change(me, Uuid::new_v4(), ProfileStatus::Inactive).is_ok());
    }

    #[test]
    fn test_impersonation_requires_active_non_admin() {
        let admin_id = Uuid::new_v4();

        let target = profile("seller");
        assert!(check_impersonation(admin_id, &target, None).is_ok());

        let mut inactive = profile("seller");
        inactive.status = ProfileStatus::Inactive.as_str().to_string();
        assert!(check_impersonation(admin_id, &inactive, None).is_err());

        assert!(check_impersonation(admin_id, &profile("admin"), None).is_err());
        assert!(check_impersonation(target.id, &target, None).is_err());
    }

    #[test]
    fn test_audit_limit_is_clamped() {
        assert_eq!(clamp_audit_limit(None), DEFAULT_AUDIT_LIMIT);
        assert_eq!(clamp_audit_limit(Some(0)), 1);
        assert_eq!(clamp_audit_limit(Some(10_000)), MAX_AUDIT_LIMIT);
    }
}
