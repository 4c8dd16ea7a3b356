use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    profile::{ProfileStatus, ProfileWithRole},
    role::Permissions,
};
use crate::utils::validation::validate_not_empty;

// Request para crear un role
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(custom = "validate_not_empty", length(max = 100, message = "Role name is too long"))]
    pub name: String,
    pub description: Option<String>,
    /// Ausente = plantilla con todo en false
    #[serde(default)]
    pub permissions: Permissions,
}

// Request para actualizar un role
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(custom = "validate_not_empty", length(max = 100, message = "Role name is too long"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub status: ProfileStatus,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, max = 72, message = "Password must be between 8 and 72 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub user_id: Uuid,
    /// Sólo presente cuando el servidor generó la contraseña
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImpersonationResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub impersonated_by: Uuid,
}

/// Usuario actual con sus permisos efectivos
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    #[serde(flatten)]
    pub user: ProfileWithRole,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DropdownQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDropdownRequest {
    #[validate(length(max = 200, message = "Too many options"))]
    pub options: Vec<String>,
}
