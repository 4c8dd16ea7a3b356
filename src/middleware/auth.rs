//! Middleware de autenticación JWT
//!
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y carga del usuario autenticado con su role.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    models::{profile::Profile, role::Role},
    repositories::{vehicle_records_repository::Actor, ProfileRepository},
    services::authorization_service,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub profile: Profile,
    pub role: Option<Role>,
    /// Admin que está impersonando a este usuario
    pub impersonated_by: Option<Uuid>,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.profile.id
    }

    /// Autor de las entradas de timeline
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.profile.id,
            name: self.profile.display_name(),
        }
    }

    pub fn is_admin(&self) -> bool {
        authorization_service::is_admin(Some(&self.profile), self.role.as_ref())
    }

    pub fn can(&self, path: &str) -> bool {
        authorization_service::can(Some(&self.profile), self.role.as_ref(), path)
    }

    /// Error 403 si el usuario no tiene el permiso `"módulo.permiso"`
    pub fn require(&self, path: &str) -> Result<(), AppError> {
        if self.can(path) {
            Ok(())
        } else {
            tracing::warn!("🚫 User {} lacks permission {}", self.id(), path);
            Err(AppError::Forbidden(format!("Missing permission '{}'", path)))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator access required".to_string()))
        }
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.jwt)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".to_string()))?;
    let impersonated_by = claims
        .impersonated_by
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| AppError::Unauthorized("Invalid impersonator id in token".to_string()))?;

    // Verificar que el usuario existe en la base de datos
    let (profile, role) = ProfileRepository::new(state.pool.clone())
        .find_with_role(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User profile not found".to_string()))?;

    if !profile.is_active() {
        return Err(AppError::Forbidden("Account is inactive".to_string()));
    }

    if let Some(admin_id) = impersonated_by {
        tracing::debug!("🎭 Request by {} impersonated by {}", profile.id, admin_id);
    }

    request.extensions_mut().insert(AuthenticatedUser {
        profile,
        role,
        impersonated_by,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::profile::fixtures::profile;

    pub fn user(legacy_role: &str, role: Option<Role>) -> AuthenticatedUser {
        AuthenticatedUser {
            profile: profile(legacy_role),
            role,
            impersonated_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::user;
    use crate::models::role::Permissions;

    #[test]
    fn test_legacy_admin_bypasses_permissions() {
        let admin = user("admin", None);
        assert!(admin.is_admin());
        assert!(admin.require("user_management.impersonate").is_ok());
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_user_without_role_is_denied() {
        let seller = user("seller", None);
        assert!(!seller.is_admin());
        assert!(seller.require("inventory.view").is_err());
        assert!(seller.require_admin().is_err());
    }

    #[test]
    fn test_role_permissions_are_consulted() {
        let mut permissions = Permissions::all_false();
        permissions.inventory.view = true;
        let role = crate::models::role::Role {
            id: uuid::Uuid::new_v4(),
            name: "Sales".to_string(),
            description: None,
            is_system_role: false,
            permissions: sqlx::types::Json(permissions),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let seller = user("seller", Some(role));
        assert!(seller.require("inventory.view").is_ok());
        assert!(seller.require("inventory.delete").is_err());
    }
}
