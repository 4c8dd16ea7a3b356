//! Evaluador de permisos
//!
//! Búsqueda pura sobre la tabla de permisos del role: default-deny y
//! bypass total para administradores.

use crate::models::{
    profile::{Profile, LEGACY_ADMIN_ROLE},
    role::{Permissions, Role},
};

/// `true` si la hoja `"módulo.permiso"` está activa.
///
/// Un objeto ausente, un módulo u hoja desconocidos, o una ruta mal formada
/// devuelven `false`.
pub fn has_permission(permissions: Option<&Permissions>, path: &str) -> bool {
    let Some(permissions) = permissions else {
        return false;
    };
    let Some((module, permission)) = path.split_once('.') else {
        return false;
    };
    if permission.contains('.') {
        return false;
    }
    permissions.lookup(module, permission).unwrap_or(false)
}

/// Administrador: role legacy `"admin"` o role asignado llamado `"Admin"`
pub fn is_admin(profile: Option<&Profile>, role: Option<&Role>) -> bool {
    let Some(profile) = profile else {
        return false;
    };
    profile.role == LEGACY_ADMIN_ROLE || role.map_or(false, |r| r.is_admin_role())
}

/// Verificación completa: admin pasa siempre, el resto consulta su role
pub fn can(profile: Option<&Profile>, role: Option<&Role>, path: &str) -> bool {
    is_admin(profile, role) || has_permission(role.map(|r| &r.permissions.0), path)
}
