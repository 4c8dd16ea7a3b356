//! Modelo de Profile (usuario de la aplicación)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::Role;

/// Valor legacy de `profiles.role` para administradores
pub const LEGACY_ADMIN_ROLE: &str = "admin";
pub const LEGACY_TRANSPORTER_ROLE: &str = "transporter";

/// Estado de la cuenta
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Active,
    Inactive,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "active",
            ProfileStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProfileStatus::Active),
            "inactive" => Some(ProfileStatus::Inactive),
            _ => None,
        }
    }
}

/// Fila de `profiles`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: String,
    pub role_id: Option<Uuid>,
    pub status: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_active(&self) -> bool {
        ProfileStatus::from_str(&self.status) == Some(ProfileStatus::Active)
    }

    pub fn is_transporter(&self) -> bool {
        self.role == LEGACY_TRANSPORTER_ROLE
    }

    /// Nombre para mostrar en timeline y mensajes
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Profile con su role asignado resuelto
#[derive(Debug, Clone, Serialize)]
pub struct ProfileWithRole {
    #[serde(flatten)]
    pub profile: Profile,
    pub role_data: Option<Role>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn profile(legacy_role: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: Some(format!("{}@dealer.test", legacy_role)),
            full_name: Some(format!("Test {}", legacy_role)),
            role: legacy_role.to_string(),
            role_id: None,
            status: "active".to_string(),
            phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
