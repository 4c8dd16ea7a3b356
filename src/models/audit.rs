//! Audit log y configuración de dropdowns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

/// Fila de `audit_logs`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<Uuid>,
    pub details: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Fila de `dropdown_settings`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DropdownSetting {
    pub category: String,
    pub options: Json<Vec<String>>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}
