//! Sub-recursos de un vehículo: gastos, notas, imágenes, dispatch,
//! assessments y timeline.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fila de `vehicle_expenses`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub expense_date: NaiveDate,
    pub cost: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Gasto pendiente de insertar
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub expense_date: NaiveDate,
    pub cost: Decimal,
    pub notes: Option<String>,
}

/// Fila de `vehicle_notes`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleNote {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Tipo de archivo subido
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    #[default]
    Image,
    Document,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::Document => "document",
        }
    }
}

/// Fila de `vehicle_images`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleImage {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub url: String,
    pub kind: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Estados de transporte
pub const DISPATCH_STATUSES: [&str; 5] = ["Pending", "Assigned", "In Transit", "Delivered", "Cancelled"];

/// Fila de `vehicle_dispatch`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dispatch {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub transporter_id: Option<Uuid>,
    pub pickup_location: Option<String>,
    pub delivery_location: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub transport_cost: Option<Decimal>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fila de `vehicle_assessments`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub assessment_date: NaiveDate,
    pub condition: String,
    pub damage_notes: Option<String>,
    pub estimated_repair_cost: Option<Decimal>,
    pub assessed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Fila de `vehicle_timeline` (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub action: String,
    pub actor_id: Option<Uuid>,
    pub actor_name: Option<String>,
    pub action_date: NaiveDate,
    pub action_time: NaiveTime,
    pub cost: Option<Decimal>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Entrada de timeline pendiente de insertar
#[derive(Debug, Clone, PartialEq)]
pub struct NewTimelineEntry {
    pub action: String,
    pub cost: Option<Decimal>,
    pub note: Option<String>,
}

impl NewTimelineEntry {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            cost: None,
            note: None,
        }
    }

    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}
