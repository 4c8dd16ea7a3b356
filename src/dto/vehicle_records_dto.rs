use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle_records::UploadKind;
use crate::utils::validation::{validate_non_negative_amount, validate_not_empty};

// Request para crear un gasto
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    #[validate(custom = "validate_not_empty")]
    pub description: String,
    pub expense_date: NaiveDate,
    #[validate(custom = "validate_non_negative_amount")]
    pub cost: Decimal,
    pub notes: Option<String>,
}

// Request para actualizar un gasto
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExpenseRequest {
    #[validate(custom = "validate_not_empty")]
    pub description: Option<String>,
    pub expense_date: Option<NaiveDate>,
    #[validate(custom = "validate_non_negative_amount")]
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(custom = "validate_not_empty", length(max = 5000, message = "Note is too long"))]
    pub content: String,
}

// Subida de imagen/documento en JSON con el contenido en base64
#[derive(Debug, Deserialize, Validate)]
pub struct UploadFileRequest {
    #[validate(custom = "validate_not_empty")]
    pub file_name: String,
    pub content_type: Option<String>,
    #[serde(default)]
    pub kind: UploadKind,
    #[validate(custom = "validate_not_empty")]
    pub data_base64: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertDispatchRequest {
    pub transporter_id: Option<Uuid>,
    pub pickup_location: Option<String>,
    pub delivery_location: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    #[validate(custom = "validate_non_negative_amount")]
    pub transport_cost: Option<Decimal>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    pub assessment_date: Option<NaiveDate>,
    #[validate(custom = "validate_not_empty")]
    pub condition: String,
    pub damage_notes: Option<String>,
    #[validate(custom = "validate_non_negative_amount")]
    pub estimated_repair_cost: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTimelineEntryRequest {
    #[validate(custom = "validate_not_empty")]
    pub action: String,
    #[validate(custom = "validate_non_negative_amount")]
    pub cost: Option<Decimal>,
    pub note: Option<String>,
}
