use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::work_item::WorkItemStatus;
use crate::utils::validation::validate_not_empty;

// Request para crear un task/event
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkItemRequest {
    #[validate(custom = "validate_not_empty", length(max = 200, message = "Title is too long"))]
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub due_time: Option<NaiveTime>,
    pub assigned_to: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
}

// Request para actualizar un task/event
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWorkItemRequest {
    #[validate(custom = "validate_not_empty", length(max = 200, message = "Title is too long"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub assigned_to: Option<Uuid>,
    pub status: Option<WorkItemStatus>,
    pub vehicle_id: Option<Uuid>,
}

/// Filtros de listado
#[derive(Debug, Default, Deserialize)]
pub struct WorkItemFilters {
    pub status: Option<WorkItemStatus>,
    pub assigned_to: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
}
