//! Tasks y events
//!
//! Las dos tablas comparten columnas; `WorkItemKind` decide cuál se usa.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItemKind {
    Task,
    Event,
}

impl WorkItemKind {
    pub fn table(&self) -> &'static str {
        match self {
            WorkItemKind::Task => "tasks",
            WorkItemKind::Event => "events",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkItemKind::Task => "Task",
            WorkItemKind::Event => "Event",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemStatus {
    Pending,
    Completed,
    Cancelled,
}

impl WorkItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemStatus::Pending => "pending",
            WorkItemStatus::Completed => "completed",
            WorkItemStatus::Cancelled => "cancelled",
        }
    }
}

/// Fila de `tasks` / `events`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub due_time: Option<NaiveTime>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub status: String,
    pub vehicle_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// El usuario participa en el item (asignado o creador)
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.assigned_to == Some(user_id) || self.created_by == Some(user_id)
    }
}
