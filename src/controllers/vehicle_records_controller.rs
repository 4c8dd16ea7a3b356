//! Controller de sub-recursos de vehículos
//!
//! Gastos, notas, archivos, dispatch, assessments y timeline. Cada
//! operación verifica que el vehículo exista antes de tocar el sub-recurso.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::vehicle_records_dto::{
    CreateAssessmentRequest, CreateExpenseRequest, CreateNoteRequest, CreateTimelineEntryRequest,
    UpdateExpenseRequest, UploadFileRequest, UpsertDispatchRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::vehicle_records::{
    Assessment, Dispatch, Expense, NewExpense, NewTimelineEntry, TimelineEntry, UploadKind,
    VehicleImage, VehicleNote, DISPATCH_STATUSES,
};
use crate::repositories::{VehicleRecordsRepository, VehicleRepository};
use crate::services::storage_service::StorageClient;
use crate::utils::errors::{forbidden_error, not_found_error, AppError};

/// Estado de dispatch válido; ausente = "Pending"
pub fn resolve_dispatch_status(status: Option<&str>) -> Result<&'static str, AppError> {
    let Some(status) = status.map(str::trim) else {
        return Ok(DISPATCH_STATUSES[0]);
    };
    DISPATCH_STATUSES
        .iter()
        .copied()
        .find(|s| s.eq_ignore_ascii_case(status))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid dispatch status '{}'. Allowed: {}",
                status,
                DISPATCH_STATUSES.join(", ")
            ))
        })
}

pub struct VehicleRecordsController {
    pool: PgPool,
    vehicles: VehicleRepository,
    records: VehicleRecordsRepository,
}

impl VehicleRecordsController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            vehicles: VehicleRepository::new(pool.clone()),
            records: VehicleRecordsRepository::new(pool.clone()),
            pool,
        }
    }

    async fn ensure_vehicle(&self, vehicle_id: Uuid) -> Result<(), AppError> {
        match self.vehicles.find_by_id(vehicle_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found_error("Vehicle", &vehicle_id.to_string())),
        }
    }

    // ---------------------------------------------------------------- gastos

    pub async fn list_expenses(&self, user: &AuthenticatedUser, vehicle_id: Uuid) -> Result<ApiResponse<Vec<Expense>>, AppError> {
        user.require("accounting.view")?;
        self.ensure_vehicle(vehicle_id).await?;
        Ok(ApiResponse::success(self.records.list_expenses(vehicle_id).await?))
    }

    pub async fn create_expense(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<ApiResponse<Expense>, AppError> {
        user.require("accounting.create")?;
        request.validate()?;
        self.ensure_vehicle(vehicle_id).await?;

        let new_expense = NewExpense {
            description: request.description.trim().to_string(),
            expense_date: request.expense_date,
            cost: request.cost,
            notes: request.notes,
        };

        let mut tx = self.pool.begin().await?;
        let expense = VehicleRecordsRepository::insert_expense(&mut *tx, vehicle_id, &new_expense, user.id()).await?;
        let entry = NewTimelineEntry::new(format!("Expense Added: {}", expense.description)).with_cost(expense.cost);
        VehicleRecordsRepository::append_timeline(&mut *tx, vehicle_id, &entry, &user.actor()).await?;
        tx.commit().await?;

        Ok(ApiResponse::success_with_message(expense, "Expense added"))
    }

    pub async fn update_expense(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<ApiResponse<Expense>, AppError> {
        user.require("accounting.edit")?;
        request.validate()?;

        let current = self
            .records
            .find_expense(vehicle_id, expense_id)
            .await?
            .ok_or_else(|| not_found_error("Expense", &expense_id.to_string()))?;
        let expense = self.records.update_expense(current, request).await?;
        Ok(ApiResponse::success_with_message(expense, "Expense updated"))
    }

    pub async fn delete_expense(&self, user: &AuthenticatedUser, vehicle_id: Uuid, expense_id: Uuid) -> Result<ApiResponse<()>, AppError> {
        user.require("accounting.delete")?;
        self.records.delete_expense(vehicle_id, expense_id).await?;
        Ok(ApiResponse::message("Expense deleted"))
    }

    // ----------------------------------------------------------------- notas

    pub async fn list_notes(&self, user: &AuthenticatedUser, vehicle_id: Uuid) -> Result<ApiResponse<Vec<VehicleNote>>, AppError> {
        user.require("inventory.view")?;
        self.ensure_vehicle(vehicle_id).await?;
        Ok(ApiResponse::success(self.records.list_notes(vehicle_id).await?))
    }

    pub async fn create_note(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
        request: CreateNoteRequest,
    ) -> Result<ApiResponse<VehicleNote>, AppError> {
        user.require("inventory.edit")?;
        request.validate()?;
        self.ensure_vehicle(vehicle_id).await?;

        let note = self.records.create_note(vehicle_id, request.content.trim(), user.id()).await?;
        Ok(ApiResponse::success_with_message(note, "Note added"))
    }

    pub async fn delete_note(&self, user: &AuthenticatedUser, vehicle_id: Uuid, note_id: Uuid) -> Result<ApiResponse<()>, AppError> {
        let note = self
            .records
            .find_note(vehicle_id, note_id)
            .await?
            .ok_or_else(|| not_found_error("Note", &note_id.to_string()))?;

        if note.author_id != Some(user.id()) && !user.is_admin() {
            return Err(forbidden_error("delete note", "only the author or an administrator can delete it"));
        }

        self.records.delete_note(note.id).await?;
        Ok(ApiResponse::message("Note deleted"))
    }

    // -------------------------------------------------------------- archivos

    pub async fn list_images(&self, user: &AuthenticatedUser, vehicle_id: Uuid) -> Result<ApiResponse<Vec<VehicleImage>>, AppError> {
        user.require("inventory.view")?;
        self.ensure_vehicle(vehicle_id).await?;
        Ok(ApiResponse::success(self.records.list_images(vehicle_id).await?))
    }

    pub async fn upload_image(
        &self,
        user: &AuthenticatedUser,
        storage: &StorageClient,
        vehicle_id: Uuid,
        request: UploadFileRequest,
    ) -> Result<ApiResponse<VehicleImage>, AppError> {
        user.require("inventory.edit")?;
        request.validate()?;
        self.ensure_vehicle(vehicle_id).await?;

        let bytes = storage.decode_payload(&request.data_base64)?;
        let stored = storage
            .upload(
                request.kind,
                vehicle_id,
                &request.file_name,
                request.content_type.as_deref(),
                bytes,
            )
            .await?;

        let registered = self
            .records
            .create_image(
                vehicle_id,
                request.file_name.trim(),
                &stored.path,
                &stored.public_url,
                request.kind,
                user.id(),
            )
            .await;
        let image = storage.remove_on_error(request.kind, &stored.path, registered).await?;
        Ok(ApiResponse::success_with_message(image, "File uploaded"))
    }

    pub async fn delete_image(
        &self,
        user: &AuthenticatedUser,
        storage: &StorageClient,
        vehicle_id: Uuid,
        image_id: Uuid,
    ) -> Result<ApiResponse<()>, AppError> {
        user.require("inventory.edit")?;
        let image = self.records.delete_image(vehicle_id, image_id).await?;

        let kind = if image.kind == UploadKind::Document.as_str() {
            UploadKind::Document
        } else {
            UploadKind::Image
        };
        storage.remove(kind, &image.storage_path).await;

        Ok(ApiResponse::message("File deleted"))
    }

    // -------------------------------------------------------------- dispatch

    pub async fn get_dispatch(&self, user: &AuthenticatedUser, vehicle_id: Uuid) -> Result<ApiResponse<Option<Dispatch>>, AppError> {
        let dispatch = self.records.find_dispatch(vehicle_id).await?;

        let assigned = dispatch
            .as_ref()
            .map_or(false, |d| d.transporter_id == Some(user.id()));
        if !assigned {
            user.require("transportation.view")?;
            self.ensure_vehicle(vehicle_id).await?;
        }
        Ok(ApiResponse::success(dispatch))
    }

    pub async fn upsert_dispatch(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
        request: UpsertDispatchRequest,
    ) -> Result<ApiResponse<Dispatch>, AppError> {
        user.require("transportation.edit")?;
        request.validate()?;
        self.ensure_vehicle(vehicle_id).await?;

        let status = resolve_dispatch_status(request.status.as_deref())?;
        let dispatch = self.records.upsert_dispatch(vehicle_id, &request, status).await?;
        Ok(ApiResponse::success_with_message(dispatch, "Dispatch saved"))
    }

    /// Transportistas ven sólo sus asignaciones; el resto necesita `transportation.view`
    pub async fn list_dispatch(&self, user: &AuthenticatedUser) -> Result<ApiResponse<Vec<Dispatch>>, AppError> {
        let transporter = if user.profile.is_transporter() && !user.is_admin() {
            Some(user.id())
        } else {
            user.require("transportation.view")?;
            None
        };
        Ok(ApiResponse::success(self.records.list_dispatch(transporter).await?))
    }

    // ----------------------------------------------------------- assessments

    pub async fn list_assessments(&self, user: &AuthenticatedUser, vehicle_id: Uuid) -> Result<ApiResponse<Vec<Assessment>>, AppError> {
        user.require("inventory.view")?;
        self.ensure_vehicle(vehicle_id).await?;
        Ok(ApiResponse::success(self.records.list_assessments(vehicle_id).await?))
    }

    pub async fn create_assessment(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
        request: CreateAssessmentRequest,
    ) -> Result<ApiResponse<Assessment>, AppError> {
        user.require("inventory.edit")?;
        request.validate()?;
        self.ensure_vehicle(vehicle_id).await?;

        let assessment = self.records.create_assessment(vehicle_id, &request, user.id()).await?;
        Ok(ApiResponse::success_with_message(assessment, "Assessment added"))
    }

    // -------------------------------------------------------------- timeline

    pub async fn list_timeline(&self, user: &AuthenticatedUser, vehicle_id: Uuid) -> Result<ApiResponse<Vec<TimelineEntry>>, AppError> {
        user.require("inventory.view")?;
        self.ensure_vehicle(vehicle_id).await?;
        Ok(ApiResponse::success(self.records.list_timeline(vehicle_id).await?))
    }

    pub async fn add_timeline_entry(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
        request: CreateTimelineEntryRequest,
    ) -> Result<ApiResponse<TimelineEntry>, AppError> {
        user.require("inventory.edit")?;
        request.validate()?;
        self.ensure_vehicle(vehicle_id).await?;

        let mut entry = NewTimelineEntry::new(request.action.trim()).with_note(request.note);
        entry.cost = request.cost;
        let entry = VehicleRecordsRepository::append_timeline(&self.pool, vehicle_id, &entry, &user.actor()).await?;
        Ok(ApiResponse::success_with_message(entry, "Timeline entry added"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_status_defaults_and_validation() {
        assert_eq!(resolve_dispatch_status(None).unwrap(), "Pending");
        assert_eq!(resolve_dispatch_status(Some("in transit")).unwrap(), "In Transit");
        assert!(resolve_dispatch_status(Some("Teleported")).is_err());
    }
}
