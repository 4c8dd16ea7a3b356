//! Repositorio de sub-recursos de vehículos
//!
//! Gastos, notas, archivos, dispatch, assessments y timeline. Las funciones
//! que participan en operaciones multi-escritura aceptan cualquier
//! `PgExecutor` para poder ejecutarse dentro de una transacción.

use chrono::{NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::dto::vehicle_records_dto::{
    CreateAssessmentRequest, UpdateExpenseRequest, UpsertDispatchRequest,
};
use crate::models::vehicle_records::{
    Assessment, Dispatch, Expense, NewExpense, NewTimelineEntry, TimelineEntry, UploadKind,
    VehicleImage, VehicleNote,
};
use crate::utils::errors::AppError;

/// Quién ejecuta la acción registrada en el timeline
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}

pub struct VehicleRecordsRepository {
    pool: PgPool,
}

impl VehicleRecordsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---------------------------------------------------------------- gastos

    pub async fn list_expenses(&self, vehicle_id: Uuid) -> Result<Vec<Expense>, AppError> {
        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT * FROM vehicle_expenses WHERE vehicle_id = $1 ORDER BY expense_date DESC, created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    pub async fn find_expense(&self, vehicle_id: Uuid, expense_id: Uuid) -> Result<Option<Expense>, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            "SELECT * FROM vehicle_expenses WHERE id = $1 AND vehicle_id = $2",
        )
        .bind(expense_id)
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(expense)
    }

    pub async fn insert_expense<'e, E: PgExecutor<'e>>(
        executor: E,
        vehicle_id: Uuid,
        expense: &NewExpense,
        created_by: Uuid,
    ) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO vehicle_expenses (vehicle_id, description, expense_date, cost, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(&expense.description)
        .bind(expense.expense_date)
        .bind(expense.cost)
        .bind(&expense.notes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(expense)
    }

    pub async fn update_expense(&self, current: Expense, request: UpdateExpenseRequest) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE vehicle_expenses
            SET description = $2, expense_date = $3, cost = $4, notes = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(current.id)
        .bind(request.description.map(|d| d.trim().to_string()).unwrap_or(current.description))
        .bind(request.expense_date.unwrap_or(current.expense_date))
        .bind(request.cost.unwrap_or(current.cost))
        .bind(request.notes.or(current.notes))
        .fetch_one(&self.pool)
        .await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, vehicle_id: Uuid, expense_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM vehicle_expenses WHERE id = $1 AND vehicle_id = $2")
            .bind(expense_id)
            .bind(vehicle_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Expense not found".to_string()));
        }
        Ok(())
    }

    /// Gastos de un conjunto de vehículos, para reportes
    pub async fn expenses_for_vehicles(&self, vehicle_ids: &[Uuid]) -> Result<Vec<Expense>, AppError> {
        if vehicle_ids.is_empty() {
            return Ok(Vec::new());
        }
        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT * FROM vehicle_expenses WHERE vehicle_id = ANY($1)",
        )
        .bind(vehicle_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    pub async fn expenses_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Expense>, AppError> {
        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT * FROM vehicle_expenses WHERE expense_date BETWEEN $1 AND $2",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    // ----------------------------------------------------------------- notas

    pub async fn list_notes(&self, vehicle_id: Uuid) -> Result<Vec<VehicleNote>, AppError> {
        let notes = sqlx::query_as::<_, VehicleNote>(
            "SELECT * FROM vehicle_notes WHERE vehicle_id = $1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notes)
    }

    pub async fn find_note(&self, vehicle_id: Uuid, note_id: Uuid) -> Result<Option<VehicleNote>, AppError> {
        let note = sqlx::query_as::<_, VehicleNote>(
            "SELECT * FROM vehicle_notes WHERE id = $1 AND vehicle_id = $2",
        )
        .bind(note_id)
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    pub async fn create_note(&self, vehicle_id: Uuid, content: &str, author_id: Uuid) -> Result<VehicleNote, AppError> {
        let note = sqlx::query_as::<_, VehicleNote>(
            "INSERT INTO vehicle_notes (vehicle_id, content, author_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(vehicle_id)
        .bind(content)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(note)
    }

    pub async fn delete_note(&self, note_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM vehicle_notes WHERE id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -------------------------------------------------------------- archivos

    pub async fn list_images(&self, vehicle_id: Uuid) -> Result<Vec<VehicleImage>, AppError> {
        let images = sqlx::query_as::<_, VehicleImage>(
            "SELECT * FROM vehicle_images WHERE vehicle_id = $1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    pub async fn create_image(
        &self,
        vehicle_id: Uuid,
        file_name: &str,
        storage_path: &str,
        url: &str,
        kind: UploadKind,
        uploaded_by: Uuid,
    ) -> Result<VehicleImage, AppError> {
        let image = sqlx::query_as::<_, VehicleImage>(
            r#"
            INSERT INTO vehicle_images (vehicle_id, file_name, storage_path, url, kind, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(file_name)
        .bind(storage_path)
        .bind(url)
        .bind(kind.as_str())
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    pub async fn delete_image(&self, vehicle_id: Uuid, image_id: Uuid) -> Result<VehicleImage, AppError> {
        let image = sqlx::query_as::<_, VehicleImage>(
            "DELETE FROM vehicle_images WHERE id = $1 AND vehicle_id = $2 RETURNING *",
        )
        .bind(image_id)
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
        Ok(image)
    }

    // -------------------------------------------------------------- dispatch

    pub async fn find_dispatch(&self, vehicle_id: Uuid) -> Result<Option<Dispatch>, AppError> {
        let dispatch = sqlx::query_as::<_, Dispatch>("SELECT * FROM vehicle_dispatch WHERE vehicle_id = $1")
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(dispatch)
    }

    /// Listado global; con `transporter_id` sólo las asignaciones de ese usuario
    pub async fn list_dispatch(&self, transporter_id: Option<Uuid>) -> Result<Vec<Dispatch>, AppError> {
        let dispatch = sqlx::query_as::<_, Dispatch>(
            r#"
            SELECT * FROM vehicle_dispatch
            WHERE ($1::uuid IS NULL OR transporter_id = $1)
            ORDER BY pickup_date NULLS LAST, created_at DESC
            "#,
        )
        .bind(transporter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(dispatch)
    }

    pub async fn upsert_dispatch(
        &self,
        vehicle_id: Uuid,
        request: &UpsertDispatchRequest,
        status: &str,
    ) -> Result<Dispatch, AppError> {
        let dispatch = sqlx::query_as::<_, Dispatch>(
            r#"
            INSERT INTO vehicle_dispatch (
                vehicle_id, transporter_id, pickup_location, delivery_location,
                pickup_date, delivery_date, transport_cost, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (vehicle_id) DO UPDATE SET
                transporter_id = EXCLUDED.transporter_id,
                pickup_location = EXCLUDED.pickup_location,
                delivery_location = EXCLUDED.delivery_location,
                pickup_date = EXCLUDED.pickup_date,
                delivery_date = EXCLUDED.delivery_date,
                transport_cost = EXCLUDED.transport_cost,
                status = EXCLUDED.status,
                notes = EXCLUDED.notes,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(request.transporter_id)
        .bind(&request.pickup_location)
        .bind(&request.delivery_location)
        .bind(request.pickup_date)
        .bind(request.delivery_date)
        .bind(request.transport_cost)
        .bind(status)
        .bind(&request.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(dispatch)
    }

    // ----------------------------------------------------------- assessments

    pub async fn list_assessments(&self, vehicle_id: Uuid) -> Result<Vec<Assessment>, AppError> {
        let assessments = sqlx::query_as::<_, Assessment>(
            "SELECT * FROM vehicle_assessments WHERE vehicle_id = $1 ORDER BY assessment_date DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assessments)
    }

    pub async fn create_assessment(
        &self,
        vehicle_id: Uuid,
        request: &CreateAssessmentRequest,
        assessed_by: Uuid,
    ) -> Result<Assessment, AppError> {
        let assessment = sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO vehicle_assessments (vehicle_id, assessment_date, condition, damage_notes, estimated_repair_cost, assessed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(request.assessment_date.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(request.condition.trim())
        .bind(&request.damage_notes)
        .bind(request.estimated_repair_cost)
        .bind(assessed_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(assessment)
    }

    // -------------------------------------------------------------- timeline

    pub async fn list_timeline(&self, vehicle_id: Uuid) -> Result<Vec<TimelineEntry>, AppError> {
        let entries = sqlx::query_as::<_, TimelineEntry>(
            "SELECT * FROM vehicle_timeline WHERE vehicle_id = $1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn append_timeline<'e, E: PgExecutor<'e>>(
        executor: E,
        vehicle_id: Uuid,
        entry: &NewTimelineEntry,
        actor: &Actor,
    ) -> Result<TimelineEntry, AppError> {
        let now = Utc::now();
        let entry = sqlx::query_as::<_, TimelineEntry>(
            r#"
            INSERT INTO vehicle_timeline (vehicle_id, action, actor_id, actor_name, action_date, action_time, cost, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(&entry.action)
        .bind(actor.id)
        .bind(&actor.name)
        .bind(now.date_naive())
        .bind(now.time())
        .bind(entry.cost)
        .bind(&entry.note)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }
}
