//! Rutas de sub-recursos de vehículos
//!
//! Se montan bajo `/api/vehicles/:id/...`, más el listado global
//! `/api/dispatch`.

use axum::{
    extract::{Path, State},
    routing::{delete, get, patch},
    http::StatusCode,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_records_controller::VehicleRecordsController;
use crate::dto::common::ApiResponse;
use crate::dto::vehicle_records_dto::{
    CreateAssessmentRequest, CreateExpenseRequest, CreateNoteRequest, CreateTimelineEntryRequest,
    UpdateExpenseRequest, UploadFileRequest, UpsertDispatchRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::vehicle_records::{Assessment, Dispatch, Expense, TimelineEntry, VehicleImage, VehicleNote};
use crate::state::AppState;
use crate::utils::{errors::AppError, extract::JsonBody};

pub fn create_vehicle_records_router() -> Router<AppState> {
    Router::new()
        .route("/:id/expenses", get(list_expenses).post(create_expense))
        .route("/:id/expenses/:expense_id", patch(update_expense).delete(delete_expense))
        .route("/:id/notes", get(list_notes).post(create_note))
        .route("/:id/notes/:note_id", delete(delete_note))
        .route("/:id/images", get(list_images).post(upload_image))
        .route("/:id/images/:image_id", delete(delete_image))
        .route("/:id/dispatch", get(get_dispatch).put(upsert_dispatch))
        .route("/:id/assessments", get(list_assessments).post(create_assessment))
        .route("/:id/timeline", get(list_timeline).post(add_timeline_entry))
}

pub fn create_dispatch_router() -> Router<AppState> {
    Router::new().route("/", get(list_dispatch))
}

fn controller(state: &AppState) -> VehicleRecordsController {
    VehicleRecordsController::new(state.pool.clone())
}

// Gastos

async fn list_expenses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Expense>>>, AppError> {
    Ok(Json(controller(&state).list_expenses(&user, id).await?))
}

async fn create_expense(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Expense>>), AppError> {
    Ok((StatusCode::CREATED, Json(controller(&state).create_expense(&user, id, request).await?)))
}

async fn update_expense(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, expense_id)): Path<(Uuid, Uuid)>,
    JsonBody(request): JsonBody<UpdateExpenseRequest>,
) -> Result<Json<ApiResponse<Expense>>, AppError> {
    Ok(Json(controller(&state).update_expense(&user, id, expense_id, request).await?))
}

async fn delete_expense(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, expense_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    Ok(Json(controller(&state).delete_expense(&user, id, expense_id).await?))
}

// Notas

async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<VehicleNote>>>, AppError> {
    Ok(Json(controller(&state).list_notes(&user, id).await?))
}

async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<CreateNoteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleNote>>), AppError> {
    Ok((StatusCode::CREATED, Json(controller(&state).create_note(&user, id, request).await?)))
}

async fn delete_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, note_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    Ok(Json(controller(&state).delete_note(&user, id, note_id).await?))
}

// Archivos

async fn list_images(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<VehicleImage>>>, AppError> {
    Ok(Json(controller(&state).list_images(&user, id).await?))
}

async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UploadFileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleImage>>), AppError> {
    let response = controller(&state)
        .upload_image(&user, &state.storage, id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn delete_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let response = controller(&state)
        .delete_image(&user, &state.storage, id, image_id)
        .await?;
    Ok(Json(response))
}

// Dispatch

async fn get_dispatch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Option<Dispatch>>>, AppError> {
    Ok(Json(controller(&state).get_dispatch(&user, id).await?))
}

async fn upsert_dispatch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpsertDispatchRequest>,
) -> Result<Json<ApiResponse<Dispatch>>, AppError> {
    Ok(Json(controller(&state).upsert_dispatch(&user, id, request).await?))
}

async fn list_dispatch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<Dispatch>>>, AppError> {
    Ok(Json(controller(&state).list_dispatch(&user).await?))
}

// Assessments y timeline

async fn list_assessments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Assessment>>>, AppError> {
    Ok(Json(controller(&state).list_assessments(&user, id).await?))
}

async fn create_assessment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<CreateAssessmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Assessment>>), AppError> {
    Ok((StatusCode::CREATED, Json(controller(&state).create_assessment(&user, id, request).await?)))
}

async fn list_timeline(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<TimelineEntry>>>, AppError> {
    Ok(Json(controller(&state).list_timeline(&user, id).await?))
}

async fn add_timeline_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<CreateTimelineEntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TimelineEntry>>), AppError> {
    Ok((StatusCode::CREATED, Json(controller(&state).add_timeline_entry(&user, id, request).await?)))
}
