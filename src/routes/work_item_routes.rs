use axum::{
    extract::{Path, Query, State},
    routing::get,
    http::StatusCode,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::work_item_controller::WorkItemController;
use crate::dto::common::ApiResponse;
use crate::dto::work_item_dto::{CreateWorkItemRequest, UpdateWorkItemRequest, WorkItemFilters};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::work_item::{WorkItem, WorkItemKind};
use crate::state::AppState;
use crate::utils::{errors::AppError, extract::JsonBody};

/// Mismo router para `/api/tasks` y `/api/events`; la tabla la decide `kind`
pub fn create_work_item_router(kind: WorkItemKind) -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).patch(update_item).delete(delete_item))
        .layer(Extension(kind))
}

async fn list_items(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<WorkItemFilters>,
) -> Result<Json<ApiResponse<Vec<WorkItem>>>, AppError> {
    let controller = WorkItemController::new(state.pool.clone(), kind);
    Ok(Json(controller.list(&user, filters).await?))
}

async fn create_item(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<CreateWorkItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WorkItem>>), AppError> {
    let controller = WorkItemController::new(state.pool.clone(), kind);
    Ok((StatusCode::CREATED, Json(controller.create(&user, request).await?)))
}

async fn get_item(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkItem>>, AppError> {
    let controller = WorkItemController::new(state.pool.clone(), kind);
    Ok(Json(controller.get(&user, id).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateWorkItemRequest>,
) -> Result<Json<ApiResponse<WorkItem>>, AppError> {
    let controller = WorkItemController::new(state.pool.clone(), kind);
    Ok(Json(controller.update(&user, id, request).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = WorkItemController::new(state.pool.clone(), kind);
    Ok(Json(controller.delete(&user, id).await?))
}
