//! Rutas de usuarios, roles, audit log y settings

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
    http::StatusCode,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::{
    role_controller::RoleController, settings_controller::SettingsController,
    user_controller::UserController,
};
use crate::dto::common::ApiResponse;
use crate::dto::user_dto::{
    AssignRoleRequest, AuditLogQuery, CreateRoleRequest, CurrentUserResponse, DropdownQuery,
    ImpersonationResponse, ResetPasswordRequest, ResetPasswordResponse, UpdateDropdownRequest,
    UpdateRoleRequest, UpdateUserStatusRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    audit::{AuditLog, DropdownSetting},
    profile::Profile,
    role::Role,
};
use crate::state::AppState;
use crate::utils::{errors::AppError, extract::JsonBody};

pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(current_user))
        .route("/:id/role", patch(assign_role))
        .route("/:id/status", patch(set_status))
        .route("/:id/reset-password", post(reset_password))
        .route("/:id/impersonate", post(impersonate))
}

pub fn create_role_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).patch(update_role).delete(delete_role))
}

pub fn create_audit_router() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

pub fn create_settings_router() -> Router<AppState> {
    Router::new()
        .route("/dropdowns", get(list_dropdowns))
        .route("/dropdowns/:category", put(update_dropdown))
}

// Usuarios

async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<Profile>>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    Ok(Json(controller.list(&user).await?))
}

async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<ApiResponse<CurrentUserResponse>> {
    let controller = UserController::new(state.pool.clone());
    Json(controller.me(&user))
}

async fn assign_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<AssignRoleRequest>,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    Ok(Json(controller.assign_role(&user, id, request).await?))
}

async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateUserStatusRequest>,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    Ok(Json(controller.set_status(&user, id, request).await?))
}

async fn reset_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    request: Option<Json<ResetPasswordRequest>>,
) -> Result<Json<ApiResponse<ResetPasswordResponse>>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let controller = UserController::new(state.pool.clone());
    let response = controller
        .reset_password(&user, &state.auth_admin, id, request)
        .await?;
    Ok(Json(response))
}

async fn impersonate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ImpersonationResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    Ok(Json(controller.impersonate(&user, &state.jwt, id).await?))
}

async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<ApiResponse<Vec<AuditLog>>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    Ok(Json(controller.audit_logs(&user, query.limit).await?))
}

// Roles

async fn list_roles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<Role>>>, AppError> {
    let controller = RoleController::new(state.pool.clone());
    Ok(Json(controller.list(&user).await?))
}

async fn create_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<CreateRoleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Role>>), AppError> {
    let controller = RoleController::new(state.pool.clone());
    Ok((StatusCode::CREATED, Json(controller.create(&user, request).await?)))
}

async fn get_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Role>>, AppError> {
    let controller = RoleController::new(state.pool.clone());
    Ok(Json(controller.get(&user, id).await?))
}

async fn update_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<Role>>, AppError> {
    let controller = RoleController::new(state.pool.clone());
    Ok(Json(controller.update(&user, id, request).await?))
}

async fn delete_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = RoleController::new(state.pool.clone());
    Ok(Json(controller.delete(&user, id).await?))
}

// Settings

async fn list_dropdowns(
    State(state): State<AppState>,
    Query(query): Query<DropdownQuery>,
) -> Result<Json<ApiResponse<Vec<DropdownSetting>>>, AppError> {
    let controller = SettingsController::new(state.pool.clone());
    Ok(Json(controller.dropdowns(query.category.as_deref()).await?))
}

async fn update_dropdown(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(category): Path<String>,
    JsonBody(request): JsonBody<UpdateDropdownRequest>,
) -> Result<Json<ApiResponse<DropdownSetting>>, AppError> {
    let controller = SettingsController::new(state.pool.clone());
    Ok(Json(controller.update_dropdown(&user, &category, request).await?))
}
