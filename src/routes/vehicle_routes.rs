use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    http::StatusCode,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::{arb_controller::ArbController, vehicle_controller::VehicleController};
use crate::dto::arb_dto::{ArbInitiatedResponse, ArbResolvedResponse, InitiateArbRequest, ResolveArbRequest};
use crate::dto::common::ApiResponse;
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, ImportReport, ImportVehiclesRequest, RecordSaleRequest,
    UpdateVehicleRequest, UpdateVehicleStatusRequest, VehicleFilters,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{arb::ArbRecord, vehicle::Vehicle};
use crate::state::AppState;
use crate::utils::{errors::AppError, extract::JsonBody};

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/import", post(import_vehicles))
        .route("/:id", get(get_vehicle).patch(update_vehicle).delete(delete_vehicle))
        .route("/:id/status", patch(update_status))
        .route("/:id/sale", post(record_sale))
        .route("/:id/arb", get(list_arb_records).post(initiate_arb))
        .route("/:id/arb/outcome", post(resolve_arb))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<ApiResponse<Vec<Vehicle>>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.list(&user, filters).await?;
    Ok(Json(response))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vehicle>>), AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn import_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<ImportVehiclesRequest>,
) -> Result<Json<ImportReport>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let report = controller.import(&user, request).await?;
    Ok(Json(report))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.get(&user, id).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.update(&user, id, request).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.delete(&user, id).await?;
    Ok(Json(response))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateVehicleStatusRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.update_status(&user, id, request).await?;
    Ok(Json(response))
}

async fn record_sale(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<RecordSaleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.record_sale(&user, id, request).await?;
    Ok(Json(response))
}

// ARB

async fn list_arb_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ArbRecord>>>, AppError> {
    let controller = ArbController::new(state.pool.clone());
    let response = controller.list(&user, id).await?;
    Ok(Json(response))
}

async fn initiate_arb(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<InitiateArbRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ArbInitiatedResponse>>), AppError> {
    let controller = ArbController::new(state.pool.clone());
    let response = controller.initiate(&user, id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn resolve_arb(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<ResolveArbRequest>,
) -> Result<Json<ApiResponse<ArbResolvedResponse>>, AppError> {
    let controller = ArbController::new(state.pool.clone());
    let response = controller.resolve(&user, id, request).await?;
    Ok(Json(response))
}
