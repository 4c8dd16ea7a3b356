use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};

use crate::controllers::report_controller::ReportController;
use crate::dto::common::{ApiResponse, DateRangeQuery};
use crate::dto::report_dto::{ArbitrationReport, CarProfit, MissingTitleGroup, SalesPeriodSummary, SummaryReport};
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_report_router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales))
        .route("/summary", get(summary))
        .route("/profit-per-car", get(profit_per_car))
        .route("/arbitration", get(arbitration))
        .route("/missing-titles", get(missing_titles))
}

async fn sales(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<SalesPeriodSummary>>>, AppError> {
    let controller = ReportController::new(state.pool.clone());
    Ok(Json(controller.sales(&user, query).await?))
}

async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<SummaryReport>>, AppError> {
    let controller = ReportController::new(state.pool.clone());
    Ok(Json(controller.summary(&user, query).await?))
}

async fn profit_per_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<CarProfit>>>, AppError> {
    let controller = ReportController::new(state.pool.clone());
    Ok(Json(controller.profit_per_car(&user, query).await?))
}

async fn arbitration(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<ArbitrationReport>>, AppError> {
    let controller = ReportController::new(state.pool.clone());
    Ok(Json(controller.arbitration(&user, query).await?))
}

async fn missing_titles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<MissingTitleGroup>>>, AppError> {
    let controller = ReportController::new(state.pool.clone());
    Ok(Json(controller.missing_titles(&user, query).await?))
}
