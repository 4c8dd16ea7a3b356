use axum::{
    extract::{Query, State},
    routing::{get, patch},
    http::StatusCode,
    Extension, Json, Router,
};

use crate::controllers::message_controller::MessageController;
use crate::dto::common::ApiResponse;
use crate::dto::message_dto::{ConversationQuery, MarkReadRequest, SendMessageRequest, UnreadCountResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::message::{ConversationSummary, Message};
use crate::state::AppState;
use crate::utils::{errors::AppError, extract::JsonBody};

pub fn create_message_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_conversation).post(send_message))
        .route("/conversations", get(list_conversations))
        .route("/unread-count", get(unread_count))
        .route("/read", patch(mark_read))
}

async fn get_conversation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let controller = MessageController::new(state.pool.clone());
    Ok(Json(controller.conversation(&user, query.with).await?))
}

async fn list_conversations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<ConversationSummary>>>, AppError> {
    let controller = MessageController::new(state.pool.clone());
    Ok(Json(controller.conversations(&user).await?))
}

async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<UnreadCountResponse>>, AppError> {
    let controller = MessageController::new(state.pool.clone());
    Ok(Json(controller.unread_count(&user).await?))
}

async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), AppError> {
    let controller = MessageController::new(state.pool.clone());
    Ok((StatusCode::CREATED, Json(controller.send(&user, request).await?)))
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<MarkReadRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = MessageController::new(state.pool.clone());
    Ok(Json(controller.mark_read(&user, request.sender_id).await?))
}
