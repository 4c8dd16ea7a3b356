use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_not_empty;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    #[validate(custom = "validate_not_empty", length(max = 2000, message = "Message cannot exceed 2000 characters"))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub with: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub sender_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}
