use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::message_dto::{SendMessageRequest, UnreadCountResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::message::{ConversationSummary, Message};
use crate::repositories::{MessageRepository, ProfileRepository};
use crate::utils::errors::{bad_request_error, not_found_error, AppError};

/// Una entrada por interlocutor, con el último mensaje y los no leídos.
///
/// `messages` debe venir ordenado del más reciente al más antiguo.
pub fn build_conversations(messages: &[Message], user_id: Uuid) -> Vec<ConversationSummary> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut summaries: HashMap<Uuid, ConversationSummary> = HashMap::new();

    for message in messages {
        let other = message.counterpart(user_id);
        let summary = summaries.entry(other).or_insert_with(|| {
            order.push(other);
            ConversationSummary {
                user_id: other,
                last_message: message.content.clone(),
                last_message_at: message.created_at,
                unread_count: 0,
            }
        });
        if message.receiver_id == user_id && !message.is_read {
            summary.unread_count += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|id| summaries.remove(&id))
        .collect()
}

pub struct MessageController {
    messages: MessageRepository,
    profiles: ProfileRepository,
}

impl MessageController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            messages: MessageRepository::new(pool.clone()),
            profiles: ProfileRepository::new(pool),
        }
    }

    pub async fn conversation(&self, user: &AuthenticatedUser, other_id: Uuid) -> Result<ApiResponse<Vec<Message>>, AppError> {
        let messages = self.messages.conversation(user.id(), other_id).await?;
        Ok(ApiResponse::success(messages))
    }

    pub async fn conversations(&self, user: &AuthenticatedUser) -> Result<ApiResponse<Vec<ConversationSummary>>, AppError> {
        let messages = self.messages.involving(user.id()).await?;
        Ok(ApiResponse::success(build_conversations(&messages, user.id())))
    }

    pub async fn unread_count(&self, user: &AuthenticatedUser) -> Result<ApiResponse<UnreadCountResponse>, AppError> {
        let unread = self.messages.unread_count(user.id()).await?;
        Ok(ApiResponse::success(UnreadCountResponse { unread }))
    }

    pub async fn send(&self, user: &AuthenticatedUser, request: SendMessageRequest) -> Result<ApiResponse<Message>, AppError> {
        request.validate()?;
        if request.receiver_id == user.id() {
            return Err(bad_request_error("Cannot send a message to yourself"));
        }
        if self.profiles.find_by_id(request.receiver_id).await?.is_none() {
            return Err(not_found_error("User", &request.receiver_id.to_string()));
        }

        let message = self
            .messages
            .send(user.id(), request.receiver_id, request.content.trim())
            .await?;
        tracing::debug!("✉️ Message {} sent to {}", message.id, message.receiver_id);
        Ok(ApiResponse::success_with_message(message, "Message sent"))
    }

    pub async fn mark_read(&self, user: &AuthenticatedUser, sender_id: Uuid) -> Result<ApiResponse<()>, AppError> {
        let updated = self.messages.mark_read(user.id(), sender_id).await?;
        Ok(ApiResponse::message(format!("{} messages marked as read", updated)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn message(sender: Uuid, receiver: Uuid, content: &str, minutes_ago: i64, is_read: bool) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            content: content.to_string(),
            is_read,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_conversations_group_by_counterpart() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        // Más reciente primero
        let messages = vec![
            message(alice, me, "latest from alice", 1, false),
            message(me, bob, "hi bob", 5, false),
            message(alice, me, "older from alice", 10, false),
            message(bob, me, "read one", 20, true),
        ];

        let conversations = build_conversations(&messages, me);
        assert_eq!(conversations.len(), 2);

        assert_eq!(conversations[0].user_id, alice);
        assert_eq!(conversations[0].last_message, "latest from alice");
        assert_eq!(conversations[0].unread_count, 2);

        assert_eq!(conversations[1].user_id, bob);
        assert_eq!(conversations[1].last_message, "hi bob");
        // Los mensajes enviados por mí no cuentan como no leídos
        assert_eq!(conversations[1].unread_count, 0);
    }

    #[test]
    fn test_no_messages_no_conversations() {
        assert!(build_conversations(&[], Uuid::new_v4()).is_empty());
    }
}
