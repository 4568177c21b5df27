// ============================================================================
// Message Service
// ============================================================================
//
// Orchestrates every message-visible operation:
//
//   validate → Access Gate → Message Store → room broadcast
//
// Persistence and broadcast are decoupled: once the store write succeeds the
// operation succeeds, whether or not anyone is listening.
//
// ============================================================================

use std::sync::Arc;
use uuid::Uuid;

use crate::access::AccessGate;
use crate::config::{LoggingConfig, MAX_MESSAGE_LENGTH};
use crate::directory::UserDirectory;
use crate::error::{AppError, AppResult};
use crate::handlers::rooms::RoomRegistry;
use crate::message::ServerMessage;
use crate::metrics;
use crate::models::{ChatMessage, MessageView, RoomId};
use crate::store::{MessageStore, Page};

pub struct MessageService {
    store: Arc<dyn MessageStore>,
    users: Arc<dyn UserDirectory>,
    access: AccessGate,
    rooms: Arc<RoomRegistry>,
    logging: LoggingConfig,
}

fn store_error(e: anyhow::Error) -> AppError {
    AppError::store(format!("{e:#}"))
}

/// Trim and bounds-check user-supplied content
pub fn validate_content(raw: &str) -> AppResult<&str> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::validation("Message content cannot be empty"));
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::validation(format!(
            "Message content cannot exceed {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }
    Ok(content)
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
        access: AccessGate,
        rooms: Arc<RoomRegistry>,
        logging: LoggingConfig,
    ) -> Self {
        Self {
            store,
            users,
            access,
            rooms,
            logging,
        }
    }

    pub async fn send(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        raw_content: &str,
    ) -> AppResult<ChatMessage> {
        let content = validate_content(raw_content)?;
        self.access.ensure_access(user_id, project_id).await?;

        let sender = self.sender_name(user_id).await?;
        let message = self
            .store
            .create(project_id, user_id, &sender, content)
            .await
            .map_err(store_error)?;

        metrics::MESSAGES_SENT_TOTAL.inc();
        tracing::info!(
            message_id = %message.id,
            project = %self.logging.id(&project_id),
            sender = %self.logging.id(&user_id),
            "Chat message persisted"
        );

        self.publish(&message).await;
        Ok(message)
    }

    /// Post a `system` message into the project timeline. Owner only.
    pub async fn announce(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        raw_content: &str,
    ) -> AppResult<ChatMessage> {
        let content = validate_content(raw_content)?;
        self.access.ensure_owner(user_id, project_id).await?;

        let sender = self.sender_name(user_id).await?;
        let message = self
            .store
            .create_system(project_id, user_id, &sender, content)
            .await
            .map_err(store_error)?;

        metrics::MESSAGES_SENT_TOTAL.inc();
        tracing::info!(
            message_id = %message.id,
            project = %self.logging.id(&project_id),
            "System message persisted"
        );

        self.publish(&message).await;
        Ok(message)
    }

    async fn sender_name(&self, user_id: Uuid) -> AppResult<String> {
        let profile = self
            .users
            .get_user(user_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(profile.display_name)
    }

    // Durable by the time this runs; the broadcast cannot fail the write.
    async fn publish(&self, message: &ChatMessage) {
        self.rooms
            .broadcast(
                RoomId::for_project(message.project_id),
                ServerMessage::NewMessage(MessageView::from(message)),
            )
            .await;
    }

    /// History, oldest first
    pub async fn list(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        page: Page,
    ) -> AppResult<Vec<ChatMessage>> {
        self.access.ensure_access(user_id, project_id).await?;
        self.store
            .list_chronological(project_id, page)
            .await
            .map_err(store_error)
    }

    /// History, newest first
    pub async fn list_recent(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        page: Page,
    ) -> AppResult<Vec<ChatMessage>> {
        self.access.ensure_access(user_id, project_id).await?;
        self.store
            .list_reverse_chronological(project_id, page)
            .await
            .map_err(store_error)
    }

    pub async fn search(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        term: &str,
    ) -> AppResult<Vec<ChatMessage>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AppError::validation("Search term cannot be empty"));
        }

        self.access.ensure_access(user_id, project_id).await?;
        self.store
            .search(project_id, term)
            .await
            .map_err(store_error)
    }

    pub async fn count(&self, user_id: Uuid, project_id: Uuid) -> AppResult<i64> {
        self.access.ensure_access(user_id, project_id).await?;
        self.store
            .count_active(project_id)
            .await
            .map_err(store_error)
    }

    /// Soft-delete a message. Only its author may do this.
    pub async fn delete(&self, user_id: Uuid, project_id: Uuid, message_id: Uuid) -> AppResult<()> {
        let message = self
            .store
            .find_by_id(message_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| AppError::not_found("Message not found"))?;

        if message.sender_id != user_id {
            tracing::warn!(
                message_id = %message_id,
                user = %self.logging.id(&user_id),
                "Delete attempted by non-author"
            );
            return Err(AppError::forbidden("You can only delete your own messages"));
        }

        if message.project_id != project_id {
            return Err(AppError::validation("Message does not belong to this project"));
        }

        if message.is_deleted {
            tracing::debug!(message_id = %message_id, "Message already deleted");
            return Ok(());
        }

        self.store.soft_delete(message_id).await.map_err(store_error)?;
        metrics::MESSAGES_DELETED_TOTAL.inc();

        self.rooms
            .broadcast(
                RoomId::for_project(project_id),
                ServerMessage::MessageDeleted { message_id },
            )
            .await;

        Ok(())
    }
}
