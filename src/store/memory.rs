use anyhow::Result;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MessageStore, Page};
use crate::config::MAX_SEARCH_RESULTS;
use crate::models::{ChatMessage, MessageType};

/// Process-local MessageStore.
///
/// Rows are kept in insertion order, which is also commit order: the write
/// lock is held while the timestamp is assigned and the row appended.
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<ChatMessage>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn insert(
        &self,
        project_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
        message_type: MessageType,
    ) -> ChatMessage {
        let mut messages = self.messages.write().await;

        // Wall clock may step backwards; commit order must not.
        let now = Utc::now();
        let created_at = match messages.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        };

        let message = ChatMessage {
            id: Uuid::new_v4(),
            project_id,
            sender_id,
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            message_type,
            created_at,
            is_deleted: false,
        };
        messages.push(message.clone());
        message
    }
}

fn active_in_project(project_id: Uuid) -> impl Fn(&&ChatMessage) -> bool {
    move |m| m.project_id == project_id && !m.is_deleted
}

fn window<'a>(iter: impl Iterator<Item = &'a ChatMessage>, page: Page) -> Vec<ChatMessage> {
    iter.skip(page.offset as usize)
        .take(page.limit as usize)
        .cloned()
        .collect()
}

#[async_trait::async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn create(
        &self,
        project_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage> {
        Ok(self
            .insert(project_id, sender_id, sender_name, content, MessageType::Text)
            .await)
    }

    async fn create_system(
        &self,
        project_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage> {
        Ok(self
            .insert(project_id, sender_id, sender_name, content, MessageType::System)
            .await)
    }

    async fn list_chronological(&self, project_id: Uuid, page: Page) -> Result<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        Ok(window(
            messages.iter().filter(active_in_project(project_id)),
            page,
        ))
    }

    async fn list_reverse_chronological(
        &self,
        project_id: Uuid,
        page: Page,
    ) -> Result<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        Ok(window(
            messages.iter().rev().filter(active_in_project(project_id)),
            page,
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == id).cloned())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut messages = self.messages.write().await;
        if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
            message.is_deleted = true;
        }
        Ok(())
    }

    async fn count_active(&self, project_id: Uuid) -> Result<i64> {
        let messages = self.messages.read().await;
        Ok(messages.iter().filter(active_in_project(project_id)).count() as i64)
    }

    async fn search(&self, project_id: Uuid, term: &str) -> Result<Vec<ChatMessage>> {
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let needle = term.to_lowercase();
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .rev()
            .filter(active_in_project(project_id))
            .filter(|m| m.content.to_lowercase().contains(&needle))
            .take(MAX_SEARCH_RESULTS as usize)
            .cloned()
            .collect())
    }

    async fn hard_delete(&self, id: Uuid) -> Result<bool> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.id != id);
        Ok(messages.len() != before)
    }

    async fn purge_project(&self, project_id: Uuid) -> Result<u64> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.project_id != project_id);
        Ok((before - messages.len()) as u64)
    }
}
