use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{MessageStore, Page};
use crate::config::MAX_SEARCH_RESULTS;
use crate::models::{ChatMessage, MessageType};

/// PostgreSQL implementation of MessageStore
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(
        &self,
        project_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
        message_type: MessageType,
    ) -> Result<ChatMessage> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO chat_messages (id, project_id, sender_id, sender_name, content, message_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, sender_id, sender_name, content, message_type, created_at, is_deleted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(sender_id)
        .bind(sender_name)
        .bind(content)
        .bind(message_type.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert chat message")?;

        record.try_into()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRecord {
    id: Uuid,
    project_id: Uuid,
    sender_id: Uuid,
    sender_name: String,
    content: String,
    message_type: String,
    created_at: DateTime<Utc>,
    is_deleted: bool,
}

impl TryFrom<MessageRecord> for ChatMessage {
    type Error = anyhow::Error;

    fn try_from(record: MessageRecord) -> Result<Self> {
        let message_type = MessageType::parse(&record.message_type).with_context(|| {
            format!(
                "Unknown message_type '{}' on message {}",
                record.message_type, record.id
            )
        })?;

        Ok(ChatMessage {
            id: record.id,
            project_id: record.project_id,
            sender_id: record.sender_id,
            sender_name: record.sender_name,
            content: record.content,
            message_type,
            created_at: record.created_at,
            is_deleted: record.is_deleted,
        })
    }
}

fn into_messages(records: Vec<MessageRecord>) -> Result<Vec<ChatMessage>> {
    records.into_iter().map(ChatMessage::try_from).collect()
}

/// Escapes LIKE metacharacters so the term matches literally
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait::async_trait]
impl MessageStore for PostgresMessageStore {
    async fn create(
        &self,
        project_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage> {
        self.insert(project_id, sender_id, sender_name, content, MessageType::Text)
            .await
    }

    async fn create_system(
        &self,
        project_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage> {
        self.insert(project_id, sender_id, sender_name, content, MessageType::System)
            .await
    }

    async fn list_chronological(&self, project_id: Uuid, page: Page) -> Result<Vec<ChatMessage>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, project_id, sender_id, sender_name, content, message_type, created_at, is_deleted
            FROM chat_messages
            WHERE project_id = $1 AND is_deleted = FALSE
            ORDER BY created_at ASC, seq ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(project_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list chat messages")?;

        into_messages(records)
    }

    async fn list_reverse_chronological(
        &self,
        project_id: Uuid,
        page: Page,
    ) -> Result<Vec<ChatMessage>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, project_id, sender_id, sender_name, content, message_type, created_at, is_deleted
            FROM chat_messages
            WHERE project_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(project_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent chat messages")?;

        into_messages(records)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, project_id, sender_id, sender_name, content, message_type, created_at, is_deleted
            FROM chat_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find chat message")?;

        record.map(ChatMessage::try_from).transpose()
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE chat_messages
            SET is_deleted = TRUE
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to soft-delete chat message")?;

        Ok(())
    }

    async fn count_active(&self, project_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM chat_messages
            WHERE project_id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count chat messages")?;

        Ok(count)
    }

    async fn search(&self, project_id: Uuid, term: &str) -> Result<Vec<ChatMessage>> {
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, project_id, sender_id, sender_name, content, message_type, created_at, is_deleted
            FROM chat_messages
            WHERE project_id = $1 AND is_deleted = FALSE AND content ILIKE $2 ESCAPE '\'
            ORDER BY created_at DESC, seq DESC
            LIMIT $3
            "#,
        )
        .bind(project_id)
        .bind(like_pattern(term))
        .bind(MAX_SEARCH_RESULTS)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search chat messages")?;

        into_messages(records)
    }

    async fn hard_delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to hard-delete chat message")?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_project(&self, project_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .context("Failed to purge project chat messages")?;

        let deleted_count = result.rows_affected();
        tracing::info!(
            deleted_count = deleted_count,
            "Purged chat messages for project"
        );

        Ok(deleted_count)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }
}
