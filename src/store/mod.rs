// ============================================================================
// Message Store
// ============================================================================
//
// Durable record of chat messages per project.
//
// - Ordering: created_at is assigned by the store at insert time, with an
//   insertion sequence as tie-breaker. Client-supplied times are never used.
// - Soft delete: is_deleted flips false → true once and hides the row from
//   every read path except find_by_id.
// - No cross-entity joins: only ids plus the sender_name snapshot are stored.
//
// Two implementations:
// - PostgresMessageStore (production, sqlx)
// - InMemoryMessageStore (tests and local development)
//
// ============================================================================

mod memory;
mod postgres;

pub use memory::InMemoryMessageStore;
pub use postgres::PostgresMessageStore;

use anyhow::Result;
use uuid::Uuid;

use crate::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::models::ChatMessage;

/// Pagination window for history reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Applies defaults and clamps `limit` to `1..=MAX_PAGE_LIMIT`, `offset` to `>= 0`
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new active `text` message with a store-assigned timestamp
    async fn create(
        &self,
        project_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage>;

    /// Same as `create`, tagged `system`
    async fn create_system(
        &self,
        project_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
    ) -> Result<ChatMessage>;

    /// Non-deleted messages, oldest first
    async fn list_chronological(&self, project_id: Uuid, page: Page) -> Result<Vec<ChatMessage>>;

    /// Non-deleted messages, newest first
    async fn list_reverse_chronological(
        &self,
        project_id: Uuid,
        page: Page,
    ) -> Result<Vec<ChatMessage>>;

    /// Lookup that ignores the soft-delete flag
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>>;

    /// Mark deleted. Missing or already-deleted ids are not an error.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;

    async fn count_active(&self, project_id: Uuid) -> Result<i64>;

    /// Case-insensitive substring match over active messages, newest first,
    /// at most `MAX_SEARCH_RESULTS` rows
    async fn search(&self, project_id: Uuid, term: &str) -> Result<Vec<ChatMessage>>;

    /// Physically remove one message. Administrative only.
    ///
    /// Returns whether a row was removed.
    async fn hard_delete(&self, id: Uuid) -> Result<bool>;

    /// Physically remove every message of a project. Administrative only.
    async fn purge_project(&self, project_id: Uuid) -> Result<u64>;

    /// Liveness probe used by `/health`
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
