// ============================================================================
// Chat Domain Types
// ============================================================================
//
// ChatMessage is the persisted record. MessageView is the read-time shape
// pushed to clients and returned by the REST API; it is built from a
// ChatMessage by the service layer, never by the store.
//
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(MessageType::Text),
            "system" => Some(MessageType::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub sender_id: Uuid,
    /// Display name captured at send time
    pub sender_name: String,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Client-facing view of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub content: String,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub timestamp: DateTime<Utc>,
    pub project_id: Uuid,
    #[serde(default)]
    pub message_type: MessageType,
}

impl From<&ChatMessage> for MessageView {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            id: msg.id,
            content: msg.content.clone(),
            sender_id: msg.sender_id,
            sender_name: msg.sender_name.clone(),
            timestamp: msg.created_at,
            project_id: msg.project_id,
            message_type: msg.message_type,
        }
    }
}

/// Broadcast target for one project.
///
/// Wrapping the project id keeps room keys from colliding with any other
/// keyspace keyed by raw UUIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(Uuid);

impl RoomId {
    pub fn for_project(project_id: Uuid) -> Self {
        Self(project_id)
    }

    pub fn project_id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project:{}", self.0)
    }
}
