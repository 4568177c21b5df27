// ============================================================================
// Gateway Wire Protocol
// ============================================================================
//
// Every frame is a JSON text frame carrying a `{type, payload}` envelope.
//
// Client → server: join_project, leave_project, send_message
// Server → client: joined_project, left_project, new_message,
//                  message_deleted, error
//
// ============================================================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::MessageView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinProject {
        #[serde(rename = "projectId")]
        project_id: Uuid,
    },
    LeaveProject {
        #[serde(rename = "projectId")]
        project_id: Uuid,
    },
    SendMessage {
        #[serde(rename = "projectId")]
        project_id: Uuid,
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    JoinedProject {
        #[serde(rename = "projectId")]
        project_id: Uuid,
    },
    LeftProject {
        #[serde(rename = "projectId")]
        project_id: Uuid,
    },
    NewMessage(MessageView),
    MessageDeleted {
        #[serde(rename = "messageId")]
        message_id: Uuid,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Event name as it appears in the `type` field
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::JoinedProject { .. } => "joined_project",
            ServerMessage::LeftProject { .. } => "left_project",
            ServerMessage::NewMessage(_) => "new_message",
            ServerMessage::MessageDeleted { .. } => "message_deleted",
            ServerMessage::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_command_parses_from_envelope() {
        let project_id = Uuid::new_v4();
        let raw = json!({ "type": "join_project", "payload": { "projectId": project_id } });

        let parsed: ClientMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed, ClientMessage::JoinProject { project_id });
    }

    #[test]
    fn unknown_command_is_rejected() {
        let raw = json!({ "type": "edit_message", "payload": {} });
        assert!(serde_json::from_value::<ClientMessage>(raw).is_err());
    }

    #[test]
    fn deleted_event_envelope_shape() {
        let message_id = Uuid::new_v4();
        let event = ServerMessage::MessageDeleted { message_id };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message_deleted");
        assert_eq!(json["payload"]["messageId"], message_id.to_string());
        assert_eq!(event.event_name(), "message_deleted");
    }

    #[test]
    fn error_event_envelope_shape() {
        let json = serde_json::to_value(ServerMessage::error("nope")).unwrap();
        assert_eq!(json, json!({ "type": "error", "payload": { "message": "nope" } }));
    }
}
