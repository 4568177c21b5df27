use crate::handlers::rooms::{ClientSender, ConnectionId, RoomRegistry};
use crate::message::ServerMessage;
use crate::models::RoomId;
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use uuid::Uuid;

pub type WebSocketStreamType = WebSocketStream<TcpStream>;

/// Per-connection state after a successful handshake.
///
/// `user_id` is the verified token subject and never changes for the
/// lifetime of the connection.
pub struct ConnectionHandler {
    ws_sender: SplitSink<WebSocketStreamType, WsMessage>,
    tx: ClientSender,
    id: ConnectionId,
    user_id: Uuid,
    room: Option<RoomId>,
    addr: SocketAddr,
}

impl ConnectionHandler {
    pub fn new(
        ws_sender: SplitSink<WebSocketStreamType, WsMessage>,
        tx: ClientSender,
        user_id: Uuid,
        addr: SocketAddr,
    ) -> Self {
        Self {
            ws_sender,
            tx,
            id: ConnectionId::new(),
            user_id,
            room: None,
            addr,
        }
    }

    pub async fn send_json(&mut self, msg: &ServerMessage) -> Result<(), String> {
        let json = serde_json::to_string(msg)
            .map_err(|e| format!("Failed to serialize message: {}", e))?;

        self.ws_sender
            .send(WsMessage::Text(json))
            .await
            .map_err(|e| format!("Failed to send message: {}", e))?;

        Ok(())
    }

    pub async fn send_error(&mut self, message: &str) {
        if self.send_json(&ServerMessage::error(message)).await.is_err() {
            tracing::debug!("Failed to send error to disconnected client {}", self.addr);
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room(&self) -> Option<RoomId> {
        self.room
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Join `room`, leaving the current one first
    pub async fn join(&mut self, rooms: &RoomRegistry, room: RoomId) -> Option<RoomId> {
        let previous = rooms.join(room, self.id, self.tx.clone()).await;
        self.room = Some(room);
        previous
    }

    /// Leave the current room. Safe to call when not in one.
    pub async fn leave(&mut self, rooms: &RoomRegistry) -> Option<RoomId> {
        self.room = None;
        rooms.leave(self.id).await
    }

    pub async fn disconnect(&mut self, rooms: &RoomRegistry) {
        if let Some(room) = self.leave(rooms).await {
            tracing::debug!(room = %room, connection = %self.id, "Removed closed connection from room");
        }
    }
}
