// ============================================================================
// Room Registry
// ============================================================================
//
// In-memory map of project rooms to the connections currently joined.
// A connection is in at most one room; joining a new room leaves the old
// one under the same write lock, so no broadcast ever sees it in two rooms.
//
// Broadcast holds the read lock only while pushing into per-connection
// unbounded channels. Nothing here waits on a socket.
//
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::message::ServerMessage;
use crate::metrics;
use crate::models::RoomId;

pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Default)]
struct Registry {
    rooms: HashMap<RoomId, HashMap<ConnectionId, ClientSender>>,
    by_connection: HashMap<ConnectionId, RoomId>,
}

impl Registry {
    fn remove(&mut self, connection: ConnectionId) -> Option<RoomId> {
        let room = self.by_connection.remove(&connection)?;
        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(&connection);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }
        Some(room)
    }
}

#[derive(Default)]
pub struct RoomRegistry {
    inner: RwLock<Registry>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `connection` in `room`, leaving any room it was in.
    ///
    /// Returns the previous room, if it differed.
    pub async fn join(
        &self,
        room: RoomId,
        connection: ConnectionId,
        tx: ClientSender,
    ) -> Option<RoomId> {
        let mut registry = self.inner.write().await;
        let previous = registry.remove(connection).filter(|prev| *prev != room);

        registry
            .rooms
            .entry(room)
            .or_default()
            .insert(connection, tx);
        registry.by_connection.insert(connection, room);

        previous
    }

    /// Remove `connection` from whatever room it occupies. No-op if none.
    pub async fn leave(&self, connection: ConnectionId) -> Option<RoomId> {
        self.inner.write().await.remove(connection)
    }

    #[cfg(test)]
    async fn room_of(&self, connection: ConnectionId) -> Option<RoomId> {
        self.inner.read().await.by_connection.get(&connection).copied()
    }

    pub async fn member_count(&self, room: RoomId) -> usize {
        self.inner
            .read()
            .await
            .rooms
            .get(&room)
            .map_or(0, HashMap::len)
    }

    /// Push `event` to every connection in `room`.
    ///
    /// Receivers that are already closing are skipped. Returns the number of
    /// connections the event was handed to.
    pub async fn broadcast(&self, room: RoomId, event: ServerMessage) -> usize {
        let registry = self.inner.read().await;
        let Some(members) = registry.rooms.get(&room) else {
            return 0;
        };

        let delivered = members
            .values()
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count();

        metrics::BROADCAST_DELIVERIES_TOTAL.inc_by(delivered as u64);
        tracing::debug!(
            room = %room,
            event = event.event_name(),
            members = members.len(),
            delivered = delivered,
            "Broadcast to room"
        );

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> RoomId {
        RoomId::for_project(Uuid::new_v4())
    }

    fn event() -> ServerMessage {
        ServerMessage::MessageDeleted {
            message_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_only_room_members() {
        let registry = RoomRegistry::new();
        let (room_a, room_b) = (room(), room());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let (tx3, mut rx3) = mpsc::unbounded_channel();

        registry.join(room_a, ConnectionId::new(), tx1).await;
        registry.join(room_a, ConnectionId::new(), tx2).await;
        registry.join(room_b, ConnectionId::new(), tx3).await;

        let sent = event();
        assert_eq!(registry.broadcast(room_a, sent.clone()).await, 2);

        assert_eq!(rx1.try_recv().unwrap(), sent);
        assert_eq!(rx2.try_recv().unwrap(), sent);
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn joining_a_new_room_leaves_the_old_one() {
        let registry = RoomRegistry::new();
        let (room_a, room_b) = (room(), room());
        let conn = ConnectionId::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        assert_eq!(registry.join(room_a, conn, tx.clone()).await, None);
        assert_eq!(registry.join(room_b, conn, tx.clone()).await, Some(room_a));
        // Rejoining the same room reports no switch
        assert_eq!(registry.join(room_b, conn, tx).await, None);

        assert_eq!(registry.member_count(room_a).await, 0);
        assert_eq!(registry.member_count(room_b).await, 1);
        assert_eq!(registry.room_of(conn).await, Some(room_b));
    }

    #[tokio::test]
    async fn leave_is_safe_when_not_in_a_room() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.leave(ConnectionId::new()).await, None);

        let r = room();
        let conn = ConnectionId::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.join(r, conn, tx).await;

        assert_eq!(registry.leave(conn).await, Some(r));
        assert_eq!(registry.leave(conn).await, None);
        assert_eq!(registry.member_count(r).await, 0);
    }

    #[tokio::test]
    async fn closed_receivers_are_skipped() {
        let registry = RoomRegistry::new();
        let r = room();
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        drop(dead_rx);

        registry.join(r, ConnectionId::new(), live_tx).await;
        registry.join(r, ConnectionId::new(), dead_tx).await;

        assert_eq!(registry.broadcast(r, event()).await, 1);
        assert!(live_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_to_empty_room_is_a_no_op() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.broadcast(room(), event()).await, 0);
    }
}
