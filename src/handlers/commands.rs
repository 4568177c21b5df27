// ============================================================================
// Gateway Command Handlers
// ============================================================================
//
// join_project  - enter a project room (permissive unless strict joins are on)
// leave_project - leave the room if it is the named project
// send_message  - same path as POST /api/projects/:id/messages
//
// Failures are reported to the caller as `error` frames; the connection
// stays open.
//
// ============================================================================

use uuid::Uuid;

use crate::context::AppContext;
use crate::handlers::connection::ConnectionHandler;
use crate::message::ServerMessage;
use crate::models::RoomId;

pub async fn handle_join_project(
    handler: &mut ConnectionHandler,
    ctx: &AppContext,
    project_id: Uuid,
) {
    let salt_id = |id: &Uuid| ctx.config.logging.id(id);

    if ctx.config.strict_room_join {
        match ctx.access.can_access(handler.user_id(), project_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    user = %salt_id(&handler.user_id()),
                    project = %salt_id(&project_id),
                    "Room join denied"
                );
                handler.send_error("Access denied to this project").await;
                return;
            }
            Err(e) => {
                e.log();
                handler.send_error(&e.user_message()).await;
                return;
            }
        }
    }

    let room = RoomId::for_project(project_id);
    if let Some(previous) = handler.join(&ctx.rooms, room).await {
        tracing::debug!(from = %previous, to = %room, "Connection switched rooms");
    }

    tracing::info!(
        user = %salt_id(&handler.user_id()),
        project = %salt_id(&project_id),
        "Joined project room"
    );

    if let Err(e) = handler
        .send_json(&ServerMessage::JoinedProject { project_id })
        .await
    {
        tracing::debug!(error = %e, "Failed to acknowledge join");
    }
}

pub async fn handle_leave_project(
    handler: &mut ConnectionHandler,
    ctx: &AppContext,
    project_id: Uuid,
) {
    // Only leave when the named project is the current room
    if handler.room() == Some(RoomId::for_project(project_id)) {
        handler.leave(&ctx.rooms).await;
        tracing::info!(
            user = %ctx.config.logging.id(&handler.user_id()),
            project = %ctx.config.logging.id(&project_id),
            "Left project room"
        );
    }

    if let Err(e) = handler
        .send_json(&ServerMessage::LeftProject { project_id })
        .await
    {
        tracing::debug!(error = %e, "Failed to acknowledge leave");
    }
}

pub async fn handle_send_message(
    handler: &mut ConnectionHandler,
    ctx: &AppContext,
    project_id: Uuid,
    content: String,
) {
    // The sender is always the handshake subject, never a client-supplied id.
    if let Err(e) = ctx
        .messages
        .send(handler.user_id(), project_id, &content)
        .await
    {
        e.log();
        handler.send_error(&e.user_message()).await;
    }
}
