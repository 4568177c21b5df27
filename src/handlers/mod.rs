mod commands;
mod connection;
pub mod handshake;
pub mod rooms;

use crate::config::MAX_WEBSOCKET_FRAME_SIZE;
use crate::context::AppContext;
use crate::message::ClientMessage;
use crate::metrics;
use connection::{ConnectionHandler, WebSocketStreamType};
use futures_util::StreamExt;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::Instrument;
use uuid::Uuid;

/// Upgrade a raw TCP socket, authenticating during the handshake.
///
/// A failed handshake only ends this connection attempt.
pub async fn accept_connection(socket: TcpStream, addr: SocketAddr, ctx: AppContext) {
    let mut subject: Option<Uuid> = None;
    let auth = ctx.auth_manager.clone();

    let callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        match handshake::authenticate_request(&auth, req) {
            Ok(user_id) => {
                subject = Some(user_id);
                Ok(response)
            }
            Err(e) => {
                e.log();
                Err(handshake::reject(&e))
            }
        }
    };

    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(MAX_WEBSOCKET_FRAME_SIZE);
    ws_config.max_frame_size = Some(MAX_WEBSOCKET_FRAME_SIZE);

    let ws_stream =
        match tokio_tungstenite::accept_hdr_async_with_config(socket, callback, Some(ws_config))
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                metrics::HANDSHAKES_REJECTED_TOTAL.inc();
                tracing::debug!(addr = %addr, error = %e, "WebSocket handshake failed");
                return;
            }
        };

    let Some(user_id) = subject else {
        metrics::HANDSHAKES_REJECTED_TOTAL.inc();
        tracing::error!(addr = %addr, "Handshake completed without a bound subject");
        return;
    };

    let span = tracing::info_span!("websocket_connection", addr = %addr);
    handle_websocket(ws_stream, addr, user_id, ctx)
        .instrument(span)
        .await;
}

pub async fn handle_websocket(
    ws_stream: WebSocketStreamType,
    addr: SocketAddr,
    user_id: Uuid,
    ctx: AppContext,
) {
    metrics::CONNECTIONS_TOTAL.inc();
    metrics::ACTIVE_CONNECTIONS.inc();

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handler = ConnectionHandler::new(ws_sender, tx, user_id, addr);

    tracing::info!(
        connection = %handler.id(),
        user = %ctx.config.logging.id(&user_id),
        "Authenticated connection established"
    );

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::JoinProject { project_id }) => {
                                commands::handle_join_project(&mut handler, &ctx, project_id).await;
                            }

                            Ok(ClientMessage::LeaveProject { project_id }) => {
                                commands::handle_leave_project(&mut handler, &ctx, project_id).await;
                            }

                            Ok(ClientMessage::SendMessage { project_id, content }) => {
                                commands::handle_send_message(&mut handler, &ctx, project_id, content).await;
                            }

                            Err(e) => {
                                tracing::warn!("Failed to parse message from {}: {}", addr, e);
                                handler.send_error("Invalid message format").await;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Binary(_))) => {
                        handler.send_error("Binary frames are not supported").await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        tracing::info!("Connection closed by client: {}", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    // tungstenite answers pings on the next read
                    Some(Ok(_)) => {}
                }
            }

            Some(server_msg) = rx.recv() => {
                if handler.send_json(&server_msg).await.is_err() {
                    break;
                }
            }
        }
    }

    handler.disconnect(&ctx.rooms).await;
    metrics::ACTIVE_CONNECTIONS.dec();
    tracing::info!(connection = %handler.id(), "Connection closed: {}", handler.addr());
}
