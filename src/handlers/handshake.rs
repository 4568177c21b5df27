// ============================================================================
// WebSocket Handshake Authentication
// ============================================================================
//
// The bearer token must arrive with the upgrade request, either as
//   Authorization: Bearer <jwt>
// or as a `token` query parameter (browsers cannot set headers on
// WebSocket upgrades). A bad or missing token fails the upgrade with
// HTTP 401, so no application frame is ever read from that socket.
//
// ============================================================================

use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request};
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, StatusCode};
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::error::AppError;
use crate::utils::{bearer_token, token_from_query};

/// Header wins over query when both are present
pub fn extract_token(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    from_header.or_else(|| req.uri().query().and_then(token_from_query))
}

pub fn authenticate_request(auth: &AuthManager, req: &Request) -> Result<Uuid, AppError> {
    let token = extract_token(req).ok_or_else(|| AppError::auth("Missing credential"))?;

    auth.authenticate(&token)
        .map_err(|e| AppError::auth(format!("Invalid or expired token: {e:#}")))
}

pub fn reject(err: &AppError) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(err.user_message()));
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
}
