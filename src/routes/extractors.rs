// ============================================================================
// Axum Extractors
// ============================================================================
//
// - AuthenticatedUser: validates the bearer JWT and yields the subject id
//
// ============================================================================

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::AppError;
use crate::utils::bearer_token;

/// Extractor for authenticated user ID from JWT token
///
/// Usage:
/// ```rust,ignore
/// async fn handler(user: AuthenticatedUser, ...) -> Result<...> {
///     let user_id = user.0;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        extract_user_id(state, parts)
            .map(AuthenticatedUser)
            .map_err(IntoResponse::into_response)
    }
}

fn extract_user_id(ctx: &AppContext, parts: &Parts) -> Result<Uuid, AppError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::auth("Missing Authorization header"))?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| AppError::auth("Invalid Authorization header format"))?;

    ctx.auth_manager
        .authenticate(token)
        .map_err(|e| AppError::auth(format!("Invalid or expired token: {e:#}")))
}
