// ============================================================================
// Project Messages Routes
// ============================================================================
//
// Endpoints (all require a bearer token):
// - GET    /api/projects/:project_id/messages           - History, oldest first
// - GET    /api/projects/:project_id/messages/recent    - History, newest first
// - GET    /api/projects/:project_id/messages/search    - Substring search (?q=)
// - GET    /api/projects/:project_id/messages/count     - Active message count
// - POST   /api/projects/:project_id/messages           - Send a message
// - POST   /api/projects/:project_id/messages/announcements - Owner posts a system message
// - DELETE /api/projects/:project_id/messages/:message_id - Soft-delete own message
//
// ============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::AppError;
use crate::models::{ChatMessage, MessageView};
use crate::routes::extractors::AuthenticatedUser;
use crate::store::Page;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        Page::new(params.limit, params.offset)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageView>,
    pub limit: i64,
    pub offset: i64,
}

fn views(messages: &[ChatMessage]) -> Vec<MessageView> {
    messages.iter().map(MessageView::from).collect()
}

/// GET /api/projects/:project_id/messages
pub async fn list_messages(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::from(params);
    let messages = ctx.messages.list(user.0, project_id, page).await?;

    Ok(Json(MessageListResponse {
        messages: views(&messages),
        limit: page.limit,
        offset: page.offset,
    }))
}

/// GET /api/projects/:project_id/messages/recent
pub async fn recent_messages(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::from(params);
    let messages = ctx.messages.list_recent(user.0, project_id, page).await?;

    Ok(Json(MessageListResponse {
        messages: views(&messages),
        limit: page.limit,
        offset: page.offset,
    }))
}

/// GET /api/projects/:project_id/messages/search?q=
pub async fn search_messages(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let messages = ctx.messages.search(user.0, project_id, &params.q).await?;
    Ok(Json(json!({ "messages": views(&messages) })))
}

/// GET /api/projects/:project_id/messages/count
pub async fn count_messages(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let count = ctx.messages.count(user.0, project_id).await?;
    Ok(Json(json!({ "count": count })))
}

/// POST /api/projects/:project_id/messages
pub async fn send_message(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = ctx
        .messages
        .send(user.0, project_id, &request.content)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageView::from(&message))))
}

/// POST /api/projects/:project_id/messages/announcements
pub async fn post_announcement(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = ctx
        .messages
        .announce(user.0, project_id, &request.content)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageView::from(&message))))
}

/// DELETE /api/projects/:project_id/messages/:message_id
pub async fn delete_message(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path((project_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    ctx.messages.delete(user.0, project_id, message_id).await?;

    Ok(Json(json!({
        "success": true,
        "messageId": message_id,
    })))
}
