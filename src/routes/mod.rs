// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: Main router assembly and middleware
// - health.rs: Health check and metrics endpoints
// - messages.rs: Project chat history and message endpoints
// - extractors.rs: Custom Axum extractors (JWT)
// - middleware.rs: Request logging
//
// ============================================================================

mod extractors;
mod health;
mod messages;
mod middleware;

pub use extractors::AuthenticatedUser;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        // Health and monitoring
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // Project chat
        .route(
            "/api/projects/:project_id/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/api/projects/:project_id/messages/recent",
            get(messages::recent_messages),
        )
        .route(
            "/api/projects/:project_id/messages/search",
            get(messages::search_messages),
        )
        .route(
            "/api/projects/:project_id/messages/count",
            get(messages::count_messages),
        )
        .route(
            "/api/projects/:project_id/messages/announcements",
            post(messages::post_announcement),
        )
        .route(
            "/api/projects/:project_id/messages/:message_id",
            delete(messages::delete_message),
        )
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .into_inner(),
        )
        .with_state(app_context)
}
