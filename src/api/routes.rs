//! API route definitions

use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Chat pipeline
        .route("/v1/chats", post(handlers::create_chat))
        .route(
            "/v1/chats/:conversation_id",
            get(handlers::get_conversation_chats),
        )
        // Conversation storage
        .route(
            "/v1/save-chat",
            post(handlers::save_chat).get(handlers::list_conversations),
        )
        .route("/v1/conversations", get(handlers::list_conversations))
        .route("/v1/conversations/:id", delete(handlers::delete_conversation))
        .route("/v1/messages", get(handlers::list_messages))
        .with_state(state)
}
