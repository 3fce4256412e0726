//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::api::store::ConversationStore;
use crate::config::AppConfig;
use crate::rag::ChatPipeline;
use crate::Result;

/// Assemble the application router with its middleware
pub fn app(state: AppState, enable_cors: bool, max_concurrent_requests: usize) -> Router {
    let mut app = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(ConcurrencyLimitLayer::new(max_concurrent_requests.max(1)))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("🚀 Starting dsacoach API server...");

    // Initialize services
    let pipeline = Arc::new(ChatPipeline::from_config(config)?);
    let store = Arc::new(ConversationStore::new());
    info!("Answer mode: {:?}", pipeline.mode());

    let state = AppState { pipeline, store };
    let app = app(state, enable_cors, config.server.max_concurrent_requests);

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET    /api/health                      - Health check");
    info!("  POST   /api/v1/chats                    - Ask the coach");
    info!("  GET    /api/v1/chats/:conversation_id   - Messages of a conversation");
    info!("  POST   /api/v1/save-chat                - Save a message");
    info!("  GET    /api/v1/save-chat                - List conversations");
    info!("  GET    /api/v1/conversations            - List conversations");
    info!("  DELETE /api/v1/conversations/:id        - Delete a conversation");
    info!("  GET    /api/v1/messages?conversationId= - Messages of a conversation");

    axum::serve(listener, app).await?;

    Ok(())
}
