//! HTTP API for the chat pipeline and conversation storage

pub mod handlers;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use handlers::AppState;
pub use server::app;
pub use server::serve_api;
pub use store::ConversationStore;
