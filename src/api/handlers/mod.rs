/// API request handlers
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;
use uuid::Uuid;

use crate::api::store::ConversationStore;
use crate::api::types::ApiResponse;
use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::errors::DsaCoachError;
use crate::errors::ErrorKind;
use crate::rag::ChatPipeline;

pub mod chat;
pub mod conversations;

pub use chat::*;
pub use conversations::*;

/// Header carrying the email of the caller, set by the fronting auth layer
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
    pub store: Arc<ConversationStore>,
}

/// Error response with a JSON `{"error": ...}` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Map a pipeline failure to the status and message shown to clients
    pub fn from_pipeline(e: &DsaCoachError) -> Self {
        match e.kind() {
            ErrorKind::Configuration => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI service configuration issue. Please check API credentials.",
            ),
            ErrorKind::QuotaExceeded => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "AI service temporarily unavailable due to quota limits. Please try again later.",
            ),
            ErrorKind::TransientUpstream | ErrorKind::RequestFailed => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed ({}): {}", self.status, self.message);
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Email of the authenticated caller
pub fn caller_email(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(ToString::to_string)
        .ok_or_else(ApiError::unauthorized)
}

/// Parse a conversation id from the path or query string
fn parse_conversation_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(not_found))
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
