/// Chat pipeline handler
use std::convert::Infallible;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use tracing::info;

use super::ApiError;
use super::AppState;
use super::USER_EMAIL_HEADER;
use crate::api::types::ChatRequest;
use crate::rag::ChatOutcome;
use crate::rag::ConversationHistory;

/// Fragments buffered between the upstream producer and the response body
const STREAM_CHANNEL_CAPACITY: usize = 16;

/// Answer a chat question (POST /api/v1/chats)
pub async fn create_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let caller = headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous");
    info!(
        "POST /api/v1/chats from {} (conversation: {})",
        caller,
        req.conversation_id.as_deref().unwrap_or("none")
    );

    let history = ConversationHistory::from_raw(req.history);
    let outcome = state
        .pipeline
        .answer(&req.question, history)
        .await
        .map_err(|e| ApiError::from_pipeline(&e))?;

    match outcome {
        ChatOutcome::Batch(reply) => Ok(Json(reply).into_response()),
        ChatOutcome::Stream(stream) => {
            let fragments = stream
                .into_channel(STREAM_CHANNEL_CAPACITY)
                .map(Ok::<_, Infallible>);
            Ok((
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                Body::from_stream(fragments),
            )
                .into_response())
        }
    }
}
