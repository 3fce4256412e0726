/// Conversation and message handlers
use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::info;

use super::caller_email;
use super::parse_conversation_id;
use super::ApiError;
use super::AppState;
use crate::api::store::ChatMessage;
use crate::api::store::Conversation;
use crate::api::store::Sender;
use crate::api::types::MessagesQuery;
use crate::api::types::SaveChatRequest;
use crate::api::types::SaveChatResponse;
use crate::api::types::SuccessResponse;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing_fields() -> ApiError {
    ApiError::bad_request("Missing sender or conversationId/conversationTitle")
}

/// Messages of one of the caller's conversations (GET /api/v1/chats/:conversation_id)
pub async fn get_conversation_chats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let email = caller_email(&headers)?;
    info!("GET /api/v1/chats/{}", conversation_id);

    let id = parse_conversation_id(&conversation_id, "Conversation not found")?;
    let conversation = state
        .store
        .get_owned(&email, id)
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    Ok(Json(state.store.messages(conversation.id)))
}

/// Save one message (POST /api/v1/save-chat)
pub async fn save_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SaveChatRequest>, JsonRejection>,
) -> Result<Json<SaveChatResponse>, ApiError> {
    let email = caller_email(&headers)?;
    let Json(req) = payload?;
    info!("POST /api/v1/save-chat");

    let sender = non_blank(req.sender.as_deref());
    let conversation_id = non_blank(req.conversation_id.as_deref());
    let title = non_blank(req.conversation_title.as_deref());

    let Some(sender) = sender else {
        return Err(missing_fields());
    };
    if conversation_id.is_none() && title.is_none() {
        return Err(missing_fields());
    }
    let sender = Sender::parse(sender).ok_or_else(|| ApiError::bad_request("Invalid sender value"))?;

    let conversation = if let Some(raw_id) = conversation_id {
        let id = parse_conversation_id(raw_id, "Conversation not found")?;
        state
            .store
            .get_owned(&email, id)
            .ok_or_else(|| ApiError::not_found("Conversation not found"))?
    } else if let Some(title) = title {
        state.store.create_conversation(&email, title)
    } else {
        return Err(missing_fields());
    };

    let chat = match non_blank(req.text.as_deref()) {
        Some(text) => Some(
            state
                .store
                .append_message(conversation.id, sender, text)
                .map_err(|_| ApiError::not_found("Conversation not found"))?,
        ),
        None => None,
    };

    Ok(Json(SaveChatResponse {
        success: true,
        chat,
        conversation_id: conversation.id,
    }))
}

/// Caller's conversations, newest first (GET /api/v1/save-chat, GET /api/v1/conversations)
pub async fn list_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let email = caller_email(&headers)?;
    info!("GET /api/v1/conversations");

    Ok(Json(state.store.list_conversations(&email)))
}

/// Delete a conversation and its messages (DELETE /api/v1/conversations/:id)
pub async fn delete_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let email = caller_email(&headers)?;
    info!("DELETE /api/v1/conversations/{}", id);

    if id.trim().is_empty() {
        return Err(ApiError::bad_request("Conversation ID is required"));
    }

    let id = parse_conversation_id(&id, "Conversation not found or access denied")?;
    if !state.store.delete_conversation(&email, id) {
        return Err(ApiError::not_found(
            "Conversation not found or access denied",
        ));
    }

    Ok(Json(SuccessResponse { success: true }))
}

/// Messages of a conversation, oldest first (GET /api/v1/messages?conversationId=)
pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let email = caller_email(&headers)?;
    info!("GET /api/v1/messages");

    let Some(raw_id) = non_blank(query.conversation_id.as_deref()) else {
        return Err(ApiError::bad_request("conversationId is required"));
    };

    let id = parse_conversation_id(raw_id, "Conversation not found")?;
    if state.store.get_owned(&email, id).is_none() {
        return Err(ApiError::not_found("Conversation not found"));
    }

    Ok(Json(state.store.messages(id)))
}
