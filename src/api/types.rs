//! API request and response types

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::api::store::ChatMessage;
use crate::rag::history::deserialize_history;
use crate::rag::history::deserialize_question;
use crate::rag::RawTurn;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body returned with every non-2xx status
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Chat request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "deserialize_question")]
    pub question: String,
    #[serde(default, deserialize_with = "deserialize_history")]
    pub history: Vec<RawTurn>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Save a message, optionally starting a new conversation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChatRequest {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub conversation_title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChatResponse {
    pub success: bool,
    pub chat: Option<ChatMessage>,
    pub conversation_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Query string of `GET /api/v1/messages`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_tolerates_odd_history() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"question":"What is DFS?","history":"nope"}"#).unwrap();
        assert_eq!(request.question, "What is DFS?");
        assert!(request.history.is_empty());

        let request: ChatRequest = serde_json::from_str(r#"{"history":[1,{"role":"user"}]}"#).unwrap();
        assert_eq!(request.question, "");
        assert_eq!(request.history.len(), 2);
    }

    #[test]
    fn test_chat_request_tolerates_odd_question() {
        let request: ChatRequest = serde_json::from_str(r#"{"question":42}"#).unwrap();
        assert_eq!(request.question, "42");

        let request: ChatRequest = serde_json::from_str(r#"{"question":true}"#).unwrap();
        assert_eq!(request.question, "true");

        for body in [
            r#"{"question":null}"#,
            r#"{"question":{"text":"hi"}}"#,
            r#"{"question":["hi"]}"#,
            "{}",
        ] {
            let request: ChatRequest = serde_json::from_str(body).unwrap();
            assert_eq!(request.question, "", "{body}");
        }
    }

    #[test]
    fn test_save_chat_request_camel_case() {
        let request: SaveChatRequest = serde_json::from_str(
            r#"{"sender":"user","text":"hi","conversationTitle":"Graphs"}"#,
        )
        .unwrap();
        assert_eq!(request.conversation_title.as_deref(), Some("Graphs"));
        assert!(request.conversation_id.is_none());
    }
}
