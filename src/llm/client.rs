//! Gemini `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::streaming::decode_event_stream;
use super::streaming::GenerationChunk;
use super::streaming::StreamingResponse;
use super::Generator;
use crate::config::AppConfig;
use crate::errors::DsaCoachError;
use crate::errors::Result;
use crate::models::Turn;

const SERVICE: &str = "gemini";

/// Client for the Gemini generative-language API.
///
/// Holds a pooled HTTP client and is safe to share across requests.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, `None` when it carries no text parts
    pub(crate) fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let texts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

/// Build the upstream error for a failed call, preferring the message in
/// Google's `{"error": {...}}` envelope over the raw body
pub(crate) fn upstream_error(service: &'static str, status: u16, body: &str) -> DsaCoachError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.trim().to_string()
            }
        });

    DsaCoachError::Upstream {
        service,
        status,
        message,
    }
}

/// Parse one streamed `data:` payload. An error envelope inside the stream
/// becomes an upstream error.
pub(crate) fn parse_stream_payload(payload: &str) -> Result<GenerationChunk> {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(payload) {
        return Err(DsaCoachError::Upstream {
            service: SERVICE,
            status: envelope.error.code.unwrap_or(500),
            message: envelope.error.message,
        });
    }

    let response: GenerateContentResponse = serde_json::from_str(payload).map_err(|e| {
        DsaCoachError::LlmError(format!("Invalid JSON in stream chunk: {e}"))
    })?;
    Ok(GenerationChunk::new(response.text()))
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DsaCoachError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Create a client from the `[llm]` section
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.llm_endpoint(),
            config.llm_key(),
            config.llm_model(),
            Duration::from_secs(config.llm.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.endpoint, self.model, method)
    }

    fn request_body<'a>(
        contents: &'a [Turn],
        system_instruction: Option<&'a str>,
    ) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: contents
                .iter()
                .map(|turn| Content {
                    role: turn.role.as_str(),
                    parts: vec![TextPart { text: &turn.text }],
                })
                .collect(),
            system_instruction: system_instruction.map(|text| SystemInstruction {
                parts: vec![TextPart { text }],
            }),
        }
    }

    async fn send(
        &self,
        url: &str,
        contents: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<reqwest::Response> {
        let body = Self::request_body(contents, system_instruction);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DsaCoachError::HttpError(format!("Request to Gemini API failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(upstream_error(SERVICE, status.as_u16(), &error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(
        &self,
        contents: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<Option<String>> {
        let url = self.method_url("generateContent");
        debug!(
            model = self.model.as_str(),
            turns = contents.len(),
            "Sending Gemini completion request"
        );

        let response = self.send(&url, contents, system_instruction).await?;
        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| DsaCoachError::LlmError(format!("Failed to parse response: {e}")))?;

        Ok(result.text())
    }

    async fn generate_stream(
        &self,
        contents: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<StreamingResponse> {
        let url = format!("{}?alt=sse", self.method_url("streamGenerateContent"));
        debug!(
            model = self.model.as_str(),
            turns = contents.len(),
            "Sending Gemini streaming request"
        );

        let response = self.send(&url, contents, system_instruction).await?;
        Ok(StreamingResponse::new(decode_event_stream(
            response.bytes_stream(),
            parse_stream_payload,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let turns = vec![Turn::user("What is a heap?"), Turn::model("A tree.")];
        let body = GeminiClient::request_body(&turns, Some("Be brief."));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What is a heap?");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be brief.");
    }

    #[test]
    fn test_request_body_without_system_instruction() {
        let turns = vec![Turn::user("hi")];
        let json = serde_json::to_value(GeminiClient::request_body(&turns, None)).unwrap();
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"A stack "},{"text":"is LIFO."}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("A stack is LIFO."));
    }

    #[test]
    fn test_response_without_text() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(response.text(), None);

        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_upstream_error_uses_envelope_message() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        let error = upstream_error(SERVICE, 503, body);
        assert!(error.is_transient());
        assert!(error.to_string().contains("The model is overloaded."));
    }

    #[test]
    fn test_upstream_error_raw_body() {
        let error = upstream_error(SERVICE, 502, "bad gateway");
        assert_eq!(error.status(), Some(502));
        assert!(error.to_string().contains("bad gateway"));

        let error = upstream_error(SERVICE, 500, "");
        assert!(error.to_string().contains("Unknown error"));
    }

    #[test]
    fn test_parse_stream_payload() {
        let chunk =
            parse_stream_payload(r#"{"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#)
                .unwrap();
        assert_eq!(chunk.text(), Some("Hel"));

        let chunk = parse_stream_payload(r#"{"usageMetadata":{"promptTokenCount":3}}"#).unwrap();
        assert_eq!(chunk.text(), None);
    }

    #[test]
    fn test_parse_stream_payload_error() {
        let result = parse_stream_payload(r#"{"error":{"code":429,"message":"quota"}}"#);
        assert!(matches!(
            result,
            Err(DsaCoachError::Upstream { status: 429, .. })
        ));

        assert!(matches!(
            parse_stream_payload("not json"),
            Err(DsaCoachError::LlmError(_))
        ));
    }
}
