//! Gemini embedding API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::Embedder;
use crate::config::AppConfig;
use crate::errors::DsaCoachError;
use crate::errors::Result;
use crate::llm::client::upstream_error;

const SERVICE: &str = "gemini-embeddings";

/// Intended use of an embedding, forwarded as the API's `taskType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    RetrievalQuery,
    RetrievalDocument,
}

/// Client for generating embeddings with `embedContent` / `batchEmbedContents`
pub struct GeminiEmbeddingClient {
    model: String,
    endpoint: String,
    api_key: String,
    /// Expected vector length, 0 to accept any
    dimension: usize,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbeddingClient {
    /// Create a new embedding client
    pub fn new(
        model: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        dimension: usize,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DsaCoachError::HttpError(e.to_string()))?;

        Ok(Self {
            model: model.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            dimension,
            client,
        })
    }

    /// Create a client from the `[embeddings]` section
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.embedding_model(),
            config.embedding_endpoint(),
            config.llm_key(),
            config.embedding_dimension(),
        )
    }

    fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    fn content_request<'a>(&self, text: &'a str, task_type: TaskType) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: self.model_path(),
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
            task_type,
        }
    }

    fn check_dimension(&self, values: Vec<f32>) -> Result<Vec<f32>> {
        if values.is_empty() {
            return Err(DsaCoachError::EmbeddingError(
                "No embedding in response".to_string(),
            ));
        }
        if self.dimension != 0 && values.len() != self.dimension {
            return Err(DsaCoachError::EmbeddingError(format!(
                "Expected {} dimensions from {}, got {}",
                self.dimension,
                self.model,
                values.len()
            )));
        }
        Ok(values)
    }

    async fn post<T: Serialize + Sync, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &T,
    ) -> Result<R> {
        let url = format!("{}/{}:{}", self.endpoint, self.model_path(), method);
        debug!("Calling Gemini embeddings API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| DsaCoachError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(upstream_error(SERVICE, status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| DsaCoachError::EmbeddingError(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl Embedder for GeminiEmbeddingClient {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let request = self.content_request(text, TaskType::RetrievalQuery);
        let response: EmbedContentResponse = self.post("embedContent", &request).await?;
        self.check_dimension(response.embedding.values)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| self.content_request(text, TaskType::RetrievalDocument))
                .collect(),
        };
        let response: BatchEmbedResponse = self.post("batchEmbedContents", &request).await?;

        if response.embeddings.len() != texts.len() {
            return Err(DsaCoachError::EmbeddingError(format!(
                "Requested {} embeddings, received {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        response
            .embeddings
            .into_iter()
            .map(|e| self.check_dimension(e.values))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(dimension: usize) -> GeminiEmbeddingClient {
        GeminiEmbeddingClient::new(
            "text-embedding-004",
            "https://generativelanguage.googleapis.com/v1beta/",
            "key",
            dimension,
        )
        .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let client = client(768);
        let json =
            serde_json::to_value(client.content_request("stack", TaskType::RetrievalQuery))
                .unwrap();

        assert_eq!(json["model"], "models/text-embedding-004");
        assert_eq!(json["content"]["parts"][0]["text"], "stack");
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = client(0);
        assert_eq!(
            client.endpoint,
            "https://generativelanguage.googleapis.com/v1beta"
        );
    }

    #[test]
    fn test_dimension_check() {
        let client = client(3);
        assert_eq!(client.check_dimension(vec![0.1, 0.2, 0.3]).unwrap().len(), 3);
        assert!(client.check_dimension(vec![0.1]).is_err());
        assert!(client.check_dimension(Vec::new()).is_err());

        // 0 accepts any length
        assert!(self::client(0).check_dimension(vec![1.0]).is_ok());
    }

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_gemini_embedding() {
        let client = GeminiEmbeddingClient::new(
            "text-embedding-004",
            "https://generativelanguage.googleapis.com/v1beta",
            std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            768,
        )
        .unwrap();

        let embedding = client.embed_query("What is a stack?").await.unwrap();
        assert_eq!(embedding.len(), 768);
    }
}
