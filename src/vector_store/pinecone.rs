//! Pinecone data-plane client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;

use super::VectorMatch;
use super::VectorRecord;
use super::VectorStore;
use crate::config::AppConfig;
use crate::errors::DsaCoachError;
use crate::errors::Result;
use crate::llm::client::upstream_error;

const SERVICE: &str = "pinecone";
const API_VERSION: &str = "2024-07";

/// Client for one Pinecone index.
///
/// The data-plane host is resolved from the control plane on first use
/// unless it was configured, and cached for the life of the process.
pub struct PineconeClient {
    client: Client,
    api_key: String,
    index_name: String,
    namespace: Option<String>,
    control_plane: String,
    host: OnceCell<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

/// Normalize a data-plane host to a base URL
fn host_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

impl PineconeClient {
    pub fn new(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        index_host: Option<String>,
        namespace: Option<String>,
        control_plane: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DsaCoachError::HttpError(e.to_string()))?;

        let host = OnceCell::new();
        if let Some(configured) = index_host.filter(|h| !h.trim().is_empty()) {
            // A fresh cell cannot already be set
            let _ = host.set(host_url(&configured));
        }

        Ok(Self {
            client,
            api_key: api_key.into(),
            index_name: index_name.into(),
            namespace: namespace.filter(|n| !n.is_empty()),
            control_plane: control_plane.into().trim_end_matches('/').to_string(),
            host,
        })
    }

    /// Create a client from the `[vector_store]` section
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let vs = &config.vector_store;
        Self::new(
            vs.api_key.clone(),
            vs.index_name.clone(),
            vs.index_host.clone(),
            vs.namespace.clone(),
            vs.control_plane_endpoint.clone(),
        )
    }

    async fn host(&self) -> Result<&str> {
        let host = self.host.get_or_try_init(|| self.describe_host()).await?;
        Ok(host.as_str())
    }

    /// Ask the control plane where the index is served
    async fn describe_host(&self) -> Result<String> {
        let url = format!("{}/indexes/{}", self.control_plane, self.index_name);
        debug!("Resolving Pinecone index host: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| DsaCoachError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(upstream_error(SERVICE, status.as_u16(), &error_text));
        }

        let described: DescribeIndexResponse = response.json().await.map_err(|e| {
            DsaCoachError::VectorStoreError(format!("Failed to parse index description: {e}"))
        })?;
        info!("Pinecone index '{}' served at {}", self.index_name, described.host);
        Ok(host_url(&described.host))
    }

    async fn post<T: Serialize + Sync, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R> {
        let url = format!("{}{}", self.host().await?, path);

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
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
            .map_err(|e| DsaCoachError::VectorStoreError(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl VectorStore for PineconeClient {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<VectorMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response: QueryResponse = self.post("/query", &request).await?;
        debug!("Pinecone returned {} matches", response.matches.len());
        Ok(response.matches)
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let request = UpsertRequest {
            vectors: records,
            namespace: self.namespace.as_deref(),
        };

        let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
        Ok(response.upserted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_url() {
        assert_eq!(
            host_url("dsa-abc123.svc.aped-4627.pinecone.io"),
            "https://dsa-abc123.svc.aped-4627.pinecone.io"
        );
        assert_eq!(host_url("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn test_query_request_shape() {
        let vector = [0.1_f32, 0.2];
        let request = QueryRequest {
            vector: &vector,
            top_k: 10,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["topK"], 10);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_query_response_parsing() {
        let response: QueryResponse = serde_json::from_str(
            r#"{"matches":[{"id":"c1","score":0.91,"metadata":{"text":"A stack is a LIFO structure."}},{"id":"c2","score":0.42}],"namespace":""}"#,
        )
        .unwrap();

        assert_eq!(response.matches.len(), 2);
        assert_eq!(response.matches[0].text(), "A stack is a LIFO structure.");
        assert_eq!(response.matches[1].text(), "");
    }

    #[tokio::test]
    async fn test_configured_host_skips_lookup() {
        let client = PineconeClient::new(
            "key",
            "dsa",
            Some("dsa-abc.svc.pinecone.io".to_string()),
            None,
            "https://api.pinecone.io",
        )
        .unwrap();

        assert_eq!(client.host().await.unwrap(), "https://dsa-abc.svc.pinecone.io");
    }
}
