//! Managed vector database access
//!
//! Similarity search is delegated to the hosted index; this module only
//! shapes requests and responses.

pub mod pinecone;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

pub use pinecone::PineconeClient;

use crate::errors::Result;

/// One nearest neighbour, ranked by the store
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VectorMatch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl VectorMatch {
    /// The `text` metadata field rendered as a string.
    ///
    /// Strings are returned as-is, a missing or null field is empty, and any
    /// other JSON value is rendered as JSON.
    pub fn text(&self) -> String {
        match self.metadata.as_ref().and_then(|m| m.get("text")) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// A vector to be written with its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// Top-K similarity search and writes against a hosted index
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Nearest neighbours of `vector`, best first
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<VectorMatch>>;

    /// Insert or overwrite records, returning how many were written
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn with_metadata(metadata: Value) -> VectorMatch {
        VectorMatch {
            id: "1".to_string(),
            score: 0.5,
            metadata: metadata.as_object().cloned(),
        }
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(with_metadata(json!({"text": "LIFO"})).text(), "LIFO");
        assert_eq!(with_metadata(json!({"text": 42})).text(), "42");
        assert_eq!(with_metadata(json!({"text": true})).text(), "true");
        assert_eq!(with_metadata(json!({"text": null})).text(), "");
        assert_eq!(with_metadata(json!({"source": "dsa.pdf"})).text(), "");
    }

    #[test]
    fn test_text_without_metadata() {
        let m = VectorMatch {
            id: "x".to_string(),
            score: 0.1,
            metadata: None,
        };
        assert_eq!(m.text(), "");
    }
}
