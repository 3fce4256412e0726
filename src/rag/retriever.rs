//! Semantic retrieval against the vector store

use std::sync::Arc;

use tracing::debug;

use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::models::RetrievedPassage;
use crate::vector_store::VectorStore;

/// Embeds a query and fetches its nearest passages
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl Retriever {
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    /// Passages for `query`, in the store's ranking order
    ///
    /// # Errors
    /// - Embedding errors (API failures, dimension mismatch)
    /// - Vector store query errors
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>> {
        let vector = self.embedder.embed_query(query).await?;
        debug!("Query embedded into {} dimensions", vector.len());

        let matches = self.store.query(&vector, self.top_k, true).await?;
        debug!("Vector store returned {} matches", matches.len());

        Ok(matches
            .iter()
            .map(|m| RetrievedPassage {
                text: m.text(),
                score: m.score,
            })
            .collect())
    }
}
