//! Embeddings generation module
//!
//! Queries are embedded at request time by the retriever; documents are
//! embedded in batches by the ingestion path.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dsacoach::config::AppConfig;
//! use dsacoach::embeddings::{Embedder, GeminiEmbeddingClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let client = GeminiEmbeddingClient::from_config(&config)?;
//!
//!     let embedding = client.embed_query("What is a binary heap?").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;

use async_trait::async_trait;

pub use client::GeminiEmbeddingClient;
pub use client::TaskType;

use crate::errors::Result;

/// Maps text to fixed-dimension vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed documents for indexing, one vector per input in order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
