//! Generative-language model access
//!
//! The pipeline talks to the model only through the [`Generator`] trait so
//! the hosted client can be swapped for an in-memory fake in tests.

pub mod client;
pub mod streaming;

use async_trait::async_trait;

pub use client::GeminiClient;
pub use streaming::ChunkStream;
pub use streaming::GenerationChunk;
pub use streaming::StreamingResponse;

use crate::errors::Result;
use crate::models::Turn;

/// Text generation over a conversation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Single-shot generation; `None` when the model returned no text
    async fn generate(
        &self,
        contents: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<Option<String>>;

    /// Open a lazy stream of chunks. Errors before the first byte are
    /// returned here; later ones arrive inside the stream.
    async fn generate_stream(
        &self,
        contents: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<StreamingResponse>;
}
