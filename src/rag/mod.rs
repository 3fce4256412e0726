//! RAG (Retrieval-Augmented Generation) chat pipeline
//!
//! This module answers questions about the indexed DSA material:
//! - Follow-up questions are rewritten into standalone queries
//! - The query is embedded and matched against the vector store
//! - Matching passages are assembled into a bounded context
//! - The model answers from that context only, streamed or in one piece
//!
//! # Examples
//!
//! ```rust,no_run
//! use dsacoach::config::AppConfig;
//! use dsacoach::rag::{ChatPipeline, ConversationHistory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let pipeline = ChatPipeline::from_config(&config)?;
//!
//!     let reply = pipeline
//!         .answer_batch("What is a binary search tree?", ConversationHistory::default())
//!         .await?;
//!     println!("Answer: {}", reply.answer);
//!     println!("Sources: {} passages", reply.sources_count);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod context;
pub mod history;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
pub mod retry;
pub mod rewriter;

pub use answer::AnswerGenerator;
pub use answer::BatchAnswer;
pub use context::AssembledContext;
pub use context::ContextAssembler;
pub use context::CONTEXT_SEPARATOR;
pub use history::ConversationHistory;
pub use history::RawTurn;
pub use pipeline::ChatOutcome;
pub use pipeline::ChatPipeline;
pub use pipeline::ChatReply;
pub use retriever::Retriever;
pub use retry::retry_with_backoff;
pub use retry::RetryPolicy;
pub use rewriter::QueryRewriter;
