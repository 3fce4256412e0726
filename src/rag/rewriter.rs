//! Standalone query rewriting

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::errors::DsaCoachError;
use crate::errors::Result;
use crate::llm::Generator;
use crate::models::Turn;
use crate::rag::prompts::build_rewrite_request;
use crate::rag::prompts::QUERY_REWRITE_INSTRUCTION;
use crate::rag::retry::retry_with_backoff;
use crate::rag::retry::RetryPolicy;

/// Rewrites a follow-up question so it can be searched on its own
pub struct QueryRewriter {
    generator: Arc<dyn Generator>,
    retry: RetryPolicy,
}

impl QueryRewriter {
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    /// Rewrite `question` using the earlier user messages.
    ///
    /// An empty model answer falls back to `question` itself.
    ///
    /// # Errors
    /// - Non-transient generation errors (credentials, quota)
    /// - The last overload error once the retry budget is spent
    pub async fn rewrite(&self, user_history: &[String], question: &str) -> Result<String> {
        let contents = vec![Turn::user(build_rewrite_request(user_history, question))];
        let generator = &self.generator;
        let contents = &contents;

        let rewritten = retry_with_backoff(&self.retry, DsaCoachError::is_transient, move || {
            generator.generate(contents, Some(QUERY_REWRITE_INSTRUCTION))
        })
        .await?;

        match rewritten.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            Some(standalone) => {
                info!("Rewritten question: {}", standalone);
                Ok(standalone)
            }
            None => {
                debug!("Rewrite returned no text, keeping the original question");
                Ok(question.to_string())
            }
        }
    }
}
