//! Grounded answer generation

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::errors::DsaCoachError;
use crate::errors::Result;
use crate::llm::GenerationChunk;
use crate::llm::Generator;
use crate::llm::StreamingResponse;
use crate::models::Turn;
use crate::rag::prompts::build_answer_instruction;
use crate::rag::retry::retry_with_backoff;
use crate::rag::retry::RetryPolicy;

/// A completed answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAnswer {
    pub answer: String,
    /// True when `answer` is the fallback sentence substituted for
    /// missing context or an empty model reply
    pub fallback: bool,
}

/// Produces the final answer from the history and the assembled context
pub struct AnswerGenerator {
    generator: Arc<dyn Generator>,
    retry: RetryPolicy,
    persona: String,
    fallback_message: String,
}

impl AnswerGenerator {
    #[must_use]
    pub fn new(
        generator: Arc<dyn Generator>,
        retry: RetryPolicy,
        persona: impl Into<String>,
        fallback_message: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            retry,
            persona: persona.into(),
            fallback_message: fallback_message.into(),
        }
    }

    #[must_use]
    pub fn fallback_message(&self) -> &str {
        &self.fallback_message
    }

    /// The fallback sentence as a completed answer
    #[must_use]
    pub fn fallback(&self) -> BatchAnswer {
        BatchAnswer {
            answer: self.fallback_message.clone(),
            fallback: true,
        }
    }

    fn instruction(&self, context: &str) -> String {
        build_answer_instruction(&self.persona, &self.fallback_message, context)
    }

    /// Generate the whole answer at once.
    ///
    /// # Errors
    /// - Generation errors that are not transient, or the last one once
    ///   the retry budget is spent
    pub async fn answer_batch(&self, history: &[Turn], context: &str) -> Result<BatchAnswer> {
        if context.is_empty() {
            info!("No context retrieved, answering with the fallback");
            return Ok(self.fallback());
        }

        let instruction = self.instruction(context);
        let generator = &self.generator;
        let instruction = instruction.as_str();

        let text = retry_with_backoff(&self.retry, DsaCoachError::is_transient, move || {
            generator.generate(history, Some(instruction))
        })
        .await?;

        match text.filter(|t| !t.trim().is_empty()) {
            Some(answer) => {
                debug!("Generated answer of {} chars", answer.len());
                Ok(BatchAnswer {
                    answer,
                    fallback: false,
                })
            }
            None => {
                info!("Model returned an empty answer, using the fallback");
                Ok(self.fallback())
            }
        }
    }

    /// Open a streaming answer.
    ///
    /// Only opening the stream is retried; once fragments flow, an upstream
    /// failure ends the stream.
    ///
    /// # Errors
    /// - Generation errors raised before the first fragment
    pub async fn answer_stream(&self, history: &[Turn], context: &str) -> Result<StreamingResponse> {
        if context.is_empty() {
            info!("No context retrieved, streaming the fallback");
            return Ok(StreamingResponse::from_chunks(vec![GenerationChunk::new(
                Some(self.fallback_message.clone()),
            )]));
        }

        let instruction = self.instruction(context);
        let generator = &self.generator;
        let instruction = instruction.as_str();

        retry_with_backoff(&self.retry, DsaCoachError::is_transient, move || {
            generator.generate_stream(history, Some(instruction))
        })
        .await
    }
}
