//! Complete chat pipeline: Rewrite -> Retrieve -> Assemble -> Generate

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::AnswerMode;
use crate::config::AppConfig;
use crate::config::ChatConfig;
use crate::embeddings::Embedder;
use crate::embeddings::GeminiEmbeddingClient;
use crate::errors::Result;
use crate::llm::GeminiClient;
use crate::llm::GenerationChunk;
use crate::llm::Generator;
use crate::llm::StreamingResponse;
use crate::models::Turn;
use crate::rag::AnswerGenerator;
use crate::rag::AssembledContext;
use crate::rag::ContextAssembler;
use crate::rag::ConversationHistory;
use crate::rag::QueryRewriter;
use crate::rag::RetryPolicy;
use crate::rag::Retriever;
use crate::vector_store::PineconeClient;
use crate::vector_store::VectorStore;

/// Single-shot chat response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub answer: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
    pub used_rag: bool,
    pub sources_count: usize,
}

/// Answer in the configured delivery mode
pub enum ChatOutcome {
    Batch(ChatReply),
    Stream(StreamingResponse),
}

/// Everything the final generation needs
struct PreparedTurn {
    turns: Vec<Turn>,
    context: AssembledContext,
}

/// Complete chat service
pub struct ChatPipeline {
    rewriter: QueryRewriter,
    retriever: Retriever,
    context_assembler: ContextAssembler,
    answer_generator: AnswerGenerator,
    mode: AnswerMode,
}

impl ChatPipeline {
    /// Build the hosted clients described by `config`
    ///
    /// # Errors
    /// - HTTP client construction errors
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let generator = Arc::new(GeminiClient::from_config(config)?);
        let embedder = Arc::new(GeminiEmbeddingClient::from_config(config)?);
        let store = Arc::new(PineconeClient::from_config(config)?);

        Ok(Self::from_services(generator, embedder, store, &config.chat))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: &ChatConfig,
    ) -> Self {
        let retry = RetryPolicy::from_config(chat);

        Self {
            rewriter: QueryRewriter::new(Arc::clone(&generator), retry),
            retriever: Retriever::new(embedder, store, chat.top_k),
            context_assembler: ContextAssembler::new(chat.max_context_chars),
            answer_generator: AnswerGenerator::new(
                generator,
                retry,
                chat.persona.clone(),
                chat.fallback_message.clone(),
            ),
            mode: chat.mode,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> AnswerMode {
        self.mode
    }

    /// Answer in the configured mode
    ///
    /// # Errors
    /// See [`Self::answer_batch`] and [`Self::answer_stream`].
    pub async fn answer(&self, question: &str, history: ConversationHistory) -> Result<ChatOutcome> {
        match self.mode {
            AnswerMode::Batch => Ok(ChatOutcome::Batch(self.answer_batch(question, history).await?)),
            AnswerMode::Stream => Ok(ChatOutcome::Stream(
                self.answer_stream(question, history).await?,
            )),
        }
    }

    /// Run the pipeline and wait for the complete answer
    ///
    /// # Errors
    /// - Rewrite or generation errors (credentials, quota, exhausted retries)
    /// - Embedding or vector store errors
    pub async fn answer_batch(&self, question: &str, history: ConversationHistory) -> Result<ChatReply> {
        let Some(prepared) = self.prepare(question, history).await? else {
            let fallback = self.answer_generator.fallback();
            return Ok(ChatReply {
                answer: fallback.answer,
                fallback: true,
                used_rag: false,
                sources_count: 0,
            });
        };

        let answer = self
            .answer_generator
            .answer_batch(&prepared.turns, &prepared.context.text)
            .await?;

        Ok(ChatReply {
            answer: answer.answer,
            fallback: answer.fallback,
            used_rag: !prepared.context.is_empty(),
            sources_count: prepared.context.sources,
        })
    }

    /// Run the pipeline and open a stream of answer fragments
    ///
    /// # Errors
    /// - Rewrite errors and errors raised before the first fragment
    /// - Embedding or vector store errors
    pub async fn answer_stream(
        &self,
        question: &str,
        history: ConversationHistory,
    ) -> Result<StreamingResponse> {
        let Some(prepared) = self.prepare(question, history).await? else {
            return Ok(StreamingResponse::from_chunks(vec![GenerationChunk::new(
                Some(self.answer_generator.fallback_message().to_string()),
            )]));
        };

        self.answer_generator
            .answer_stream(&prepared.turns, &prepared.context.text)
            .await
    }

    /// Rewrite, retrieve and assemble; `None` when there is nothing to answer
    async fn prepare(
        &self,
        question: &str,
        history: ConversationHistory,
    ) -> Result<Option<PreparedTurn>> {
        let Some(live_question) = history.live_question(question) else {
            info!("Empty question with no user turn in history");
            return Ok(None);
        };
        info!("Processing chat question: {}", live_question);

        // Step 1: Standalone query
        debug!("Step 1: Rewriting question with {} history turns", history.len());
        let standalone = self
            .rewriter
            .rewrite(&history.user_texts(), &live_question)
            .await?;

        // Step 2: Retrieve passages
        debug!("Step 2: Retrieving passages");
        let passages = self.retriever.retrieve(&standalone).await?;

        // Step 3: Assemble context
        debug!("Step 3: Assembling context");
        let context = self.context_assembler.assemble(&passages);
        debug!(
            "Context of {} chars from {} passages",
            context.text.len(),
            context.sources
        );

        Ok(Some(PreparedTurn {
            turns: history.with_live_question(standalone),
            context,
        }))
    }
}
