//! In-memory stand-ins for the hosted services
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use dsacoach::config::AnswerMode;
use dsacoach::config::ChatConfig;
use dsacoach::embeddings::Embedder;
use dsacoach::llm::GenerationChunk;
use dsacoach::llm::Generator;
use dsacoach::llm::StreamingResponse;
use dsacoach::models::Turn;
use dsacoach::rag::prompts::QUERY_REWRITE_INSTRUCTION;
use dsacoach::rag::ChatPipeline;
use dsacoach::vector_store::VectorMatch;
use dsacoach::vector_store::VectorRecord;
use dsacoach::vector_store::VectorStore;
use dsacoach::DsaCoachError;
use dsacoach::Result;
use serde_json::json;
use serde_json::Value;

pub const FALLBACK: &str =
    "I could not find the answer in the provided document. Are you sure this is related to DSA?";

pub fn upstream(status: u16, message: &str) -> DsaCoachError {
    DsaCoachError::Upstream {
        service: "gemini",
        status,
        message: message.to_string(),
    }
}

/// One recorded generation call
#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub contents: Vec<Turn>,
    pub system_instruction: Option<String>,
    pub streaming: bool,
}

impl GenerateCall {
    pub fn is_rewrite(&self) -> bool {
        self.system_instruction.as_deref() == Some(QUERY_REWRITE_INSTRUCTION)
    }
}

/// Scripted generator.
///
/// Rewrite calls pop from `rewrites` (an empty queue means "no text").
/// Answer calls pop from `answers`; once that is empty the model answers
/// with the context found in its system instruction.
#[derive(Default)]
pub struct FakeGenerator {
    rewrites: Mutex<VecDeque<Result<Option<String>>>>,
    answers: Mutex<VecDeque<Result<Option<String>>>>,
    stream_opens: Mutex<VecDeque<DsaCoachError>>,
    stream_chunks: Vec<Option<String>>,
    calls: Mutex<Vec<GenerateCall>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rewrite(self, result: Result<Option<String>>) -> Self {
        self.rewrites.lock().unwrap().push_back(result);
        self
    }

    pub fn with_answer(self, result: Result<Option<String>>) -> Self {
        self.answers.lock().unwrap().push_back(result);
        self
    }

    pub fn with_stream_open_error(self, error: DsaCoachError) -> Self {
        self.stream_opens.lock().unwrap().push_back(error);
        self
    }

    pub fn with_stream_chunks(mut self, chunks: &[Option<&str>]) -> Self {
        self.stream_chunks = chunks.iter().map(|c| c.map(ToString::to_string)).collect();
        self
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn answer_calls(&self) -> Vec<GenerateCall> {
        self.calls().into_iter().filter(|c| !c.is_rewrite()).collect()
    }

    fn record(&self, contents: &[Turn], system_instruction: Option<&str>, streaming: bool) {
        self.calls.lock().unwrap().push(GenerateCall {
            contents: contents.to_vec(),
            system_instruction: system_instruction.map(ToString::to_string),
            streaming,
        });
    }
}

fn context_of(instruction: Option<&str>) -> Option<String> {
    instruction
        .and_then(|i| i.rsplit_once("Context:\n"))
        .map(|(_, context)| context.to_string())
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(
        &self,
        contents: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<Option<String>> {
        self.record(contents, system_instruction, false);

        if system_instruction == Some(QUERY_REWRITE_INSTRUCTION) {
            return self.rewrites.lock().unwrap().pop_front().unwrap_or(Ok(None));
        }

        let scripted = self.answers.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(context_of(system_instruction)))
    }

    async fn generate_stream(
        &self,
        contents: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<StreamingResponse> {
        self.record(contents, system_instruction, true);

        if let Some(error) = self.stream_opens.lock().unwrap().pop_front() {
            return Err(error);
        }

        Ok(StreamingResponse::from_chunks(
            self.stream_chunks
                .iter()
                .cloned()
                .map(GenerationChunk::new)
                .collect(),
        ))
    }
}

/// Embedder that records the queries it was asked to embed
#[derive(Default)]
pub struct FakeEmbedder {
    queries: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.queries.lock().unwrap().push(text.to_string());
        Ok(vec![0.1, 0.2, 0.3])
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
    }
}

/// Vector store returning a fixed result list
#[derive(Default)]
pub struct FakeStore {
    matches: Vec<VectorMatch>,
    top_k: Mutex<Option<usize>>,
}

impl FakeStore {
    pub fn with_texts(texts: &[&str]) -> Self {
        Self::with_metadata(texts.iter().map(|t| json!({ "text": t })).collect())
    }

    pub fn with_metadata(metadata: Vec<Value>) -> Self {
        let count = metadata.len();
        let matches = metadata
            .into_iter()
            .enumerate()
            .map(|(i, m)| VectorMatch {
                id: format!("chunk-{i}"),
                score: 1.0 - i as f32 / (count as f32 + 1.0),
                metadata: m.as_object().cloned(),
            })
            .collect();

        Self {
            matches,
            top_k: Mutex::new(None),
        }
    }

    pub fn requested_top_k(&self) -> Option<usize> {
        *self.top_k.lock().unwrap()
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        _include_metadata: bool,
    ) -> Result<Vec<VectorMatch>> {
        *self.top_k.lock().unwrap() = Some(top_k);
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        Ok(records.len())
    }
}

/// Services wired into a pipeline, kept around for inspection
pub struct Harness {
    pub generator: Arc<FakeGenerator>,
    pub embedder: Arc<FakeEmbedder>,
    pub store: Arc<FakeStore>,
    pub pipeline: ChatPipeline,
}

pub fn chat_config(mode: AnswerMode) -> ChatConfig {
    ChatConfig {
        mode,
        ..ChatConfig::default()
    }
}

pub fn harness(generator: FakeGenerator, store: FakeStore, mode: AnswerMode) -> Harness {
    let generator = Arc::new(generator);
    let embedder = Arc::new(FakeEmbedder::default());
    let store = Arc::new(store);
    let pipeline = ChatPipeline::from_services(
        generator.clone(),
        embedder.clone(),
        store.clone(),
        &chat_config(mode),
    );

    Harness {
        generator,
        embedder,
        store,
        pipeline,
    }
}
