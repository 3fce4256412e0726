use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::DsaCoachError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub backtrace: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            backtrace: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub enable_cors: bool,
    /// Upper bound on in-flight requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_concurrent_requests() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: false,
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_gemini_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// HTTP timeout for a single generation call, in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: default_gemini_endpoint(),
            llm_key: String::new(),
            llm_model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Expected vector length; 0 disables the check
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
    /// Defaults to `llm.llm_endpoint` when unset
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_embedding_dimension() -> usize {
    768
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub index_name: String,
    /// Data-plane host; resolved through the control plane when unset
    #[serde(default)]
    pub index_host: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_control_plane")]
    pub control_plane_endpoint: String,
}

fn default_control_plane() -> String {
    "https://api.pinecone.io".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_name: String::new(),
            index_host: None,
            namespace: None,
            control_plane_endpoint: default_control_plane(),
        }
    }
}

/// How the final answer is delivered to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    #[default]
    Stream,
    Batch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub mode: AnswerMode,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    #[serde(default = "default_persona")]
    pub persona: String,
}

fn default_top_k() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_context_chars() -> usize {
    30_000
}

pub(crate) fn default_fallback_message() -> String {
    "I could not find the answer in the provided document. Are you sure this is related to DSA?"
        .to_string()
}

fn default_persona() -> String {
    "a Data Structures & Algorithms expert".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            mode: AnswerMode::default(),
            top_k: default_top_k(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_context_chars: default_max_context_chars(),
            fallback_message: default_fallback_message(),
            persona: default_persona(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_batch_size() -> usize {
    50
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(DsaCoachError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Secrets usually live in the environment rather than the file
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.llm.llm_key = key;
        }
        if let Some(key) = lookup("PINECONE_API_KEY") {
            self.vector_store.api_key = key;
        }
        if let Some(name) = lookup("PINECONE_INDEX_NAME") {
            self.vector_store.index_name = name;
        }
        if let Some(host) = lookup("PINECONE_INDEX_HOST") {
            self.vector_store.index_host = Some(host);
        }
    }

    /// Check settings the pipeline cannot run without
    pub fn validate(&self) -> crate::Result<()> {
        if self.llm.llm_key.trim().is_empty() {
            return Err(DsaCoachError::ConfigError(
                "llm.llm_key is empty (set GEMINI_API_KEY)".to_string(),
            ));
        }
        if self.vector_store.api_key.trim().is_empty() {
            return Err(DsaCoachError::ConfigError(
                "vector_store.api_key is empty (set PINECONE_API_KEY)".to_string(),
            ));
        }
        if self.vector_store.index_name.trim().is_empty()
            && self.vector_store.index_host.is_none()
        {
            return Err(DsaCoachError::ConfigError(
                "vector_store.index_name or vector_store.index_host is required".to_string(),
            ));
        }
        for endpoint in [
            Some(self.llm.llm_endpoint.as_str()),
            self.embeddings.endpoint.as_deref(),
            Some(self.vector_store.control_plane_endpoint.as_str()),
        ]
        .into_iter()
        .flatten()
        {
            url::Url::parse(endpoint).map_err(|e| {
                DsaCoachError::ConfigError(format!("Invalid endpoint URL '{endpoint}': {e}"))
            })?;
        }
        if self.chat.top_k == 0 {
            return Err(DsaCoachError::ConfigError(
                "chat.top_k must be greater than zero".to_string(),
            ));
        }
        if self.ingest.chunk_size == 0 || self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(DsaCoachError::ConfigError(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        Ok(())
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM key
    pub fn llm_key(&self) -> &str {
        &self.llm.llm_key
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Embedding endpoint, sharing the generation endpoint by default
    pub fn embedding_endpoint(&self) -> &str {
        self.embeddings
            .endpoint
            .as_deref()
            .unwrap_or(&self.llm.llm_endpoint)
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// A copy safe to print: API keys are masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.llm.llm_key = mask_secret(&copy.llm.llm_key);
        copy.vector_store.api_key = mask_secret(&copy.vector_store.api_key);
        copy
    }
}

fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len == 0 {
        String::new()
    } else if len <= 4 {
        "****".to_string()
    } else {
        let tail: String = secret.chars().skip(len - 4).collect();
        format!("****{tail}")
    }
}
