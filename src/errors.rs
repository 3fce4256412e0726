use thiserror::Error;

/// HTTP status the generation service uses when it is temporarily overloaded
pub const STATUS_SERVICE_UNAVAILABLE: u16 = 503;
/// HTTP status for rejected credentials or a misconfigured project
pub const STATUS_FORBIDDEN: u16 = 403;
/// HTTP status for an exhausted quota
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Error, Debug)]
pub enum DsaCoachError {
    /// Non-success response from a hosted service
    #[error("{service} API error ({status}): {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Vector store error: {0}")]
    VectorStoreError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Max retries reached without success")]
    RetryExhausted,

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failure is reported at the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Overloaded upstream, eligible for backoff
    TransientUpstream,
    /// Credentials or project setup are wrong
    Configuration,
    /// Upstream quota exhausted
    QuotaExceeded,
    /// Everything else
    RequestFailed,
}

impl DsaCoachError {
    /// Status code reported by the upstream service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the upstream signalled a temporary overload
    pub fn is_transient(&self) -> bool {
        self.status() == Some(STATUS_SERVICE_UNAVAILABLE)
    }

    /// Classify by status code first, then by message content
    pub fn kind(&self) -> ErrorKind {
        match self.status() {
            Some(STATUS_SERVICE_UNAVAILABLE) => return ErrorKind::TransientUpstream,
            Some(STATUS_FORBIDDEN) => return ErrorKind::Configuration,
            Some(STATUS_TOO_MANY_REQUESTS) => return ErrorKind::QuotaExceeded,
            _ => {}
        }

        if matches!(self, Self::ConfigError(_)) {
            return ErrorKind::Configuration;
        }

        let message = self.to_string().to_lowercase();
        if message.contains("api key") || message.contains("credential") {
            ErrorKind::Configuration
        } else if message.contains("quota") || message.contains("resource_exhausted") {
            ErrorKind::QuotaExceeded
        } else {
            ErrorKind::RequestFailed
        }
    }
}

pub type Result<T> = std::result::Result<T, DsaCoachError>;
