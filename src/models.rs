//! Request-scoped data shared by the chat pipeline stages

use serde::Deserialize;
use serde::Serialize;

/// Speaker of a conversation turn, in the generation API's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Parse a client-supplied role name; `assistant` and `bot` alias `model`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "model" | "assistant" | "bot" => Some(Self::Model),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One exchange unit of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Passage returned by the similarity search, in store ranking order
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPassage {
    pub text: String,
    pub score: f32,
}
