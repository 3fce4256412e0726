//! Client-supplied chat history, filtered down to canonical turns
//!
//! Clients send whatever their UI keeps around. Entries without a known role
//! or without text are dropped here instead of failing the request.

use serde::Deserialize;
use serde::Deserializer;
use serde_json::Value;

use crate::models::Role;
use crate::models::Turn;

/// One history entry exactly as the client sent it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTurn {
    /// Object carrying a role and either `parts[0].text` or a flat `text`
    Structured {
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        parts: Option<Vec<Value>>,
        #[serde(default)]
        text: Option<String>,
    },
    /// Anything else; always dropped
    Other(Value),
}

impl RawTurn {
    /// Project into a [`Turn`], or `None` when the entry is unusable
    #[must_use]
    pub fn into_turn(self) -> Option<Turn> {
        let Self::Structured { role, parts, text } = self else {
            return None;
        };

        let role = Role::parse(role.as_deref()?)?;
        let text = match parts {
            Some(parts) => first_part_text(&parts)?,
            None => text?,
        };

        if text.trim().is_empty() {
            return None;
        }

        Some(Turn { role, text })
    }
}

fn first_part_text(parts: &[Value]) -> Option<String> {
    parts
        .first()?
        .get("text")?
        .as_str()
        .map(ToString::to_string)
}

/// Accept any JSON for the history field; a non-array becomes empty
///
/// # Errors
/// Only when the input is not valid JSON at all.
pub fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<RawTurn>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(entries)) = value else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .map(|entry| RawTurn::deserialize(entry.clone()).unwrap_or(RawTurn::Other(entry)))
        .collect())
}

/// Accept any JSON for the question field.
///
/// Strings are kept, numbers and booleans use their JSON rendering, and
/// anything else becomes empty so the trailing user turn can stand in.
///
/// # Errors
/// Only when the input is not valid JSON at all.
pub fn deserialize_question<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(question)) => question,
        Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
        _ => String::new(),
    })
}

/// Keep only usable entries, in their original order
#[must_use]
pub fn normalize(raw: Vec<RawTurn>) -> Vec<Turn> {
    raw.into_iter().filter_map(RawTurn::into_turn).collect()
}

/// Canonical history of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    #[must_use]
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    #[must_use]
    pub fn from_raw(raw: Vec<RawTurn>) -> Self {
        Self::new(normalize(raw))
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Text of every user turn, oldest first
    #[must_use]
    pub fn user_texts(&self) -> Vec<String> {
        self.turns
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.text.clone())
            .collect()
    }

    fn trailing_user(&self) -> Option<&Turn> {
        self.turns.last().filter(|t| t.role == Role::User)
    }

    /// The question to answer: `question` when it has content, otherwise
    /// the text of a trailing user turn.
    #[must_use]
    pub fn live_question(&self, question: &str) -> Option<String> {
        if !question.trim().is_empty() {
            return Some(question.to_string());
        }
        self.trailing_user().map(|t| t.text.clone())
    }

    /// Replace a trailing user turn (if any) with `question` as the last turn
    #[must_use]
    pub fn with_live_question(mut self, question: impl Into<String>) -> Vec<Turn> {
        if self.trailing_user().is_some() {
            self.turns.pop();
        }
        self.turns.push(Turn::user(question));
        self.turns
    }
}
