//! In-memory conversation storage for the chat sidebar
//!
//! Conversations belong to the email of the caller that created them and
//! live for the life of the process.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use chrono::DateTime;
use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::DsaCoachError;
use crate::errors::Result;

/// Author of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "bot" => Some(Self::Bot),
            _ => None,
        }
    }
}

/// Conversation summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    #[serde(skip)]
    pub owner: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    seq: u64,
}

/// Stored chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Conversation store with per-owner access
#[derive(Default)]
pub struct ConversationStore {
    conversations: DashMap<Uuid, Conversation>,
    messages: DashMap<Uuid, Vec<ChatMessage>>,
    next_seq: AtomicU64,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new conversation; titles need not be unique
    pub fn create_conversation(&self, owner: &str, title: &str) -> Conversation {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };

        self.conversations
            .insert(conversation.id, conversation.clone());
        self.messages.insert(conversation.id, Vec::new());
        info!("Created conversation {} for {}", conversation.id, owner);
        conversation
    }

    /// The conversation if it exists and belongs to `owner`
    #[must_use]
    pub fn get_owned(&self, owner: &str, id: Uuid) -> Option<Conversation> {
        self.conversations
            .get(&id)
            .filter(|c| c.owner == owner)
            .map(|c| c.clone())
    }

    /// Conversations of `owner`, newest first
    #[must_use]
    pub fn list_conversations(&self, owner: &str) -> Vec<Conversation> {
        let mut owned: Vec<Conversation> = self
            .conversations
            .iter()
            .filter(|entry| entry.value().owner == owner)
            .map(|entry| entry.value().clone())
            .collect();

        owned.sort_by(|a, b| b.seq.cmp(&a.seq));
        owned
    }

    /// Append a message to an existing conversation
    ///
    /// # Errors
    /// - `ConversationNotFound` when the conversation does not exist
    pub fn append_message(
        &self,
        conversation_id: Uuid,
        sender: Sender,
        text: &str,
    ) -> Result<ChatMessage> {
        let mut messages = self
            .messages
            .get_mut(&conversation_id)
            .ok_or_else(|| DsaCoachError::ConversationNotFound(conversation_id.to_string()))?;

        let message = ChatMessage {
            id: Uuid::new_v4(),
            conversation_id,
            sender,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        messages.push(message.clone());
        Ok(message)
    }

    /// Messages of a conversation, oldest first
    #[must_use]
    pub fn messages(&self, conversation_id: Uuid) -> Vec<ChatMessage> {
        self.messages
            .get(&conversation_id)
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Remove a conversation of `owner` and all its messages
    pub fn delete_conversation(&self, owner: &str, id: Uuid) -> bool {
        if self
            .conversations
            .remove_if(&id, |_, c| c.owner == owner)
            .is_none()
        {
            return false;
        }

        self.messages.remove(&id);
        info!("Deleted conversation {}", id);
        true
    }

    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}
