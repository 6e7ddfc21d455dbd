//! Conversation store port
//!
//! Defines the persistence interface for conversations and council turns.

use async_trait::async_trait;
use council_domain::{CouncilTurn, RankingVerdict, StageOneResponse, SynthesisResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One persisted message in a conversation.
///
/// A user message holds only its text; an assistant message holds the full
/// three-stage record of the council turn that answered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum StoredMessage {
    User {
        content: String,
    },
    Assistant {
        stage1: Vec<StageOneResponse>,
        stage2: Vec<RankingVerdict>,
        stage3: SynthesisResult,
    },
}

/// A full conversation as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    pub title: String,
    pub messages: Vec<StoredMessage>,
}

impl Conversation {
    /// Title given to conversations before title generation runs
    pub const DEFAULT_TITLE: &'static str = "New Conversation";
}

/// Listing entry carrying conversation metadata only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMeta {
    pub id: String,
    pub created_at: String,
    pub title: String,
    pub message_count: usize,
}

/// Persistence port for conversations.
///
/// Conversations are scoped per owner; per-conversation mutation is
/// serialized by the implementation, not by the pipeline.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a new empty conversation with the given id
    async fn create(&self, owner: &str, conversation_id: &str)
    -> Result<Conversation, StoreError>;

    /// Load a conversation; [`StoreError::NotFound`] if it does not exist
    async fn get(&self, owner: &str, conversation_id: &str) -> Result<Conversation, StoreError>;

    /// List conversation metadata for an owner, newest first
    async fn list(&self, owner: &str) -> Result<Vec<ConversationMeta>, StoreError>;

    /// Append a user message to an existing conversation
    async fn add_user_message(
        &self,
        owner: &str,
        conversation_id: &str,
        content: &str,
    ) -> Result<(), StoreError>;

    /// Append the assistant record of a completed (or interrupted) turn
    async fn append_turn(
        &self,
        owner: &str,
        conversation_id: &str,
        turn: &CouncilTurn,
    ) -> Result<(), StoreError>;

    /// Replace the conversation title
    async fn update_title(
        &self,
        owner: &str,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), StoreError>;

    /// Delete a conversation, returning whether it existed
    async fn delete(&self, owner: &str, conversation_id: &str) -> Result<bool, StoreError>;
}
