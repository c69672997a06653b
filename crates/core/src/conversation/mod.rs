//! Follow-up conversations about a medical history entry.
//!
//! A conversation snapshots the entry's analysis report when it starts, so later history
//! changes do not alter what the model was told.

mod chat;
mod service;
mod store;

pub use chat::{build_prompt, ChatError, ChatModel, GeminiChatModel};
pub use service::{ConversationService, StartedConversation};
pub use store::{ConversationStore, FsConversationStore, MemoryConversationStore};

use chrono::{DateTime, Utc};
use cutis_uuid::ShardableUuid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ShardableUuid,
    pub user_id: ShardableUuid,
    pub history_id: ShardableUuid,
    pub analysis: Value,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}
