//! Chat-completion message types handed to the provider.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A streaming chat-completion request, independent of provider wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Provider model identifier (e.g. `gpt-4o-mini`).
    pub model: String,
    /// Ordered messages; the provider must receive them in this order.
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}
