use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::local::Namespace;
use crate::sync::SyncHandle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Cooking-assistant conversation. Kept on the device only.
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
    limit: usize,
    sync: Option<SyncHandle>,
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new(100, None)
    }
}

impl ChatHistory {
    pub fn new(limit: usize, sync: Option<SyncHandle>) -> Self {
        Self {
            messages: Vec::new(),
            limit: limit.max(1),
            sync,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Last `n` messages, oldest first, for prompt context.
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) -> ChatMessage {
        let message = ChatMessage {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.messages.push(message.clone());
        if self.messages.len() > self.limit {
            let excess = self.messages.len() - self.limit;
            self.messages.drain(..excess);
        }
        self.persist();
        message
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.persist();
    }

    pub fn restore(&mut self, mut messages: Vec<ChatMessage>) {
        if messages.len() > self.limit {
            messages.drain(..messages.len() - self.limit);
        }
        self.messages = messages;
    }

    fn persist(&self) {
        if let Some(sync) = &self.sync {
            sync.save_local(Namespace::Chat, &self.messages);
        }
    }
}
