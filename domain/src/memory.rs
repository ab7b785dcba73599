//! Conversation memory: the single ordered message sequence of a session.
//!
//! The chat display reads `messages()` directly; `render()` projects the same
//! sequence into the transcript fragment injected into the next prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Reply,
    /// A backend failure shown to the user. Never resent to the model.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub ordinal: usize,
    pub kind: MessageKind,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

/// How much history `render()` sends back to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    #[default]
    Unbounded,
    /// Only the most recent `n` turns, counted by user messages.
    LastTurns(usize),
}

#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    messages: Vec<Message>,
    retention: RetentionPolicy,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: RetentionPolicy) -> Self {
        Self {
            messages: Vec::new(),
            retention,
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) -> &Message {
        self.push(role, content.into(), MessageKind::Reply)
    }

    pub fn append_error(&mut self, content: impl Into<String>) -> &Message {
        self.push(Role::Assistant, content.into(), MessageKind::Error)
    }

    fn push(&mut self, role: Role, content: String, kind: MessageKind) -> &Message {
        let ordinal = self.messages.len();
        self.messages.push(Message {
            role,
            content,
            ordinal,
            kind,
            created_at: Utc::now(),
        });
        &self.messages[ordinal]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn turns(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// `role: content` lines in insertion order, empty string when nothing is retained.
    pub fn render(&self) -> String {
        let replies: Vec<&Message> = self.messages.iter().filter(|m| !m.is_error()).collect();

        let start = match self.retention {
            RetentionPolicy::Unbounded => 0,
            RetentionPolicy::LastTurns(0) => replies.len(),
            RetentionPolicy::LastTurns(n) => replies
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, m)| m.role == Role::User)
                .nth(n - 1)
                .map_or(0, |(idx, _)| idx),
        };

        replies[start..]
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
