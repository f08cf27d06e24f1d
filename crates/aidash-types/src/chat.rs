//! Chat message and attachment types for aidash.
//!
//! A chat is an ordered list of [`ChatMessage`]s for one project. User
//! messages are complete when created; assistant messages grow while a
//! response streams in and become immutable once `done` is true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A file reference attached to a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name as shown to the user.
    pub name: String,
    /// Size in bytes at the time it was attached.
    pub size_bytes: u64,
}

/// A single message in a project chat.
///
/// Timestamps serialize as RFC 3339 strings, so history round-trips through
/// storage without losing precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<Attachment>,
    /// `Some(true)` once the message is fully materialized. User messages
    /// carry `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    /// Model that produced the message (assistant messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatMessage {
    /// Build a user message stamped with the current time.
    pub fn user(content: impl Into<String>, files: Vec<Attachment>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
            files,
            done: None,
            model: None,
        }
    }

    /// Whether this message can no longer change.
    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_rejects_system() {
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_user_message_defaults() {
        let msg = ChatMessage::user("hello", Vec::new());
        assert_eq!(msg.role, MessageRole::User);
        assert!(msg.done.is_none());
        assert!(!msg.is_done());
        assert!(msg.files.is_empty());
    }

    #[test]
    fn test_chat_message_timestamp_roundtrip() {
        let msg = ChatMessage {
            role: MessageRole::Assistant,
            content: "Hi".to_string(),
            created_at: Utc::now(),
            files: Vec::new(),
            done: Some(true),
            model: Some("deepseek-r1:7b".to_string()),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        let parsed: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_chat_message_missing_optional_fields() {
        let json = r#"{"role":"user","content":"hey","created_at":"2025-05-01T10:00:00Z"}"#;
        let parsed: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(parsed.files.is_empty());
        assert!(parsed.done.is_none());
        assert!(parsed.model.is_none());
    }
}
