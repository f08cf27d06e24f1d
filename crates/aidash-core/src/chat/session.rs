//! In-memory state of one project chat.
//!
//! Holds the ordered message list and routes stream updates to the right
//! entry: the first update after a user message appends an assistant
//! message, later updates overwrite that entry in place.

use aidash_types::chat::{Attachment, ChatMessage, MessageRole};

/// Message list for one project.
#[derive(Debug, Clone)]
pub struct ChatSession {
    project_id: String,
    messages: Vec<ChatMessage>,
    /// True while a stream is writing the last message.
    streaming: bool,
}

impl ChatSession {
    /// Create a session seeded with previously stored messages.
    pub fn new(project_id: impl Into<String>, history: Vec<ChatMessage>) -> Self {
        Self {
            project_id: project_id.into(),
            messages: history,
            streaming: false,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a user message and return it.
    pub fn push_user_message(
        &mut self,
        content: impl Into<String>,
        files: Vec<Attachment>,
    ) -> &ChatMessage {
        self.streaming = false;
        self.messages.push(ChatMessage::user(content, files));
        &self.messages[self.messages.len() - 1]
    }

    /// Apply one partial message from the stream reader.
    ///
    /// Appends a new assistant entry when the last entry is the user's
    /// message (or a finished reply); otherwise overwrites the content,
    /// timestamp, done flag and model of the last entry.
    pub fn apply_stream_update(&mut self, update: &ChatMessage) {
        self.streaming = true;
        match self.messages.last_mut() {
            Some(last) if last.role == MessageRole::Assistant && !last.is_done() => {
                last.content.clone_from(&update.content);
                last.created_at = update.created_at;
                last.done = update.done;
                if update.model.is_some() {
                    last.model.clone_from(&update.model);
                }
            }
            _ => self.messages.push(ChatMessage {
                role: MessageRole::Assistant,
                files: Vec::new(),
                ..update.clone()
            }),
        }
    }

    /// End the current stream.
    ///
    /// A completed stream marks the reply done. A failed one leaves the
    /// partial reply in place with `done: Some(false)`.
    pub fn finish_stream(&mut self, completed: bool) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        if let Some(last) = self.messages.last_mut() {
            if last.role == MessageRole::Assistant {
                last.done = Some(completed || last.is_done());
            }
        }
    }

    /// The assistant message currently being streamed, if any.
    pub fn in_progress(&self) -> Option<&ChatMessage> {
        if !self.streaming {
            return None;
        }
        self.messages
            .last()
            .filter(|m| m.role == MessageRole::Assistant && !m.is_done())
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.streaming = false;
    }

    /// The most recent `limit` messages, oldest first.
    pub fn tail(&self, limit: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }
}
