//! Streaming generation request/response types for aidash.
//!
//! These types model the wire shapes exchanged with a generation endpoint
//! (request payloads and the JSON objects carried by each response chunk) and
//! the lifecycle of one streamed response.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;

/// JSON body posted to a generation endpoint.
///
/// Serialized untagged: `{"prompt": ..., "model": ...}` for plain generation
/// endpoints, `{"query": ...}` for retrieval-style endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestPayload {
    Generate { prompt: String, model: String },
    Query { query: String },
}

impl RequestPayload {
    /// The model named in the payload, if the payload carries one.
    pub fn model(&self) -> Option<&str> {
        match self {
            RequestPayload::Generate { model, .. } => Some(model),
            RequestPayload::Query { .. } => None,
        }
    }
}

/// A fully resolved request: target URL plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub url: String,
    pub payload: RequestPayload,
}

/// One JSON object carried by a response chunk.
///
/// Every field is optional on the wire. The retrieval backend reports server
/// failures as `{"error": "...", "done": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lifecycle phase of a single streamed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Done,
    Failed,
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamPhase::Idle => write!(f, "idle"),
            StreamPhase::Connecting => write!(f, "connecting"),
            StreamPhase::Streaming => write!(f, "streaming"),
            StreamPhase::Done => write!(f, "done"),
            StreamPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of a reader's observable state.
///
/// `time_to_first_byte` is true only between sending the request and
/// receiving the first chunk. `streaming` stays true for the whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamStatus {
    pub phase: StreamPhase,
    pub time_to_first_byte: bool,
    pub streaming: bool,
    pub dropped_fragments: u64,
}

/// What to do with JSON text left unparsed at the end of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentPolicy {
    /// Discard it (an object split across two network chunks is lost).
    #[default]
    Drop,
    /// Keep it and prepend it to the next chunk's text.
    Reassemble,
}

impl fmt::Display for FragmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentPolicy::Drop => write!(f, "drop"),
            FragmentPolicy::Reassemble => write!(f, "reassemble"),
        }
    }
}

impl FromStr for FragmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(FragmentPolicy::Drop),
            "reassemble" => Ok(FragmentPolicy::Reassemble),
            other => Err(format!("invalid fragment policy: '{other}'")),
        }
    }
}

/// How a successful stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// A chunk carried `done: true`.
    Marker,
    /// The body closed without a done marker.
    EndOfStream,
}

/// Result of reading one stream to completion.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    /// Latest accumulated message, `None` if no chunk ever parsed.
    pub message: Option<ChatMessage>,
    pub completion: Completion,
    pub chunks_read: u64,
    pub dropped_fragments: u64,
    /// Error text reported in-band by the server.
    pub server_error: Option<String>,
}

/// Errors that fail a streamed request.
///
/// Unparsable chunk text is not an error: it is skipped and counted.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("no data received for {0:?}")]
    Timeout(Duration),

    #[error("stream cancelled")]
    Cancelled,
}
