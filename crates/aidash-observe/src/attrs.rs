//! Span attribute names for generation requests.
//!
//! The `gen_ai.*` names follow the OpenTelemetry GenAI semantic conventions;
//! the `aidash.*` names cover the dashboard's own concepts. All constants are
//! string slices usable in `tracing::info_span!` field names.
//!
//! Span naming convention: `"gen_ai.{operation}"` (e.g., `"gen_ai.chat"`)

// --- GenAI attributes ---

/// The name of the operation being performed (e.g., "chat", "upload").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The model ID requested (e.g., "deepseek-r1:7b").
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The model that actually answered, as reported in the stream.
pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";

// --- aidash attributes ---

/// Project id the request belongs to.
pub const AIDASH_PROJECT_ID: &str = "aidash.project.id";

/// Number of body chunks read.
pub const AIDASH_STREAM_CHUNKS: &str = "aidash.stream.chunks";

/// Number of unparsable fragments skipped.
pub const AIDASH_STREAM_DROPPED: &str = "aidash.stream.dropped_fragments";

/// How the stream ended ("marker" or "end_of_stream").
pub const AIDASH_STREAM_COMPLETION: &str = "aidash.stream.completion";

// --- Operation name values ---

/// Streamed chat request.
pub const OP_CHAT: &str = "chat";

/// Document upload.
pub const OP_UPLOAD: &str = "upload";
