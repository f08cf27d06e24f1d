use thiserror::Error;

use crate::stream::StreamError;

/// Errors from repository operations (used by trait definitions in aidash-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from the document upload flow.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file upload is disabled for project '{0}'")]
    Disabled(String),

    #[error("could not read file: {0}")]
    Io(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("upload failed with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid upload response: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced by the chat service.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("unknown project '{0}'")]
    UnknownProject(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("a request is already in flight for project '{0}'")]
    Busy(String),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
