//! FileUploader trait definition.
//!
//! Sends a local file to a project's document endpoint. The multipart HTTP
//! implementation lives in aidash-infra.

use std::path::Path;

use serde::Serialize;

use aidash_types::chat::Attachment;
use aidash_types::error::UploadError;

/// Uploads documents to a backend.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait FileUploader: Send + Sync {
    /// Upload the file at `path` to `url`, returning the server's JSON reply.
    fn upload(
        &self,
        url: &str,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, UploadError>> + Send;
}

/// A finished upload: the attachment to reference from the next message
/// plus whatever the server replied.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub attachment: Attachment,
    pub response: serde_json::Value,
}
