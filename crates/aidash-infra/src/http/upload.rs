//! reqwest implementation of [`FileUploader`].
//!
//! Sends the file as a multipart form with a single `file` field and expects
//! a JSON reply.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use aidash_core::upload::FileUploader;
use aidash_types::error::UploadError;

/// Uploads documents over HTTP.
#[derive(Clone)]
pub struct HttpFileUploader {
    client: reqwest::Client,
}

impl HttpFileUploader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl FileUploader for HttpFileUploader {
    async fn upload(&self, url: &str, path: &Path) -> Result<serde_json::Value, UploadError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| UploadError::Io(format!("{}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, url = %url, "upload endpoint error response");
            return Err(UploadError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))
    }
}
