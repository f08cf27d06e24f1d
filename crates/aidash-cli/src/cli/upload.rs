//! `aidash upload`: send a document to a project's upload endpoint.

use std::path::Path;

use anyhow::Result;
use console::style;
use tracing::Instrument;

use aidash_core::upload::UploadReceipt;
use aidash_observe::attrs;
use aidash_types::error::{ChatError, UploadError};
use aidash_types::project::ProjectProfile;

use crate::state::AppState;

use super::spinner;

/// Upload `path` for `project_id` inside a `gen_ai.upload` span.
pub async fn upload_document(
    state: &AppState,
    project_id: &str,
    path: &Path,
) -> Result<UploadReceipt, ChatError> {
    let span = tracing::info_span!(
        "gen_ai.upload",
        gen_ai.operation.name = attrs::OP_UPLOAD,
        aidash.project.id = %project_id,
    );
    state
        .chat_service
        .upload(project_id, path)
        .instrument(span)
        .await
}

pub async fn upload_file(
    state: &AppState,
    project: &ProjectProfile,
    file: &Path,
    json: bool,
) -> Result<()> {
    if !project.file_upload_enabled {
        anyhow::bail!("{} does not accept uploads", project.name);
    }

    let progress = if json {
        None
    } else {
        Some(spinner(format!("Uploading {}...", file.display()))?)
    };
    let result = upload_document(state, &project.id, file).await;
    if let Some(progress) = &progress {
        progress.finish_and_clear();
    }

    let receipt = match result {
        Ok(receipt) => receipt,
        Err(ChatError::Upload(e @ UploadError::Io(_))) => return Err(e.into()),
        Err(e) => {
            tracing::debug!(error = %e, "upload command failed");
            anyhow::bail!("Upload failed. Please try again.");
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    println!(
        "  {} Uploaded {} to {} ({} bytes)",
        style("✓").green().bold(),
        style(&receipt.attachment.name).cyan(),
        project.name,
        receipt.attachment.size_bytes
    );
    if let Some(message) = receipt.response.get("message").and_then(|m| m.as_str()) {
        println!("  {}", style(message).dim());
    }

    Ok(())
}
