//! HistoryRepository trait definition.
//!
//! Persists the full message list of each project chat. Follows the same
//! RPITIT pattern as the other ports in this crate.

use aidash_types::chat::ChatMessage;
use aidash_types::error::RepositoryError;

/// Repository trait for per-project chat history.
///
/// Implementations live in aidash-infra (e.g., `SqliteHistoryRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait HistoryRepository: Send + Sync {
    /// Load the stored messages for a project. Unknown projects have an
    /// empty history.
    fn load(
        &self,
        project_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Replace the stored messages for a project.
    fn save(
        &self,
        project_id: &str,
        messages: &[ChatMessage],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove a project's history. No-op if nothing is stored.
    fn clear(
        &self,
        project_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
