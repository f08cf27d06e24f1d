//! Application state wiring all services together.
//!
//! `ChatService` is generic over its history store, stream transport and
//! uploader; AppState pins it to the SQLite and reqwest implementations.

use std::path::PathBuf;
use std::sync::Arc;

use aidash_core::chat::ChatService;
use aidash_core::project::ProjectRegistry;
use aidash_core::stream::ReaderOptions;
use aidash_infra::config::{HttpTimeouts, load_global_config};
use aidash_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use aidash_infra::http::{HttpFileUploader, HttpStreamTransport, build_client};
use aidash_infra::sqlite::history::SqliteHistoryRepository;
use aidash_infra::sqlite::pool::{DatabasePool, database_url};
use aidash_types::project::ProjectProfile;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteChatService =
    ChatService<SqliteHistoryRepository, HttpStreamTransport, HttpFileUploader>;

/// Shared application state used by every command.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir).await?;

        let config = load_global_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let history = SqliteHistoryRepository::new(db_pool);

        let client = build_client(HttpTimeouts::from_config(&config))?;
        let chat_service = ChatService::new(
            ProjectRegistry::from_config(&config),
            history,
            HttpStreamTransport::new(client.clone()),
            HttpFileUploader::new(client),
            ReaderOptions::from_config(&config),
        );

        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");

        Ok(Self {
            chat_service: Arc::new(chat_service),
            data_dir,
        })
    }

    /// Look up a project by id, or the configured default when `id` is None.
    pub fn resolve_project(&self, id: Option<&str>) -> anyhow::Result<ProjectProfile> {
        let registry = self.chat_service.registry();
        let project = match id {
            Some(id) => registry.get(id).ok_or_else(|| {
                anyhow::anyhow!("Unknown project '{id}'. Run `aidash projects` to list them.")
            })?,
            None => registry
                .default_project()
                .ok_or_else(|| anyhow::anyhow!("No projects configured"))?,
        };
        Ok(project.clone())
    }

    /// Model a project's requests will carry.
    pub fn model_for<'a>(&'a self, project: &'a ProjectProfile) -> &'a str {
        project
            .model
            .as_deref()
            .unwrap_or_else(|| self.chat_service.registry().default_model())
    }
}
