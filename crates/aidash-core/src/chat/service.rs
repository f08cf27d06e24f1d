//! Chat service orchestrating project chats, streaming and persistence.
//!
//! ChatService coordinates the ProjectRegistry, the HistoryRepository, a
//! StreamTransport and a FileUploader: loading history, sending prompts,
//! routing streamed updates into the session, cancelling in-flight streams
//! and uploading documents.

use std::path::Path;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use aidash_types::chat::{Attachment, ChatMessage};
use aidash_types::error::{ChatError, UploadError};
use aidash_types::project::ProjectProfile;
use aidash_types::stream::{StreamOutcome, StreamStatus};

use crate::chat::repository::HistoryRepository;
use crate::chat::session::ChatSession;
use crate::project::ProjectRegistry;
use crate::stream::{ReaderOptions, StreamReader, StreamTransport};
use crate::upload::{FileUploader, UploadReceipt};

/// Bookkeeping for a stream that is currently being read.
struct InFlight {
    cancel: CancellationToken,
    status: watch::Receiver<StreamStatus>,
}

/// Removes a project's slot from an in-flight map when dropped.
struct SlotGuard<'a, V> {
    map: &'a DashMap<String, V>,
    key: String,
}

impl<V> Drop for SlotGuard<'_, V> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

/// Claim the slot for `key`, or fail with `Busy` if it is taken.
fn claim<'a, V>(map: &'a DashMap<String, V>, key: &str, value: V) -> Result<SlotGuard<'a, V>, ChatError> {
    match map.entry(key.to_string()) {
        Entry::Occupied(_) => Err(ChatError::Busy(key.to_string())),
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(SlotGuard {
                map,
                key: key.to_string(),
            })
        }
    }
}

/// Orchestrates project chats.
///
/// Generic over its ports to maintain clean architecture (aidash-core never
/// depends on aidash-infra). At most one stream and one upload are in flight
/// per project; a second request is rejected with `ChatError::Busy`.
pub struct ChatService<R: HistoryRepository, T: StreamTransport, U: FileUploader> {
    registry: ProjectRegistry,
    repository: R,
    transport: T,
    uploader: U,
    options: ReaderOptions,
    streams: DashMap<String, InFlight>,
    uploads: DashMap<String, ()>,
}

impl<R: HistoryRepository, T: StreamTransport, U: FileUploader> ChatService<R, T, U> {
    pub fn new(
        registry: ProjectRegistry,
        repository: R,
        transport: T,
        uploader: U,
        options: ReaderOptions,
    ) -> Self {
        Self {
            registry,
            repository,
            transport,
            uploader,
            options,
            streams: DashMap::new(),
            uploads: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// Access the history repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn project(&self, project_id: &str) -> Result<&ProjectProfile, ChatError> {
        self.registry
            .get(project_id)
            .ok_or_else(|| ChatError::UnknownProject(project_id.to_string()))
    }

    /// Open a project chat with its stored history.
    pub async fn open_session(&self, project_id: &str) -> Result<ChatSession, ChatError> {
        let project = self.project(project_id)?;
        let history = self.repository.load(&project.id).await?;
        info!(project = %project.id, messages = history.len(), "chat session opened");
        Ok(ChatSession::new(project.id.clone(), history))
    }

    /// Send a prompt and stream the reply into `session`.
    ///
    /// `on_update` sees every partial message as it is applied. The user
    /// message is persisted before the request goes out and the whole history
    /// again once the stream ends, successfully or not.
    pub async fn send<F>(
        &self,
        session: &mut ChatSession,
        text: &str,
        files: Vec<Attachment>,
        mut on_update: F,
    ) -> Result<StreamOutcome, ChatError>
    where
        F: FnMut(&ChatMessage),
    {
        let prompt = text.trim();
        if prompt.is_empty() && files.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let project = self.project(session.project_id())?;
        let request = self.registry.request_for(project, prompt);
        let reader = StreamReader::new(self.options);
        let cancel = CancellationToken::new();
        let _slot = claim(
            &self.streams,
            &project.id,
            InFlight {
                cancel: cancel.clone(),
                status: reader.monitor(),
            },
        )?;

        session.push_user_message(prompt, files);
        self.persist(session).await;

        info!(project = %project.id, url = %request.url, "sending prompt");
        let result = reader
            .run(
                &self.transport,
                &request,
                |update| {
                    session.apply_stream_update(update);
                    on_update(update);
                },
                &cancel,
            )
            .await;

        session.finish_stream(result.is_ok());
        self.persist(session).await;

        match result {
            Ok(outcome) => {
                if let Some(error) = &outcome.server_error {
                    warn!(project = %project.id, error = %error, "backend reported an error");
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!(project = %project.id, error = %e, "prompt failed");
                Err(e.into())
            }
        }
    }

    /// Cancel the stream in flight for a project. Returns false if none is.
    pub fn cancel(&self, project_id: &str) -> bool {
        match self.streams.get(project_id) {
            Some(in_flight) => {
                in_flight.cancel.cancel();
                info!(project = %project_id, "stream cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Whether a stream is in flight for a project.
    pub fn is_busy(&self, project_id: &str) -> bool {
        self.streams.contains_key(project_id)
    }

    /// Status of the stream in flight for a project.
    pub fn stream_status(&self, project_id: &str) -> Option<StreamStatus> {
        self.streams
            .get(project_id)
            .map(|in_flight| *in_flight.status.borrow())
    }

    /// Drop every message of a session, in memory and in storage.
    pub async fn clear_history(&self, session: &mut ChatSession) -> Result<(), ChatError> {
        session.clear();
        self.repository.clear(session.project_id()).await?;
        info!(project = %session.project_id(), "chat history cleared");
        Ok(())
    }

    /// Upload a document to a project's backend.
    pub async fn upload(&self, project_id: &str, path: &Path) -> Result<UploadReceipt, ChatError> {
        let project = self.project(project_id)?;
        let url = self
            .registry
            .upload_url(project)
            .ok_or_else(|| UploadError::Disabled(project.id.clone()))?;
        let _slot = claim(&self.uploads, &project.id, ())?;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadError::Io(format!("{}: {e}", path.display())))?;
        if !metadata.is_file() {
            return Err(UploadError::Io(format!("{} is not a file", path.display())).into());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!(project = %project.id, file = %name, size = metadata.len(), "uploading document");
        let response = self.uploader.upload(&url, path).await.map_err(|e| {
            warn!(project = %project.id, file = %name, error = %e, "upload failed");
            e
        })?;

        Ok(UploadReceipt {
            attachment: Attachment {
                name,
                size_bytes: metadata.len(),
            },
            response,
        })
    }

    async fn persist(&self, session: &ChatSession) {
        if let Err(e) = self
            .repository
            .save(session.project_id(), session.messages())
            .await
        {
            warn!(project = %session.project_id(), error = %e, "failed to persist chat history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use aidash_types::config::GlobalConfig;
    use aidash_types::error::RepositoryError;
    use aidash_types::stream::{Completion, GenerationRequest, RequestPayload, StreamError};
    use bytes::Bytes;
    use futures_util::{StreamExt, stream};
    use tokio::sync::Notify;

    use crate::stream::ByteStream;

    #[derive(Default, Clone)]
    struct MemoryHistory {
        inner: Arc<Mutex<HashMap<String, Vec<ChatMessage>>>>,
    }

    impl MemoryHistory {
        fn stored(&self, project_id: &str) -> Vec<ChatMessage> {
            self.inner
                .lock()
                .unwrap()
                .get(project_id)
                .cloned()
                .unwrap_or_default()
        }
    }

    impl HistoryRepository for MemoryHistory {
        async fn load(&self, project_id: &str) -> Result<Vec<ChatMessage>, RepositoryError> {
            Ok(self.stored(project_id))
        }

        async fn save(
            &self,
            project_id: &str,
            messages: &[ChatMessage],
        ) -> Result<(), RepositoryError> {
            self.inner
                .lock()
                .unwrap()
                .insert(project_id.to_string(), messages.to_vec());
            Ok(())
        }

        async fn clear(&self, project_id: &str) -> Result<(), RepositoryError> {
            self.inner.lock().unwrap().remove(project_id);
            Ok(())
        }
    }

    /// Replays fixed chunks, or fails with an HTTP status.
    #[derive(Default)]
    struct ScriptedTransport {
        chunks: Vec<&'static str>,
        status: Option<u16>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedTransport {
        fn replying(chunks: Vec<&'static str>) -> Self {
            Self {
                chunks,
                ..Self::default()
            }
        }
    }

    impl StreamTransport for ScriptedTransport {
        async fn open(&self, request: &GenerationRequest) -> Result<ByteStream, StreamError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(status) = self.status {
                return Err(StreamError::HttpStatus {
                    status,
                    body: "internal error".to_string(),
                });
            }
            let items: Vec<Result<Bytes, StreamError>> = self
                .chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect();
            Ok(Box::pin(stream::iter(items)))
        }
    }

    /// Sends one chunk, then never finishes.
    struct HangingTransport {
        opened: Arc<Notify>,
    }

    impl StreamTransport for HangingTransport {
        async fn open(&self, _request: &GenerationRequest) -> Result<ByteStream, StreamError> {
            self.opened.notify_one();
            let first = stream::iter(vec![Ok(Bytes::from_static(
                br#"{"response":"thinking","done":false}"#,
            ))]);
            Ok(Box::pin(first.chain(stream::pending())))
        }
    }

    #[derive(Default)]
    struct RecordingUploader {
        urls: Mutex<Vec<String>>,
    }

    impl FileUploader for RecordingUploader {
        async fn upload(&self, url: &str, _path: &Path) -> Result<serde_json::Value, UploadError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(serde_json::json!({"message": "indexed"}))
        }
    }

    fn service<T: StreamTransport>(
        transport: T,
    ) -> (ChatService<MemoryHistory, T, RecordingUploader>, MemoryHistory) {
        let history = MemoryHistory::default();
        let service = ChatService::new(
            ProjectRegistry::from_config(&GlobalConfig::default()),
            history.clone(),
            transport,
            RecordingUploader::default(),
            ReaderOptions::default(),
        );
        (service, history)
    }

    const HELLO: [&str; 3] = [
        r#"{"response":"Hel","done":false}"#,
        r#"{"response":"lo","done":false}"#,
        r#"{"response":"!","done":true}"#,
    ];

    #[tokio::test]
    async fn test_open_unknown_project() {
        let (service, _) = service(ScriptedTransport::default());
        let err = service.open_session("nope").await.unwrap_err();
        assert!(matches!(err, ChatError::UnknownProject(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_send_streams_reply_and_persists() {
        let (service, history) = service(ScriptedTransport::replying(HELLO.to_vec()));
        let mut session = service.open_session("simple-ai-chat").await.unwrap();

        let mut seen = Vec::new();
        let outcome = service
            .send(&mut session, "  Hi  ", Vec::new(), |m| seen.push(m.content.clone()))
            .await
            .unwrap();

        assert_eq!(outcome.completion, Completion::Marker);
        assert_eq!(seen, vec!["Hel", "Hello", "Hello!"]);
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[0].content, "Hi");
        assert_eq!(session.messages()[1].content, "Hello!");
        assert!(session.messages()[1].is_done());

        let stored = history.stored("simple-ai-chat");
        assert_eq!(stored, session.messages());
        assert!(!service.is_busy("simple-ai-chat"));
    }

    #[tokio::test]
    async fn test_send_builds_project_payload() {
        let (service, _) = service(ScriptedTransport::replying(HELLO.to_vec()));
        let mut session = service
            .open_session("document-search-qa-web-app")
            .await
            .unwrap();
        service
            .send(&mut session, "What is RAG?", Vec::new(), |_| {})
            .await
            .unwrap();

        let requests = service.transport.requests.lock().unwrap();
        assert_eq!(
            requests[0].url,
            "http://127.0.0.1:8000/api/rag-langchain-ai/chat"
        );
        assert_eq!(
            requests[0].payload,
            RequestPayload::Query {
                query: "What is RAG?".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (service, history) = service(ScriptedTransport::replying(HELLO.to_vec()));
        let mut session = service.open_session("simple-ai-chat").await.unwrap();
        let err = service
            .send(&mut session, "   ", Vec::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert!(session.is_empty());
        assert!(history.stored("simple-ai-chat").is_empty());
    }

    #[tokio::test]
    async fn test_files_without_text_are_sent() {
        let (service, _) = service(ScriptedTransport::replying(HELLO.to_vec()));
        let mut session = service.open_session("simple-ai-chat").await.unwrap();
        let files = vec![Attachment {
            name: "report.csv".to_string(),
            size_bytes: 10,
        }];
        service
            .send(&mut session, "", files.clone(), |_| {})
            .await
            .unwrap();
        assert_eq!(session.messages()[0].files, files);
    }

    #[tokio::test]
    async fn test_second_send_while_streaming_is_busy() {
        let opened = Arc::new(Notify::new());
        let (service, _) = service(HangingTransport {
            opened: opened.clone(),
        });
        let mut first = service.open_session("simple-ai-chat").await.unwrap();
        let mut second = service.open_session("simple-ai-chat").await.unwrap();

        let (first_result, second_result) = tokio::join!(
            service.send(&mut first, "one", Vec::new(), |_| {}),
            async {
                opened.notified().await;
                let result = service.send(&mut second, "two", Vec::new(), |_| {}).await;
                assert!(service.is_busy("simple-ai-chat"));
                assert!(service.cancel("simple-ai-chat"));
                result
            }
        );

        assert!(matches!(second_result, Err(ChatError::Busy(_))));
        assert!(second.is_empty());
        assert!(matches!(
            first_result,
            Err(ChatError::Stream(StreamError::Cancelled))
        ));
        assert!(!service.is_busy("simple-ai-chat"));
        assert!(!service.cancel("simple-ai-chat"));
    }

    #[tokio::test]
    async fn test_cancelled_partial_kept_not_done() {
        let opened = Arc::new(Notify::new());
        let (service, history) = service(HangingTransport {
            opened: opened.clone(),
        });
        let mut session = service.open_session("code-review").await.unwrap();

        let (result, _) = tokio::join!(
            service.send(&mut session, "review this", Vec::new(), |_| {}),
            async {
                opened.notified().await;
                // Let the first chunk land before cancelling.
                while service
                    .stream_status("code-review")
                    .is_some_and(|s| s.time_to_first_byte)
                {
                    tokio::task::yield_now().await;
                }
                service.cancel("code-review")
            }
        );

        assert!(result.is_err());
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[1].content, "thinking");
        assert_eq!(session.messages()[1].done, Some(false));
        assert_eq!(history.stored("code-review").len(), 2);
    }

    #[tokio::test]
    async fn test_http_failure_keeps_user_message_only() {
        let (service, history) = service(ScriptedTransport {
            status: Some(500),
            ..ScriptedTransport::default()
        });
        let mut session = service.open_session("simple-ai-chat").await.unwrap();
        let err = service
            .send(&mut session, "Hi", Vec::new(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChatError::Stream(StreamError::HttpStatus { status: 500, .. })
        ));
        assert_eq!(session.len(), 1);
        assert_eq!(history.stored("simple-ai-chat").len(), 1);
        assert!(!service.is_busy("simple-ai-chat"));
    }

    #[tokio::test]
    async fn test_end_of_stream_marks_reply_done() {
        let (service, _) = service(ScriptedTransport::replying(vec![
            r#"{"response":"no marker","done":false}"#,
        ]));
        let mut session = service.open_session("simple-ai-chat").await.unwrap();
        let outcome = service
            .send(&mut session, "Hi", Vec::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(outcome.completion, Completion::EndOfStream);
        assert!(session.messages()[1].is_done());
    }

    #[tokio::test]
    async fn test_status_visible_while_streaming() {
        let (service, _) = service(ScriptedTransport::replying(HELLO.to_vec()));
        let mut session = service.open_session("simple-ai-chat").await.unwrap();
        let mut statuses = Vec::new();
        service
            .send(&mut session, "Hi", Vec::new(), |_| {
                statuses.push(service.stream_status("simple-ai-chat"))
            })
            .await
            .unwrap();

        assert_eq!(statuses.len(), 3);
        for status in statuses {
            let status = status.unwrap();
            assert!(status.streaming);
            assert!(!status.time_to_first_byte);
        }
        assert!(service.stream_status("simple-ai-chat").is_none());
    }

    #[tokio::test]
    async fn test_history_reloaded_by_new_session() {
        let (service, _) = service(ScriptedTransport::replying(HELLO.to_vec()));
        let mut session = service.open_session("simple-ai-chat").await.unwrap();
        service
            .send(&mut session, "Hi", Vec::new(), |_| {})
            .await
            .unwrap();

        let reopened = service.open_session("simple-ai-chat").await.unwrap();
        assert_eq!(reopened.messages(), session.messages());
    }

    #[tokio::test]
    async fn test_clear_history() {
        let (service, history) = service(ScriptedTransport::replying(HELLO.to_vec()));
        let mut session = service.open_session("simple-ai-chat").await.unwrap();
        service
            .send(&mut session, "Hi", Vec::new(), |_| {})
            .await
            .unwrap();

        service.clear_history(&mut session).await.unwrap();
        assert!(session.is_empty());
        assert!(history.stored("simple-ai-chat").is_empty());
    }

    #[tokio::test]
    async fn test_upload_disabled_project() {
        let (service, _) = service(ScriptedTransport::default());
        let err = service
            .upload("simple-ai-chat", Path::new("whatever.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Upload(UploadError::Disabled(_))));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let (service, _) = service(ScriptedTransport::default());
        let err = service
            .upload(
                "document-search-qa-web-app",
                Path::new("/definitely/not/here.pdf"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Upload(UploadError::Io(_))));
    }

    #[tokio::test]
    async fn test_upload_returns_receipt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"retrieval augmented generation").unwrap();

        let (service, _) = service(ScriptedTransport::default());
        let receipt = service
            .upload("document-search-qa-web-app", &path)
            .await
            .unwrap();

        assert_eq!(receipt.attachment.name, "notes.txt");
        assert_eq!(receipt.attachment.size_bytes, 30);
        assert_eq!(receipt.response["message"], "indexed");
        assert_eq!(
            service.uploader.urls.lock().unwrap()[0],
            "http://127.0.0.1:8000/api/rag-langchain-ai/upload-document"
        );
    }
}
