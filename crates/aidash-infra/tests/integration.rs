//! Integration tests for the HTTP adapters using wiremock.

use aidash_core::chat::ChatService;
use aidash_core::project::ProjectRegistry;
use aidash_core::stream::{ReaderOptions, StreamReader, StreamTransport};
use aidash_core::upload::FileUploader;
use aidash_infra::config::HttpTimeouts;
use aidash_infra::http::{HttpFileUploader, HttpStreamTransport, build_client};
use aidash_infra::sqlite::history::SqliteHistoryRepository;
use aidash_infra::sqlite::pool::{DatabasePool, database_url};
use aidash_types::chat::ChatMessage;
use aidash_types::config::GlobalConfig;
use aidash_types::error::{ChatError, UploadError};
use aidash_types::project::{PayloadKind, ProjectProfile};
use aidash_types::stream::{Completion, GenerationRequest, RequestPayload, StreamError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OLLAMA_BODY: &str = concat!(
    r#"{"model":"deepseek-r1:7b","created_at":"2025-02-01T10:00:00.000000001Z","response":"Hel","done":false}"#,
    "\n",
    r#"{"model":"deepseek-r1:7b","created_at":"2025-02-01T10:00:00.100000000Z","response":"lo","done":false}"#,
    "\n",
    r#"{"model":"deepseek-r1:7b","created_at":"2025-02-01T10:00:00.200000000Z","response":"!","done":true}"#,
    "\n",
);

fn client() -> reqwest::Client {
    build_client(HttpTimeouts::from_config(&GlobalConfig::default())).expect("client builds")
}

fn generate_request(url: String) -> GenerationRequest {
    GenerationRequest {
        url,
        payload: RequestPayload::Generate {
            prompt: "Hi".to_string(),
            model: "deepseek-r1:7b".to_string(),
        },
    }
}

#[tokio::test]
async fn transport_posts_json_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"prompt": "Hi", "model": "deepseek-r1:7b"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(OLLAMA_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HttpStreamTransport::new(client());
    let request = generate_request(format!("{}/api/generate", mock_server.uri()));
    let result = transport.open(&request).await;
    assert!(result.is_ok(), "expected Ok, got: {:?}", result.err());
}

#[tokio::test]
async fn reader_accumulates_ndjson_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OLLAMA_BODY))
        .mount(&mock_server)
        .await;

    let transport = HttpStreamTransport::new(client());
    let reader = StreamReader::new(ReaderOptions::default());
    let request = generate_request(format!("{}/api/generate", mock_server.uri()));

    let mut last: Option<ChatMessage> = None;
    let outcome = reader
        .run(
            &transport,
            &request,
            |msg: &ChatMessage| last = Some(msg.clone()),
            &CancellationToken::new(),
        )
        .await
        .expect("stream should succeed");

    assert_eq!(outcome.completion, Completion::Marker);
    let message = outcome.message.expect("message present");
    assert_eq!(message.content, "Hello!");
    assert_eq!(message.done, Some(true));
    assert_eq!(message.model.as_deref(), Some("deepseek-r1:7b"));
    assert_eq!(last.expect("sink called").content, "Hello!");
}

#[tokio::test]
async fn reader_handles_concatenated_objects() {
    let mock_server = MockServer::start().await;

    let body = concat!(
        r#"{"response":"Retrieval ","done":false,"created_at":"2025-02-01T10:00:00.123456","role":"assistant"}"#,
        r#"{"response":"augmented.","done":false,"created_at":"2025-02-01T10:00:01.123456","role":"assistant"}"#,
        r#"{"response":"","done":true,"created_at":"2025-02-01T10:00:02.123456","role":"assistant"}"#,
    );
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(serde_json::json!({"query": "What is RAG?"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let transport = HttpStreamTransport::new(client());
    let reader = StreamReader::new(ReaderOptions::default());
    let request = GenerationRequest {
        url: format!("{}/chat", mock_server.uri()),
        payload: RequestPayload::Query {
            query: "What is RAG?".to_string(),
        },
    };

    let outcome = reader
        .run(&transport, &request, |_: &ChatMessage| {}, &CancellationToken::new())
        .await
        .expect("stream should succeed");

    let message = outcome.message.expect("message present");
    assert_eq!(message.content, "Retrieval augmented.");
    assert!(message.model.is_none());
    assert_eq!(outcome.dropped_fragments, 0);
}

#[tokio::test]
async fn transport_maps_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model 'nope' not found"))
        .mount(&mock_server)
        .await;

    let transport = HttpStreamTransport::new(client());
    let request = generate_request(format!("{}/api/generate", mock_server.uri()));
    let err = transport.open(&request).await.err().expect("should fail");

    match err {
        StreamError::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("expected HttpStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn transport_maps_connection_refused() {
    let transport = HttpStreamTransport::new(client());
    let request = generate_request("http://127.0.0.1:1/api/generate".to_string());
    let err = transport.open(&request).await.err().expect("should fail");
    assert!(matches!(err, StreamError::Network(_)), "got: {err:?}");
}

#[tokio::test]
async fn uploader_sends_multipart_file_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload-document"))
        .and(body_string_contains(r#"name="file""#))
        .and(body_string_contains(r#"filename="notes.txt""#))
        .and(body_string_contains("vector stores"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"message": "File processed", "chunks": 3})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "notes about vector stores").unwrap();

    let uploader = HttpFileUploader::new(client());
    let reply = uploader
        .upload(&format!("{}/upload-document", mock_server.uri()), &file)
        .await
        .expect("upload should succeed");
    assert_eq!(reply["chunks"], 3);
}

#[tokio::test]
async fn uploader_maps_error_status_and_bad_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/too-big"))
        .respond_with(ResponseTemplate::new(413).set_body_string("too large"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/not-json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "x").unwrap();
    let uploader = HttpFileUploader::new(client());

    let err = uploader
        .upload(&format!("{}/too-big", mock_server.uri()), &file)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::HttpStatus { status: 413, .. }));

    let err = uploader
        .upload(&format!("{}/not-json", mock_server.uri()), &file)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::InvalidResponse(_)));
}

#[tokio::test]
async fn chat_service_end_to_end_with_sqlite_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OLLAMA_BODY))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::new(&database_url(dir.path())).await.unwrap();
    let history = SqliteHistoryRepository::new(pool);

    let project = ProjectProfile {
        id: "local".to_string(),
        name: "Local".to_string(),
        endpoint: mock_server.uri(),
        chat_path: "/api/generate".to_string(),
        upload_path: None,
        file_upload_enabled: false,
        payload: PayloadKind::Generate,
        model: None,
    };
    let registry = ProjectRegistry::new(vec![project], "local", "deepseek-r1:7b");
    let http = client();
    let service = ChatService::new(
        registry,
        history,
        HttpStreamTransport::new(http.clone()),
        HttpFileUploader::new(http),
        ReaderOptions::default(),
    );

    let mut session = service.open_session("local").await.unwrap();
    service
        .send(&mut session, "Hi", Vec::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(session.len(), 2);

    let reopened = service.open_session("local").await.unwrap();
    assert_eq!(reopened.messages(), session.messages());
    assert_eq!(reopened.messages()[1].content, "Hello!");

    let err = service
        .upload("local", dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Upload(UploadError::Disabled(_))));
}
