//! Project chats: session state, history persistence and orchestration.
//!
//! `ChatSession` holds one project's message list, `HistoryRepository` is the
//! storage port, and `ChatService` ties them to the stream reader.

pub mod repository;
pub mod service;
pub mod session;

pub use repository::HistoryRepository;
pub use service::ChatService;
pub use session::ChatSession;
