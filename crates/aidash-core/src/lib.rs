//! Business logic and port definitions for aidash.
//!
//! This crate defines the "ports" (transport, repository and uploader
//! traits) that the infrastructure layer implements, plus the streaming
//! reader and chat orchestration built on them. It depends only on
//! `aidash-types` -- never on `aidash-infra` or any HTTP/database crate.

pub mod chat;
pub mod project;
pub mod stream;
pub mod upload;
