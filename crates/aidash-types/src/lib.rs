//! Shared domain types for aidash.
//!
//! This crate contains the domain types used across the workspace: chat
//! messages, project profiles, streaming wire shapes, configuration and
//! the error enums.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod project;
pub mod stream;
