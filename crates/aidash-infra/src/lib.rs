//! Infrastructure layer for aidash.
//!
//! Contains implementations of the port traits defined in `aidash-core`:
//! the reqwest-based stream transport and document uploader, SQLite chat
//! history, the `config.toml` loader and data directory resolution.

pub mod config;
pub mod filesystem;
pub mod http;
pub mod sqlite;
