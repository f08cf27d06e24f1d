//! Project profiles available to the chat service.

pub mod registry;

pub use registry::ProjectRegistry;
