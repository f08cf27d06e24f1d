//! Observability setup for aidash: tracing subscriber initialization and
//! span attribute names.

pub mod attrs;
pub mod tracing_setup;
