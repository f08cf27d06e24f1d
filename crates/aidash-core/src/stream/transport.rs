//! StreamTransport trait definition.
//!
//! The transport opens a generation request and hands back the raw response
//! body as a byte stream. The HTTP implementation lives in aidash-infra.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use aidash_types::stream::{GenerationRequest, StreamError};

/// A response body as a stream of network chunks.
///
/// Boxed so readers can hold bodies from any transport behind one type.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send + 'static>>;

/// Opens streamed generation requests.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait StreamTransport: Send + Sync {
    /// Send the request and return the body once response headers arrive.
    ///
    /// Non-success statuses are reported as `StreamError::HttpStatus` here,
    /// before any body bytes are handed out.
    fn open(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<ByteStream, StreamError>> + Send;
}
