//! reqwest implementation of [`StreamTransport`].
//!
//! POSTs the JSON payload and hands the chunked response body to the
//! reader as-is; decoding and parsing happen in aidash-core.

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use aidash_core::stream::{ByteStream, StreamTransport};
use aidash_types::stream::{GenerationRequest, StreamError};

/// Opens generation streams over HTTP.
#[derive(Clone)]
pub struct HttpStreamTransport {
    client: reqwest::Client,
}

impl HttpStreamTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn network_error(e: reqwest::Error) -> StreamError {
    if e.is_timeout() {
        StreamError::Network(format!("request timed out: {e}"))
    } else if e.is_connect() {
        StreamError::Network(format!("connection failed: {e}"))
    } else {
        StreamError::Network(e.to_string())
    }
}

impl StreamTransport for HttpStreamTransport {
    async fn open(&self, request: &GenerationRequest) -> Result<ByteStream, StreamError> {
        let response = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json")
            .json(&request.payload)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, url = %request.url, "generation endpoint error response");
            return Err(StreamError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = %status, url = %request.url, "generation stream opened");
        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(network_error)),
        ))
    }
}
