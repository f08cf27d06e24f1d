//! HTTP adapters built on reqwest.
//!
//! One shared `reqwest::Client` carries the connect and request timeouts and
//! backs both the stream transport and the document uploader.

pub mod transport;
pub mod upload;

pub use transport::HttpStreamTransport;
pub use upload::HttpFileUploader;

use crate::config::HttpTimeouts;

/// Build the shared HTTP client.
pub fn build_client(timeouts: HttpTimeouts) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(timeouts.connect)
        .user_agent(concat!("aidash/", env!("CARGO_PKG_VERSION")));
    if let Some(request) = timeouts.request {
        builder = builder.timeout(request);
    }
    builder.build()
}
