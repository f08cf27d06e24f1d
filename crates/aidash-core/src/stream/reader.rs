//! The stream reader: chunked response body in, partial messages out.
//!
//! One `StreamReader` drives one request at a time through
//! Idle -> Connecting -> Streaming -> Done | Failed. Every parsed object
//! appends its `response` text to a running buffer and the sink receives the
//! full message so far. Reading stops at the first `done: true`, at end of
//! body, on error, on cancellation, or when no chunk arrives within the idle
//! timeout.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aidash_types::chat::{ChatMessage, MessageRole};
use aidash_types::config::GlobalConfig;
use aidash_types::stream::{
    Completion, FragmentPolicy, GenerationRequest, StreamChunk, StreamError, StreamOutcome,
    StreamPhase, StreamStatus,
};

use super::decoder::Utf8StreamDecoder;
use super::parser::{ChunkParser, ParsedChunks};
use super::transport::StreamTransport;

/// Tunables for a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub fragment_policy: FragmentPolicy,
    /// Longest wait for the next chunk. `None` waits forever.
    pub idle_timeout: Option<Duration>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            fragment_policy: FragmentPolicy::default(),
            idle_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl ReaderOptions {
    /// Options from the global config. An idle timeout of 0 disables it.
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            fragment_policy: config.fragment_policy,
            idle_timeout: (config.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(config.idle_timeout_secs)),
        }
    }
}

/// Reads streamed generation responses.
///
/// Status is published through a `watch` channel so a UI can follow the
/// phase and the time-to-first-byte flag while the read is awaited
/// elsewhere.
pub struct StreamReader {
    options: ReaderOptions,
    status: watch::Sender<StreamStatus>,
}

impl StreamReader {
    pub fn new(options: ReaderOptions) -> Self {
        let (status, _) = watch::channel(StreamStatus::default());
        Self { options, status }
    }

    /// Current status snapshot.
    pub fn status(&self) -> StreamStatus {
        *self.status.borrow()
    }

    /// Subscribe to status changes.
    pub fn monitor(&self) -> watch::Receiver<StreamStatus> {
        self.status.subscribe()
    }

    /// Open `request` through `transport` and read the response to the end.
    ///
    /// Generate payloads supply the fallback model for messages whose chunks
    /// carry none.
    pub async fn run<T, F>(
        &self,
        transport: &T,
        request: &GenerationRequest,
        sink: F,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError>
    where
        T: StreamTransport,
        F: FnMut(&ChatMessage),
    {
        self.begin();
        debug!(url = %request.url, model = ?request.payload.model(), "opening generation stream");

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StreamError::Cancelled),
            opened = transport.open(request) => opened,
        };

        match opened {
            Ok(body) => {
                self.consume(body, request.payload.model(), sink, cancel)
                    .await
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Read an already opened response body.
    pub async fn read<S, F>(
        &self,
        body: S,
        sink: F,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError>
    where
        S: Stream<Item = Result<Bytes, StreamError>> + Unpin,
        F: FnMut(&ChatMessage),
    {
        self.begin();
        self.consume(body, None, sink, cancel).await
    }

    async fn consume<S, F>(
        &self,
        mut body: S,
        model: Option<&str>,
        mut sink: F,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError>
    where
        S: Stream<Item = Result<Bytes, StreamError>> + Unpin,
        F: FnMut(&ChatMessage),
    {
        let mut decoder = Utf8StreamDecoder::new();
        let mut parser = ChunkParser::new(self.options.fragment_policy);
        let mut acc = Accumulator::new(model);
        let mut chunks_read: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(StreamError::Cancelled),
                next = self.next_chunk(&mut body) => next,
            };

            let bytes = match next {
                Ok(Some(bytes)) => bytes,
                Ok(None) => break,
                Err(e) => return Err(self.fail(e)),
            };

            chunks_read += 1;
            if chunks_read == 1 {
                self.first_byte();
            }
            debug!(chunk = chunks_read, bytes = bytes.len(), "stream chunk received");

            let text = decoder.decode(&bytes);
            if self.apply(parser.feed(&text), &mut acc, &mut sink) {
                return Ok(self.complete(acc, Completion::Marker, chunks_read));
            }
        }

        if decoder.has_pending() {
            debug!("body ended inside a UTF-8 sequence");
        }
        let tail = decoder.finish();
        if !tail.is_empty() && self.apply(parser.feed(&tail), &mut acc, &mut sink) {
            return Ok(self.complete(acc, Completion::Marker, chunks_read));
        }
        self.record_dropped(parser.finish());

        debug!(chunks = chunks_read, "body closed without a done marker");
        Ok(self.complete(acc, Completion::EndOfStream, chunks_read))
    }

    async fn next_chunk<S>(&self, body: &mut S) -> Result<Option<Bytes>, StreamError>
    where
        S: Stream<Item = Result<Bytes, StreamError>> + Unpin,
    {
        let next = match self.options.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, body.next())
                .await
                .map_err(|_| StreamError::Timeout(limit))?,
            None => body.next().await,
        };
        next.transpose()
    }

    /// Feed parsed objects to the accumulator. Returns true once done is seen.
    fn apply<F>(&self, parsed: ParsedChunks, acc: &mut Accumulator, sink: &mut F) -> bool
    where
        F: FnMut(&ChatMessage),
    {
        self.record_dropped(parsed.dropped);
        for chunk in parsed.chunks {
            let done = chunk.done;
            sink(acc.push(chunk));
            if done {
                return true;
            }
        }
        false
    }

    fn begin(&self) {
        self.status.send_replace(StreamStatus {
            phase: StreamPhase::Connecting,
            time_to_first_byte: true,
            streaming: true,
            dropped_fragments: 0,
        });
    }

    fn first_byte(&self) {
        self.status.send_modify(|status| {
            status.phase = StreamPhase::Streaming;
            status.time_to_first_byte = false;
        });
    }

    fn record_dropped(&self, dropped: u64) {
        if dropped > 0 {
            self.status
                .send_modify(|status| status.dropped_fragments += dropped);
        }
    }

    fn complete(&self, acc: Accumulator, completion: Completion, chunks_read: u64) -> StreamOutcome {
        self.settle(StreamPhase::Done);
        let dropped_fragments = self.status().dropped_fragments;
        if dropped_fragments > 0 {
            warn!(dropped_fragments, "unparsable fragments were skipped");
        }
        info!(
            chunks = chunks_read,
            chars = acc.buffer.chars().count(),
            ?completion,
            "generation stream finished"
        );

        StreamOutcome {
            message: acc.message,
            completion,
            chunks_read,
            dropped_fragments,
            server_error: acc.server_error,
        }
    }

    fn fail(&self, error: StreamError) -> StreamError {
        self.settle(StreamPhase::Failed);
        warn!(error = %error, "generation stream failed");
        error
    }

    fn settle(&self, phase: StreamPhase) {
        self.status.send_modify(|status| {
            status.phase = phase;
            status.time_to_first_byte = false;
            status.streaming = false;
        });
    }
}

/// Running state of one response.
struct Accumulator {
    buffer: String,
    role: MessageRole,
    created_at: Option<DateTime<Utc>>,
    model: Option<String>,
    server_error: Option<String>,
    message: Option<ChatMessage>,
}

impl Accumulator {
    fn new(model: Option<&str>) -> Self {
        Self {
            buffer: String::new(),
            role: MessageRole::Assistant,
            created_at: None,
            model: model.map(str::to_string),
            server_error: None,
            message: None,
        }
    }

    fn push(&mut self, chunk: StreamChunk) -> &ChatMessage {
        self.buffer.push_str(&chunk.response);

        if let Some(role) = chunk.role.as_deref().and_then(|r| r.parse().ok()) {
            self.role = role;
        }
        if let Some(raw) = chunk.created_at.as_deref() {
            self.created_at = Some(parse_timestamp(raw).unwrap_or_else(Utc::now));
        }
        if chunk.model.is_some() {
            self.model = chunk.model;
        }
        if let Some(error) = chunk.error {
            warn!(error = %error, "server reported an error in the stream");
            self.server_error = Some(error);
        }

        let created_at = *self.created_at.get_or_insert_with(Utc::now);
        self.message.insert(ChatMessage {
            role: self.role,
            content: self.buffer.clone(),
            created_at,
            files: Vec::new(),
            done: Some(chunk.done),
            model: self.model.clone(),
        })
    }
}

/// Parse a chunk timestamp.
///
/// Accepts RFC 3339 and offset-less ISO 8601 (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
