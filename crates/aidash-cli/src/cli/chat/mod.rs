//! Interactive chat with a project backend.
//!
//! Entry point: `loop_runner::run_chat_loop`. [`stream_reply`] is shared
//! with `aidash ask` and prints a reply as it streams.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;

use std::io::Write;
use std::time::Instant;

use console::style;
use rustyline_async::SharedWriter;
use tracing::Instrument;

use aidash_core::chat::ChatSession;
use aidash_observe::attrs;
use aidash_types::chat::{Attachment, ChatMessage};
use aidash_types::error::ChatError;
use aidash_types::stream::{Completion, StreamError, StreamOutcome};

use crate::state::ConcreteChatService;

use super::{FAILURE_NOTICE, spinner};
use commands::ChatCommand;
use input::{ChatInput, InputEvent};

/// Where a stop request comes from while a reply streams.
pub enum Interrupt<'a> {
    /// Ctrl+C delivered as a signal (one-shot commands).
    Signal,
    /// The chat prompt: Ctrl+C, Ctrl+D or `/cancel`. Other lines typed
    /// meanwhile are discarded with a hint.
    Prompt {
        input: &'a mut ChatInput,
        notices: SharedWriter,
    },
}

impl Interrupt<'_> {
    /// Resolves to true when the user asked to stop.
    async fn wait(&mut self) -> bool {
        match self {
            Interrupt::Signal => match tokio::signal::ctrl_c().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(error = %e, "ctrl-c handler unavailable");
                    std::future::pending().await
                }
            },
            Interrupt::Prompt { input, notices } => match input.read_line().await {
                InputEvent::Interrupted | InputEvent::Eof => true,
                InputEvent::Message(text) => {
                    if commands::parse(&text) == Some(ChatCommand::Cancel) {
                        return true;
                    }
                    let _ = writeln!(
                        notices,
                        "  {}",
                        style("Still replying. Ctrl+C or /cancel to stop it.").dim()
                    );
                    false
                }
            },
        }
    }
}

/// A finished `stream_reply` call.
pub struct Reply {
    pub result: Result<StreamOutcome, ChatError>,
    pub elapsed_ms: u64,
    /// Bytes of reply text written to the output.
    pub printed: usize,
}

/// Send `text` and write the reply to `out` as it grows.
///
/// `interrupt` is watched while the reply streams and cancels it. When
/// `echo` is false nothing is written (JSON and quiet output).
#[allow(clippy::too_many_arguments)]
pub async fn stream_reply<W: Write>(
    service: &ConcreteChatService,
    session: &mut ChatSession,
    model: &str,
    text: &str,
    files: Vec<Attachment>,
    out: &mut W,
    echo: bool,
    interrupt: &mut Interrupt<'_>,
) -> Reply {
    let project_id = session.project_id().to_string();
    let span = tracing::info_span!(
        "gen_ai.chat",
        gen_ai.operation.name = attrs::OP_CHAT,
        gen_ai.request.model = %model,
        aidash.project.id = %project_id,
        gen_ai.response.model = tracing::field::Empty,
        aidash.stream.chunks = tracing::field::Empty,
        aidash.stream.dropped_fragments = tracing::field::Empty,
        aidash.stream.completion = tracing::field::Empty,
    );

    let waiting = if echo { spinner("thinking...").ok() } else { None };
    let started = Instant::now();
    let mut printed = 0usize;
    let mut labelled = false;

    let result = {
        let on_update = |update: &ChatMessage| {
            if !echo {
                return;
            }
            if !labelled {
                if let Some(bar) = &waiting {
                    bar.finish_and_clear();
                }
                let _ = write!(out, "\n  {}\n", style("AI").cyan().bold());
                labelled = true;
            }
            if let Some(fresh) = update.content.get(printed..) {
                let _ = write!(out, "{fresh}");
                let _ = out.flush();
                printed = update.content.len();
            }
        };

        let send = service
            .send(session, text, files, on_update)
            .instrument(span.clone());
        tokio::pin!(send);

        loop {
            tokio::select! {
                biased;
                result = &mut send => break result,
                stop = interrupt.wait() => {
                    if stop {
                        service.cancel(&project_id);
                    }
                }
            }
        }
    };

    if let Some(bar) = &waiting {
        bar.finish_and_clear();
    }

    if let Ok(outcome) = &result {
        if let Some(model) = outcome.message.as_ref().and_then(|m| m.model.as_deref()) {
            span.record(attrs::GEN_AI_RESPONSE_MODEL, model);
        }
        span.record(attrs::AIDASH_STREAM_CHUNKS, outcome.chunks_read);
        span.record(attrs::AIDASH_STREAM_DROPPED, outcome.dropped_fragments);
        span.record(
            attrs::AIDASH_STREAM_COMPLETION,
            match outcome.completion {
                Completion::Marker => "marker",
                Completion::EndOfStream => "end_of_stream",
            },
        );
    }

    Reply {
        result,
        elapsed_ms: started.elapsed().as_millis() as u64,
        printed,
    }
}

/// One-line notice for a failed or flagged reply, `None` when it went fine.
///
/// Failure details are in the log; the user only sees a generic notice.
pub fn failure_notice(result: &Result<StreamOutcome, ChatError>) -> Option<String> {
    match result {
        Ok(outcome) if outcome.server_error.is_some() => Some(FAILURE_NOTICE.to_string()),
        Ok(outcome) if outcome.message.is_none() => {
            Some("The project sent back an empty reply.".to_string())
        }
        Ok(_) => None,
        Err(ChatError::Stream(StreamError::Cancelled)) => {
            Some("Stopped. The partial reply was kept.".to_string())
        }
        Err(ChatError::Busy(_)) => {
            Some("A reply is already streaming for this project.".to_string())
        }
        Err(ChatError::EmptyMessage) => Some("Nothing to send.".to_string()),
        Err(_) => Some(FAILURE_NOTICE.to_string()),
    }
}
