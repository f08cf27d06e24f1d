//! Async line input for the chat loop.
//!
//! Wraps `rustyline_async::Readline` so the loop can wait for the next line
//! and for Ctrl+C while a reply streams, without blocking the runtime.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// What the user did at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// A submitted, trimmed, non-empty line.
    Message(String),
    /// Ctrl+D, or the terminal went away.
    Eof,
    /// Ctrl+C.
    Interrupted,
}

pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Returns the input handle plus a writer that prints above the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    /// Wait for the next event. Blank lines are skipped; submitted lines go
    /// into the up-arrow history.
    pub async fn read_line(&mut self) -> InputEvent {
        loop {
            match self.rl.readline().await {
                Ok(ReadlineEvent::Line(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.rl.add_history_entry(trimmed.to_string());
                    return InputEvent::Message(trimmed.to_string());
                }
                Ok(ReadlineEvent::Eof) => return InputEvent::Eof,
                Ok(ReadlineEvent::Interrupted) => return InputEvent::Interrupted,
                Err(e) => {
                    tracing::debug!(error = %e, "readline failed, ending input");
                    return InputEvent::Eof;
                }
            }
        }
    }

    /// Clear the terminal screen.
    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }
}
