//! `aidash ask`: one prompt, one streamed answer.
//!
//! The answer is printed raw while it streams. On a terminal it is then
//! redrawn as rendered markdown, as long as it still fits on screen.

use std::io::Write;

use anyhow::Result;
use console::{Term, style};
use serde::Serialize;

use aidash_types::error::ChatError;
use aidash_types::project::ProjectProfile;
use aidash_types::stream::{Completion, StreamError};

use crate::state::AppState;

use super::chat::renderer::ChatRenderer;
use super::chat::{Interrupt, failure_notice, stream_reply};

#[derive(Serialize)]
struct AskOutput<'a> {
    project: &'a str,
    model: &'a str,
    content: &'a str,
    completion: Completion,
    chunks_read: u64,
    dropped_fragments: u64,
    elapsed_ms: u64,
}

pub async fn ask(
    state: &AppState,
    project: &ProjectProfile,
    prompt: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let service = state.chat_service.as_ref();
    let model = state.model_for(project);
    let mut session = service.open_session(&project.id).await?;
    let echo = !json && !quiet;

    let mut stdout = std::io::stdout();
    let reply = stream_reply(
        service,
        &mut session,
        model,
        prompt,
        Vec::new(),
        &mut stdout,
        echo,
        &mut Interrupt::Signal,
    )
    .await;

    let notice = failure_notice(&reply.result);
    let outcome = match reply.result {
        Ok(outcome) => outcome,
        Err(ChatError::Stream(StreamError::Cancelled)) => {
            if echo {
                println!();
            }
            eprintln!("\n  {} {}", style("!").yellow().bold(), notice.unwrap_or_default());
            return Ok(());
        }
        Err(_) => anyhow::bail!(notice.unwrap_or_default()),
    };
    let content = outcome
        .message
        .as_ref()
        .map(|m| m.content.as_str())
        .unwrap_or_default();
    let answered = outcome
        .message
        .as_ref()
        .and_then(|m| m.model.as_deref())
        .unwrap_or(model);

    if json {
        let output = AskOutput {
            project: &project.id,
            model: answered,
            content,
            completion: outcome.completion,
            chunks_read: outcome.chunks_read,
            dropped_fragments: outcome.dropped_fragments,
            elapsed_ms: reply.elapsed_ms,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if quiet {
        println!("{content}");
    } else {
        if reply.printed > 0 && !content.ends_with('\n') {
            println!();
        }
        redraw_as_markdown(content)?;
        let renderer = ChatRenderer::new();
        println!(
            "{}",
            renderer.stats_footer(
                answered,
                reply.elapsed_ms,
                outcome.chunks_read,
                outcome.dropped_fragments
            )
        );
    }

    if let Some(notice) = notice {
        eprintln!("\n  {} {notice}", style("!").yellow().bold());
    }
    Ok(())
}

/// Replace the raw streamed text with its markdown rendering.
fn redraw_as_markdown(content: &str) -> Result<()> {
    let term = Term::stdout();
    if content.is_empty() || !term.is_term() {
        return Ok(());
    }
    let (rows, columns) = term.size();
    let height = streamed_height(content, usize::from(columns));
    if height == 0 || height >= usize::from(rows) {
        return Ok(());
    }

    term.clear_last_lines(height)?;
    let rendered = ChatRenderer::new().render_final(content);
    let mut stdout = std::io::stdout();
    for line in rendered.lines() {
        writeln!(stdout, "  {line}")?;
    }
    stdout.flush()?;
    Ok(())
}

/// Terminal rows taken by `content` printed raw at the given width.
fn streamed_height(content: &str, columns: usize) -> usize {
    let columns = columns.max(1);
    content
        .lines()
        .map(|line| console::measure_text_width(line).div_ceil(columns).max(1))
        .sum()
}
