//! Main chat loop orchestration.
//!
//! Opens the project's session, prints the banner, then alternates between
//! reading a line and streaming the reply. Slash commands are handled
//! locally and never reach the backend.

use std::io::{self, Write};
use std::path::Path;

use console::style;
use rustyline_async::SharedWriter;
use tracing::warn;

use aidash_core::chat::ChatSession;
use aidash_types::chat::Attachment;
use aidash_types::error::{ChatError, UploadError};
use aidash_types::project::ProjectProfile;

use crate::cli::FAILURE_NOTICE;
use crate::cli::upload::upload_document;
use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;
use super::{Interrupt, Reply, failure_notice, stream_reply};

/// Run the interactive chat loop for a project.
pub async fn run_chat_loop(state: &AppState, project: &ProjectProfile) -> anyhow::Result<()> {
    let service = state.chat_service.as_ref();
    let model = state.model_for(project).to_string();
    let mut session = service.open_session(&project.id).await?;

    print_welcome_banner(
        project,
        &service.registry().chat_url(project),
        &model,
        session.len(),
    );

    let renderer = ChatRenderer::new();
    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, mut out) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    // Documents uploaded with /upload, attached to the next message.
    let mut pending: Vec<Attachment> = Vec::new();

    loop {
        let text = match input.read_line().await {
            InputEvent::Eof => {
                writeln!(out, "\n  {}", style("Session ended.").dim())?;
                break;
            }
            InputEvent::Interrupted => {
                writeln!(out, "  {}", style("Press Ctrl+D to exit, or keep chatting.").dim())?;
                continue;
            }
            InputEvent::Message(text) => text,
        };

        if let Some(command) = commands::parse(&text) {
            match command {
                ChatCommand::Help => {
                    write!(out, "{}", commands::help_text(project.file_upload_enabled))?;
                }
                ChatCommand::Clear => input.clear(),
                ChatCommand::Exit => {
                    writeln!(out, "\n  {}", style("Session ended.").dim())?;
                    break;
                }
                ChatCommand::History(limit) => {
                    print_history(&mut out, &renderer, &session, limit)?;
                }
                ChatCommand::Reset => match service.clear_history(&mut session).await {
                    Ok(()) => {
                        pending.clear();
                        writeln!(out, "\n  {} History cleared.\n", style("✓").green().bold())?;
                    }
                    Err(e) => {
                        warn!(project = %project.id, error = %e, "failed to clear history");
                        writeln!(out, "\n  {} {FAILURE_NOTICE}\n", style("!").red().bold())?;
                    }
                },
                ChatCommand::Upload(path) => {
                    attach_upload(state, project, Path::new(&path), &mut pending, &mut out)
                        .await?;
                }
                ChatCommand::Cancel => {
                    writeln!(out, "  {}", style("Nothing is streaming.").dim())?;
                }
                ChatCommand::Unknown(name) => {
                    writeln!(
                        out,
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(name).dim()
                    )?;
                }
            }
            continue;
        }

        let notices = out.clone();
        let reply = stream_reply(
            service,
            &mut session,
            &model,
            &text,
            pending.clone(),
            &mut out,
            true,
            &mut Interrupt::Prompt {
                input: &mut input,
                notices,
            },
        )
        .await;

        // Attachments stay pending if the message never made it into history.
        if !matches!(reply.result, Err(ChatError::Busy(_) | ChatError::EmptyMessage)) {
            pending.clear();
        }
        finish_reply(&mut out, &renderer, &model, &reply)?;
    }

    Ok(())
}

async fn attach_upload(
    state: &AppState,
    project: &ProjectProfile,
    path: &Path,
    pending: &mut Vec<Attachment>,
    out: &mut SharedWriter,
) -> io::Result<()> {
    if !project.file_upload_enabled {
        return writeln!(
            out,
            "\n  {} {} does not accept uploads.\n",
            style("!").yellow().bold(),
            project.name
        );
    }

    match upload_document(state, &project.id, path).await {
        Ok(receipt) => {
            writeln!(
                out,
                "\n  {} Uploaded {} ({} bytes). It will be attached to your next message.\n",
                style("✓").green().bold(),
                style(&receipt.attachment.name).cyan(),
                receipt.attachment.size_bytes
            )?;
            pending.push(receipt.attachment);
        }
        Err(ChatError::Upload(e @ UploadError::Io(_))) => {
            writeln!(out, "\n  {} {e}\n", style("!").red().bold())?;
        }
        Err(_) => {
            writeln!(out, "\n  {} Upload failed. Please try again.\n", style("!").red().bold())?;
        }
    }
    Ok(())
}

fn print_history(
    out: &mut impl Write,
    renderer: &ChatRenderer,
    session: &ChatSession,
    limit: usize,
) -> io::Result<()> {
    if session.is_empty() {
        return writeln!(out, "\n  {}\n", style("No messages yet.").dim());
    }
    writeln!(out)?;
    for message in session.tail(limit) {
        writeln!(out, "{}", renderer.render_message(message))?;
    }
    if session.len() > limit {
        writeln!(
            out,
            "  {}\n",
            style(format!("{} earlier messages not shown", session.len() - limit)).dim()
        )?;
    }
    Ok(())
}

fn finish_reply(
    out: &mut impl Write,
    renderer: &ChatRenderer,
    model: &str,
    reply: &Reply,
) -> io::Result<()> {
    if reply.printed > 0 {
        writeln!(out)?;
    }
    if let Ok(outcome) = &reply.result {
        let answered = outcome
            .message
            .as_ref()
            .and_then(|m| m.model.as_deref())
            .unwrap_or(model);
        writeln!(
            out,
            "{}",
            renderer.stats_footer(
                answered,
                reply.elapsed_ms,
                outcome.chunks_read,
                outcome.dropped_fragments
            )
        )?;
    }
    if let Some(notice) = failure_notice(&reply.result) {
        writeln!(out, "\n  {} {notice}", style("!").yellow().bold())?;
    }
    writeln!(out)
}
