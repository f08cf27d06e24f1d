//! `aidash history`: show or clear a project's stored conversation.

use anyhow::Result;
use console::style;
use dialoguer::Confirm;

use aidash_types::project::ProjectProfile;

use crate::state::AppState;

use super::chat::renderer::ChatRenderer;

pub async fn show_history(
    state: &AppState,
    project: &ProjectProfile,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let session = state.chat_service.open_session(&project.id).await?;
    let messages = match limit {
        Some(limit) => session.tail(limit),
        None => session.messages(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No history for {}. Start one with: {}",
            style("i").blue().bold(),
            style(&project.name).cyan(),
            style(format!("aidash chat {}", project.id)).yellow()
        );
        println!();
        return Ok(());
    }

    let renderer = ChatRenderer::new();
    println!();
    for message in messages {
        println!("{}", renderer.render_message(message));
    }
    println!(
        "  {} of {} message{} for {}",
        style(messages.len()).bold(),
        session.len(),
        if session.len() == 1 { "" } else { "s" },
        style(&project.name).cyan()
    );
    println!();

    Ok(())
}

pub async fn clear_history(
    state: &AppState,
    project: &ProjectProfile,
    force: bool,
    json: bool,
) -> Result<()> {
    let mut session = state.chat_service.open_session(&project.id).await?;
    let count = session.len();

    if !force && !json && count > 0 {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {count} message{} from '{}'?",
                if count == 1 { "" } else { "s" },
                style(&project.name).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.chat_service.clear_history(&mut session).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"cleared": true, "project": project.id, "messages": count})
        );
    } else {
        println!(
            "  {} Cleared {count} message{} from {}.",
            style("✓").green().bold(),
            if count == 1 { "" } else { "s" },
            project.name
        );
    }

    Ok(())
}
