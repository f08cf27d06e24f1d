//! `aidash projects`: table of configured projects.

use std::collections::HashMap;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use aidash_infra::sqlite::history::HistorySummary;
use aidash_types::project::ProjectProfile;

use crate::state::AppState;

/// JSON row for `--json` output.
#[derive(Serialize)]
struct ProjectRow<'a> {
    #[serde(flatten)]
    project: &'a ProjectProfile,
    chat_url: String,
    upload_url: Option<String>,
    is_default: bool,
    messages: u64,
}

pub async fn list_projects(state: &AppState, json: bool) -> Result<()> {
    let registry = state.chat_service.registry();
    let summaries: HashMap<String, HistorySummary> = state
        .chat_service
        .repository()
        .summaries()
        .await?
        .into_iter()
        .map(|s| (s.project_id.clone(), s))
        .collect();
    let default_id = registry.default_project().map(|p| p.id.clone());

    if json {
        let rows: Vec<ProjectRow<'_>> = registry
            .list()
            .iter()
            .map(|project| ProjectRow {
                project,
                chat_url: registry.chat_url(project),
                upload_url: registry.upload_url(project),
                is_default: default_id.as_deref() == Some(project.id.as_str()),
                messages: summaries.get(&project.id).map_or(0, |s| s.message_count),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if registry.list().is_empty() {
        println!();
        println!(
            "  {} No projects configured. Add some to {}",
            style("i").blue().bold(),
            style(state.data_dir.join("config.toml").display()).yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Project").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Endpoint").fg(Color::White),
        Cell::new("Uploads").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Last Active").fg(Color::White),
    ]);

    for project in registry.list() {
        let id_display = if default_id.as_deref() == Some(project.id.as_str()) {
            format!("{} *", project.id)
        } else {
            project.id.clone()
        };

        let uploads_cell = if project.file_upload_enabled {
            Cell::new("● yes").fg(Color::Green)
        } else {
            Cell::new("○ no").fg(Color::DarkGrey)
        };

        let (messages, last_active) = match summaries.get(&project.id) {
            Some(summary) => (
                summary.message_count.to_string(),
                summary.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ),
            None => ("0".to_string(), "never".to_string()),
        };

        table.add_row(vec![
            Cell::new(id_display).fg(Color::Cyan),
            Cell::new(&project.name),
            Cell::new(registry.chat_url(project)).fg(Color::DarkGrey),
            uploads_cell,
            Cell::new(messages),
            Cell::new(last_active).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} project{} {} default model {}",
        style(registry.list().len()).bold(),
        if registry.list().len() == 1 { "" } else { "s" },
        style("\u{00b7}").dim(),
        style(registry.default_model()).cyan()
    );
    println!();

    Ok(())
}
