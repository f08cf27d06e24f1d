//! CLI command definitions and dispatch for the `aidash` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod chat;
pub mod history;
pub mod project;
pub mod upload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

/// Chat with your local AI projects from the terminal.
#[derive(Parser)]
#[command(name = "aidash", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "AIDASH_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured projects.
    #[command(alias = "ls")]
    Projects,

    /// Start an interactive chat with a project.
    Chat {
        /// Project id (defaults to the configured default project).
        project: Option<String>,
    },

    /// Ask a single question and stream the answer.
    Ask {
        /// Project id.
        project: String,

        /// The prompt to send.
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Show or clear a project's chat history.
    History {
        /// Project id.
        project: String,

        /// Delete the stored history.
        #[arg(long)]
        clear: bool,

        /// Show only the last N messages.
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Skip the confirmation prompt when clearing.
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Upload a document to a project that accepts files.
    Upload {
        /// Project id.
        project: String,

        /// Path of the file to upload.
        file: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Notice shown when a request fails. Details go to the log.
pub const FAILURE_NOTICE: &str =
    "I apologize, but I encountered an error while processing your request. Please try again.";

/// Cyan spinner with a message, ticking every 80ms.
pub fn spinner(message: impl Into<String>) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}

/// Shorten `text` to at most `max` characters, appending "...".
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let kept: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
