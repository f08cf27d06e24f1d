//! aidash CLI entry point.
//!
//! Binary name: `aidash`
//!
//! Parses CLI arguments, initializes tracing, the history database and the
//! chat service, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,aidash=debug",
        _ => "trace",
    };
    aidash_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "aidash", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    aidash_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Initialize application state (config, DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Projects => {
            cli::project::list_projects(&state, cli.json).await?;
        }

        Commands::Chat { project } => {
            let project = state.resolve_project(project.as_deref())?;
            cli::chat::loop_runner::run_chat_loop(&state, &project).await?;
        }

        Commands::Ask { project, prompt } => {
            let project = state.resolve_project(Some(&project))?;
            cli::ask::ask(&state, &project, &prompt.join(" "), cli.json, cli.quiet).await?;
        }

        Commands::History {
            project,
            clear,
            limit,
            force,
        } => {
            let project = state.resolve_project(Some(&project))?;
            if clear {
                cli::history::clear_history(&state, &project, force, cli.json).await?;
            } else {
                cli::history::show_history(&state, &project, limit, cli.json).await?;
            }
        }

        Commands::Upload { project, file } => {
            let project = state.resolve_project(Some(&project))?;
            cli::upload::upload_file(&state, &project, &file, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
