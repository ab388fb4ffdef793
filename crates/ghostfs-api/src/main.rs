//! ghostfs CLI entry point.
//!
//! Binary name: `ghostfs`
//!
//! Parses CLI arguments, initializes the drivers and the ghost service, then
//! dispatches to the command handler for the selected scope.

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
        1 => "info,ghostfs=debug",
        _ => "trace",
    };
    ghostfs_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "ghostfs", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = run(&state, cli).await;

    ghostfs_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(state: &AppState, args: Cli) -> anyhow::Result<()> {
    let json = args.json;
    let scope = state.scope(args.bot.as_deref(), args.bots)?;
    tracing::debug!(scope = %scope.scope(), driver = %scope.mode(), "dispatching command");

    match args.command {
        Commands::Ls {
            folder,
            pattern,
            exclude,
            all,
        } => cli::files::list_files(&scope, &folder, pattern.as_deref(), exclude, all, json).await,
        Commands::Cat { path } => cli::files::cat_file(&scope, &path, json).await,
        Commands::Put {
            path,
            from,
            untracked,
        } => cli::files::put_file(&scope, &path, from.as_deref(), untracked, json).await,
        Commands::Rm { path, force } => cli::files::remove_file(&scope, &path, force, json).await,
        Commands::Mv { path, new_name } => {
            cli::files::rename_file(&scope, &path, &new_name, json).await
        }
        Commands::Pending { bot_ids } => cli::sync::show_pending(state, &bot_ids, json).await,
        Commands::Sync => cli::sync::run_sync(&scope, json).await,
        Commands::Mirror { folder } => cli::sync::mirror_to_disk(&scope, &folder, json).await,
        Commands::Export { dir, exclude } => {
            cli::transfer::export_scope(&scope, &dir, &exclude, json).await
        }
        Commands::Import { dir } => cli::transfer::import_scope(&scope, &dir, json).await,
        Commands::Status => cli::status::status(state, json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
