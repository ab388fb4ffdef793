//! CLI command definitions for the `ghostfs` binary.
//!
//! Uses clap derive macros for argument parsing. Every file command works on
//! one scope: global by default, `--bot <id>` for a single bot, `--bots` for
//! every bot at once.

pub mod files;
pub mod status;
pub mod sync;
pub mod transfer;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Read, write and sync the ghost file store.
#[derive(Parser)]
#[command(name = "ghostfs", version, about, long_about = None)]
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
    #[arg(long, global = true)]
    pub otel: bool,

    /// Work in one bot's scope instead of the global one.
    #[arg(long, global = true, conflicts_with = "bots")]
    pub bot: Option<String>,

    /// Work in the scope holding every bot.
    #[arg(long, global = true)]
    pub bots: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List files in a folder.
    Ls {
        /// Folder relative to the scope root.
        #[arg(default_value = "")]
        folder: String,

        /// Glob the listed paths must match (`*.json`, `**/flows/*`).
        #[arg(long, short)]
        pattern: Option<String>,

        /// Glob of paths to leave out. Repeatable.
        #[arg(long, short = 'x')]
        exclude: Vec<String>,

        /// Include files and folders starting with a dot.
        #[arg(long, short)]
        all: bool,
    },

    /// Print a file to stdout.
    Cat {
        /// File path relative to the scope root.
        path: String,
    },

    /// Create or overwrite a file.
    Put {
        /// File path relative to the scope root.
        path: String,

        /// Local file to read the content from (stdin when omitted).
        #[arg(long, short)]
        from: Option<String>,

        /// Do not record a revision in the database ledger.
        #[arg(long)]
        untracked: bool,
    },

    /// Delete a file.
    Rm {
        /// File path relative to the scope root.
        path: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Rename a file within its folder.
    Mv {
        /// File path relative to the scope root.
        path: String,

        /// New file name.
        new_name: String,
    },

    /// Show database revisions disk has not caught up with.
    Pending {
        /// Bots to report besides the global scope.
        bot_ids: Vec<String>,
    },

    /// Publish disk content into the database and retire its ledger.
    Sync,

    /// Copy database files of a folder back onto disk.
    Mirror {
        /// Folder relative to the scope root.
        #[arg(default_value = "")]
        folder: String,
    },

    /// Export the scope into a directory, with its ledger as revisions.json.
    Export {
        /// Target directory.
        dir: String,

        /// Glob of paths to leave out. Repeatable.
        #[arg(long, short = 'x')]
        exclude: Vec<String>,
    },

    /// Import every file under a directory into the scope.
    Import {
        /// Source directory.
        dir: String,
    },

    /// Driver, cache and ledger status.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Split `a/b/c.json` into folder `a/b` and file `c.json`.
pub fn split_path(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((folder, file)) => (folder, file),
        None => ("", trimmed),
    }
}
