//! Ledger and sync commands: pending, sync, mirror.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use ghostfs_types::error::GhostError;
use ghostfs_types::revision::PendingChanges;
use ghostfs_types::scope::BotId;

use crate::state::{AppState, ConcreteScope};

fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}

/// Show revisions the database holds that disk has not caught up with.
pub async fn show_pending(state: &AppState, bot_ids: &[String], json: bool) -> Result<()> {
    let ids = bot_ids
        .iter()
        .map(|id| BotId::parse(id))
        .collect::<Result<Vec<_>, _>>()?;
    let pending = state.ghost.pending(&ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pending)?);
        return Ok(());
    }

    println!();
    if pending.is_empty() {
        println!(
            "  {} Disk is up to date with the database ({} driver).",
            style("ok").green(),
            state.ghost.mode(),
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Scope").fg(Color::White),
        Cell::new("Folder").fg(Color::White),
        Cell::new("Revisions").fg(Color::White),
        Cell::new("Latest path").fg(Color::White),
    ]);

    add_rows(&mut table, "global", &pending.global);
    for (bot, changes) in &pending.bots {
        add_rows(&mut table, &format!("bot:{bot}"), changes);
    }

    println!("{table}");
    println!();
    Ok(())
}

fn add_rows(table: &mut Table, scope: &str, changes: &PendingChanges) {
    for (group, revisions) in &changes.groups {
        let latest = revisions.last().map(|r| r.path.as_str()).unwrap_or("");
        table.add_row(vec![
            Cell::new(scope).fg(Color::Cyan),
            Cell::new(group),
            Cell::new(revisions.len()),
            Cell::new(latest).fg(Color::DarkGrey),
        ]);
    }
}

/// Publish disk content into the database for the selected scope.
pub async fn run_sync(scope: &ConcreteScope, json: bool) -> Result<()> {
    let spinner = (!json)
        .then(|| spinner(format!("Syncing {}...", scope.scope())))
        .transpose()?;

    let result = scope.sync().await;
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }

    let report = match result {
        Ok(report) => report,
        Err(err @ GhostError::SyncPrecondition { .. }) if !json => {
            println!();
            println!("  {} {err}", style("!!").red().bold());
            println!(
                "     Export the scope and commit the tree to disk, then sync again: {}",
                style("ghostfs export <dir>").dim(),
            );
            println!();
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    if report.skipped {
        println!(
            "  {} Disk driver active, nothing to sync for {}.",
            style("i").blue().bold(),
            style(&report.scope).cyan(),
        );
    } else {
        println!(
            "  {} Synced {}",
            style("ok").green(),
            style(&report.scope).cyan()
        );
        println!(
            "     Revisions retired: {}  |  Upserted: {}  |  Deleted: {}",
            report.revisions_retired, report.files_upserted, report.files_deleted,
        );
    }
    println!();
    Ok(())
}

/// Copy database files under `folder` back onto disk.
pub async fn mirror_to_disk(scope: &ConcreteScope, folder: &str, json: bool) -> Result<()> {
    let copied = scope.sync_database_files_to_disk(folder).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "scope": scope.scope().to_string(), "folder": folder, "copied": copied })
        );
    } else {
        println!(
            "  {} Copied {} file(s) from the database to disk ({} driver)",
            style("ok").green(),
            copied,
            scope.mode(),
        );
    }
    Ok(())
}
