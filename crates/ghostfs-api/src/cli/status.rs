//! System status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display driver, ledger and cache status.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let global = state.ghost.global();
    let pending = global.pending_changes().await?;
    let bots_pending = state.ghost.bots().pending_changes().await?;
    let cache = state.ghost.cache_stats();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "database_url": state.database_url,
            "driver": state.ghost.mode(),
            "pending": {
                "global": pending.revision_count(),
                "bots": bots_pending.revision_count(),
            },
            "cache": cache,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} ghostfs v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Driver ──").dim());
    println!("  Active:   {}", style(state.ghost.mode()).bold());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style(&state.database_url).dim());
    println!();

    println!("  {}", style("── Ledger ──").dim());
    let count = |n: usize| {
        if n == 0 {
            style(n.to_string()).green()
        } else {
            style(n.to_string()).yellow()
        }
    };
    println!("  Global pending: {}", count(pending.revision_count()));
    println!("  Bots pending:   {}", count(bots_pending.revision_count()));
    println!();

    println!("  {}", style("── Cache ──").dim());
    println!("  Entries: {}", cache.entries);
    println!("  Hits:    {}", cache.hits);
    println!("  Misses:  {}", cache.misses);
    println!();

    Ok(())
}
