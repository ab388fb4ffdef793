//! File commands: ls, cat, put, rm, mv.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use ghostfs_core::ghost::{ListingOptions, UpsertOptions};

use crate::cli::split_path;
use crate::state::ConcreteScope;

/// List files under `folder`, filtered by `pattern` and `exclude`.
pub async fn list_files(
    scope: &ConcreteScope,
    folder: &str,
    pattern: Option<&str>,
    exclude: Vec<String>,
    all: bool,
    json: bool,
) -> Result<()> {
    let mut options = ListingOptions::excluding(exclude);
    if all {
        options = options.with_dot_files();
    }
    let files = scope.directory_listing(folder, pattern, &options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!();
        println!(
            "  {} No files under '{}' in {}.",
            style("i").blue().bold(),
            style(if folder.is_empty() { "." } else { folder }).cyan(),
            style(scope.scope()).cyan(),
        );
        println!();
        return Ok(());
    }

    println!();
    println!(
        "  Files in {} ({} files, {} driver)",
        style(scope.scope()).cyan(),
        files.len(),
        scope.mode(),
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Path").fg(Color::White)]);
    for file in &files {
        table.add_row(vec![Cell::new(file).fg(Color::Cyan)]);
    }

    println!("{table}");
    println!();
    Ok(())
}

/// Write a file's bytes to stdout.
pub async fn cat_file(scope: &ConcreteScope, path: &str, json: bool) -> Result<()> {
    let (folder, file) = split_path(path);
    let content = scope.read_file_as_buffer(folder, file).await?;

    if json {
        let result = serde_json::json!({
            "path": scope.path(folder, file)?.to_string(),
            "size_bytes": content.len(),
            "content": String::from_utf8_lossy(&content),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}

/// Create or overwrite a file from a local file or stdin.
pub async fn put_file(
    scope: &ConcreteScope,
    path: &str,
    from: Option<&str>,
    untracked: bool,
    json: bool,
) -> Result<()> {
    let content = match from {
        Some(source) => tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read file: {source}"))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let options = if untracked {
        UpsertOptions::untracked()
    } else {
        UpsertOptions::default()
    };
    let (folder, file) = split_path(path);
    scope.upsert_file_with(folder, file, &content, options).await?;

    if json {
        let result = serde_json::json!({
            "path": scope.path(folder, file)?.to_string(),
            "size_bytes": content.len(),
            "tracked": options.record_revision,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Wrote '{}' to {}",
            style("ok").green(),
            style(path).cyan(),
            style(scope.scope()).cyan(),
        );
        println!("     {} bytes  |  driver: {}", content.len(), scope.mode());
        println!();
    }
    Ok(())
}

/// Delete a file, asking for confirmation unless `force`.
pub async fn remove_file(scope: &ConcreteScope, path: &str, force: bool, json: bool) -> Result<()> {
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '{path}' from {}?", scope.scope()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let (folder, file) = split_path(path);
    scope.delete_file(folder, file).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": path }));
    } else {
        println!(
            "  {} Deleted '{}'",
            style("ok").green(),
            style(path).cyan()
        );
    }
    Ok(())
}

/// Rename a file within its folder.
pub async fn rename_file(scope: &ConcreteScope, path: &str, new_name: &str, json: bool) -> Result<()> {
    let (folder, file) = split_path(path);
    scope.rename_file(folder, file, new_name).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "from": path, "to": new_name, "folder": folder })
        );
    } else {
        println!(
            "  {} Renamed '{}' -> '{}'",
            style("ok").green(),
            style(path).cyan(),
            style(new_name).cyan(),
        );
    }
    Ok(())
}
