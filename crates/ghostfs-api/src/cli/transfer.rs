//! Export and import between a scope and a local directory.

use std::path::Path;

use anyhow::Result;
use console::style;

use ghostfs_infra::filesystem::LocalFileSystem;

use crate::state::ConcreteScope;

pub async fn export_scope(
    scope: &ConcreteScope,
    dir: &str,
    exclude: &[String],
    json: bool,
) -> Result<()> {
    let written = scope
        .export_to_directory(&LocalFileSystem::new(), Path::new(dir), exclude)
        .await?;

    if json {
        let result = serde_json::json!({
            "scope": scope.scope().to_string(),
            "dir": dir,
            "files": written,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Exported {} file(s) from {} to {}",
            style("ok").green(),
            written,
            style(scope.scope()).cyan(),
            style(dir).dim(),
        );
        println!("     Ledger written to {}", style("revisions.json").dim());
        println!();
    }
    Ok(())
}

pub async fn import_scope(scope: &ConcreteScope, dir: &str, json: bool) -> Result<()> {
    let written = scope
        .import_from_directory(&LocalFileSystem::new(), Path::new(dir))
        .await?;

    if json {
        let result = serde_json::json!({
            "scope": scope.scope().to_string(),
            "dir": dir,
            "files": written,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Imported {} file(s) into {} ({} driver)",
            style("ok").green(),
            written,
            style(scope.scope()).cyan(),
            scope.mode(),
        );
        println!();
    }
    Ok(())
}
