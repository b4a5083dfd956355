//! Staging of reasoning logs.

use super::{local_time, open};
use anyhow::Result;
use console::style;
use gitctx_core::OtaLog;
use std::path::Path;

pub fn add(repo: &Path, thought: &str, action: &str, result: &str, files: Vec<String>) -> Result<()> {
    let engine = open(repo)?;
    let log = OtaLog::new(thought, action, result, files);
    engine.stage_ota(&log)?;

    let pending = engine.staged_ota()?.len();
    println!(
        "{} Staged log {} ({} pending)",
        style("✓").green(),
        style(&log.id).yellow(),
        pending
    );
    Ok(())
}

pub fn list(repo: &Path) -> Result<()> {
    let engine = open(repo)?;
    let logs = engine.staged_ota()?;

    if logs.is_empty() {
        println!("No staged reasoning logs");
        return Ok(());
    }
    for log in logs {
        println!(
            "{} {}",
            style(&log.id).yellow(),
            style(local_time(log.timestamp)).dim()
        );
        println!("  {}", log.summary());
        if !log.files_affected.is_empty() {
            println!("  {} {}", style("files:").dim(), log.files_affected.join(", "));
        }
    }
    Ok(())
}

pub fn clear(repo: &Path) -> Result<()> {
    let engine = open(repo)?;
    let removed = engine.clear_staged_ota()?;
    println!("{} Discarded {} staged log(s)", style("✓").green(), removed);
    Ok(())
}
