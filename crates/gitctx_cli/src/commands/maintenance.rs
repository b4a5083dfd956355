//! Housekeeping: archives, temp cleanup, configuration.

use super::open;
use anyhow::Result;
use console::style;
use gitctx_core::AnalysisConfig;
use std::path::Path;

pub fn archives(repo: &Path) -> Result<()> {
    let engine = open(repo)?;
    let dirs = engine.archives()?;

    if dirs.is_empty() {
        println!("No archived branches");
        return Ok(());
    }
    for dir in dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("{}  {}", style(name).cyan(), style(dir.display()).dim());
    }
    Ok(())
}

pub fn cleanup(repo: &Path, hours: u64) -> Result<()> {
    let engine = open(repo)?;
    let removed = engine.cleanup_temp(hours)?;
    println!(
        "{} Removed {} temp file(s) older than {}h",
        style("✓").green(),
        removed,
        hours
    );
    Ok(())
}

pub fn config(repo: &Path) -> Result<()> {
    let engine = open(repo)?;
    let config = engine.config();

    println!("{}", serde_json::to_string_pretty(config)?);

    let provider = &config.analysis.provider;
    if let Some(var) = AnalysisConfig::api_key_var(provider) {
        let state = if config.analysis.api_key.is_some() {
            style("set").green()
        } else {
            style("not set; the offline summarizer will be used").yellow()
        };
        println!("{var}: {state}");
    }
    Ok(())
}
