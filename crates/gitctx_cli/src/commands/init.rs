//! Initialize a context repository.

use anyhow::{Context, Result};
use console::style;
use gitctx_core::{ContextEngine, EngineOptions, InitOutcome};
use std::path::Path;

/// Initialize a context repository under `repo`.
pub fn run(repo: &Path) -> Result<()> {
    let mut engine = ContextEngine::new(repo, EngineOptions::default())
        .context("Failed to load configuration")?;

    let seed = match engine.init().context("Failed to initialize context repository")? {
        InitOutcome::AlreadyInitialized => {
            println!(
                "{} Context repository already exists at {}",
                style("ℹ").blue(),
                engine.context_dir().display()
            );
            return Ok(());
        }
        InitOutcome::Created(seed) => seed,
    };

    let dir = engine.context_dir().display().to_string();
    println!(
        "{} Initialized context repository in {}",
        style("✓").green(),
        dir
    );
    println!();
    println!("Directory structure:");
    println!("  {dir}/contexts/main/       - History of the main branch");
    println!("  {dir}/contexts/branches/   - History of every other branch");
    println!("  {dir}/archive/             - Squashed branches");
    println!("  {dir}/temp/                - Staged reasoning logs (gitignored)");
    println!();
    println!(
        "Analysis provider: {} (edit {dir}/config.toml to change)",
        style(engine.provider_name()).cyan()
    );
    println!("Initial commit: {}", style(seed.short()).yellow());

    Ok(())
}
