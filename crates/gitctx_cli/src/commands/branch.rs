//! Branch management commands.

use super::open;
use anyhow::Result;
use console::style;
use std::path::Path;

/// Create a branch, optionally checking it out.
pub fn create(repo: &Path, name: &str, from: Option<&str>, checkout: bool) -> Result<()> {
    let mut engine = open(repo)?;
    engine.branch(name, from)?;

    let source = match from {
        Some(from) => from.to_string(),
        None => engine.current_branch()?,
    };
    println!(
        "{} Created branch {} from {}",
        style("✓").green(),
        style(name).cyan(),
        source
    );

    if checkout {
        engine.checkout(name)?;
        println!("Switched to branch {}", style(name).cyan());
    }
    Ok(())
}

/// List all branches; the current one is starred.
pub fn list(repo: &Path) -> Result<()> {
    let mut engine = open(repo)?;

    for branch in engine.branches()? {
        let marker = if branch.is_current { "*" } else { " " };
        let name = if branch.is_current {
            style(branch.name).green().bold()
        } else {
            style(branch.name)
        };
        let parent = branch
            .parent
            .map(|p| format!(" (from {p})"))
            .unwrap_or_default();
        println!(
            "{} {} {}{}",
            marker,
            name,
            style(format!("[{} commits]", branch.commits)).dim(),
            style(parent).dim()
        );
    }
    Ok(())
}

/// Switch to another branch.
pub fn checkout(repo: &Path, name: &str) -> Result<()> {
    let mut engine = open(repo)?;
    engine.checkout(name)?;
    println!("Switched to branch {}", style(name).cyan());
    Ok(())
}

/// Delete a branch without merging it.
pub fn delete(repo: &Path, name: &str) -> Result<()> {
    let mut engine = open(repo)?;
    engine.delete_branch(name)?;
    println!("{} Deleted branch {}", style("✓").green(), name);
    Ok(())
}
