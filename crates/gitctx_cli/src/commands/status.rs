//! Status command.

use super::open;
use anyhow::Result;
use console::style;
use std::path::Path;

/// Print the current branch, its head and pending work.
pub fn run(repo: &Path, json: bool) -> Result<()> {
    let mut engine = open(repo)?;
    let status = engine.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("On branch {}", style(&status.current_branch).green().bold());
    println!("Commits: {}", status.commits);
    match (&status.latest_commit_id, &status.latest_commit) {
        (Some(id), Some(message)) => {
            println!("Latest:  {} {}", style(id.short()).yellow(), message)
        }
        _ => println!("Latest:  {}", style("none").dim()),
    }

    if status.uncommitted_changes {
        println!();
        println!("{} Tracked files changed since the last commit:", style("⚠").yellow());
        for path in engine.changed_files()? {
            println!("  {}", style(path).red());
        }
    }
    if status.pending_ota_logs > 0 {
        println!();
        println!("{}", staged_notice(status.pending_ota_logs));
    }

    println!();
    println!("Branches: {}", status.all_branches.join(", "));
    Ok(())
}

/// Hint printed while reasoning logs wait in staging.
fn staged_notice(pending: usize) -> String {
    format!(
        "{} reasoning log(s) staged; attach them with `gitctx commit --staged`",
        style(pending).cyan()
    )
}
