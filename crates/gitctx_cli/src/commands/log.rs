//! History inspection: log and show.

use super::{local_time, open};
use crate::LogFormat;
use anyhow::Result;
use console::style;
use gitctx_core::Commit;
use std::path::Path;

/// Print the last `limit` commits, newest first (JSON stays oldest first).
pub fn log(repo: &Path, branch: Option<&str>, limit: usize, format: LogFormat) -> Result<()> {
    let mut engine = open(repo)?;
    let commits = engine.log(branch, limit)?;

    if format == LogFormat::Json {
        println!("{}", serde_json::to_string_pretty(&commits)?);
        return Ok(());
    }
    if commits.is_empty() {
        println!("No commits");
        return Ok(());
    }
    for commit in commits.iter().rev() {
        print_header(commit);
        if format == LogFormat::Oneline {
            continue;
        }
        for decision in &commit.decisions {
            println!("    {} {}", style("decision:").cyan(), decision);
        }
        if let Some(meta) = commit.squash_metadata() {
            println!(
                "    {} {} ({} commits)",
                style("squashed:").magenta(),
                meta.source_branch,
                meta.original_commits
            );
        }
        println!();
    }
    Ok(())
}

fn print_header(commit: &Commit) {
    println!(
        "{} {}  {}",
        style(commit.id.short()).yellow(),
        commit.message,
        style(local_time(commit.timestamp)).dim()
    );
}

/// Print one commit in full.
pub fn show(repo: &Path, id: &str, branch: Option<&str>, json: bool) -> Result<()> {
    let mut engine = open(repo)?;
    let commit = engine.show(id, branch)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&commit)?);
        return Ok(());
    }

    println!("{} {}", style("commit").yellow(), style(&commit.id).yellow());
    if let Some(parent) = &commit.parent {
        println!("Parent: {parent}");
    }
    println!("Date:   {}", local_time(commit.timestamp));
    println!();
    println!("    {}", commit.message);
    println!();

    if !commit.decisions.is_empty() {
        println!("{}", style("Decisions:").bold());
        for decision in &commit.decisions {
            println!("  - {decision}");
        }
    }
    if !commit.alternatives.is_empty() {
        println!("{}", style("Rejected alternatives:").bold());
        for alt in &commit.alternatives {
            println!("  - {}: {}", alt.what, alt.why_rejected);
        }
    }
    let insights = commit.insights();
    if !insights.is_empty() {
        println!("{}", style("Insights:").bold());
        for insight in insights {
            println!("  - {insight}");
        }
    }
    if !commit.ota_logs.is_empty() {
        println!("{}", style("Reasoning logs:").bold());
        for log in &commit.ota_logs {
            println!("  [{}] {}", log.id, log.summary());
        }
    }
    println!(
        "{}",
        style(format!("{} file(s) in snapshot", commit.files_snapshot.len())).dim()
    );
    Ok(())
}
