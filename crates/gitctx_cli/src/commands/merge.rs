//! Merge command.

use super::open;
use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Merge `branch` into the current branch.
pub fn run(repo: &Path, branch: &str, squash: bool) -> Result<()> {
    let mut engine = open(repo)?;
    let target = engine.current_branch()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(if squash {
        format!("Squashing {branch} into {target} via {}...", engine.provider_name())
    } else {
        format!("Merging {branch} into {target}...")
    });
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = engine.merge(branch, squash);
    spinner.finish_and_clear();
    let outcome = outcome?;

    let result = &outcome.result;
    println!(
        "{} Merged {} into {} ({})",
        style("✓").green(),
        style(&outcome.source_branch).cyan(),
        style(&outcome.target_branch).cyan(),
        if outcome.squashed { "squash" } else { "simple" }
    );
    println!(
        "  Commits: {}  Reasoning logs: {}",
        result.original_commits, result.ota_count
    );
    for id in &outcome.commit_ids {
        println!("  {} {}", style("commit").dim(), style(id.short()).yellow());
    }

    if outcome.squashed {
        println!();
        println!("{}", style("Summary:").bold());
        println!("  {}", result.architecture_summary);
        if !result.decisions.is_empty() {
            println!("{}", style("Decisions:").bold());
            for decision in &result.decisions {
                println!("  - {decision}");
            }
        }
        if !result.rejected_alternatives.is_empty() {
            println!("{}", style("Rejected alternatives:").bold());
            for alt in &result.rejected_alternatives {
                println!("  - {}: {}", alt.what, alt.why_rejected);
            }
        }
        if !result.key_insights.is_empty() {
            println!("{}", style("Insights:").bold());
            for insight in &result.key_insights {
                println!("  - {insight}");
            }
        }
    }

    match &outcome.archive {
        Some(dir) => println!("\nArchived to {}", style(dir.display()).dim()),
        None if outcome.squashed => println!(
            "\n{} Branch history was not archived; see the warning above",
            style("⚠").yellow()
        ),
        None => {}
    }

    if engine.analysis_fallbacks() > 0 {
        println!(
            "{} {} was unavailable; used the offline summarizer",
            style("ℹ").blue(),
            engine.provider_name()
        );
    }
    Ok(())
}
