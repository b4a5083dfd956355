//! Commit command.

use super::open;
use anyhow::{bail, Context, Result};
use console::style;
use gitctx_core::{CommitRequest, OtaLog};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Record a commit on the current branch.
pub fn run(
    repo: &Path,
    message: Option<String>,
    decisions: Vec<String>,
    ota_files: &[PathBuf],
    use_staged: bool,
) -> Result<()> {
    let mut engine = open(repo)?;

    let mut logs = Vec::new();
    for path in ota_files {
        logs.extend(read_logs(path)?);
    }

    let message = match message {
        Some(message) => message,
        None => {
            let generated = engine.suggest_commit_message()?;
            println!("Generated message: {}", style(&generated).italic());
            generated
        }
    };

    let mut request = CommitRequest::new(message).ota_logs(logs);
    if !decisions.is_empty() {
        request = request.decisions(decisions);
    }
    if use_staged {
        request = request.use_staged();
    }

    let id = engine.commit(request)?;
    let commit = engine.show(id.as_str(), None)?;
    let branch = engine.current_branch()?;

    println!(
        "{} [{} {}] {}",
        style("✓").green(),
        branch,
        style(id.short()).yellow(),
        commit.message
    );
    if !commit.ota_logs.is_empty() {
        println!("  {} reasoning log(s) attached", commit.ota_logs.len());
    }
    for decision in &commit.decisions {
        println!("  {} {}", style("decision:").cyan(), decision);
    }
    for alt in &commit.alternatives {
        println!(
            "  {} {} ({})",
            style("rejected:").dim(),
            alt.what,
            alt.why_rejected
        );
    }
    Ok(())
}

/// Reads a JSON object or array of objects with `thought`, `action`,
/// `result` and optional `files_affected`.
fn read_logs(path: &Path) -> Result<Vec<OtaLog>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => bail!("{}: expected an object or an array", path.display()),
    };

    items
        .iter()
        .map(|item| {
            let field = |name: &str| item.get(name).and_then(Value::as_str).unwrap_or_default();
            let files = item
                .get("files_affected")
                .and_then(Value::as_array)
                .map(|files| {
                    files
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            if field("action").is_empty() {
                bail!("{}: every log needs an 'action'", path.display());
            }
            Ok(OtaLog::new(field("thought"), field("action"), field("result"), files))
        })
        .collect()
}
