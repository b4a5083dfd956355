//! Prompt construction and response parsing shared by every network backend.
//!
//! Backends differ only in transport. The logical fields sent are always the
//! same: commit messages, flattened decisions, flattened alternatives, the
//! reasoning-log count and the merge target's context capped at
//! [`CONTEXT_CHAR_LIMIT`] characters.

use crate::types::{Alternative, Commit, CurrentContext, LogAnalysis, OtaLog, SquashResult};
use serde_json::Value;

/// Cap on the serialized current-context snapshot embedded in a squash prompt.
pub const CONTEXT_CHAR_LIMIT: usize = 1000;

pub(crate) fn analyze_logs_prompt(logs: &[OtaLog], window: usize) -> String {
    let start = logs.len().saturating_sub(window.max(1));
    let entries: Vec<String> = logs[start..]
        .iter()
        .map(|log| {
            format!(
                "Timestamp: {}\nThought: {}\nAction: {}\nResult: {}\nFiles: {}",
                log.timestamp.to_rfc3339(),
                log.thought,
                log.action,
                log.result,
                log.files_affected.join(", ")
            )
        })
        .collect();

    format!(
        r#"You are analyzing AI development logs. Extract key information.

Logs:
{}

Extract and return as JSON:
1. "decisions": list of key decisions made (what was decided)
2. "alternatives": list of {{"what": "...", "why_rejected": "..."}} for alternatives considered but rejected
3. "insights": list of important learnings or realizations

Return ONLY valid JSON, no other text."#,
        entries.join("\n---\n")
    )
}

pub(crate) fn squash_prompt(
    branch: &str,
    commits: &[Commit],
    current: Option<&CurrentContext>,
) -> String {
    let messages: Vec<String> = commits
        .iter()
        .map(|c| format!("- {}: {}", c.timestamp.format("%Y-%m-%d %H:%M"), c.message))
        .collect();
    let decisions: Vec<&String> = commits.iter().flat_map(|c| &c.decisions).collect();
    let alternatives: Vec<&Alternative> = commits.iter().flat_map(|c| &c.alternatives).collect();
    let ota_count: usize = commits.iter().map(|c| c.ota_logs.len()).sum();

    format!(
        r#"You are analyzing the complete development history of branch '{branch}'.

COMMITS ({count}):
{messages}

DECISIONS MADE:
{decisions}

ALTERNATIVES CONSIDERED:
{alternatives}

OTA LOGS COUNT: {ota_count}

CURRENT CONTEXT:
{context}

Create a SQUASHED summary that captures the essence of this development. Focus on the FINAL OUTCOME.

Return as JSON with:
1. "decisions": list of FINAL architectural decisions that were actually implemented (deduplicate, remove experiments)
2. "rejected_alternatives": list of {{"what": "...", "why_rejected": "..."}} for seriously considered alternatives
3. "key_insights": list of important learnings (max 5)
4. "architecture_summary": string describing what was actually built (2-3 sentences)

Return ONLY valid JSON."#,
        count = commits.len(),
        messages = messages.join("\n"),
        decisions = pretty(&decisions),
        alternatives = pretty(&alternatives),
        context = context_excerpt(current),
    )
}

pub(crate) fn commit_message_prompt(changes: &[String]) -> String {
    let lines: Vec<String> = changes.iter().map(|c| format!("- {c}")).collect();
    format!(
        "Generate a concise git commit message based on these changes:\n\n\
         Changes:\n{}\n\n\
         The first line must be under 50 characters, in imperative mood.\n\
         Return ONLY the commit message, no other text.",
        lines.join("\n")
    )
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// Serialized snapshot of the merge target, clipped to [`CONTEXT_CHAR_LIMIT`] characters.
pub fn context_excerpt(current: Option<&CurrentContext>) -> String {
    match current {
        None => "None".to_string(),
        Some(ctx) => pretty(ctx).chars().take(CONTEXT_CHAR_LIMIT).collect(),
    }
}

/// Finds the structured object in a model response.
///
/// A fenced block (```` ```json ```` or bare ```` ``` ````) is unwrapped first.
/// If the remaining text is not a JSON object on its own, the first
/// well-formed object embedded in it is returned.
///
/// # Examples
///
/// ```
/// use gitctx_core::analysis::extract_json;
///
/// let v = extract_json("Sure!\n```json\n{\"decisions\": [\"Use X\"]}\n```").unwrap();
/// assert_eq!(v["decisions"][0], "Use X");
/// assert!(extract_json("no json here").is_none());
/// ```
pub fn extract_json(response: &str) -> Option<Value> {
    let text = unfence(response).trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            return Some(value);
        }
    }
    None
}

fn unfence(response: &str) -> &str {
    let body_start = match response.find("```json") {
        Some(i) => i + "```json".len(),
        None => match response.find("```") {
            Some(i) => i + 3,
            None => return response,
        },
    };
    let body = &response[body_start..];
    match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    }
}

fn strings(value: &Value, key: &str) -> Vec<String> {
    crate::types::string_list(value.get(key))
}

fn alternatives(value: &Value, key: &str) -> Vec<Alternative> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let what = item.get("what")?.as_str()?;
                    let why = item
                        .get("why_rejected")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    Some(Alternative::new(what, why))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reads a log analysis out of a response; malformed fields come back empty.
pub(crate) fn parse_log_analysis(response: &str) -> Option<LogAnalysis> {
    let value = extract_json(response)?;
    Some(LogAnalysis {
        decisions: strings(&value, "decisions"),
        alternatives: alternatives(&value, "alternatives"),
        insights: strings(&value, "insights"),
    })
}

/// Fills the model-provided fields of `base` from a response.
///
/// Returns `None` if no object could be found, leaving `base` untouched.
pub(crate) fn parse_squash(response: &str, mut base: SquashResult) -> Option<SquashResult> {
    let value = extract_json(response)?;
    base.decisions = strings(&value, "decisions");
    base.rejected_alternatives = alternatives(&value, "rejected_alternatives");
    base.key_insights = strings(&value, "key_insights");
    base.key_insights.truncate(SquashResult::MAX_INSIGHTS);
    base.architecture_summary = value
        .get("architecture_summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(base)
}
