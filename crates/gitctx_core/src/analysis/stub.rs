//! Deterministic offline provider.

use super::AnalysisProvider;
use crate::error::Result;
use crate::types::{Alternative, Commit, CurrentContext, LogAnalysis, OtaLog, SquashResult};
use chrono::{DateTime, Utc};

/// Derives analyses from the input alone, without any backend.
///
/// The same input always yields the same output, which makes the stub
/// usable both as a test double and as the fallback for failed backends.
///
/// - `analyze_logs`: decisions are the distinct actions, insights the
///   distinct results (at most five), and alternatives come from thoughts
///   written as `rejected <what>: <why>`.
/// - `squash_history`: decisions and alternatives are the distinct ones
///   across all commits in order, insights come from each commit's
///   `metadata.insights`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubProvider;

const REJECTED_PREFIX: &str = "rejected ";

fn push_distinct(items: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !items.iter().any(|i| i == value) {
        items.push(value.to_string());
    }
}

fn parse_rejection(thought: &str) -> Option<Alternative> {
    let thought = thought.trim();
    let head = thought.get(..REJECTED_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(REJECTED_PREFIX) {
        return None;
    }
    let rest = &thought[REJECTED_PREFIX.len()..];
    let (what, why) = rest.split_once(':')?;
    let what = what.trim();
    (!what.is_empty()).then(|| Alternative::new(what, why.trim()))
}

impl AnalysisProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn analyze_logs(&self, logs: &[OtaLog]) -> Result<LogAnalysis> {
        let mut analysis = LogAnalysis::default();
        for log in logs {
            push_distinct(&mut analysis.decisions, &log.action);
            if analysis.insights.len() < SquashResult::MAX_INSIGHTS {
                push_distinct(&mut analysis.insights, &log.result);
            }
            if let Some(alt) = parse_rejection(&log.thought) {
                if !analysis.alternatives.iter().any(|a| a.what == alt.what) {
                    analysis.alternatives.push(alt);
                }
            }
        }
        Ok(analysis)
    }

    fn squash_history(
        &self,
        branch: &str,
        commits: &[Commit],
        _current: Option<&CurrentContext>,
        merged_at: DateTime<Utc>,
    ) -> Result<SquashResult> {
        let mut result = SquashResult::empty(branch, merged_at);
        let Some(last) = commits.last() else {
            return Ok(result);
        };

        for commit in commits {
            for decision in &commit.decisions {
                push_distinct(&mut result.decisions, decision);
            }
            for alt in &commit.alternatives {
                if !result.rejected_alternatives.iter().any(|a| a.what == alt.what) {
                    result.rejected_alternatives.push(alt.clone());
                }
            }
            for insight in commit.insights() {
                if result.key_insights.len() < SquashResult::MAX_INSIGHTS {
                    push_distinct(&mut result.key_insights, &insight);
                }
            }
        }

        result.ota_count = commits.iter().map(|c| c.ota_logs.len()).sum();
        result.original_commits = commits.len();
        result.architecture_summary = format!(
            "Squashed {} commit(s) from '{}': {}",
            commits.len(),
            branch,
            last.message
        );
        Ok(result)
    }

    fn generate_commit_message(&self, changes: &[String]) -> Result<String> {
        Ok(match changes {
            [] => "Update context".to_string(),
            [only] => format!("Update {only}"),
            [first, rest @ ..] => format!("Update {first} and {} more", rest.len()),
        })
    }
}
