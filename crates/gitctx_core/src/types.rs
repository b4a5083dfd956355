//! Core data types for the context graph.

use crate::CommitId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form, string-keyed annotations.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Path → content fingerprint.
pub type FileSnapshot = BTreeMap<String, String>;

/// An approach that was considered and rejected.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    /// Description of the considered approach.
    pub what: String,
    /// Reason it was rejected.
    pub why_rejected: String,
}

impl Alternative {
    /// Creates an alternative record.
    pub fn new(what: impl Into<String>, why_rejected: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why_rejected: why_rejected.into(),
        }
    }
}

/// One recorded reasoning step: thought, action, result.
///
/// Logs are append-only and never mutated after creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OtaLog {
    /// Short random identifier.
    pub id: String,
    /// What was being considered.
    pub thought: String,
    /// What was done.
    pub action: String,
    /// What happened.
    pub result: String,
    /// When the step was recorded.
    pub timestamp: DateTime<Utc>,
    /// Paths touched by the action.
    #[serde(default)]
    pub files_affected: Vec<String>,
    /// Extra annotations.
    #[serde(default)]
    pub metadata: Metadata,
}

impl OtaLog {
    /// Records a new step stamped with the current time.
    pub fn new(
        thought: impl Into<String>,
        action: impl Into<String>,
        result: impl Into<String>,
        files_affected: Vec<String>,
    ) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            id: id[..8].to_string(),
            thought: thought.into(),
            action: action.into(),
            result: result.into(),
            timestamp: Utc::now(),
            files_affected,
            metadata: Metadata::new(),
        }
    }

    /// One-line summary: thought and result, each clipped to 50 characters.
    pub fn summary(&self) -> String {
        format!(
            "{} → {}",
            clip(&self.thought, 50),
            clip(&self.result, 50)
        )
    }
}

/// An immutable point in a branch's context history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Commit {
    /// Globally unique id.
    pub id: CommitId,
    /// Commit message.
    pub message: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Previous head of the branch; `None` only for a branch's first commit.
    pub parent: Option<CommitId>,
    /// Decisions recorded by this commit.
    #[serde(default)]
    pub decisions: Vec<String>,
    /// Rejected alternatives recorded by this commit.
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    /// Reasoning steps attached to this commit.
    #[serde(default)]
    pub ota_logs: Vec<OtaLog>,
    /// Tracked-file fingerprints at commit time.
    #[serde(default)]
    pub files_snapshot: FileSnapshot,
    /// Free-form annotations (insights, squash provenance, ...).
    #[serde(default)]
    pub metadata: Metadata,
}

impl Commit {
    /// Returns the squash provenance if this commit was synthesized by a squash merge.
    pub fn squash_metadata(&self) -> Option<SquashMetadata> {
        SquashMetadata::from_metadata(&self.metadata)
    }

    /// Returns the insights stored under `metadata.insights`, if any.
    pub fn insights(&self) -> Vec<String> {
        string_list(self.metadata.get("insights"))
    }
}

/// Provenance written into the metadata of a squash-merge commit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SquashMetadata {
    /// Always true; marks the commit as synthesized.
    pub squash_merge: bool,
    /// Branch that was squashed.
    pub source_branch: String,
    /// Number of commits the summary replaced.
    pub original_commits: usize,
    /// Key insights from the squash.
    pub insights: Vec<String>,
    /// Short description of what was built.
    pub architecture_summary: String,
}

impl SquashMetadata {
    /// Builds provenance from a squash result.
    pub fn from_result(result: &SquashResult) -> Self {
        Self {
            squash_merge: true,
            source_branch: result.branch_name.clone(),
            original_commits: result.original_commits,
            insights: result.key_insights.clone(),
            architecture_summary: result.architecture_summary.clone(),
        }
    }

    /// Flattens into a metadata map.
    pub fn to_metadata(&self) -> Metadata {
        let mut map = Metadata::new();
        map.insert("squash_merge".into(), serde_json::Value::Bool(self.squash_merge));
        map.insert(
            "source_branch".into(),
            serde_json::Value::String(self.source_branch.clone()),
        );
        map.insert(
            "original_commits".into(),
            serde_json::Value::from(self.original_commits),
        );
        map.insert("insights".into(), serde_json::Value::from(self.insights.clone()));
        map.insert(
            "architecture_summary".into(),
            serde_json::Value::String(self.architecture_summary.clone()),
        );
        map
    }

    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        if metadata.get("squash_merge")?.as_bool()? {
            let value = serde_json::Value::Object(
                metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            );
            serde_json::from_value(value).ok()
        } else {
            None
        }
    }
}

/// Structured extraction from a window of reasoning logs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogAnalysis {
    /// Decisions taken.
    #[serde(default)]
    pub decisions: Vec<String>,
    /// Alternatives considered and rejected.
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    /// Learnings.
    #[serde(default)]
    pub insights: Vec<String>,
}

impl LogAnalysis {
    /// True if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty() && self.alternatives.is_empty() && self.insights.is_empty()
    }
}

/// Distilled summary of a whole branch, produced by a squash merge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SquashResult {
    /// Decisions that were actually implemented, deduplicated.
    pub decisions: Vec<String>,
    /// Alternatives seriously considered and rejected.
    pub rejected_alternatives: Vec<Alternative>,
    /// Key learnings, at most [`SquashResult::MAX_INSIGHTS`].
    pub key_insights: Vec<String>,
    /// A few sentences on what was built.
    pub architecture_summary: String,
    /// Number of reasoning logs consumed.
    pub ota_count: usize,
    /// Number of commits consumed.
    pub original_commits: usize,
    /// Source branch.
    pub branch_name: String,
    /// When the merge ran.
    pub merged_at: DateTime<Utc>,
}

impl SquashResult {
    /// Upper bound on `key_insights`.
    pub const MAX_INSIGHTS: usize = 5;

    /// Summary used when a branch has no commits to squash.
    pub const EMPTY_SUMMARY: &'static str = "No commits in branch";

    /// The zero-valued result for an empty branch.
    pub fn empty(branch_name: &str, merged_at: DateTime<Utc>) -> Self {
        Self {
            decisions: vec![],
            rejected_alternatives: vec![],
            key_insights: vec![],
            architecture_summary: Self::EMPTY_SUMMARY.to_string(),
            ota_count: 0,
            original_commits: 0,
            branch_name: branch_name.to_string(),
            merged_at,
        }
    }

    /// Renders the result as a markdown document.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            format!("# Squash Merge: {}", self.branch_name),
            String::new(),
            format!("Merged: {}", self.merged_at.format("%Y-%m-%d %H:%M")),
            format!("Original commits: {} → summarized", self.original_commits),
            format!("OTA logs: {}", self.ota_count),
            String::new(),
            "## Final Decisions".to_string(),
        ];
        lines.extend(self.decisions.iter().map(|d| format!("- {d}")));

        lines.push(String::new());
        lines.push("## Rejected Alternatives".to_string());
        lines.extend(
            self.rejected_alternatives
                .iter()
                .map(|a| format!("- **{}**: {}", a.what, a.why_rejected)),
        );

        lines.push(String::new());
        lines.push("## Key Insights".to_string());
        lines.extend(self.key_insights.iter().map(|i| format!("- {i}")));

        lines.push(String::new());
        lines.push("## Architecture Summary".to_string());
        lines.push(self.architecture_summary.clone());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Lightweight snapshot of the merge target, handed to the analysis provider.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentContext {
    /// Checked-out branch.
    pub branch: String,
    /// Message of its head commit.
    pub latest_commit: Option<String>,
    /// Decisions of its head commit.
    pub decisions: Vec<String>,
    /// First tracked files of the source repository.
    pub files: Vec<String>,
}

/// Result of [`crate::ContextEngine::status`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Checked-out branch.
    pub current_branch: String,
    /// Number of commit ids on that branch.
    pub commits: usize,
    /// Message of the head commit.
    pub latest_commit: Option<String>,
    /// Id of the head commit.
    pub latest_commit_id: Option<CommitId>,
    /// True if the tracked files differ from the head commit's snapshot.
    pub uncommitted_changes: bool,
    /// Every branch in the index.
    pub all_branches: Vec<String>,
    /// Reasoning logs staged in `temp/` and not yet committed.
    pub pending_ota_logs: usize,
}

/// One row of [`crate::ContextEngine::branches`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BranchSummary {
    /// Branch name.
    pub name: String,
    /// Branch it was created from.
    pub parent: Option<String>,
    /// Number of commit ids.
    pub commits: usize,
    /// Head commit.
    pub head: Option<CommitId>,
    /// True for the checked-out branch.
    pub is_current: bool,
}

/// Compares two snapshots; true if any path was added, removed or changed.
pub fn snapshot_differs(previous: &FileSnapshot, current: &FileSnapshot) -> bool {
    previous != current
}

pub(crate) fn string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
