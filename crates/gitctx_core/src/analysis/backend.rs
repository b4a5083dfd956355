//! Provider built on top of a prompt-in, text-out chat backend.

use super::prompt;
use super::AnalysisProvider;
use crate::error::Result;
use crate::types::{Commit, CurrentContext, LogAnalysis, OtaLog, SquashResult};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// A single request/response exchange with a model.
pub trait ChatBackend: Send + Sync {
    /// Provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Sends one prompt and returns the raw reply.
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Turns any [`ChatBackend`] into an [`AnalysisProvider`].
///
/// Empty inputs are answered locally without contacting the backend.
/// Replies without a recognizable object degrade to empty results.
pub struct BackendProvider<B> {
    backend: B,
    log_window: usize,
}

impl<B: ChatBackend> BackendProvider<B> {
    /// Wraps `backend`, sending at most `log_window` recent logs per analysis.
    pub fn new(backend: B, log_window: usize) -> Self {
        Self {
            backend,
            log_window,
        }
    }
}

impl<B: ChatBackend> AnalysisProvider for BackendProvider<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn analyze_logs(&self, logs: &[OtaLog]) -> Result<LogAnalysis> {
        if logs.is_empty() {
            return Ok(LogAnalysis::default());
        }

        let reply = self
            .backend
            .complete(&prompt::analyze_logs_prompt(logs, self.log_window))?;

        Ok(prompt::parse_log_analysis(&reply).unwrap_or_else(|| {
            warn!(provider = self.name(), "no JSON object in log analysis reply");
            LogAnalysis::default()
        }))
    }

    fn squash_history(
        &self,
        branch: &str,
        commits: &[Commit],
        current: Option<&CurrentContext>,
        merged_at: DateTime<Utc>,
    ) -> Result<SquashResult> {
        let mut base = SquashResult::empty(branch, merged_at);
        if commits.is_empty() {
            return Ok(base);
        }

        base.original_commits = commits.len();
        base.ota_count = commits.iter().map(|c| c.ota_logs.len()).sum();
        base.architecture_summary = String::new();

        debug!(provider = self.name(), %branch, commits = commits.len(), "requesting squash summary");
        let reply = self
            .backend
            .complete(&prompt::squash_prompt(branch, commits, current))?;

        match prompt::parse_squash(&reply, base.clone()) {
            Some(result) => Ok(result),
            None => {
                warn!(provider = self.name(), %branch, "no JSON object in squash reply");
                Ok(base)
            }
        }
    }

    fn generate_commit_message(&self, changes: &[String]) -> Result<String> {
        let reply = self
            .backend
            .complete(&prompt::commit_message_prompt(changes))?;
        Ok(reply.trim().lines().next().unwrap_or_default().trim().to_string())
    }
}
