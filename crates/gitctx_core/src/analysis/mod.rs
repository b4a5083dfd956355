//! Analysis providers: turn reasoning logs and branch histories into
//! structured summaries.
//!
//! Every provider implements [`AnalysisProvider`]. The engine never calls a
//! network provider directly; it always goes through a [`FallbackProvider`],
//! which answers with [`StubProvider`] output whenever the backend fails.
//! `commit` and `merge` therefore complete even without network access.

mod backend;
mod http;
mod prompt;
mod stub;

pub use backend::{BackendProvider, ChatBackend};
pub use http::{Dialect, HttpBackend};
pub use prompt::{context_excerpt, extract_json, CONTEXT_CHAR_LIMIT};
pub use stub::StubProvider;

use crate::config::AnalysisConfig;
use crate::error::{ContextError, Result};
use crate::types::{Commit, CurrentContext, LogAnalysis, OtaLog, SquashResult};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Extraction of decisions and summaries from free text.
///
/// Implementations must not touch local state.
pub trait AnalysisProvider: Send + Sync {
    /// Provider name (`stub`, `openai`, ...).
    fn name(&self) -> &str;

    /// Extracts decisions, alternatives and insights from reasoning logs.
    ///
    /// Empty input yields an empty analysis.
    fn analyze_logs(&self, logs: &[OtaLog]) -> Result<LogAnalysis>;

    /// Distills a branch history into one summary.
    ///
    /// An empty `commits` slice yields [`SquashResult::empty`].
    fn squash_history(
        &self,
        branch: &str,
        commits: &[Commit],
        current: Option<&CurrentContext>,
        merged_at: DateTime<Utc>,
    ) -> Result<SquashResult>;

    /// Proposes a one-line commit message for the given changes.
    fn generate_commit_message(&self, changes: &[String]) -> Result<String>;
}

/// Names accepted by [`create_provider`].
pub const PROVIDER_NAMES: &[&str] = &["stub", "openai", "anthropic", "deepseek", "ollama"];

/// Builds the provider named in `config`.
///
/// `mock` and `offline` are accepted as aliases of `stub`.
///
/// # Errors
///
/// Returns `UnknownProvider` for any other name.
pub fn create_provider(config: &AnalysisConfig) -> Result<Box<dyn AnalysisProvider>> {
    let window = config.log_window;
    let provider: Box<dyn AnalysisProvider> = match config.provider.as_str() {
        "stub" | "mock" | "offline" => Box::new(StubProvider),
        "openai" => Box::new(BackendProvider::new(HttpBackend::openai(config), window)),
        "anthropic" => Box::new(BackendProvider::new(HttpBackend::anthropic(config), window)),
        "deepseek" => Box::new(BackendProvider::new(HttpBackend::deepseek(config), window)),
        "ollama" => Box::new(BackendProvider::new(HttpBackend::ollama(config), window)),
        other => return Err(ContextError::UnknownProvider(other.to_string())),
    };
    info!(provider = provider.name(), model = ?config.model, "analysis provider ready");
    Ok(provider)
}

/// Wraps a provider so that its failures are replaced by stub output.
///
/// Every absorbed failure is logged and counted; see
/// [`FallbackProvider::fallbacks`].
pub struct FallbackProvider {
    primary: Box<dyn AnalysisProvider>,
    fallbacks: AtomicUsize,
}

impl FallbackProvider {
    /// Wraps `primary`.
    pub fn new(primary: Box<dyn AnalysisProvider>) -> Self {
        Self {
            primary,
            fallbacks: AtomicUsize::new(0),
        }
    }

    /// Builds the configured provider and wraps it.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self::new(create_provider(config)?))
    }

    /// Number of calls answered by the stub because the primary failed.
    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::SeqCst)
    }

    fn absorb(&self, operation: &str, error: &ContextError) {
        self.fallbacks.fetch_add(1, Ordering::SeqCst);
        warn!(
            provider = self.primary.name(),
            operation,
            error = %error,
            "analysis backend failed; using offline stub"
        );
    }
}

impl AnalysisProvider for FallbackProvider {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn analyze_logs(&self, logs: &[OtaLog]) -> Result<LogAnalysis> {
        self.primary.analyze_logs(logs).or_else(|e| {
            self.absorb("analyze_logs", &e);
            StubProvider.analyze_logs(logs)
        })
    }

    fn squash_history(
        &self,
        branch: &str,
        commits: &[Commit],
        current: Option<&CurrentContext>,
        merged_at: DateTime<Utc>,
    ) -> Result<SquashResult> {
        self.primary
            .squash_history(branch, commits, current, merged_at)
            .or_else(|e| {
                self.absorb("squash_history", &e);
                StubProvider.squash_history(branch, commits, current, merged_at)
            })
    }

    fn generate_commit_message(&self, changes: &[String]) -> Result<String> {
        self.primary.generate_commit_message(changes).or_else(|e| {
            self.absorb("generate_commit_message", &e);
            StubProvider.generate_commit_message(changes)
        })
    }
}
