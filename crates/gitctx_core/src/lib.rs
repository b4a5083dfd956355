//! gitctx core library
//!
//! A version graph for the reasoning behind a codebase. Each branch holds an
//! ordered list of context commits (decisions, rejected alternatives and the
//! thought/action/result logs that produced them), and branches are merged
//! back either by concatenation or by squashing the whole history into one
//! summary commit.
//!
//! # Quick Start
//!
//! ```
//! use gitctx_core::{CommitRequest, Config, ContextEngine, EngineOptions, ListedSource};
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let options = EngineOptions::default().config(Config::default());
//! let mut engine = ContextEngine::new(tmp.path(), options)
//!     .unwrap()
//!     .with_source(Box::new(ListedSource::new(tmp.path())));
//! engine.init().unwrap();
//!
//! engine.branch("feature/x", None).unwrap();
//! engine.checkout("feature/x").unwrap();
//! engine.commit(CommitRequest::new("add X").decisions(["Use X"])).unwrap();
//!
//! engine.checkout("main").unwrap();
//! let merge = engine.merge("feature/x", true).unwrap();
//! assert_eq!(merge.result.decisions, vec!["Use X"]);
//! ```
//!
//! # Layout
//!
//! Everything lives under the context directory (`.gitcontext` by default):
//!
//! ```text
//! index.yaml                 branch table and current branch
//! config.toml                provider and storage settings
//! contexts/main/             history/commit_<id>/commit.json, ota-logs/
//! contexts/branches/<name>/  same layout for every other branch
//! archive/<branch>_<stamp>/  squashed branches
//! temp/                      staged reasoning logs
//! ```
//!
//! # Analysis
//!
//! Log analysis and squash summaries come from an [`analysis::AnalysisProvider`].
//! The offline [`StubProvider`] is deterministic; HTTP providers fall back to
//! it whenever they fail, so `commit` and `merge` never depend on the network.

pub mod analysis;
mod archive;
mod commit_id;
mod commit_store;
mod config;
mod engine;
mod error;
mod index;
mod lock;
mod report;
mod source;
mod staging;
mod store;
mod types;

pub use analysis::{create_provider, AnalysisProvider, FallbackProvider, StubProvider};
pub use archive::{Archive, BranchArchive, ARCHIVE_DIR, SUMMARY_FILE};
pub use commit_id::CommitId;
pub use commit_store::{CommitStore, BRANCHES_DIR};
pub use config::{
    context_dir_name, AnalysisConfig, Config, IndexFormat, SourceConfig, StorageConfig,
    CONFIG_FILE, DEFAULT_CONTEXT_DIR, ENV_AUTO_COMMIT, ENV_CONTEXT_DIR, ENV_MODEL, ENV_PROVIDER,
};
pub use engine::{
    CommitRequest, ContextEngine, EngineOptions, InitOutcome, MergeOutcome, SEED_DECISION,
    SEED_MESSAGE, SIMPLE_MERGE_SUMMARY,
};
pub use error::{ContextError, Result};
pub use index::{Branch, Index, IndexDocument, INDEX_VERSION, MAIN_BRANCH};
pub use report::{Level, MemoryReporter, Reporter, TracingReporter};
pub use source::{detect, snapshot, GitSource, ListedSource, SourceRepository};
pub use staging::{OtaStaging, StagedLog, TEMP_DIR};
pub use store::{fingerprint, fingerprint_file, Format, Store, FINGERPRINT_LEN};
pub use types::*;

use chrono::{DateTime, Utc};

/// Clock used for commit timestamps, ids and archive names.
///
/// Only consulted when set via [`ContextEngine::with_time_provider`];
/// otherwise the system clock is used.
pub trait TimeProvider: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

impl<F> TimeProvider for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}
