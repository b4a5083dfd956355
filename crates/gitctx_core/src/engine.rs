//! The context engine: branch, commit and merge over the context graph.

use crate::analysis::{AnalysisProvider, FallbackProvider};
use crate::archive::{Archive, ARCHIVE_DIR};
use crate::commit_store::{CommitStore, BRANCHES_DIR};
use crate::config::{context_dir_name, Config};
use crate::error::{ContextError, Result};
use crate::index::{Index, IndexDocument, MAIN_BRANCH};
use crate::report::{Reporter, TracingReporter};
use crate::source::{self, SourceRepository};
use crate::staging::{OtaStaging, TEMP_DIR};
use crate::store::{Format, Store};
use crate::types::{
    snapshot_differs, Alternative, BranchSummary, Commit, CurrentContext, FileSnapshot, Metadata,
    OtaLog, SquashMetadata, SquashResult, StatusReport,
};
use crate::{CommitId, TimeProvider};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Message of the commit created by `init`.
pub const SEED_MESSAGE: &str = "Initial context";

/// Decision recorded by the commit created by `init`.
pub const SEED_DECISION: &str = "Repository initialized";

/// Summary recorded by a merge that concatenates histories.
pub const SIMPLE_MERGE_SUMMARY: &str = "Simple merge completed";

/// Tracked files included in the merge target snapshot.
const CONTEXT_FILE_LIMIT: usize = 20;

const GITIGNORE: &str = "temp/\n*.log\n*.lock\n*.tmp\n";

/// How an engine locates its context directory and configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Context directory, relative to the root unless absolute.
    /// Defaults to `GITCONTEXT_DIR` or `.gitcontext`.
    pub context_dir: Option<PathBuf>,
    /// Configuration to use instead of `config.toml` plus the environment.
    pub config: Option<Config>,
    /// Override variables consulted instead of the process environment.
    pub env: Option<HashMap<String, String>>,
}

impl EngineOptions {
    /// Uses `dir` as the context directory.
    pub fn context_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.context_dir = Some(dir.into());
        self
    }

    /// Uses `config` verbatim.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Reads overrides from `vars` instead of the process environment.
    pub fn env<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }
}

/// Result of [`ContextEngine::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// A fresh repository was created with this seed commit.
    Created(CommitId),
    /// The repository already existed; nothing was changed.
    AlreadyInitialized,
}

/// Input of [`ContextEngine::commit`].
#[derive(Debug, Clone, Default)]
pub struct CommitRequest {
    /// Commit message.
    pub message: String,
    /// Reasoning logs to attach and analyze.
    pub ota_logs: Vec<OtaLog>,
    /// Explicit decisions. When `None`, decisions come from log analysis.
    pub decisions: Option<Vec<String>>,
    /// Explicit alternatives. When `None`, they come from log analysis.
    pub alternatives: Option<Vec<Alternative>>,
    /// Also attach the logs staged in `temp/`.
    pub use_staged: bool,
}

impl CommitRequest {
    /// A commit with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Sets explicit decisions.
    pub fn decisions<S: Into<String>>(mut self, decisions: impl IntoIterator<Item = S>) -> Self {
        self.decisions = Some(decisions.into_iter().map(Into::into).collect());
        self
    }

    /// Sets explicit alternatives.
    pub fn alternatives(mut self, alternatives: Vec<Alternative>) -> Self {
        self.alternatives = Some(alternatives);
        self
    }

    /// Attaches reasoning logs.
    pub fn ota_logs(mut self, logs: Vec<OtaLog>) -> Self {
        self.ota_logs = logs;
        self
    }

    /// Attaches the staged logs as well.
    pub fn use_staged(mut self) -> Self {
        self.use_staged = true;
        self
    }
}

/// Result of [`ContextEngine::merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged (now deleted) branch.
    pub source_branch: String,
    /// The branch that received the merge.
    pub target_branch: String,
    /// True for a squash merge.
    pub squashed: bool,
    /// Summary of the merge.
    pub result: SquashResult,
    /// Commits appended to the target: the synthesized commit, or the copied ones.
    pub commit_ids: Vec<CommitId>,
    /// Archive directory, if one was written.
    pub archive: Option<PathBuf>,
}

/// Orchestrates the index, commit store, analysis provider and archive.
///
/// The engine owns the index of one context directory. All persistence goes
/// through [`Index`] and [`CommitStore`]; analysis failures never abort an
/// operation because the provider is always wrapped in a
/// [`FallbackProvider`].
pub struct ContextEngine {
    root: PathBuf,
    context_dir: PathBuf,
    config: Config,
    // What `init` writes to config.toml: no environment overrides
    file_config: Config,
    index: Index,
    commits: CommitStore,
    staging: OtaStaging,
    archive: Archive,
    provider: FallbackProvider,
    source: Box<dyn SourceRepository>,
    reporter: Arc<dyn Reporter>,
    time_provider: Option<Arc<dyn TimeProvider>>,
}

impl ContextEngine {
    /// Creates an engine for `root` without requiring an initialized repository.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be read or names an unknown provider.
    pub fn new(root: impl AsRef<Path>, options: EngineOptions) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let context_dir = match options.context_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => root.join(dir),
            None => root.join(context_dir_name()),
        };
        let (config, file_config) = match options.config {
            Some(config) => (config.clone(), config),
            None => {
                let file_config = Config::load_file(&context_dir)?;
                let mut config = file_config.clone();
                match &options.env {
                    Some(vars) => config.apply_env(|key| vars.get(key).cloned()),
                    None => config.apply_env(|key| std::env::var(key).ok()),
                }
                (config, file_config)
            }
        };

        let store = Store::new(&context_dir);
        let provider = FallbackProvider::from_config(&config.analysis)?;

        Ok(Self {
            index: Index::new(store.clone(), config.storage.index_format.into()),
            commits: CommitStore::new(store.clone(), Format::Json),
            staging: OtaStaging::new(store.clone()),
            archive: Archive::new(store, config.storage.archive_format()),
            provider,
            source: source::detect(&root),
            reporter: Arc::new(TracingReporter),
            time_provider: None,
            root,
            context_dir,
            config,
            file_config,
        })
    }

    /// Opens an initialized repository.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if there is no index under the context directory.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gitctx_core::{ContextEngine, EngineOptions};
    ///
    /// let mut engine = ContextEngine::open(".", EngineOptions::default()).unwrap();
    /// println!("on {}", engine.status().unwrap().current_branch);
    /// ```
    pub fn open(root: impl AsRef<Path>, options: EngineOptions) -> Result<Self> {
        let engine = Self::new(root, options)?;
        if !engine.index.is_initialized() {
            return Err(ContextError::NotInitialized {
                path: engine.index.path(),
            });
        }
        Ok(engine)
    }

    /// Replaces the analysis provider. It is wrapped in a fallback.
    pub fn with_provider(mut self, provider: Box<dyn AnalysisProvider>) -> Self {
        self.provider = FallbackProvider::new(provider);
        self
    }

    /// Replaces the source repository adapter.
    pub fn with_source(mut self, source: Box<dyn SourceRepository>) -> Self {
        self.source = source;
        self
    }

    /// Replaces the notice sink.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sets a custom clock for testing.
    pub fn with_time_provider(mut self, provider: impl TimeProvider + 'static) -> Self {
        self.time_provider = Some(Arc::new(provider));
        self
    }

    /// Repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Context directory.
    pub fn context_dir(&self) -> &Path {
        &self.context_dir
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the analysis provider in use.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Number of analysis calls answered by the offline stub after a backend failure.
    pub fn analysis_fallbacks(&self) -> usize {
        self.provider.fallbacks()
    }

    /// True once `init` has run.
    pub fn is_initialized(&self) -> bool {
        self.index.is_initialized()
    }

    /// Drops the cached index; the next read goes to disk.
    pub fn reload(&mut self) {
        self.index.invalidate();
    }

    fn now(&self) -> DateTime<Utc> {
        match &self.time_provider {
            Some(clock) => clock.now(),
            None => Utc::now(),
        }
    }

    fn require_initialized(&self) -> Result<()> {
        if self.index.is_initialized() {
            Ok(())
        } else {
            Err(ContextError::NotInitialized {
                path: self.index.path(),
            })
        }
    }

    /// Creates the context directory, the index and the seed commit.
    ///
    /// Does nothing (apart from a notice) if the repository already exists.
    pub fn init(&mut self) -> Result<InitOutcome> {
        if self.index.is_initialized() {
            self.reporter.info(&format!(
                "context repository already initialized at {}",
                self.context_dir.display()
            ));
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let store = Store::new(&self.context_dir);
        for dir in [BRANCHES_DIR, ARCHIVE_DIR, TEMP_DIR] {
            store.ensure_dir(dir)?;
        }
        self.commits.ensure_branch(MAIN_BRANCH)?;

        if !store.exists(crate::config::CONFIG_FILE) {
            self.file_config.save(&self.context_dir)?;
        }
        if !store.exists(".gitignore") {
            store.write_text(".gitignore", GITIGNORE)?;
        }

        let now = self.now();
        let seed = Commit {
            id: CommitId::generate(now),
            message: SEED_MESSAGE.to_string(),
            timestamp: now,
            parent: None,
            decisions: vec![SEED_DECISION.to_string()],
            alternatives: vec![],
            ota_logs: vec![],
            files_snapshot: source::snapshot(self.source.as_ref()),
            metadata: Metadata::new(),
        };
        self.commits.save(&seed, MAIN_BRANCH)?;

        let mut doc = IndexDocument::new(now);
        doc.add_commit(MAIN_BRANCH, seed.id.clone(), now)?;
        self.index.create(doc)?;

        info!(path = %self.context_dir.display(), seed = %seed.id, "initialized context repository");
        self.reporter.info(&format!(
            "initialized context repository at {} (seed {})",
            self.context_dir.display(),
            seed.id.short()
        ));
        Ok(InitOutcome::Created(seed.id))
    }

    /// Creates `name` from `from` (default: the current branch). Does not check it out.
    ///
    /// Names may use `/` as a namespace separator (`feature/x`), but may not
    /// contain empty, `.` or `..` segments, backslashes or control characters,
    /// and may not nest inside or around an existing branch name.
    pub fn branch(&mut self, name: &str, from: Option<&str>) -> Result<()> {
        validate_branch_name(name)?;
        self.require_initialized()?;

        let now = self.now();
        let source_branch = match from {
            Some(from) => from.to_string(),
            None => self.index.load()?.current_branch.clone(),
        };

        self.index.update(|doc| {
            if !doc.branches.contains_key(name) && namespace_conflict(doc, name) {
                return Err(ContextError::InvalidBranchName {
                    name: name.to_string(),
                    reason: "overlaps an existing branch namespace",
                });
            }
            doc.create_branch(name, &source_branch, now)
        })?;
        self.commits.ensure_branch(name)?;

        debug!(branch = %name, from = %source_branch, "branch created");
        self.reporter
            .info(&format!("created branch {name} (from {source_branch})"));
        Ok(())
    }

    /// Checks out `name`.
    pub fn checkout(&mut self, name: &str) -> Result<()> {
        self.require_initialized()?;
        self.index.set_current_branch(name)?;
        self.reporter.info(&format!("switched to branch {name}"));
        Ok(())
    }

    /// Returns the checked-out branch (`main` before `init`).
    pub fn current_branch(&mut self) -> Result<String> {
        self.index.current_branch()
    }

    /// Returns a branch's commit ids in order.
    pub fn commit_ids(&mut self, branch: &str) -> Result<Vec<CommitId>> {
        self.index.commits(branch)
    }

    fn fresh_commit_id(&mut self, now: DateTime<Utc>) -> Result<CommitId> {
        loop {
            let id = CommitId::generate(now);
            if !self.index.contains_commit(&id)? {
                return Ok(id);
            }
            warn!(commit = %id, "commit id collision; regenerating");
        }
    }

    /// Records a commit on the current branch and returns its id.
    ///
    /// Reasoning logs, if any, are analyzed; the analysis supplies decisions
    /// and alternatives unless the request sets them explicitly.
    pub fn commit(&mut self, request: CommitRequest) -> Result<CommitId> {
        self.require_initialized()?;
        let (branch, parent) = {
            let doc = self.index.load()?;
            let branch = doc.current_branch.clone();
            let parent = doc.branch("commit", &branch)?.current_commit.clone();
            (branch, parent)
        };

        let staged = if request.use_staged {
            self.staging.staged()?
        } else {
            vec![]
        };
        let mut logs = request.ota_logs;
        logs.extend(staged.iter().map(|s| s.log.clone()));

        let files_snapshot = source::snapshot(self.source.as_ref());

        let mut metadata = Metadata::new();
        let (mut decisions, mut alternatives) = (vec![], vec![]);
        if !logs.is_empty() {
            let analysis = self.provider.analyze_logs(&logs)?;
            decisions = analysis.decisions;
            alternatives = analysis.alternatives;
            if !analysis.insights.is_empty() {
                metadata.insert("insights".into(), serde_json::Value::from(analysis.insights));
            }
        }
        if let Some(explicit) = request.decisions {
            decisions = explicit;
        }
        if let Some(explicit) = request.alternatives {
            alternatives = explicit;
        }

        let now = self.now();
        let commit = Commit {
            id: self.fresh_commit_id(now)?,
            message: request.message,
            timestamp: now,
            parent,
            decisions,
            alternatives,
            ota_logs: logs,
            files_snapshot,
            metadata,
        };

        self.commits.save(&commit, &branch)?;
        self.index.add_commit(&branch, commit.id.clone(), now)?;

        if !staged.is_empty() {
            let removed = self.staging.remove(&staged)?;
            debug!(removed, "consumed staged reasoning logs");
        }

        if self.config.source.auto_commit {
            match self.source.stage_and_commit(&commit.message, &[]) {
                Some(hash) => debug!(%hash, "mirrored commit into source repository"),
                None => self
                    .reporter
                    .warn("auto-commit to the source repository failed; context commit kept"),
            }
        }

        info!(%branch, commit = %commit.id, logs = commit.ota_logs.len(), "committed");
        self.reporter.info(&format!(
            "[{} {}] {}",
            branch,
            commit.id.short(),
            commit.message
        ));
        Ok(commit.id)
    }

    /// Merges `branch` into the current branch and deletes it.
    ///
    /// With `squash`, the branch history is replaced by one synthesized
    /// commit and archived first. Without it, the branch's commits are copied
    /// onto the current branch unchanged.
    pub fn merge(&mut self, branch: &str, squash: bool) -> Result<MergeOutcome> {
        let (target, ids) = {
            let doc = self.index.load()?;
            let target = doc.current_branch.clone();
            if branch == target {
                return Err(ContextError::SelfMerge(branch.to_string()));
            }
            // Checked before analysis so a refused merge leaves nothing behind
            if branch == MAIN_BRANCH {
                return Err(ContextError::ProtectedBranch(branch.to_string()));
            }
            (target, doc.branch("merge", branch)?.commits.clone())
        };
        let commits = self.commits.load_all(branch, &ids)?;

        let outcome = if squash {
            self.squash_merge(branch, &target, &commits)?
        } else {
            self.concat_merge(branch, &target, &commits)?
        };

        self.commits.delete_branch(branch)?;

        info!(
            source = %branch,
            target = %target,
            squash,
            commits = commits.len(),
            "merged"
        );
        self.reporter.info(&format!(
            "merged {} into {} ({}, {} commit(s))",
            branch,
            target,
            if squash { "squashed" } else { "simple" },
            commits.len()
        ));
        Ok(outcome)
    }

    fn squash_merge(
        &mut self,
        branch: &str,
        target: &str,
        commits: &[Commit],
    ) -> Result<MergeOutcome> {
        let current = self.current_context()?;
        let merged_at = self.now();
        let result = self
            .provider
            .squash_history(branch, commits, Some(&current), merged_at)?;

        let archive = match self.archive.write(branch, commits, &result, merged_at) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "archive failed; merge continues");
                self.reporter.warn(&e.to_string());
                None
            }
        };

        let parent = self.index.current_commit(target)?;
        let commit = Commit {
            id: self.fresh_commit_id(merged_at)?,
            message: format!("Squash merge: {branch}"),
            timestamp: merged_at,
            parent,
            decisions: result.decisions.clone(),
            alternatives: result.rejected_alternatives.clone(),
            ota_logs: vec![],
            files_snapshot: source::snapshot(self.source.as_ref()),
            metadata: SquashMetadata::from_result(&result).to_metadata(),
        };
        self.commits.save(&commit, target)?;

        // One index write both appends the summary and drops the source branch
        self.index.update(|doc| {
            doc.add_commit(target, commit.id.clone(), merged_at)?;
            doc.delete_branch(branch).map(|_| ())
        })?;

        Ok(MergeOutcome {
            source_branch: branch.to_string(),
            target_branch: target.to_string(),
            squashed: true,
            result,
            commit_ids: vec![commit.id],
            archive,
        })
    }

    fn concat_merge(
        &mut self,
        branch: &str,
        target: &str,
        commits: &[Commit],
    ) -> Result<MergeOutcome> {
        let existing = self.index.commits(target)?;
        let copied: Vec<&Commit> = commits
            .iter()
            .filter(|c| !existing.contains(&c.id))
            .collect();

        for commit in &copied {
            self.commits.save(commit, target)?;
        }

        let now = self.now();
        let ids: Vec<CommitId> = copied.iter().map(|c| c.id.clone()).collect();
        self.index.update(|doc| {
            for id in &ids {
                doc.add_commit(target, id.clone(), now)?;
            }
            doc.delete_branch(branch).map(|_| ())
        })?;

        let mut result = SquashResult::empty(branch, now);
        result.architecture_summary = SIMPLE_MERGE_SUMMARY.to_string();
        result.original_commits = commits.len();
        result.ota_count = commits.iter().map(|c| c.ota_logs.len()).sum();

        Ok(MergeOutcome {
            source_branch: branch.to_string(),
            target_branch: target.to_string(),
            squashed: false,
            result,
            commit_ids: ids,
            archive: None,
        })
    }

    /// Returns the last `limit` commits of `branch` (default: current), oldest first.
    ///
    /// Ids without a document on that branch are skipped.
    pub fn log(&mut self, branch: Option<&str>, limit: usize) -> Result<Vec<Commit>> {
        let target = match branch {
            Some(b) => b.to_string(),
            None => self.index.load()?.current_branch.clone(),
        };
        let ids = self.index.commits(&target)?;
        let start = ids.len().saturating_sub(limit);
        self.commits.load_all(&target, &ids[start..])
    }

    /// Looks up one commit.
    ///
    /// With `branch`, only that branch's storage is searched. Otherwise the
    /// current branch is tried first, then every other branch.
    ///
    /// # Errors
    ///
    /// Returns `CommitNotFound` if no document exists or `id` is not a
    /// well-formed commit id.
    pub fn show(&mut self, id: &str, branch: Option<&str>) -> Result<Commit> {
        let Some(id) = CommitId::parse(id) else {
            let branch = match branch {
                Some(b) => b.to_string(),
                None => self.index.load()?.current_branch.clone(),
            };
            return Err(ContextError::CommitNotFound {
                branch,
                id: id.to_string(),
            });
        };
        if let Some(branch) = branch {
            self.index.load()?.branch("show", branch)?;
            return self.commits.get(&id, branch);
        }

        let current = self.index.load()?.current_branch.clone();
        let mut candidates = vec![current.clone()];
        candidates.extend(self.index.branch_names()?.into_iter().filter(|b| *b != current));

        for candidate in &candidates {
            if let Some(commit) = self.commits.load(&id, candidate)? {
                return Ok(commit);
            }
        }
        Err(ContextError::CommitNotFound {
            branch: current,
            id: id.to_string(),
        })
    }

    /// Resolves the head of `branch`, following the parent chain when the
    /// head was inherited at branch creation.
    fn head_commit(&mut self, branch: &str) -> Result<Option<Commit>> {
        let Some(head) = self.index.current_commit(branch)? else {
            return Ok(None);
        };

        let mut visited = HashSet::new();
        let mut lineage = Some(branch.to_string());
        while let Some(name) = lineage {
            if !visited.insert(name.clone()) {
                debug!(%branch, at = %name, "parent chain loops; searching all branches");
                break;
            }
            if let Some(commit) = self.commits.load(&head, &name)? {
                return Ok(Some(commit));
            }
            lineage = self.index.branch(&name)?.and_then(|b| b.parent);
        }

        // Parents can be deleted or re-created under the same name
        for name in self.index.branch_names()? {
            if visited.contains(&name) {
                continue;
            }
            if let Some(commit) = self.commits.load(&head, &name)? {
                return Ok(Some(commit));
            }
        }
        warn!(%branch, commit = %head, "head commit document missing");
        Ok(None)
    }

    /// Snapshot of the current branch handed to the analysis provider on merge.
    pub fn current_context(&mut self) -> Result<CurrentContext> {
        let branch = self.index.load()?.current_branch.clone();
        let head = self.head_commit(&branch)?;
        let mut files = self.source.list_tracked_files();
        files.truncate(CONTEXT_FILE_LIMIT);

        Ok(CurrentContext {
            branch,
            latest_commit: head.as_ref().map(|c| c.message.clone()),
            decisions: head.map(|c| c.decisions).unwrap_or_default(),
            files,
        })
    }

    /// Reports the current branch, its head and whether tracked files changed since.
    pub fn status(&mut self) -> Result<StatusReport> {
        let (current_branch, commits, all_branches) = {
            let doc = self.index.load()?;
            let branch = doc.branch("status", &doc.current_branch)?;
            (
                doc.current_branch.clone(),
                branch.commits.len(),
                doc.branches.keys().cloned().collect::<Vec<_>>(),
            )
        };

        let latest = self.head_commit(&current_branch)?;
        let uncommitted_changes = match &latest {
            Some(commit) => {
                snapshot_differs(&commit.files_snapshot, &source::snapshot(self.source.as_ref()))
            }
            None => false,
        };

        Ok(StatusReport {
            current_branch,
            commits,
            latest_commit: latest.as_ref().map(|c| c.message.clone()),
            latest_commit_id: latest.map(|c| c.id),
            uncommitted_changes,
            all_branches,
            pending_ota_logs: self.staging.count()?,
        })
    }

    /// Paths added, removed or modified since the current head's snapshot.
    pub fn changed_files(&mut self) -> Result<Vec<String>> {
        let branch = self.index.load()?.current_branch.clone();
        let previous = self
            .head_commit(&branch)?
            .map(|c| c.files_snapshot)
            .unwrap_or_default();
        let current = source::snapshot(self.source.as_ref());
        Ok(diff_paths(&previous, &current))
    }

    /// Asks the provider for a commit message describing the changed files.
    pub fn suggest_commit_message(&mut self) -> Result<String> {
        let changes = self.changed_files()?;
        self.provider.generate_commit_message(&changes)
    }

    /// Lists every branch.
    pub fn branches(&mut self) -> Result<Vec<BranchSummary>> {
        let doc = self.index.load()?;
        Ok(doc
            .branches
            .iter()
            .map(|(name, b)| BranchSummary {
                name: name.clone(),
                parent: b.parent.clone(),
                commits: b.commits.len(),
                head: b.current_commit.clone(),
                is_current: *name == doc.current_branch,
            })
            .collect())
    }

    /// Deletes a branch and its storage. `main` and the current branch are refused.
    pub fn delete_branch(&mut self, name: &str) -> Result<()> {
        self.require_initialized()?;
        self.index.delete_branch(name)?;
        self.commits.delete_branch(name)?;
        self.reporter.info(&format!("deleted branch {name}"));
        Ok(())
    }

    /// Stages a reasoning log for the next commit.
    pub fn stage_ota(&self, log: &OtaLog) -> Result<PathBuf> {
        self.require_initialized()?;
        self.staging.stage(log)
    }

    /// Staged reasoning logs, oldest first.
    pub fn staged_ota(&self) -> Result<Vec<OtaLog>> {
        Ok(self.staging.staged()?.into_iter().map(|s| s.log).collect())
    }

    /// Discards all staged reasoning logs.
    pub fn clear_staged_ota(&self) -> Result<usize> {
        self.staging.clear()
    }

    /// Removes temp files older than `max_age_hours`.
    pub fn cleanup_temp(&self, max_age_hours: u64) -> Result<usize> {
        // chrono durations are bounded; a century is "everything"
        let hours = max_age_hours.min(24 * 365 * 100) as i64;
        self.staging.cleanup(Duration::hours(hours), self.now())
    }

    /// Archive directories written by squash merges.
    pub fn archives(&self) -> Result<Vec<PathBuf>> {
        self.archive.list()
    }
}

fn validate_branch_name(name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(ContextError::InvalidBranchName {
            name: name.to_string(),
            reason,
        })
    };

    if name.trim().is_empty() {
        return invalid("name is empty");
    }
    if name.contains('\\') {
        return invalid("backslashes are not allowed");
    }
    if name.chars().any(char::is_control) {
        return invalid("control characters are not allowed");
    }
    if name.starts_with('/') || name.ends_with('/') {
        return invalid("may not start or end with '/'");
    }
    if name
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return invalid("empty, '.' and '..' path segments are not allowed");
    }
    Ok(())
}

fn namespace_conflict(doc: &IndexDocument, name: &str) -> bool {
    doc.branches.keys().any(|existing| {
        existing.starts_with(&format!("{name}/")) || name.starts_with(&format!("{existing}/"))
    })
}

fn diff_paths(previous: &FileSnapshot, current: &FileSnapshot) -> Vec<String> {
    let mut paths: Vec<String> = current
        .iter()
        .filter(|(path, fp)| previous.get(*path) != Some(*fp))
        .map(|(path, _)| path.clone())
        .collect();
    paths.extend(
        previous
            .keys()
            .filter(|path| !current.contains_key(*path))
            .cloned(),
    );
    paths.sort();
    paths
}
