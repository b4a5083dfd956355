//! Adapters over the code repository the context is tracked alongside.
//!
//! The engine only needs four questions answered: which files are tracked,
//! which branch is checked out, whether the work tree is dirty, and (for
//! auto-commit) how to commit. Every query degrades to an empty answer
//! instead of failing, since the context graph must stay usable in a
//! directory that is not a git repository at all.

use crate::store::fingerprint_file;
use crate::types::FileSnapshot;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Read access (plus best-effort commits) to the underlying code repository.
pub trait SourceRepository: Send + Sync {
    /// Root directory; tracked paths are relative to it.
    fn root(&self) -> &Path;

    /// Tracked file paths, relative to [`SourceRepository::root`].
    fn list_tracked_files(&self) -> Vec<String>;

    /// Checked-out branch of the code repository.
    fn current_branch_name(&self) -> Option<String>;

    /// True if the work tree has changes not committed to the code repository.
    fn has_uncommitted_changes(&self) -> bool;

    /// Stages `files` (or everything, if empty) and commits. Returns the new commit hash.
    fn stage_and_commit(&self, message: &str, files: &[String]) -> Option<String>;
}

/// Fingerprints every tracked file that can currently be read.
///
/// Tracked paths that were deleted from the work tree are left out of the
/// snapshot, which makes their removal show up as a change.
pub fn snapshot(source: &dyn SourceRepository) -> FileSnapshot {
    let root = source.root();
    let mut files = FileSnapshot::new();
    for rel in source.list_tracked_files() {
        match fingerprint_file(&root.join(&rel)) {
            Ok(fp) => {
                files.insert(rel, fp);
            }
            Err(e) => debug!(path = %rel, error = %e, "tracked file not readable; left out of snapshot"),
        }
    }
    files
}

/// Picks [`GitSource`] if `root` is inside a git work tree, otherwise an
/// empty [`ListedSource`].
pub fn detect(root: &Path) -> Box<dyn SourceRepository> {
    match GitSource::discover(root) {
        Some(git) => Box::new(git),
        None => {
            debug!(root = %root.display(), "not a git work tree; tracking no files");
            Box::new(ListedSource::new(root))
        }
    }
}

/// Shells out to the `git` binary.
#[derive(Debug, Clone)]
pub struct GitSource {
    root: PathBuf,
}

impl GitSource {
    /// Wraps `root` without checking it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns a source for `root` if git recognizes it as a work tree.
    pub fn discover(root: &Path) -> Option<Self> {
        let source = Self::new(root);
        let inside = source.run(&["rev-parse", "--is-inside-work-tree"])?;
        (inside == "true").then_some(source)
    }

    fn run(&self, args: &[&str]) -> Option<String> {
        let output = match Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                debug!(?args, error = %e, "failed to spawn git");
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                ?args,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git command failed"
            );
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl SourceRepository for GitSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_tracked_files(&self) -> Vec<String> {
        self.run(&["ls-files"])
            .map(|out| {
                out.lines()
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn current_branch_name(&self) -> Option<String> {
        self.run(&["branch", "--show-current"])
            .filter(|name| !name.is_empty())
    }

    fn has_uncommitted_changes(&self) -> bool {
        self.run(&["status", "--porcelain"])
            .map(|out| !out.is_empty())
            .unwrap_or(false)
    }

    fn stage_and_commit(&self, message: &str, files: &[String]) -> Option<String> {
        let mut add = vec!["add"];
        if files.is_empty() {
            add.push("-A");
        } else {
            add.push("--");
            add.extend(files.iter().map(String::as_str));
        }
        self.run(&add)?;
        self.run(&["commit", "-m", message])?;
        self.run(&["rev-parse", "HEAD"])
    }
}

/// In-memory file list. Clones share state, so a test can keep a handle and
/// change the tracked set while an engine owns another clone.
#[derive(Debug, Clone)]
pub struct ListedSource {
    root: PathBuf,
    files: Arc<Mutex<Vec<String>>>,
    commits: Arc<Mutex<Vec<String>>>,
}

impl ListedSource {
    /// A source rooted at `root` tracking nothing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Arc::default(),
            commits: Arc::default(),
        }
    }

    /// A source tracking `files`.
    pub fn with_files(root: impl Into<PathBuf>, files: &[&str]) -> Self {
        let source = Self::new(root);
        source.set_files(files.iter().map(|f| f.to_string()).collect());
        source
    }

    /// Replaces the tracked set.
    pub fn set_files(&self, files: Vec<String>) {
        *lock(&self.files) = files;
    }

    /// Adds one tracked path.
    pub fn track(&self, file: impl Into<String>) {
        lock(&self.files).push(file.into());
    }

    /// Messages passed to `stage_and_commit`, oldest first.
    pub fn committed_messages(&self) -> Vec<String> {
        lock(&self.commits).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SourceRepository for ListedSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_tracked_files(&self) -> Vec<String> {
        lock(&self.files).clone()
    }

    fn current_branch_name(&self) -> Option<String> {
        None
    }

    fn has_uncommitted_changes(&self) -> bool {
        false
    }

    fn stage_and_commit(&self, message: &str, _files: &[String]) -> Option<String> {
        let mut commits = lock(&self.commits);
        commits.push(message.to_string());
        Some(crate::store::fingerprint(
            format!("{}:{}", commits.len(), message).as_bytes(),
        ))
    }
}
