//! Per-branch storage of immutable commit documents.

use crate::error::{ContextError, Result};
use crate::index::MAIN_BRANCH;
use crate::store::{Format, Store};
use crate::types::Commit;
use crate::CommitId;
use std::path::PathBuf;
use tracing::warn;

/// Directory holding all branch-scoped storage, relative to the context root.
pub const BRANCHES_DIR: &str = "contexts/branches";

/// Persists commits as one document each, keyed by branch and commit id.
///
/// Layout:
///
/// ```text
/// contexts/main/history/commit_<id>/commit.json
/// contexts/branches/<name>/history/commit_<id>/commit.json
/// contexts/branches/<name>/ota-logs/commit_<id>.json
/// ```
///
/// A commit document lives under the branch it was created on. A branch
/// created from another one inherits the commit ids but not the documents,
/// so looking those ids up on the new branch finds nothing.
#[derive(Debug, Clone)]
pub struct CommitStore {
    store: Store,
    format: Format,
}

impl CommitStore {
    /// Creates a commit store writing documents in `format`.
    pub fn new(store: Store, format: Format) -> Self {
        Self { store, format }
    }

    /// Storage directory of a branch, relative to the context root.
    pub fn branch_dir(branch: &str) -> PathBuf {
        if branch == MAIN_BRANCH {
            PathBuf::from("contexts").join(MAIN_BRANCH)
        } else {
            PathBuf::from(BRANCHES_DIR).join(branch)
        }
    }

    fn commit_path(&self, branch: &str, id: &CommitId) -> PathBuf {
        Self::branch_dir(branch)
            .join("history")
            .join(format!("commit_{}", id))
            .join(format!("commit.{}", self.format.extension()))
    }

    fn ota_path(&self, branch: &str, id: &CommitId) -> PathBuf {
        Self::branch_dir(branch)
            .join("ota-logs")
            .join(format!("commit_{}.{}", id, self.format.extension()))
    }

    /// Creates the history and log directories of a branch.
    pub fn ensure_branch(&self, branch: &str) -> Result<()> {
        let dir = Self::branch_dir(branch);
        self.store.ensure_dir(dir.join("history"))?;
        self.store.ensure_dir(dir.join("ota-logs"))?;
        Ok(())
    }

    /// Writes a commit document, plus its reasoning logs as a side file.
    pub fn save(&self, commit: &Commit, branch: &str) -> Result<PathBuf> {
        let path = self
            .store
            .write_structured(self.commit_path(branch, &commit.id), commit, self.format)?;

        if !commit.ota_logs.is_empty() {
            self.store.write_structured(
                self.ota_path(branch, &commit.id),
                &commit.ota_logs,
                self.format,
            )?;
        }

        Ok(path)
    }

    /// True if the commit document exists on `branch`.
    pub fn exists(&self, id: &CommitId, branch: &str) -> bool {
        self.store.exists(self.commit_path(branch, id))
    }

    /// Loads a commit, or `None` if no document exists for it on `branch`.
    pub fn load(&self, id: &CommitId, branch: &str) -> Result<Option<Commit>> {
        match self
            .store
            .read_structured(self.commit_path(branch, id), self.format)
        {
            Ok(commit) => Ok(Some(commit)),
            Err(ContextError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Loads a commit that must exist.
    ///
    /// # Errors
    ///
    /// Returns `CommitNotFound` if there is no document for `id` on `branch`.
    pub fn get(&self, id: &CommitId, branch: &str) -> Result<Commit> {
        self.load(id, branch)?
            .ok_or_else(|| ContextError::CommitNotFound {
                branch: branch.to_string(),
                id: id.to_string(),
            })
    }

    /// Resolves `ids` in order, skipping (and logging) ids without a document.
    pub fn load_all(&self, branch: &str, ids: &[CommitId]) -> Result<Vec<Commit>> {
        let mut commits = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load(id, branch)? {
                Some(commit) => commits.push(commit),
                None => warn!(%branch, commit = %id, "commit document missing; skipped"),
            }
        }
        Ok(commits)
    }

    /// Removes all storage of a branch. Returns false if there was none.
    pub fn delete_branch(&self, branch: &str) -> Result<bool> {
        let dir = Self::branch_dir(branch);
        let removed = self.store.delete(&dir)?;
        if let Some(parent) = dir.parent() {
            self.store.prune_empty_dirs(parent, BRANCHES_DIR);
        }
        Ok(removed)
    }
}
