//! Branch index: the single source of truth for branches and their histories.
//!
//! The whole index is one structured document (`index.yaml` by default).
//! Every mutation is a full cycle under an advisory lock:
//!
//! 1. read the document from disk,
//! 2. mutate it in memory,
//! 3. rewrite it atomically.
//!
//! Reads are served from an in-memory copy that lives as long as the owning
//! [`Index`]. The copy is refreshed by every successful mutation and dropped
//! by [`Index::invalidate`] or by any failed mutation; callers that suspect
//! the file changed underneath them should invalidate explicitly.

use crate::error::{ContextError, Result};
use crate::lock::LockGuard;
use crate::store::{Format, Store};
use crate::types::Metadata;
use crate::CommitId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Schema version written into new index documents.
pub const INDEX_VERSION: &str = "1.0";

/// The default, undeletable branch.
pub const MAIN_BRANCH: &str = "main";

const LOCK_FILE: &str = "index.lock";

/// A branch record inside the index.
///
/// Invariant: `current_commit`, when set, equals the last element of `commits`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Branch {
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Time of the last structural change.
    pub last_modified: DateTime<Utc>,
    /// Branch this one was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Head commit.
    pub current_commit: Option<CommitId>,
    /// Commit ids in causal order.
    #[serde(default)]
    pub commits: Vec<CommitId>,
    /// Free-form annotations.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Branch {
    fn new(now: DateTime<Utc>, parent: Option<String>) -> Self {
        Self {
            created: now,
            last_modified: now,
            parent,
            current_commit: None,
            commits: vec![],
            metadata: Metadata::new(),
        }
    }
}

/// The persisted index document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndexDocument {
    /// Schema version.
    pub version: String,
    /// When the repository was initialized.
    pub created: DateTime<Utc>,
    /// Checked-out branch.
    pub current_branch: String,
    /// All branches by name.
    pub branches: BTreeMap<String, Branch>,
}

impl IndexDocument {
    /// A fresh document with an empty `main` branch checked out.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: INDEX_VERSION.to_string(),
            created: now,
            current_branch: MAIN_BRANCH.to_string(),
            branches: BTreeMap::from([(MAIN_BRANCH.to_string(), Branch::new(now, None))]),
        }
    }

    /// Looks a branch up, failing with `BranchNotFound` on behalf of `op`.
    pub fn branch(&self, op: &'static str, name: &str) -> Result<&Branch> {
        self.branches
            .get(name)
            .ok_or_else(|| ContextError::branch_not_found(op, name))
    }

    fn branch_mut(&mut self, op: &'static str, name: &str) -> Result<&mut Branch> {
        self.branches
            .get_mut(name)
            .ok_or_else(|| ContextError::branch_not_found(op, name))
    }

    /// Switches the checked-out branch.
    pub fn set_current_branch(&mut self, name: &str) -> Result<()> {
        self.branch("checkout", name)?;
        self.current_branch = name.to_string();
        Ok(())
    }

    /// Creates `name` as a by-value copy of `from`'s history.
    pub fn create_branch(&mut self, name: &str, from: &str, now: DateTime<Utc>) -> Result<()> {
        if self.branches.contains_key(name) {
            return Err(ContextError::BranchAlreadyExists(name.to_string()));
        }
        let source = self.branch("branch", from)?;

        let mut branch = Branch::new(now, Some(from.to_string()));
        branch.commits = source.commits.clone();
        branch.current_commit = source.current_commit.clone();

        self.branches.insert(name.to_string(), branch);
        Ok(())
    }

    /// Removes a branch record.
    pub fn delete_branch(&mut self, name: &str) -> Result<Branch> {
        self.branch("delete-branch", name)?;
        if name == MAIN_BRANCH {
            return Err(ContextError::ProtectedBranch(name.to_string()));
        }
        if name == self.current_branch {
            return Err(ContextError::ActiveBranchDeletion(name.to_string()));
        }
        self.branches
            .remove(name)
            .ok_or_else(|| ContextError::branch_not_found("delete-branch", name))
    }

    /// Appends a commit id and moves the head to it.
    pub fn add_commit(&mut self, branch: &str, id: CommitId, now: DateTime<Utc>) -> Result<()> {
        let record = self.branch_mut("commit", branch)?;
        record.commits.push(id.clone());
        record.current_commit = Some(id);
        record.last_modified = now;
        Ok(())
    }

    /// True if any branch references `id`.
    pub fn contains_commit(&self, id: &CommitId) -> bool {
        self.branches.values().any(|b| b.commits.contains(id))
    }
}

/// Handle on the index document of one repository.
pub struct Index {
    store: Store,
    format: Format,
    cache: Option<IndexDocument>,
}

impl Index {
    /// Creates a handle for the index under `store`'s root.
    ///
    /// If an index already exists in the other supported format it is used
    /// instead of `preferred`, so changing the configured format never hides
    /// an existing repository.
    pub fn new(store: Store, preferred: Format) -> Self {
        let format = [preferred, Format::Yaml, Format::Json]
            .into_iter()
            .find(|f| store.exists(Self::file_name(*f)))
            .unwrap_or(preferred);

        Self {
            store,
            format,
            cache: None,
        }
    }

    fn file_name(format: Format) -> String {
        format!("index.{}", format.extension())
    }

    /// Path of the index document.
    pub fn path(&self) -> PathBuf {
        self.store.path(Self::file_name(self.format))
    }

    /// True once the index document exists.
    pub fn is_initialized(&self) -> bool {
        self.store.exists(Self::file_name(self.format))
    }

    /// Writes a brand-new document. Used by `init` only.
    pub fn create(&mut self, doc: IndexDocument) -> Result<()> {
        let _lock = LockGuard::acquire(&self.store.path(LOCK_FILE))?;
        self.store
            .write_structured(Self::file_name(self.format), &doc, self.format)?;
        self.cache = Some(doc);
        Ok(())
    }

    /// Drops the in-memory copy; the next read goes to disk.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Returns the document, reading it from disk if not cached.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if there is no index document.
    pub fn load(&mut self) -> Result<&IndexDocument> {
        if self.cache.is_none() {
            self.cache = Some(self.read_from_disk()?);
        }
        // populated just above
        self.cache
            .as_ref()
            .ok_or_else(|| ContextError::NotInitialized { path: self.path() })
    }

    fn read_from_disk(&self) -> Result<IndexDocument> {
        match self
            .store
            .read_structured(Self::file_name(self.format), self.format)
        {
            Err(ContextError::NotFound(_)) => Err(ContextError::NotInitialized { path: self.path() }),
            other => other,
        }
    }

    /// Runs one load → mutate → rewrite cycle under the index lock.
    ///
    /// The mutation sees the on-disk state, not the cached copy. Nothing is
    /// written if `mutate` fails.
    pub fn update<T>(&mut self, mutate: impl FnOnce(&mut IndexDocument) -> Result<T>) -> Result<T> {
        let _lock = LockGuard::acquire(&self.store.path(LOCK_FILE))?;

        let outcome = self.read_from_disk().and_then(|mut doc| {
            let value = mutate(&mut doc)?;
            self.store
                .write_structured(Self::file_name(self.format), &doc, self.format)?;
            Ok((doc, value))
        });

        match outcome {
            Ok((doc, value)) => {
                self.cache = Some(doc);
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, "index mutation failed; dropping cached copy");
                self.cache = None;
                Err(e)
            }
        }
    }

    /// Returns the checked-out branch, or `main` if the repository is not initialized.
    pub fn current_branch(&mut self) -> Result<String> {
        match self.load() {
            Ok(doc) => Ok(doc.current_branch.clone()),
            Err(ContextError::NotInitialized { .. }) => Ok(MAIN_BRANCH.to_string()),
            Err(e) => Err(e),
        }
    }

    /// Checks out `name`.
    pub fn set_current_branch(&mut self, name: &str) -> Result<()> {
        self.update(|doc| doc.set_current_branch(name))
    }

    /// Creates `name` from `from`, copying its commit list and head.
    pub fn create_branch(&mut self, name: &str, from: &str, now: DateTime<Utc>) -> Result<()> {
        self.update(|doc| doc.create_branch(name, from, now))
    }

    /// Deletes a branch record. `main` and the current branch are refused.
    pub fn delete_branch(&mut self, name: &str) -> Result<()> {
        self.update(|doc| doc.delete_branch(name).map(|_| ()))
    }

    /// Appends `id` to `branch` and makes it the head.
    pub fn add_commit(&mut self, branch: &str, id: CommitId, now: DateTime<Utc>) -> Result<()> {
        self.update(|doc| doc.add_commit(branch, id, now))
    }

    /// Returns a branch's commit ids in order.
    pub fn commits(&mut self, branch: &str) -> Result<Vec<CommitId>> {
        Ok(self.load()?.branch("log", branch)?.commits.clone())
    }

    /// Returns a branch's head commit.
    pub fn current_commit(&mut self, branch: &str) -> Result<Option<CommitId>> {
        Ok(self.load()?.branch("log", branch)?.current_commit.clone())
    }

    /// Returns a copy of a branch record, if present.
    pub fn branch(&mut self, name: &str) -> Result<Option<Branch>> {
        Ok(self.load()?.branches.get(name).cloned())
    }

    /// Returns all branch names, sorted.
    pub fn branch_names(&mut self) -> Result<Vec<String>> {
        Ok(self.load()?.branches.keys().cloned().collect())
    }

    /// True if any branch references `id`.
    pub fn contains_commit(&mut self, id: &CommitId) -> Result<bool> {
        Ok(self.load()?.contains_commit(id))
    }
}
