//! Immutable snapshots of branches removed by a squash merge.

use crate::commit_store::CommitStore;
use crate::error::{ContextError, Result};
use crate::store::{Format, Store};
use crate::types::{Commit, OtaLog, SquashResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding all archives, relative to the context root.
pub const ARCHIVE_DIR: &str = "archive";

/// Human-readable summary inside each archive.
pub const SUMMARY_FILE: &str = "summary.md";

/// The structured archive document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BranchArchive {
    /// Archived branch.
    pub branch: String,
    /// When the archive was written.
    pub archived_at: DateTime<Utc>,
    /// Every commit that was squashed, in order.
    pub commits: Vec<Commit>,
    /// The squash outcome.
    pub squash_result: SquashResult,
}

/// Writes and reads `archive/<branch>_<YYYYMMDD_HHMMSS>/` directories.
///
/// Each archive holds:
///
/// - `branch.json` (or `branch.json.zst`): a [`BranchArchive`]
/// - `summary.md`: [`SquashResult::to_markdown`]
/// - `ota_logs.json`: all reasoning logs of the squashed commits, if any
/// - `storage/`: a copy of the branch's storage directory as it was
#[derive(Debug, Clone)]
pub struct Archive {
    store: Store,
    format: Format,
}

impl Archive {
    /// Creates an archive writer; `format` applies to the structured documents.
    pub fn new(store: Store, format: Format) -> Self {
        Self { store, format }
    }

    /// Directory name for `branch` archived at `at`. Namespace slashes become dashes.
    pub fn dir_name(branch: &str, at: DateTime<Utc>) -> String {
        format!("{}_{}", branch.replace('/', "-"), at.format("%Y%m%d_%H%M%S"))
    }

    fn free_dir(&self, branch: &str, at: DateTime<Utc>) -> PathBuf {
        let base = Self::dir_name(branch, at);
        let mut candidate = PathBuf::from(ARCHIVE_DIR).join(&base);
        let mut n = 2;
        while self.store.exists(&candidate) {
            candidate = PathBuf::from(ARCHIVE_DIR).join(format!("{base}_{n}"));
            n += 1;
        }
        candidate
    }

    /// Writes a complete archive and returns its absolute path.
    ///
    /// # Errors
    ///
    /// Every failure is reported as `ArchiveWrite` for `branch`.
    pub fn write(
        &self,
        branch: &str,
        commits: &[Commit],
        result: &SquashResult,
        archived_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        self.write_inner(branch, commits, result, archived_at)
            .map_err(|e| ContextError::ArchiveWrite {
                branch: branch.to_string(),
                reason: e.to_string(),
            })
    }

    fn write_inner(
        &self,
        branch: &str,
        commits: &[Commit],
        result: &SquashResult,
        archived_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let dir = self.free_dir(branch, archived_at);
        let abs = self.store.ensure_dir(&dir)?;

        let storage = CommitStore::branch_dir(branch);
        if self.store.exists(&storage) {
            self.store.copy(&storage, dir.join("storage"))?;
        }

        let document = BranchArchive {
            branch: branch.to_string(),
            archived_at,
            commits: commits.to_vec(),
            squash_result: result.clone(),
        };
        self.store.write_structured(
            dir.join(format!("branch.{}", self.format.extension())),
            &document,
            self.format,
        )?;

        self.store
            .write_text(dir.join(SUMMARY_FILE), &result.to_markdown())?;

        let logs: Vec<&OtaLog> = commits.iter().flat_map(|c| &c.ota_logs).collect();
        if !logs.is_empty() {
            self.store.write_structured(
                dir.join(format!("ota_logs.{}", self.format.extension())),
                &logs,
                self.format,
            )?;
        }

        debug!(%branch, path = %abs.display(), commits = commits.len(), "branch archived");
        Ok(abs)
    }

    /// Lists archive directories, sorted by name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .store
            .list_dir(ARCHIVE_DIR)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect())
    }

    /// Reads the structured document of an archive directory.
    pub fn read(&self, dir: &Path) -> Result<BranchArchive> {
        self.store.read_structured(
            dir.join(format!("branch.{}", self.format.extension())),
            self.format,
        )
    }
}
