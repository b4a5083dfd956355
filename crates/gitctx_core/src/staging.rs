//! Reasoning logs staged in `temp/` until the next commit picks them up.

use crate::error::Result;
use crate::store::{Format, Store};
use crate::types::OtaLog;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Directory for staged logs and other scratch files.
pub const TEMP_DIR: &str = "temp";

const STAGED_PREFIX: &str = "ota_";

/// A staged log together with the file it came from.
#[derive(Debug, Clone)]
pub struct StagedLog {
    /// Absolute path of the staged document.
    pub path: PathBuf,
    /// The log itself.
    pub log: OtaLog,
}

/// Scratch area for logs recorded between commits.
#[derive(Debug, Clone)]
pub struct OtaStaging {
    store: Store,
}

impl OtaStaging {
    /// Creates a staging area under `store`'s root.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Writes `log` to `temp/ota_<timestamp>_<id>.json`.
    pub fn stage(&self, log: &OtaLog) -> Result<PathBuf> {
        let name = format!(
            "{}{}_{}.{}",
            STAGED_PREFIX,
            log.timestamp.format("%Y%m%d_%H%M%S"),
            log.id,
            Format::Json.extension()
        );
        let path = self
            .store
            .write_structured(PathBuf::from(TEMP_DIR).join(name), log, Format::Json)?;
        debug!(path = %path.display(), "staged reasoning log");
        Ok(path)
    }

    /// Returns staged logs ordered by their timestamp.
    ///
    /// Files that cannot be decoded are skipped with a warning.
    pub fn staged(&self) -> Result<Vec<StagedLog>> {
        let mut staged = Vec::new();
        for path in self.staged_paths()? {
            let rel = match path.strip_prefix(self.store.root()) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };
            match self.store.read_structured::<OtaLog>(&rel, Format::Json) {
                Ok(log) => staged.push(StagedLog { path, log }),
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable staged log skipped"),
            }
        }
        staged.sort_by(|a, b| a.log.timestamp.cmp(&b.log.timestamp));
        Ok(staged)
    }

    /// Number of staged log files.
    pub fn count(&self) -> Result<usize> {
        Ok(self.staged_paths()?.len())
    }

    /// Removes the given staged files. Returns how many were removed.
    pub fn remove(&self, staged: &[StagedLog]) -> Result<usize> {
        let mut removed = 0;
        for entry in staged {
            if self.store.delete(&entry.path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes every staged log.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.staged_paths()? {
            if self.store.delete(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes files in `temp/` last modified more than `max_age` before `now`.
    pub fn cleanup(&self, max_age: Duration, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - max_age;
        let mut removed = 0;

        for path in self.store.list_dir(TEMP_DIR)? {
            let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(t) => DateTime::<Utc>::from(t),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "no mtime; left in place");
                    continue;
                }
            };
            if modified < cutoff && self.store.delete(&path)? {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "cleaned up temp files");
        }
        Ok(removed)
    }

    fn staged_paths(&self) -> Result<Vec<PathBuf>> {
        let suffix = format!(".{}", Format::Json.extension());
        Ok(self
            .store
            .list_dir(TEMP_DIR)?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(STAGED_PREFIX) && n.ends_with(&suffix))
            })
            .collect())
    }
}
