//! Advisory lock serializing index read-modify-write cycles.

use crate::error::{ContextError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::debug;

const RETRY_ATTEMPTS: u32 = 50;
const RETRY_DELAY: Duration = Duration::from_millis(20);

/// Exclusive lock on a lock file, released on drop.
///
/// The lock file itself is left in place; only the OS-level lock matters.
pub(crate) struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Acquires the lock at `path`, retrying briefly if another process holds it.
    ///
    /// # Errors
    ///
    /// Returns `IndexLocked` if the lock is still held after the retry window.
    pub(crate) fn acquire(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| ContextError::io(path, e))?;

        for attempt in 0..RETRY_ATTEMPTS {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    // Best-effort PID marker for humans inspecting a stuck lock
                    let _ = file.set_len(0);
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(_) => {
                    debug!(attempt, path = %path.display(), "index lock busy");
                    thread::sleep(RETRY_DELAY);
                }
            }
        }

        Err(ContextError::IndexLocked(path.to_path_buf()))
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!(path = %self.path.display(), error = %e, "failed to release index lock");
        }
    }
}
