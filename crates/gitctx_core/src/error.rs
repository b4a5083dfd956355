//! Error types for gitctx_core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for context-graph operations.
///
/// Structural errors (branch or commit existence, self-merge) abort the
/// operation that raised them. Storage errors propagate unchanged. Analysis
/// errors never reach callers of the engine: they are absorbed by the
/// fallback provider.
#[derive(Error, Debug)]
pub enum ContextError {
    /// An operation was attempted before `init`.
    #[error("not a context repository (no index at {}); run 'gitctx init' first", path.display())]
    NotInitialized {
        /// Path where the index document was expected
        path: PathBuf,
    },

    /// The named branch does not exist in the index.
    #[error("{op}: branch '{branch}' not found")]
    BranchNotFound {
        /// Operation that looked the branch up
        op: &'static str,
        /// The missing branch
        branch: String,
    },

    /// A branch with this name already exists.
    #[error("branch: '{0}' already exists")]
    BranchAlreadyExists(String),

    /// The branch name is empty or unusable as a storage path.
    #[error("branch: invalid name '{name}': {reason}")]
    InvalidBranchName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// `main` cannot be deleted.
    #[error("delete-branch: '{0}' is protected and cannot be deleted")]
    ProtectedBranch(String),

    /// The checked-out branch cannot be deleted.
    #[error("delete-branch: '{0}' is the current branch; check out another branch first")]
    ActiveBranchDeletion(String),

    /// A branch was merged into itself.
    #[error("merge: cannot merge branch '{0}' into itself")]
    SelfMerge(String),

    /// A referenced commit document is missing from the store.
    #[error("commit '{id}' not found on branch '{branch}'")]
    CommitNotFound {
        /// Branch whose history was searched
        branch: String,
        /// The missing commit id
        id: String,
    },

    /// Filesystem path that was expected to exist does not.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O error during file operations.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A structured document could not be encoded or decoded.
    #[error("serialization error at {}: {reason}", path.display())]
    Serialization {
        /// Document path
        path: PathBuf,
        /// Encoder or decoder message
        reason: String,
    },

    /// Archive artifacts could not be written. Reported, never raised by `merge`.
    #[error("archive write failed for branch '{branch}': {reason}")]
    ArchiveWrite {
        /// Branch being archived
        branch: String,
        /// Description of the failure
        reason: String,
    },

    /// An analysis backend failed (transport, auth, malformed response).
    #[error("analysis backend '{provider}' failed: {reason}")]
    Analysis {
        /// Provider name
        provider: String,
        /// Description of the failure
        reason: String,
    },

    /// No analysis provider is registered under this name.
    #[error("unknown analysis provider '{0}' (expected stub, openai, anthropic, deepseek or ollama)")]
    UnknownProvider(String),

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The underlying source repository could not be queried.
    #[error("source repository error: {0}")]
    SourceRepository(String),

    /// The index lock is held by another process.
    #[error("index locked by another process ({})", .0.display())]
    IndexLocked(PathBuf),
}

impl ContextError {
    /// Wraps an I/O error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path);
        }
        Self::Io { path, source }
    }

    pub(crate) fn branch_not_found(op: &'static str, branch: &str) -> Self {
        Self::BranchNotFound {
            op,
            branch: branch.to_string(),
        }
    }

    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized { .. } => Some("Run 'gitctx init' in the repository root."),
            Self::BranchNotFound { .. } => Some("List branches with 'gitctx branches'."),
            Self::BranchAlreadyExists(_) => {
                Some("Pick another name, or check the branch out with 'gitctx checkout'.")
            }
            Self::ActiveBranchDeletion(_) => Some("Run 'gitctx checkout main' first."),
            Self::SelfMerge(_) => {
                Some("Check out the target branch, then merge the source branch into it.")
            }
            Self::CommitNotFound { .. } => {
                Some("The commit may live on another branch; pass --branch to look there.")
            }
            Self::IndexLocked(_) => Some(
                "Wait for the other gitctx process to finish, or remove the stale lock file if it is dead.",
            ),
            Self::UnknownProvider(_) => {
                Some("Set [analysis].provider in config.toml or GITCONTEXT_LLM_PROVIDER.")
            }
            _ => None,
        }
    }
}

/// Convenience Result type for gitctx_core operations.
pub type Result<T> = std::result::Result<T, ContextError>;
