use anyhow::Result;
use gitctx_core::{ContextEngine, ContextError};

/// Declarative assertions on repository state
pub enum Assertion {
    // Branches
    CurrentBranch(String),
    BranchExists(String),
    BranchMissing(String),
    BranchStorageRemoved(String),

    // Commits
    CommitCount { branch: String, count: usize },
    HeadMessageContains(String),
    HeadDecisions(Vec<String>),
    SquashedFrom { branch: String, original_commits: usize },

    // Working state
    UncommittedChanges(bool),
    PendingOtaLogs(usize),

    // Archive
    ArchiveCount(usize),

    // Custom (takes mutable reference to allow reads through the cache)
    Custom(Box<dyn Fn(&mut ContextEngine) -> Result<()> + Send + Sync>),
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentBranch(b) => write!(f, "CurrentBranch({:?})", b),
            Self::BranchExists(b) => write!(f, "BranchExists({:?})", b),
            Self::BranchMissing(b) => write!(f, "BranchMissing({:?})", b),
            Self::BranchStorageRemoved(b) => write!(f, "BranchStorageRemoved({:?})", b),
            Self::CommitCount { branch, count } => {
                write!(f, "CommitCount {{ branch: {:?}, count: {} }}", branch, count)
            }
            Self::HeadMessageContains(s) => write!(f, "HeadMessageContains({:?})", s),
            Self::HeadDecisions(d) => write!(f, "HeadDecisions({:?})", d),
            Self::SquashedFrom {
                branch,
                original_commits,
            } => write!(
                f,
                "SquashedFrom {{ branch: {:?}, original_commits: {} }}",
                branch, original_commits
            ),
            Self::UncommittedChanges(b) => write!(f, "UncommittedChanges({})", b),
            Self::PendingOtaLogs(n) => write!(f, "PendingOtaLogs({})", n),
            Self::ArchiveCount(n) => write!(f, "ArchiveCount({})", n),
            Self::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

/// Expected error kinds for `ExpectError` steps
#[derive(Clone, Debug)]
pub enum ErrorMatch {
    NotInitialized,
    BranchNotFound,
    BranchAlreadyExists,
    InvalidBranchName,
    ProtectedBranch,
    ActiveBranchDeletion,
    SelfMerge,
}

impl ErrorMatch {
    /// True if `error` is of this kind
    pub fn matches(&self, error: &ContextError) -> bool {
        matches!(
            (self, error),
            (Self::NotInitialized, ContextError::NotInitialized { .. })
                | (Self::BranchNotFound, ContextError::BranchNotFound { .. })
                | (Self::BranchAlreadyExists, ContextError::BranchAlreadyExists(_))
                | (Self::InvalidBranchName, ContextError::InvalidBranchName { .. })
                | (Self::ProtectedBranch, ContextError::ProtectedBranch(_))
                | (Self::ActiveBranchDeletion, ContextError::ActiveBranchDeletion(_))
                | (Self::SelfMerge, ContextError::SelfMerge(_))
        )
    }
}
