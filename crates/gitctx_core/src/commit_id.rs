//! Commit identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a context commit: 12 lowercase hex characters.
///
/// Ids are content-independent. They are derived from the creation time and
/// a fresh random token, so two commits with identical content still get
/// distinct ids. Uniqueness is probabilistic; the engine additionally rejects
/// a freshly generated id that already exists anywhere in the index.
///
/// # Examples
///
/// ```
/// use gitctx_core::CommitId;
///
/// let id = CommitId::generate(chrono::Utc::now());
/// assert_eq!(id.as_str().len(), 12);
/// assert_eq!(id.short().len(), 8);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Length of a generated id in hex characters.
    pub const LEN: usize = 12;

    /// Length of the display form returned by [`CommitId::short`].
    pub const SHORT_LEN: usize = 8;

    /// Generates a new id from `now` and a random v4 UUID.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(now.to_rfc3339().as_bytes());
        hasher.update(uuid::Uuid::new_v4().as_bytes());
        let digest = hasher.finalize();
        Self(hex::encode(&digest.as_bytes()[..Self::LEN / 2]))
    }

    /// Wraps an existing id string (e.g. one read back from the index).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Accepts only ids of the generated shape: [`Self::LEN`] lowercase hex characters.
    pub fn parse(id: &str) -> Option<Self> {
        let well_formed = id.len() == Self::LEN
            && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(id.to_string()))
    }

    /// Returns the full id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated id used in console output.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(Self::SHORT_LEN)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", self.0)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
