//! Path-keyed document storage under the context directory.

use crate::error::{ContextError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Zstd level for compressed documents.
const COMPRESSION_LEVEL: i32 = 3;

/// Number of hex characters kept from a content digest.
pub const FINGERPRINT_LEN: usize = 16;

/// On-disk encoding of a structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
    /// Pretty JSON wrapped in a zstd frame.
    CompressedJson,
}

impl Format {
    /// File extension used for documents in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::CompressedJson => "json.zst",
        }
    }

    fn encode<T: Serialize>(&self, value: &T) -> std::result::Result<Vec<u8>, String> {
        match self {
            Format::Json => serde_json::to_vec_pretty(value).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| e.to_string()),
            Format::CompressedJson => {
                let json = serde_json::to_vec_pretty(value).map_err(|e| e.to_string())?;
                zstd::encode_all(&json[..], COMPRESSION_LEVEL).map_err(|e| e.to_string())
            }
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> std::result::Result<T, String> {
        match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_slice(bytes).map_err(|e| e.to_string()),
            Format::CompressedJson => {
                let json = zstd::decode_all(bytes).map_err(|e| e.to_string())?;
                serde_json::from_slice(&json).map_err(|e| e.to_string())
            }
        }
    }
}

/// Read/write access to documents below a root directory.
///
/// Every path argument is relative to the root. Writes create missing parent
/// directories and replace the target atomically (temp file, fsync, rename),
/// so a crash leaves either the old or the new document, never a torn one.
///
/// # Examples
///
/// ```
/// use gitctx_core::{Format, Store};
/// use tempfile::TempDir;
///
/// let tmp = TempDir::new().unwrap();
/// let store = Store::new(tmp.path());
///
/// store.write_structured("a/b/doc.json", &vec![1, 2, 3], Format::Json).unwrap();
/// let back: Vec<u32> = store.read_structured("a/b/doc.json", Format::Json).unwrap();
/// assert_eq!(back, vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Creates a store rooted at `root`. Nothing is created on disk yet.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path against the root.
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    /// Creates a directory (and parents) and returns its absolute path.
    pub fn ensure_dir(&self, rel: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.path(rel);
        fs::create_dir_all(&path).map_err(|e| ContextError::io(&path, e))?;
        Ok(path)
    }

    /// Returns true if the path exists.
    pub fn exists(&self, rel: impl AsRef<Path>) -> bool {
        self.path(rel).exists()
    }

    /// Serializes `value` and writes it atomically.
    pub fn write_structured<T: Serialize>(
        &self,
        rel: impl AsRef<Path>,
        value: &T,
        format: Format,
    ) -> Result<PathBuf> {
        let path = self.path(rel);
        let bytes = format
            .encode(value)
            .map_err(|reason| ContextError::Serialization {
                path: path.clone(),
                reason,
            })?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Reads and deserializes a document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the document does not exist and `Serialization`
    /// if it cannot be decoded.
    pub fn read_structured<T: DeserializeOwned>(
        &self,
        rel: impl AsRef<Path>,
        format: Format,
    ) -> Result<T> {
        let path = self.path(rel);
        let bytes = fs::read(&path).map_err(|e| ContextError::io(&path, e))?;
        format
            .decode(&bytes)
            .map_err(|reason| ContextError::Serialization { path, reason })
    }

    /// Writes a UTF-8 text file atomically.
    pub fn write_text(&self, rel: impl AsRef<Path>, text: &str) -> Result<PathBuf> {
        let path = self.path(rel);
        write_atomic(&path, text.as_bytes())?;
        Ok(path)
    }

    /// Reads a UTF-8 text file.
    pub fn read_text(&self, rel: impl AsRef<Path>) -> Result<String> {
        let path = self.path(rel);
        fs::read_to_string(&path).map_err(|e| ContextError::io(&path, e))
    }

    /// Deletes a file, or a directory recursively.
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn delete(&self, rel: impl AsRef<Path>) -> Result<bool> {
        let path = self.path(rel);
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(ContextError::io(&path, e)),
        };

        if meta.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| ContextError::io(&path, e))?;
        } else {
            fs::remove_file(&path).map_err(|e| ContextError::io(&path, e))?;
        }
        Ok(true)
    }

    /// Copies a file or a directory tree. Parent directories of `dst` are created.
    pub fn copy(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
        let src = self.path(src);
        let dst = self.path(dst);

        if !src.exists() {
            return Err(ContextError::NotFound(src));
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| ContextError::io(parent, e))?;
        }

        if src.is_dir() {
            copy_dir_recursive(&src, &dst)
        } else {
            fs::copy(&src, &dst).map_err(|e| ContextError::io(&src, e))?;
            Ok(())
        }
    }

    /// Lists the entries of a directory, sorted by path.
    ///
    /// A missing directory yields an empty list.
    pub fn list_dir(&self, rel: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let path = self.path(rel);
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&path).map_err(|e| ContextError::io(&path, e))? {
            let entry = entry.map_err(|e| ContextError::io(&path, e))?;
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }

    /// Removes empty directories from `rel` upwards, stopping at `stop`.
    pub fn prune_empty_dirs(&self, rel: impl AsRef<Path>, stop: impl AsRef<Path>) {
        let stop = self.path(stop);
        let mut current = self.path(rel);

        while current.starts_with(&stop) && current != stop {
            // remove_dir only succeeds on empty directories
            if fs::remove_dir(&current).is_err() {
                break;
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }
    }
}

/// Returns the content signature of `bytes`: a truncated BLAKE3 digest.
///
/// Used to detect file changes between snapshots; not a security primitive.
///
/// # Examples
///
/// ```
/// let fp = gitctx_core::fingerprint(b"hello");
/// assert_eq!(fp.len(), 16);
/// assert_eq!(fp, gitctx_core::fingerprint(b"hello"));
/// ```
pub fn fingerprint(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hex::encode(&hash.as_bytes()[..FINGERPRINT_LEN / 2])
}

/// Fingerprints a file by streaming its contents.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| ContextError::io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = file.read(&mut buf).map_err(|e| ContextError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(&hasher.finalize().as_bytes()[..FINGERPRINT_LEN / 2]))
}

/// Writes bytes to `path` atomically.
///
/// Uses temp file + fsync + rename for crash safety.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ContextError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    {
        let mut file = File::create(&tmp_path).map_err(|e| ContextError::io(&tmp_path, e))?;
        file.write_all(bytes)
            .map_err(|e| ContextError::io(&tmp_path, e))?;
        file.sync_all().map_err(|e| ContextError::io(&tmp_path, e))?;
    }

    fs::rename(&tmp_path, path).map_err(|e| ContextError::io(path, e))?;

    // fsync parent directory (Unix-specific for crash safety)
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            if let Ok(dir_file) = File::open(parent) {
                let _ = dir_file.sync_all();
            }
        }
    }

    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| ContextError::io(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| ContextError::io(src, e))? {
        let entry = entry.map_err(|e| ContextError::io(src, e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| ContextError::io(&src_path, e))?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(|e| ContextError::io(&src_path, e))?;
        }
    }
    Ok(())
}
