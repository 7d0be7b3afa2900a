//! Storage sinks for ingested artifacts.
//!
//! The pipeline only ever needs one capability from storage: put bytes at a
//! path with a visibility flag. [`StorageSink`] is that capability;
//! [`Disks`] maps disk identifiers (as named in `config.toml`) to sinks.
//!
//! [`LocalDisk`] is the filesystem backend. Writes go to a temporary file in
//! the destination directory and are renamed into place, so a reader of the
//! disk sees either the previous file or the complete new one, never a
//! partial write. Concurrent puts to the same path race at the rename;
//! the last one wins.

use crate::config::StorageConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("unknown disk: {0}")]
    UnknownDisk(String),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("write to {path} failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Access level requested for a stored artifact. How it maps to ACLs or file
/// modes is up to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Durable put of bytes at a path.
pub trait StorageSink: Send + Sync {
    fn put(&self, path: &str, bytes: &[u8], visibility: Visibility) -> Result<(), StorageError>;
}

/// Filesystem-backed sink rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage key to a filesystem path under the root.
    ///
    /// Rejects empty and absolute keys, keys ending in `/`, and any `..`
    /// component, so a key can never resolve outside the root.
    fn key_to_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.starts_with('/') || key.ends_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        if key.split('/').any(|part| part == "..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[cfg(unix)]
fn apply_visibility(file: &NamedTempFile, visibility: Visibility) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = match visibility {
        Visibility::Public => 0o644,
        Visibility::Private => 0o600,
    };
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_visibility(_file: &NamedTempFile, _visibility: Visibility) -> io::Result<()> {
    Ok(())
}

impl StorageSink for LocalDisk {
    fn put(&self, key: &str, bytes: &[u8], visibility: Visibility) -> Result<(), StorageError> {
        let path = self.key_to_path(key)?;
        let write_err = |source: io::Error| StorageError::Write {
            path: path.clone(),
            source,
        };
        let start = Instant::now();

        let parent = path.parent().unwrap_or(self.root.as_path());
        std::fs::create_dir_all(parent).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        apply_visibility(&tmp, visibility).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        tracing::debug!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes.len(),
            visibility = %visibility,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );
        Ok(())
    }
}

/// Registry of named storage sinks.
#[derive(Default)]
pub struct Disks {
    disks: BTreeMap<String, Box<dyn StorageSink>>,
}

impl Disks {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`LocalDisk`] per configured disk.
    pub fn from_config(config: &StorageConfig) -> Self {
        config
            .disks
            .iter()
            .fold(Self::new(), |disks, (name, disk)| {
                disks.with_disk(name, LocalDisk::new(&disk.root))
            })
    }

    pub fn with_disk(mut self, name: impl Into<String>, sink: impl StorageSink + 'static) -> Self {
        self.insert(name, sink);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, sink: impl StorageSink + 'static) {
        self.disks.insert(name.into(), Box::new(sink));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.disks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.disks.keys().map(String::as_str)
    }

    /// Put `bytes` at `path` on the disk named `disk`.
    pub fn put(
        &self,
        disk: &str,
        path: &str,
        bytes: &[u8],
        visibility: Visibility,
    ) -> Result<(), StorageError> {
        let sink = self
            .disks
            .get(disk)
            .ok_or_else(|| StorageError::UnknownDisk(disk.to_string()))?;
        sink.put(path, bytes, visibility)
    }
}

impl fmt::Debug for Disks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disks")
            .field("disks", &self.disks.keys().collect::<Vec<_>>())
            .finish()
    }
}
