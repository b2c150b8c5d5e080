//! Blob store for exam artifacts.
//!
//! The exam registry only sees the [`BlobStore`] trait: a flat namespace of names
//! mapping to byte blobs. [`FsBlobStore`] keeps each blob as one file inside a
//! directory.

use crate::errors::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Flat name -> bytes storage used for uploaded exam files.
pub trait BlobStore {
    /// Stores `bytes` under `name`, replacing any previous content.
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Reads the bytes stored under `name`.
    fn get(&self, name: &str) -> Result<Vec<u8>>;

    /// Removes the blob stored under `name`. Removing a missing blob is an error.
    fn delete(&self, name: &str) -> Result<()>;

    /// Whether a blob is stored under `name`.
    fn exists(&self, name: &str) -> bool;
}

/// Rejects names that could escape the store's namespace.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.contains("..");
    if bad {
        return Err(Error::ArtifactIo {
            name: name.to_string(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "invalid artifact name"),
        });
    }
    Ok(())
}

fn artifact_err(name: &str, source: std::io::Error) -> Error {
    Error::ArtifactIo {
        name: name.to_string(),
        source,
    }
}

/// Directory-backed blob store.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory the blobs are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(name)?;
        std::fs::write(path, bytes).map_err(|e| artifact_err(name, e))
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        std::fs::read(path).map_err(|e| artifact_err(name, e))
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        std::fs::remove_file(path).map_err(|e| artifact_err(name, e))
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }
}
