//! # File Store
//!
//! [`FrameStore`] backed by a directory on the local filesystem.
//!
//! Writes go to a `.part` sibling first and are renamed into place, so a reader never
//! observes a half-written artifact under its final name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::trace;

use super::FrameStore;
use crate::error::{ScanError, ScanResult};

/// Artifacts stored as files under one base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    /// The directory is created on first write.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Full path of artifact `name`. Names may not contain path components.
    pub fn path_of(&self, name: &str) -> ScanResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ScanError::config(
                "artifact name",
                format!("'{}' is not a plain file name", name),
            ));
        }
        Ok(self.base.join(name))
    }
}

fn display(path: &Path) -> Option<String> {
    Some(path.display().to_string())
}

#[async_trait]
impl FrameStore for FileStore {
    async fn write(&self, name: &str, bytes: &[u8]) -> ScanResult<()> {
        let path = self.path_of(name)?;
        tokio::fs::create_dir_all(&self.base)
            .await
            .map_err(|e| ScanError::io("create artifact dir", display(&self.base), e))?;

        let partial = self.base.join(format!("{}.part", name));
        tokio::fs::write(&partial, bytes)
            .await
            .map_err(|e| ScanError::io("write artifact", display(&partial), e))?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| ScanError::io("publish artifact", display(&path), e))?;
        trace!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(())
    }

    async fn read(&self, name: &str) -> ScanResult<Option<Vec<u8>>> {
        let path = self.path_of(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ScanError::io("read artifact", display(&path), e)),
        }
    }

    async fn exists(&self, name: &str) -> ScanResult<bool> {
        let path = self.path_of(name)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| ScanError::io("stat artifact", display(&path), e))
    }

    async fn remove(&self, name: &str) -> ScanResult<()> {
        let path = self.path_of(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScanError::io("remove artifact", display(&path), e)),
        }
    }
}
