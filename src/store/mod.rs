//! # Frame Store
//!
//! Thin I/O boundary between the codecs and the upload client. A capture writes its
//! artifacts here under a shared [`FrameKey`]; the upload client reads them back.
//!
//! ## Artifact Naming
//!
//! ```text
//! capture_1717171717123_depth.raw        packed depth values, no header
//! capture_1717171717123_depth_meta.txt   DepthFrameMetadata record
//! capture_1717171717123_rgb.png          encoded color still
//! capture_1717171717123_rgb_meta.txt     RgbFrameMetadata record
//! ```
//!
//! Binary artifacts and their metadata records are written and removed as pairs via
//! [`write_depth_pair`], [`write_rgb_pair`] and [`remove_depth_pair`].

// Standard library imports
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// External crate imports
use async_trait::async_trait;
use scan_codec::meta::{DepthFrameMetadata, RgbFrameMetadata};
use tracing::{debug, warn};

// Internal module imports
use crate::error::{ScanError, ScanResult};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Named byte sinks that persist artifacts.
#[async_trait]
pub trait FrameStore: Send + Sync {
    /// Create or replace artifact `name`. The artifact is complete once this returns.
    async fn write(&self, name: &str, bytes: &[u8]) -> ScanResult<()>;

    /// Read artifact `name`, `None` if it does not exist.
    async fn read(&self, name: &str) -> ScanResult<Option<Vec<u8>>>;

    /// Whether artifact `name` exists.
    async fn exists(&self, name: &str) -> ScanResult<bool> {
        Ok(self.read(name).await?.is_some())
    }

    /// Delete artifact `name`. Deleting an absent artifact is not an error.
    async fn remove(&self, name: &str) -> ScanResult<()>;
}

/// Timestamp-derived identity shared by every artifact of one capture.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameKey(String);

impl FrameKey {
    /// Key for a capture started at `millis` since the Unix epoch.
    pub fn from_millis(millis: u128) -> Self {
        Self(format!("capture_{}", millis))
    }

    /// Key for a capture starting now.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self::from_millis(millis)
    }

    /// Use an existing stem, e.g. one given on the command line.
    pub fn parse(stem: &str) -> ScanResult<Self> {
        let stem = stem.trim();
        if stem.is_empty() || stem.contains(['/', '\\']) || stem.contains("..") {
            return Err(ScanError::config("key", format!("'{}' is not a valid artifact stem", stem)));
        }
        Ok(Self(stem.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four artifact names belonging to one key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactNames {
    pub depth_raw: String,
    pub depth_meta: String,
    pub rgb_image: String,
    pub rgb_meta: String,
}

impl ArtifactNames {
    pub fn for_key(key: &FrameKey) -> Self {
        Self {
            depth_raw: format!("{}_depth.raw", key),
            depth_meta: format!("{}_depth_meta.txt", key),
            rgb_image: format!("{}_rgb.{}", key, scan_codec::rgb::IMAGE_ENCODING),
            rgb_meta: format!("{}_rgb_meta.txt", key),
        }
    }
}

/// Write one pair; if the record cannot be written the binary half is removed again.
async fn write_pair(store: &dyn FrameStore, binary: (&str, &[u8]), record: (&str, String)) -> ScanResult<()> {
    store.write(binary.0, binary.1).await?;
    if let Err(e) = store.write(record.0, record.1.as_bytes()).await {
        if let Err(cleanup) = store.remove(binary.0).await {
            warn!(artifact = binary.0, error = %cleanup, "could not remove orphaned artifact");
        }
        return Err(e);
    }
    debug!(binary = binary.0, record = record.0, bytes = binary.1.len(), "artifact pair written");
    Ok(())
}

/// Persist the packed depth buffer together with its metadata record.
pub async fn write_depth_pair(
    store: &dyn FrameStore,
    key: &FrameKey,
    raw: &[u8],
    metadata: &DepthFrameMetadata,
) -> ScanResult<()> {
    let names = ArtifactNames::for_key(key);
    write_pair(store, (&names.depth_raw, raw), (&names.depth_meta, metadata.to_text())).await
}

/// Persist the encoded color still together with its metadata record.
pub async fn write_rgb_pair(
    store: &dyn FrameStore,
    key: &FrameKey,
    image: &[u8],
    metadata: &RgbFrameMetadata,
) -> ScanResult<()> {
    let names = ArtifactNames::for_key(key);
    write_pair(store, (&names.rgb_image, image), (&names.rgb_meta, metadata.to_text())).await
}

/// Read the depth pair back: parsed metadata plus the packed raw bytes.
pub async fn read_depth_pair(store: &dyn FrameStore, key: &FrameKey) -> ScanResult<(DepthFrameMetadata, Vec<u8>)> {
    let names = ArtifactNames::for_key(key);
    let meta_bytes = store
        .read(&names.depth_meta)
        .await?
        .ok_or_else(|| ScanError::missing_artifact(&names.depth_meta))?;
    let raw = store
        .read(&names.depth_raw)
        .await?
        .ok_or_else(|| ScanError::missing_artifact(&names.depth_raw))?;
    let text = String::from_utf8(meta_bytes).map_err(|_| ScanError::MalformedMetadata {
        detail: format!("{} is not UTF-8", names.depth_meta),
    })?;
    Ok((DepthFrameMetadata::parse(&text)?, raw))
}

/// Delete both halves of the depth pair.
pub async fn remove_depth_pair(store: &dyn FrameStore, key: &FrameKey) -> ScanResult<()> {
    let names = ArtifactNames::for_key(key);
    store.remove(&names.depth_raw).await?;
    store.remove(&names.depth_meta).await
}
