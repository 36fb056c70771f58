//! Upload request assembly: locating the four artifacts of a capture and turning them
//! into a multipart body.

use std::sync::Arc;

use crate::error::{ScanError, ScanResult};
use crate::store::{ArtifactNames, FrameKey, FrameStore};
use crate::upload::transport::MultipartBody;

/// Form field names expected by the analysis service.
pub mod fields {
    pub const RGB_IMAGE: &str = "rgb_image";
    pub const DEPTH_IMAGE: &str = "depth_image";
    pub const RGB_META: &str = "rgb_meta";
    pub const DEPTH_META: &str = "depth_meta";
}

const PNG_MIME: &str = "image/png";
const RAW_MIME: &str = "application/octet-stream";

/// References to the artifacts of one capture. Transient, built per upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRequest {
    key: FrameKey,
    names: ArtifactNames,
}

impl UploadRequest {
    pub fn for_key(key: FrameKey) -> Self {
        let names = ArtifactNames::for_key(&key);
        Self { key, names }
    }

    pub fn key(&self) -> &FrameKey {
        &self.key
    }

    pub fn names(&self) -> &ArtifactNames {
        &self.names
    }

    /// Read every artifact once. The first absent one aborts with `MissingArtifact`.
    pub async fn load(&self, store: &dyn FrameStore) -> ScanResult<LoadedArtifacts> {
        let rgb_image = read_required(store, &self.names.rgb_image).await?;
        let depth_raw = read_required(store, &self.names.depth_raw).await?;
        let rgb_meta = read_text(store, &self.names.rgb_meta).await?;
        let depth_meta = read_text(store, &self.names.depth_meta).await?;
        Ok(LoadedArtifacts {
            names: self.names.clone(),
            rgb_image: Arc::new(rgb_image),
            depth_raw: Arc::new(depth_raw),
            rgb_meta,
            depth_meta,
        })
    }
}

async fn read_required(store: &dyn FrameStore, name: &str) -> ScanResult<Vec<u8>> {
    store
        .read(name)
        .await?
        .ok_or_else(|| ScanError::missing_artifact(name))
}

async fn read_text(store: &dyn FrameStore, name: &str) -> ScanResult<String> {
    String::from_utf8(read_required(store, name).await?).map_err(|_| ScanError::MalformedMetadata {
        detail: format!("{} is not UTF-8 text", name),
    })
}

/// Artifact contents materialised in memory, shared across attempts.
#[derive(Clone, Debug)]
pub struct LoadedArtifacts {
    names: ArtifactNames,
    rgb_image: Arc<Vec<u8>>,
    depth_raw: Arc<Vec<u8>>,
    rgb_meta: String,
    depth_meta: String,
}

impl LoadedArtifacts {
    /// A fresh body for one attempt. Binary payloads are shared, not re-read.
    pub fn to_multipart(&self) -> MultipartBody {
        MultipartBody::default()
            .file(fields::RGB_IMAGE, &self.names.rgb_image, PNG_MIME, Arc::clone(&self.rgb_image))
            .file(fields::DEPTH_IMAGE, &self.names.depth_raw, RAW_MIME, Arc::clone(&self.depth_raw))
            .text(fields::RGB_META, self.rgb_meta.clone())
            .text(fields::DEPTH_META, self.depth_meta.clone())
    }

    pub fn total_bytes(&self) -> usize {
        self.rgb_image.len() + self.depth_raw.len() + self.rgb_meta.len() + self.depth_meta.len()
    }
}
