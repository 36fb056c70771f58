//! # Sensor Capability
//!
//! The platform sensor is an external collaborator. This module only fixes the shape
//! of what it hands back (an opaque image handle with strided planes) and the two
//! capture steps that turn such a handle into stored artifacts.

// Standard library imports
use std::sync::Arc;

// External crate imports
use anyhow::Result;
use async_trait::async_trait;
use scan_codec::meta::{DepthFrameMetadata, RgbFrameMetadata};
use scan_codec::{PixelFormat, PlaneLayout, depth, rgb};
use tokio::task::spawn_blocking;
use tracing::{debug, info};

// Internal module imports
use crate::error::{ScanError, ScanResult};
use crate::store::{FrameKey, FrameStore, write_depth_pair, write_rgb_pair};

/// One plane of a sensor image.
#[derive(Clone, Debug)]
pub struct Plane {
    /// Raw device bytes, including any padding
    pub data: Arc<Vec<u8>>,
    /// Bytes between the starts of consecutive rows
    pub row_stride: usize,
    /// Bytes between the starts of adjacent pixels
    pub pixel_stride: usize,
}

/// Opaque image handle produced by the sensor capability.
#[derive(Clone, Debug)]
pub struct SensorImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub planes: Vec<Plane>,
    /// Device monotonic clock, nanoseconds
    pub timestamp_ns: u64,
}

impl SensorImage {
    /// First plane; depth and interleaved color images carry exactly one.
    pub fn primary_plane(&self) -> ScanResult<&Plane> {
        self.planes.first().ok_or_else(|| ScanError::InvalidLayout {
            detail: format!("{} image has no planes", self.format),
        })
    }

    /// Layout descriptor of the first plane.
    pub fn primary_layout(&self) -> ScanResult<PlaneLayout> {
        let plane = self.primary_plane()?;
        Ok(PlaneLayout::new(self.width, self.height, plane.row_stride, plane.pixel_stride))
    }
}

/// Abstract interface for frame capture sources.
/// Enables pluggable sensor backends (device cameras, replays, synthetic patterns).
#[async_trait]
pub trait CaptureSource: Send {
    /// Captures the next image from the sensor asynchronously.
    ///
    /// # Returns
    ///
    /// A `Result` containing the next `SensorImage` if successful, or an error otherwise.
    async fn capture_frame(&mut self) -> Result<SensorImage>;

    /// Short label used in logs and errors, e.g. `depth` or `rgb`.
    fn label(&self) -> &str;
}

/// Depth image → (metadata, packed raw bytes). Pure, no I/O.
pub fn encode_depth(image: &SensorImage) -> ScanResult<(DepthFrameMetadata, Vec<u8>)> {
    let plane = image.primary_plane()?;
    let layout = image.primary_layout()?;
    let metadata = depth::compute_metadata(&plane.data, layout, image.format, image.timestamp_ns)?;
    let raw = depth::pack(&plane.data, layout, image.format)?;
    Ok((metadata, raw))
}

/// Color image → (metadata, PNG bytes). Pure, no I/O.
pub fn encode_rgb(image: &SensorImage, mirror_y: bool) -> ScanResult<(RgbFrameMetadata, Vec<u8>)> {
    let plane = image.primary_plane()?;
    let layout = image.primary_layout()?;
    let output = PixelFormat::Rgb24;
    let pixels = rgb::convert(&plane.data, layout, image.format, output, mirror_y)?;
    let png = rgb::encode_image(&pixels, image.width, image.height, output)?;
    let metadata = RgbFrameMetadata {
        width: image.width,
        height: image.height,
        format: output,
        timestamp_ns: image.timestamp_ns,
        encoding: rgb::IMAGE_ENCODING.to_string(),
        mirrored: mirror_y,
    };
    Ok((metadata, png))
}

/// Acquire one depth image, encode it and store the depth artifact pair under `key`.
pub async fn capture_depth(
    source: &mut dyn CaptureSource,
    store: &dyn FrameStore,
    key: &FrameKey,
) -> ScanResult<DepthFrameMetadata> {
    let image = source
        .capture_frame()
        .await
        .map_err(|e| ScanError::capture(source.label(), format!("{:#}", e)))?;
    debug!(
        key = %key,
        width = image.width,
        height = image.height,
        format = %image.format,
        "depth image acquired"
    );

    let (metadata, raw) = spawn_blocking(move || encode_depth(&image))
        .await
        .map_err(|e| ScanError::EncodeFailed {
            detail: format!("depth encode task: {}", e),
        })??;
    write_depth_pair(store, key, &raw, &metadata).await?;
    if metadata.has_valid_range() {
        info!(key = %key, center_m = metadata.center_depth, min_m = metadata.min_depth, max_m = metadata.max_depth, "depth frame stored");
    } else {
        info!(key = %key, center_m = metadata.center_depth, "depth frame stored, no valid depth in sample window");
    }
    Ok(metadata)
}

/// Acquire one color image, encode it and store the color artifact pair under `key`.
pub async fn capture_rgb(
    source: &mut dyn CaptureSource,
    store: &dyn FrameStore,
    key: &FrameKey,
    mirror_y: bool,
) -> ScanResult<RgbFrameMetadata> {
    let image = source
        .capture_frame()
        .await
        .map_err(|e| ScanError::capture(source.label(), format!("{:#}", e)))?;

    let (metadata, png) = spawn_blocking(move || encode_rgb(&image, mirror_y))
        .await
        .map_err(|e| ScanError::EncodeFailed {
            detail: format!("color encode task: {}", e),
        })??;
    write_rgb_pair(store, key, &png, &metadata).await?;
    info!(key = %key, width = metadata.width, height = metadata.height, bytes = png.len(), "color frame stored");
    Ok(metadata)
}
