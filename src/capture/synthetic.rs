//! Synthetic sensors producing padded, strided test-pattern frames.
//!
//! Used by the CLI's dry runs and by tests. The depth pattern is a shallow bowl
//! (closest at the center) with a one-pixel ring of zero readings at the frame edge,
//! like the invalid returns real sensors produce there.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Result, bail};
use async_trait::async_trait;
use scan_codec::PixelFormat;

use super::sensor::{CaptureSource, Plane, SensorImage};

/// Extra bytes appended to every row, so decoders can't get away with packed math.
const ROW_PADDING: usize = 8;

/// Synthetic depth camera.
pub struct SyntheticDepthSource {
    width: u32,
    height: u32,
    format: PixelFormat,
    epoch: Instant,
}

impl SyntheticDepthSource {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            epoch: Instant::now(),
        }
    }

    /// Distance in millimeters at `(x, y)`; 0 on the border.
    pub fn millimeters_at(&self, x: u32, y: u32) -> u16 {
        if x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height {
            return 0;
        }
        let dx = x.abs_diff(self.width / 2) as u64;
        let dy = y.abs_diff(self.height / 2) as u64;
        (450 + (dx * dx + dy * dy) / 4).min(u16::MAX as u64) as u16
    }
}

#[async_trait]
impl CaptureSource for SyntheticDepthSource {
    async fn capture_frame(&mut self) -> Result<SensorImage> {
        let bpp = self.format.bytes_per_pixel();
        if !self.format.is_depth() {
            bail!("synthetic depth source configured with color format {}", self.format);
        }
        let row_stride = self.width as usize * bpp + ROW_PADDING;
        let mut data = vec![0u8; row_stride * self.height as usize];
        for y in 0..self.height {
            for x in 0..self.width {
                let at = y as usize * row_stride + x as usize * bpp;
                let mm = self.millimeters_at(x, y);
                match self.format {
                    PixelFormat::DepthUint16 => data[at..at + 2].copy_from_slice(&mm.to_le_bytes()),
                    _ => data[at..at + 4].copy_from_slice(&(mm as f32 / 1000.0).to_le_bytes()),
                }
            }
        }
        Ok(SensorImage {
            width: self.width,
            height: self.height,
            format: self.format,
            planes: vec![Plane {
                data: Arc::new(data),
                row_stride,
                pixel_stride: bpp,
            }],
            timestamp_ns: self.epoch.elapsed().as_nanos() as u64,
        })
    }

    fn label(&self) -> &str {
        "depth"
    }
}

/// Synthetic color camera emitting BGRA frames.
pub struct SyntheticColorSource {
    width: u32,
    height: u32,
    epoch: Instant,
    frames: u64,
}

impl SyntheticColorSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            epoch: Instant::now(),
            frames: 0,
        }
    }
}

#[async_trait]
impl CaptureSource for SyntheticColorSource {
    async fn capture_frame(&mut self) -> Result<SensorImage> {
        let row_stride = self.width as usize * 4 + ROW_PADDING;
        let mut data = vec![0u8; row_stride * self.height as usize];
        let shade = (self.frames % 256) as u8;
        for y in 0..self.height {
            for x in 0..self.width {
                let at = y as usize * row_stride + x as usize * 4;
                let r = (x * 255 / self.width.max(1)) as u8;
                let g = (y * 255 / self.height.max(1)) as u8;
                data[at..at + 4].copy_from_slice(&[shade, g, r, 0xFF]);
            }
        }
        self.frames += 1;
        Ok(SensorImage {
            width: self.width,
            height: self.height,
            format: PixelFormat::Bgra32,
            planes: vec![Plane {
                data: Arc::new(data),
                row_stride,
                pixel_stride: 4,
            }],
            timestamp_ns: self.epoch.elapsed().as_nanos() as u64,
        })
    }

    fn label(&self) -> &str {
        "rgb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn depth_frames_are_padded() {
        let mut source = SyntheticDepthSource::new(10, 6, PixelFormat::DepthFloat32);
        let image = source.capture_frame().await.unwrap();
        let plane = &image.planes[0];
        assert_eq!(plane.row_stride, 10 * 4 + ROW_PADDING);
        assert_eq!(plane.data.len(), plane.row_stride * 6);
    }

    #[test]
    fn bowl_is_closest_at_center_and_zero_at_edges() {
        let source = SyntheticDepthSource::new(9, 9, PixelFormat::DepthUint16);
        assert_eq!(source.millimeters_at(4, 4), 450);
        assert!(source.millimeters_at(6, 6) > 450);
        assert_eq!(source.millimeters_at(0, 4), 0);
        assert_eq!(source.millimeters_at(8, 8), 0);
    }

    #[tokio::test]
    async fn color_frames_change_shade_per_capture() {
        let mut source = SyntheticColorSource::new(4, 2);
        let first = source.capture_frame().await.unwrap();
        let second = source.capture_frame().await.unwrap();
        assert_eq!(first.planes[0].data[0], 0);
        assert_eq!(second.planes[0].data[0], 1);
    }

    #[tokio::test]
    async fn color_format_is_rejected_for_depth() {
        let mut source = SyntheticDepthSource::new(4, 4, PixelFormat::Rgb24);
        assert!(source.capture_frame().await.is_err());
    }
}
