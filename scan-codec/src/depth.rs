// SPDX-License-Identifier: MIT
//! # DepthCodec
//!
//! Converts one strided depth plane into calibrated distances in meters and derives
//! the per-frame metadata that is persisted next to the raw artifact.
//!
//! ## Conversion
//!
//! | Format | Bytes | Distance |
//! |--------|-------|----------|
//! | `DepthUint16` | 2 (LE) | `value / 1000.0` |
//! | `DepthFloat32` | 4 (LE) | IEEE-754 bit pattern as-is |
//!
//! ## Sample Window Statistics
//!
//! `min_depth`/`max_depth` in [`DepthFrameMetadata`] are computed over a 5×5 window
//! centred on `(width / 2, height / 2)`, not over the whole frame. Readings that are
//! zero, negative or non-finite are sensor misses and never touch min/max. When the
//! whole window is invalid, min stays at `f32::MAX` and max at `f32::MIN`; use
//! [`DepthFrameMetadata::has_valid_range`] before trusting them.
//!
//! For a dense view of the frame use [`decode`] or [`round_trip`] and
//! [`DepthGrid::stats`].

use crate::error::CodecError;
use crate::format::PixelFormat;
use crate::meta::DepthFrameMetadata;
use crate::stride::PlaneLayout;

/// Half the side of the statistics window (5×5).
pub const SAMPLE_RADIUS: u32 = 2;

/// Dense row-major grid of distances in meters.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthGrid {
    pub width: u32,
    pub height: u32,
    values: Vec<f32>,
}

/// Full-frame statistics over valid readings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub valid: usize,
}

impl DepthGrid {
    /// Distance at `(x, y)`, `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    /// Min/max/mean over every valid reading; `None` if the frame has none.
    pub fn stats(&self) -> Option<DepthStats> {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0f64;
        let mut valid = 0usize;
        for &v in self.values.iter().filter(|v| is_valid_reading(**v)) {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
            valid += 1;
        }
        (valid > 0).then(|| DepthStats {
            min,
            max,
            mean: (sum / valid as f64) as f32,
            valid,
        })
    }
}

/// A reading counts toward statistics only if it is a positive, finite distance.
#[inline]
pub fn is_valid_reading(meters: f32) -> bool {
    meters > 0.0 && meters.is_finite()
}

fn ensure_depth(format: PixelFormat) -> Result<(), CodecError> {
    if format.is_depth() {
        Ok(())
    } else {
        Err(CodecError::unsupported(format, "DepthCodec"))
    }
}

/// Convert the packed bytes of one pixel to meters. `px` holds at least `bytes_per_pixel` bytes.
#[inline]
fn to_meters(px: &[u8], format: PixelFormat) -> f32 {
    match format {
        PixelFormat::DepthUint16 => u16::from_le_bytes([px[0], px[1]]) as f32 / 1000.0,
        PixelFormat::DepthFloat32 => f32::from_le_bytes([px[0], px[1], px[2], px[3]]),
        // ensure_depth runs before any conversion
        _ => f32::NAN,
    }
}

/// Decode every pixel of a strided depth plane.
pub fn decode(plane: &[u8], layout: PlaneLayout, format: PixelFormat) -> Result<DepthGrid, CodecError> {
    ensure_depth(format)?;
    let bpp = format.bytes_per_pixel();
    layout.validate(bpp, plane.len())?;

    let mut values = Vec::with_capacity(layout.pixel_count());
    for y in 0..layout.height {
        values.extend(layout.row(plane, y, bpp).map(|px| to_meters(px, format)));
    }
    Ok(DepthGrid {
        width: layout.width,
        height: layout.height,
        values,
    })
}

/// Build the metadata record for one frame: center distance plus the 5×5 window range.
pub fn compute_metadata(
    plane: &[u8],
    layout: PlaneLayout,
    format: PixelFormat,
    timestamp_ns: u64,
) -> Result<DepthFrameMetadata, CodecError> {
    ensure_depth(format)?;
    let bpp = format.bytes_per_pixel();
    layout.validate(bpp, plane.len())?;

    let cx = layout.width / 2;
    let cy = layout.height / 2;
    let center_depth = to_meters(layout.pixel(plane, cx, cy, bpp), format);

    let mut min_depth = f32::MAX;
    let mut max_depth = f32::MIN;
    // window is clipped to the frame for planes smaller than 5x5
    let x_end = (cx + SAMPLE_RADIUS).min(layout.width - 1);
    let y_end = (cy + SAMPLE_RADIUS).min(layout.height - 1);
    for y in cy.saturating_sub(SAMPLE_RADIUS)..=y_end {
        for x in cx.saturating_sub(SAMPLE_RADIUS)..=x_end {
            let d = to_meters(layout.pixel(plane, x, y, bpp), format);
            if is_valid_reading(d) {
                min_depth = min_depth.min(d);
                max_depth = max_depth.max(d);
            }
        }
    }

    Ok(DepthFrameMetadata {
        width: layout.width,
        height: layout.height,
        format,
        timestamp_ns,
        center_depth,
        min_depth,
        max_depth,
    })
}

/// Strip stride padding: exactly `width * height * bytes_per_pixel` bytes, original byte order.
pub fn pack(plane: &[u8], layout: PlaneLayout, format: PixelFormat) -> Result<Vec<u8>, CodecError> {
    ensure_depth(format)?;
    let bpp = format.bytes_per_pixel();
    layout.validate(bpp, plane.len())?;

    if layout.is_packed(bpp) {
        return Ok(plane[..layout.pixel_count() * bpp].to_vec());
    }
    let mut out = Vec::with_capacity(layout.pixel_count() * bpp);
    for y in 0..layout.height {
        for px in layout.row(plane, y, bpp) {
            out.extend_from_slice(px);
        }
    }
    Ok(out)
}

/// Rebuild the dense grid from a persisted raw artifact and its metadata.
pub fn round_trip(metadata: &DepthFrameMetadata, raw: &[u8]) -> Result<DepthGrid, CodecError> {
    ensure_depth(metadata.format)?;
    let bpp = metadata.format.bytes_per_pixel();
    let layout = PlaneLayout::packed(metadata.width, metadata.height, bpp);
    let expected = layout.pixel_count() * bpp;
    if raw.len() != expected {
        return Err(CodecError::InvalidLayout(format!(
            "raw artifact holds {} bytes, {}x{} {} needs {}",
            raw.len(),
            metadata.width,
            metadata.height,
            metadata.format,
            expected
        )));
    }
    decode(raw, layout, metadata.format)
}
