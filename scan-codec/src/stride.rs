// SPDX-License-Identifier: MIT
//! # Strided Plane Accessor
//!
//! Sensor planes come straight out of device memory: rows may be padded and pixels
//! may be spaced wider than their packed size. A [`PlaneLayout`] records that shape
//! so pixel `(x, y)` is always read at `y * row_stride + x * pixel_stride`, never at
//! `(y * width + x) * bytes_per_pixel`.
//!
//! ## Invariants
//!
//! - `pixel_stride >= bytes_per_pixel`
//! - `row_stride >= pixel_stride * width`
//! - the buffer holds at least `(height - 1) * row_stride + (width - 1) * pixel_stride + bytes_per_pixel` bytes
//!
//! The last row is allowed to stop right after its final pixel; several camera
//! stacks omit the trailing padding of the final row.

use crate::error::CodecError;

/// Shape of one strided plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes between the starts of consecutive rows
    pub row_stride: usize,
    /// Bytes between the starts of horizontally adjacent pixels
    pub pixel_stride: usize,
}

impl PlaneLayout {
    pub const fn new(width: u32, height: u32, row_stride: usize, pixel_stride: usize) -> Self {
        Self { width, height, row_stride, pixel_stride }
    }

    /// Layout of a tightly packed plane (no padding anywhere).
    pub const fn packed(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        Self {
            width,
            height,
            row_stride: width as usize * bytes_per_pixel,
            pixel_stride: bytes_per_pixel,
        }
    }

    /// Number of pixels described by the layout.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte offset of pixel `(x, y)`.
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.row_stride + x as usize * self.pixel_stride
    }

    /// Smallest buffer that can back this layout, `None` if it does not fit in `usize`.
    pub fn required_len(&self, bytes_per_pixel: usize) -> Option<usize> {
        if self.width == 0 || self.height == 0 {
            return Some(0);
        }
        let last_row = (self.height as usize - 1).checked_mul(self.row_stride)?;
        let last_pixel = (self.width as usize - 1).checked_mul(self.pixel_stride)?;
        last_row.checked_add(last_pixel)?.checked_add(bytes_per_pixel)
    }

    /// Whether the layout is already tightly packed for `bytes_per_pixel`.
    pub fn is_packed(&self, bytes_per_pixel: usize) -> bool {
        self.pixel_stride == bytes_per_pixel && self.row_stride == self.width as usize * bytes_per_pixel
    }

    /// Check the stride invariants against a concrete buffer length.
    pub fn validate(&self, bytes_per_pixel: usize, buf_len: usize) -> Result<(), CodecError> {
        if self.width == 0 || self.height == 0 {
            return Err(CodecError::InvalidLayout(format!(
                "empty plane {}x{}",
                self.width, self.height
            )));
        }
        if self.pixel_stride < bytes_per_pixel {
            return Err(CodecError::InvalidLayout(format!(
                "pixel stride {} below {} bytes per pixel",
                self.pixel_stride, bytes_per_pixel
            )));
        }
        let min_row = self.pixel_stride.checked_mul(self.width as usize).ok_or_else(|| {
            CodecError::InvalidLayout(format!(
                "pixel stride {} x width {} overflows",
                self.pixel_stride, self.width
            ))
        })?;
        if self.row_stride < min_row {
            return Err(CodecError::InvalidLayout(format!(
                "row stride {} below pixel stride x width ({})",
                self.row_stride, min_row
            )));
        }
        let needed = self.required_len(bytes_per_pixel).ok_or_else(|| {
            CodecError::InvalidLayout(format!(
                "row stride {} x height {} overflows",
                self.row_stride, self.height
            ))
        })?;
        if buf_len < needed {
            return Err(CodecError::InvalidLayout(format!(
                "buffer holds {} bytes, layout needs {}",
                buf_len, needed
            )));
        }
        Ok(())
    }

    /// Packed bytes of pixel `(x, y)`. Caller must have validated the layout.
    #[inline]
    pub fn pixel<'a>(&self, buf: &'a [u8], x: u32, y: u32, bytes_per_pixel: usize) -> &'a [u8] {
        let at = self.offset(x, y);
        &buf[at..at + bytes_per_pixel]
    }

    /// Iterate the pixels of row `y` left to right. Caller must have validated the layout.
    pub fn row<'a>(
        &'a self,
        buf: &'a [u8],
        y: u32,
        bytes_per_pixel: usize,
    ) -> impl Iterator<Item = &'a [u8]> + 'a {
        (0..self.width).map(move |x| self.pixel(buf, x, y, bytes_per_pixel))
    }
}
