// SPDX-License-Identifier: MIT
//! # Sensor Pixel Formats
//!
//! The sensor capability tags every image handle with one of these formats. Depth
//! formats feed the DepthCodec, color formats feed the RgbCodec; handing a plane to
//! the wrong codec fails with [`CodecError::UnsupportedFormat`].
//!
//! The textual names are what metadata artifacts store in their `format:` field.

use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// Pixel format of one sensor plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Unsigned 16-bit distance in millimeters (little-endian)
    DepthUint16,
    /// IEEE-754 32-bit float distance in meters (little-endian)
    DepthFloat32,
    /// Packed R, G, B bytes
    Rgb24,
    /// Packed R, G, B, A bytes
    Rgba32,
    /// Packed B, G, R, A bytes
    Bgra32,
}

impl PixelFormat {
    /// Bytes occupied by one tightly packed pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::DepthUint16 => 2,
            PixelFormat::DepthFloat32 => 4,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba32 | PixelFormat::Bgra32 => 4,
        }
    }

    pub const fn is_depth(self) -> bool {
        matches!(self, PixelFormat::DepthUint16 | PixelFormat::DepthFloat32)
    }

    /// Name written to metadata artifacts.
    pub const fn as_str(self) -> &'static str {
        match self {
            PixelFormat::DepthUint16 => "DepthUint16",
            PixelFormat::DepthFloat32 => "DepthFloat32",
            PixelFormat::Rgb24 => "RGB24",
            PixelFormat::Rgba32 => "RGBA32",
            PixelFormat::Bgra32 => "BGRA32",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "DepthUint16" => Ok(PixelFormat::DepthUint16),
            "DepthFloat32" => Ok(PixelFormat::DepthFloat32),
            "RGB24" => Ok(PixelFormat::Rgb24),
            "RGBA32" => Ok(PixelFormat::Rgba32),
            "BGRA32" => Ok(PixelFormat::Bgra32),
            other => Err(CodecError::UnsupportedFormat(format!("unknown format name '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for f in [
            PixelFormat::DepthUint16,
            PixelFormat::DepthFloat32,
            PixelFormat::Rgb24,
            PixelFormat::Rgba32,
            PixelFormat::Bgra32,
        ] {
            assert_eq!(f.as_str().parse::<PixelFormat>().unwrap(), f);
        }
    }

    #[test]
    fn unknown_name_is_unsupported() {
        let err = "YUV_420_888".parse::<PixelFormat>().unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat(_)));
    }

    #[test]
    fn depth_bytes_per_pixel() {
        assert_eq!(PixelFormat::DepthUint16.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::DepthFloat32.bytes_per_pixel(), 4);
        assert!(!PixelFormat::Rgb24.is_depth());
    }
}
