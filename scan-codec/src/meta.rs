// SPDX-License-Identifier: MIT
//! # Artifact Metadata Records
//!
//! Every binary artifact travels with a small text record in `field:value` form, one
//! field per line. The record is written once, next to its binary twin, and never
//! edited afterwards.
//!
//! ```text
//! width:640
//! height:480
//! format:DepthUint16
//! timestamp:1717171717000000
//! centerDepth:0.742
//! minDepth:0.731
//! maxDepth:0.755
//! ```
//!
//! Unknown fields are ignored on parse so newer writers stay readable.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::CodecError;
use crate::format::PixelFormat;

/// Metadata persisted next to a raw depth artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthFrameMetadata {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Device monotonic clock, nanoseconds
    pub timestamp_ns: u64,
    /// Distance at `(width / 2, height / 2)` in meters
    pub center_depth: f32,
    /// Smallest valid reading in the 5×5 center window, `f32::MAX` if none
    pub min_depth: f32,
    /// Largest valid reading in the 5×5 center window, `f32::MIN` if none
    pub max_depth: f32,
}

impl DepthFrameMetadata {
    /// False when the sample window held no valid reading and min/max are still sentinels.
    pub fn has_valid_range(&self) -> bool {
        self.min_depth <= self.max_depth
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "width:{}", self.width);
        let _ = writeln!(out, "height:{}", self.height);
        let _ = writeln!(out, "format:{}", self.format);
        let _ = writeln!(out, "timestamp:{}", self.timestamp_ns);
        let _ = writeln!(out, "centerDepth:{}", self.center_depth);
        let _ = writeln!(out, "minDepth:{}", self.min_depth);
        let _ = writeln!(out, "maxDepth:{}", self.max_depth);
        out
    }

    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let record = TextRecord::parse(text)?;
        let format: PixelFormat = record.raw("format")?.parse()?;
        if !format.is_depth() {
            return Err(CodecError::unsupported(format, "depth metadata"));
        }
        Ok(Self {
            width: record.field("width")?,
            height: record.field("height")?,
            format,
            timestamp_ns: record.field("timestamp")?,
            center_depth: record.field("centerDepth")?,
            min_depth: record.field("minDepth")?,
            max_depth: record.field("maxDepth")?,
        })
    }
}

/// Metadata persisted next to an encoded color still.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbFrameMetadata {
    pub width: u32,
    pub height: u32,
    /// Pixel format of the buffer that was encoded
    pub format: PixelFormat,
    pub timestamp_ns: u64,
    /// Still-image encoding of the companion artifact, e.g. `png`
    pub encoding: String,
    /// Whether rows were flipped vertically before encoding
    pub mirrored: bool,
}

impl RgbFrameMetadata {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "width:{}", self.width);
        let _ = writeln!(out, "height:{}", self.height);
        let _ = writeln!(out, "format:{}", self.format);
        let _ = writeln!(out, "timestamp:{}", self.timestamp_ns);
        let _ = writeln!(out, "encoding:{}", self.encoding);
        let _ = writeln!(out, "mirrored:{}", self.mirrored);
        out
    }

    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let record = TextRecord::parse(text)?;
        Ok(Self {
            width: record.field("width")?,
            height: record.field("height")?,
            format: record.raw("format")?.parse()?,
            timestamp_ns: record.field("timestamp")?,
            encoding: record.raw("encoding")?.to_string(),
            mirrored: record.field("mirrored")?,
        })
    }
}

struct TextRecord<'a> {
    fields: HashMap<&'a str, &'a str>,
}

impl<'a> TextRecord<'a> {
    fn parse(text: &'a str) -> Result<Self, CodecError> {
        let mut fields = HashMap::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| CodecError::MalformedMetadata(format!("line '{}' has no ':'", line)))?;
            fields.insert(key.trim(), value.trim());
        }
        Ok(Self { fields })
    }

    fn raw(&self, name: &str) -> Result<&'a str, CodecError> {
        self.fields
            .get(name)
            .copied()
            .ok_or_else(|| CodecError::MalformedMetadata(format!("missing field '{}'", name)))
    }

    fn field<T: FromStr>(&self, name: &str) -> Result<T, CodecError> {
        let raw = self.raw(name)?;
        raw.parse()
            .map_err(|_| CodecError::MalformedMetadata(format!("field '{}' has invalid value '{}'", name, raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_meta() -> DepthFrameMetadata {
        DepthFrameMetadata {
            width: 256,
            height: 192,
            format: PixelFormat::DepthFloat32,
            timestamp_ns: 1_717_171_717_000,
            center_depth: 0.742,
            min_depth: 0.731,
            max_depth: 0.755,
        }
    }

    #[test]
    fn depth_text_reads_back() {
        let meta = depth_meta();
        assert_eq!(DepthFrameMetadata::parse(&meta.to_text()).unwrap(), meta);
    }

    #[test]
    fn sentinel_range_survives_text() {
        let meta = DepthFrameMetadata {
            min_depth: f32::MAX,
            max_depth: f32::MIN,
            ..depth_meta()
        };
        let parsed = DepthFrameMetadata::parse(&meta.to_text()).unwrap();
        assert_eq!(parsed.min_depth, f32::MAX);
        assert_eq!(parsed.max_depth, f32::MIN);
        assert!(!parsed.has_valid_range());
    }

    #[test]
    fn depth_text_layout() {
        let text = depth_meta().to_text();
        assert!(text.starts_with("width:256\nheight:192\nformat:DepthFloat32\n"));
        assert!(text.contains("centerDepth:0.742\n"));
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = DepthFrameMetadata::parse("width:1\nheight:1\nformat:DepthUint16\n").unwrap_err();
        assert!(matches!(err, CodecError::MalformedMetadata(_)));
    }

    #[test]
    fn color_format_in_depth_record_is_unsupported() {
        let text = depth_meta().to_text().replace("DepthFloat32", "RGB24");
        assert!(matches!(
            DepthFrameMetadata::parse(&text),
            Err(CodecError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rgb_text_reads_back_and_ignores_unknown_fields() {
        let meta = RgbFrameMetadata {
            width: 1920,
            height: 1440,
            format: PixelFormat::Rgb24,
            timestamp_ns: 99,
            encoding: "png".into(),
            mirrored: true,
        };
        let text = format!("{}exposure:0.01\n", meta.to_text());
        assert_eq!(RgbFrameMetadata::parse(&text).unwrap(), meta);
    }

    #[test]
    fn bad_number_is_malformed() {
        let text = depth_meta().to_text().replace("width:256", "width:wide");
        assert!(matches!(
            DepthFrameMetadata::parse(&text),
            Err(CodecError::MalformedMetadata(_))
        ));
    }
}
