// SPDX-License-Identifier: MIT
// Codec failures. Every variant is fatal for the frame being decoded.

use crate::format::PixelFormat;

#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Pixel format cannot be interpreted by the requested codec
    UnsupportedFormat(String),
    /// Image compression or conversion produced no output
    EncodeFailed(String),
    /// Stride descriptor or buffer length violates the plane invariants
    InvalidLayout(String),
    /// A metadata record is missing a field or holds an unparsable value
    MalformedMetadata(String),
}

impl CodecError {
    pub(crate) fn unsupported(format: PixelFormat, codec: &str) -> Self {
        Self::UnsupportedFormat(format!("{} cannot decode {}", codec, format))
    }
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::UnsupportedFormat(m) => write!(f, "Unsupported pixel format: {}", m),
            CodecError::EncodeFailed(m) => write!(f, "Encode failed: {}", m),
            CodecError::InvalidLayout(m) => write!(f, "Invalid plane layout: {}", m),
            CodecError::MalformedMetadata(m) => write!(f, "Malformed metadata: {}", m),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<image::ImageError> for CodecError {
    fn from(e: image::ImageError) -> Self {
        Self::EncodeFailed(e.to_string())
    }
}
