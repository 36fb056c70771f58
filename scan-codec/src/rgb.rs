// SPDX-License-Identifier: MIT
//! # RgbCodec
//!
//! Strided color plane → tightly packed row-major buffer → PNG still.
//!
//! The sensor's image origin is bottom-left on the reference devices while image
//! files are top-left, so [`convert`] can flip rows while compacting. Channel order
//! is normalised to R, G, B(, A) regardless of the input layout.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::CodecError;
use crate::format::PixelFormat;
use crate::stride::PlaneLayout;

/// File extension and metadata `encoding:` value of [`encode_image`] output.
pub const IMAGE_ENCODING: &str = "png";

/// Compact a strided color plane into a packed buffer of `output` format.
pub fn convert(
    plane: &[u8],
    layout: PlaneLayout,
    input: PixelFormat,
    output: PixelFormat,
    mirror_y: bool,
) -> Result<Vec<u8>, CodecError> {
    if !matches!(input, PixelFormat::Rgb24 | PixelFormat::Rgba32 | PixelFormat::Bgra32) {
        return Err(CodecError::unsupported(input, "RgbCodec"));
    }
    if !matches!(output, PixelFormat::Rgb24 | PixelFormat::Rgba32) {
        return Err(CodecError::UnsupportedFormat(format!(
            "RgbCodec cannot produce {}",
            output
        )));
    }
    if layout.pixel_count() == 0 {
        return Err(CodecError::EncodeFailed(format!(
            "conversion of {}x{} plane produced no pixels",
            layout.width, layout.height
        )));
    }
    let in_bpp = input.bytes_per_pixel();
    layout.validate(in_bpp, plane.len())?;

    let out_bpp = output.bytes_per_pixel();
    let mut out = Vec::with_capacity(layout.pixel_count() * out_bpp);
    for y in 0..layout.height {
        let src_y = if mirror_y { layout.height - 1 - y } else { y };
        for px in layout.row(plane, src_y, in_bpp) {
            let rgba = match input {
                PixelFormat::Rgb24 => [px[0], px[1], px[2], 0xFF],
                PixelFormat::Rgba32 => [px[0], px[1], px[2], px[3]],
                _ => [px[2], px[1], px[0], px[3]],
            };
            out.extend_from_slice(&rgba[..out_bpp]);
        }
    }
    Ok(out)
}

/// Encode a packed `Rgb24`/`Rgba32` buffer as PNG.
pub fn encode_image(pixels: &[u8], width: u32, height: u32, format: PixelFormat) -> Result<Vec<u8>, CodecError> {
    let color = match format {
        PixelFormat::Rgb24 => ExtendedColorType::Rgb8,
        PixelFormat::Rgba32 => ExtendedColorType::Rgba8,
        other => return Err(CodecError::unsupported(other, "PNG encoder")),
    };
    let expected = width as usize * height as usize * format.bytes_per_pixel();
    if pixels.is_empty() || expected == 0 {
        return Err(CodecError::EncodeFailed("empty pixel buffer".into()));
    }
    if pixels.len() != expected {
        return Err(CodecError::EncodeFailed(format!(
            "pixel buffer holds {} bytes, {}x{} {} needs {}",
            pixels.len(),
            width,
            height,
            format,
            expected
        )));
    }

    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(pixels, width, height, color)?;
    if out.is_empty() {
        return Err(CodecError::EncodeFailed("encoder produced no bytes".into()));
    }
    Ok(out)
}
