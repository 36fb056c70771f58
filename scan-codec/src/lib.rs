// SPDX-License-Identifier: MIT
//! # scan-codec: Strided Sensor Plane Decoding
//!
//! This crate turns the raw planes handed out by a mobile depth/color sensor into
//! portable artifacts: calibrated depth grids, tightly packed raw depth buffers,
//! PNG color stills, and the `field:value` metadata records that travel next to them.
//!
//! ## Architecture Overview
//!
//! The crate is designed around three core principles:
//! 1. **Explicit layout**: every decode call carries a [`stride::PlaneLayout`]; tight packing is never assumed
//! 2. **No I/O**: all functions are synchronous and side-effect free, safe to call from any context
//! 3. **Typed formats**: the sensor's pixel format tag is a closed enum, unknown tags fail early
//!
//! ## Key Components
//!
//! - [`stride`]: Byte-offset accessor for padded planes
//! - [`depth`]: DepthCodec (decode, sample-window statistics, packing, round trip)
//! - [`rgb`]: RgbCodec (strided → packed conversion, PNG encoding)
//! - [`meta`]: Metadata text records for depth and color artifacts
//! - [`format`]: Sensor pixel formats
//!
//! ## Usage Example
//!
//! ```rust
//! use scan_codec::{depth, format::PixelFormat, stride::PlaneLayout};
//!
//! // 4x4 DEPTH16 plane with 4 bytes of row padding
//! let layout = PlaneLayout::new(4, 4, 12, 2);
//! let mut plane = vec![0u8; 48];
//! plane[2 * 12 + 2 * 2..2 * 12 + 2 * 2 + 2].copy_from_slice(&750u16.to_le_bytes());
//!
//! let meta = depth::compute_metadata(&plane, layout, PixelFormat::DepthUint16, 42)?;
//! assert_eq!(meta.center_depth, 0.75);
//! # Ok::<(), scan_codec::CodecError>(())
//! ```

pub mod depth;
pub mod error;
pub mod format;
pub mod meta;
pub mod rgb;
pub mod stride;

pub use error::CodecError;
pub use format::PixelFormat;
pub use stride::PlaneLayout;
