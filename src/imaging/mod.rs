//! Image processing — decode, scale down, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with allocation limits |
//! | **Scale down** | Lanczos3 `resize_exact`, width-capped, never upscales |
//! | **Encode → WebP** | `webp::Encoder` (libwebp, lossy at a quality) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: [`Quality`] and [`OutputFormat`]
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Resize**: [`scale_down_to_width`]

mod calculations;
pub mod codec;
mod params;
pub mod resize;
pub mod rust_codec;

pub use calculations::scale_down_dimensions;
pub use codec::{DecodeError, EncodeError, ImageCodec, ImageHandle};
pub use params::{OutputFormat, Quality};
pub use resize::{ResizeError, scale_down_to_width};
pub use rust_codec::{DEFAULT_MAX_DECODE_BYTES, RustCodec, WEBP_MAX_DIMENSION};
