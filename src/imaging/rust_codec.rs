//! Pure Rust decode + libwebp encode.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff container | `image::ImageReader::with_guessed_format` |
//! | Decode (JPEG, PNG, GIF, TIFF, BMP, WebP) | `image` crate decoders, bounded by `image::Limits` |
//! | Auto-orient | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Encode → WebP (lossy, quality) | `webp::Encoder::from_rgba` |
//!
//! The `image` crate's own WebP encoder is lossless-only, so it cannot honor
//! a quality setting. Pixels go to libwebp as RGBA8; a decoded image in any
//! other layout costs one RGBA8 copy on top of the decode allocation.

use super::codec::{DecodeError, EncodeError, ImageCodec, ImageHandle};
use super::params::{OutputFormat, Quality};
use image::error::{ImageError, LimitErrorKind};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, Limits, RgbaImage};
use std::fmt::Debug;
use std::io::Cursor;

/// Largest width or height a WebP bitstream can describe.
pub const WEBP_MAX_DIMENSION: u32 = 16_383;

/// Default decoder allocation ceiling (matches `image::Limits::default`).
pub const DEFAULT_MAX_DECODE_BYTES: u64 = 512 * 1024 * 1024;

/// Production codec built on the `image` and `webp` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone)]
pub struct RustCodec {
    max_decode_bytes: u64,
}

impl RustCodec {
    pub fn new() -> Self {
        Self::with_max_decode_bytes(DEFAULT_MAX_DECODE_BYTES)
    }

    /// Cap the memory a single decode may allocate.
    pub fn with_max_decode_bytes(max_decode_bytes: u64) -> Self {
        Self { max_decode_bytes }
    }

    pub fn max_decode_bytes(&self) -> u64 {
        self.max_decode_bytes
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_decode_bytes);
        limits
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn map_decode_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Limits(limit) => match limit.kind() {
            LimitErrorKind::InsufficientMemory | LimitErrorKind::DimensionError => {
                DecodeError::LimitExceeded(limit.to_string())
            }
            _ => DecodeError::Malformed(limit.to_string()),
        },
        other => DecodeError::Malformed(other.to_string()),
    }
}

fn encode_webp(handle: &ImageHandle, quality: Quality) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = handle.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::EmptyImage { width, height });
    }
    if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(EncodeError::DimensionsTooLarge {
            width,
            height,
            max: WEBP_MAX_DIMENSION,
            format: OutputFormat::WebP,
        });
    }

    let converted: RgbaImage;
    let rgba = match handle.image() {
        DynamicImage::ImageRgba8(buffer) => buffer,
        other => {
            converted = other.to_rgba8();
            &converted
        }
    };
    let encoded = webp::Encoder::from_rgba(rgba, width, height)
        .encode_simple(false, quality.value() as f32)
        .map_err(libwebp_error)?;
    Ok(encoded.to_vec())
}

fn libwebp_error(status: impl Debug) -> EncodeError {
    EncodeError::Codec(format!("libwebp: {status:?}"))
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ImageHandle, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        if reader.format().is_none() {
            return Err(DecodeError::UnknownFormat);
        }
        reader.limits(self.limits());

        let mut decoder = reader.into_decoder().map_err(map_decode_error)?;
        // into_decoder only checks dimensions; the allocation ceiling is ours to enforce
        self.limits()
            .reserve(decoder.total_bytes())
            .map_err(map_decode_error)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

        let mut image = DynamicImage::from_decoder(decoder).map_err(map_decode_error)?;
        if orientation != Orientation::NoTransforms {
            tracing::debug!(?orientation, "applying EXIF orientation");
            image.apply_orientation(orientation);
        }
        Ok(ImageHandle::new(image))
    }

    fn encode(
        &self,
        handle: &ImageHandle,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, EncodeError> {
        match format {
            OutputFormat::WebP => encode_webp(handle, quality),
        }
    }
}
