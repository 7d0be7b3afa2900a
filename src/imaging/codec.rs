//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the two operations the pipeline needs from
//! an image library: decode raw upload bytes into an [`ImageHandle`], and
//! encode a handle into the target format at a given quality. Neither
//! operation touches storage.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec). Tests swap in a recording
//! codec to assert which inputs ever reach the codec.

use super::params::{OutputFormat, Quality};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty input")]
    Empty,
    #[error("unrecognized image container")]
    UnknownFormat,
    #[error("decoder allocation limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("decode failed: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot encode an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
    #[error("{width}x{height} exceeds the {max}px {format:?} dimension limit")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        max: u32,
        format: OutputFormat,
    },
    #[error("encode failed: {0}")]
    Codec(String),
}

/// A decoded image, owned by one ingestion call.
///
/// The pixel buffer is freed when the handle is dropped, on success or on an
/// early error return alike.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    image: DynamicImage,
}

impl ImageHandle {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Decode/encode capability consumed by the ingestion pipeline.
pub trait ImageCodec: Send + Sync {
    /// Decode upload bytes. Empty, truncated, or unsupported input is a
    /// [`DecodeError`].
    fn decode(&self, bytes: &[u8]) -> Result<ImageHandle, DecodeError>;

    /// Encode a handle into `format` at `quality`.
    fn encode(
        &self,
        handle: &ImageHandle,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, EncodeError>;
}
