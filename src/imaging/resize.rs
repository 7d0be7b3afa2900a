//! Scale-down resizing.
//!
//! Never enlarges: a handle that already fits is returned as-is, without
//! touching its pixels.

use super::calculations::scale_down_dimensions;
use super::codec::ImageHandle;
use image::imageops::FilterType;
use std::num::NonZeroU32;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResizeError {
    #[error("cannot resize an image with no pixels ({width}x{height})")]
    EmptySource { width: u32, height: u32 },
}

/// Scale `handle` down so its width is at most `max_width`.
///
/// - `width <= max_width`: the input handle is returned unchanged.
/// - otherwise: width becomes `max_width`, height is
///   `round(height * max_width / width)`, resampled with Lanczos3.
pub fn scale_down_to_width(
    handle: ImageHandle,
    max_width: NonZeroU32,
) -> Result<ImageHandle, ResizeError> {
    let (width, height) = handle.dimensions();
    let Some((new_w, new_h)) = scale_down_dimensions((width, height), max_width.get()) else {
        return Ok(handle);
    };
    if height == 0 {
        return Err(ResizeError::EmptySource { width, height });
    }

    let resized = handle
        .into_image()
        .resize_exact(new_w, new_h, FilterType::Lanczos3);
    Ok(ImageHandle::new(resized))
}
