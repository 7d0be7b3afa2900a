//! The ingestion pipeline: classify → decode → scale down → encode → store.
//!
//! ```text
//! Start → Classify ─┬─ not image ─────────────────────────────→ FallbackStore → Done
//!                   └─ image → Decode → (Resize) → Encode → Store → Done
//!                                  │        │          │       │
//!                                  └────────┴──────────┴───────┴─→ FallbackStore → Done
//! ```
//!
//! Each step returns its own error type; [`IngestionPipeline::ingest`] matches
//! on them and routes to the fallback store, which writes the upload's
//! original bytes under its original name. Codec-level failures never reach
//! the caller: they become a logged diagnostic and a fallback artifact. Only
//! a failed fallback store surfaces, as a [`StorageError`], since at that
//! point nothing was persisted.
//!
//! Every call produces at most one artifact. The pipeline holds no mutable
//! state, so concurrent calls on a shared pipeline are independent; each owns
//! its own decoded [`ImageHandle`](crate::imaging::ImageHandle) and buffers,
//! released when the call returns.

use crate::config::Settings;
use crate::imaging::{
    DecodeError, EncodeError, ImageCodec, OutputFormat, Quality, ResizeError, RustCodec,
    scale_down_to_width,
};
use crate::naming;
use crate::storage::{Disks, StorageError, Visibility};
use serde::Serialize;
use std::num::NonZeroU32;
use std::path::Path;
use thiserror::Error;

/// MIME type assumed for files whose extension names no image format.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// An upload as handed over by the host framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedInput {
    bytes: Vec<u8>,
    mime_type: String,
    original_name: String,
}

impl UploadedInput {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        mime_type: impl Into<String>,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            original_name: original_name.into(),
        }
    }

    /// Read an upload from disk. Without an explicit MIME type, one is
    /// guessed from the file extension.
    pub fn from_path(path: &Path, mime_type: Option<&str>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_type.unwrap_or_else(|| guess_mime_type(path));
        Ok(Self::new(bytes, mime, name))
    }

    /// Replace the client filename (e.g. with a name chosen by the host).
    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = name.into();
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Whether the declared MIME type is `image/*`.
    ///
    /// The declared type is trusted; a mislabeled file fails at decode and
    /// falls back like any other undecodable image.
    pub fn is_image(&self) -> bool {
        self.mime_type
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
    }
}

/// MIME type implied by a path's extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(OCTET_STREAM)
}

/// Per-call settings. Validity is carried by the types: `Quality` is always
/// 1-100 and a max width is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionConfig {
    pub quality: Quality,
    pub max_width: Option<NonZeroU32>,
    /// Destination directory on the disk; empty means the disk root.
    pub directory: String,
    pub disk: String,
    pub visibility: Visibility,
}

impl IngestionConfig {
    pub fn new(disk: impl Into<String>) -> Self {
        Self {
            quality: Quality::default(),
            max_width: None,
            directory: String::new(),
            disk: disk.into(),
            visibility: Visibility::default(),
        }
    }

    /// Defaults from process-wide settings: default quality, default max
    /// width, default disk and visibility, disk root as directory.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            quality: settings.uploads.default_quality(),
            max_width: settings.uploads.default_resize_width(),
            directory: String::new(),
            disk: settings.storage.default_disk.clone(),
            visibility: settings.storage.visibility,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_max_width(mut self, max_width: Option<NonZeroU32>) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_directory(mut self, directory: impl AsRef<str>) -> Self {
        self.directory = naming::normalize_directory(directory.as_ref()).to_string();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionResult {
    pub stored_path: String,
    /// True when the original bytes were stored instead of a WebP.
    pub used_fallback: bool,
}

/// A failure on the image path. Always recovered by the fallback store.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("resize: {0}")]
    Resize(#[from] ResizeError),
    #[error("encode: {0}")]
    Encode(#[from] EncodeError),
}

impl ConversionError {
    pub fn stage(&self) -> &'static str {
        match self {
            ConversionError::Decode(_) => "decode",
            ConversionError::Resize(_) => "resize",
            ConversionError::Encode(_) => "encode",
        }
    }
}

/// Upload ingestion service. Cheap to share across threads by reference.
#[derive(Debug)]
pub struct IngestionPipeline<C = RustCodec> {
    codec: C,
    disks: Disks,
}

impl IngestionPipeline<RustCodec> {
    pub fn new(disks: Disks) -> Self {
        Self::with_codec(RustCodec::new(), disks)
    }

    /// Codec limits and disks from process-wide settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_codec(
            RustCodec::with_max_decode_bytes(settings.uploads.max_decode_bytes),
            Disks::from_config(&settings.storage),
        )
    }
}

impl<C: ImageCodec> IngestionPipeline<C> {
    pub fn with_codec(codec: C, disks: Disks) -> Self {
        Self { codec, disks }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn disks(&self) -> &Disks {
        &self.disks
    }

    /// Ingest one upload.
    ///
    /// Returns the stored path, or a [`StorageError`] when neither the WebP
    /// nor the original could be stored.
    pub fn ingest(
        &self,
        input: &UploadedInput,
        config: &IngestionConfig,
    ) -> Result<IngestionResult, StorageError> {
        if !input.is_image() {
            tracing::debug!(
                file = %input.original_name(),
                mime = %input.mime_type(),
                "not an image, storing original"
            );
            return self.store_original(input, config, true);
        }

        let encoded = match self.convert(input, config) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::error!(
                    file = %input.original_name(),
                    error = %err,
                    stage = err.stage(),
                    "WebP conversion failed"
                );
                return self.store_original(input, config, true);
            }
        };

        let path = naming::resolve(
            input.original_name(),
            OutputFormat::WebP.extension(),
            &config.directory,
        );
        match self
            .disks
            .put(&config.disk, &path, &encoded, config.visibility)
        {
            Ok(()) => {
                tracing::debug!(
                    file = %input.original_name(),
                    path = %path,
                    size_bytes = encoded.len(),
                    "stored WebP"
                );
                Ok(IngestionResult {
                    stored_path: path,
                    used_fallback: false,
                })
            }
            Err(err) => {
                tracing::error!(
                    file = %input.original_name(),
                    error = %err,
                    stage = "store",
                    "WebP conversion failed"
                );
                drop(encoded);
                self.store_original(input, config, true)
            }
        }
    }

    /// Decode, optionally scale down, and encode to WebP.
    ///
    /// The decoded handle is dropped before this returns, on every path.
    pub fn convert(
        &self,
        input: &UploadedInput,
        config: &IngestionConfig,
    ) -> Result<Vec<u8>, ConversionError> {
        let handle = self.codec.decode(input.bytes())?;
        let handle = match config.max_width {
            Some(max_width) => scale_down_to_width(handle, max_width)?,
            None => handle,
        };
        Ok(self
            .codec
            .encode(&handle, OutputFormat::WebP, config.quality)?)
    }

    /// Store an upload verbatim without attempting conversion.
    ///
    /// Used by fields that don't enable WebP; not a fallback.
    pub fn store_verbatim(
        &self,
        input: &UploadedInput,
        config: &IngestionConfig,
    ) -> Result<IngestionResult, StorageError> {
        self.store_original(input, config, false)
    }

    /// Original bytes under the original name. Never touches the codec.
    fn store_original(
        &self,
        input: &UploadedInput,
        config: &IngestionConfig,
        used_fallback: bool,
    ) -> Result<IngestionResult, StorageError> {
        let path = naming::original_path(input.original_name(), &config.directory);
        if let Err(err) = self
            .disks
            .put(&config.disk, &path, input.bytes(), config.visibility)
        {
            tracing::error!(
                file = %input.original_name(),
                path = %path,
                error = %err,
                "storing original upload failed"
            );
            return Err(err);
        }
        Ok(IngestionResult {
            stored_path: path,
            used_fallback,
        })
    }
}
