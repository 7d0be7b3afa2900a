//! Host-framework adapter for upload form fields.
//!
//! A [`WebpUploadField`] is configured once, builder-style, when the form is
//! declared, and its [`save`](WebpUploadField::save) method is what the
//! framework's "save uploaded file" hook calls. It owns no processing logic:
//! it turns field settings into an [`IngestionConfig`] and hands the upload
//! to a shared [`IngestionPipeline`].
//!
//! ```
//! # use webp_ingest::config::Settings;
//! # use webp_ingest::upload_field::WebpUploadField;
//! let settings = Settings::default();
//! let field = WebpUploadField::new("avatar", &settings)
//!     .directory("avatars")
//!     .webp(Some(75))?
//!     .resize(Some(400))?;
//! assert!(field.converts_to_webp());
//! # Ok::<(), webp_ingest::config::ConfigError>(())
//! ```

use crate::config::{ConfigError, Settings, UploadsConfig};
use crate::imaging::{ImageCodec, Quality};
use crate::naming;
use crate::pipeline::{IngestionConfig, IngestionPipeline, IngestionResult, UploadedInput};
use crate::storage::{StorageError, Visibility};
use std::num::NonZeroU32;

/// An upload field that stores images as WebP.
///
/// Conversion is off until [`webp`](Self::webp) is called; until then uploads
/// are stored verbatim. [`resize`](Self::resize) only has an effect on
/// converted uploads.
#[derive(Debug, Clone)]
pub struct WebpUploadField {
    name: String,
    directory: String,
    disk: String,
    visibility: Visibility,
    webp_quality: Option<Quality>,
    resize_width: Option<NonZeroU32>,
    defaults: UploadsConfig,
}

impl WebpUploadField {
    /// A field with the process-wide disk and visibility and no conversion.
    pub fn new(name: impl Into<String>, settings: &Settings) -> Self {
        Self {
            name: name.into(),
            directory: String::new(),
            disk: settings.storage.default_disk.clone(),
            visibility: settings.storage.visibility,
            webp_quality: None,
            resize_width: None,
            defaults: settings.uploads.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(mut self, directory: impl AsRef<str>) -> Self {
        self.directory = naming::normalize_directory(directory.as_ref()).to_string();
        self
    }

    pub fn disk(mut self, disk: impl Into<String>) -> Self {
        self.disk = disk.into();
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Enable WebP conversion. `None` takes the configured default quality.
    pub fn webp(mut self, quality: Option<u32>) -> Result<Self, ConfigError> {
        self.webp_quality = Some(match quality {
            Some(q) => Quality::new(q)?,
            None => self.defaults.default_quality(),
        });
        Ok(self)
    }

    /// Cap the width of converted images. `None` takes the configured default
    /// width, which may itself be unset.
    pub fn resize(mut self, width: Option<u32>) -> Result<Self, ConfigError> {
        self.resize_width = match width {
            Some(w) => Some(NonZeroU32::new(w).ok_or_else(|| {
                ConfigError::Validation(format!("resize width for '{}' must be positive", self.name))
            })?),
            None => self.defaults.default_resize_width(),
        };
        Ok(self)
    }

    pub fn converts_to_webp(&self) -> bool {
        self.webp_quality.is_some()
    }

    /// The per-call configuration this field passes to the pipeline.
    pub fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig {
            quality: self
                .webp_quality
                .unwrap_or_else(|| self.defaults.default_quality()),
            max_width: self.resize_width,
            directory: self.directory.clone(),
            disk: self.disk.clone(),
            visibility: self.visibility,
        }
    }

    /// Store an upload for this field and return where it went.
    pub fn save<C: ImageCodec>(
        &self,
        pipeline: &IngestionPipeline<C>,
        input: &UploadedInput,
    ) -> Result<IngestionResult, StorageError> {
        let config = self.ingestion_config();
        if self.converts_to_webp() {
            pipeline.ingest(input, &config)
        } else {
            pipeline.store_verbatim(input, &config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustCodec;
    use crate::imaging::codec::tests::RecordingCodec;
    use crate::storage::Disks;
    use crate::storage::tests::MemorySink;
    use crate::test_helpers::jpeg_bytes;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.uploads.quality = 70;
        settings.uploads.resize_width = Some(640);
        settings
    }

    #[test]
    fn new_field_does_not_convert() {
        let field = WebpUploadField::new("doc", &settings());
        assert!(!field.converts_to_webp());
        assert_eq!(field.name(), "doc");
        assert_eq!(field.ingestion_config().disk, "local");
    }

    #[test]
    fn webp_without_quality_uses_default() {
        let field = WebpUploadField::new("a", &settings()).webp(None).unwrap();
        assert_eq!(field.ingestion_config().quality.value(), 70);
    }

    #[test]
    fn webp_with_quality_overrides_default() {
        let field = WebpUploadField::new("a", &settings()).webp(Some(95)).unwrap();
        assert_eq!(field.ingestion_config().quality.value(), 95);
    }

    #[test]
    fn webp_rejects_out_of_range_quality() {
        assert!(WebpUploadField::new("a", &settings()).webp(Some(0)).is_err());
        assert!(WebpUploadField::new("a", &settings()).webp(Some(101)).is_err());
    }

    #[test]
    fn resize_defaults_and_overrides() {
        let field = WebpUploadField::new("a", &settings()).resize(None).unwrap();
        assert_eq!(field.ingestion_config().max_width, NonZeroU32::new(640));

        let field = field.resize(Some(300)).unwrap();
        assert_eq!(field.ingestion_config().max_width, NonZeroU32::new(300));
    }

    #[test]
    fn resize_without_configured_default_is_unset() {
        let field = WebpUploadField::new("a", &Settings::default())
            .resize(None)
            .unwrap();
        assert_eq!(field.ingestion_config().max_width, None);
    }

    #[test]
    fn resize_rejects_zero() {
        let err = WebpUploadField::new("avatar", &settings())
            .resize(Some(0))
            .unwrap_err();
        assert!(err.to_string().contains("'avatar'"));
    }

    #[test]
    fn directory_is_trimmed() {
        let field = WebpUploadField::new("a", &settings()).directory("/avatars/");
        assert_eq!(field.ingestion_config().directory, "avatars");
    }

    #[test]
    fn save_converts_when_enabled() {
        let sink = MemorySink::new();
        let pipeline = IngestionPipeline::with_codec(
            RustCodec::new(),
            Disks::new().with_disk("media", sink.clone()),
        );
        let field = WebpUploadField::new("avatar", &settings())
            .disk("media")
            .directory("avatars")
            .visibility(Visibility::Private)
            .webp(Some(75))
            .unwrap()
            .resize(Some(400))
            .unwrap();
        let input = UploadedInput::new(jpeg_bytes(800, 600), "image/jpeg", "me.jpg");

        let result = field.save(&pipeline, &input).unwrap();

        assert_eq!(result.stored_path, "avatars/me.webp");
        assert!(!result.used_fallback);
        let stored = sink.get_stored();
        assert_eq!(stored[0].visibility, Visibility::Private);
        let decoded = image::load_from_memory(&stored[0].bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 300));
    }

    #[test]
    fn save_stores_verbatim_when_not_enabled() {
        let sink = MemorySink::new();
        let pipeline = IngestionPipeline::with_codec(
            RecordingCodec::new(RustCodec::new()),
            Disks::new().with_disk("local", sink.clone()),
        );
        let field = WebpUploadField::new("photo", &settings()).directory("raw");
        let bytes = jpeg_bytes(10, 10);
        let input = UploadedInput::new(bytes.clone(), "image/jpeg", "me.jpg");

        let result = field.save(&pipeline, &input).unwrap();

        assert_eq!(result.stored_path, "raw/me.jpg");
        assert!(!result.used_fallback);
        assert!(pipeline.codec().get_calls().is_empty());
        assert_eq!(sink.get_stored()[0].bytes, bytes);
    }
}
