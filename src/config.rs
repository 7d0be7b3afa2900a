//! Process-wide settings.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden key-by-key by the user file, unknown keys are rejected to catch
//! typos early, and the merged result is validated before anything uses it.
//!
//! Settings are read once at startup. Upload fields take their defaults from
//! [`UploadsConfig`] when they are built; nothing in the pipeline reads
//! settings afterwards.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [uploads]
//! quality = 80                  # WebP quality (1-100)
//! # resize_width = 1920         # Max width in pixels (omit to keep size)
//! max_decode_bytes = 536870912  # Decoder allocation ceiling
//!
//! [storage]
//! default_disk = "local"        # Disk used when a field names none
//! visibility = "public"         # "public" or "private"
//!
//! [storage.disks.local]
//! root = "storage"              # Relative roots resolve against the config dir
//! ```

use crate::imaging::{DEFAULT_MAX_DECODE_BYTES, Quality};
use crate::storage::Visibility;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the settings file inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Defaults applied to upload fields that don't override them.
    pub uploads: UploadsConfig,
    /// Named disks and the default disk/visibility.
    pub storage: StorageConfig,
}

impl Settings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Quality::new(self.uploads.quality)
            .map_err(|_| ConfigError::Validation("uploads.quality must be 1-100".into()))?;
        if self.uploads.resize_width == Some(0) {
            return Err(ConfigError::Validation(
                "uploads.resize_width must be positive".into(),
            ));
        }
        if self.uploads.max_decode_bytes == 0 {
            return Err(ConfigError::Validation(
                "uploads.max_decode_bytes must be positive".into(),
            ));
        }
        if !self.storage.disks.contains_key(&self.storage.default_disk) {
            return Err(ConfigError::Validation(format!(
                "storage.default_disk '{}' is not a configured disk",
                self.storage.default_disk
            )));
        }
        if let Some((name, _)) = self
            .storage
            .disks
            .iter()
            .find(|(_, disk)| disk.root.as_os_str().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "storage.disks.{name}.root must not be empty"
            )));
        }
        Ok(())
    }
}

/// Upload processing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// WebP quality used when a field enables conversion without one.
    pub quality: u32,
    /// Max width used when a field enables resizing without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_width: Option<u32>,
    /// Upper bound on what a single decode may allocate.
    pub max_decode_bytes: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            resize_width: None,
            max_decode_bytes: DEFAULT_MAX_DECODE_BYTES,
        }
    }
}

impl UploadsConfig {
    /// Default quality; falls back to the stock value if unvalidated
    /// settings carry an out-of-range number.
    pub fn default_quality(&self) -> Quality {
        Quality::new(self.quality).unwrap_or_default()
    }

    pub fn default_resize_width(&self) -> Option<NonZeroU32> {
        self.resize_width.and_then(NonZeroU32::new)
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub default_disk: String,
    pub visibility: Visibility,
    pub disks: BTreeMap<String, DiskConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_disk: "local".to_string(),
            visibility: Visibility::Public,
            disks: BTreeMap::from([(
                "local".to_string(),
                DiskConfig {
                    root: PathBuf::from("storage"),
                },
            )]),
        }
    }
}

impl StorageConfig {
    /// Resolve relative disk roots against `base` (the config directory).
    pub fn rooted_at(mut self, base: &Path) -> Self {
        for disk in self.disks.values_mut() {
            if disk.root.is_relative() {
                disk.root = base.join(&disk.root);
            }
        }
        self
    }
}

/// A filesystem disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiskConfig {
    pub root: PathBuf,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from `config.toml` in `dir`, over stock defaults.
pub fn load_config(dir: &Path) -> Result<Settings, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Render settings back to TOML (used by `show-config`).
pub fn to_toml_string(settings: &Settings) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(settings)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# webp-ingest configuration
# ========================
# All options are optional. Values shown are the defaults.

[uploads]
# WebP quality (1-100) for fields that enable conversion without a value.
# Higher means better fidelity and larger files.
quality = 80

# Max width in pixels for fields that enable resizing without a value.
# Images are only ever scaled down; height follows the aspect ratio.
# Leave unset to disable resizing by default.
# resize_width = 1920

# Upper bound, in bytes, on what decoding a single upload may allocate.
# Larger images are stored verbatim instead of converted. Encoding may add
# one RGBA8 copy of the image (4 bytes per pixel) unless it is already RGBA8.
max_decode_bytes = 536870912

[storage]
# Disk used when a field does not name one.
default_disk = "local"

# Visibility for stored files: "public" (0644) or "private" (0600).
visibility = "public"

# Filesystem disks. Relative roots resolve against the config directory.
[storage.disks.local]
root = "storage"
"##
}
