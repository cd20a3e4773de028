//! Configuration module.
//!
//! Handles loading, validating, and merging the `thumbwell.toml` file. Stock
//! defaults are serialized to a TOML table and the user's file is merged on
//! top, so a config only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! gallery_root = "."        # Root that gallery paths are relative to
//! cache_root = "imgcache"   # Where generated thumbnails are stored
//!
//! [thumbnails]
//! quality = 75              # JPEG quality (1-100)
//!
//! [listing]
//! thumb_size = 300          # Bounding box for grid thumbnails
//! slide_size = 1200         # Bounding box for slideshow images
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The resulting [`GalleryConfig`] is an ordinary value handed to the worker
//! and the listing code; nothing reads configuration from global state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `thumbwell.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Directory that request paths such as `gallery/foo.jpg` resolve against.
    pub gallery_root: PathBuf,
    /// Writable directory mirroring the gallery tree with `_<size>` suffixes.
    pub cache_root: PathBuf,
    /// Thumbnail encoding settings.
    pub thumbnails: ThumbnailsConfig,
    /// Sizes advertised by directory listings.
    pub listing: ListingConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            gallery_root: PathBuf::from("."),
            cache_root: PathBuf::from("imgcache"),
            thumbnails: ThumbnailsConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.quality == 0 || self.thumbnails.quality > 100 {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.listing.thumb_size == 0 || self.listing.slide_size == 0 {
            return Err(ConfigError::Validation(
                "listing sizes must be non-zero (0 means the original image)".into(),
            ));
        }
        if self.cache_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "cache_root must not be empty".into(),
            ));
        }
        if self.cache_root == self.gallery_root {
            return Err(ConfigError::Validation(
                "cache_root must differ from gallery_root".into(),
            ));
        }
        Ok(())
    }

    /// Resolve relative roots against `base` (the config file's directory).
    pub fn rooted_at(mut self, base: &Path) -> Self {
        if self.gallery_root.is_relative() {
            self.gallery_root = base.join(&self.gallery_root);
        }
        if self.cache_root.is_relative() {
            self.cache_root = base.join(&self.cache_root);
        }
        self
    }
}

/// Thumbnail encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self { quality: 75 }
    }
}

/// Sizes a directory listing attaches to each image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    pub thumb_size: u32,
    pub slide_size: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            thumb_size: 300,
            slide_size: 1200,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GalleryConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
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

/// Parse a config from TOML text, merged over stock defaults and validated.
pub fn parse_config(content: &str) -> Result<GalleryConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value()?, overlay);
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`.
///
/// A missing file yields stock defaults. Relative roots are resolved against
/// the file's directory so the server behaves the same from any working
/// directory.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = path.parent().unwrap_or(Path::new(""));
    if !path.exists() {
        let config = GalleryConfig::default();
        config.validate()?;
        return Ok(config.rooted_at(base));
    }
    let content = fs::read_to_string(path)?;
    Ok(parse_config(&content)?.rooted_at(base))
}

/// Returns a fully-commented stock `thumbwell.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# thumbwell configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the directory holding this file.
# Unknown keys will cause an error.

# Root that gallery paths are relative to. A request for
# "gallery/2016/beach.jpg" reads <gallery_root>/gallery/2016/beach.jpg.
gallery_root = "."

# Writable directory for generated thumbnails. It mirrors the gallery tree:
# <cache_root>/gallery/2016/beach.jpg_300
# Entries are never purged; delete files here to force regeneration.
cache_root = "imgcache"

# ---------------------------------------------------------------------------
# Thumbnail encoding
# ---------------------------------------------------------------------------
[thumbnails]
# JPEG quality for generated thumbnails (1 = worst, 100 = best).
quality = 75

# ---------------------------------------------------------------------------
# Directory listings
# ---------------------------------------------------------------------------
[listing]
# Bounding box for grid thumbnails.
thumb_size = 300

# Bounding box for slideshow images.
slide_size = 1200
"##
}
