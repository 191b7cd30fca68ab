//! Gallery configuration.
//!
//! Loaded once at start-up from a `gallery.toml` file, then shared read-only
//! (usually behind an `Arc`) by every component that needs it. Nothing in the
//! crate reads configuration from globals.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! data_root = "data"          # Root of the folder hierarchy
//! cache_root = "cache"        # Root of the thumbnail cache
//! # title = "Shares"          # Display name of the root folder
//! shares_file = ".shares.json" # Share ACL records, relative to data_root
//!
//! [thumbnails]
//! quality = 90                # Lossy encoding quality (1-100)
//! orientation = "rotate-only" # EXIF correction: "rotate-only" or "full"
//! sizes = [128, 400, 800]     # Widths pre-generated by `warm`
//!
//! [processing]
//! max_processes = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Stock defaults are serialized to a TOML table and the user file is merged
//! on top, so a config file only needs the keys it overrides. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::OrientationPolicy;
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

/// Root title used when none is configured.
pub const DEFAULT_TITLE: &str = "Shares";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Directory holding the shared folder hierarchy.
    pub data_root: PathBuf,
    /// Directory holding generated thumbnails, one subdirectory per width.
    pub cache_root: PathBuf,
    /// Display name of the hierarchy root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Share records file. Relative paths are resolved against `data_root`.
    pub shares_file: PathBuf,
    pub thumbnails: ThumbnailsConfig,
    pub processing: ProcessingConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            cache_root: PathBuf::from("cache"),
            title: None,
            shares_file: PathBuf::from(".shares.json"),
            thumbnails: ThumbnailsConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// A default config rooted at the given directories.
    pub fn with_roots(data_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            cache_root: cache_root.into(),
            ..Self::default()
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn shares_path(&self) -> PathBuf {
        if self.shares_file.is_absolute() {
            self.shares_file.clone()
        } else {
            self.data_root.join(&self.shares_file)
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.thumbnails.sizes.iter().any(|&w| w < 2) {
            return Err(ConfigError::Validation(
                "thumbnails.sizes values must be at least 2".into(),
            ));
        }
        if self.data_root.as_os_str().is_empty() || self.cache_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "data_root and cache_root must not be empty".into(),
            ));
        }
        if self.data_root == self.cache_root {
            return Err(ConfigError::Validation(
                "cache_root must differ from data_root".into(),
            ));
        }
        Ok(())
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// How EXIF orientation is corrected before resizing.
    pub orientation: OrientationPolicy,
    /// Widths generated ahead of time by `warm`.
    pub sizes: Vec<u32>,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            orientation: OrientationPolicy::default(),
            sizes: vec![128, 400, 800],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file on top of stock defaults.
///
/// A missing file yields the (validated) defaults.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `gallery.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Share Gallery Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Root of the shared folder hierarchy. Each top-level folder is a share.
data_root = "data"

# Root of the thumbnail cache. Thumbnails live at <cache_root>/<width>/<path>
# and are never invalidated: delete a file (or the whole tree) to regenerate.
cache_root = "cache"

# Display name of the root folder.
# title = "Shares"

# Share ACL records (JSON). Relative paths are resolved against data_root.
shares_file = ".shares.json"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Lossy encoding quality (1 = worst, 100 = best).
quality = 90

# EXIF orientation correction:
#   "rotate-only" - rotate by the orientation angle, ignore mirroring
#   "full"        - also undo mirrored orientations (EXIF values 2, 4, 5, 7)
orientation = "rotate-only"

# Widths pre-generated by `share-gallery warm`.
sizes = [128, 400, 800]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel thumbnail workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = GalleryConfig::default();
        assert_eq!(config.data_root, PathBuf::from("data"));
        assert_eq!(config.cache_root, PathBuf::from("cache"));
        assert_eq!(config.title(), "Shares");
        assert_eq!(config.thumbnails.quality, 90);
        assert_eq!(config.thumbnails.orientation, OrientationPolicy::RotateOnly);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(GalleryConfig::default().validate().is_ok());
    }

    #[test]
    fn shares_path_relative_to_data_root() {
        let config = GalleryConfig::with_roots("/srv/photos", "/srv/cache");
        assert_eq!(config.shares_path(), PathBuf::from("/srv/photos/.shares.json"));
    }

    #[test]
    fn shares_path_absolute_kept() {
        let config = GalleryConfig {
            shares_file: PathBuf::from("/etc/gallery/shares.json"),
            ..GalleryConfig::default()
        };
        assert_eq!(
            config.shares_path(),
            PathBuf::from("/etc/gallery/shares.json")
        );
    }

    #[test]
    fn parse_partial_config() {
        let config: GalleryConfig = toml::from_str(
            r#"
title = "Family photos"

[thumbnails]
orientation = "full"
"#,
        )
        .unwrap();
        assert_eq!(config.title(), "Family photos");
        assert_eq!(config.thumbnails.orientation, OrientationPolicy::Full);
        // Unspecified defaults preserved
        assert_eq!(config.thumbnails.quality, 90);
        assert_eq!(config.data_root, PathBuf::from("data"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("gallery.toml")).unwrap();
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.toml");
        fs::write(
            &path,
            r#"
data_root = "/srv/photos"

[thumbnails]
quality = 75
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.data_root, PathBuf::from("/srv/photos"));
        assert_eq!(config.thumbnails.quality, 75);
        assert_eq!(config.thumbnails.sizes, vec![128, 400, 800]);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.toml");
        fs::write(&path, "this is not toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.toml");
        fs::write(&path, "[thumbnails]\nqualty = 80\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.toml");
        fs::write(&path, "[thumbnails]\nquality = 0\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_shared_roots() {
        let config = GalleryConfig::with_roots("same", "same");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_tiny_sizes() {
        let mut config = GalleryConfig::default();
        config.thumbnails.sizes = vec![400, 1];
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[thumbnails]\nquality = 60").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["thumbnails"]["quality"].as_integer(), Some(60));
        assert_eq!(
            merged["thumbnails"]["orientation"].as_str(),
            Some("rotate-only")
        );
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: GalleryConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }
}
