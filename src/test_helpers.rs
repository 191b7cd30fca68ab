//! Shared test utilities for the share-gallery test suite.
//!
//! Provides a throwaway gallery on disk, helpers to populate it, and
//! synthetic JPEG encoders for tests that need real pixels.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = setup_gallery();
//! write_photo(&fx.gallery, "holiday/beach.jpg");
//! let photo = Photo::open(&fx.gallery, "holiday/beach.jpg").unwrap();
//! let cache = mock_cache(&fx.gallery, MockBackend::new());
//! assert_eq!(cache.get_thumbnail(&photo, 400).unwrap(), "400/holiday/beach.jpg");
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use image::{ImageEncoder, RgbImage};

use crate::cache::ThumbnailCache;
use crate::config::GalleryConfig;
use crate::entities::Gallery;
use crate::imaging::ImageBackend;
use crate::paths;
use crate::share::MemoryShareStore;

// =========================================================================
// Fixture setup
// =========================================================================

/// A gallery with empty `data/` and `cache/` roots inside a temp directory,
/// backed by an in-memory share store.
pub struct Fixture {
    pub tmp: TempDir,
    pub shares: Arc<MemoryShareStore>,
    pub gallery: Gallery,
}

impl Fixture {
    pub fn data_root(&self) -> PathBuf {
        self.tmp.path().join("data")
    }

    pub fn cache_root(&self) -> PathBuf {
        self.tmp.path().join("cache")
    }

    /// Rebuild the gallery with a modified config, keeping the share store.
    pub fn config_mut(&mut self, f: impl FnOnce(&mut GalleryConfig)) {
        let mut config = self.gallery.config().clone();
        f(&mut config);
        self.gallery = Gallery::new(Arc::new(config), self.shares.clone());
    }
}

pub fn setup_gallery() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let data_root = tmp.path().join("data");
    std::fs::create_dir(&data_root).unwrap();

    let config = GalleryConfig::with_roots(&data_root, tmp.path().join("cache"));
    let shares = Arc::new(MemoryShareStore::new());
    let gallery = Gallery::new(Arc::new(config), shares.clone());
    Fixture {
        tmp,
        shares,
        gallery,
    }
}

// =========================================================================
// Populating the data root
// =========================================================================

/// Write `contents` at logical path `url`, creating parent directories.
pub fn write_file(gallery: &Gallery, url: &str, contents: &[u8]) -> PathBuf {
    let path = gallery.config().data_root.join(paths::url_to_path(url));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    path
}

/// Write a placeholder photo. Only the mock backend can "decode" it.
pub fn write_photo(gallery: &Gallery, url: &str) -> PathBuf {
    write_file(gallery, url, b"placeholder photo")
}

pub fn mock_cache<B: ImageBackend>(gallery: &Gallery, backend: B) -> ThumbnailCache<B> {
    ThumbnailCache::with_backend(gallery.config(), backend)
}

// =========================================================================
// Synthetic images
// =========================================================================

/// Encode a gradient JPEG of the given dimensions.
pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, encode_test_jpeg(width, height)).unwrap();
}
