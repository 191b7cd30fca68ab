//! On-demand thumbnail cache.
//!
//! Thumbnails are generated the first time they are asked for and then served
//! from disk forever. Generation (decode, orient, resize, encode) is the
//! expensive part of browsing a photo folder; a cache hit is one `stat`.
//!
//! # Layout
//!
//! The artifact for a photo at logical path `p` and target width `w` lives at
//! `{cache_root}/{w}/{p}`, and its URL relative to the cache root is
//! `{w}/{p}`. The thumbnail fits inside a 4:3 box of `w × floor(w * 0.75)`
//! (see [`thumbnail_box`]); the photo's aspect ratio is kept and small photos
//! are never upscaled.
//!
//! # Staleness
//!
//! An existing artifact is returned without looking at the source. If a photo
//! is replaced in place, its thumbnails stay stale until someone deletes them
//! from the cache root. There is no eviction either: the cache only grows.
//!
//! # Concurrency
//!
//! At most one generation runs per artifact path. Callers that miss on the
//! same path queue on a per-path lock; once they get it they check for the
//! artifact again and return the winner's file. Generation writes to a
//! dot-prefixed temporary sibling and renames it into place, so a reader never
//! sees a half-written thumbnail and a failed generation leaves nothing behind.
//! Parent directories are created with `create_dir_all`, which tolerates
//! concurrent creation.

use crate::config::GalleryConfig;
use crate::entities::{Folder, Photo, is_photo_name};
use crate::imaging::{
    self, BackendError, ImageBackend, OrientationPolicy, Quality, RustBackend, ThumbnailParams,
    thumbnail_box,
};
use crate::paths;
use image::ImageFormat;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Imaging error: {0}")]
    Imaging(#[from] BackendError),
    #[error("Invalid thumbnail width {0}")]
    InvalidWidth(u32),
    #[error("No thumbnail encoder for {0}")]
    UnsupportedFormat(String),
}

/// How a lookup was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The artifact was already on disk (possibly written by a concurrent
    /// caller while this one waited).
    Hit,
    /// This call generated the artifact.
    Generated,
}

/// A served thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Artifact URL relative to the cache root: `{width}/{photo path}`.
    pub url: String,
    pub outcome: Outcome,
}

/// Counters for a batch of lookups.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Generated => self.misses += 1,
        }
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses + self.failed
    }

    fn merge(self, other: Self) -> Self {
        Self {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            failed: self.failed + other.failed,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cached, {} generated",
            self.hits, self.misses
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, " ({} total)", self.total())
    }
}

/// URL of the artifact for `photo_path` at `width`, relative to the cache root.
pub fn artifact_url(photo_path: &str, width: u32) -> String {
    paths::join_url(&width.to_string(), paths::normalize(photo_path))
}

/// Thumbnail cache rooted at a directory, generating through an [`ImageBackend`].
///
/// `Send + Sync`; share one instance (e.g. behind an `Arc`) between request
/// handlers so they also share the per-path generation locks.
pub struct ThumbnailCache<B: ImageBackend = RustBackend> {
    root: PathBuf,
    quality: Quality,
    orientation: OrientationPolicy,
    backend: B,
    in_flight: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ThumbnailCache<RustBackend> {
    pub fn new(config: &GalleryConfig) -> Self {
        Self::with_backend(config, RustBackend::new())
    }
}

impl<B: ImageBackend> ThumbnailCache<B> {
    pub fn with_backend(config: &GalleryConfig, backend: B) -> Self {
        Self {
            root: config.cache_root.clone(),
            quality: Quality::new(config.thumbnails.quality),
            orientation: config.thumbnails.orientation,
            backend,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// URL of the thumbnail of `photo` at `width`, generating it on a miss.
    pub fn get_thumbnail(&self, photo: &Photo, width: u32) -> Result<String, CacheError> {
        Ok(self.lookup(photo, width)?.url)
    }

    /// Like [`get_thumbnail`](Self::get_thumbnail), also reporting whether
    /// the artifact was generated by this call.
    pub fn lookup(&self, photo: &Photo, width: u32) -> Result<Thumbnail, CacheError> {
        self.lookup_source(photo.path(), photo.filepath(), width)
    }

    fn lookup_source(
        &self,
        photo_path: &str,
        source: &Path,
        width: u32,
    ) -> Result<Thumbnail, CacheError> {
        let (max_width, max_height) = thumbnail_box(width);
        if max_width == 0 || max_height == 0 {
            return Err(CacheError::InvalidWidth(width));
        }

        let url = artifact_url(photo_path, width);
        let artifact = self.root.join(paths::url_to_path(&url));

        if artifact.exists() {
            tracing::trace!(%url, "thumbnail cache hit");
            return Ok(Thumbnail {
                url,
                outcome: Outcome::Hit,
            });
        }

        let format = imaging::output_format(&artifact)
            .ok_or_else(|| CacheError::UnsupportedFormat(url.clone()))?;

        let key = self.acquire(&artifact);
        let result = {
            let _guard = key.lock().unwrap_or_else(PoisonError::into_inner);
            if artifact.exists() {
                tracing::trace!(%url, "thumbnail generated while waiting");
                Ok(Outcome::Hit)
            } else {
                self.generate(source, &artifact, format, (max_width, max_height))
                    .map(|()| Outcome::Generated)
            }
        };
        self.release(&artifact, key);

        Ok(Thumbnail {
            url,
            outcome: result?,
        })
    }

    /// The generation lock for `artifact`, registering it if nobody holds one.
    fn acquire(&self, artifact: &Path) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(artifact.to_path_buf()).or_default())
    }

    /// Drop our handle and forget the lock once the map holds the last one.
    fn release(&self, artifact: &Path, key: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Handles are only cloned or dropped under the map lock, so the count
        // is stable here.
        let last = Arc::strong_count(&key) == 2;
        drop(key);
        if last {
            in_flight.remove(artifact);
        }
    }

    fn generate(
        &self,
        source: &Path,
        artifact: &Path,
        format: ImageFormat,
        (max_width, max_height): (u32, u32),
    ) -> Result<(), CacheError> {
        if let Some(parent) = artifact.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = paths::temp_sibling(artifact);
        let params = ThumbnailParams {
            source: source.to_path_buf(),
            output: tmp.clone(),
            format,
            max_width,
            max_height,
            quality: self.quality,
            orientation: self.orientation,
        };

        let result = self
            .backend
            .thumbnail(&params)
            .map_err(CacheError::from)
            .and_then(|dims| {
                fs::rename(&tmp, artifact)?;
                Ok(dims)
            });

        match result {
            Ok(dims) => {
                tracing::debug!(
                    source = %source.display(),
                    artifact = %artifact.display(),
                    width = dims.width,
                    height = dims.height,
                    "generated thumbnail"
                );
                Ok(())
            }
            Err(e) => {
                // The temp file may not exist if the backend failed early.
                let _ = fs::remove_file(&tmp);
                Err(e)
            }
        }
    }

    /// Generate every thumbnail size in `widths` for every photo under
    /// `folder`, recursively, in parallel on the rayon pool.
    ///
    /// A photo that fails to decode is logged and counted in
    /// [`CacheStats::failed`]; it does not stop the batch. Errors walking the
    /// folder do.
    pub fn warm(&self, folder: &Folder, widths: &[u32]) -> Result<CacheStats, CacheError> {
        let photos = collect_photos(folder)?;
        let jobs: Vec<(&(String, PathBuf), u32)> = photos
            .iter()
            .flat_map(|photo| widths.iter().map(move |&w| (photo, w)))
            .collect();

        let stats = jobs
            .par_iter()
            .map(|((url, source), width)| {
                let mut stats = CacheStats::default();
                match self.lookup_source(url, source, *width) {
                    Ok(thumb) => stats.record(thumb.outcome),
                    Err(e) => {
                        tracing::warn!(photo = %url, width, error = %e, "thumbnail failed");
                        stats.fail();
                    }
                }
                stats
            })
            .reduce(CacheStats::default, CacheStats::merge);

        tracing::debug!(folder = folder.path(), %stats, "warmed thumbnail cache");
        Ok(stats)
    }
}

/// Logical paths and file paths of the photos under `folder`, skipping
/// hidden entries.
fn collect_photos(folder: &Folder) -> Result<Vec<(String, PathBuf)>, CacheError> {
    let base = folder.filepath();
    let mut photos = Vec::new();

    let walker = WalkDir::new(base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() || !is_photo_name(&entry.file_name().to_string_lossy())
        {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(base) else {
            continue;
        };
        let url = paths::join_url(folder.path(), &paths::path_to_url(relative));
        photos.push((url, entry.path().to_path_buf()));
    }

    Ok(photos)
}
