//! Folders, files and photos under the data root.
//!
//! Every entity is addressed by its logical path (see [`crate::paths`]) and
//! is checked for existence when it is opened: holding a [`Folder`] or
//! [`File`] means the path existed at that moment. The first path segment
//! names the [`Share`] whose ACLs govern the entity; it is loaded (or made
//! virtual) at open time and permission checks delegate to it.
//!
//! Paths are normalized (surrounding slashes stripped) and must stay inside
//! the data root: `.`, `..` and empty segments are rejected with
//! [`EntityError::InvalidPath`].

use crate::acl::{AclError, Permission};
use crate::cache::{CacheError, ThumbnailCache};
use crate::config::GalleryConfig;
use crate::imaging::ImageBackend;
use crate::paths;
use crate::principal::Principal;
use crate::share::{self, JsonShareStore, Share, ShareError, ShareStore};
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntityError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("The root folder cannot be deleted")]
    RootNotDeletable,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Share error: {0}")]
    Share(#[from] ShareError),
}

/// Extensions listed as photos in folder contents.
const PHOTO_EXTENSIONS: &[&str] = &["gif", "jpg", "jpeg", "png"];

/// Whether a file name has a photo extension (case-insensitive).
pub fn is_photo_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PHOTO_EXTENSIONS.iter().any(|p| p.eq_ignore_ascii_case(ext)))
}

// ============================================================================
// Gallery: configuration + share storage
// ============================================================================

/// Everything an entity needs to resolve itself: the configured roots and
/// where shares are stored. Cheap to clone.
#[derive(Clone)]
pub struct Gallery {
    config: Arc<GalleryConfig>,
    shares: Arc<dyn ShareStore>,
}

impl Gallery {
    pub fn new(config: Arc<GalleryConfig>, shares: Arc<dyn ShareStore>) -> Self {
        Self { config, shares }
    }

    /// A gallery whose shares live in the configured JSON file.
    pub fn from_config(config: GalleryConfig) -> Self {
        let store = JsonShareStore::new(config.shares_path());
        Self::new(Arc::new(config), Arc::new(store))
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn share_store(&self) -> &dyn ShareStore {
        self.shares.as_ref()
    }

    /// The share governing `path`: stored if there is a record, virtual if not.
    pub fn share(&self, path: &str) -> Result<Share, ShareError> {
        share::load_or_virtual(self.share_store(), paths::share_of(paths::normalize(path)))
    }

    /// Normalize `path` and map it under the data root.
    fn resolve(&self, path: &str) -> Result<(String, PathBuf), EntityError> {
        if !paths::is_contained(path) {
            return Err(EntityError::InvalidPath(path.to_string()));
        }
        let path = paths::normalize(path).to_string();
        let filepath = self.config.data_root.join(paths::url_to_path(&path));
        Ok((path, filepath))
    }
}

// ============================================================================
// Folder
// ============================================================================

/// An existing directory under the data root.
#[derive(Debug, Clone)]
pub struct Folder {
    path: String,
    filepath: PathBuf,
    share: Share,
    root_title: String,
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    /// Logical path of the entry.
    pub path: String,
    /// Size in bytes; `None` for folders.
    pub size: Option<u64>,
}

/// Children of a folder, each list sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderContents {
    pub folders: Vec<EntryInfo>,
    /// Files that are not photos.
    pub files: Vec<EntryInfo>,
    pub photos: Vec<EntryInfo>,
}

impl Folder {
    /// Open the folder at `path`. The empty path is the root.
    pub fn open(gallery: &Gallery, path: &str) -> Result<Self, EntityError> {
        let (path, filepath) = gallery.resolve(path)?;
        if !filepath.is_dir() {
            return Err(EntityError::NotFound(path));
        }
        let share = gallery.share(&path)?;
        Ok(Self {
            path,
            filepath,
            share,
            root_title: gallery.config().title().to_string(),
        })
    }

    /// Create the folder's last path component if it does not exist, then
    /// open it. The parent must already exist.
    pub fn create(gallery: &Gallery, path: &str) -> Result<Self, EntityError> {
        let (path, filepath) = gallery.resolve(path)?;
        match fs::create_dir(&filepath) {
            Ok(()) => tracing::debug!(folder = %path, "created folder"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }
        Self::open(gallery, &path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Last path segment, or the configured title for the root.
    pub fn name(&self) -> &str {
        if self.is_root() {
            &self.root_title
        } else {
            paths::basename(&self.path)
        }
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn share(&self) -> &Share {
        &self.share
    }

    pub fn has_permission(
        &self,
        permission: Permission,
        principal: &dyn Principal,
    ) -> Result<bool, AclError> {
        self.share.has_permission(permission, principal)
    }

    /// List child folders, photos and other files. Hidden entries are skipped.
    pub fn contents(&self) -> Result<FolderContents, EntityError> {
        let mut contents = FolderContents::default();

        for entry in fs::read_dir(&self.filepath)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = paths::join_url(&self.path, &name);
            // Follows symlinks, like the existence checks in `open`.
            let metadata = fs::metadata(entry.path())?;

            if metadata.is_dir() {
                contents.folders.push(EntryInfo {
                    name,
                    path,
                    size: None,
                });
            } else {
                let info = EntryInfo {
                    size: Some(metadata.len()),
                    name,
                    path,
                };
                if is_photo_name(&info.name) {
                    contents.photos.push(info);
                } else {
                    contents.files.push(info);
                }
            }
        }

        for list in [
            &mut contents.folders,
            &mut contents.files,
            &mut contents.photos,
        ] {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(contents)
    }

    /// Remove the folder and everything in it.
    pub fn delete(self) -> Result<(), EntityError> {
        if self.is_root() {
            return Err(EntityError::RootNotDeletable);
        }
        fs::remove_dir_all(&self.filepath)?;
        tracing::debug!(folder = %self.path, "deleted folder");
        Ok(())
    }
}

// ============================================================================
// File / Photo
// ============================================================================

/// An existing entry (file or directory) under the data root.
#[derive(Debug, Clone)]
pub struct File {
    path: String,
    filepath: PathBuf,
    share: Share,
}

impl File {
    pub fn open(gallery: &Gallery, path: &str) -> Result<Self, EntityError> {
        let (path, filepath) = gallery.resolve(path)?;
        if !filepath.exists() {
            return Err(EntityError::NotFound(path));
        }
        let share = gallery.share(&path)?;
        Ok(Self {
            path,
            filepath,
            share,
        })
    }

    /// Whether `path` names a directory. Missing or invalid paths are not.
    pub fn is_dir(gallery: &Gallery, path: &str) -> bool {
        gallery
            .resolve(path)
            .is_ok_and(|(_, filepath)| filepath.is_dir())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        paths::basename(&self.path)
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn share(&self) -> &Share {
        &self.share
    }

    /// Current size in bytes.
    pub fn size(&self) -> Result<u64, EntityError> {
        Ok(fs::metadata(&self.filepath)?.len())
    }

    pub fn has_permission(
        &self,
        permission: Permission,
        principal: &dyn Principal,
    ) -> Result<bool, AclError> {
        self.share.has_permission(permission, principal)
    }

    /// Remove the file. Directories go through [`Folder::delete`].
    pub fn delete(self) -> Result<(), EntityError> {
        fs::remove_file(&self.filepath)?;
        tracing::debug!(file = %self.path, "deleted file");
        Ok(())
    }
}

/// A regular file that can be thumbnailed.
#[derive(Debug, Clone)]
pub struct Photo(File);

impl Photo {
    pub fn open(gallery: &Gallery, path: &str) -> Result<Self, EntityError> {
        let file = File::open(gallery, path)?;
        if !file.filepath.is_file() {
            return Err(EntityError::NotFound(file.path));
        }
        Ok(Self(file))
    }

    /// URL of the cached thumbnail at `width`, relative to the cache root.
    pub fn thumbnail<B: ImageBackend>(
        &self,
        cache: &ThumbnailCache<B>,
        width: u32,
    ) -> Result<String, CacheError> {
        cache.get_thumbnail(self, width)
    }
}

impl Deref for Photo {
    type Target = File;

    fn deref(&self) -> &File {
        &self.0
    }
}
