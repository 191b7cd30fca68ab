//! Shares: the top-level folders that carry ACLs.
//!
//! A share is identified by its path, the first segment of every resource
//! under it. Its ACLs are kept in the stored textual form (see [`crate::acl`])
//! and decoded on demand, so a share loaded from storage round-trips
//! byte-for-byte even if nobody touches its ACLs.
//!
//! # Evaluation
//!
//! [`Share::has_permission`] is a union over entries, not first-match:
//!
//! 1. A superuser-equivalent principal is always allowed.
//! 2. Otherwise, any entry that grants the permission and matches the
//!    principal allows it: `other` matches everyone, `user` matches the
//!    identity, `group` matches any of the principal's groups.
//! 3. Nothing matched → denied. Entries of an unknown kind never match.
//!
//! There are no deny entries and entry order never changes the result.
//!
//! # Virtual shares
//!
//! A folder created directly under the data root has no stored record until
//! someone saves one. [`load_or_virtual`] returns an empty, unpersisted share
//! in that case; with no ACLs it denies everyone except superusers.
//!
//! # Persistence
//!
//! Storage is behind [`ShareStore`]. Two implementations ship with the crate:
//! [`MemoryShareStore`] for embedding and tests, and [`JsonShareStore`], a
//! versioned JSON file that keeps each share's `access` field in the stored
//! ACL text format.

use crate::acl::{self, AclEntry, AclError, Permission, SubjectKind};
use crate::paths;
use crate::principal::Principal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("ACL error: {0}")]
    Acl(#[from] AclError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Share store error: {0}")]
    Store(String),
}

/// A top-level folder and its access rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    path: String,
    description: String,
    access: String,
    persisted: bool,
}

impl Share {
    /// A virtual share: no description, no ACLs, not persisted.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: String::new(),
            access: String::new(),
            persisted: false,
        }
    }

    fn from_record(path: &str, record: ShareRecord) -> Self {
        Self {
            path: path.to_string(),
            description: record.description,
            access: record.access,
            persisted: true,
        }
    }

    fn to_record(&self) -> ShareRecord {
        ShareRecord {
            description: self.description.clone(),
            access: self.access.clone(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Stored ACL text, exactly as persisted.
    pub fn access(&self) -> &str {
        &self.access
    }

    /// `true` until the share has been loaded from or saved to a store.
    pub fn is_virtual(&self) -> bool {
        !self.persisted
    }

    /// Display name: last segment of the share path.
    pub fn friendly_name(&self) -> &str {
        paths::basename(&self.path)
    }

    /// Decode the stored ACLs. A malformed segment is an error, never skipped.
    pub fn acls(&self) -> Result<Vec<AclEntry>, AclError> {
        acl::decode_list(&self.access)
    }

    /// Replace the ACLs. The caller persists the share afterwards.
    pub fn set_acls(&mut self, entries: &[AclEntry]) {
        self.access = acl::encode_list(entries);
    }

    /// Add `permission` for a subject, reusing its entry if one exists.
    pub fn grant(
        &mut self,
        kind: SubjectKind,
        name: &str,
        permission: Permission,
    ) -> Result<(), AclError> {
        let mut entries = self.acls()?;
        match entries.iter_mut().find(|e| e.is_subject(&kind, name)) {
            Some(entry) => entry.add_permission(permission),
            None => entries.push(AclEntry::new(kind, name)?.with(permission)),
        }
        self.set_acls(&entries);
        Ok(())
    }

    pub fn has_permission(
        &self,
        permission: Permission,
        principal: &dyn Principal,
    ) -> Result<bool, AclError> {
        if principal.is_superuser() {
            return Ok(true);
        }

        let identity = principal.identity();
        for entry in self.acls()? {
            if !entry.has_permission(permission) {
                continue;
            }
            let matched = match entry.kind() {
                SubjectKind::Other => true,
                SubjectKind::User => !identity.is_empty() && entry.name() == identity,
                SubjectKind::Group => principal.in_group(entry.name()),
                SubjectKind::Unknown(_) => false,
            };
            if matched {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Persist through `store` and mark the share as no longer virtual.
    pub fn save(&mut self, store: &dyn ShareStore) -> Result<(), ShareError> {
        store.save(self)?;
        self.persisted = true;
        Ok(())
    }
}

/// Fields persisted per share. `access` is the comma-joined ACL text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub access: String,
}

/// Persistent storage for shares, keyed by path.
pub trait ShareStore: Send + Sync {
    fn load(&self, path: &str) -> Result<Option<Share>, ShareError>;

    fn save(&self, share: &Share) -> Result<(), ShareError>;

    /// All stored share paths, sorted.
    fn list(&self) -> Result<Vec<String>, ShareError>;
}

/// Load the share stored for `path`, or a virtual one if there is none.
pub fn load_or_virtual(store: &dyn ShareStore, path: &str) -> Result<Share, ShareError> {
    match store.load(path)? {
        Some(share) => Ok(share),
        None => {
            tracing::trace!(share = path, "no stored share, using virtual share");
            Ok(Share::new(path))
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryShareStore {
    shares: RwLock<HashMap<String, ShareRecord>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShareStore for MemoryShareStore {
    fn load(&self, path: &str) -> Result<Option<Share>, ShareError> {
        let shares = self.shares.read().unwrap_or_else(PoisonError::into_inner);
        Ok(shares
            .get(path)
            .cloned()
            .map(|record| Share::from_record(path, record)))
    }

    fn save(&self, share: &Share) -> Result<(), ShareError> {
        self.shares
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(share.path.clone(), share.to_record());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, ShareError> {
        let shares = self.shares.read().unwrap_or_else(PoisonError::into_inner);
        let mut paths: Vec<String> = shares.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Version of the shares file format. Bump when the layout changes.
const SHARES_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SharesFile {
    version: u32,
    shares: BTreeMap<String, ShareRecord>,
}

impl SharesFile {
    fn empty() -> Self {
        Self {
            version: SHARES_FILE_VERSION,
            shares: BTreeMap::new(),
        }
    }
}

/// Shares persisted in a single JSON file.
///
/// ```json
/// {
///   "version": 1,
///   "shares": {
///     "holiday": { "description": "Summer trips", "access": "group:family:r,user:alice:rwx" }
///   }
/// }
/// ```
///
/// A missing file is an empty store. A corrupt file or unknown version is an
/// error.
#[derive(Debug)]
pub struct JsonShareStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonShareStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SharesFile, ShareError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SharesFile::empty()),
            Err(e) => return Err(e.into()),
        };
        let file: SharesFile = serde_json::from_str(&content)?;
        if file.version != SHARES_FILE_VERSION {
            return Err(ShareError::Store(format!(
                "unsupported shares file version {} in {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(file)
    }

    fn write(&self, file: &SharesFile) -> Result<(), ShareError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(file)?;
        let tmp = paths::temp_sibling(&self.path);
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl ShareStore for JsonShareStore {
    fn load(&self, path: &str) -> Result<Option<Share>, ShareError> {
        let mut file = self.read()?;
        Ok(file
            .shares
            .remove(path)
            .map(|record| Share::from_record(path, record)))
    }

    fn save(&self, share: &Share) -> Result<(), ShareError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.read()?;
        file.shares.insert(share.path.clone(), share.to_record());
        self.write(&file)?;
        tracing::debug!(share = share.path(), store = %self.path.display(), "saved share");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, ShareError> {
        Ok(self.read()?.shares.into_keys().collect())
    }
}
