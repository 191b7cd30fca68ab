//! # Share Gallery
//!
//! A photo gallery over shared storage. A directory tree on disk is the data
//! source: top-level folders are *shares* with their own access rules, and
//! any photo in the tree can be served as a cached, orientation-corrected
//! thumbnail.
//!
//! # Architecture
//!
//! A request flows through the crate like this:
//!
//! ```text
//! logical path ──► Folder / File / Photo ──► Share ──► ACL evaluation
//!   "holiday/2013/beach.jpg"      │          "holiday"   (principal, permission)
//!                                 │
//!                                 └──► ThumbnailCache ──► ImageBackend
//!                                       {cache_root}/{width}/{path}
//! ```
//!
//! 1. The caller opens an entity by logical path; opening fails if the path
//!    does not exist or tries to leave the data root.
//! 2. The entity's share (first path segment) decides whether a principal may
//!    read, write or manage it.
//! 3. For photos, the cache returns the URL of a thumbnail, generating it on
//!    the first request.
//!
//! Authentication, user storage and HTTP are left to the embedding
//! application: principals come in through the [`principal::Principal`] trait
//! and share records through the [`share::ShareStore`] trait.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`acl`] | ACL entries, permissions, and the `kind:name:codes` stored format |
//! | [`share`] | Shares, permission evaluation, and share storage (memory, JSON file) |
//! | [`principal`] | The `Principal` trait and a plain `User` implementation |
//! | [`paths`] | Logical URL ↔ filesystem path mapping, breadcrumbs |
//! | [`entities`] | `Folder`, `File`, `Photo`: existence-checked entities under the data root |
//! | [`cache`] | The on-demand thumbnail cache with per-path generation locks |
//! | [`imaging`] | Pure-Rust image work: EXIF orientation, resize, encode |
//! | [`config`] | `gallery.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Union Semantics, No Deny Rules
//!
//! A principal has a permission if *any* ACL entry of the share grants it to
//! them. There are no deny entries, so entry order never matters and adding
//! an entry can only widen access. Superusers bypass ACLs entirely.
//!
//! ## Strict ACL Decoding
//!
//! Stored ACL text that cannot be parsed is an error all the way up to the
//! caller of `has_permission`. Skipping an unreadable entry would change who
//! can see a share without anyone noticing.
//!
//! ## Immutable Cache Entries
//!
//! A thumbnail is never regenerated once it exists, and the source photo is
//! not consulted on a hit. Replacing a photo in place therefore leaves stale
//! thumbnails until the cache directory is cleared. In exchange a hit costs a
//! single `stat`, and cache entries can be served directly by a web server.
//!
//! ## Rotate-Only Orientation by Default
//!
//! EXIF orientations that include a mirror (2, 4, 5, 7) are corrected for
//! rotation only unless `thumbnails.orientation = "full"` is configured. See
//! [`imaging::orientation`].
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resizing and encoding use the `image` crate; EXIF orientation is
//! read by a small built-in parser. No system libraries are needed.

pub mod acl;
pub mod cache;
pub mod config;
pub mod entities;
pub mod imaging;
pub mod output;
pub mod paths;
pub mod principal;
pub mod share;

#[cfg(test)]
pub(crate) mod test_helpers;
