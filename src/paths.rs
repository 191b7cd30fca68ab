//! Logical URLs ↔ physical storage paths.
//!
//! Everything in the gallery is addressed by a slash-separated logical path
//! relative to a root (`"holiday/2013/beach.jpg"`). These helpers translate
//! between that form and the platform's path separator, and derive the small
//! bits of structure callers need (owning share, basename, breadcrumbs).
//!
//! All functions are pure: no I/O, no failure modes.

use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const URL_SEPARATOR: char = '/';

/// Replace `/` with the platform separator.
pub fn url_to_path(url: &str) -> PathBuf {
    PathBuf::from(url.replace(URL_SEPARATOR, MAIN_SEPARATOR_STR))
}

/// Inverse of [`url_to_path`] for any path it produced.
pub fn path_to_url(path: &Path) -> String {
    path.to_string_lossy()
        .replace(MAIN_SEPARATOR, &URL_SEPARATOR.to_string())
}

/// The share a logical path belongs to: its first segment.
///
/// ```
/// # use share_gallery::paths::share_of;
/// assert_eq!(share_of("holiday/2013/beach.jpg"), "holiday");
/// assert_eq!(share_of(""), "");
/// ```
pub fn share_of(url: &str) -> &str {
    url.split(URL_SEPARATOR).next().unwrap_or_default()
}

/// Last segment of a logical path.
pub fn basename(url: &str) -> &str {
    url.rsplit(URL_SEPARATOR).next().unwrap_or_default()
}

/// Join a child name onto a logical path; the root is the empty string.
pub fn join_url(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{URL_SEPARATOR}{name}")
    }
}

/// Strip leading and trailing slashes, the canonical form used as identity.
pub fn normalize(url: &str) -> &str {
    url.trim_matches(URL_SEPARATOR)
}

/// Whether a logical path stays inside its root: no `.`/`..` segments and
/// no empty segments in the middle.
pub fn is_contained(url: &str) -> bool {
    let url = normalize(url);
    url.is_empty()
        || url
            .split(URL_SEPARATOR)
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// One level of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub path: String,
}

/// Breadcrumbs for a browser-style path such as `/foo/bar/baz.jpg`.
///
/// The first crumb is always the root, titled `root_title`. Intermediate
/// segments are folders and get a trailing slash; the last segment keeps one
/// only if the input ended with a slash.
///
/// ```text
/// /foo/bar.jpg → [root "/", foo "/foo/", bar.jpg "/foo/bar.jpg"]
/// /foo/        → [root "/", foo "/foo/"]
/// ```
pub fn crumbs(url: &str, root_title: &str) -> Vec<Crumb> {
    let mut trail = vec![Crumb {
        name: root_title.to_string(),
        path: URL_SEPARATOR.to_string(),
    }];

    let is_folder = url.ends_with(URL_SEPARATOR);
    let segments: Vec<&str> = normalize(url)
        .split(URL_SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect();

    let mut path = String::new();
    for (i, segment) in segments.iter().enumerate() {
        path.push(URL_SEPARATOR);
        path.push_str(segment);
        let last = i + 1 == segments.len();
        let mut crumb_path = path.clone();
        if !last || is_folder {
            crumb_path.push(URL_SEPARATOR);
        }
        trail.push(Crumb {
            name: segment.to_string(),
            path: crumb_path,
        });
    }

    trail
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A unique sibling path used to write a file before renaming it into place.
///
/// Dot-prefixed so folder listings skip it if a write is interrupted.
pub(crate) fn temp_sibling(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.{}-{n}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_path_roundtrip() {
        for url in ["", "a", "holiday/2013/beach.jpg", "a/b/"] {
            assert_eq!(path_to_url(&url_to_path(url)), url);
        }
    }

    #[test]
    fn url_to_path_uses_platform_separator() {
        let path = url_to_path("a/b/c.jpg");
        let parts: Vec<_> = path.components().collect();
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn share_of_takes_first_segment() {
        assert_eq!(share_of("holiday/2013"), "holiday");
        assert_eq!(share_of("holiday"), "holiday");
    }

    #[test]
    fn basename_takes_last_segment() {
        assert_eq!(basename("holiday/2013/beach.jpg"), "beach.jpg");
        assert_eq!(basename("holiday"), "holiday");
        assert_eq!(basename(""), "");
    }

    #[test]
    fn join_url_from_root() {
        assert_eq!(join_url("", "holiday"), "holiday");
        assert_eq!(join_url("holiday", "2013"), "holiday/2013");
    }

    #[test]
    fn contained_paths() {
        assert!(is_contained(""));
        assert!(is_contained("/holiday/2013/"));
        assert!(!is_contained("holiday/../secret"));
        assert!(!is_contained("./holiday"));
        assert!(!is_contained("holiday//2013"));
    }

    // =========================================================================
    // crumbs
    // =========================================================================

    fn crumb(name: &str, path: &str) -> Crumb {
        Crumb {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn crumbs_for_root() {
        assert_eq!(crumbs("/", "Home"), vec![crumb("Home", "/")]);
    }

    #[test]
    fn crumbs_for_top_level_file() {
        assert_eq!(
            crumbs("/foo.jpg", "Home"),
            vec![crumb("Home", "/"), crumb("foo.jpg", "/foo.jpg")]
        );
    }

    #[test]
    fn crumbs_for_folder() {
        assert_eq!(
            crumbs("/foo/", "Home"),
            vec![crumb("Home", "/"), crumb("foo", "/foo/")]
        );
    }

    #[test]
    fn crumbs_for_nested_file() {
        assert_eq!(
            crumbs("/foo/bar/baz.jpg", "Home"),
            vec![
                crumb("Home", "/"),
                crumb("foo", "/foo/"),
                crumb("bar", "/foo/bar/"),
                crumb("baz.jpg", "/foo/bar/baz.jpg"),
            ]
        );
    }

    #[test]
    fn temp_sibling_stays_in_directory() {
        let target = Path::new("/cache/400/a/b.jpg");
        let tmp = temp_sibling(target);
        assert_eq!(tmp.parent(), target.parent());
        assert_ne!(tmp, target);
        assert_ne!(temp_sibling(target), tmp);
    }
}
