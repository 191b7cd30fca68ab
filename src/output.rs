//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Folder listing (`ls`)
//!
//! ```text
//! Shares / holiday / 2013
//! Folders
//!     day-trips/
//! Photos
//!     beach.jpg  2.3 MB
//!     dunes.png  812.4 kB
//! Files
//!     notes.txt  120 B
//! ```
//!
//! Empty sections are omitted; an empty folder prints `(empty)`.
//!
//! ## Share (`acl show`)
//!
//! ```text
//! Share holiday
//!     Description: Summer trips
//!     group:family  read
//!     user:alice    read, write, manage
//! ```
//!
//! A share with no stored record is shown as `Share holiday (virtual)`.
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::acl::{AclEntry, AclError, Permission};
use crate::cache::CacheStats;
use crate::entities::{EntryInfo, Folder, FolderContents};
use crate::paths;
use crate::principal::Principal;
use crate::share::Share;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count: `B` up to 1 kB, then `kB` and `MB` with one
/// decimal (powers of 1024).
///
/// ```
/// # use share_gallery::output::format_size;
/// assert_eq!(format_size(1024), "1024 B");
/// assert_eq!(format_size(1536), "1.5 kB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes > MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes > KB {
        format!("{:.1} kB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Breadcrumb trail of a folder, joined with `/`.
fn folder_heading(folder: &Folder, root_title: &str) -> String {
    let url = format!("/{}/", folder.path());
    paths::crumbs(&url, root_title)
        .into_iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(" / ")
}

fn entry_line(entry: &EntryInfo) -> String {
    match entry.size {
        Some(size) => format!("{}{}  {}", indent(1), entry.name, format_size(size)),
        None => format!("{}{}/", indent(1), entry.name),
    }
}

pub fn format_contents(folder: &Folder, root_title: &str, contents: &FolderContents) -> Vec<String> {
    let mut lines = vec![folder_heading(folder, root_title)];

    for (label, entries) in [
        ("Folders", &contents.folders),
        ("Photos", &contents.photos),
        ("Files", &contents.files),
    ] {
        if entries.is_empty() {
            continue;
        }
        lines.push(label.to_string());
        lines.extend(entries.iter().map(entry_line));
    }

    if lines.len() == 1 {
        lines.push(format!("{}(empty)", indent(1)));
    }
    lines
}

pub fn print_contents(folder: &Folder, root_title: &str, contents: &FolderContents) {
    for line in format_contents(folder, root_title, contents) {
        println!("{}", line);
    }
}

/// Permission names of an entry, e.g. `read, write`.
fn permission_names(entry: &AclEntry) -> String {
    entry
        .permissions()
        .iter()
        .map(Permission::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Share header, description and one line per ACL entry, subjects aligned.
pub fn format_share(share: &Share) -> Result<Vec<String>, AclError> {
    let entries = share.acls()?;

    let mut header = format!("Share {}", share.path());
    if share.is_virtual() {
        header.push_str(" (virtual)");
    }
    let mut lines = vec![header];

    if !share.description().is_empty() {
        lines.push(format!("{}Description: {}", indent(1), share.description()));
    }

    let subjects: Vec<String> = entries
        .iter()
        .map(|e| format!("{}:{}", e.kind(), e.name()))
        .collect();
    let width = subjects.iter().map(String::len).max().unwrap_or(0);

    for (subject, entry) in subjects.iter().zip(&entries) {
        lines.push(format!(
            "{}{:<width$}  {}",
            indent(1),
            subject,
            permission_names(entry)
        ));
    }
    if entries.is_empty() {
        lines.push(format!("{}(no access rules)", indent(1)));
    }

    Ok(lines)
}

pub fn print_share(share: &Share) -> Result<(), AclError> {
    for line in format_share(share)? {
        println!("{}", line);
    }
    Ok(())
}

/// One-line verdict of a permission check.
pub fn format_check(
    path: &str,
    permission: Permission,
    principal: &dyn Principal,
    allowed: bool,
) -> String {
    let who = match principal.identity() {
        "" => "(anonymous)",
        name => name,
    };
    let verdict = if allowed { "may" } else { "may not" };
    format!("{} {} {} /{}", who, verdict, permission.name(), path)
}

pub fn format_warm(folder: &Folder, widths: &[u32], stats: &CacheStats) -> String {
    let widths: Vec<String> = widths.iter().map(|w| format!("{w}px")).collect();
    format!("/{} [{}]: {}", folder.path(), widths.join(", "), stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::SubjectKind;
    use crate::principal::User;
    use crate::test_helpers::*;

    #[test]
    fn size_in_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(120), "120 B");
        assert_eq!(format_size(1024), "1024 B");
    }

    #[test]
    fn size_in_kilobytes() {
        assert_eq!(format_size(1025), "1.0 kB");
        assert_eq!(format_size(831_898), "812.4 kB");
        assert_eq!(format_size(1024 * 1024), "1024.0 kB");
    }

    #[test]
    fn size_in_megabytes() {
        assert_eq!(format_size(2_411_725), "2.3 MB");
    }

    #[test]
    fn contents_listing() {
        let fx = setup_gallery();
        write_file(&fx.gallery, "holiday/2013/beach.jpg", &[0; 2048]);
        write_file(&fx.gallery, "holiday/2013/notes.txt", b"hi");
        Folder::create(&fx.gallery, "holiday/2013/day-trips").unwrap();

        let folder = Folder::open(&fx.gallery, "holiday/2013").unwrap();
        let contents = folder.contents().unwrap();
        let lines = format_contents(&folder, "Shares", &contents);

        assert_eq!(
            lines,
            vec![
                "Shares / holiday / 2013",
                "Folders",
                "    day-trips/",
                "Photos",
                "    beach.jpg  2.0 kB",
                "Files",
                "    notes.txt  2 B",
            ]
        );
    }

    #[test]
    fn empty_root_listing() {
        let fx = setup_gallery();
        let root = Folder::open(&fx.gallery, "").unwrap();
        let lines = format_contents(&root, "Family", &root.contents().unwrap());
        assert_eq!(lines, vec!["Family", "    (empty)"]);
    }

    #[test]
    fn share_with_aligned_entries() {
        let mut share = Share::new("holiday");
        share.set_description("Summer trips");
        share
            .grant(SubjectKind::Group, "family", Permission::Read)
            .unwrap();
        share
            .grant(SubjectKind::User, "al", Permission::Manage)
            .unwrap();
        share.grant(SubjectKind::User, "al", Permission::Read).unwrap();

        assert_eq!(
            format_share(&share).unwrap(),
            vec![
                "Share holiday (virtual)",
                "    Description: Summer trips",
                "    group:family  read",
                "    user:al       read, manage",
            ]
        );
    }

    #[test]
    fn share_without_rules() {
        let share = Share::new("work");
        assert_eq!(
            format_share(&share).unwrap(),
            vec!["Share work (virtual)", "    (no access rules)"]
        );
    }

    #[test]
    fn check_verdicts() {
        assert_eq!(
            format_check("holiday", Permission::Write, &User::new("alice"), true),
            "alice may write /holiday"
        );
        assert_eq!(
            format_check("holiday/2013", Permission::Read, &User::anonymous(), false),
            "(anonymous) may not read /holiday/2013"
        );
    }

    #[test]
    fn warm_summary() {
        let fx = setup_gallery();
        let folder = Folder::create(&fx.gallery, "holiday").unwrap();
        let stats = CacheStats {
            hits: 1,
            misses: 3,
            failed: 0,
        };
        assert_eq!(
            format_warm(&folder, &[128, 400], &stats),
            "/holiday [128px, 400px]: 1 cached, 3 generated (4 total)"
        );
    }
}
