//! Access-control entries and their compact textual form.
//!
//! Every share stores its ACLs as a single string: a comma-separated list of
//! `kind:name:codes` entries, e.g.
//!
//! ```text
//! user:alice:rw,group:family:r,other::r
//! ```
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `kind` | `user`, `group` or `other` (everyone) |
//! | `name` | user or group name; ignored for `other` |
//! | `codes` | permission codes: `r` read, `w` write, `x` manage |
//!
//! The format is a stable on-record contract. A segment that does not split
//! into exactly three fields is reported as [`AclError::Malformed`], never
//! skipped. Anything else decodes: an unknown kind becomes
//! [`SubjectKind::Unknown`], which matches no principal, and unknown code
//! characters are carried along without granting anything. Both are written
//! back unchanged.
//!
//! Encoding is canonical: known codes are always written in `rwx` order
//! without duplicates, followed by any unknown codes, so `decode` followed by
//! `encode` is stable.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    #[error("malformed ACL entry: {0:?}")]
    Malformed(String),
    #[error("invalid ACL subject name {0:?} (must not contain ':' or ',')")]
    InvalidName(String),
    #[error("unknown permission: {0:?}")]
    UnknownPermission(String),
}

const FIELD_SEPARATOR: char = ':';
const ENTRY_SEPARATOR: char = ',';

/// A permission that can be granted on a share.
///
/// The set is closed: each permission owns exactly one code character and
/// adding a new one changes the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    Read,
    Write,
    Manage,
}

impl Permission {
    /// All permissions in canonical code order.
    pub const ALL: [Permission; 3] = [Permission::Read, Permission::Write, Permission::Manage];

    pub fn code(self) -> char {
        match self {
            Permission::Read => 'r',
            Permission::Write => 'w',
            Permission::Manage => 'x',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Manage => "manage",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Permission::Read => 0b001,
            Permission::Write => 0b010,
            Permission::Manage => 0b100,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the long name (`read`) or the single-letter code (`r`).
impl FromStr for Permission {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Some(p) = Self::ALL.into_iter().find(|p| p.name() == lower) {
            return Ok(p);
        }
        let mut chars = lower.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Permission::from_code(c).ok_or_else(|| AclError::UnknownPermission(s.to_string()))
            }
            _ => Err(AclError::UnknownPermission(s.to_string())),
        }
    }
}

/// A set of permissions, stored as bits and rendered as canonical codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet(u8);

impl PermissionSet {
    pub fn empty() -> Self {
        Self(0)
    }

    /// Returns `true` if the permission was not already present.
    pub fn insert(&mut self, permission: Permission) -> bool {
        let added = !self.contains(permission);
        self.0 |= permission.bit();
        added
    }

    pub fn contains(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.contains(*p))
    }

    /// Canonical code string: `rwx` order, no duplicates.
    pub fn codes(self) -> String {
        self.iter().map(Permission::code).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::empty();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

/// Who an ACL entry applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    User,
    Group,
    /// Every principal, regardless of identity or groups.
    Other,
    /// A kind this crate does not know, kept verbatim. Matches nobody.
    Unknown(String),
}

impl SubjectKind {
    pub fn as_str(&self) -> &str {
        match self {
            SubjectKind::User => "user",
            SubjectKind::Group => "group",
            SubjectKind::Other => "other",
            SubjectKind::Unknown(kind) => kind,
        }
    }

    /// Read the kind field of a stored entry. Never fails.
    pub fn from_stored(text: &str) -> Self {
        text.parse()
            .unwrap_or_else(|_| SubjectKind::Unknown(text.to_string()))
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts only the known kinds.
impl FromStr for SubjectKind {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(SubjectKind::User),
            "group" => Ok(SubjectKind::Group),
            "other" => Ok(SubjectKind::Other),
            _ => Err(AclError::Malformed(s.to_string())),
        }
    }
}

/// One `(subject, permissions)` rule attached to a share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AclEntry {
    kind: SubjectKind,
    name: String,
    permissions: PermissionSet,
    /// Stored code characters that name no [`Permission`].
    unknown_codes: String,
}

impl AclEntry {
    /// Create an entry with no permissions.
    ///
    /// The name must not contain the field or entry separators, otherwise the
    /// entry could not be read back from the persisted form.
    pub fn new(kind: SubjectKind, name: impl Into<String>) -> Result<Self, AclError> {
        let name = name.into();
        for field in [kind.as_str(), name.as_str()] {
            if field.contains(FIELD_SEPARATOR) || field.contains(ENTRY_SEPARATOR) {
                return Err(AclError::InvalidName(field.to_string()));
            }
        }
        Ok(Self {
            kind,
            name,
            permissions: PermissionSet::empty(),
            unknown_codes: String::new(),
        })
    }

    pub fn user(name: impl Into<String>) -> Result<Self, AclError> {
        Self::new(SubjectKind::User, name)
    }

    pub fn group(name: impl Into<String>) -> Result<Self, AclError> {
        Self::new(SubjectKind::Group, name)
    }

    pub fn other() -> Self {
        Self {
            kind: SubjectKind::Other,
            name: String::new(),
            permissions: PermissionSet::empty(),
            unknown_codes: String::new(),
        }
    }

    /// Builder-style variant of [`add_permission`](Self::add_permission).
    pub fn with(mut self, permission: Permission) -> Self {
        self.add_permission(permission);
        self
    }

    pub fn kind(&self) -> &SubjectKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn permissions(&self) -> PermissionSet {
        self.permissions
    }

    pub fn unknown_codes(&self) -> &str {
        &self.unknown_codes
    }

    /// Grant a permission. Idempotent.
    pub fn add_permission(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether this entry names the same subject as `kind`/`name`.
    /// All `other` entries share one subject.
    pub fn is_subject(&self, kind: &SubjectKind, name: &str) -> bool {
        self.kind == *kind && (*kind == SubjectKind::Other || self.name == name)
    }

    /// Parse a single `kind:name:codes` segment. Only a wrong field count
    /// is an error.
    pub fn decode(text: &str) -> Result<Self, AclError> {
        let mut fields = text.split(FIELD_SEPARATOR);
        let (Some(kind), Some(name), Some(codes), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(AclError::Malformed(text.to_string()));
        };

        let mut permissions = PermissionSet::empty();
        let mut unknown_codes = String::new();
        for c in codes.chars() {
            match Permission::from_code(c) {
                Some(p) => {
                    permissions.insert(p);
                }
                None if !unknown_codes.contains(c) => unknown_codes.push(c),
                None => {}
            }
        }

        Ok(Self {
            kind: SubjectKind::from_stored(kind),
            name: name.to_string(),
            permissions,
            unknown_codes,
        })
    }

    /// Canonical `kind:name:codes` form.
    pub fn encode(&self) -> String {
        format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{}",
            self.kind,
            self.name,
            self.permissions.codes(),
            self.unknown_codes
        )
    }
}

impl fmt::Display for AclEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for AclEntry {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Outcome of parsing one stored segment. Malformed text is kept verbatim so
/// callers can report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAcl {
    Valid(AclEntry),
    Malformed(String),
}

impl ParsedAcl {
    pub fn into_result(self) -> Result<AclEntry, AclError> {
        match self {
            ParsedAcl::Valid(entry) => Ok(entry),
            ParsedAcl::Malformed(raw) => Err(AclError::Malformed(raw)),
        }
    }
}

pub fn parse_segment(text: &str) -> ParsedAcl {
    match AclEntry::decode(text) {
        Ok(entry) => ParsedAcl::Valid(entry),
        Err(_) => ParsedAcl::Malformed(text.to_string()),
    }
}

/// Parse every non-empty segment of a stored ACL string.
pub fn parse_list(text: &str) -> impl Iterator<Item = ParsedAcl> + '_ {
    text.split(ENTRY_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(parse_segment)
}

/// Decode a stored ACL string. The first malformed segment aborts decoding.
pub fn decode_list(text: &str) -> Result<Vec<AclEntry>, AclError> {
    parse_list(text).map(ParsedAcl::into_result).collect()
}

/// Encode entries to the stored form. No entries → empty string.
pub fn encode_list(entries: &[AclEntry]) -> String {
    entries
        .iter()
        .map(AclEntry::encode)
        .collect::<Vec<_>>()
        .join(&ENTRY_SEPARATOR.to_string())
}
