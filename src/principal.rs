//! The requester side of a permission check.
//!
//! Authentication and user/group storage live outside this crate. Whatever
//! provides them only has to implement [`Principal`]; [`User`] is a plain
//! value implementation used by the CLI and by tests.

use std::collections::BTreeSet;

/// An authenticated (or anonymous) actor asking for a permission.
pub trait Principal {
    /// User name matched against `user:` ACL entries.
    fn identity(&self) -> &str;

    /// Whether the principal belongs to the named group (`group:` entries).
    fn in_group(&self, group: &str) -> bool;

    /// Superuser-equivalent principals hold every permission on every share.
    fn is_superuser(&self) -> bool;
}

/// A principal described entirely by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub groups: BTreeSet<String>,
    pub superuser: bool,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A principal with no identity and no groups. Only `other` entries apply.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn superuser(name: impl Into<String>) -> Self {
        Self {
            superuser: true,
            ..Self::new(name)
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }
}

impl Principal for User {
    fn identity(&self) -> &str {
        &self.name
    }

    fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    fn is_superuser(&self) -> bool {
        self.superuser
    }
}
