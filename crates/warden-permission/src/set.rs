// set.rs — Immutable, merged permission collections.
//
// A PermissionSet is built once, from externally supplied grants, and is
// read-only from then on. Immutability is the invariant that stops any
// runtime code path from escalating its own privileges: the set type has
// no mutation operations at all, and the builder is consumed by
// `build()`, so "add after finalize" is a compile error rather than a
// runtime condition.
//
// Two build entry points exist for the two input shapes construction
// deals in (an eagerly iterable collection, and an ordered list); both
// run the same merge loop and produce equivalent sets.

use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// Accumulates permissions until frozen into a [`PermissionSet`].
#[derive(Debug, Default)]
pub struct PermissionSetBuilder {
    members: Vec<Permission>,
}

impl PermissionSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, permission: Permission) -> &mut Self {
        self.members.push(permission);
        self
    }

    /// Freeze into an immutable set. Consumes the builder.
    pub fn build(self) -> PermissionSet {
        PermissionSet {
            members: self.members,
        }
    }
}

/// An immutable set of permissions of possibly mixed target granularity.
///
/// The implication query is the native partial order of the members, so a
/// directory grant covers file requests beneath it without needing
/// individual entries. An empty set implies nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    members: Vec<Permission>,
}

impl PermissionSet {
    /// The set that implies nothing.
    pub fn empty() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Build from any iterable collection of permissions.
    pub fn from_iter(permissions: impl IntoIterator<Item = Permission>) -> Self {
        let mut builder = PermissionSetBuilder::new();
        for permission in permissions {
            builder.add(permission);
        }
        builder.build()
    }

    /// Build from an ordered list. Equivalent to [`PermissionSet::from_iter`]
    /// over the same members; kept separate because construction inputs
    /// arrive in both shapes.
    pub fn from_ordered(permissions: &[Permission]) -> Self {
        Self::from_iter(permissions.iter().cloned())
    }

    /// Does any member imply the requested permission?
    pub fn implies(&self, requested: &Permission) -> bool {
        self.members.iter().any(|member| member.implies(requested))
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.members.iter()
    }
}
