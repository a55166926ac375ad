// policy.rs — The Policy trait and the static per-origin implementation.
//
// A Policy is an opaque, queryable object: given an execution context and
// a permission, does this policy grant it? The engine composes policies
// (template, sandbox, system, per-plugin) at query time, in a fixed
// order — they are never merged into one structure at construction.

use std::collections::HashMap;

use warden_permission::{ExecutionContext, Origin, Permission, PermissionSet};

/// An opaque source of grant decisions.
///
/// Implementations must be cheap, deterministic, and free of I/O: the
/// engine calls them inline on every sensitive operation, from any
/// thread.
pub trait Policy: Send + Sync {
    fn implies(&self, context: &ExecutionContext, permission: &Permission) -> bool;
}

/// A policy over already-parsed grants: a set applying to every origin
/// plus per-origin sets. This is the shape in which externally parsed
/// template and system policies reach the engine.
#[derive(Debug, Default)]
pub struct StaticPolicy {
    any_origin: PermissionSet,
    by_origin: HashMap<Origin, PermissionSet>,
}

impl StaticPolicy {
    pub fn new(any_origin: PermissionSet, by_origin: HashMap<Origin, PermissionSet>) -> Self {
        Self {
            any_origin,
            by_origin,
        }
    }

    /// A policy granting only the given set, to every origin.
    pub fn granting_all_origins(grants: PermissionSet) -> Self {
        Self::new(grants, HashMap::new())
    }
}

impl Policy for StaticPolicy {
    fn implies(&self, context: &ExecutionContext, permission: &Permission) -> bool {
        if self.any_origin.implies(permission) {
            return true;
        }
        context
            .origin()
            .and_then(|origin| self.by_origin.get(origin))
            .is_some_and(|grants| grants.implies(permission))
    }
}

/// Grants nothing, ever. The safe default where no policy was supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl Policy for DenyAll {
    fn implies(&self, _context: &ExecutionContext, _permission: &Permission) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_permission::{FileAction, FileActionSet};

    fn read(target: &str) -> Permission {
        Permission::file(target, FileActionSet::single(FileAction::Read)).unwrap()
    }

    #[test]
    fn static_policy_checks_global_then_per_origin_grants() {
        let mut by_origin = HashMap::new();
        by_origin.insert(
            Origin::new("plugin://a"),
            PermissionSet::from_iter([read("/data/a")]),
        );
        let policy = StaticPolicy::new(PermissionSet::from_iter([read("/shared/x")]), by_origin);

        let a = ExecutionContext::with_origin("plugin://a");
        let b = ExecutionContext::with_origin("plugin://b");

        assert!(policy.implies(&a, &read("/shared/x")));
        assert!(policy.implies(&b, &read("/shared/x")));
        assert!(policy.implies(&a, &read("/data/a")));
        assert!(!policy.implies(&b, &read("/data/a")));
    }

    #[test]
    fn static_policy_global_grants_apply_even_without_origin() {
        let policy = StaticPolicy::granting_all_origins(PermissionSet::from_iter([read("/x")]));
        // The aggregator denies origin-less contexts before any policy is
        // consulted; the static policy itself only scopes per-origin sets.
        assert!(policy.implies(&ExecutionContext::unattributed(), &read("/x")));
    }

    #[test]
    fn deny_all_denies() {
        let ctx = ExecutionContext::with_origin("plugin://a");
        assert!(!DenyAll.implies(&ctx, &read("/x")));
        assert!(!DenyAll.implies(&ctx, &Permission::All));
    }
}
