// defaults.rs — Filter for known-unsafe grants in ambient system policy.
//
// Common default ambient policies ship two blanket grants that must never
// reach extension code: an unrestricted "stop any thread" runtime
// capability, and "listen on any dynamic port". This module wraps the
// externally supplied system policy and refuses both before delegating
// anything else unchanged.
//
// The listen check runs a cheap kind/action pre-test first: full socket
// implication can trigger expensive reverse host lookups in the layers
// that feed this engine, and the pre-test avoids them for every
// non-socket, non-listen request.

use std::sync::{Arc, LazyLock};

use warden_permission::{
    ExecutionContext, Permission, SocketAction, SocketActionSet,
};

use crate::policy::Policy;

/// A known-unsafe blanket grant, plus the cheap pre-test applied before
/// the full implication check.
struct BadDefault {
    permission: Permission,
    pre_implies: fn(&Permission) -> bool,
}

impl BadDefault {
    fn matches(&self, requested: &Permission) -> bool {
        (self.pre_implies)(requested) && self.permission.implies(requested)
    }
}

/// Process-wide constant configuration data: the two grants filtered out
/// of whatever ambient policy exists. Not mutable state.
static BAD_DEFAULTS: LazyLock<[BadDefault; 2]> = LazyLock::new(|| {
    [
        // Unrestricted thread stopping. No pre-test needed; the runtime
        // implication check is a string compare.
        BadDefault {
            permission: Permission::runtime("stopThread"),
            pre_implies: |_| true,
        },
        // "Anyone may listen on dynamic ports." Specified exactly, with a
        // kind/action pre-test so non-listen traffic never reaches socket
        // implication.
        BadDefault {
            permission: Permission::socket(
                "localhost:0",
                SocketActionSet::single(SocketAction::Listen),
            )
            .expect("built-in bad-default spec is well-formed"),
            pre_implies: |requested| {
                matches!(
                    requested,
                    Permission::Socket { actions, .. } if actions.contains(SocketAction::Listen)
                )
            },
        },
    ]
});

/// True when the requested permission is one of the known-unsafe blanket
/// grants.
pub fn is_bad_default(requested: &Permission) -> bool {
    BAD_DEFAULTS.iter().any(|bad| bad.matches(requested))
}

/// Wraps the ambient system policy, refusing the bad defaults before
/// delegating. Applied only when enabled at engine construction; when
/// disabled, the raw ambient policy is used as-is.
pub struct FilteredSystemPolicy {
    delegate: Arc<dyn Policy>,
}

impl FilteredSystemPolicy {
    pub fn new(delegate: Arc<dyn Policy>) -> Self {
        Self { delegate }
    }
}

impl Policy for FilteredSystemPolicy {
    fn implies(&self, context: &ExecutionContext, permission: &Permission) -> bool {
        if is_bad_default(permission) {
            return false;
        }
        self.delegate.implies(context, permission)
    }
}
