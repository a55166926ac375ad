// sandbox.rs — The restrictive policy for script execution.
//
// Scripts run under a designated marker origin. When a context carries
// that marker, the decision comes entirely from this policy: no template,
// dynamic, system, or plugin source is consulted. Scripts must never
// benefit from ambient trust in other layers.

use warden_permission::{ExecutionContext, Permission, PermissionSet};

use crate::policy::Policy;

/// The origin reserved for script-execution contexts. Matched exactly.
pub const UNTRUSTED_MARKER: &str = "warden://untrusted";

/// The fixed, restrictive policy applied exclusively to the untrusted
/// marker origin.
pub struct SandboxPolicy {
    grants: PermissionSet,
}

impl SandboxPolicy {
    /// The bundled sandbox grants, resolved at engine construction: the
    /// handful of runtime capabilities script engines need to spin up,
    /// and nothing else — no file, no socket access.
    pub fn bundled() -> Self {
        Self::new(PermissionSet::from_iter([
            Permission::runtime("createScriptEngine"),
            Permission::runtime("accessScriptContext"),
        ]))
    }

    /// A sandbox over an explicit grant set. The engine is correct for
    /// any set here, including an empty (deny-everything) one.
    pub fn new(grants: PermissionSet) -> Self {
        Self { grants }
    }
}

impl Policy for SandboxPolicy {
    fn implies(&self, _context: &ExecutionContext, permission: &Permission) -> bool {
        // Origin is irrelevant: the engine only routes the marker origin
        // here, and every marker context is identical.
        self.grants.implies(permission)
    }
}
