// shim.rs — Caller detection for narrow compatibility escape hatches.
//
// Two known-broken third-party behaviors need call-site detection:
//
// 1. A legacy shell-exec library that requests blanket ("all files")
//    access as a workaround for its own defect, and treats a thrown
//    failure as "permission unavailable, proceed without it". The engine
//    answers with PolicyError::CompatibilityDenied instead of a plain
//    deny; the host boundary converts that into the failure shape the
//    library swallows. TODO: delete the shell-exec arm once the upstream
//    library stops probing for blanket file access.
//
// 2. A class-loading introspection tool that enumerates grants instead of
//    asking implication questions; it must receive an empty grant set,
//    never a delegated answer.
//
// Detection is behind a trait so the platform's call-site introspection
// mechanism stays out of the core algorithm and tests can stub it.

use warden_permission::{FileActionSet, Permission};

/// Inspects the current call stack for the two known-bad callers.
///
/// Implementations use whatever call-site introspection the host platform
/// offers. The default, [`NoInspection`], detects nothing, which disables
/// both escape hatches.
pub trait CallerInspector: Send + Sync {
    /// Is the legacy shell-exec library on the stack right now?
    fn is_legacy_shell_exec(&self) -> bool;

    /// Is the grant-enumerating introspection tool on the stack right now?
    fn is_loader_introspection(&self) -> bool;
}

/// Detects nothing; both compatibility paths stay dormant.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInspection;

impl CallerInspector for NoInspection {
    fn is_legacy_shell_exec(&self) -> bool {
        false
    }

    fn is_loader_introspection(&self) -> bool {
        false
    }
}

/// The request shape the legacy shell-exec library probes with: blanket
/// access to the whole filesystem. No legitimate grant is ever this
/// broad, so matching it is safe.
pub(crate) fn is_blanket_file_request(permission: &Permission) -> bool {
    matches!(
        permission,
        Permission::File { target, actions } if target.is_unbounded() && *actions != FileActionSet::EMPTY
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_permission::{FileAction, FileActionSet};

    #[test]
    fn blanket_request_shape_is_recognized() {
        let blanket = Permission::file("/**", FileActionSet::single(FileAction::Execute)).unwrap();
        assert!(is_blanket_file_request(&blanket));

        let scoped = Permission::file("/data/**", FileActionSet::ALL).unwrap();
        assert!(!is_blanket_file_request(&scoped));
        assert!(!is_blanket_file_request(&Permission::runtime("stopThread")));
    }
}
