// secured.rs — Origin allow-lists for designated sensitive files.
//
// A secured file is a path whose access is decided *only* here: an
// explicit allow-list of origins, overriding every other policy source,
// grant or deny. Entries are built once from configuration (path string →
// permitted origins) and never change.
//
// Resolution needs two shapes: exact equality (cheap, the common case)
// and directory-scoped entries covering more specific paths (rare, needs
// a scan). The linear scan for the rare case is a deliberate trade
// against a heavier index.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use warden_permission::{
    ExecutionContext, FileActionSet, Origin, Permission, PermissionSet, PermissionSetBuilder,
};

use crate::error::PolicyError;
use crate::policy::Policy;

struct SecuredEntry {
    /// The configured path as an all-actions file permission. Secured
    /// grants carry no action mask: an allow-listed origin may do
    /// anything with the file, everyone else may do nothing.
    permission: Permission,
    permitted: HashSet<Origin>,
}

/// Maps secured path patterns to the origins permitted to access them.
pub struct SecuredFileRegistry {
    entries: Vec<SecuredEntry>,
    /// Exact-match fast path: written target form → entry index.
    by_target: HashMap<String, usize>,
    /// Merged keys, for the cheap "is this permission even secured"
    /// pre-check the engine runs on every request.
    all_secured: PermissionSet,
}

impl SecuredFileRegistry {
    pub fn new(secured_files: &HashMap<String, HashSet<Origin>>) -> Result<Self, PolicyError> {
        let mut entries = Vec::with_capacity(secured_files.len());
        let mut by_target = HashMap::with_capacity(secured_files.len());
        let mut all = PermissionSetBuilder::new();

        for (path, permitted) in secured_files {
            let permission = Permission::file_all_actions(path)?;
            all.add(permission.clone());
            by_target.insert(target_key(&permission), entries.len());
            entries.push(SecuredEntry {
                permission,
                permitted: permitted.clone(),
            });
        }

        debug!(entries = entries.len(), "secured file registry built");
        Ok(Self {
            entries,
            by_target,
            all_secured: all.build(),
        })
    }

    /// Cheap pre-check: is this request for a secured path at all? When
    /// true, the decision belongs entirely to [`Self::can_access`].
    pub fn covers(&self, permission: &Permission) -> bool {
        self.all_secured.implies(permission)
    }

    /// Decide access to a secured file.
    ///
    /// The requested permission is widened to all actions before lookup —
    /// entries have no action mask, so the question is only "may this
    /// origin touch this path at all", whatever the operation.
    pub fn can_access(
        &self,
        context: &ExecutionContext,
        permission: &Permission,
        system: &dyn Policy,
    ) -> bool {
        let Some(origin) = context.origin() else {
            return false;
        };

        // Trusted platform-internal code holds unrestricted permission
        // from the ambient policy and bypasses the allow-lists. Extension
        // code can never be granted `All`, so it can never reach this.
        if system.implies(context, &Permission::All) {
            return true;
        }

        let Some(widened) = widen(permission) else {
            return false;
        };

        // Simple case: the path is referenced directly by an entry.
        if let Some(&index) = self.by_target.get(&target_key(&widened)) {
            return self.entries[index].permitted.contains(origin);
        }

        // There's a directory reference in there somewhere — scan. Several
        // entries may cover this path; any one listing the origin grants.
        self.entries
            .iter()
            .filter(|entry| entry.permission.implies(&widened))
            .any(|entry| entry.permitted.contains(origin))
    }
}

fn widen(permission: &Permission) -> Option<Permission> {
    permission.as_file_target().map(|target| Permission::File {
        target: target.clone(),
        actions: FileActionSet::ALL,
    })
}

fn target_key(permission: &Permission) -> String {
    permission
        .as_file_target()
        .map(|target| target.to_string())
        .unwrap_or_default()
}
