// engine.rs — The policy aggregator.
//
// The single decision chokepoint: the host runtime calls `implies()` on
// every sensitive operation, and the engine consults its sources in a
// fixed precedence:
//
// 1. No origin on the context → deny.
// 2. Secured path → the secured-file registry decides, grant or deny.
// 3. Untrusted marker origin → the sandbox policy decides, alone.
// 4. The origin's own plugin policy grants → grant (non-grants fall
//    through).
// 5. The data-path fast set implies → grant (the hottest permission
//    class, checked before the general union).
// 6. The compatibility shim may fire for a known legacy caller.
// 7. Template ∨ dynamic ∨ (filtered) system — the catch-all union.
//
// Everything is built once, then shared read-only across query threads:
// no locks, no interior mutability, no I/O on the query path.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};
use warden_permission::{ExecutionContext, Origin, Permission, PermissionSet};

use crate::defaults::FilteredSystemPolicy;
use crate::error::PolicyError;
use crate::plugins::PluginPolicies;
use crate::policy::Policy;
use crate::sandbox::{SandboxPolicy, UNTRUSTED_MARKER};
use crate::secured::SecuredFileRegistry;
use crate::shim::{is_blanket_file_request, CallerInspector, NoInspection};

/// Construction inputs for [`PolicyEngine`]. Every collection arrives
/// already parsed and validated by the bootstrap layer.
pub struct EngineConfig {
    /// The static template policy (parsed from the declarative grant file).
    pub template: Arc<dyn Policy>,
    /// The ambient platform policy.
    pub system: Arc<dyn Policy>,
    /// Runtime-computed grants, e.g. ephemeral listen ports.
    pub dynamic: PermissionSet,
    /// Each installed plugin's own policy, keyed by its origin.
    pub plugins: HashMap<Origin, Arc<dyn Policy>>,
    /// Strip the known-unsafe blanket grants out of the ambient policy.
    pub filter_bad_defaults: bool,
    /// Ordered grants for the service's primary data directory — the
    /// hottest permission class, precomputed into a fast-path set.
    pub data_path_permissions: Vec<Permission>,
    /// Secured path → origins permitted to access it.
    pub secured_files: HashMap<String, HashSet<Origin>>,
    /// Sandbox grants for the untrusted marker origin. `None` resolves
    /// the bundled restrictive policy.
    pub sandbox: Option<SandboxPolicy>,
    /// Call-site detection for the compatibility escape hatches.
    pub inspector: Arc<dyn CallerInspector>,
}

impl EngineConfig {
    /// A config with the given template and system policies and everything
    /// else empty, filtering on, shims dormant.
    pub fn new(template: Arc<dyn Policy>, system: Arc<dyn Policy>) -> Self {
        Self {
            template,
            system,
            dynamic: PermissionSet::empty(),
            plugins: HashMap::new(),
            filter_bad_defaults: true,
            data_path_permissions: Vec::new(),
            secured_files: HashMap::new(),
            sandbox: None,
            inspector: Arc::new(NoInspection),
        }
    }
}

/// The access-control decision engine: the union of the template policy,
/// dynamic grants, per-plugin policies, secured-file allow-lists, the
/// sandbox policy, and the (optionally filtered) ambient policy.
///
/// Built once at startup; safe to query from any thread, at any rate,
/// for the lifetime of the process. Identical inputs always produce
/// identical decisions.
pub struct PolicyEngine {
    template: Arc<dyn Policy>,
    system: Arc<dyn Policy>,
    dynamic: PermissionSet,
    data_path: PermissionSet,
    plugins: PluginPolicies,
    secured: SecuredFileRegistry,
    sandbox: SandboxPolicy,
    inspector: Arc<dyn CallerInspector>,
}

impl PolicyEngine {
    pub fn new(config: EngineConfig) -> Result<Self, PolicyError> {
        let system: Arc<dyn Policy> = if config.filter_bad_defaults {
            Arc::new(FilteredSystemPolicy::new(config.system))
        } else {
            config.system
        };
        let secured = SecuredFileRegistry::new(&config.secured_files)?;
        let engine = Self {
            template: config.template,
            system,
            dynamic: config.dynamic,
            data_path: PermissionSet::from_ordered(&config.data_path_permissions),
            plugins: PluginPolicies::new(config.plugins),
            secured,
            sandbox: config.sandbox.unwrap_or_else(SandboxPolicy::bundled),
            inspector: config.inspector,
        };
        debug!(
            plugins = engine.plugins.len(),
            secured_files = config.secured_files.len(),
            data_path_grants = engine.data_path.len(),
            dynamic_grants = engine.dynamic.len(),
            "policy engine built"
        );
        Ok(engine)
    }

    /// Decide whether `context` holds `permission`.
    ///
    /// Every ordinary outcome is `Ok(true)` or `Ok(false)`; the only
    /// `Err` is [`PolicyError::CompatibilityDenied`], which the host
    /// boundary converts for the one legacy caller that expects it.
    pub fn implies(
        &self,
        context: &ExecutionContext,
        permission: &Permission,
    ) -> Result<bool, PolicyError> {
        // Origin can be absent when privileges were deliberately reduced.
        let Some(origin) = context.origin() else {
            return Ok(false);
        };

        // Secured files override every other source, in both directions.
        if self.secured.covers(permission) {
            return Ok(self
                .secured
                .can_access(context, permission, self.system.as_ref()));
        }

        // Scripts get the sandbox policy and nothing else.
        if origin.as_str() == UNTRUSTED_MARKER {
            return Ok(self.sandbox.implies(context, permission));
        }

        // A plugin's own policy is consulted only for its origin, and
        // only a grant is decisive.
        if let Some(plugin) = self.plugins.get(origin) {
            if plugin.implies(context, permission) {
                return Ok(true);
            }
        }

        // Data-path file access is the hottest check that reaches this
        // engine; answer it before the general union.
        if self.data_path.implies(permission) {
            return Ok(true);
        }

        // A known legacy caller probes with blanket file access and
        // treats the resulting failure as "permission unavailable".
        if is_blanket_file_request(permission) && self.inspector.is_legacy_shell_exec() {
            trace!("refusing blanket file probe from legacy shell-exec caller");
            return Err(PolicyError::CompatibilityDenied {
                caller: "legacy shell-exec".to_string(),
            });
        }

        // Otherwise defer to template + dynamic + system.
        Ok(self.template.implies(context, permission)
            || self.dynamic.implies(permission)
            || self.system.implies(context, permission))
    }

    /// Compatibility entry point for grant-enumerating introspection
    /// tools: an always-empty set for the one identified caller,
    /// `None` ("unsupported, ask implication questions instead") for
    /// everyone else.
    pub fn enumerate_permissions(&self) -> Option<PermissionSet> {
        if self.inspector.is_loader_introspection() {
            return Some(PermissionSet::empty());
        }
        None
    }
}
