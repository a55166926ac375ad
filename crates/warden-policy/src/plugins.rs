// plugins.rs — Per-plugin policies keyed by code origin.
//
// Each installed plugin may carry its own policy, consulted only for
// contexts from that plugin's origin. A grant here short-circuits the
// rest of the engine; the absence of a grant decides nothing and falls
// through to the later sources.

use std::collections::HashMap;
use std::sync::Arc;

use warden_permission::Origin;

use crate::policy::Policy;

/// Maps a plugin's origin to its dedicated policy.
#[derive(Default)]
pub struct PluginPolicies {
    by_origin: HashMap<Origin, Arc<dyn Policy>>,
}

impl PluginPolicies {
    pub fn new(by_origin: HashMap<Origin, Arc<dyn Policy>>) -> Self {
        Self { by_origin }
    }

    pub fn get(&self, origin: &Origin) -> Option<&Arc<dyn Policy>> {
        self.by_origin.get(origin)
    }

    pub fn len(&self) -> usize {
        self.by_origin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_origin.is_empty()
    }
}
