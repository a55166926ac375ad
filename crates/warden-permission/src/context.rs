// context.rs — Origin identity and execution context.
//
// An Origin is the stable identifier for where a unit of code was loaded
// from (conceptually a URL). It is the unit of trust identity in this
// engine: two contexts from the same origin are treated identically.
//
// An ExecutionContext is "who is asking" — the runtime's identity for
// the code currently on the stack. Its origin may be absent, e.g. for
// explicitly privilege-reduced internal calls; such contexts are never
// granted any origin-scoped permission.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable identifier for where a unit of code was loaded from.
///
/// Used as the lookup key for plugin policies and as the identity checked
/// against secured-file allow-lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(location: &str) -> Self {
        Self::new(location)
    }
}

impl From<String> for Origin {
    fn from(location: String) -> Self {
        Self::new(location)
    }
}

/// The runtime identity of the code asking for a permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    origin: Option<Origin>,
}

impl ExecutionContext {
    /// A context attributed to a code origin.
    pub fn with_origin(origin: impl Into<Origin>) -> Self {
        Self {
            origin: Some(origin.into()),
        }
    }

    /// A context with no origin — e.g. a deliberately privilege-reduced
    /// internal call. Denied everything origin-scoped.
    pub fn unattributed() -> Self {
        Self { origin: None }
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_location_same_origin() {
        let a = Origin::new("plugin://analysis-kit/1.4.0");
        let b = Origin::from("plugin://analysis-kit/1.4.0");
        assert_eq!(a, b);
    }

    #[test]
    fn unattributed_context_has_no_origin() {
        assert!(ExecutionContext::unattributed().origin().is_none());
        assert_eq!(
            ExecutionContext::with_origin("plugin://x")
                .origin()
                .map(Origin::as_str),
            Some("plugin://x")
        );
    }

    #[test]
    fn origin_serializes_as_plain_string() {
        let json = serde_json::to_string(&Origin::new("plugin://x")).unwrap();
        assert_eq!(json, "\"plugin://x\"");
    }
}
