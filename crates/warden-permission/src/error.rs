// error.rs — Error types for the permission model.
//
// Everything here is a construction-time defect: a malformed target or
// host spec fails loudly while the engine is being assembled, never at
// query time. The query path is boolean-only.

use thiserror::Error;

/// Errors that can occur while building permission values.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// A file target string could not be understood.
    #[error("invalid file target '{target}': {reason}")]
    InvalidFileTarget { target: String, reason: String },

    /// A socket host spec could not be understood.
    #[error("invalid host spec '{spec}': {reason}")]
    InvalidHostSpec { spec: String, reason: String },

    /// A port or port range in a host spec is malformed.
    #[error("invalid port range '{range}' in host spec")]
    InvalidPortRange { range: String },

    /// A permission was declared with an empty action set.
    #[error("permission on '{target}' grants no actions")]
    EmptyActionSet { target: String },
}
