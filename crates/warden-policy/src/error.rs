// error.rs — Error types for the policy composition engine.

use thiserror::Error;
use warden_permission::PermissionError;

/// Errors surfaced by engine construction and by the one deliberate
/// non-boolean decision outcome (the compatibility shim).
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A construction input (secured-file path, data-path grant) was
    /// malformed. Construction fails; the engine never degrades into
    /// permissive behavior at query time.
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// The compatibility shim fired: a known-broken legacy caller asked
    /// for blanket file access it must not have. The host boundary
    /// converts this into the failure shape that caller is known to
    /// swallow as "permission unavailable, proceed without it". It is not
    /// a reportable error and must never be generalized to other callers.
    #[error("blanket file access refused for known legacy caller '{caller}'")]
    CompatibilityDenied { caller: String },
}
