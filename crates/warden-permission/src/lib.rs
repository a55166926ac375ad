//! # warden-permission
//!
//! Permission model for the Warden access-control engine: value types for
//! requestable capabilities ([`Permission`]), code-origin identity
//! ([`Origin`], [`ExecutionContext`]), and immutable merged collections
//! ([`PermissionSet`]).
//!
//! ## Key invariants
//!
//! - **Implication is a partial order**: same-kind only (except
//!   [`Permission::All`]), directory targets cover paths beneath them,
//!   unrestricted action sets cover subsets.
//! - **Collections are frozen at build**: [`PermissionSet`] exposes no
//!   mutation; the builder is consumed, so late additions cannot compile.
//! - **Fail closed**: anything the matcher does not understand (invalid
//!   wildcard specs, cross-kind queries) resolves to "does not imply".

pub mod context;
pub mod error;
pub mod permission;
pub mod set;

pub use context::{ExecutionContext, Origin};
pub use error::PermissionError;
pub use permission::{
    FileAction, FileActionSet, FileTarget, HostSpec, Permission, PortRange, SocketAction,
    SocketActionSet,
};
pub use set::{PermissionSet, PermissionSetBuilder};
