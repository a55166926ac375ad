//! # warden-policy
//!
//! The access-control decision engine for a server hosting untrusted or
//! semi-trusted extension code next to its trusted core. Given an
//! execution context (identified by code origin) and a requested
//! permission, [`PolicyEngine::implies`] answers true or false — fast,
//! deterministically, and fail-closed on anything ambiguous.
//!
//! The engine is the query-time union of a static template policy,
//! runtime-computed dynamic grants, per-plugin policies, origin
//! allow-lists for secured files, a restrictive sandbox policy for
//! script execution, and the ambient platform policy with two
//! known-unsafe blanket grants filtered out.
//!
//! ## Key invariants
//!
//! - **Fail closed**: no origin → deny; no source grants → deny.
//! - **Secured files override everything**, grant or deny.
//! - **The sandbox is total**: the untrusted marker origin never
//!   benefits from any other policy source.
//! - **Built once, read-only after**: safe for unlocked concurrent
//!   queries from any thread.

pub mod defaults;
pub mod engine;
pub mod error;
pub mod plugins;
pub mod policy;
pub mod sandbox;
pub mod secured;
pub mod shim;

pub use defaults::FilteredSystemPolicy;
pub use engine::{EngineConfig, PolicyEngine};
pub use error::PolicyError;
pub use plugins::PluginPolicies;
pub use policy::{DenyAll, Policy, StaticPolicy};
pub use sandbox::{SandboxPolicy, UNTRUSTED_MARKER};
pub use secured::SecuredFileRegistry;
pub use shim::{CallerInspector, NoInspection};
