//! Server-side rendering diff engine for a stateful, server-rendered,
//! WebSocket-driven UI framework.
//!
//! This crate consumes an already-produced rendered tree (`rendered`),
//! compares it against a per-session fingerprint tree (`fingerprint`) of
//! what static scaffolding the client already holds, and produces a compact
//! nested change map (`changemap`) a client can apply to a previously
//! received full render. Stateful components are tracked by a small
//! registry (`registry`) that allocates client-stable ids and drives
//! mount/update/render lifecycle with memoized rendering.
//!
//! Template compilation, HTML escaping, transport, and event dispatch are
//! all external collaborators — this crate only defines the interface they
//! present to the diff engine.

pub mod changemap;
pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod registry;
pub mod rendered;
pub mod session;

pub mod prelude {
    pub use crate::changemap::{ChangeMap, ChangeValue};
    pub use crate::error::{DiffError, LifecyclePhase};
    pub use crate::fingerprint::{Fingerprint, FingerprintTree};
    pub use crate::registry::{ComponentHost, ComponentModules, ComponentRegistry};
    pub use crate::rendered::{Comprehension, ComponentRef, Node, TemplateInstance};
    pub use crate::session::{render, Session};
}
