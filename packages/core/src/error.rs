//! Error types surfaced by the diff engine and component registry.
//!
//! Every fallible entry point returns a [`DiffError`] rather than panicking.
//! The engine never retries internally and never commits partial session
//! state on an `Err` path.

use std::fmt;

/// The phase of a component's lifecycle in which a callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Mount,
    Update,
    Render,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecyclePhase::Mount => "mount",
            LifecyclePhase::Update => "update",
            LifecyclePhase::Render => "render",
        };
        f.write_str(s)
    }
}

/// Errors the engine recognizes, per the error handling design.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A rendered node violated one of the shape invariants (e.g.
    /// `|static| != |dynamic| + 1`, or a comprehension row of the wrong
    /// width). Fatal for the render; the detail identifies the offending
    /// node.
    #[error("structural violation in {node}: {detail}")]
    StructuralViolation { node: String, detail: String },

    /// A component's `mount`, `update`, or `render` callback returned an
    /// error. Fails the whole render; no partial state is committed.
    #[error("component {extern_id:?} failed during {phase}: {source}")]
    ComponentCallback {
        extern_id: String,
        phase: LifecyclePhase,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A diff step referenced a `cid` with no corresponding registry entry.
    /// Always a programmer error in the caller or a prior diff step; never
    /// silently recovered from by creating an entry.
    #[error("unknown component id referenced in diff: {cid}")]
    UnknownComponent { cid: usize },
}

pub type Result<T> = std::result::Result<T, DiffError>;
