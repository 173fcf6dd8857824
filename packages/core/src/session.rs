//! The top-level render entry point, wiring the fingerprint tree and
//! component registry together as one session-scoped, persisted state. See
//! `spec.md` §4.1 (contract) and §6 (session state shape).
//!
//! The spec describes `session` (fingerprints) and `components` as two
//! values threaded separately through `render`, but also as two fields of
//! one persisted, opaque session state in §6. This crate bundles them into
//! a single [`Session`] struct — the caller still owns it and passes it by
//! value across calls, so the functional contract ("consumes prior state,
//! produces new state") is unchanged; only the grouping is simplified. See
//! `DESIGN.md` for this Open Question's resolution.

use crate::changemap::ChangeMap;
use crate::diff::{diff_template, DiffCtx};
use crate::error::Result;
use crate::fingerprint::FingerprintTree;
use crate::registry::{ComponentModules, ComponentRegistry};
use crate::rendered::TemplateInstance;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug_span;

/// Opaque, session-scoped, in-memory server-side state: the fingerprint
/// tree the client is known to hold, and the component registry.
#[derive(Default)]
pub struct Session {
    fingerprints: FingerprintTree,
    components: ComponentRegistry,
}

impl Session {
    /// A session with no prior knowledge: the next render is necessarily a
    /// full render.
    pub fn new() -> Self {
        Session {
            fingerprints: FingerprintTree::empty(),
            components: ComponentRegistry::new(),
        }
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }
}

/// Render `rendered_root` against `session`, producing the change map to
/// send to the client and the session's next state.
///
/// Pure with respect to its inputs: `session` is consumed, and a fresh
/// [`Session`] is returned alongside the change map. No partial state is
/// produced on an `Err` path — the caller's original `session` is simply
/// dropped along with the attempt.
pub fn render(
    mut session: Session,
    rendered_root: &TemplateInstance,
    modules: &dyn ComponentModules,
) -> Result<(Session, ChangeMap)> {
    let _span = debug_span!("render", fingerprint = rendered_root.fingerprint).entered();

    let prior = if session.fingerprints.root_fp.is_some() {
        Some(session.fingerprints.clone())
    } else {
        None
    };

    // Document-order worklist of components discovered while walking the
    // tree. Rendering a component may itself discover further nested
    // component references, which get pushed onto the same worklist and
    // drained in turn (§5's ordering rule, extended across render levels).
    let mut visit_order: Vec<usize>;
    let mut root_change: ChangeMap;
    let new_fingerprints: FingerprintTree;
    {
        let mut ctx = DiffCtx::new(&mut session.components, modules);
        let (change, tree) = diff_template(rendered_root, prior.as_ref(), &mut ctx)?;
        root_change = change;
        new_fingerprints = tree;
        visit_order = ctx.visit_order;
    }

    let mut components_map = IndexMap::new();
    let mut cursor = 0;
    while cursor < visit_order.len() {
        let cid = visit_order[cursor];
        cursor += 1;

        let Some((rendered, prior_tree)) = session.components.take_dirty_render_input(cid)? else {
            continue;
        };

        let mut ctx = DiffCtx::new(&mut session.components, modules);
        let (change, new_tree) = diff_template(&rendered, Some(&prior_tree), &mut ctx)?;
        visit_order.extend(ctx.visit_order);
        session.components.commit_render(cid, new_tree)?;
        components_map.insert(cid, change);
    }

    let visited: HashSet<usize> = visit_order.iter().copied().collect();
    let _removed = session.components.gc(&visited);

    root_change = root_change.with_components(components_map);
    session.fingerprints = new_fingerprints;

    Ok((session, root_change))
}
