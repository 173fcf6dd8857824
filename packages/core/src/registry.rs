//! The stateful-component registry (the "CID engine"): maps client-stable
//! component identities to internal numeric ids, drives mount/update/render
//! lifecycle with memoized rendering, and slots components into the change
//! map by cid reference. See `spec.md` §4.4.

use crate::error::{DiffError, LifecyclePhase, Result};
use crate::fingerprint::FingerprintTree;
use crate::rendered::{ComponentRef, TemplateInstance};
use rustc_hash::FxHashMap;
use std::collections::HashMap;

/// A live component instance: what the registry calls into for the three
/// lifecycle callbacks.
///
/// Dynamic dispatch over component modules becomes a capability table of
/// three callbacks, keyed by `extern_id` for lookup and by the arena-style
/// `cid` for internal addressing — the pattern the design notes call for.
pub trait ComponentHost: std::fmt::Debug {
    /// Called once when a component is first created, and again (with fresh
    /// state) when the module at an existing `extern_id` is replaced.
    fn mount(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Called on every reference, merging the caller's assigns into the
    /// component's socket. Invoked every render regardless of the dirty bit.
    fn update(
        &mut self,
        assigns: &HashMap<String, serde_json::Value>,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Produce a rendered template from the component's current state. Only
    /// invoked when the dirty bit is set.
    fn render(&self) -> std::result::Result<TemplateInstance, Box<dyn std::error::Error + Send + Sync>>;
}

/// Resolves a component reference's `module` tag to a fresh [`ComponentHost`].
/// `mount` is invoked by the registry after construction, not by this trait.
pub trait ComponentModules {
    fn instantiate(&self, module: &str) -> Result<Box<dyn ComponentHost>>;
}

struct ComponentEntry {
    module: String,
    extern_id: String,
    assigns: HashMap<String, serde_json::Value>,
    host: Box<dyn ComponentHost>,
    dirty: bool,
    last_fingerprint_tree: FingerprintTree,
}

/// `(cid_state, cid_to_extern, next_cid)` from the data model, plus an
/// internal `extern_id -> cid` index kept in sync with `cid_state` (an
/// implementation detail for O(1) lookup; it changes nothing observable).
#[derive(Default)]
pub struct ComponentRegistry {
    cid_state: FxHashMap<usize, ComponentEntry>,
    cid_to_extern: FxHashMap<usize, String>,
    extern_to_cid: FxHashMap<String, usize>,
    next_cid: usize,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        ComponentRegistry::default()
    }

    /// Track a component reference, returning its (possibly newly
    /// allocated) `cid`. Implements the three cases of `track` in §4.4.
    pub fn track(&mut self, r: &ComponentRef, modules: &dyn ComponentModules) -> Result<usize> {
        if let Some(&cid) = self.extern_to_cid.get(&r.id) {
            let entry = self.cid_state.get_mut(&cid).expect("extern index out of sync");
            if entry.module == r.module {
                // Case 1: same module, reuse memoization.
                let changed = entry.assigns != r.assigns;
                entry
                    .host
                    .update(&r.assigns)
                    .map_err(|source| DiffError::ComponentCallback {
                        extern_id: r.id.clone(),
                        phase: LifecyclePhase::Update,
                        source,
                    })?;
                entry.assigns = r.assigns.clone();
                entry.dirty = changed;
            } else {
                // Case 2: replace — reuse cid, discard memoization.
                let mut host = modules.instantiate(&r.module)?;
                host.mount().map_err(|source| DiffError::ComponentCallback {
                    extern_id: r.id.clone(),
                    phase: LifecyclePhase::Mount,
                    source,
                })?;
                host.update(&r.assigns)
                    .map_err(|source| DiffError::ComponentCallback {
                        extern_id: r.id.clone(),
                        phase: LifecyclePhase::Update,
                        source,
                    })?;
                entry.module = r.module.clone();
                entry.assigns = r.assigns.clone();
                entry.host = host;
                entry.dirty = true;
                entry.last_fingerprint_tree = FingerprintTree::empty();
            }
            return Ok(cid);
        }

        // Case 3: no entry — allocate a fresh cid.
        let cid = self.next_cid;
        self.next_cid += 1;

        let mut host = modules.instantiate(&r.module)?;
        host.mount().map_err(|source| DiffError::ComponentCallback {
            extern_id: r.id.clone(),
            phase: LifecyclePhase::Mount,
            source,
        })?;
        host.update(&r.assigns)
            .map_err(|source| DiffError::ComponentCallback {
                extern_id: r.id.clone(),
                phase: LifecyclePhase::Update,
                source,
            })?;

        self.cid_state.insert(
            cid,
            ComponentEntry {
                module: r.module.clone(),
                extern_id: r.id.clone(),
                assigns: r.assigns.clone(),
                host,
                dirty: true,
                last_fingerprint_tree: FingerprintTree::empty(),
            },
        );
        self.cid_to_extern.insert(cid, r.id.clone());
        self.extern_to_cid.insert(r.id.clone(), cid);

        Ok(cid)
    }

    /// If `cid`'s entry is dirty, render it and return its rendered tree
    /// along with the fingerprint tree to diff against. Returns `None` for a
    /// clean entry (nothing to report under `components` this render).
    pub fn take_dirty_render_input(
        &mut self,
        cid: usize,
    ) -> Result<Option<(TemplateInstance, FingerprintTree)>> {
        let entry = self
            .cid_state
            .get_mut(&cid)
            .ok_or(DiffError::UnknownComponent { cid })?;
        if !entry.dirty {
            return Ok(None);
        }
        let tree = entry.render().map_err(|source| DiffError::ComponentCallback {
            extern_id: entry.extern_id.clone(),
            phase: LifecyclePhase::Render,
            source,
        })?;
        Ok(Some((tree, entry.last_fingerprint_tree.clone())))
    }

    /// Replace the memoized fingerprint tree for `cid` and clear its dirty
    /// bit now that its change map has been produced.
    pub fn commit_render(&mut self, cid: usize, new_tree: FingerprintTree) -> Result<()> {
        let entry = self
            .cid_state
            .get_mut(&cid)
            .ok_or(DiffError::UnknownComponent { cid })?;
        entry.last_fingerprint_tree = new_tree;
        entry.dirty = false;
        Ok(())
    }

    /// Remove any entry whose `cid` was not visited this render. `next_cid`
    /// is never decremented — freed ids are not recycled (invariant 5).
    /// Returns the `extern_id`s of removed entries.
    pub fn gc(&mut self, visited: &std::collections::HashSet<usize>) -> Vec<String> {
        let stale: Vec<usize> = self
            .cid_state
            .keys()
            .copied()
            .filter(|cid| !visited.contains(cid))
            .collect();

        let mut removed_externs = Vec::with_capacity(stale.len());
        for cid in stale {
            if let Some(entry) = self.cid_state.remove(&cid) {
                self.extern_to_cid.remove(&entry.extern_id);
                removed_externs.push(entry.extern_id);
            }
            self.cid_to_extern.remove(&cid);
        }
        removed_externs
    }

    pub fn next_cid_peek(&self) -> usize {
        self.next_cid
    }

    pub fn extern_id_of(&self, cid: usize) -> Option<&str> {
        self.cid_to_extern.get(&cid).map(String::as_str)
    }
}
