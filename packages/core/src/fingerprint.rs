//! The fingerprint tree: a server-side shadow of what static scaffolding the
//! client already holds, per nested template instance and per comprehension.
//!
//! No public contract beyond its use by the diff engine (`§4.2`). Equality of
//! templates is decided by `fingerprint` alone — statics are never compared
//! directly, since the whole point of the tree is to avoid re-examining them.

use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};

/// A stable identifier for a template's static scaffolding. Two instances of
/// the same compiled template share a fingerprint; structural edits to the
/// template change it.
pub type Fingerprint = u64;

/// Hash a template's static sequence into a [`Fingerprint`].
///
/// Uses `FxHasher` with a fixed seed rather than `RandomState`, so the result
/// is deterministic across processes for the same static sequence — required
/// by the design note that fingerprints be stable, not just unique within a
/// run. Collisions would produce false matches; vanishingly unlikely for
/// real template statics.
pub fn fingerprint_of(statics: &[String]) -> Fingerprint {
    let mut hasher = FxHasher::default();
    statics.len().hash(&mut hasher);
    for s in statics {
        s.hash(&mut hasher);
    }
    hasher.finish()
}

/// What a dynamic slot in an enclosing template held, last time the client
/// saw this session's render.
#[derive(Debug, Clone)]
pub enum SlotFingerprint {
    /// A nested template instance, with its own fingerprint subtree.
    Template(FingerprintTree),
    /// The slot held a comprehension. Comprehensions carry no per-row
    /// identity, so nothing more than the sentinel is retained.
    Comprehension,
}

/// `(root_fp, children)`: the fingerprint of the template at this position,
/// plus the fingerprint (or comprehension sentinel) recorded for each
/// dynamic slot that held a nested template or comprehension last render.
///
/// Absent entries mean "client has no prior knowledge" of that slot.
#[derive(Debug, Clone, Default)]
pub struct FingerprintTree {
    pub root_fp: Option<Fingerprint>,
    pub children: FxHashMap<usize, SlotFingerprint>,
}

impl FingerprintTree {
    /// The empty fingerprint tree: no prior knowledge of anything at this
    /// position.
    pub fn empty() -> Self {
        FingerprintTree {
            root_fp: None,
            children: FxHashMap::default(),
        }
    }

    pub fn new(root_fp: Fingerprint) -> Self {
        FingerprintTree {
            root_fp: Some(root_fp),
            children: FxHashMap::default(),
        }
    }

    /// Lookup the child fingerprint tree at a slot index, if that slot held
    /// a nested template last render.
    pub fn child_template(&self, index: usize) -> Option<&FingerprintTree> {
        match self.children.get(&index) {
            Some(SlotFingerprint::Template(t)) => Some(t),
            _ => None,
        }
    }

    /// True if this slot held a comprehension last render.
    pub fn child_is_comprehension(&self, index: usize) -> bool {
        matches!(self.children.get(&index), Some(SlotFingerprint::Comprehension))
    }

    /// Does this tree's root fingerprint match the given rendered
    /// fingerprint? Absent is always a mismatch.
    pub fn matches(&self, fp: Fingerprint) -> bool {
        self.root_fp == Some(fp)
    }

    pub fn set_child_template(&mut self, index: usize, tree: FingerprintTree) {
        self.children.insert(index, SlotFingerprint::Template(tree));
    }

    pub fn set_child_comprehension(&mut self, index: usize) {
        self.children.insert(index, SlotFingerprint::Comprehension);
    }

    /// Clear any fingerprint-tree knowledge at a slot (the slot held a leaf
    /// string, a component, or nothing).
    pub fn clear_child(&mut self, index: usize) {
        self.children.remove(&index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic_for_same_statics() {
        let a = vec!["<div>".to_string(), "</div>".to_string()];
        let b = vec!["<div>".to_string(), "</div>".to_string()];
        assert_eq!(fingerprint_of(&a), fingerprint_of(&b));
    }

    #[test]
    fn fingerprint_changes_with_statics() {
        let a = vec!["<div>".to_string(), "</div>".to_string()];
        let b = vec!["<span>".to_string(), "</span>".to_string()];
        assert_ne!(fingerprint_of(&a), fingerprint_of(&b));
    }

    #[test]
    fn empty_tree_never_matches() {
        let t = FingerprintTree::empty();
        assert!(!t.matches(0));
        assert!(!t.matches(12345));
    }
}
