//! The diff engine: walks a rendered tree against a fingerprint tree to
//! produce the minimal change map, delegating component references to the
//! registry. See `spec.md` §4.1.

use crate::changemap::{ChangeMap, ChangeValue};
use crate::error::Result;
use crate::fingerprint::{fingerprint_of, FingerprintTree};
use crate::registry::{ComponentModules, ComponentRegistry};
use crate::rendered::{Comprehension, Node, TemplateInstance};
use tracing::trace;

/// Threaded through one top-level render call: the registry components are
/// diffed against, plus the document-order queue of cids discovered while
/// walking the tree (components are rendered after the walk completes, in
/// this order, per the concurrency model's ordering rule).
pub struct DiffCtx<'a> {
    pub registry: &'a mut ComponentRegistry,
    pub modules: &'a dyn ComponentModules,
    pub visit_order: Vec<usize>,
}

impl<'a> DiffCtx<'a> {
    pub fn new(registry: &'a mut ComponentRegistry, modules: &'a dyn ComponentModules) -> Self {
        DiffCtx {
            registry,
            modules,
            visit_order: Vec::new(),
        }
    }

    fn track_component(&mut self, r: &crate::rendered::ComponentRef) -> Result<usize> {
        let cid = self.registry.track(r, self.modules)?;
        self.visit_order.push(cid);
        Ok(cid)
    }
}

/// Diff one template instance against its (possibly absent) prior
/// fingerprint subtree. Returns the change map for this node and the
/// fingerprint subtree to persist in its place.
///
/// `prior = None` is the "client has no prior knowledge" case: either there
/// was truly no prior tree, or an enclosing mismatch already decided the
/// whole subtree must render in full.
pub fn diff_template(
    instance: &TemplateInstance,
    prior: Option<&FingerprintTree>,
    ctx: &mut DiffCtx,
) -> Result<(ChangeMap, FingerprintTree)> {
    let full = !prior.map(|p| p.matches(instance.fingerprint)).unwrap_or(false);
    trace!(fingerprint = instance.fingerprint, full, "diff_template");

    let mut change = ChangeMap::new();
    let mut new_tree = FingerprintTree::new(instance.fingerprint);

    for (i, node) in instance.dynamic.iter().enumerate() {
        let prior_child = if full { None } else { prior.and_then(|p| p.child_template(i)) };
        let prior_is_comprehension = !full && prior.map(|p| p.child_is_comprehension(i)).unwrap_or(false);

        match node {
            Node::Leaf(None) => {
                new_tree.clear_child(i);
            }
            Node::Leaf(Some(s)) => {
                change.set_slot(i, ChangeValue::Leaf(s.clone()));
                new_tree.clear_child(i);
            }
            Node::Template(inner) => {
                let (sub_change, sub_tree) = diff_template(inner, prior_child, ctx)?;
                change.set_slot(i, ChangeValue::Map(sub_change));
                new_tree.set_child_template(i, sub_tree);
            }
            Node::Comprehension(comprehension) => {
                let rows = diff_comprehension_rows(comprehension, ctx)?;
                let mut sub = ChangeMap::new();
                if !prior_is_comprehension {
                    sub = sub.with_statics(comprehension.statics.clone());
                }
                sub = sub.with_dynamics(rows);
                change.set_slot(i, ChangeValue::Map(sub));
                new_tree.set_child_comprehension(i);
            }
            Node::Component(component_ref) => {
                let cid = ctx.track_component(component_ref)?;
                change.set_slot(i, ChangeValue::Cid(cid));
                new_tree.clear_child(i);
            }
        }
    }

    if full {
        change = change.with_statics(instance.statics.clone());
    }

    Ok((change, new_tree))
}

/// Diff every row of a comprehension from scratch. Rows have no per-row
/// fingerprint memory (invariant: comprehensions are never partially
/// memoized), so each element is always diffed against an absent prior.
fn diff_comprehension_rows(
    comprehension: &Comprehension,
    ctx: &mut DiffCtx,
) -> Result<Vec<Vec<ChangeValue>>> {
    comprehension
        .rows
        .iter()
        .map(|row| row.iter().map(|node| diff_row_element(node, ctx)).collect())
        .collect()
}

/// Diff a single comprehension-row element. Rows are positional arrays on
/// the wire, so every position always emits a value (never omitted).
fn diff_row_element(node: &Node, ctx: &mut DiffCtx) -> Result<ChangeValue> {
    match node {
        Node::Leaf(None) => Ok(ChangeValue::Leaf(String::new())),
        Node::Leaf(Some(s)) => Ok(ChangeValue::Leaf(s.clone())),
        Node::Template(inner) => {
            let (change, _tree) = diff_template(inner, None, ctx)?;
            Ok(ChangeValue::Map(change))
        }
        Node::Comprehension(inner) => {
            let rows = diff_comprehension_rows(inner, ctx)?;
            let sub = ChangeMap::new()
                .with_statics(inner.statics.clone())
                .with_dynamics(rows);
            Ok(ChangeValue::Map(sub))
        }
        Node::Component(component_ref) => {
            let cid = ctx.track_component(component_ref)?;
            Ok(ChangeValue::Cid(cid))
        }
    }
}

/// Build a fresh fingerprint for a newly compiled template's static
/// sequence. Exposed for callers constructing [`TemplateInstance`]s from raw
/// template-compilation output.
pub fn compute_fingerprint(statics: &[String]) -> u64 {
    fingerprint_of(statics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentHost;

    struct NoModules;
    impl ComponentModules for NoModules {
        fn instantiate(&self, _module: &str) -> Result<Box<dyn ComponentHost>> {
            unreachable!("no components expected in these tests")
        }
    }

    fn instance(statics: &[&str], dynamic: Vec<Node>) -> TemplateInstance {
        let statics: Vec<String> = statics.iter().map(|s| s.to_string()).collect();
        let fp = compute_fingerprint(&statics);
        TemplateInstance::new(fp, statics, dynamic).unwrap()
    }

    #[test]
    fn first_render_emits_full_statics_and_records_fingerprint_tree() {
        let basic = instance(
            ["<div>\n  <h2>It's ", "</h2>\n  ", "\n</div>\n"].as_slice(),
            vec![
                Node::Leaf(Some("10:30".into())),
                Node::Leaf(Some("Sunny".into())),
            ],
        );

        let mut registry = ComponentRegistry::new();
        let modules = NoModules;
        let mut ctx = DiffCtx::new(&mut registry, &modules);
        let (change, tree) = diff_template(&basic, None, &mut ctx).unwrap();

        assert_eq!(change.statics, Some(basic.statics.clone()));
        assert_eq!(change.slots.get(&0), Some(&ChangeValue::Leaf("10:30".into())));
        assert_eq!(change.slots.get(&1), Some(&ChangeValue::Leaf("Sunny".into())));
        assert!(tree.children.is_empty());
    }

    #[test]
    fn second_render_same_template_omits_statics() {
        let basic = instance(
            ["<div>\n  <h2>It's ", "</h2>\n  ", "\n</div>\n"].as_slice(),
            vec![
                Node::Leaf(Some("10:30".into())),
                Node::Leaf(Some("Sunny".into())),
            ],
        );

        let mut registry = ComponentRegistry::new();
        let modules = NoModules;
        let mut ctx = DiffCtx::new(&mut registry, &modules);
        let (_first, prior_tree) = diff_template(&basic, None, &mut ctx).unwrap();

        let mut ctx2 = DiffCtx::new(&mut registry, &modules);
        let (change, _tree) = diff_template(&basic, Some(&prior_tree), &mut ctx2).unwrap();

        assert!(change.statics.is_none());
        assert_eq!(change.slots.get(&0), Some(&ChangeValue::Leaf("10:30".into())));
        assert_eq!(change.slots.get(&1), Some(&ChangeValue::Leaf("Sunny".into())));
    }

    #[test]
    fn comprehension_always_emits_full_dynamics() {
        let comp = Comprehension::new(
            vec!["<li>".into(), "</li>".into()],
            vec![
                vec![Node::Leaf(Some("a".into()))],
                vec![Node::Leaf(Some("b".into()))],
            ],
        )
        .unwrap();

        let mut registry = ComponentRegistry::new();
        let modules = NoModules;
        let mut ctx = DiffCtx::new(&mut registry, &modules);
        let rows = diff_comprehension_rows(&comp, &mut ctx).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![ChangeValue::Leaf("a".into())]);
        assert_eq!(rows[1], vec![ChangeValue::Leaf("b".into())]);
    }

    #[test]
    fn empty_comprehension_still_emits_dynamics_key() {
        let comp = Comprehension::new(vec!["<li>".into(), "</li>".into()], vec![]).unwrap();
        let mut registry = ComponentRegistry::new();
        let modules = NoModules;
        let mut ctx = DiffCtx::new(&mut registry, &modules);
        let rows = diff_comprehension_rows(&comp, &mut ctx).unwrap();
        assert!(rows.is_empty());

        let sub = ChangeMap::new().with_dynamics(rows);
        assert_eq!(sub.dynamics, Some(vec![]));
    }

    #[test]
    fn slot_kind_change_is_treated_as_full_render_of_that_slot() {
        // Prior render had a leaf at slot 0; now it's a nested template.
        let mut prior_tree = FingerprintTree::new(compute_fingerprint(&["a".into(), "b".into()]));
        prior_tree.clear_child(0); // leaf, no child recorded

        let inner = instance(&["x", "y"], vec![Node::Leaf(Some("v".into()))]);
        let outer = TemplateInstance::new(
            compute_fingerprint(&["a".into(), "b".into()]),
            vec!["a".into(), "b".into()],
            vec![Node::Template(inner)],
        )
        .unwrap();

        let mut registry = ComponentRegistry::new();
        let modules = NoModules;
        let mut ctx = DiffCtx::new(&mut registry, &modules);
        let (change, _tree) = diff_template(&outer, Some(&prior_tree), &mut ctx).unwrap();

        match change.slots.get(&0) {
            Some(ChangeValue::Map(sub)) => assert!(sub.statics.is_some(), "new kind must render in full"),
            other => panic!("expected nested map, got {other:?}"),
        }
    }

    #[test]
    fn absent_leaf_emits_nothing() {
        let basic = instance(&["a", "b"], vec![Node::Leaf(None)]);
        let mut registry = ComponentRegistry::new();
        let modules = NoModules;
        let mut ctx = DiffCtx::new(&mut registry, &modules);
        let (change, _tree) = diff_template(&basic, None, &mut ctx).unwrap();
        assert!(change.slots.get(&0).is_none());
    }
}
