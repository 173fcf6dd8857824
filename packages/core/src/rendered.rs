//! The rendered-tree model: passive data produced by template compilation
//! and consumed by the diff engine. See `Node` for the four node kinds.

use crate::error::{DiffError, Result};
use crate::fingerprint::Fingerprint;
use std::collections::HashMap;

/// A single rendered node. Template compilation is an external collaborator;
/// the engine only ever consumes values of this shape.
///
/// Discriminated on tag at every diff step rather than through inheritance,
/// per the polymorphic-rendered-node design note.
#[derive(Debug, Clone)]
pub enum Node {
    /// A nested instance of a compiled template.
    Template(TemplateInstance),
    /// An iterated fragment sharing one inner static scaffolding per row.
    Comprehension(Comprehension),
    /// A reference to a stateful component, keyed by a client-stable id.
    Component(ComponentRef),
    /// Plain text, or an empty slot.
    Leaf(Option<String>),
}

/// A template instance: `static` has length exactly one more than
/// `dynamic` (invariant 1).
#[derive(Debug, Clone)]
pub struct TemplateInstance {
    pub fingerprint: Fingerprint,
    pub statics: Vec<String>,
    pub dynamic: Vec<Node>,
}

impl TemplateInstance {
    pub fn new(fingerprint: Fingerprint, statics: Vec<String>, dynamic: Vec<Node>) -> Result<Self> {
        if statics.len() != dynamic.len() + 1 {
            return Err(DiffError::StructuralViolation {
                node: format!("template instance (fingerprint {fingerprint})"),
                detail: format!(
                    "static has {} fragments but dynamic has {} slots (expected {})",
                    statics.len(),
                    dynamic.len(),
                    dynamic.len() + 1
                ),
            });
        }
        Ok(TemplateInstance {
            fingerprint,
            statics,
            dynamic,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.dynamic.len()
    }
}

/// A comprehension: every row's length equals `len(static) - 1` (invariant
/// 2). Rows have no per-row fingerprint or stable identity.
#[derive(Debug, Clone)]
pub struct Comprehension {
    pub statics: Vec<String>,
    pub rows: Vec<Vec<Node>>,
}

impl Comprehension {
    pub fn new(statics: Vec<String>, rows: Vec<Vec<Node>>) -> Result<Self> {
        let expected = statics.len().saturating_sub(1);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(DiffError::StructuralViolation {
                    node: format!("comprehension row {i}"),
                    detail: format!(
                        "row has {} elements but inner static implies {}",
                        row.len(),
                        expected
                    ),
                });
            }
        }
        Ok(Comprehension { statics, rows })
    }
}

/// A reference to a stateful component. `id` is the client-stable, opaque
/// external identity; `module` identifies the component implementation.
#[derive(Debug, Clone)]
pub struct ComponentRef {
    pub id: String,
    pub module: String,
    pub assigns: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_instance_rejects_mismatched_lengths() {
        let err = TemplateInstance::new(1, vec!["a".into(), "b".into()], vec![]);
        assert!(matches!(err, Err(DiffError::StructuralViolation { .. })));
    }

    #[test]
    fn template_instance_accepts_matching_lengths() {
        let t = TemplateInstance::new(
            1,
            vec!["a".into(), "b".into()],
            vec![Node::Leaf(Some("x".into()))],
        )
        .unwrap();
        assert_eq!(t.slot_count(), 1);
    }

    #[test]
    fn comprehension_rejects_wrong_row_width() {
        let err = Comprehension::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![Node::Leaf(Some("x".into()))]],
        );
        assert!(matches!(err, Err(DiffError::StructuralViolation { .. })));
    }

    #[test]
    fn comprehension_empty_rows_is_valid() {
        let c = Comprehension::new(vec!["a".into(), "b".into()], vec![]).unwrap();
        assert!(c.rows.is_empty());
    }
}
