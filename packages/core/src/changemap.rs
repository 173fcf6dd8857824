//! Projects internal diff results into the nested wire shape clients apply
//! to a previously received full render. See `spec.md` §6 for the shape.

use indexmap::IndexMap;

/// A value occupying one key of a change map.
///
/// A closed enum rather than a dynamically-typed JSON value so that integer
/// slot keys, leaf strings, nested maps, and bare `cid` references all stay
/// distinguishable at the type level; a caller who wants raw JSON gets it via
/// the optional `serialize` feature. The `static`/`dynamics`/`components`
/// meta-fields live on [`ChangeMap`] directly rather than as variants here —
/// they're never values a slot itself holds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(untagged))]
pub enum ChangeValue {
    /// A leaf string emitted directly under a slot key.
    Leaf(String),
    /// A nested template's change map, emitted under a slot key.
    Map(ChangeMap),
    /// A component slot: the `cid` occupying the position directly.
    Cid(usize),
}

/// A change map: the on-the-wire shape for one template instance,
/// comprehension, or the root of a render.
///
/// Keys are dynamic-slot indices or one of the reserved meta-fields. Empty
/// keys are omitted by construction — callers never need to special-case an
/// empty `dynamics`/`components` map themselves except where the spec
/// requires it to be present (e.g. a comprehension always emits `dynamics`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ChangeMap {
    /// Dynamic slot index -> value, in ascending slot order.
    #[cfg_attr(feature = "serialize", serde(flatten))]
    pub slots: IndexMap<usize, ChangeValue>,
    /// Present only on a full template render. Wire key is the reserved
    /// `static` (singular), not the field name.
    #[cfg_attr(
        feature = "serialize",
        serde(rename = "static", skip_serializing_if = "Option::is_none")
    )]
    pub statics: Option<Vec<String>>,
    /// Present only on a comprehension (full or incremental).
    #[cfg_attr(feature = "serialize", serde(skip_serializing_if = "Option::is_none"))]
    pub dynamics: Option<Vec<Vec<ChangeValue>>>,
    /// Present only on the root change map, and only when at least one
    /// component re-rendered or was newly added this render.
    #[cfg_attr(feature = "serialize", serde(skip_serializing_if = "Option::is_none"))]
    pub components: Option<IndexMap<usize, ChangeMap>>,
}

impl ChangeMap {
    pub fn new() -> Self {
        ChangeMap::default()
    }

    pub fn set_slot(&mut self, index: usize, value: ChangeValue) {
        self.slots.insert(index, value);
    }

    pub fn with_statics(mut self, statics: Vec<String>) -> Self {
        self.statics = Some(statics);
        self
    }

    pub fn with_dynamics(mut self, dynamics: Vec<Vec<ChangeValue>>) -> Self {
        self.dynamics = Some(dynamics);
        self
    }

    /// Attach the top-level `components` map. Only meaningful on the root
    /// change map of a render — slot change maps never carry this key.
    pub fn with_components(mut self, components: IndexMap<usize, ChangeMap>) -> Self {
        if !components.is_empty() {
            self.components = Some(components);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_components_omits_empty_map() {
        let m = ChangeMap::new().with_components(IndexMap::new());
        assert!(m.components.is_none());
    }
}
