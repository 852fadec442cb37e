//! Memoized structural transitions.
use super::ArchetypeId;

/// The archetypes reached from one archetype by adding or removing one
/// specific component.
///
/// Edges live in the archetype's edge map keyed by that component, and are
/// kept symmetric: if `a`'s edge for `c` adds to `b`, then `b`'s edge for `c`
/// removes to `a`. Only transitions that have actually been taken are
/// recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edge {
    pub(crate) add: Option<ArchetypeId>,
    pub(crate) remove: Option<ArchetypeId>,
}

impl Edge {
    /// Where an entity lands when it gains the component.
    pub fn add(&self) -> Option<ArchetypeId> {
        self.add
    }

    /// Where an entity lands when it loses the component.
    pub fn remove(&self) -> Option<ArchetypeId> {
        self.remove
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.add.is_none() && self.remove.is_none()
    }
}
