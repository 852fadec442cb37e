//! Canonical component sets.
use smallvec::SmallVec;

use crate::Entity;

/// The set of component ids an entity holds, sorted ascending with no
/// duplicates.
///
/// Two signatures are equal iff they hold the same components, which makes a
/// `Signature` usable as the key that identifies an archetype.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(SmallVec<[Entity; 8]>);

impl FromIterator<Entity> for Signature {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut components: SmallVec<[Entity; 8]> = iter.into_iter().collect();
        components.sort_unstable();
        components.dedup();
        Signature(components)
    }
}

impl<'a> IntoIterator for &'a Signature {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Signature {
    /// The empty signature of the origin archetype.
    pub fn empty() -> Self {
        Signature::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.0.iter()
    }

    #[inline]
    pub fn contains(&self, component: Entity) -> bool {
        self.0.binary_search(&component).is_ok()
    }

    /// A copy of this signature including `component`.
    pub fn with(&self, component: Entity) -> Self {
        let mut components = self.0.clone();
        if let Err(i) = components.binary_search(&component) {
            components.insert(i, component);
        }
        Signature(components)
    }

    /// A copy of this signature excluding `component`.
    pub fn without(&self, component: Entity) -> Self {
        let mut components = self.0.clone();
        if let Ok(i) = components.binary_search(&component) {
            components.remove(i);
        }
        Signature(components)
    }

    /// Whether this signature contains every component of `other`.
    ///
    /// Both signatures are sorted, so this is a single merge walk.
    pub fn is_superset(&self, other: &Signature) -> bool {
        let mut here = self.0.iter();
        other
            .0
            .iter()
            .all(|wanted| here.by_ref().any(|have| have == wanted))
    }
}
