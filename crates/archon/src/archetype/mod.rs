//! Entities stored together by exact component signature.
use std::any::Any;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::Entity;

mod all;
mod column;
mod edge;
mod signature;

pub use all::*;
pub use column::*;
pub use edge::*;
pub use signature::*;

/// A stable index of an archetype within the world's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchetypeId(u32);

impl ArchetypeId {
    /// The archetype with the empty signature, where every entity starts.
    pub const ORIGIN: ArchetypeId = ArchetypeId(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A collection of entities having the same components.
///
/// Only storable components get a [`Column`]; tags are part of the
/// signature and nothing else.
#[derive(Debug)]
pub struct Archetype {
    pub(crate) id: ArchetypeId,
    pub(crate) signature: Signature,
    /// Entities in row order.
    pub(crate) entities: Vec<Entity>,
    pub(crate) columns: FxHashMap<Entity, Column>,
    pub(crate) edges: FxHashMap<Entity, Edge>,
}

impl Archetype {
    pub(crate) fn new(
        id: ArchetypeId,
        signature: Signature,
        storable: impl IntoIterator<Item = Entity>,
    ) -> Self {
        let columns = storable
            .into_iter()
            .map(|component| {
                debug_assert!(signature.contains(component));
                (component, Column::default())
            })
            .collect();
        Archetype {
            id,
            signature,
            entities: vec![],
            columns,
            edges: Default::default(),
        }
    }

    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Entities in row order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether this archetype's signature contains the component.
    pub fn has(&self, component: Entity) -> bool {
        self.signature.contains(component)
    }

    /// The payload column for a storable component.
    pub fn column(&self, component: Entity) -> Option<&Column> {
        self.columns.get(&component)
    }

    pub(crate) fn column_mut(&mut self, component: Entity) -> Option<&mut Column> {
        self.columns.get_mut(&component)
    }

    /// Components with a column here, in no particular order.
    pub fn storable(&self) -> impl Iterator<Item = Entity> + '_ {
        self.columns.keys().copied()
    }

    /// The memoized transitions for the component, if any were taken.
    pub fn edge(&self, component: Entity) -> Option<&Edge> {
        self.edges.get(&component)
    }

    pub fn edges(&self) -> impl Iterator<Item = (Entity, &Edge)> + '_ {
        self.edges.iter().map(|(c, edge)| (*c, edge))
    }

    pub(crate) fn edge_mut(&mut self, component: Entity) -> &mut Edge {
        self.edges.entry(component).or_default()
    }

    /// Iterate the written payloads of `component` downcast to `T`, paired
    /// with their entities.
    ///
    /// Returns `None` if the component has no column here. Rows that hold
    /// no payload or a payload of another type are skipped.
    pub fn iter_column<T: Any>(
        &self,
        component: Entity,
    ) -> Option<impl Iterator<Item = (Entity, &T)> + '_> {
        let column = self.columns.get(&component)?;
        Some(
            self.entities
                .iter()
                .zip(column.iter())
                .filter_map(|(entity, payload)| {
                    payload
                        .and_then(|p| p.downcast_ref::<T>())
                        .map(|t| (*entity, t))
                }),
        )
    }

    /// Append an entity with empty rows in every column, returning its row.
    pub(crate) fn push(&mut self, entity: Entity) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        for column in self.columns.values_mut() {
            column.push(None);
        }
        row
    }

    /// Remove the entity at `row`, returning the written payloads by
    /// component along with the entity that was swapped into `row`, if any.
    pub(crate) fn swap_remove(
        &mut self,
        row: usize,
    ) -> (Option<Entity>, SmallVec<[(Entity, Payload); 4]>) {
        debug_assert!(
            row < self.entities.len(),
            "archetype len {} does not contain row {}",
            self.entities.len(),
            row
        );
        self.entities.swap_remove(row);
        // the last entity was swapped into the removed row
        let displaced = self.entities.get(row).copied();
        let payloads = self
            .columns
            .iter_mut()
            .filter_map(|(component, column)| {
                column.swap_remove(row).map(|payload| (*component, payload))
            })
            .collect();
        (displaced, payloads)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn e(index: u32) -> Entity {
        Entity::pack(index, 0)
    }

    fn arch() -> Archetype {
        let signature: Signature = [e(10), e(11)].into_iter().collect();
        // 11 is a tag
        Archetype::new(ArchetypeId(1), signature, [e(10)])
    }

    #[test]
    fn columns_only_for_storable() {
        let arch = arch();
        assert!(arch.has(e(10)));
        assert!(arch.has(e(11)));
        assert!(arch.column(e(10)).is_some());
        assert!(arch.column(e(11)).is_none());
        assert_eq!(vec![e(10)], arch.storable().collect::<Vec<_>>());
    }

    #[test]
    fn push_and_swap_remove_keep_rows_aligned() {
        let mut arch = arch();
        for i in 0..3 {
            let row = arch.push(e(i + 1));
            assert_eq!(i as usize, row);
            arch.column_mut(e(10))
                .unwrap()
                .set(row, Box::new(format!("entity {}", i + 1)));
        }

        let (displaced, payloads) = arch.swap_remove(0);
        assert_eq!(Some(e(3)), displaced);
        assert_eq!(1, payloads.len());
        assert_eq!(e(10), payloads[0].0);
        assert_eq!(
            Some(&"entity 1".to_string()),
            payloads[0].1.downcast_ref::<String>()
        );
        assert_eq!(&[e(3), e(2)], arch.entities());

        let strings = arch
            .iter_column::<String>(e(10))
            .unwrap()
            .map(|(entity, s)| (entity, s.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            vec![(e(3), "entity 3".to_string()), (e(2), "entity 2".to_string())],
            strings
        );

        // removing the last row displaces nothing
        let (displaced, _) = arch.swap_remove(1);
        assert_eq!(None, displaced);
        assert_eq!(1, arch.len());
    }

    #[test]
    fn iter_column_skips_unwritten_and_mistyped_rows() {
        let mut arch = arch();
        let a = arch.push(e(1));
        let _b = arch.push(e(2));
        let c = arch.push(e(3));
        arch.column_mut(e(10)).unwrap().set(a, Box::new(1.0f32));
        arch.column_mut(e(10)).unwrap().set(c, Box::new(3u8));
        let floats = arch
            .iter_column::<f32>(e(10))
            .unwrap()
            .map(|(entity, f)| (entity, *f))
            .collect::<Vec<_>>();
        assert_eq!(vec![(e(1), 1.0)], floats);
        assert!(arch.iter_column::<f32>(e(11)).is_none());
    }
}
