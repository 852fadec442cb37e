//! Operate on all archetypes.
//!
//! [`AllArchetypes`] is the arena that owns every [`Archetype`] and the
//! indices over them. It is also where entities migrate between archetypes:
//! adding or removing a component follows the source archetype's cached
//! [`Edge`], or builds it on first use.
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Entity, Error, Result};

use super::{Archetype, ArchetypeId, Signature};

/// Where an entity landed after a structural move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Moved {
    pub archetype: ArchetypeId,
    pub row: usize,
    /// The entity that was swapped into the vacated row of the source
    /// archetype, whose location must be updated.
    pub displaced: Option<Entity>,
}

#[derive(Debug)]
pub struct AllArchetypes {
    archetypes: Vec<Option<Archetype>>,
    vacant: Vec<ArchetypeId>,
    by_signature: FxHashMap<Signature, ArchetypeId>,
    with_component: FxHashMap<Entity, SmallVec<[ArchetypeId; 4]>>,
}

impl Default for AllArchetypes {
    fn default() -> Self {
        let origin = Archetype::new(ArchetypeId::ORIGIN, Signature::empty(), std::iter::empty());
        Self {
            archetypes: vec![Some(origin)],
            vacant: vec![],
            by_signature: FxHashMap::from_iter([(Signature::empty(), ArchetypeId::ORIGIN)]),
            with_component: Default::default(),
        }
    }
}

impl AllArchetypes {
    /// Live archetypes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> + '_ {
        self.archetypes.iter().flatten()
    }

    /// The number of live archetypes, including the origin.
    pub fn len(&self) -> usize {
        self.archetypes.len() - self.vacant.len()
    }

    pub fn is_empty(&self) -> bool {
        // the origin is never reclaimed
        false
    }

    pub fn get(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id.index())?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: ArchetypeId) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id.index())?.as_mut()
    }

    /// The canonical archetype for the signature, if it has been created.
    pub fn by_signature(&self, signature: &Signature) -> Option<&Archetype> {
        self.get(*self.by_signature.get(signature)?)
    }

    /// Archetypes whose signature includes the component.
    pub fn with_component(&self, component: Entity) -> impl Iterator<Item = &Archetype> + '_ {
        self.with_component
            .get(&component)
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(*id))
    }

    /// Archetypes whose signature is a superset of `filter`.
    pub fn matching<'a>(
        &'a self,
        filter: &'a Signature,
    ) -> impl Iterator<Item = &'a Archetype> + 'a {
        self.iter().filter(move |arch| arch.signature.is_superset(filter))
    }

    /// Place a new entity in the origin archetype, returning its row.
    pub(crate) fn spawn(&mut self, entity: Entity) -> usize {
        self.origin_mut().push(entity)
    }

    fn origin_mut(&mut self) -> &mut Archetype {
        match self.archetypes[ArchetypeId::ORIGIN.index()].as_mut() {
            Some(origin) => origin,
            None => unreachable!("the origin archetype is never reclaimed"),
        }
    }

    fn arch_mut(&mut self, id: ArchetypeId) -> &mut Archetype {
        match self.get_mut(id) {
            Some(arch) => arch,
            None => unreachable!("edge or location points at reclaimed archetype {:?}", id),
        }
    }

    /// Remove the entity at `row` from the archetype entirely, dropping
    /// its payloads.
    ///
    /// Returns the entity swapped into `row`, if any.
    pub(crate) fn despawn(&mut self, id: ArchetypeId, row: usize) -> Option<Entity> {
        let (displaced, _payloads) = self.arch_mut(id).swap_remove(row);
        displaced
    }

    /// Move the entity at `row` of `from` into the archetype reached by
    /// adding `component`.
    ///
    /// `storable` decides whether `component` gets a column, and is only
    /// consulted when the destination archetype does not exist yet.
    ///
    /// ## NOTE:
    /// The caller guarantees `from` does not already contain `component`.
    pub(crate) fn add(
        &mut self,
        from: ArchetypeId,
        row: usize,
        component: Entity,
        storable: bool,
    ) -> Result<Moved> {
        let cached = self.arch_mut(from).edge(component).and_then(|edge| edge.add);
        let to = match cached {
            Some(to) => {
                log::trace!("following {:?} +{} -> {:?}", from, component, to);
                to
            }
            None => self.build_edge_with(from, component, storable)?,
        };
        Ok(self.transfer(from, row, to))
    }

    /// Move the entity at `row` of `from` into the archetype reached by
    /// removing `component`. The component's payload, if any, is dropped.
    ///
    /// ## NOTE:
    /// The caller guarantees `from` contains `component`.
    pub(crate) fn remove(
        &mut self,
        from: ArchetypeId,
        row: usize,
        component: Entity,
    ) -> Result<Moved> {
        let cached = self
            .arch_mut(from)
            .edge(component)
            .and_then(|edge| edge.remove);
        let to = match cached {
            Some(to) => {
                log::trace!("following {:?} -{} -> {:?}", from, component, to);
                to
            }
            None => self.build_edge_without(from, component)?,
        };
        Ok(self.transfer(from, row, to))
    }

    fn build_edge_with(
        &mut self,
        from: ArchetypeId,
        component: Entity,
        storable: bool,
    ) -> Result<ArchetypeId> {
        let source = self.arch_mut(from);
        debug_assert!(!source.has(component));
        let signature = source.signature.with(component);
        let mut columns: SmallVec<[Entity; 8]> = source.storable().collect();
        if storable {
            columns.push(component);
        }
        let to = self.get_or_create(signature, columns)?;
        self.link(from, to, component)?;
        Ok(to)
    }

    fn build_edge_without(&mut self, from: ArchetypeId, component: Entity) -> Result<ArchetypeId> {
        let source = self.arch_mut(from);
        debug_assert!(source.has(component));
        let signature = source.signature.without(component);
        let columns: SmallVec<[Entity; 8]> =
            source.storable().filter(|c| *c != component).collect();
        let to = self.get_or_create(signature, columns)?;
        self.link(to, from, component)?;
        Ok(to)
    }

    /// Wire both sides of the edge between `smaller` and `larger`, which
    /// differ only by `component`.
    fn link(&mut self, smaller: ArchetypeId, larger: ArchetypeId, component: Entity) -> Result<()> {
        log::trace!("linking {:?} +{} -> {:?}", smaller, component, larger);
        let up = self.arch_mut(smaller).edge_mut(component);
        if up.add.map_or(false, |id| id != larger) {
            let signature = self.arch_mut(smaller).signature.with(component);
            return Err(Error::DuplicateEdgeConflict(signature));
        }
        up.add = Some(larger);
        let down = self.arch_mut(larger).edge_mut(component);
        if down.remove.map_or(false, |id| id != smaller) {
            let signature = self.arch_mut(larger).signature.without(component);
            return Err(Error::DuplicateEdgeConflict(signature));
        }
        down.remove = Some(smaller);
        Ok(())
    }

    fn get_or_create(
        &mut self,
        signature: Signature,
        columns: impl IntoIterator<Item = Entity>,
    ) -> Result<ArchetypeId> {
        if let Some(id) = self.by_signature.get(&signature) {
            return Ok(*id);
        }
        let id = match self.vacant.pop() {
            Some(id) => id,
            None => ArchetypeId(self.archetypes.len() as u32),
        };
        log::debug!("creating archetype {:?} for {:?}", id, signature);
        let archetype = Archetype::new(id, signature, columns);
        self.insert_archetype(archetype)?;
        Ok(id)
    }

    fn insert_archetype(&mut self, archetype: Archetype) -> Result<()> {
        let id = archetype.id;
        if self.by_signature.contains_key(&archetype.signature) {
            return Err(Error::DuplicateEdgeConflict(archetype.signature));
        }
        self.by_signature.insert(archetype.signature.clone(), id);
        for component in archetype.signature.iter() {
            self.with_component.entry(*component).or_default().push(id);
        }
        if id.index() == self.archetypes.len() {
            self.archetypes.push(Some(archetype));
        } else {
            debug_assert!(self.archetypes[id.index()].is_none());
            self.archetypes[id.index()] = Some(archetype);
        }
        Ok(())
    }

    /// Pop the entity's payloads out of `from` and push them into `to`.
    ///
    /// Payloads for components without a column in `to` are dropped.
    fn transfer(&mut self, from: ArchetypeId, row: usize, to: ArchetypeId) -> Moved {
        let entity = self.arch_mut(from).entities[row];
        let (displaced, payloads) = self.arch_mut(from).swap_remove(row);
        let destination = self.arch_mut(to);
        let new_row = destination.push(entity);
        for (component, payload) in payloads {
            if let Some(column) = destination.column_mut(component) {
                let _ = column.set(new_row, payload);
            }
        }
        Moved {
            archetype: to,
            row: new_row,
            displaced,
        }
    }

    /// Reclaim every empty archetype whose signature includes `component`.
    ///
    /// Returns the number of archetypes reclaimed.
    pub(crate) fn reclaim_with(&mut self, component: Entity) -> usize {
        let ids: SmallVec<[ArchetypeId; 4]> = self
            .with_component(component)
            .filter(|arch| arch.is_empty())
            .map(|arch| arch.id)
            .collect();
        ids.into_iter().filter(|id| self.reclaim(*id)).count()
    }

    /// Reclaim every empty archetype except the origin.
    pub(crate) fn reclaim_empty(&mut self) -> usize {
        let ids: Vec<ArchetypeId> = self
            .iter()
            .filter(|arch| arch.id != ArchetypeId::ORIGIN && arch.is_empty())
            .map(|arch| arch.id)
            .collect();
        ids.into_iter().filter(|id| self.reclaim(*id)).count()
    }

    /// Drop an empty archetype, unlinking every edge that points at it.
    fn reclaim(&mut self, id: ArchetypeId) -> bool {
        if id == ArchetypeId::ORIGIN {
            return false;
        }
        let archetype = match self.archetypes.get_mut(id.index()).and_then(Option::take) {
            Some(archetype) => archetype,
            None => return false,
        };
        debug_assert!(archetype.is_empty(), "reclaiming a populated archetype");
        log::debug!("reclaiming archetype {:?} for {:?}", id, archetype.signature);

        for (component, edge) in archetype.edges.iter() {
            if let Some(neighbor) = edge.add.and_then(|n| self.get_mut(n)) {
                unlink(neighbor, *component, |e| &mut e.remove);
            }
            if let Some(neighbor) = edge.remove.and_then(|n| self.get_mut(n)) {
                unlink(neighbor, *component, |e| &mut e.add);
            }
        }
        for component in archetype.signature.iter() {
            if let Some(ids) = self.with_component.get_mut(component) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.with_component.remove(component);
                }
            }
        }
        self.by_signature.remove(&archetype.signature);
        self.vacant.push(id);
        true
    }
}

fn unlink(
    neighbor: &mut Archetype,
    component: Entity,
    side: impl FnOnce(&mut super::Edge) -> &mut Option<ArchetypeId>,
) {
    let edge = neighbor.edge_mut(component);
    *side(edge) = None;
    if edge.is_empty() {
        neighbor.edges.remove(&component);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn e(index: u32) -> Entity {
        Entity::pack(index, 0)
    }

    fn spawn_at(all: &mut AllArchetypes, entity: Entity) -> (ArchetypeId, usize) {
        (ArchetypeId::ORIGIN, all.spawn(entity))
    }

    #[test]
    fn add_builds_then_follows_edges() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Trace)
            .try_init();

        let mut all = AllArchetypes::default();
        let (from, row) = spawn_at(&mut all, e(1));
        let moved = all.add(from, row, e(100), true).unwrap();
        assert_eq!(2, all.len());
        assert_eq!(0, moved.row);
        assert_eq!(None, moved.displaced);

        let origin = all.get(ArchetypeId::ORIGIN).unwrap();
        assert_eq!(Some(moved.archetype), origin.edge(e(100)).unwrap().add());
        let dest = all.get(moved.archetype).unwrap();
        assert_eq!(Some(ArchetypeId::ORIGIN), dest.edge(e(100)).unwrap().remove());
        assert!(dest.column(e(100)).is_some());

        // a second entity takes the cached edge to the same archetype
        let (from, row) = spawn_at(&mut all, e(2));
        let again = all.add(from, row, e(100), true).unwrap();
        assert_eq!(moved.archetype, again.archetype);
        assert_eq!(1, again.row);
        assert_eq!(2, all.len());
    }

    #[test]
    fn different_paths_reach_one_archetype() {
        let mut all = AllArchetypes::default();
        let (from, row) = spawn_at(&mut all, e(1));
        let a = all.add(from, row, e(100), false).unwrap();
        let ab = all.add(a.archetype, a.row, e(200), false).unwrap();

        let (from, row) = spawn_at(&mut all, e(2));
        let b = all.add(from, row, e(200), false).unwrap();
        let ba = all.add(b.archetype, b.row, e(100), false).unwrap();

        assert_eq!(ab.archetype, ba.archetype);
        let expected: Signature = [e(100), e(200)].into_iter().collect();
        assert_eq!(
            Some(ab.archetype),
            all.by_signature(&expected).map(Archetype::id)
        );
        assert_eq!(2, all.with_component(e(100)).count());
        assert_eq!(1, all.matching(&expected).count());
    }

    #[test]
    fn transfer_keeps_payloads_and_reports_displaced() {
        let mut all = AllArchetypes::default();
        let mut last = None;
        for i in 1..=3 {
            let (from, row) = spawn_at(&mut all, e(i));
            let moved = all.add(from, row, e(100), true).unwrap();
            all.get_mut(moved.archetype)
                .unwrap()
                .column_mut(e(100))
                .unwrap()
                .set(moved.row, Box::new(i * 10));
            last = Some(moved.archetype);
        }
        let with_a = last.unwrap();

        // move the first entity onward, the third is swapped into row 0
        let moved = all.add(with_a, 0, e(200), true).unwrap();
        assert_eq!(Some(e(3)), moved.displaced);
        let dest = all.get(moved.archetype).unwrap();
        assert_eq!(
            Some(&10u32),
            dest.column(e(100))
                .unwrap()
                .get(moved.row)
                .and_then(|p| p.downcast_ref::<u32>())
        );
        assert!(dest.column(e(200)).unwrap().get(moved.row).is_none());

        // removing drops the removed column's payload only
        let back = all.remove(moved.archetype, moved.row, e(100)).unwrap();
        let dest = all.get(back.archetype).unwrap();
        assert!(dest.column(e(100)).is_none());
        assert!(dest.column(e(200)).is_some());
        assert_eq!(&[e(1)], dest.entities());
    }

    #[test]
    fn reclaim_unlinks_neighbors() {
        let mut all = AllArchetypes::default();
        let (from, row) = spawn_at(&mut all, e(1));
        let a = all.add(from, row, e(100), false).unwrap();
        let ab = all.add(a.archetype, a.row, e(200), false).unwrap();
        let back = all.remove(ab.archetype, ab.row, e(200)).unwrap();
        assert_eq!(a.archetype, back.archetype);
        let _ = all.remove(back.archetype, back.row, e(100)).unwrap();
        assert_eq!(3, all.len());

        assert_eq!(1, all.reclaim_with(e(200)));
        assert_eq!(2, all.len());
        assert!(all.get(ab.archetype).is_none());
        assert!(all.get(a.archetype).unwrap().edge(e(200)).is_none());
        assert_eq!(0, all.with_component(e(200)).count());

        // the vacated id is reused
        let (from, row) = spawn_at(&mut all, e(2));
        let c = all.add(from, row, e(300), false).unwrap();
        assert_eq!(ab.archetype, c.archetype);

        let _ = all.remove(c.archetype, c.row, e(300)).unwrap();
        assert_eq!(2, all.reclaim_empty());
        assert_eq!(1, all.len());
        assert!(all.get(ArchetypeId::ORIGIN).unwrap().edges().next().is_none());
    }
}
