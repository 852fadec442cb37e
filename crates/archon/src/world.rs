//! The [`World`] owns every entity, component and archetype.
//!
//! Components are entities. Whether a component stores data, or may be
//! toggled, is recorded by attaching one of the world's marker tags to the
//! component entity itself, so component metadata is read through the same
//! signature lookup as any other component.
use std::any::{type_name, Any};

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{smallvec, SmallVec};

use crate::{
    archetype::{AllArchetypes, Archetype, ArchetypeId, Moved, Payload, Signature},
    config::{ArchetypeRetention, WorldConfig},
    entity::ENTITY_LIMIT,
    Entity, Error, Registry, Result,
};

/// The marker components created by every world: storable, togglable and
/// component.
const BOOTSTRAP_LEN: u32 = 3;

/// Where an entity's data lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityLocation {
    pub archetype: ArchetypeId,
    pub row: usize,
}

/// How a new component behaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentFlags {
    /// The component carries a payload and gets a column.
    pub storable: bool,
    /// The component may be flipped on and off without losing its payload.
    pub togglable: bool,
}

impl ComponentFlags {
    pub const STORABLE: ComponentFlags = ComponentFlags {
        storable: true,
        togglable: false,
    };

    pub const TAG: ComponentFlags = ComponentFlags {
        storable: false,
        togglable: false,
    };
}

/// Component id to the slots of every entity holding it.
#[derive(Debug, Default)]
struct Holders(FxHashMap<Entity, FxHashSet<u32>>);

impl Holders {
    fn insert(&mut self, component: Entity, slot: u32) {
        self.0.entry(component).or_default().insert(slot);
    }

    /// Returns true once no entity holds the component.
    fn remove(&mut self, component: Entity, slot: u32) -> bool {
        let slots = match self.0.get_mut(&component) {
            Some(slots) => slots,
            None => return true,
        };
        slots.remove(&slot);
        if slots.is_empty() {
            self.0.remove(&component);
            true
        } else {
            false
        }
    }

    fn slots(&self, component: Entity) -> SmallVec<[u32; 8]> {
        self.0
            .get(&component)
            .map(|slots| slots.iter().copied().collect())
            .unwrap_or_default()
    }

    fn forget(&mut self, component: Entity) {
        self.0.remove(&component);
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An archetype entity-component store.
///
/// ```
/// # use archon::*;
/// let mut world = World::default();
/// let position = world.component().unwrap();
/// let player = world.tag().unwrap();
///
/// let e = world.spawn().unwrap();
/// world.set(e, position, (0.0f32, 1.0f32)).unwrap();
/// world.add(e, player).unwrap();
/// assert_eq!(&(0.0, 1.0), world.get::<(f32, f32)>(e, position).unwrap());
/// assert!(world.has(e, player));
///
/// world.despawn(e).unwrap();
/// assert!(!world.is_alive(e));
/// ```
#[derive(Debug)]
pub struct World {
    registry: Registry,
    archetypes: AllArchetypes,
    /// Entity slot to location.
    locations: Vec<Option<EntityLocation>>,
    holders: Holders,
    /// Entity slot to the held relation ids naming it as kind or target.
    relations_of: FxHashMap<u32, FxHashSet<Entity>>,
    config: WorldConfig,
    storable: Entity,
    togglable: Entity,
    attachable: Entity,
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}

impl World {
    pub fn new() -> Self {
        World::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        let limit = config
            .entity_limit
            .saturating_add(BOOTSTRAP_LEN)
            .min(ENTITY_LIMIT);
        let capacity = config.entity_capacity + BOOTSTRAP_LEN as usize;
        let placeholder = Entity::from_bits(0);
        let mut world = World {
            registry: Registry::new(limit, capacity),
            archetypes: AllArchetypes::default(),
            locations: Vec::with_capacity(capacity + 1),
            holders: Default::default(),
            relations_of: Default::default(),
            config,
            storable: placeholder,
            togglable: placeholder,
            attachable: placeholder,
        };
        world.storable = world.bootstrap();
        world.togglable = world.bootstrap();
        world.attachable = world.bootstrap();
        world
    }

    fn bootstrap(&mut self) -> Entity {
        match self.spawn() {
            Ok(entity) => entity,
            Err(_) => unreachable!("a fresh registry always has room for the marker components"),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The marker tag carried by every storable component.
    pub fn storable_marker(&self) -> Entity {
        self.storable
    }

    /// The marker tag carried by every togglable component.
    pub fn togglable_marker(&self) -> Entity {
        self.togglable
    }

    /// The marker tag carried by every entity made with
    /// [`World::component`] and friends.
    pub fn component_marker(&self) -> Entity {
        self.attachable
    }

    fn is_reserved(&self, entity: Entity) -> bool {
        entity == self.storable || entity == self.togglable || entity == self.attachable
    }

    /// Returns the number of live entities, components included, not
    /// counting the world's marker components.
    pub fn len(&self) -> usize {
        self.registry.alive_len() - BOOTSTRAP_LEN as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    /// Return an iterator over all live entities, components included,
    /// excluding the world's marker components.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.registry
            .alive_iter()
            .filter(move |entity| !self.is_reserved(*entity))
    }

    fn locate(&self, entity: Entity) -> Result<EntityLocation> {
        if !self.registry.is_alive(entity) {
            return Err(Error::StaleHandle(entity));
        }
        self.locations
            .get(entity.index() as usize)
            .copied()
            .flatten()
            .ok_or(Error::StaleHandle(entity))
    }

    /// Where the entity's data lives, if it is alive.
    pub fn location(&self, entity: Entity) -> Option<EntityLocation> {
        self.locate(entity).ok()
    }

    fn set_location(&mut self, entity: Entity, location: EntityLocation) {
        let index = entity.index() as usize;
        if index >= self.locations.len() {
            self.locations.resize_with(index + 1, Default::default);
        }
        self.locations[index] = Some(location);
    }

    fn relocate(&mut self, entity: Entity, from: EntityLocation, moved: Moved) {
        self.set_location(
            entity,
            EntityLocation {
                archetype: moved.archetype,
                row: moved.row,
            },
        );
        if let Some(displaced) = moved.displaced {
            if let Some(Some(location)) = self.locations.get_mut(displaced.index() as usize) {
                location.row = from.row;
            }
        }
    }

    fn arch(&self, id: ArchetypeId) -> &Archetype {
        match self.archetypes.get(id) {
            Some(archetype) => archetype,
            None => unreachable!("an entity is located in reclaimed archetype {:?}", id),
        }
    }

    fn arch_mut(&mut self, id: ArchetypeId) -> &mut Archetype {
        match self.archetypes.get_mut(id) {
            Some(archetype) => archetype,
            None => unreachable!("an entity is located in reclaimed archetype {:?}", id),
        }
    }

    /// Ensure a component id refers to live entities.
    ///
    /// A relation is valid while the slots of its kind and target are
    /// occupied.
    fn check_component(&self, component: Entity) -> Result<()> {
        let alive = if component.is_relation() {
            self.registry.current(component.relation_kind()).is_some()
                && self.registry.current(component.relation_target()).is_some()
        } else {
            self.registry.is_alive(component)
        };
        if alive {
            Ok(())
        } else {
            Err(Error::StaleHandle(component))
        }
    }

    /// Create an entity with no components.
    ///
    /// ## Errs
    /// Errs if the entity limit has been reached.
    pub fn spawn(&mut self) -> Result<Entity> {
        let entity = self.registry.allocate().map_err(|err| match err {
            Error::CapacityExceeded { limit } => Error::CapacityExceeded {
                limit: limit.saturating_sub(BOOTSTRAP_LEN),
            },
            err => err,
        })?;
        let row = self.archetypes.spawn(entity);
        self.set_location(
            entity,
            EntityLocation {
                archetype: ArchetypeId::ORIGIN,
                row,
            },
        );
        Ok(entity)
    }

    /// Create many entities at once.
    pub fn spawn_many(&mut self, how_many: usize) -> Result<Vec<Entity>> {
        (0..how_many).map(|_| self.spawn()).collect()
    }

    /// Create a storable component.
    pub fn component(&mut self) -> Result<Entity> {
        self.component_with(ComponentFlags::STORABLE)
    }

    /// Create a component that carries no data.
    pub fn tag(&mut self) -> Result<Entity> {
        self.component_with(ComponentFlags::TAG)
    }

    pub fn component_with(&mut self, flags: ComponentFlags) -> Result<Entity> {
        let component = self.spawn()?;
        if flags.storable {
            self.add(component, self.storable)?;
        }
        if flags.togglable {
            self.add(component, self.togglable)?;
        }
        self.add(component, self.attachable)?;
        Ok(component)
    }

    /// Pack a relation id between two live entities.
    ///
    /// The relation is storable or togglable iff its kind is.
    pub fn relation(&self, kind: Entity, target: Entity, exclusive: bool) -> Result<Entity> {
        for end in [kind, target] {
            if !self.registry.is_alive(end) {
                return Err(Error::StaleHandle(end));
            }
        }
        Ok(Entity::relation(kind, target, exclusive))
    }

    /// The live targets of the entity's relations of the given kind.
    pub fn targets(&self, entity: Entity, kind: Entity) -> impl Iterator<Item = Entity> + '_ {
        let kind_is_alive = self.registry.is_alive(kind);
        self.signature(entity)
            .into_iter()
            .flat_map(Signature::iter)
            .filter(move |c| {
                kind_is_alive && c.is_relation() && c.relation_kind() == kind.index()
            })
            .filter_map(move |c| self.registry.current(c.relation_target()))
    }

    /// The entity's current signature.
    pub fn signature(&self, entity: Entity) -> Option<&Signature> {
        let location = self.locate(entity).ok()?;
        Some(&self.arch(location.archetype).signature)
    }

    /// Whether the entity holds the component. Dead entities hold nothing.
    pub fn has(&self, entity: Entity, component: Entity) -> bool {
        self.signature(entity)
            .map_or(false, |signature| signature.contains(component))
    }

    fn has_marker(&self, component: Entity, marker: Entity) -> bool {
        if component.is_relation() {
            self.registry
                .current(component.relation_kind())
                .map_or(false, |kind| self.has(kind, marker))
        } else {
            self.has(component, marker)
        }
    }

    pub fn is_storable(&self, component: Entity) -> bool {
        self.has_marker(component, self.storable)
    }

    pub fn is_togglable(&self, component: Entity) -> bool {
        self.has_marker(component, self.togglable)
    }

    /// Whether the id was made by [`World::component`] and friends, or is a
    /// relation.
    pub fn is_component(&self, component: Entity) -> bool {
        if component.is_relation() {
            self.registry.current(component.relation_kind()).is_some()
        } else {
            self.has(component, self.attachable)
        }
    }

    /// Whether any archetype signature or relation already uses the
    /// component, which fixes its storage flags.
    fn in_use(&self, component: Entity) -> bool {
        self.archetypes.with_component(component).next().is_some()
            || self
                .relations_of
                .get(&component.index())
                .map_or(false, |relations| {
                    relations
                        .iter()
                        .any(|relation| relation.relation_kind() == component.index())
                })
    }

    fn guard_markers(&self, entity: Entity, component: Entity) -> Result<()> {
        if (component == self.storable || component == self.togglable) && self.in_use(entity) {
            Err(Error::ComponentInUse(entity))
        } else {
            Ok(())
        }
    }

    /// Attach a component to the entity.
    ///
    /// This is a noop if the entity already has the component.
    ///
    /// ## Errs
    /// * if the entity or the component is not alive
    /// * if this marks a component that is already in use as storable or
    ///   togglable
    pub fn add(&mut self, entity: Entity, component: Entity) -> Result<()> {
        let location = self.locate(entity)?;
        self.check_component(component)?;
        if self.arch(location.archetype).has(component) {
            return Ok(());
        }
        self.guard_markers(entity, component)?;
        let storable = self.is_storable(component);
        let moved = self
            .archetypes
            .add(location.archetype, location.row, component, storable)?;
        self.relocate(entity, location, moved);

        self.holders.insert(component, entity.index());
        if component.is_relation() {
            for slot in [component.relation_kind(), component.relation_target()] {
                self.relations_of.entry(slot).or_default().insert(component);
            }
        }
        Ok(())
    }

    /// Detach a component from the entity, dropping its payload if any.
    ///
    /// This is a noop if the entity does not have the component.
    pub fn remove(&mut self, entity: Entity, component: Entity) -> Result<()> {
        let location = self.locate(entity)?;
        if !self.arch(location.archetype).has(component) {
            return Ok(());
        }
        self.guard_markers(entity, component)?;
        self.detach(entity, location, component)
    }

    fn detach(&mut self, entity: Entity, location: EntityLocation, component: Entity) -> Result<()> {
        let moved = self
            .archetypes
            .remove(location.archetype, location.row, component)?;
        self.relocate(entity, location, moved);
        if self.holders.remove(component, entity.index()) && component.is_relation() {
            self.unindex_relation(component);
            // the same relation id is packed again once its slots are reused
            let _ = self.archetypes.reclaim_with(component);
        }
        Ok(())
    }

    /// Drop a relation no entity holds anymore from the index of both its
    /// ends.
    fn unindex_relation(&mut self, relation: Entity) {
        if !relation.is_relation() {
            return;
        }
        for slot in [relation.relation_kind(), relation.relation_target()] {
            if let Some(relations) = self.relations_of.get_mut(&slot) {
                relations.remove(&relation);
                if relations.is_empty() {
                    self.relations_of.remove(&slot);
                }
            }
        }
    }

    /// Write a component's payload, adding the component first if needed.
    pub fn set<T: Any + Send + Sync>(
        &mut self,
        entity: Entity,
        component: Entity,
        data: T,
    ) -> Result<()> {
        let _ = self.set_any(entity, component, Box::new(data))?;
        Ok(())
    }

    /// Write a type erased payload, returning the one it replaces.
    pub fn set_any(
        &mut self,
        entity: Entity,
        component: Entity,
        payload: Payload,
    ) -> Result<Option<Payload>> {
        self.locate(entity)?;
        self.check_component(component)?;
        if !self.is_storable(component) {
            return Err(Error::NotStorable(component));
        }
        self.add(entity, component)?;
        let location = self.locate(entity)?;
        let column = self
            .arch_mut(location.archetype)
            .column_mut(component)
            .ok_or(Error::NotStorable(component))?;
        Ok(column.set(location.row, payload))
    }

    /// Read a component's payload as `T`.
    ///
    /// ## Errs
    /// * [`Error::MissingComponent`] if the entity lacks the component or no
    ///   payload was written
    /// * [`Error::NotStorable`] if the component is a tag
    /// * [`Error::TypeMismatch`] if the payload is not a `T`
    pub fn get<T: Any>(&self, entity: Entity, component: Entity) -> Result<&T> {
        self.get_any(entity, component)?
            .downcast_ref::<T>()
            .ok_or(Error::TypeMismatch {
                component,
                expected: type_name::<T>(),
            })
    }

    pub fn get_any(&self, entity: Entity, component: Entity) -> Result<&(dyn Any + Send + Sync)> {
        let location = self.locate(entity)?;
        let archetype = self.arch(location.archetype);
        if !archetype.has(component) {
            return Err(Error::MissingComponent { entity, component });
        }
        archetype
            .column(component)
            .ok_or(Error::NotStorable(component))?
            .get(location.row)
            .map(|payload| &**payload)
            .ok_or(Error::MissingComponent { entity, component })
    }

    pub fn get_mut<T: Any>(&mut self, entity: Entity, component: Entity) -> Result<&mut T> {
        let location = self.locate(entity)?;
        let archetype = self.arch_mut(location.archetype);
        if !archetype.has(component) {
            return Err(Error::MissingComponent { entity, component });
        }
        archetype
            .column_mut(component)
            .ok_or(Error::NotStorable(component))?
            .get_mut(location.row)
            .ok_or(Error::MissingComponent { entity, component })?
            .downcast_mut::<T>()
            .ok_or(Error::TypeMismatch {
                component,
                expected: type_name::<T>(),
            })
    }

    /// Take a component's payload as `T` and detach the component.
    ///
    /// Nothing changes if this errs.
    pub fn unset<T: Any>(&mut self, entity: Entity, component: Entity) -> Result<T> {
        let mismatch = Error::TypeMismatch {
            component,
            expected: type_name::<T>(),
        };
        if !self.get_any(entity, component)?.is::<T>() {
            return Err(mismatch);
        }
        let payload = self.unset_any(entity, component)?;
        payload
            .downcast::<T>()
            .map(|data| *data)
            .map_err(|_| mismatch)
    }

    /// Take a component's type erased payload and detach the component.
    pub fn unset_any(&mut self, entity: Entity, component: Entity) -> Result<Payload> {
        let location = self.locate(entity)?;
        let archetype = self.arch_mut(location.archetype);
        if !archetype.has(component) {
            return Err(Error::MissingComponent { entity, component });
        }
        let payload = archetype
            .column_mut(component)
            .ok_or(Error::NotStorable(component))?
            .take(location.row)
            .ok_or(Error::MissingComponent { entity, component })?;
        self.detach(entity, location, component)?;
        Ok(payload)
    }

    /// Destroy an entity.
    ///
    /// Every component is detached, then the entity is detached from every
    /// other entity holding it as a component, or holding a relation whose
    /// kind or target it is. Finally its slot is recycled.
    ///
    /// ## Errs
    /// * [`Error::StaleHandle`] if the entity is not alive
    /// * [`Error::Reserved`] for the world's marker components
    pub fn despawn(&mut self, entity: Entity) -> Result<()> {
        let location = self.locate(entity)?;
        if self.is_reserved(entity) {
            return Err(Error::Reserved(entity));
        }

        let signature = self.arch(location.archetype).signature.clone();
        for component in signature.iter().rev() {
            let location = self.locate(entity)?;
            self.detach(entity, location, *component)?;
        }

        let mut dead: SmallVec<[Entity; 8]> = smallvec![entity];
        if let Some(relations) = self.relations_of.get(&entity.index()) {
            dead.extend(relations.iter().copied());
        }
        for component in dead.iter().copied() {
            for slot in self.holders.slots(component) {
                let holder = match self.registry.current(slot) {
                    Some(holder) => holder,
                    None => continue,
                };
                log::debug!("despawning {} detaches {} from {}", entity, component, holder);
                let location = self.locate(holder)?;
                if self.arch(location.archetype).has(component) {
                    self.detach(holder, location, component)?;
                }
            }
            self.holders.forget(component);
            self.unindex_relation(component);
        }
        self.relations_of.remove(&entity.index());

        let reclaim_plain = self.config.archetype_retention == ArchetypeRetention::ReclaimDead;
        for component in dead.iter().copied() {
            // relation ids name slots, not generations, and may be packed
            // again once the slots are reused
            if reclaim_plain || component.is_relation() {
                let _ = self.archetypes.reclaim_with(component);
            }
        }

        let location = self.locate(entity)?;
        debug_assert_eq!(ArchetypeId::ORIGIN, location.archetype);
        if let Some(displaced) = self.archetypes.despawn(location.archetype, location.row) {
            if let Some(Some(moved)) = self.locations.get_mut(displaced.index() as usize) {
                moved.row = location.row;
            }
        }
        self.locations[entity.index() as usize] = None;
        self.registry.free(entity)
    }

    /// Reclaim every empty archetype except the origin, returning how many
    /// were reclaimed.
    ///
    /// Cached transitions through reclaimed archetypes are forgotten and
    /// rebuilt on demand.
    pub fn compact(&mut self) -> usize {
        self.archetypes.reclaim_empty()
    }

    /// The archetype index, for query layers.
    pub fn all_archetypes(&self) -> &AllArchetypes {
        &self.archetypes
    }

    pub fn archetypes(&self) -> impl Iterator<Item = &Archetype> + '_ {
        self.archetypes.iter()
    }

    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id)
    }

    /// The canonical archetype for a signature, if it exists.
    pub fn archetype_of(&self, signature: &Signature) -> Option<&Archetype> {
        self.archetypes.by_signature(signature)
    }

    pub fn archetypes_with(&self, component: Entity) -> impl Iterator<Item = &Archetype> + '_ {
        self.archetypes.with_component(component)
    }

    /// Archetypes holding at least every component of `filter`.
    pub fn archetypes_matching<'a>(
        &'a self,
        filter: &'a Signature,
    ) -> impl Iterator<Item = &'a Archetype> + 'a {
        self.archetypes.matching(filter)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn markers_are_bootstrapped() {
        let world = World::default();
        assert!(world.is_empty());
        assert_eq!(0, world.entities().count());
        for marker in [
            world.storable_marker(),
            world.togglable_marker(),
            world.component_marker(),
        ] {
            assert!(world.is_alive(marker));
            assert_eq!(Some(&Signature::empty()), world.signature(marker));
        }
    }

    #[test]
    fn markers_cannot_be_despawned() {
        let mut world = World::default();
        let storable = world.storable_marker();
        assert_eq!(Err(Error::Reserved(storable)), world.despawn(storable));
    }

    #[test]
    fn locations_follow_swapped_rows() {
        let mut world = World::default();
        let c = world.component().unwrap();
        let es = world.spawn_many(3).unwrap();
        for (i, e) in es.iter().enumerate() {
            world.set(*e, c, i).unwrap();
        }
        // moving the first entity out swaps the last into its row
        world.remove(es[0], c).unwrap();
        assert_eq!(0, world.location(es[2]).unwrap().row);
        assert_eq!(&2usize, world.get::<usize>(es[2], c).unwrap());
        assert_eq!(&1usize, world.get::<usize>(es[1], c).unwrap());

        world.despawn(es[1]).unwrap();
        assert_eq!(&2usize, world.get::<usize>(es[2], c).unwrap());
    }

    #[test]
    fn storable_flag_is_fixed_once_used() {
        let mut world = World::default();
        let tag = world.tag().unwrap();
        let e = world.spawn().unwrap();
        world.add(e, tag).unwrap();
        let storable = world.storable_marker();
        assert_eq!(Err(Error::ComponentInUse(tag)), world.add(tag, storable));

        let c = world.component().unwrap();
        world.set(e, c, 1u8).unwrap();
        assert_eq!(Err(Error::ComponentInUse(c)), world.remove(c, storable));
        assert!(world.is_storable(c));
    }

    #[test]
    fn holders_cover_the_whole_slot_range() {
        let mut holders = Holders::default();
        let component = Entity::pack(4, 0);
        let high = (1 << 24) + 1;
        holders.insert(component, high);
        holders.insert(component, ENTITY_LIMIT);
        let mut slots = holders.slots(component);
        slots.sort_unstable();
        assert_eq!(&[high, ENTITY_LIMIT][..], slots.as_slice());

        assert!(!holders.remove(component, high));
        assert!(holders.remove(component, ENTITY_LIMIT));
        assert!(holders.is_empty());
    }

    #[test]
    fn relation_index_shrinks_as_relations_are_removed() {
        let mut world = World::default();
        let kind = world.tag().unwrap();
        let holder = world.spawn().unwrap();
        let targets = world.spawn_many(1000).unwrap();
        let relations = targets
            .iter()
            .map(|target| world.relation(kind, *target, false).unwrap())
            .collect::<Vec<_>>();
        for relation in relations.iter() {
            world.add(holder, *relation).unwrap();
        }
        assert_eq!(1000, world.relations_of[&kind.index()].len());
        assert!(world.in_use(kind));

        for relation in relations.iter() {
            world.remove(holder, *relation).unwrap();
        }
        assert_eq!(Some(&Signature::empty()), world.signature(holder));
        assert!(world.relations_of.is_empty());
        assert!(relations
            .iter()
            .all(|relation| world.holders.slots(*relation).is_empty()));

        // nothing holds a relation of this kind, so it may become storable
        assert!(!world.in_use(kind));
        let storable = world.storable_marker();
        world.add(kind, storable).unwrap();
        assert!(world.is_storable(kind));
    }

    #[test]
    fn despawning_one_end_unindexes_the_other() {
        let mut world = World::default();
        let kind = world.component().unwrap();
        let holder = world.spawn().unwrap();
        let target = world.spawn().unwrap();
        let relation = world.relation(kind, target, false).unwrap();
        world.set(holder, relation, 7u32).unwrap();
        assert!(world.relations_of.contains_key(&kind.index()));

        world.despawn(target).unwrap();
        assert!(!world.has(holder, relation));
        assert!(world.relations_of.is_empty());
        assert!(world.holders.slots(relation).is_empty());

        // unset detaches too
        let other = world.spawn().unwrap();
        let relation = world.relation(kind, other, false).unwrap();
        world.set(holder, relation, 8u32).unwrap();
        assert_eq!(Ok(8u32), world.unset::<u32>(holder, relation));
        assert!(world.relations_of.is_empty());
    }
}
