//! Allocation and recycling of entity handles.
use crate::{
    entity::{ENTITY_LIMIT, GENERATION_LIMIT},
    Entity, Error, Result,
};

/// Slot 0 is never handed out. A free-list link pointing at it means "no
/// free slot", and a table entry equal to it marks a retired slot.
const NONE_FREE: u32 = 0;
const RETIRED: Entity = Entity::pack(NONE_FREE, 0);

/// Creates, destroys and recycles entity handles.
///
/// The registry owns a table holding, for every slot, the handle currently
/// living in that slot. A handle is alive iff the table holds exactly that
/// handle. Freed slots form a LIFO list threaded through the table itself:
/// the low half of a freed slot's entry is the next free slot and the high
/// half is the generation the slot will be reissued with.
/// ```
/// # use archon::Registry;
/// let mut registry = Registry::default();
/// let a = registry.allocate().unwrap();
/// registry.free(a).unwrap();
/// let b = registry.allocate().unwrap();
/// assert_eq!(a.index(), b.index());
/// assert!(!registry.is_alive(a));
/// assert!(registry.is_alive(b));
/// ```
#[derive(Debug)]
pub struct Registry {
    slots: Vec<Entity>,
    next_free: u32,
    free_len: usize,
    retired_len: usize,
    limit: u32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(ENTITY_LIMIT, 0)
    }
}

impl Registry {
    /// Create a registry handing out at most `limit` slots, with room for
    /// `capacity` of them reserved up front.
    ///
    /// `limit` is clamped to [`ENTITY_LIMIT`].
    pub fn new(limit: u32, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.push(RETIRED);
        Registry {
            slots,
            next_free: NONE_FREE,
            free_len: 0,
            retired_len: 0,
            limit: limit.min(ENTITY_LIMIT),
        }
    }

    /// The maximum number of slots this registry will hand out.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Return a fresh handle.
    ///
    /// The most recently freed slot is reused first, carrying its bumped
    /// generation. Otherwise a new slot is appended at generation 0.
    ///
    /// ## Errs
    /// Errs with [`Error::CapacityExceeded`] if no slot is free and the table
    /// already holds `limit` slots.
    pub fn allocate(&mut self) -> Result<Entity> {
        if self.next_free != NONE_FREE {
            return Ok(self.recycle());
        }
        let index = self.slots.len();
        if index > self.limit as usize {
            return Err(Error::CapacityExceeded { limit: self.limit });
        }
        let entity = Entity::pack(index as u32, 0);
        self.slots.push(entity);
        log::trace!("allocated new {}", entity);
        Ok(entity)
    }

    fn recycle(&mut self) -> Entity {
        let index = self.next_free;
        let link = self.slots[index as usize];
        let entity = Entity::pack(index, link.generation());
        self.next_free = link.index();
        self.slots[index as usize] = entity;
        self.free_len -= 1;
        log::trace!("recycled {}", entity);
        entity
    }

    /// Return the handle's slot to the free list, bumping its generation.
    ///
    /// A slot whose generation has reached [`GENERATION_LIMIT`] is retired
    /// instead, so an old handle can never compare alive again.
    ///
    /// ## Errs
    /// Errs with [`Error::StaleHandle`] if the handle is not alive, which
    /// covers double frees.
    pub fn free(&mut self, entity: Entity) -> Result<()> {
        if !self.is_alive(entity) {
            return Err(Error::StaleHandle(entity));
        }
        let index = entity.index();
        let generation = entity.generation();
        if generation >= GENERATION_LIMIT {
            log::debug!("retiring slot {} after {} generations", index, generation);
            self.slots[index as usize] = RETIRED;
            self.retired_len += 1;
            return Ok(());
        }
        self.slots[index as usize] = Entity::pack(self.next_free, generation + 1);
        self.next_free = index;
        self.free_len += 1;
        log::trace!("freed {}", entity);
        Ok(())
    }

    /// Whether the handle is the current occupant of its slot.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        !entity.is_relation()
            && entity.index() != NONE_FREE
            && self.slots.get(entity.index() as usize) == Some(&entity)
    }

    /// The live handle occupying the given slot, if any.
    pub fn current(&self, index: u32) -> Option<Entity> {
        if index == NONE_FREE {
            return None;
        }
        let entity = *self.slots.get(index as usize)?;
        // a freed slot links to another slot, a retired slot links to none
        (entity.index() == index).then_some(entity)
    }

    /// Returns the number of entities that are currently alive.
    pub fn alive_len(&self) -> usize {
        self.slots.len() - 1 - self.free_len - self.retired_len
    }

    /// Return an iterator over all alive entities, in slot order.
    pub fn alive_iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(index, entity)| entity.index() as usize == *index)
            .map(|(_, entity)| *entity)
    }

    #[cfg(test)]
    pub(crate) fn set_generation(&mut self, entity: Entity, generation: u32) -> Entity {
        let entity = Entity::pack(entity.index(), generation);
        self.slots[entity.index() as usize] = entity;
        entity
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocate_never_hands_out_slot_zero() {
        let mut registry = Registry::default();
        let e = registry.allocate().unwrap();
        assert_eq!(1, e.index());
        assert_eq!(0, e.generation());
        assert!(registry.current(0).is_none());
        assert!(!registry.is_alive(Entity::from_bits(0)));
    }

    #[test]
    fn recycles_lifo_with_bumped_generation() {
        let mut registry = Registry::default();
        let a = registry.allocate().unwrap();
        let b = registry.allocate().unwrap();
        let c = registry.allocate().unwrap();
        registry.free(a).unwrap();
        registry.free(c).unwrap();
        assert_eq!(1, registry.alive_len());

        let c2 = registry.allocate().unwrap();
        assert_eq!(c.index(), c2.index());
        assert_eq!(1, c2.generation());
        let a2 = registry.allocate().unwrap();
        assert_eq!(a.index(), a2.index());
        assert_eq!(1, a2.generation());

        // free list is exhausted, so this one is new
        let d = registry.allocate().unwrap();
        assert_eq!(4, d.index());

        assert!(registry.is_alive(b));
        assert!(!registry.is_alive(a));
        assert!(!registry.is_alive(c));
        assert_eq!(vec![a2, b, c2, d], registry.alive_iter().collect::<Vec<_>>());
        assert_eq!(4, registry.alive_len());
    }

    #[test]
    fn double_free_is_stale() {
        let mut registry = Registry::default();
        let a = registry.allocate().unwrap();
        registry.free(a).unwrap();
        assert_eq!(Err(Error::StaleHandle(a)), registry.free(a));
        // the free list must be intact
        let a2 = registry.allocate().unwrap();
        assert_eq!(a.index(), a2.index());
        assert_eq!(2, registry.allocate().unwrap().index());
    }

    #[test]
    fn current_resolves_only_live_slots() {
        let mut registry = Registry::default();
        let a = registry.allocate().unwrap();
        let b = registry.allocate().unwrap();
        assert_eq!(Some(a), registry.current(a.index()));
        registry.free(a).unwrap();
        registry.free(b).unwrap();
        // slot b now links to slot a, slot a links to none
        assert_eq!(None, registry.current(a.index()));
        assert_eq!(None, registry.current(b.index()));
        assert_eq!(None, registry.current(99));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut registry = Registry::new(2, 2);
        let a = registry.allocate().unwrap();
        let _b = registry.allocate().unwrap();
        assert_eq!(
            Err(Error::CapacityExceeded { limit: 2 }),
            registry.allocate()
        );
        registry.free(a).unwrap();
        assert!(registry.allocate().is_ok());
    }

    #[test]
    fn exhausted_generation_retires_slot() {
        let mut registry = Registry::default();
        let a = registry.allocate().unwrap();
        let a = registry.set_generation(a, GENERATION_LIMIT);
        assert!(registry.is_alive(a));
        registry.free(a).unwrap();
        assert!(!registry.is_alive(a));
        assert_eq!(0, registry.alive_len());
        assert_eq!(None, registry.current(a.index()));

        let b = registry.allocate().unwrap();
        assert_ne!(a.index(), b.index());
    }
}
