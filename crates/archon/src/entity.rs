//! Entity handles.
//!
//! An [`Entity`] is a 64 bit value. The low half is the slot index, the high
//! half is the generation of that slot at the time the handle was issued.
//!
//! Relations reuse the same 64 bits to pack a `(kind, target)` pair. The top
//! bit of the high half marks the value as a relation and the top bit of the
//! low half marks the relation as exclusive. Slots and generations are both
//! limited to 31 bits so these flags never collide with a plain handle.

/// The largest number of slots a [`Registry`](crate::Registry) may hand out.
///
/// 31 bits can be used without interfering with the relation flags.
pub const ENTITY_LIMIT: u32 = 0x7fff_ffff;

/// The largest generation a slot may reach before it is retired.
pub const GENERATION_LIMIT: u32 = 0x7fff_ffff;

const BOTTOM: u64 = 0xffff_ffff;
const HALF: u32 = 32;
const FLAG: u32 = 0x8000_0000;

/// An opaque handle to an entity, a component or a relation.
///
/// Components are entities, so a component id is simply another `Entity`.
/// Handles are ordered by their raw bits, which is the order used to
/// canonicalize [`Signature`](crate::archetype::Signature)s.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity(u64);

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_relation() {
            f.debug_struct("Relation")
                .field("kind", &self.relation_kind())
                .field("target", &self.relation_target())
                .field("exclusive", &self.is_exclusive())
                .finish()
        } else {
            f.debug_struct("Entity")
                .field("index", &self.index())
                .field("gen", &self.generation())
                .finish()
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_relation() {
            write!(f, "({}, {})", self.relation_kind(), self.relation_target())?;
            if self.is_exclusive() {
                write!(f, "!")?;
            }
            Ok(())
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

impl From<Entity> for u64 {
    fn from(entity: Entity) -> Self {
        entity.0
    }
}

impl Entity {
    /// Pack a slot index and generation into a handle.
    #[inline]
    pub const fn pack(index: u32, generation: u32) -> Self {
        Entity(index as u64 | (generation as u64) << HALF)
    }

    /// Reconstruct a handle from its raw bits.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Entity(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// The low half: the slot index of a plain handle.
    #[inline]
    pub const fn index(self) -> u32 {
        (self.0 & BOTTOM) as u32
    }

    /// The high half: the generation of a plain handle.
    #[inline]
    pub const fn generation(self) -> u32 {
        (self.0 >> HALF) as u32
    }

    /// Pack a relation between `kind` and `target`.
    ///
    /// Only the slot indices of `kind` and `target` survive the packing, so a
    /// relation names slots, not generations. Whether those slots are still
    /// occupied by the same entities is checked by the
    /// [`World`](crate::World).
    pub const fn relation(kind: Entity, target: Entity, exclusive: bool) -> Self {
        let kind = kind.index() & ENTITY_LIMIT;
        let target = target.index() & ENTITY_LIMIT;
        if exclusive {
            Entity::pack(kind | FLAG, target | FLAG)
        } else {
            Entity::pack(kind, target | FLAG)
        }
    }

    /// Whether this value denotes a `(kind, target)` relation.
    #[inline]
    pub const fn is_relation(self) -> bool {
        self.generation() & FLAG != 0
    }

    /// Whether this relation was packed as exclusive.
    ///
    /// Always `false` for plain handles.
    #[inline]
    pub const fn is_exclusive(self) -> bool {
        self.is_relation() && self.index() & FLAG != 0
    }

    /// The slot index of the relation's kind.
    #[inline]
    pub const fn relation_kind(self) -> u32 {
        self.index() & ENTITY_LIMIT
    }

    /// The slot index of the relation's target.
    #[inline]
    pub const fn relation_target(self) -> u32 {
        self.generation() & ENTITY_LIMIT
    }
}
