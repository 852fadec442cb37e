//! World configuration.
use crate::entity::ENTITY_LIMIT;

/// What happens to archetypes that can no longer hold any entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArchetypeRetention {
    /// Keep every archetype and edge forever. Transitions stay cached, at
    /// the cost of memory for signatures that will never be reached again.
    Retain,
    /// When a component id is despawned, reclaim every archetype whose
    /// signature contains it.
    #[default]
    ReclaimDead,
}

/// Configuration for a [`World`](crate::World).
/// ```
/// # use archon::*;
/// let world = World::with_config(
///     WorldConfig::default()
///         .with_entity_limit(1024)
///         .with_archetype_retention(ArchetypeRetention::Retain),
/// );
/// assert_eq!(ArchetypeRetention::Retain, world.config().archetype_retention);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig {
    /// The maximum number of entities, components included, that may be
    /// alive at once. The world's own bootstrap components do not count.
    pub entity_limit: u32,
    /// How many entity slots to reserve up front.
    pub entity_capacity: usize,
    pub archetype_retention: ArchetypeRetention,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            entity_limit: ENTITY_LIMIT,
            entity_capacity: 0,
            archetype_retention: ArchetypeRetention::default(),
        }
    }
}

impl WorldConfig {
    pub fn with_entity_limit(mut self, limit: u32) -> Self {
        self.entity_limit = limit.min(ENTITY_LIMIT);
        self
    }

    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    pub fn with_archetype_retention(mut self, retention: ArchetypeRetention) -> Self {
        self.archetype_retention = retention;
        self
    }
}
