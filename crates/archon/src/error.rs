//! Errors surfaced by the registry and the world.
use crate::{archetype::Signature, Entity};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("the registry cannot hand out more than {limit} entities")]
    CapacityExceeded { limit: u32 },

    #[error("{0} is not alive")]
    StaleHandle(Entity),

    #[error("{entity} has no {component}")]
    MissingComponent { entity: Entity, component: Entity },

    #[error("{0} is a tag and cannot store data")]
    NotStorable(Entity),

    #[error("{component} does not store a '{expected}'")]
    TypeMismatch {
        component: Entity,
        expected: &'static str,
    },

    #[error("{0} is already part of an archetype, its storage flags are fixed")]
    ComponentInUse(Entity),

    #[error("{0} is reserved by the world and cannot be despawned")]
    Reserved(Entity),

    #[error("more than one archetype exists for signature {0:?}")]
    DuplicateEdgeConflict(Signature),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
