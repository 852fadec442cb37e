//! An archetype entity-component store where components are entities.
//!
//! Entities are generational [`Entity`] handles handed out by a
//! [`Registry`]. Any entity can be attached to another as a component;
//! storable components carry a payload while tags carry nothing. Entities
//! with the same set of components share an
//! [`Archetype`](archetype::Archetype), and moves between archetypes are
//! cached as [`Edge`](archetype::Edge)s so each distinct transition is only
//! resolved once.
mod config;
mod entity;
mod error;
mod registry;
mod world;

pub mod archetype;

pub use config::*;
pub use entity::*;
pub use error::*;
pub use registry::*;
pub use world::*;
