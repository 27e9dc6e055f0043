//! Engine-facing events.
//!
//! The bridge translates the engine's collision/trigger callbacks into
//! `ContactEvent`s each physics step. Headless tests write them directly.

use bevy::prelude::*;

/// A collision or trigger contact reported by the engine.
#[derive(Event, Debug, Clone)]
pub struct ContactEvent {
    /// The simulated entity that was touched.
    pub entity: Entity,
    /// The other party, when it maps to a simulated entity.
    pub other: Option<Entity>,
    /// Contact point in world space.
    pub point: Vec3,
    /// Engine collision layer of the other party.
    pub layer: u32,
}
