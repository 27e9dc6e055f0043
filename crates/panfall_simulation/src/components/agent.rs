//! Agent components: identity, body, engine-fed sensors.
//!
//! The engine bridge owns the real physics scene. It feeds sensor results
//! (ground boxcast, downward raycast under the chase target, contacts) into
//! these components each tick; the simulation only ever writes velocity and
//! rotation back.

use bevy::prelude::*;

use crate::behavior::{BehaviorConfig, BehaviorState, MovementGate, StuckMonitor};
use crate::perception::Bounds;

/// An AI-driven entity (enemy/boss).
///
/// Requires the full behavior bundle so a bare `Agent` spawn is already a
/// working patroller. A `PhysicsBody` is deliberately NOT required: the
/// bridge supplies it, and its absence is the fatal configuration error
/// handled by `validate_agents`.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(
    BehaviorState,
    BehaviorConfig,
    MovementGate,
    StuckMonitor,
    MovementToggle,
    GroundSensor,
    ChaseTarget,
    PatrolArea
)]
pub struct Agent;

/// Marker: behavior machine disabled for this agent.
///
/// Inserted by `validate_agents` when a required reference is missing.
/// All behavior systems filter on `Without<BehaviorDisabled>`.
#[derive(Component, Debug, Default)]
pub struct BehaviorDisabled;

/// Velocity-carrying body. Velocity is integrated into the transform by the
/// headless integrator (or consumed by the bridge in an engine build).
///
/// Invariant: mass > 0.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub velocity: Vec3,
    pub mass: f32,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            mass: 1.0,
        }
    }
}

impl PhysicsBody {
    /// Horizontal (XZ) velocity with the vertical component zeroed.
    pub fn flat_velocity(&self) -> Vec3 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z)
    }

    /// Instantaneous impulse: delta-v = impulse / mass.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.mass;
    }
}

/// Bridge-fed ground contact (downward boxcast in the engine).
///
/// Headless runs fall back to the Y-threshold check in
/// `locomotion::ground_detection`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct GroundSensor {
    pub grounded: bool,
}

/// Bridge-fed downward raycast result under the current chase target.
///
/// Used to project roll-attack destinations onto the floor. `None` means
/// the last cast missed; roll planning treats that as "no reposition".
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct GroundProbe {
    pub point: Option<Vec3>,
}

/// Externally settable movement switch (damage/pause systems flip it).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct MovementToggle {
    pub enabled: bool,
}

impl Default for MovementToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// The entity this agent hunts. `None` (or a despawned entity) forces the
/// agent back into its patrol loop.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ChaseTarget {
    pub entity: Option<Entity>,
}

/// Axis-aligned patrol/detection area. One volume serves as both the
/// random-destination pool and the target-detection range.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PatrolArea {
    pub center: Vec3,
    pub size: Vec3,
}

impl Default for PatrolArea {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            size: Vec3::new(20.0, 1.0, 20.0),
        }
    }
}

impl PatrolArea {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            center: self.center,
            size: self.size,
        }
    }

    /// Whether a world point is inside the detection area (XZ test).
    pub fn contains(&self, point: Vec3) -> bool {
        self.bounds().contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_scales_by_mass() {
        let mut body = PhysicsBody {
            velocity: Vec3::ZERO,
            mass: 2.0,
        };
        body.apply_impulse(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(body.velocity, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_flat_velocity_drops_vertical() {
        let body = PhysicsBody {
            velocity: Vec3::new(1.0, -9.0, 2.0),
            mass: 1.0,
        };
        assert_eq!(body.flat_velocity(), Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_patrol_area_contains_ignores_height() {
        let area = PatrolArea::default();
        assert!(area.contains(Vec3::new(5.0, 40.0, -5.0)));
        assert!(!area.contains(Vec3::new(15.0, 0.0, 0.0)));
    }
}
