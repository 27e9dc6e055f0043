//! Perception queries: detection bounds, distance, view angle.
//!
//! These are pure helpers over positions and orientations so they are easy
//! to test and never touch agent state. Both the agent and the target move
//! every tick, so callers recompute samples each tick instead of caching.

use bevy::prelude::*;

/// Axis-aligned detection volume.
///
/// Containment flattens the vertical axis: the test volume is re-centered
/// on the queried point's height and one unit tall, so detection is a
/// horizontal-extent check regardless of elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    pub fn contains(&self, point: Vec3) -> bool {
        let half_x = self.size.x / 2.0;
        let half_z = self.size.z / 2.0;
        (point.x - self.center.x).abs() <= half_x && (point.z - self.center.z).abs() <= half_z
    }
}

/// One tick's worth of perception for an agent/target pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceptionSample {
    pub in_range: bool,
    pub distance: f32,
    /// View angle in degrees (0-180) against the horizontal forward axis.
    /// `None` when the direction degenerates (target directly above/below
    /// or coincident) — callers skip angle-dependent checks that tick.
    pub angle: Option<f32>,
}

/// Horizontal (XZ) distance between two points.
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    (dx * dx + dz * dz).sqrt()
}

/// Angle in degrees between `forward` and the direction from `from` to
/// `to`, both projected onto the horizontal plane.
pub fn angle_to(forward: Vec3, from: Vec3, to: Vec3) -> Option<f32> {
    let dir = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    let fwd = Vec3::new(forward.x, 0.0, forward.z);
    if dir.length_squared() < 1e-8 || fwd.length_squared() < 1e-8 {
        return None;
    }
    let cos = dir.normalize().dot(fwd.normalize()).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Full perception sample for one agent/target pair.
pub fn sample(agent_pos: Vec3, agent_forward: Vec3, target_pos: Vec3, bounds: Bounds) -> PerceptionSample {
    PerceptionSample {
        in_range: bounds.contains(target_pos),
        distance: agent_pos.distance(target_pos),
        angle: angle_to(agent_forward, agent_pos, target_pos),
    }
}
