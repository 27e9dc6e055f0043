//! Locomotion: velocity commands, rotation smoothing, headless integration.
//!
//! Grounded movement overwrites the horizontal velocity (the vertical
//! component is left to gravity); airborne movement only adds acceleration
//! scaled by the air-control factor so existing momentum survives. The
//! engine bridge consumes `PhysicsBody::velocity` in an engine build; the
//! headless integrator below applies it to the transform directly.

use bevy::prelude::*;

use crate::animation::{AnimParam, AnimatorSink};
use crate::components::{GroundSensor, PhysicsBody};

pub const GRAVITY: f32 = -9.81;

/// Vertical dead zone for the falling/ascending animation flags.
const VERTICAL_EPSILON: f32 = 0.1;

/// Drives the body toward `target` at `speed`. Returns the (horizontal)
/// travel direction, or `None` when it degenerates — the caller skips
/// rotation for that tick.
pub fn move_toward(
    body: &mut PhysicsBody,
    grounded: bool,
    current: Vec3,
    target: Vec3,
    speed: f32,
    air_control: f32,
    dt: f32,
) -> Option<Vec3> {
    let dir = Vec3::new(target.x - current.x, 0.0, target.z - current.z);
    if dir.length_squared() < 1e-8 {
        return None;
    }
    let dir = dir.normalize();

    if grounded {
        body.velocity.x = dir.x * speed;
        body.velocity.z = dir.z * speed;
    } else {
        body.velocity += dir * air_control * speed * dt;
    }
    Some(dir)
}

/// Zeroes horizontal velocity, preserving the gravity component.
pub fn halt_horizontal(body: &mut PhysicsBody) {
    body.velocity.x = 0.0;
    body.velocity.z = 0.0;
}

/// Clamps horizontal speed to `max_speed` after all velocity writes.
pub fn clamp_horizontal(body: &mut PhysicsBody, max_speed: f32) {
    let flat = body.flat_velocity();
    let speed = flat.length();
    if speed > max_speed {
        let clamped = flat * (max_speed / speed);
        body.velocity.x = clamped.x;
        body.velocity.z = clamped.z;
    }
}

/// Yaw-only rotation facing a horizontal direction. `None` when the
/// direction has no horizontal component.
pub fn yaw_toward(dir: Vec3) -> Option<Quat> {
    let flat = Vec3::new(dir.x, 0.0, dir.z);
    if flat.length_squared() < 1e-8 {
        return None;
    }
    let d = flat.normalize();
    // Bevy forward is -Z.
    Some(Quat::from_rotation_y((-d.x).atan2(-d.z)))
}

/// Smoothed turn toward `dir` at `rate` (higher while chasing).
pub fn face_direction(transform: &mut Transform, dir: Vec3, rate: f32, dt: f32) {
    if let Some(target) = yaw_toward(dir) {
        transform.rotation = transform.rotation.slerp(target, (rate * dt).min(1.0));
    }
}

/// System: gravity accumulation while airborne.
pub fn apply_gravity(mut query: Query<(&GroundSensor, &mut PhysicsBody)>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for (sensor, mut body) in query.iter_mut() {
        if !sensor.grounded {
            body.velocity.y += GRAVITY * delta;
        } else if body.velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }
    }
}

/// System: headless ground check.
///
/// Stands in for the bridge boxcast: grounded when the transform sits near
/// the floor plane at y = 0.
pub fn ground_detection(mut query: Query<(&Transform, &mut GroundSensor)>) {
    for (transform, mut sensor) in query.iter_mut() {
        sensor.grounded = transform.translation.y <= 0.5;
    }
}

/// System: velocity -> transform integration (headless, no physics solver).
pub fn integrate_velocity(
    mut query: Query<(&PhysicsBody, &mut Transform)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    for (body, mut transform) in query.iter_mut() {
        transform.translation += body.velocity * delta;
        if transform.translation.y < 0.0 {
            transform.translation.y = 0.0;
        }
    }
}

/// System: vertical-motion animation parameters.
///
/// Writes `Grounded`, `VerticalSpeed`, and the falling/ascending flags with
/// a small dead zone so hover jitter does not flip them.
pub fn sync_body_animation(
    mut query: Query<(&PhysicsBody, &GroundSensor, &mut AnimatorSink)>,
) {
    for (body, sensor, mut sink) in query.iter_mut() {
        sink.set_bool(AnimParam::Grounded, sensor.grounded);
        sink.set_float(AnimParam::VerticalSpeed, body.velocity.y);
        if sensor.grounded {
            sink.set_bool(AnimParam::Falling, false);
            sink.set_bool(AnimParam::Ascending, false);
        } else {
            sink.set_bool(AnimParam::Falling, body.velocity.y < -VERTICAL_EPSILON);
            sink.set_bool(AnimParam::Ascending, body.velocity.y > VERTICAL_EPSILON);
        }
    }
}
