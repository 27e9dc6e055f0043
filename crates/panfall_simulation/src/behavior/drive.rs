//! Behavior outputs: velocity, rotation, and animation parameters.
//!
//! Reads the state machine and writes locomotion commands; it never
//! mutates behavior state or timers (those belong to `transitions`).

use bevy::prelude::*;

use crate::animation::{AnimParam, AnimatorSink};
use crate::behavior::state::{BehaviorConfig, BehaviorState, MovementGate};
use crate::components::{
    Agent, BehaviorDisabled, ChaseTarget, GroundSensor, MovementToggle, PhysicsBody,
};
use crate::locomotion;

/// System: convert the behavior state into body and animator writes.
pub fn behavior_drive(
    mut agents: Query<
        (
            &BehaviorState,
            &BehaviorConfig,
            &MovementGate,
            &ChaseTarget,
            &MovementToggle,
            &GroundSensor,
            &mut PhysicsBody,
            &mut Transform,
            Option<&mut AnimatorSink>,
        ),
        (With<Agent>, Without<BehaviorDisabled>),
    >,
    targets: Query<&Transform, Without<Agent>>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (state, config, gate, chase_target, toggle, sensor, mut body, mut transform, mut sink) in
        agents.iter_mut()
    {
        if !toggle.enabled {
            // No new movement input; knockback and momentum stay with the
            // physics body untouched.
            write_anim(&mut sink, false, false, false);
            continue;
        }

        match state {
            BehaviorState::RollAttack { destination, .. } => {
                // Committed dash: toward the projected point, or straight
                // ahead when the probe missed at entry.
                let dir = destination
                    .map(|d| Vec3::new(d.x - transform.translation.x, 0.0, d.z - transform.translation.z))
                    .filter(|d| d.length_squared() > 1e-8)
                    .map(|d| d.normalize())
                    .unwrap_or_else(|| {
                        let f = *transform.forward();
                        Vec3::new(f.x, 0.0, f.z).normalize_or_zero()
                    });
                body.velocity.x = dir.x * config.roll_speed;
                body.velocity.z = dir.z * config.roll_speed;
                write_anim(&mut sink, false, false, true);
            }

            BehaviorState::Patrol { target: Some(dest) } if gate.is_open() => {
                let dir = locomotion::move_toward(
                    &mut body,
                    sensor.grounded,
                    transform.translation,
                    *dest,
                    config.move_speed,
                    config.air_control_factor,
                    dt,
                );
                if let Some(dir) = dir {
                    locomotion::face_direction(&mut transform, dir, config.base_rotation_speed, dt);
                }
                write_anim(&mut sink, true, false, false);
            }

            BehaviorState::Chase { .. } if gate.is_open() => {
                let target_pos = chase_target
                    .entity
                    .and_then(|e| targets.get(e).ok())
                    .map(|t| t.translation);
                let Some(tp) = target_pos else {
                    locomotion::halt_horizontal(&mut body);
                    write_anim(&mut sink, false, false, false);
                    continue;
                };
                // Chase locks onto the target's XZ position at our height.
                let dest = Vec3::new(tp.x, transform.translation.y, tp.z);
                let dir = locomotion::move_toward(
                    &mut body,
                    sensor.grounded,
                    transform.translation,
                    dest,
                    config.move_speed,
                    config.air_control_factor,
                    dt,
                );
                if let Some(dir) = dir {
                    locomotion::face_direction(&mut transform, dir, config.chase_rotation_speed, dt);
                }
                write_anim(&mut sink, true, false, false);
            }

            BehaviorState::Attack {
                rotate_timer,
                from,
                to,
                ..
            } => {
                // Frozen in place; only the facing interpolation runs.
                locomotion::halt_horizontal(&mut body);
                let t = (rotate_timer / config.attack_rotate_time).clamp(0.0, 1.0);
                transform.rotation = from.slerp(*to, t);
                write_anim(&mut sink, false, true, false);
            }

            // Wait, gated Patrol/Chase, or Patrol with no destination yet.
            _ => {
                locomotion::halt_horizontal(&mut body);
                write_anim(&mut sink, false, false, false);
            }
        }
    }
}

fn write_anim(
    sink: &mut Option<Mut<AnimatorSink>>,
    walking: bool,
    attacking: bool,
    rolling: bool,
) {
    if let Some(sink) = sink.as_mut() {
        sink.set_bool(AnimParam::Walking, walking);
        sink.set_bool(AnimParam::Attacking, attacking);
        sink.set_bool(AnimParam::RollingAttack, rolling);
    }
}
