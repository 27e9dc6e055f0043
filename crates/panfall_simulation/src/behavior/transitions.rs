//! Behavior state machine transitions.
//!
//! One system owns every flag and timer mutation; perception and
//! locomotion are queries/outputs only. Transitions are evaluated once per
//! tick in a fixed precedence order:
//!
//! 1. No target -> force Patrol, everything cancelled.
//! 2. Target inside the detection bounds while uncommitted -> Chase.
//! 3. Chase timer accumulates (chasing, ungated only).
//! 4. Roll trigger by distance or by accumulated chase time.
//! 5. Attack trigger by range + view cone; losing the cone cancels the
//!    attack immediately.
//! 6. Target leaving the bounds while engaged -> Patrol.
//! 7. Patrol loop: random destination, arrive, randomized wait, re-check.
//! 8. Roll termination: collision with a non-target, destination/bounce
//!    plan exhausted, or the duration cap.

use bevy::prelude::*;
use rand::Rng;

use crate::behavior::state::{
    enter_chase, enter_patrol, BehaviorConfig, BehaviorState, MovementGate, StuckMonitor,
};
use crate::components::{
    Agent, BehaviorDisabled, ChaseTarget, CombatState, GroundProbe, PatrolArea,
};
use crate::events::ContactEvent;
use crate::locomotion::yaw_toward;
use crate::logger::log;
use crate::perception::{self, PerceptionSample};
use crate::DeterministicRng;

/// System: per-tick behavior transition evaluation.
pub fn behavior_transitions(
    mut agents: Query<
        (
            Entity,
            &mut BehaviorState,
            &BehaviorConfig,
            &mut MovementGate,
            &mut StuckMonitor,
            &mut Transform,
            &PatrolArea,
            &ChaseTarget,
            Option<&GroundProbe>,
            Option<&CombatState>,
        ),
        (With<Agent>, Without<BehaviorDisabled>),
    >,
    targets: Query<&Transform, Without<Agent>>,
    mut contacts: EventReader<ContactEvent>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();
    let contacts: Vec<ContactEvent> = contacts.read().cloned().collect();

    for (
        entity,
        mut state,
        config,
        mut gate,
        mut monitor,
        mut transform,
        area,
        chase_target,
        probe,
        combat,
    ) in agents.iter_mut()
    {
        gate.tick(dt);

        // Dead agents keep their state frozen until respawn.
        if combat.is_some_and(|c| c.dead) {
            continue;
        }

        let target_pos = chase_target
            .entity
            .and_then(|e| targets.get(e).ok())
            .map(|t| t.translation);

        let sample = target_pos.map(|tp| {
            perception::sample(transform.translation, *transform.forward(), tp, area.bounds())
        });
        let in_bounds = sample.is_some_and(|s| s.in_range);

        // Precedence 1/6: nothing to hunt, or the target left the bounds
        // while we were engaged.
        if !in_bounds && (state.is_chasing() || state.is_committed()) {
            log(&format!(
                "behavior: {:?} {} -> Patrol (target gone)",
                entity,
                state.name()
            ));
            enter_patrol(&mut state, &mut gate, &mut monitor);
            continue;
        }

        // Precedence 2: the target is in range and we are not yet engaged.
        if in_bounds && !state.is_chasing() && !state.is_committed() {
            log(&format!(
                "behavior: {:?} {} -> Chase (target detected)",
                entity,
                state.name()
            ));
            enter_chase(&mut state, &mut gate, &mut monitor, config);
            continue;
        }

        let prev = state.clone();
        match prev {
            BehaviorState::Chase { chase_timer } => {
                // Reached only while in bounds (precedence 1/6 above).
                let s = sample.unwrap_or(PerceptionSample {
                    in_range: false,
                    distance: f32::INFINITY,
                    angle: None,
                });
                if !gate.is_open() {
                    continue;
                }

                // Precedence 3: the timer runs only while actually chasing.
                let chase_timer = chase_timer + dt;
                *state = BehaviorState::Chase { chase_timer };

                // Precedence 4: roll attack by distance or chase duration.
                let by_distance =
                    s.distance > config.attack_range && s.distance > config.roll_min_distance;
                let by_time = chase_timer >= config.chase_duration_for_roll;
                if by_distance || by_time {
                    start_roll_attack(
                        entity,
                        &mut state,
                        &mut gate,
                        &mut monitor,
                        &mut transform,
                        config,
                        target_pos,
                        probe,
                    );
                    continue;
                }

                // Precedence 5: normal attack needs range and the view cone.
                if s.distance <= config.attack_range {
                    let in_cone = s
                        .angle
                        .is_some_and(|a| a <= config.attack_angle_threshold / 2.0);
                    if in_cone {
                        let from = transform.rotation;
                        let to = target_pos
                            .and_then(|tp| yaw_toward(tp - transform.translation))
                            .unwrap_or(from);
                        log(&format!("behavior: {:?} Chase -> Attack", entity));
                        *state = BehaviorState::Attack {
                            rotate_timer: 0.0,
                            hold_timer: config.attack_hold_time,
                            from,
                            to,
                        };
                        gate.clear();
                        monitor.timer = 0.0;
                    }
                }
            }

            BehaviorState::Attack {
                rotate_timer,
                hold_timer,
                from,
                to,
            } => {
                let s = sample.unwrap_or(PerceptionSample {
                    in_range: false,
                    distance: f32::INFINITY,
                    angle: None,
                });
                let in_cone = s.distance <= config.attack_range
                    && s.angle
                        .is_some_and(|a| a <= config.attack_angle_threshold / 2.0);
                if !in_cone {
                    // Cancel without waiting out the hold timer.
                    log(&format!(
                        "behavior: {:?} Attack cancelled (target out of cone)",
                        entity
                    ));
                    enter_chase(&mut state, &mut gate, &mut monitor, config);
                    continue;
                }

                if rotate_timer < config.attack_rotate_time {
                    *state = BehaviorState::Attack {
                        rotate_timer: rotate_timer + dt,
                        hold_timer,
                        from,
                        to,
                    };
                } else {
                    let hold_timer = hold_timer - dt;
                    if hold_timer <= 0.0 {
                        // Hold done: back to Chase while the target stays in
                        // bounds (it does, or we would have cancelled above).
                        log(&format!("behavior: {:?} Attack -> Chase", entity));
                        enter_chase(&mut state, &mut gate, &mut monitor, config);
                    } else {
                        *state = BehaviorState::Attack {
                            rotate_timer,
                            hold_timer,
                            from,
                            to,
                        };
                    }
                }
            }

            BehaviorState::RollAttack {
                elapsed,
                mut destination,
                mut bounces_left,
            } => {
                let elapsed = elapsed + dt;

                // Precedence 8: collision with anything but the target
                // interrupts the roll.
                let hit_obstacle = contacts.iter().any(|c| {
                    c.entity == entity
                        && (chase_target.entity.is_none() || c.other != chase_target.entity)
                });
                let mut finished = hit_obstacle || elapsed >= config.roll_max_duration;

                if !finished {
                    if let Some(dest) = destination {
                        let arrived = perception::flat_distance(transform.translation, dest)
                            <= config.roll_stop_radius;
                        if arrived {
                            if bounces_left == 0 {
                                finished = true;
                            } else {
                                // Re-aim and re-project. A probe miss means
                                // no reposition: the roll stops here.
                                match (target_pos, probe.and_then(|p| p.point)) {
                                    (Some(tp), Some(point)) => {
                                        if let Some(rot) = yaw_toward(tp - transform.translation) {
                                            transform.rotation = rot;
                                        }
                                        destination = Some(point);
                                        bounces_left -= 1;
                                    }
                                    _ => finished = true,
                                }
                            }
                        }
                    }
                }

                if finished {
                    if in_bounds {
                        log(&format!("behavior: {:?} RollAttack -> Chase", entity));
                        enter_chase(&mut state, &mut gate, &mut monitor, config);
                    } else {
                        log(&format!("behavior: {:?} RollAttack -> Patrol", entity));
                        enter_patrol(&mut state, &mut gate, &mut monitor);
                    }
                } else {
                    *state = BehaviorState::RollAttack {
                        elapsed,
                        destination,
                        bounces_left,
                    };
                }
            }

            // Precedence 7: the patrol loop (target absent or out of bounds).
            BehaviorState::Patrol { target: None } => {
                let dest = random_patrol_point(area, transform.translation.y, &mut rng);
                log(&format!("behavior: {:?} patrol point {:?}", entity, dest));
                *state = BehaviorState::Patrol { target: Some(dest) };
                gate.arm(config.movement_start_delay, config.stuck_grace_period);
            }

            BehaviorState::Patrol { target: Some(dest) } => {
                if gate.is_open()
                    && perception::flat_distance(transform.translation, dest)
                        <= config.arrive_radius
                {
                    let wait = rng
                        .rng
                        .gen_range(config.min_wait_time..=config.max_wait_time);
                    log(&format!(
                        "behavior: {:?} arrived, waiting {:.2}s",
                        entity, wait
                    ));
                    *state = BehaviorState::Wait { timer: wait };
                    monitor.timer = 0.0;
                }
            }

            BehaviorState::Wait { timer } => {
                let timer = timer - dt;
                if timer <= 0.0 {
                    // Bounds re-check happens at the top of the next tick;
                    // here we just queue the next patrol leg.
                    *state = BehaviorState::Patrol { target: None };
                } else {
                    *state = BehaviorState::Wait { timer };
                }
            }
        }
    }
}

/// Roll-attack entry: face the target, aim at the probe-projected floor
/// point when one is available, otherwise dash straight ahead.
#[allow(clippy::too_many_arguments)]
fn start_roll_attack(
    entity: Entity,
    state: &mut BehaviorState,
    gate: &mut MovementGate,
    monitor: &mut StuckMonitor,
    transform: &mut Transform,
    config: &BehaviorConfig,
    target_pos: Option<Vec3>,
    probe: Option<&GroundProbe>,
) {
    if let Some(rot) = target_pos.and_then(|tp| yaw_toward(tp - transform.translation)) {
        transform.rotation = rot;
    }
    let destination = probe.and_then(|p| p.point);
    log(&format!(
        "behavior: {:?} Chase -> RollAttack (destination {:?})",
        entity, destination
    ));
    *state = BehaviorState::RollAttack {
        elapsed: 0.0,
        destination,
        bounces_left: config.roll_bounces,
    };
    // The dash starts immediately; no wind-up gate for rolls.
    gate.clear();
    monitor.timer = 0.0;
}

fn random_patrol_point(area: &PatrolArea, y: f32, rng: &mut DeterministicRng) -> Vec3 {
    let half_x = area.size.x / 2.0;
    let half_z = area.size.z / 2.0;
    let x = rng
        .rng
        .gen_range((area.center.x - half_x)..=(area.center.x + half_x));
    let z = rng
        .rng
        .gen_range((area.center.z - half_z)..=(area.center.z + half_z));
    Vec3::new(x, y, z)
}
