//! Stuck recovery.
//!
//! While a movement-expecting state is active, horizontal speed below the
//! threshold accumulates stall time; past the limit the agent is forced
//! through a hard re-transition. The movement gate's grace window keeps the
//! zero-velocity frames right after a transition from counting as a stall.

use bevy::prelude::*;

use crate::behavior::state::{
    enter_chase, enter_patrol, BehaviorConfig, BehaviorState, MovementGate, StuckMonitor,
};
use crate::components::{
    Agent, BehaviorDisabled, ChaseTarget, CombatState, PatrolArea, PhysicsBody,
};
use crate::logger::log;

/// System: stall detection and forced re-transition.
pub fn stuck_recovery(
    mut agents: Query<
        (
            Entity,
            &mut BehaviorState,
            &BehaviorConfig,
            &mut MovementGate,
            &mut StuckMonitor,
            &PhysicsBody,
            &PatrolArea,
            &ChaseTarget,
            &Transform,
            Option<&CombatState>,
        ),
        (With<Agent>, Without<BehaviorDisabled>),
    >,
    targets: Query<&Transform, Without<Agent>>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (
        entity,
        mut state,
        config,
        mut gate,
        mut monitor,
        body,
        area,
        chase_target,
        transform,
        combat,
    ) in agents.iter_mut()
    {
        let monitored = state.expects_movement()
            && gate.is_open()
            && !gate.in_grace()
            && !combat.is_some_and(|c| c.dead);
        if !monitored {
            monitor.timer = 0.0;
            continue;
        }

        let flat_speed_sq = body.flat_velocity().length_squared();
        if flat_speed_sq >= config.stuck_threshold * config.stuck_threshold {
            monitor.timer = 0.0;
            continue;
        }

        monitor.timer += dt;
        if monitor.timer < config.max_stuck_time {
            continue;
        }

        log(&format!(
            "behavior: {:?} stuck at {:?} during {}, forcing re-transition",
            entity,
            transform.translation,
            state.name()
        ));
        monitor.timer = 0.0;

        let target_in_bounds = chase_target
            .entity
            .and_then(|e| targets.get(e).ok())
            .map(|t| area.contains(t.translation))
            .unwrap_or(false);

        if target_in_bounds {
            enter_chase(&mut state, &mut gate, &mut monitor, config);
        } else {
            enter_patrol(&mut state, &mut gate, &mut monitor);
        }
    }
}
