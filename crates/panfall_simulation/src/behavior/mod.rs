//! Behavior state machine module.
//!
//! The machine exclusively owns agent flags and timers; perception and
//! locomotion are pure queries/outputs. System order per fixed tick:
//! 1. validate_agents — configuration checks for newly spawned agents
//! 2. behavior_transitions — precedence-ordered state transitions
//! 3. behavior_drive — state -> velocity/rotation/animator writes
//! 4. stuck_recovery — stall detection and forced re-transition
//! 5. locomotion — gravity, speed cap, headless integration, body anim

use bevy::prelude::*;

pub mod drive;
pub mod state;
pub mod stuck;
pub mod transitions;

pub use state::{
    enter_chase, enter_patrol, BehaviorConfig, BehaviorState, MovementGate, StuckMonitor,
};

use crate::animation::AnimatorSink;
use crate::components::{Agent, BehaviorDisabled, PhysicsBody};
use crate::locomotion;
use crate::logger::{log_error, log_warning};

/// System: validate required/optional references on freshly spawned agents.
///
/// No physics body is a fatal configuration error: the agent's behavior
/// machine is disabled entirely. A missing animator sink only degrades —
/// animation writes are skipped.
pub fn validate_agents(
    mut commands: Commands,
    query: Query<
        (Entity, Option<&PhysicsBody>, Option<&AnimatorSink>),
        (With<Agent>, Added<BehaviorState>),
    >,
) {
    for (entity, body, sink) in query.iter() {
        if body.is_none() {
            log_error(&format!(
                "agent {:?} has no physics body, behavior disabled",
                entity
            ));
            commands.entity(entity).insert(BehaviorDisabled);
            continue;
        }
        if sink.is_none() {
            log_warning(&format!(
                "agent {:?} has no animator sink, animation writes will be skipped",
                entity
            ));
        }
    }
}

/// Behavior plugin: registers the state machine and locomotion systems in
/// `FixedUpdate`, chained for determinism.
pub struct BehaviorPlugin;

impl Plugin for BehaviorPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<crate::events::ContactEvent>();

        app.add_systems(
            FixedUpdate,
            (
                validate_agents,
                locomotion::ground_detection,
                transitions::behavior_transitions,
                drive::behavior_drive,
                stuck::stuck_recovery,
                locomotion::apply_gravity,
                clamp_agent_speed,
                locomotion::integrate_velocity,
                locomotion::sync_body_animation,
            )
                .chain(),
        );
    }
}

/// System: enforce the horizontal speed cap after all velocity writes.
pub fn clamp_agent_speed(mut query: Query<(&BehaviorConfig, &mut PhysicsBody)>) {
    for (config, mut body) in query.iter_mut() {
        // The roll dash is allowed to exceed the locomotion cap.
        let cap = config.max_speed.max(config.roll_speed);
        locomotion::clamp_horizontal(&mut body, cap);
    }
}
