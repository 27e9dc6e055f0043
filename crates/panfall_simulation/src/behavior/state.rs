//! Behavior state machine data: states, tuning, transition gates.

use bevy::prelude::*;

/// Behavior state of an agent, one locomotion-significant routine at a
/// time. Per-routine timers live inside the variant, so replacing the value
/// is also the cancellation of every pending wait from the previous
/// routine — there is nothing left to resurrect an old state.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub enum BehaviorState {
    /// Patrol leg. `target` is `None` until the next random destination is
    /// rolled.
    Patrol { target: Option<Vec3> },

    /// Standing at a patrol point for a randomized duration.
    Wait { timer: f32 },

    /// Pursuing the chase target. `chase_timer` accumulates only while
    /// actually chasing (not attacking, not gated) and feeds the
    /// time-based roll-attack trigger.
    Chase { chase_timer: f32 },

    /// Stationary attack: turn to face the target over a fixed window,
    /// then hold the attack for its animation duration.
    Attack {
        /// Elapsed facing time, up to `BehaviorConfig::attack_rotate_time`.
        rotate_timer: f32,
        /// Remaining hold once facing completes.
        hold_timer: f32,
        from: Quat,
        to: Quat,
    },

    /// Committed forward dash toward a projected floor point (or straight
    /// ahead when no probe was available).
    RollAttack {
        elapsed: f32,
        destination: Option<Vec3>,
        bounces_left: u32,
    },
}

impl Default for BehaviorState {
    fn default() -> Self {
        Self::Patrol { target: None }
    }
}

impl BehaviorState {
    /// In a committed attack routine (normal or roll).
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Attack { .. } | Self::RollAttack { .. })
    }

    pub fn is_chasing(&self) -> bool {
        matches!(self, Self::Chase { .. })
    }

    /// A state that is expected to produce horizontal displacement, i.e.
    /// where stuck detection applies.
    pub fn expects_movement(&self) -> bool {
        matches!(self, Self::Patrol { target: Some(_) } | Self::Chase { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Patrol { .. } => "Patrol",
            Self::Wait { .. } => "Wait",
            Self::Chase { .. } => "Chase",
            Self::Attack { .. } => "Attack",
            Self::RollAttack { .. } => "RollAttack",
        }
    }
}

/// Orthogonal movement gate: suppresses locomotion right after a state
/// transition so the wind-up animation can play, then suppresses stuck
/// detection for a short grace window once movement is allowed again.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MovementGate {
    /// Remaining delay before the body may move.
    pub start_delay: f32,
    /// Remaining stuck-detection grace after the delay elapsed.
    pub stuck_grace: f32,
    /// Grace to arm once the current delay runs out.
    pending_grace: f32,
}

impl MovementGate {
    /// Arms the post-transition delay (and the grace window behind it).
    pub fn arm(&mut self, delay: f32, grace: f32) {
        self.start_delay = delay;
        self.stuck_grace = 0.0;
        self.pending_grace = grace;
    }

    /// Cancels any pending delay without granting a grace window.
    pub fn clear(&mut self) {
        self.start_delay = 0.0;
        self.stuck_grace = 0.0;
        self.pending_grace = 0.0;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.start_delay > 0.0 {
            self.start_delay -= dt;
            if self.start_delay <= 0.0 {
                self.start_delay = 0.0;
                self.stuck_grace = self.pending_grace;
                self.pending_grace = 0.0;
            }
        } else if self.stuck_grace > 0.0 {
            self.stuck_grace = (self.stuck_grace - dt).max(0.0);
        }
    }

    /// Locomotion allowed.
    pub fn is_open(&self) -> bool {
        self.start_delay <= 0.0
    }

    /// Stuck detection suppressed (still delayed, or inside grace).
    pub fn in_grace(&self) -> bool {
        self.start_delay > 0.0 || self.stuck_grace > 0.0
    }
}

/// Accumulated low-speed time for stuck recovery.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct StuckMonitor {
    pub timer: f32,
}

/// Behavior tuning for one agent.
#[derive(Component, Debug, Clone, Copy, Reflect, serde::Serialize, serde::Deserialize)]
#[reflect(Component)]
pub struct BehaviorConfig {
    /// Patrol/chase movement speed (m/s).
    pub move_speed: f32,
    /// Horizontal speed cap after all velocity writes.
    pub max_speed: f32,
    /// Fraction of ground authority available while airborne.
    pub air_control_factor: f32,
    /// Turn rate while idle/patrolling.
    pub base_rotation_speed: f32,
    /// Turn rate while chasing.
    pub chase_rotation_speed: f32,
    /// Patrol wait window (uniform random).
    pub min_wait_time: f32,
    pub max_wait_time: f32,
    /// Locomotion suppression after every transition.
    pub movement_start_delay: f32,
    /// Stuck-detection suppression after the delay elapses.
    pub stuck_grace_period: f32,
    /// Patrol arrival radius (flat distance).
    pub arrive_radius: f32,

    /// Normal attack trigger distance.
    pub attack_range: f32,
    /// Full attack cone in degrees; the trigger uses half of it.
    pub attack_angle_threshold: f32,
    /// Time spent turning to face the target at attack start.
    pub attack_rotate_time: f32,
    /// Attack animation hold.
    pub attack_hold_time: f32,

    /// Roll trigger: minimum distance for the distance-based path.
    pub roll_min_distance: f32,
    /// Roll trigger: continuous chase time for the timer-based path.
    pub chase_duration_for_roll: f32,
    /// Forward dash speed.
    pub roll_speed: f32,
    /// Hard upper bound on one roll.
    pub roll_max_duration: f32,
    /// Arrival radius at the projected destination.
    pub roll_stop_radius: f32,
    /// Re-aim budget when the destination is reached with the target still
    /// away.
    pub roll_bounces: u32,

    /// Horizontal speed below which the agent counts as stalled.
    pub stuck_threshold: f32,
    /// Continuous stall time that forces a re-transition.
    pub max_stuck_time: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            max_speed: 10.0,
            air_control_factor: 0.2,
            base_rotation_speed: 2.0,
            chase_rotation_speed: 5.0,
            min_wait_time: 1.0,
            max_wait_time: 3.0,
            movement_start_delay: 0.5,
            stuck_grace_period: 0.2,
            arrive_radius: 0.5,
            attack_range: 2.0,
            attack_angle_threshold: 30.0,
            attack_rotate_time: 0.2,
            attack_hold_time: 1.0,
            roll_min_distance: 10.0,
            chase_duration_for_roll: 10.0,
            roll_speed: 15.0,
            roll_max_duration: 3.0,
            roll_stop_radius: 1.0,
            roll_bounces: 2,
            stuck_threshold: 0.05,
            max_stuck_time: 1.5,
        }
    }
}

/// Transition: enter Chase. Cancels whatever ran before, zeroes the chase
/// timer, arms the movement gate.
pub fn enter_chase(
    state: &mut BehaviorState,
    gate: &mut MovementGate,
    monitor: &mut StuckMonitor,
    config: &BehaviorConfig,
) {
    *state = BehaviorState::Chase { chase_timer: 0.0 };
    gate.arm(config.movement_start_delay, config.stuck_grace_period);
    monitor.timer = 0.0;
}

/// Transition: enter Patrol. The next tick rolls a fresh destination and
/// arms its own gate.
pub fn enter_patrol(state: &mut BehaviorState, gate: &mut MovementGate, monitor: &mut StuckMonitor) {
    *state = BehaviorState::Patrol { target: None };
    gate.clear();
    monitor.timer = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_patrol() {
        assert_eq!(BehaviorState::default(), BehaviorState::Patrol { target: None });
    }

    #[test]
    fn test_committed_states() {
        assert!(BehaviorState::RollAttack {
            elapsed: 0.0,
            destination: None,
            bounces_left: 0
        }
        .is_committed());
        assert!(!BehaviorState::Chase { chase_timer: 5.0 }.is_committed());
        assert!(!BehaviorState::Wait { timer: 1.0 }.is_committed());
    }

    #[test]
    fn test_gate_delay_then_grace() {
        let mut gate = MovementGate::default();
        gate.arm(0.5, 0.2);
        assert!(!gate.is_open());
        assert!(gate.in_grace());

        // Tick through the delay.
        for _ in 0..30 {
            gate.tick(1.0 / 60.0);
        }
        assert!(gate.is_open());
        // Grace window now runs.
        assert!(gate.in_grace());

        for _ in 0..13 {
            gate.tick(1.0 / 60.0);
        }
        assert!(gate.is_open());
        assert!(!gate.in_grace());
    }

    #[test]
    fn test_enter_chase_cancels_wait_timer() {
        let mut state = BehaviorState::Wait { timer: 2.5 };
        let mut gate = MovementGate::default();
        let mut monitor = StuckMonitor { timer: 1.0 };
        let config = BehaviorConfig::default();

        enter_chase(&mut state, &mut gate, &mut monitor, &config);

        // The pending wait timer is gone with the old state value.
        assert_eq!(state, BehaviorState::Chase { chase_timer: 0.0 });
        assert_eq!(monitor.timer, 0.0);
        assert!(!gate.is_open());
    }
}
