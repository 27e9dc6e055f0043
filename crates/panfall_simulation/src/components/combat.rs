//! Combat state components: lives, immunity windows, observable life flags.

use bevy::prelude::*;

/// Remaining lives.
///
/// Invariant: 0 <= current <= max.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Lives {
    pub current: u32,
    pub max: u32,
}

impl Default for Lives {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Lives {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn restore(&mut self) {
        self.current = self.max;
    }
}

/// Observable alive/dead flags for UI and other collaborators.
///
/// Updates are debounced by `CombatConfig::flag_debounce` so the pair never
/// flickers; once the debounce settles, `alive == (lives > 0)` holds.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct LifeFlags {
    pub alive: bool,
    pub dead: bool,
    /// Remaining debounce time since the last flag change.
    pub cooldown: f32,
}

impl Default for LifeFlags {
    fn default() -> Self {
        Self {
            alive: true,
            dead: false,
            cooldown: 0.0,
        }
    }
}

/// Transient combat reaction state: hurt pulse, immunity window, control
/// disable, respawn request. All timers count down in `tick_combat`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct CombatState {
    pub dead: bool,
    pub immune: bool,
    pub immunity_timer: f32,
    /// Hurt animation pulse remaining.
    pub hurt_timer: f32,
    /// Movement stays disabled until this reaches zero.
    pub control_timer: f32,
    /// Settable by external controllers (UI, checkpoints).
    pub respawn_requested: bool,
}

/// Combat reaction tuning.
#[derive(Component, Debug, Clone, Copy, Reflect, serde::Serialize, serde::Deserialize)]
#[reflect(Component)]
pub struct CombatConfig {
    /// Immunity after taking damage or respawning (seconds).
    pub immunity_duration: f32,
    /// Knockback impulse magnitude away from the impact point.
    pub knockback_force: f32,
    /// Control disable after a hit taken while grounded (seconds).
    pub control_disable_ground: f32,
    /// Control disable after a hit taken while airborne (seconds).
    pub control_disable_air: f32,
    /// Hurt animation pulse length (seconds).
    pub hurt_pulse: f32,
    /// Minimum time between observable life-flag changes (seconds).
    pub flag_debounce: f32,
    /// Contact layers that deal damage (bitmask).
    pub damage_mask: u32,
    /// Contact layers that only push back (bitmask).
    pub push_mask: u32,
}

/// Default contact layer for damaging surfaces/hitboxes.
pub const DAMAGE_LAYER: u32 = 8;
/// Default contact layer for push-only surfaces.
pub const PUSH_LAYER: u32 = 9;

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            immunity_duration: 3.0,
            knockback_force: 10.0,
            control_disable_ground: 0.3,
            control_disable_air: 0.2,
            hurt_pulse: 0.1,
            flag_debounce: 0.5,
            damage_mask: 1 << DAMAGE_LAYER,
            push_mask: 1 << PUSH_LAYER,
        }
    }
}

impl CombatConfig {
    pub fn damages(&self, layer: u32) -> bool {
        layer < 32 && self.damage_mask & (1 << layer) != 0
    }

    pub fn pushes(&self, layer: u32) -> bool {
        layer < 32 && self.push_mask & (1 << layer) != 0
    }
}
