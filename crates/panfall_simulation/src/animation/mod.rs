//! Animation parameter sink.
//!
//! The simulation drives the engine's animation graph, never the other way
//! around: behavior and combat systems write typed parameters here and the
//! bridge flushes them to the graph. Parameters are a static enum-to-slot
//! mapping fixed at construction; writing an unmapped parameter warns once
//! and no-ops, so a missing graph binding degrades instead of failing.

use bevy::prelude::*;

use crate::logger::log_warning;

/// Every animation parameter the simulation can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AnimParam {
    Walking,
    Attacking,
    RollingAttack,
    Grounded,
    Falling,
    Ascending,
    Hurt,
    Dead,
    Respawn,
    VerticalSpeed,
}

impl AnimParam {
    pub const COUNT: usize = 10;

    pub const ALL: [AnimParam; Self::COUNT] = [
        AnimParam::Walking,
        AnimParam::Attacking,
        AnimParam::RollingAttack,
        AnimParam::Grounded,
        AnimParam::Falling,
        AnimParam::Ascending,
        AnimParam::Hurt,
        AnimParam::Dead,
        AnimParam::Respawn,
        AnimParam::VerticalSpeed,
    ];

    fn index(self) -> usize {
        match self {
            AnimParam::Walking => 0,
            AnimParam::Attacking => 1,
            AnimParam::RollingAttack => 2,
            AnimParam::Grounded => 3,
            AnimParam::Falling => 4,
            AnimParam::Ascending => 5,
            AnimParam::Hurt => 6,
            AnimParam::Dead => 7,
            AnimParam::Respawn => 8,
            AnimParam::VerticalSpeed => 9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AnimParam::Walking => "Walking",
            AnimParam::Attacking => "Attacking",
            AnimParam::RollingAttack => "RollingAttack",
            AnimParam::Grounded => "Grounded",
            AnimParam::Falling => "Falling",
            AnimParam::Ascending => "Ascending",
            AnimParam::Hurt => "Hurt",
            AnimParam::Dead => "Dead",
            AnimParam::Respawn => "Respawn",
            AnimParam::VerticalSpeed => "VerticalSpeed",
        }
    }
}

/// Per-agent parameter store the bridge reads after each tick.
///
/// Optional on agents: a missing sink means animation is skipped entirely
/// (logged once by `validate_agents`).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AnimatorSink {
    bools: [bool; AnimParam::COUNT],
    floats: [f32; AnimParam::COUNT],
    mapped: [bool; AnimParam::COUNT],
    warned: [bool; AnimParam::COUNT],
}

impl Default for AnimatorSink {
    fn default() -> Self {
        Self::standard()
    }
}

impl AnimatorSink {
    /// Sink with every parameter mapped.
    pub fn standard() -> Self {
        Self::with_params(&AnimParam::ALL)
    }

    /// Sink mapping only the listed parameters. The mapping is fixed here;
    /// later writes to anything else warn once and no-op.
    pub fn with_params(params: &[AnimParam]) -> Self {
        let mut mapped = [false; AnimParam::COUNT];
        for param in params {
            mapped[param.index()] = true;
        }
        Self {
            bools: [false; AnimParam::COUNT],
            floats: [0.0; AnimParam::COUNT],
            mapped,
            warned: [false; AnimParam::COUNT],
        }
    }

    pub fn set_bool(&mut self, param: AnimParam, value: bool) {
        let i = param.index();
        if !self.mapped[i] {
            self.warn_unmapped(param);
            return;
        }
        self.bools[i] = value;
    }

    pub fn set_float(&mut self, param: AnimParam, value: f32) {
        let i = param.index();
        if !self.mapped[i] {
            self.warn_unmapped(param);
            return;
        }
        self.floats[i] = value;
    }

    pub fn get_bool(&self, param: AnimParam) -> bool {
        self.bools[param.index()]
    }

    pub fn get_float(&self, param: AnimParam) -> f32 {
        self.floats[param.index()]
    }

    fn warn_unmapped(&mut self, param: AnimParam) {
        let i = param.index();
        if !self.warned[i] {
            self.warned[i] = true;
            log_warning(&format!(
                "animator parameter '{}' is not mapped, writes will be skipped",
                param.name()
            ));
        }
    }
}
