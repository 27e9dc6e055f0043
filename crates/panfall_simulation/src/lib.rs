//! PANFALL simulation core.
//!
//! Headless ECS simulation of the enemy/boss behavior layer on Bevy 0.16.
//! The engine bridge owns physics, rendering, and navigation; this crate
//! owns the behavior state machine, perception, locomotion commands, stuck
//! recovery, and combat reaction. Everything runs on a 60Hz fixed timestep
//! with a seeded RNG so runs are reproducible.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod animation;
pub mod behavior;
pub mod combat;
pub mod components;
pub mod events;
pub mod locomotion;
pub mod logger;
pub mod perception;

pub use animation::{AnimParam, AnimatorSink};
pub use behavior::{
    BehaviorConfig, BehaviorPlugin, BehaviorState, MovementGate, StuckMonitor,
};
pub use combat::{AgentDied, CombatPlugin, DamageTaken};
pub use components::*;
pub use events::ContactEvent;
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_logger, LogLevel};

/// Main simulation plugin (all subsystems).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        // Keep a pre-seeded RNG from create_headless_app if one exists.
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
        app.add_plugins((CombatPlugin, BehaviorPlugin));
    }
}

/// Seeded RNG resource. Every random decision in the simulation draws from
/// this stream, never from thread-local RNGs.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Creates a minimal Bevy App for headless simulation.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Advances the simulation by exactly one fixed tick, independent of the
/// wall clock. Tests use this instead of `App::update` so timer-sensitive
/// assertions (wind-up delays, immunity windows) land on exact tick counts.
pub fn step_fixed(app: &mut App) {
    // Event double-buffer maintenance normally done by the main loop.
    app.world_mut().run_schedule(First);

    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    app.world_mut()
        .resource_mut::<Time<Fixed>>()
        .advance_by(timestep);
    app.world_mut().run_schedule(FixedUpdate);
}

/// Runs `step_fixed` the given number of times.
pub fn step_fixed_n(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        step_fixed(app);
    }
}

/// World snapshot for determinism comparisons: one component type,
/// entity-sorted, Debug-serialized.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Entity-ID sort keeps iteration order out of the comparison.
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
