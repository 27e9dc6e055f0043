//! Headless PANFALL simulation.
//!
//! Runs one patrolling boss against a scripted target for a fixed number of
//! ticks and prints the state trace.

use bevy::prelude::*;
use panfall_simulation::{
    create_headless_app, step_fixed, Agent, AnimatorSink, BehaviorState, ChaseTarget,
    CombatConfig, CombatState, LifeFlags, Lives, PhysicsBody, SimulationPlugin,
};

fn main() {
    let seed = 42;
    println!("Starting PANFALL headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    // A stationary target inside the boss's patrol area.
    let target = app
        .world_mut()
        .spawn(Transform::from_xyz(4.0, 0.0, 0.0))
        .id();

    let boss = app
        .world_mut()
        .spawn((
            Agent,
            Transform::from_xyz(-6.0, 0.0, 0.0),
            PhysicsBody::default(),
            AnimatorSink::standard(),
            Lives::default(),
            LifeFlags::default(),
            CombatState::default(),
            CombatConfig::default(),
            ChaseTarget {
                entity: Some(target),
            },
        ))
        .id();

    for tick in 0..1000 {
        step_fixed(&mut app);

        if tick % 100 == 0 {
            let world = app.world();
            let state = world.get::<BehaviorState>(boss);
            let pos = world.get::<Transform>(boss).map(|t| t.translation);
            println!(
                "Tick {}: state={:?} pos={:?}",
                tick,
                state.map(|s| s.name()),
                pos
            );
        }
    }

    println!("Simulation complete!");
}
