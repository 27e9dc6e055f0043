//! Combat reaction integration tests.
//!
//! Contacts are injected directly as `ContactEvent`s; the layer masks
//! decide damage vs push. Covers the lives pipeline, immunity windows,
//! knockback, grounded/airborne control disable, death, and respawn.

use bevy::prelude::*;
use panfall_simulation::components::combat::{DAMAGE_LAYER, PUSH_LAYER};
use panfall_simulation::*;

const TICK: f32 = 1.0 / 60.0;

fn create_sim_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app
}

fn spawn_fighter(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Agent,
            Transform::from_translation(position),
            PhysicsBody::default(),
            AnimatorSink::standard(),
            Lives::default(),
            LifeFlags::default(),
            CombatState::default(),
            CombatConfig::default(),
        ))
        .id()
}

fn hit(app: &mut App, entity: Entity, point: Vec3, layer: u32) {
    app.world_mut().send_event(ContactEvent {
        entity,
        other: None,
        point,
        layer,
    });
}

fn lives_of(app: &App, entity: Entity) -> u32 {
    app.world().get::<Lives>(entity).unwrap().current
}

/// Run out the immunity window (3s) with some margin.
fn wait_out_immunity(app: &mut App) {
    step_fixed_n(app, (3.5 / TICK) as usize);
}

#[test]
fn test_three_hits_kill() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    step_fixed(&mut app); // let ground detection settle

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert_eq!(lives_of(&app, boss), 2);
    assert!(!app.world().get::<CombatState>(boss).unwrap().dead);

    wait_out_immunity(&mut app);
    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert_eq!(lives_of(&app, boss), 1);

    wait_out_immunity(&mut app);
    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert_eq!(lives_of(&app, boss), 0);

    let combat = app.world().get::<CombatState>(boss).unwrap();
    assert!(combat.dead);
    assert!(!app.world().get::<MovementToggle>(boss).unwrap().enabled);
    let sink = app.world().get::<AnimatorSink>(boss).unwrap();
    assert!(sink.get_bool(AnimParam::Dead));
}

#[test]
fn test_knockback_pushes_away_from_impact() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    step_fixed(&mut app);

    // Impact from +X: the body is shoved toward -X.
    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    let body = app.world().get::<PhysicsBody>(boss).unwrap();
    assert!(
        body.velocity.x < -1.0,
        "expected -X knockback, velocity = {:?}",
        body.velocity
    );
}

#[test]
fn test_immune_hit_is_a_full_noop() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    step_fixed(&mut app);

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert_eq!(lives_of(&app, boss), 2);

    // Second hit lands inside the 3s immunity window: no life lost and no
    // knockback either.
    let velocity = app.world().get::<PhysicsBody>(boss).unwrap().velocity;
    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert_eq!(lives_of(&app, boss), 2, "immune hit must not cost a life");
    assert_eq!(
        app.world().get::<PhysicsBody>(boss).unwrap().velocity,
        velocity,
        "immune hit must not knock back"
    );
}

#[test]
fn test_push_layer_knocks_back_without_damage() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    step_fixed(&mut app);

    hit(&mut app, boss, Vec3::new(0.0, 0.0, 1.0), PUSH_LAYER);
    step_fixed(&mut app);
    assert_eq!(lives_of(&app, boss), 3);
    let body = app.world().get::<PhysicsBody>(boss).unwrap();
    assert!(body.velocity.z < -1.0);
    // No immunity, no hurt pulse for push-only contacts.
    let combat = app.world().get::<CombatState>(boss).unwrap();
    assert!(!combat.immune);
    assert_eq!(combat.hurt_timer, 0.0);
}

#[test]
fn test_unlisted_layer_is_ignored() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    step_fixed(&mut app);

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), 3);
    step_fixed(&mut app);
    assert_eq!(lives_of(&app, boss), 3);
    assert_eq!(
        app.world().get::<PhysicsBody>(boss).unwrap().velocity.x,
        0.0
    );
}

#[test]
fn test_control_disable_uses_pre_knockback_grounding() {
    // Grounded hit: 0.3s of lost control.
    let mut app = create_sim_app(42);
    let grounded = spawn_fighter(&mut app, Vec3::ZERO);
    step_fixed(&mut app);
    hit(&mut app, grounded, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    let t_ground = app.world().get::<CombatState>(grounded).unwrap().control_timer;
    assert!((t_ground - (0.3 - TICK)).abs() < 1e-4, "t_ground = {}", t_ground);

    // Airborne hit: the shorter 0.2s window.
    let mut app = create_sim_app(42);
    let airborne = spawn_fighter(&mut app, Vec3::new(0.0, 5.0, 0.0));
    step_fixed(&mut app);
    hit(&mut app, airborne, Vec3::new(1.0, 5.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    let t_air = app.world().get::<CombatState>(airborne).unwrap().control_timer;
    assert!((t_air - (0.2 - TICK)).abs() < 1e-4, "t_air = {}", t_air);
}

#[test]
fn test_control_returns_after_disable_window() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    step_fixed(&mut app);

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert!(!app.world().get::<MovementToggle>(boss).unwrap().enabled);

    // 0.3s window at 60Hz.
    step_fixed_n(&mut app, 25);
    assert!(app.world().get::<MovementToggle>(boss).unwrap().enabled);
}

#[test]
fn test_hurt_pulse_clears() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    step_fixed(&mut app);

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert!(app
        .world()
        .get::<AnimatorSink>(boss)
        .unwrap()
        .get_bool(AnimParam::Hurt));

    // 0.1s pulse.
    step_fixed_n(&mut app, 10);
    assert!(!app
        .world()
        .get::<AnimatorSink>(boss)
        .unwrap()
        .get_bool(AnimParam::Hurt));
}

#[test]
fn test_dead_entity_ignores_further_hits() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    app.world_mut().get_mut::<Lives>(boss).unwrap().current = 1;
    step_fixed(&mut app);

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert!(app.world().get::<CombatState>(boss).unwrap().dead);

    let velocity = app.world().get::<PhysicsBody>(boss).unwrap().velocity;
    hit(&mut app, boss, Vec3::new(-1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    // Neither damage accounting nor knockback applies to a corpse.
    assert_eq!(lives_of(&app, boss), 0);
    assert_eq!(
        app.world().get::<PhysicsBody>(boss).unwrap().velocity,
        velocity
    );
}

#[test]
fn test_push_layer_still_shoves_a_corpse() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    app.world_mut().get_mut::<Lives>(boss).unwrap().current = 1;
    step_fixed(&mut app);

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert!(app.world().get::<CombatState>(boss).unwrap().dead);

    // Death only gates the damage path; push-back surfaces keep working.
    hit(&mut app, boss, Vec3::new(0.0, 0.0, 1.0), PUSH_LAYER);
    step_fixed(&mut app);
    let body = app.world().get::<PhysicsBody>(boss).unwrap();
    assert!(
        body.velocity.z < -1.0,
        "corpse not pushed, velocity = {:?}",
        body.velocity
    );
}

#[test]
fn test_respawn_restores_everything() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    app.world_mut().get_mut::<Lives>(boss).unwrap().current = 1;
    step_fixed(&mut app);

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert!(app.world().get::<CombatState>(boss).unwrap().dead);

    app.world_mut()
        .get_mut::<CombatState>(boss)
        .unwrap()
        .respawn_requested = true;
    step_fixed(&mut app);

    let combat = app.world().get::<CombatState>(boss).unwrap();
    assert!(!combat.dead);
    assert!(combat.immune, "respawn opens an immunity window");
    assert_eq!(lives_of(&app, boss), 3);
    // Movement comes back immediately, not after the immunity window.
    assert!(app.world().get::<MovementToggle>(boss).unwrap().enabled);

    // A hit during respawn immunity costs nothing.
    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    assert_eq!(lives_of(&app, boss), 3);
}

#[test]
fn test_life_flags_settle_to_lives() {
    let mut app = create_sim_app(42);
    let boss = spawn_fighter(&mut app, Vec3::ZERO);
    app.world_mut().get_mut::<Lives>(boss).unwrap().current = 1;
    step_fixed(&mut app);

    let flags = app.world().get::<LifeFlags>(boss).unwrap();
    assert!(flags.alive && !flags.dead);

    hit(&mut app, boss, Vec3::new(1.0, 0.0, 0.0), DAMAGE_LAYER);
    step_fixed(&mut app);
    let flags = app.world().get::<LifeFlags>(boss).unwrap();
    assert!(!flags.alive && flags.dead);

    // Respawn right away: the observable flags lag behind by the debounce,
    // then settle back to alive == (lives > 0).
    app.world_mut()
        .get_mut::<CombatState>(boss)
        .unwrap()
        .respawn_requested = true;
    step_fixed(&mut app);
    let flags = app.world().get::<LifeFlags>(boss).unwrap();
    assert!(flags.dead, "flags must not flicker inside the debounce window");

    step_fixed_n(&mut app, (0.6 / TICK) as usize);
    let flags = app.world().get::<LifeFlags>(boss).unwrap();
    assert!(flags.alive && !flags.dead);
    assert_eq!(
        flags.alive,
        app.world().get::<Lives>(boss).unwrap().is_alive()
    );
}
