//! Combat reaction: damage intake, knockback, immunity, death and respawn.
//!
//! Contacts arrive as `ContactEvent`s from the engine bridge (or directly
//! from tests). Layer masks decide whether a contact damages or only pushes.
//! System order per fixed tick: respawns, then contact processing, then
//! timer countdowns, then the debounced life flags.

use bevy::prelude::*;

use crate::animation::{AnimParam, AnimatorSink};
use crate::components::{
    Agent, CombatConfig, CombatState, GroundSensor, LifeFlags, Lives, MovementToggle, PhysicsBody,
};
use crate::events::ContactEvent;
use crate::logger::log;

/// Fired every time an entity loses a life.
#[derive(Event, Debug, Clone)]
pub struct DamageTaken {
    pub entity: Entity,
    pub lives_remaining: u32,
    /// World-space impact point the knockback pushes away from.
    pub impact: Vec3,
}

/// Fired once when an entity runs out of lives.
#[derive(Event, Debug, Clone)]
pub struct AgentDied {
    pub entity: Entity,
}

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageTaken>().add_event::<AgentDied>();

        app.add_systems(
            FixedUpdate,
            (
                process_respawns,
                process_contacts,
                tick_combat,
                update_life_flags,
            )
                .chain()
                .before(crate::behavior::validate_agents),
        );
    }
}

/// System: honor respawn requests.
///
/// Respawn restores all lives, re-enables movement immediately, and opens a
/// fresh immunity window; positioning is the caller's job.
pub fn process_respawns(
    mut query: Query<(
        Entity,
        &CombatConfig,
        &mut Lives,
        &mut CombatState,
        &mut MovementToggle,
        &mut PhysicsBody,
        Option<&mut AnimatorSink>,
    )>,
) {
    for (entity, config, mut lives, mut combat, mut toggle, mut body, sink) in query.iter_mut() {
        if !combat.respawn_requested {
            continue;
        }
        combat.respawn_requested = false;

        log(&format!("combat: {:?} respawning", entity));
        lives.restore();
        combat.dead = false;
        combat.immune = true;
        combat.immunity_timer = config.immunity_duration;
        combat.hurt_timer = 0.0;
        combat.control_timer = 0.0;
        toggle.enabled = true;
        body.velocity = Vec3::ZERO;

        if let Some(mut sink) = sink {
            sink.set_bool(AnimParam::Dead, false);
            sink.set_bool(AnimParam::Hurt, false);
            sink.set_bool(AnimParam::Respawn, true);
        }
    }
}

/// System: translate contacts into knockback, life loss, and death.
pub fn process_contacts(
    mut contacts: EventReader<ContactEvent>,
    mut query: Query<(
        &CombatConfig,
        &mut Lives,
        &mut CombatState,
        &mut MovementToggle,
        &mut PhysicsBody,
        &GroundSensor,
        &Transform,
        Option<&mut AnimatorSink>,
    )>,
    mut damage_events: EventWriter<DamageTaken>,
    mut death_events: EventWriter<AgentDied>,
) {
    for contact in contacts.read() {
        let Ok((config, mut lives, mut combat, mut toggle, mut body, sensor, transform, sink)) =
            query.get_mut(contact.entity)
        else {
            continue;
        };

        let damaging = config.damages(contact.layer);
        let pushing = config.pushes(contact.layer);
        if !damaging && !pushing {
            continue;
        }

        let away = transform.translation - contact.point;
        let dir = Vec3::new(away.x, 0.0, away.z).normalize_or_zero();

        if !damaging {
            // Push-only contacts shove the body and nothing else, corpses
            // included.
            body.apply_impulse(dir * config.knockback_force);
            continue;
        }

        // A damaging contact is a complete no-op while dead or immune.
        if combat.dead || combat.immune {
            continue;
        }

        // Grounded must be captured before the knockback changes it.
        let was_grounded = sensor.grounded;
        body.apply_impulse(dir * config.knockback_force);

        if lives.current > 1 {
            lives.current -= 1;
            combat.immune = true;
            combat.immunity_timer = config.immunity_duration;
            combat.hurt_timer = config.hurt_pulse;
            combat.control_timer = if was_grounded {
                config.control_disable_ground
            } else {
                config.control_disable_air
            };
            toggle.enabled = false;

            log(&format!(
                "combat: {:?} hit, {} lives left",
                contact.entity, lives.current
            ));
            if let Some(mut sink) = sink {
                sink.set_bool(AnimParam::Hurt, true);
            }
            damage_events.write(DamageTaken {
                entity: contact.entity,
                lives_remaining: lives.current,
                impact: contact.point,
            });
        } else {
            lives.current = 0;
            combat.dead = true;
            combat.hurt_timer = 0.0;
            combat.control_timer = 0.0;
            toggle.enabled = false;

            log(&format!("combat: {:?} died", contact.entity));
            if let Some(mut sink) = sink {
                sink.set_bool(AnimParam::Hurt, false);
                sink.set_bool(AnimParam::Dead, true);
            }
            damage_events.write(DamageTaken {
                entity: contact.entity,
                lives_remaining: 0,
                impact: contact.point,
            });
            death_events.write(AgentDied {
                entity: contact.entity,
            });
        }
    }
}

/// System: count down hurt, control, and immunity timers.
pub fn tick_combat(
    mut query: Query<(
        &mut CombatState,
        &mut MovementToggle,
        Option<&mut AnimatorSink>,
    )>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (mut combat, mut toggle, mut sink) in query.iter_mut() {
        if combat.hurt_timer > 0.0 {
            combat.hurt_timer -= dt;
            if combat.hurt_timer <= 0.0 {
                combat.hurt_timer = 0.0;
                if let Some(sink) = sink.as_mut() {
                    sink.set_bool(AnimParam::Hurt, false);
                }
            }
        }

        if combat.control_timer > 0.0 {
            combat.control_timer -= dt;
            if combat.control_timer <= 0.0 {
                combat.control_timer = 0.0;
                if !combat.dead {
                    toggle.enabled = true;
                }
            }
        }

        if combat.immune {
            combat.immunity_timer -= dt;
            if combat.immunity_timer <= 0.0 {
                combat.immunity_timer = 0.0;
                combat.immune = false;
                if let Some(sink) = sink.as_mut() {
                    sink.set_bool(AnimParam::Respawn, false);
                }
            }
        }
    }
}

/// System: debounced observable alive/dead flags.
///
/// The pair only flips together and never faster than `flag_debounce`, so
/// collaborators reading it mid-fight see no flicker. Death and movement
/// disabling above are immediate; only the observable flags lag.
pub fn update_life_flags(
    mut query: Query<(&CombatConfig, &Lives, &mut LifeFlags), With<Agent>>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (config, lives, mut flags) in query.iter_mut() {
        if flags.cooldown > 0.0 {
            flags.cooldown -= dt;
            continue;
        }

        let alive = lives.is_alive();
        if flags.alive != alive || flags.dead == alive {
            flags.alive = alive;
            flags.dead = !alive;
            flags.cooldown = config.flag_debounce;
        }
    }
}
