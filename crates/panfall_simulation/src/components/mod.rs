//! Core components shared across the simulation.

pub mod agent;
pub mod combat;

pub use agent::{
    Agent, BehaviorDisabled, ChaseTarget, GroundProbe, GroundSensor, MovementToggle, PatrolArea,
    PhysicsBody,
};
pub use combat::{CombatConfig, CombatState, LifeFlags, Lives};
