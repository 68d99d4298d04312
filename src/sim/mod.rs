//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - Untrusted frame deltas are clamped before use
//! - No rendering or platform dependencies

pub mod collision;
pub mod director;
pub mod elite;
pub mod entity;
pub mod fragment;
pub mod numeric;
pub mod scoring;
pub mod state;
pub mod steering;
pub mod tick;

pub use collision::{
    AsteroidFate, CollisionHooks, CollisionReport, Effect, EffectSink, NoEffects, default_asteroid_fate,
    resolve_collisions,
};
pub use director::{BossPlan, agents_for_wave, boss_plan, coerce_wave};
pub use elite::{Boss, Elite, FlashTimer, Shredder, StarBase};
pub use entity::{Agent, Asteroid, Entity, EntityKind, Personality, Projectile, Resource, SizeClass};
pub use fragment::split_asteroid;
pub use scoring::{ScoreEvent, ScoreLedger, asteroid_cost, combo_multiplier};
pub use state::{EntitySnapshot, GamePhase, GameState, HudSnapshot};
pub use tick::{FrameReport, tick};
