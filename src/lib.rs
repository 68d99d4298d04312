//! Flock Siege - arcade defense simulation core
//!
//! A swarm of autonomous raiders tries to steal the player's energy cells while
//! the player hurls asteroids that fragment on impact.
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (flocking, collisions, elites, scoring)
//! - `session`: Session controller owning the world, ledger and UI hooks
//! - `settings`: Data-driven game balance, loaded from JSON
//! - `persistence`: Save collaborator interface and stores
//! - `platform`: Renderer/UI callback surface

pub mod error;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use session::{DevCommand, Session};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal frame timestep (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest delta a single frame may integrate (backgrounded tab, debugger pause)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default playfield dimensions (pixels, y grows downward)
    pub const SCREEN_WIDTH: f32 = 1280.0;
    pub const SCREEN_HEIGHT: f32 = 720.0;

    /// Agent body radius
    pub const AGENT_RADIUS: f32 = 10.0;
    /// Resource (energy cell) pickup radius
    pub const RESOURCE_RADIUS: f32 = 14.0;
    /// Projectile radius
    pub const PROJECTILE_RADIUS: f32 = 3.0;

    /// Asteroid band sizes (radius in pixels)
    pub const LARGE_ASTEROID_SIZE: f32 = 60.0;
    pub const MEDIUM_ASTEROID_SIZE: f32 = 40.0;
    pub const SMALL_ASTEROID_SIZE: f32 = 20.0;
    /// Smallest asteroid that may exist; anything shrunk below is destroyed
    pub const MIN_ASTEROID_SIZE: f32 = 10.0;
    /// Hard cap on live asteroids
    pub const MAX_ASTEROIDS: usize = 26;

    /// Boss and elite base body sizes
    pub const BOSS_SIZE: f32 = 28.0;
    pub const STARBASE_SIZE: f32 = 48.0;
    pub const SHREDDER_SIZE: f32 = 36.0;

    /// Combo idle window in seconds
    pub const COMBO_WINDOW: f32 = 2.0;
    /// Score ledger starting balance
    pub const STARTING_SCORE: u64 = 1000;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    angle = angle.rem_euclid(TAU);
    if angle >= PI {
        angle -= TAU;
    }
    angle
}

/// Unit vector pointing along `theta`
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Wrap a hue into [0, 360)
#[inline]
pub fn wrap_hue(hue: f32) -> f32 {
    if !hue.is_finite() {
        return 0.0;
    }
    hue.rem_euclid(360.0)
}
