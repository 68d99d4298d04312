//! Boss: a shielded super-navigating shooter that flocks with the swarm

use super::FlashTimer;
use crate::consts::BOSS_SIZE;

/// Hit-flash duration in seconds
pub const BOSS_FLASH_DURATION: f32 = 0.1;
/// Shield radius relative to the body
const SHIELD_SCALE: f32 = 1.4;

/// Outcome of an asteroid striking a boss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossHit {
    /// Shield absorbed the hit, health left
    Damaged { health: u32 },
    /// That was the last point of health
    Defeated,
    /// Already defeated; nothing happens
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Boss {
    health: u32,
    max_health: u32,
    shoot_probability: f64,
    defeated: bool,
    pub flash: FlashTimer,
}

impl Boss {
    /// New boss; health is coerced to at least 1 and probability into [0, 1]
    pub fn new(health: u32, shoot_probability: f64) -> Self {
        let health = health.max(1);
        let shoot_probability = if shoot_probability.is_finite() {
            shoot_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            health,
            max_health: health,
            shoot_probability,
            defeated: false,
            flash: FlashTimer::default(),
        }
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn health_fraction(&self) -> f32 {
        self.health as f32 / self.max_health as f32
    }

    /// Shield stays up for as long as the boss has health
    pub fn has_active_shield(&self) -> bool {
        self.health > 0
    }

    pub fn collision_radius(&self) -> f32 {
        if self.has_active_shield() {
            BOSS_SIZE * SHIELD_SCALE
        } else {
            BOSS_SIZE
        }
    }

    pub fn shoot_probability(&self) -> f64 {
        self.shoot_probability
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_active()
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Take one hit. Defeat is reported exactly once.
    pub fn hit(&mut self) -> BossHit {
        if self.defeated {
            return BossHit::Ignored;
        }
        self.health = self.health.saturating_sub(1);
        if self.health == 0 {
            self.defeated = true;
            self.flash.cancel();
            return BossHit::Defeated;
        }
        self.flash.trigger(BOSS_FLASH_DURATION);
        BossHit::Damaged {
            health: self.health,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.flash.advance(dt);
    }
}
