//! Shredder: a spinning blade hub that chews through asteroids
//!
//! Spin cycle: `Spinning -> Slowing -> Stopped -> Accelerating -> Spinning`.
//! The spin direction flips at every full stop. A spin ends after a fixed
//! number of full turns, measured by accumulating `angular_speed * dt`, so the
//! cycle runs at the same pace at any frame rate. Only a stopped Shredder can
//! be damaged.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::{EliteAction, EliteContext, FlashTimer, is_off_screen};
use crate::consts::SHREDDER_SIZE;

/// Cruising angular speed (radians/s)
pub const MAX_SPIN_SPEED: f32 = 6.0;
/// Full turns per spinning phase
pub const SPIN_TURNS: f32 = 3.0;
/// Deceleration while slowing (radians/s²)
pub const SPIN_DECEL: f32 = 4.0;
/// Acceleration while spinning up (radians/s²)
pub const SPIN_ACCEL: f32 = 4.0;
/// Rest time at a full stop
pub const STOP_DURATION: f32 = 1.5;
/// Seconds on the field before the Shredder leaves
pub const SHREDDER_LIFETIME: f32 = 25.0;
/// Patrol speeds (pixels/s)
const DESCENT_SPEED: f32 = 90.0;
const PATROL_SPEED: f32 = 50.0;
const LEAVE_SPEED: f32 = 140.0;
const HIT_FLASH: f32 = 0.1;

/// Starting health: 3, plus one per ten waves
pub fn health_for_wave(wave: u32) -> u32 {
    3 + wave / 10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinPhase {
    Spinning,
    Slowing,
    Stopped,
    Accelerating,
}

/// Pure transition function for the spin cycle
pub fn next_spin_phase(
    phase: SpinPhase,
    time_in_phase: f32,
    angular_speed: f32,
    accumulated: f32,
) -> Option<SpinPhase> {
    match phase {
        SpinPhase::Spinning => (accumulated >= SPIN_TURNS * TAU).then_some(SpinPhase::Slowing),
        SpinPhase::Slowing => (angular_speed <= 0.0).then_some(SpinPhase::Stopped),
        SpinPhase::Stopped => (time_in_phase >= STOP_DURATION).then_some(SpinPhase::Accelerating),
        SpinPhase::Accelerating => {
            (angular_speed >= MAX_SPIN_SPEED).then_some(SpinPhase::Spinning)
        }
    }
}

/// Outcome of an asteroid touching the Shredder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShredderHit {
    /// Blades are turning: the asteroid is shredded, the Shredder is unharmed
    Shredded,
    Damaged { health: u32 },
    Destroyed,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Shredder {
    phase: SpinPhase,
    time_in_phase: f32,
    angular_speed: f32,
    /// +1 or -1
    direction: f32,
    accumulated: f32,
    rotation: f32,
    health: u32,
    max_health: u32,
    lifetime: f32,
    patrol_y: f32,
    leaving: bool,
    destroyed: bool,
    pub flash: FlashTimer,
}

impl Shredder {
    pub fn new(wave: u32, patrol_y: f32) -> Self {
        let health = health_for_wave(wave);
        Self {
            phase: SpinPhase::Accelerating,
            time_in_phase: 0.0,
            angular_speed: 0.0,
            direction: 1.0,
            accumulated: 0.0,
            rotation: 0.0,
            health,
            max_health: health,
            lifetime: SHREDDER_LIFETIME,
            patrol_y,
            leaving: false,
            destroyed: false,
            flash: FlashTimer::default(),
        }
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn health_fraction(&self) -> f32 {
        self.health as f32 / self.max_health.max(1) as f32
    }

    pub fn is_leaving(&self) -> bool {
        self.leaving
    }

    pub fn collision_radius(&self) -> f32 {
        SHREDDER_SIZE
    }

    /// Blades are moving (anything but a full stop)
    pub fn blades_active(&self) -> bool {
        self.phase != SpinPhase::Stopped
    }

    /// An asteroid touched the Shredder
    pub fn hit(&mut self) -> ShredderHit {
        if self.destroyed {
            return ShredderHit::Ignored;
        }
        if self.blades_active() {
            return ShredderHit::Shredded;
        }
        self.health = self.health.saturating_sub(1);
        if self.health == 0 {
            self.destroyed = true;
            self.flash.cancel();
            return ShredderHit::Destroyed;
        }
        self.flash.trigger(HIT_FLASH);
        ShredderHit::Damaged {
            health: self.health,
        }
    }

    /// Advance the spin cycle by one step (no movement)
    pub fn step_spin(&mut self, dt: f32) {
        self.time_in_phase += dt;
        match self.phase {
            SpinPhase::Spinning => {
                self.angular_speed = MAX_SPIN_SPEED;
                self.accumulated += self.angular_speed * dt;
            }
            SpinPhase::Slowing => {
                self.angular_speed = (self.angular_speed - SPIN_DECEL * dt).max(0.0);
            }
            SpinPhase::Stopped => self.angular_speed = 0.0,
            SpinPhase::Accelerating => {
                self.angular_speed = (self.angular_speed + SPIN_ACCEL * dt).min(MAX_SPIN_SPEED);
            }
        }
        self.rotation = crate::normalize_angle(self.rotation + self.direction * self.angular_speed * dt);

        if let Some(next) = next_spin_phase(
            self.phase,
            self.time_in_phase,
            self.angular_speed,
            self.accumulated,
        ) {
            match next {
                SpinPhase::Stopped => self.direction = -self.direction,
                SpinPhase::Spinning => self.accumulated = 0.0,
                SpinPhase::Slowing | SpinPhase::Accelerating => {}
            }
            self.phase = next;
            self.time_in_phase = 0.0;
        }
    }

    /// Advance one frame: spin, drift toward the nearest asteroid, leave when time is up
    pub fn advance(
        &mut self,
        pos: &mut Vec2,
        ctx: &EliteContext,
        dt: f32,
        _rng: &mut impl Rng,
        actions: &mut Vec<EliteAction>,
    ) {
        self.flash.advance(dt);
        if self.destroyed {
            return;
        }
        self.step_spin(dt);

        if self.leaving {
            pos.y -= LEAVE_SPEED * dt;
            if is_off_screen(*pos, SHREDDER_SIZE, ctx.screen) {
                actions.push(EliteAction::Departed);
            }
            return;
        }

        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            log::debug!("Shredder leaving");
            self.leaving = true;
            return;
        }

        if pos.y < self.patrol_y {
            pos.y = (pos.y + DESCENT_SPEED * dt).min(self.patrol_y);
        } else if let Some(target) = ctx.nearest_asteroid {
            let dx = target.x - pos.x;
            let step = PATROL_SPEED * dt;
            pos.x += dx.clamp(-step, step);
        }
        pos.x = pos.x.clamp(0.0, ctx.screen.x);
    }
}
