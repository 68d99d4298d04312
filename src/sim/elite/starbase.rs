//! StarBase: a hexagonal fortress that descends, fights, then leaves
//!
//! Lifecycle: `Descending -> InCombat -> Leaving -> (departed)`, or
//! `Destroyed` once its health runs out. While in combat it loops through
//! `Rotate -> PauseAfterRotate -> Shoot -> PauseAfterShoot`. A separate
//! countdown forces the leave sequence no matter where the loop is.
//!
//! The StarBase can carry one stolen energy cell; destroying it or watching it
//! leave sends the cell back to its original slot.

use std::f32::consts::{FRAC_PI_3, TAU};

use glam::Vec2;
use rand::Rng;

use super::{EliteAction, EliteContext, FlashTimer, is_off_screen};
use crate::direction_from_angle;
use crate::normalize_angle;

/// Descent speed (pixels/s)
pub const DESCENT_SPEED: f32 = 80.0;
/// Speed while leaving (pixels/s)
pub const LEAVE_SPEED: f32 = 150.0;
/// Rotation interpolation rate (fraction of remaining error per second)
pub const ROTATE_RATE: f32 = 4.0;
/// Rotation is considered settled within this error (radians)
pub const ROTATE_TOLERANCE: f32 = 0.02;
/// Give up on a rotation after this long
pub const ROTATE_TIMEOUT: f32 = 3.0;
pub const PAUSE_AFTER_ROTATE: f32 = 0.6;
pub const SHOOT_DURATION: f32 = 0.25;
pub const PAUSE_AFTER_SHOOT: f32 = 0.8;
/// Per-shot angular jitter (radians)
pub const SHOT_JITTER: f32 = 0.08;
/// Hits soaked by the outer shield ring
pub const OUTER_SHIELD_HITS: u32 = 2;
pub const OUTER_SHIELD_SCALE: f32 = 1.5;
pub const INNER_SHIELD_SCALE: f32 = 1.2;
const HIT_FLASH: f32 = 0.1;

/// Starting health for a wave: 6 below wave 17, then +2 per ten-wave bracket
pub fn health_for_wave(wave: u32) -> u32 {
    6 + 2 * (wave.saturating_sub(7) / 10)
}

/// Seconds before the leave sequence starts: 30s, -2s per 20 waves, never below 20s
pub fn leave_time_for_wave(wave: u32) -> f32 {
    (30.0 - 2.0 * (wave / 20) as f32).max(20.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StarBasePhase {
    Descending,
    InCombat,
    Leaving { direction: Vec2 },
    Destroyed,
}

/// Steps of the in-combat loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatStep {
    Rotate,
    PauseAfterRotate,
    Shoot,
    PauseAfterShoot,
}

/// Pure transition function for the combat loop.
///
/// `rotation_error` is the signed distance to the rotation target; only the
/// `Rotate` step looks at it.
pub fn next_combat_step(step: CombatStep, time_in_step: f32, rotation_error: f32) -> Option<CombatStep> {
    match step {
        CombatStep::Rotate => (rotation_error.abs() < ROTATE_TOLERANCE
            || time_in_step >= ROTATE_TIMEOUT)
            .then_some(CombatStep::PauseAfterRotate),
        CombatStep::PauseAfterRotate => {
            (time_in_step >= PAUSE_AFTER_ROTATE).then_some(CombatStep::Shoot)
        }
        CombatStep::Shoot => (time_in_step >= SHOOT_DURATION).then_some(CombatStep::PauseAfterShoot),
        CombatStep::PauseAfterShoot => {
            (time_in_step >= PAUSE_AFTER_SHOOT).then_some(CombatStep::Rotate)
        }
    }
}

/// Outcome of an asteroid striking a StarBase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StarBaseHit {
    Damaged { health: u32 },
    /// Destroyed; any embedded resource must go back to `home`
    Destroyed { release: Option<(u32, Vec2)> },
    Ignored,
}

#[derive(Debug, Clone)]
pub struct StarBase {
    phase: StarBasePhase,
    time_in_phase: f32,
    combat: CombatStep,
    time_in_step: f32,
    rotation: f32,
    rotation_target: f32,
    health: u32,
    max_health: u32,
    hits_taken: u32,
    leave_countdown: f32,
    size: f32,
    target_y: f32,
    /// Embedded resource and the slot it came from
    resource: Option<(u32, Vec2)>,
    pub flash: FlashTimer,
}

impl StarBase {
    /// New StarBase that will descend to `target_y`
    pub fn new(wave: u32, size: f32, target_y: f32, resource: Option<(u32, Vec2)>) -> Self {
        let health = health_for_wave(wave);
        Self {
            phase: StarBasePhase::Descending,
            time_in_phase: 0.0,
            combat: CombatStep::Rotate,
            time_in_step: 0.0,
            rotation: 0.0,
            rotation_target: 0.0,
            health,
            max_health: health,
            hits_taken: 0,
            leave_countdown: leave_time_for_wave(wave),
            size,
            target_y,
            resource,
            flash: FlashTimer::default(),
        }
    }

    pub fn phase(&self) -> StarBasePhase {
        self.phase
    }

    pub fn combat_step(&self) -> CombatStep {
        self.combat
    }

    pub fn time_in_phase(&self) -> f32 {
        self.time_in_phase
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn health_fraction(&self) -> f32 {
        self.health as f32 / self.max_health.max(1) as f32
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn leave_countdown(&self) -> f32 {
        self.leave_countdown
    }

    pub fn resource(&self) -> Option<(u32, Vec2)> {
        self.resource
    }

    /// Shield holds until only the core hit remains
    pub fn has_active_shield(&self) -> bool {
        self.health > 1
    }

    /// Current collision radius: outer ring, then inner ring, then bare core
    pub fn effective_radius(&self) -> f32 {
        if !self.has_active_shield() {
            self.size
        } else if self.hits_taken < OUTER_SHIELD_HITS {
            self.size * OUTER_SHIELD_SCALE
        } else {
            self.size * INNER_SHIELD_SCALE
        }
    }

    /// Take one hit from an asteroid
    pub fn hit(&mut self) -> StarBaseHit {
        if self.phase == StarBasePhase::Destroyed {
            return StarBaseHit::Ignored;
        }
        self.health = self.health.saturating_sub(1);
        self.hits_taken += 1;
        if self.health == 0 {
            self.phase = StarBasePhase::Destroyed;
            self.time_in_phase = 0.0;
            self.flash.cancel();
            return StarBaseHit::Destroyed {
                release: self.resource.take(),
            };
        }
        self.flash.trigger(HIT_FLASH);
        StarBaseHit::Damaged {
            health: self.health,
        }
    }

    /// Hex cannon muzzle positions around `center`
    pub fn cannon_positions(&self, center: Vec2) -> [Vec2; 6] {
        std::array::from_fn(|i| center + direction_from_angle(self.rotation + i as f32 * FRAC_PI_3) * self.size)
    }

    /// Advance one frame. At most one phase or combat transition happens per call.
    pub fn advance(
        &mut self,
        pos: &mut Vec2,
        ctx: &EliteContext,
        dt: f32,
        rng: &mut impl Rng,
        actions: &mut Vec<EliteAction>,
    ) {
        self.flash.advance(dt);
        if self.phase == StarBasePhase::Destroyed {
            return;
        }
        self.time_in_phase += dt;

        if matches!(self.phase, StarBasePhase::Descending | StarBasePhase::InCombat) {
            self.leave_countdown -= dt;
            if self.leave_countdown <= 0.0 {
                self.begin_leaving(rng);
                return;
            }
        }

        match self.phase {
            StarBasePhase::Descending => {
                pos.y += DESCENT_SPEED * dt;
                if pos.y >= self.target_y {
                    pos.y = self.target_y;
                    self.phase = StarBasePhase::InCombat;
                    self.time_in_phase = 0.0;
                    self.enter_step(CombatStep::Rotate, *pos, rng, actions);
                }
            }
            StarBasePhase::InCombat => {
                self.time_in_step += dt;
                if self.combat == CombatStep::Rotate {
                    let t = (ROTATE_RATE * dt).min(1.0);
                    self.rotation += (self.rotation_target - self.rotation) * t;
                }
                let error = self.rotation_target - self.rotation;
                if let Some(next) = next_combat_step(self.combat, self.time_in_step, error) {
                    self.enter_step(next, *pos, rng, actions);
                }
            }
            StarBasePhase::Leaving { direction } => {
                *pos += direction * LEAVE_SPEED * dt;
                if is_off_screen(*pos, self.size * OUTER_SHIELD_SCALE, ctx.screen) {
                    if let Some((resource, home)) = self.resource.take() {
                        actions.push(EliteAction::ReleaseResource { resource, home });
                    }
                    actions.push(EliteAction::Departed);
                }
            }
            StarBasePhase::Destroyed => {}
        }
    }

    fn begin_leaving(&mut self, rng: &mut impl Rng) {
        let direction = match rng.random_range(0..3) {
            0 => Vec2::new(0.0, -1.0),
            1 => Vec2::new(-1.0, 0.0),
            _ => Vec2::new(1.0, 0.0),
        };
        log::debug!("StarBase leaving toward {direction:?}");
        self.phase = StarBasePhase::Leaving { direction };
        self.time_in_phase = 0.0;
    }

    fn enter_step(&mut self, step: CombatStep, center: Vec2, rng: &mut impl Rng, actions: &mut Vec<EliteAction>) {
        self.combat = step;
        self.time_in_step = 0.0;
        match step {
            CombatStep::Rotate => {
                self.rotation = normalize_angle(self.rotation);
                let delta = rng.random_range(10f32.to_radians()..=TAU);
                self.rotation_target = self.rotation + delta;
            }
            CombatStep::Shoot => {
                // Alternate hex faces: 0/2/4 or 1/3/5
                let first = rng.random_range(0..2);
                let muzzles = self.cannon_positions(center);
                for i in (first..6).step_by(2) {
                    let angle = self.rotation
                        + i as f32 * FRAC_PI_3
                        + rng.random_range(-SHOT_JITTER..=SHOT_JITTER);
                    actions.push(EliteAction::Fire {
                        origin: muzzles[i],
                        direction: direction_from_angle(angle),
                    });
                }
            }
            CombatStep::PauseAfterRotate | CombatStep::PauseAfterShoot => {}
        }
    }
}
