//! Platform hooks
//!
//! The session reports HUD-level changes and visual effects through
//! [`GameHooks`]. A renderer or UI layer implements it; the native binary
//! uses [`LogHooks`], tests use [`RecordingHooks`].

use crate::error::EffectError;
use crate::sim::collision::{AsteroidFate, Effect, EffectSink, default_asteroid_fate};
use crate::sim::entity::{Agent, Asteroid};

/// Outbound notifications from a running game.
///
/// Effects and the asteroid fate after an agent kill come through the
/// [`EffectSink`] supertrait.
pub trait GameHooks: EffectSink {
    fn on_score_update(&mut self, score: u64, combo: u32);
    fn on_wave_update(&mut self, wave: u32);
    /// `critical` is true while one or no energy cells remain
    fn on_energy_status(&mut self, remaining: usize, critical: bool);
    fn on_game_over(&mut self, score: u64, wave: u32);
}

/// Writes every notification to the log
#[derive(Debug, Default)]
pub struct LogHooks;

impl EffectSink for LogHooks {
    fn play(&mut self, effect: &Effect) -> Result<(), EffectError> {
        log::trace!("Effect {effect:?}");
        Ok(())
    }
}

impl GameHooks for LogHooks {
    fn on_score_update(&mut self, score: u64, combo: u32) {
        log::debug!("Score {score} (combo {combo})");
    }

    fn on_wave_update(&mut self, wave: u32) {
        log::info!("Wave {wave}");
    }

    fn on_energy_status(&mut self, remaining: usize, critical: bool) {
        if critical {
            log::warn!("Energy critical: {remaining} cell(s) left");
        } else {
            log::info!("Energy: {remaining} cell(s) left");
        }
    }

    fn on_game_over(&mut self, score: u64, wave: u32) {
        log::info!("Game over: score {score}, wave {wave}");
    }
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq)]
pub enum HookCall {
    Score { score: u64, combo: u32 },
    Wave(u32),
    Energy { remaining: usize, critical: bool },
    GameOver { score: u64, wave: u32 },
}

/// Records notifications and effects; can be told to fail every effect
#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub calls: Vec<HookCall>,
    pub effects: Vec<Effect>,
    pub fail_effects: bool,
    /// Effects that were rejected because `fail_effects` was set
    pub failed_effects: u32,
    /// Destroy asteroids on agent kills instead of shrinking them
    pub destroy_asteroids: bool,
}

impl RecordingHooks {
    pub fn game_overs(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HookCall::GameOver { .. }))
            .count()
    }

    pub fn last_wave(&self) -> Option<u32> {
        self.calls.iter().rev().find_map(|c| match c {
            HookCall::Wave(w) => Some(*w),
            _ => None,
        })
    }
}

impl EffectSink for RecordingHooks {
    fn play(&mut self, effect: &Effect) -> Result<(), EffectError> {
        if self.fail_effects {
            self.failed_effects += 1;
            return Err(EffectError::new(effect.name(), "recording sink set to fail"));
        }
        self.effects.push(*effect);
        Ok(())
    }

    fn asteroid_fate(&mut self, asteroid: &Asteroid, _agent: &Agent) -> AsteroidFate {
        if self.destroy_asteroids {
            AsteroidFate::Destroy
        } else {
            default_asteroid_fate(asteroid)
        }
    }
}

impl GameHooks for RecordingHooks {
    fn on_score_update(&mut self, score: u64, combo: u32) {
        self.calls.push(HookCall::Score { score, combo });
    }

    fn on_wave_update(&mut self, wave: u32) {
        self.calls.push(HookCall::Wave(wave));
    }

    fn on_energy_status(&mut self, remaining: usize, critical: bool) {
        self.calls.push(HookCall::Energy { remaining, critical });
    }

    fn on_game_over(&mut self, score: u64, wave: u32) {
        self.calls.push(HookCall::GameOver { score, wave });
    }
}
