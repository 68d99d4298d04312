//! Session controller
//!
//! Owns one game: the simulation state, the score ledger and the platform
//! hooks. Everything outside the simulation talks to the game through here:
//! frame stepping, asteroid launches, save/restore and developer commands.

use glam::Vec2;

use crate::consts::FRAME_DT;
use crate::error::{Error, Result};
use crate::persistence::{SaveData, SaveStore};
use crate::platform::{GameHooks, LogHooks};
use crate::settings::Settings;
use crate::sim::director::{self, coerce_wave};
use crate::sim::numeric::{is_finite_vec, normalize};
use crate::sim::scoring::{ScoreEvent, ScoreLedger, asteroid_cost};
use crate::sim::state::{EntitySnapshot, GamePhase, GameState, HudSnapshot};
use crate::sim::tick::{FrameReport, tick};

/// Launch speed of a player asteroid (pixels/s)
pub const LAUNCH_SPEED: f32 = 320.0;
/// Fixed steps run per rendered frame at most
pub const MAX_SUBSTEPS: u32 = 5;

/// Developer spawn commands (ignored unless `dev_mode` is on).
///
/// Wave overrides are untrusted and coerced; `None` uses the current wave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DevCommand {
    SpawnBoss { wave: Option<f64> },
    SpawnStarBase { wave: Option<f64> },
    SpawnShredder { wave: Option<f64> },
    SpawnBurst { count: u32 },
    /// Drop the current wave and start the next one
    SkipWave,
}

/// One running game
pub struct Session<H: GameHooks = LogHooks> {
    state: GameState,
    ledger: ScoreLedger,
    hooks: H,
    accumulator: f32,
    last_score: Option<(u64, u32)>,
    last_wave: Option<u32>,
    last_energy: Option<usize>,
    game_over_sent: bool,
}

impl<H: GameHooks> Session<H> {
    /// Start a new game on wave 1
    pub fn new(seed: u64, settings: Settings, hooks: H) -> Self {
        let state = GameState::new(seed, settings);
        let ledger = ScoreLedger::new(state.settings.combo_window);
        let mut session = Self {
            state,
            ledger,
            hooks,
            accumulator: 0.0,
            last_score: None,
            last_wave: None,
            last_energy: None,
            game_over_sent: false,
        };
        director::begin_wave(&mut session.state, 1);
        log::info!("New game (seed {seed})");
        session.notify();
        session
    }

    /// Throw the current game away and start over with `seed`
    pub fn restart(&mut self, seed: u64) {
        self.state = GameState::new(seed, self.state.settings.clone());
        self.ledger.reset();
        self.accumulator = 0.0;
        self.game_over_sent = false;
        director::begin_wave(&mut self.state, 1);
        log::info!("Restarted (seed {seed})");
        self.notify();
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access for tools and tests
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.state.snapshots()
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.ledger.score(),
            combo: self.ledger.combo(),
            multiplier: self.ledger.multiplier(),
            wave: self.state.wave,
            phase: self.state.phase,
            resources_remaining: self.state.resources_remaining(),
        }
    }

    /// Advance by exactly one step of `dt` seconds
    pub fn tick(&mut self, dt: f32) -> FrameReport {
        let report = tick(&mut self.state, &mut self.ledger, &mut self.hooks, dt);
        if report.collisions.effect_faults > 0 {
            log::debug!("{} effect(s) failed this frame", report.collisions.effect_faults);
        }
        self.notify();
        report
    }

    /// Feed a rendered frame's wall-clock delta; runs fixed steps through an
    /// accumulator. Returns the reports of the steps taken.
    pub fn frame(&mut self, dt: f32) -> Vec<FrameReport> {
        let dt = if dt.is_finite() { dt.clamp(0.0, 0.1) } else { 0.0 };
        self.accumulator += dt;

        let mut reports = Vec::new();
        while self.accumulator >= FRAME_DT && (reports.len() as u32) < MAX_SUBSTEPS {
            reports.push(self.tick(FRAME_DT));
            self.accumulator -= FRAME_DT;
        }
        if (reports.len() as u32) == MAX_SUBSTEPS {
            // Drop the backlog rather than spiral
            self.accumulator = 0.0;
        }
        reports
    }

    /// Cost of launching an asteroid of `size` right now
    pub fn launch_cost(&self, size: f32) -> u64 {
        asteroid_cost(size, self.state.wave)
    }

    /// Buy and launch an asteroid from `from` toward `toward`.
    ///
    /// Returns the new asteroid's ID, or `None` when the game is over, the
    /// input is unusable, the asteroid cap is reached or the score cannot
    /// cover the cost.
    pub fn launch_asteroid(&mut self, from: Vec2, toward: Vec2, size: f32) -> Option<u32> {
        if self.state.phase == GamePhase::GameOver {
            return None;
        }
        if !is_finite_vec(from) || !is_finite_vec(toward) || !size.is_finite() || size <= 0.0 {
            log::warn!("Rejected launch with invalid input ({from:?} -> {toward:?}, size {size})");
            return None;
        }
        let dir = normalize(toward - from);
        if dir == Vec2::ZERO {
            return None;
        }
        if self.state.live_asteroids() >= self.state.settings.max_asteroids {
            log::debug!("Launch rejected: asteroid cap reached");
            return None;
        }
        let cost = self.launch_cost(size);
        if !self.ledger.spend(cost as f64) {
            return None;
        }
        let id = self.state.spawn_asteroid(from, dir * LAUNCH_SPEED, size);
        self.ledger.record(ScoreEvent::AsteroidLaunch);
        self.notify();
        Some(id)
    }

    /// Progress worth saving
    pub fn save_data(&self) -> SaveData {
        SaveData {
            score: self.ledger.score(),
            wave: self.state.wave,
            stolen_resource_indices: self.state.stolen_resource_indices(),
        }
    }

    pub fn save(&self, store: &mut impl SaveStore) -> Result<()> {
        store.save(&self.save_data())
    }

    /// Rebuild the game from a save. The saved wave is restarted as-is.
    pub fn restore(&mut self, data: &SaveData) -> Result<()> {
        data.validate(self.state.resources.len())?;

        let mut state = GameState::new(self.state.seed, self.state.settings.clone());
        for resource in state.resources.iter_mut() {
            if data.stolen_resource_indices.contains(&resource.index) {
                resource.stolen = true;
            }
        }
        director::begin_wave(&mut state, data.wave);
        if state.wave != data.wave {
            return Err(Error::InvalidSave {
                reason: format!("wave {} out of range", data.wave),
            });
        }

        self.state = state;
        self.ledger.restore(data.score);
        self.accumulator = 0.0;
        self.game_over_sent = false;
        log::info!(
            "Restored wave {} with score {} ({} stolen)",
            data.wave,
            data.score,
            data.stolen_resource_indices.len()
        );
        self.notify();
        Ok(())
    }

    /// Restore from a store. Returns false when the store is empty.
    pub fn load(&mut self, store: &impl SaveStore) -> Result<bool> {
        match store.load()? {
            Some(data) => {
                self.restore(&data)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run a developer command. Returns false when dev mode is off.
    pub fn dev_command(&mut self, command: DevCommand) -> bool {
        if !self.state.settings.dev_mode {
            log::warn!("Ignored {command:?}: dev mode is off");
            return false;
        }
        let current = self.state.wave;
        let wave = |raw: Option<f64>| raw.map_or(current, coerce_wave);
        match command {
            DevCommand::SpawnBoss { wave: raw } => {
                let plan = director::boss_plan(wave(raw).div_ceil(5).max(1) * 5);
                if let Some(plan) = plan {
                    director::spawn_bosses(&mut self.state, director::BossPlan { count: 1, ..plan });
                }
            }
            DevCommand::SpawnStarBase { wave: raw } => {
                director::spawn_starbase(&mut self.state, wave(raw));
            }
            DevCommand::SpawnShredder { wave: raw } => {
                director::spawn_shredder(&mut self.state, wave(raw));
            }
            DevCommand::SpawnBurst { count } => {
                director::spawn_agents(&mut self.state, count);
            }
            DevCommand::SkipWave => {
                for resource in self.state.resources.iter_mut() {
                    if resource.carrier.is_some() {
                        resource.restore();
                    }
                }
                self.state.agents.clear();
                self.state.projectiles.clear();
                let next = self.state.wave.saturating_add(1);
                director::begin_wave(&mut self.state, next);
            }
        }
        log::info!("Dev command {command:?}");
        self.notify();
        true
    }

    /// Push HUD changes to the hooks (only what changed)
    fn notify(&mut self) {
        let score = (self.ledger.score(), self.ledger.combo());
        if self.last_score != Some(score) {
            self.hooks.on_score_update(score.0, score.1);
            self.last_score = Some(score);
        }
        if self.last_wave != Some(self.state.wave) {
            self.hooks.on_wave_update(self.state.wave);
            self.last_wave = Some(self.state.wave);
        }
        let remaining = self.state.resources_remaining();
        if self.last_energy != Some(remaining) {
            self.hooks.on_energy_status(remaining, self.state.energy_critical());
            self.last_energy = Some(remaining);
        }
        if self.state.phase == GamePhase::GameOver && !self.game_over_sent {
            self.hooks.on_game_over(self.ledger.score(), self.state.wave);
            self.game_over_sent = true;
        }
    }
}
