//! Fixed timestep simulation tick
//!
//! [`tick`] is the one place the per-frame order is defined:
//!
//! 1. director (breather countdown, elite spawn timers)
//! 2. steering, shooting and integration
//! 3. collision resolution, which calls into fragmentation and scoring
//! 4. elite state machines
//! 5. top escapes and boundary timeouts
//! 6. frame-end cleanup, then wave completion and game over
//!
//! Later steps see the alive flags written by earlier ones, so an entity
//! destroyed in step 3 is invisible to steps 4 and 5 even though it is only
//! removed from its container in step 6.

use glam::Vec2;

use super::collision::{AsteroidFate, CollisionHooks, CollisionReport, Effect, EffectSink, resolve_collisions};
use super::director;
use super::elite::{self, EliteAction, EliteContext, is_off_screen};
use super::entity::{Agent, Asteroid, Entity, Projectile};
use super::numeric::{distance_squared, sanitize_dt};
use super::scoring::{ScoreEvent, ScoreLedger};
use super::state::{GamePhase, GameState};
use super::steering::{SteeringParams, apply_forces, compute_forces, max_speed_for_wave, update_shooters};
use crate::error::EffectError;

/// Extra distance past the edge before a stray asteroid is dropped
const ASTEROID_EXIT_MARGIN: f32 = 100.0;

/// Everything that happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub collisions: CollisionReport,
    pub shots_fired: u32,
    pub escapes: u32,
    /// Slots of resources stolen this frame
    pub resources_stolen: Vec<usize>,
    pub timeouts: u32,
    /// Score events recorded, in order
    pub events: Vec<ScoreEvent>,
    /// Points awarded this frame
    pub points: u64,
    pub wave_started: Option<u32>,
    pub wave_completed: Option<u32>,
    pub game_over: bool,
}

/// Collision hooks backed by the ledger and an effect sink
struct FrameHooks<'a, S: EffectSink + ?Sized> {
    ledger: &'a mut ScoreLedger,
    effects: &'a mut S,
    events: Vec<ScoreEvent>,
    points: u64,
}

impl<S: EffectSink + ?Sized> FrameHooks<'_, S> {
    fn record(&mut self, event: ScoreEvent) {
        self.points = self.points.saturating_add(self.ledger.record(event));
        self.events.push(event);
    }
}

impl<S: EffectSink + ?Sized> CollisionHooks for FrameHooks<'_, S> {
    fn asteroid_fate(&mut self, asteroid: &Asteroid, agent: &Agent) -> AsteroidFate {
        self.effects.asteroid_fate(asteroid, agent)
    }

    fn score(&mut self, event: ScoreEvent, _agent: Option<&Agent>) {
        self.record(event);
    }

    fn effect(&mut self, effect: &Effect) -> Result<(), EffectError> {
        self.effects.play(effect)
    }
}

/// Advance the game by one frame of `dt` seconds (untrusted; clamped)
pub fn tick<S: EffectSink + ?Sized>(
    state: &mut GameState,
    ledger: &mut ScoreLedger,
    effects: &mut S,
    dt: f32,
) -> FrameReport {
    let mut report = FrameReport::default();
    if state.phase == GamePhase::GameOver {
        return report;
    }
    let dt = sanitize_dt(dt);
    if dt <= 0.0 {
        return report;
    }
    state.time += dt;
    ledger.advance(dt);

    // Director
    match state.phase {
        GamePhase::Breather => {
            state.breather_timer -= dt;
            if state.breather_timer <= 0.0 {
                let next = state.wave.saturating_add(1);
                director::begin_wave(state, next);
                report.wave_started = Some(state.wave);
            }
        }
        GamePhase::Playing => director::update(state, dt),
        GamePhase::GameOver => {}
    }

    // Steering
    let params = SteeringParams {
        max_speed: max_speed_for_wave(state.settings.agent_base_speed, state.wave),
        max_force: state.settings.agent_base_force,
    };
    let forces = compute_forces(&state.agents, &state.asteroids, &state.resources, &params);
    apply_forces(&mut state.agents, &forces, &params, dt);
    let shots = update_shooters(
        &mut state.agents,
        &state.asteroids,
        state.settings.shooter_cooldown,
        dt,
        &mut state.rng,
    );
    for shot in shots {
        let id = state.ids.allocate();
        state.projectiles.push(Projectile::aimed(
            id,
            shot.owner,
            shot.origin,
            shot.target,
            state.settings.projectile_speed,
            state.settings.projectile_lifetime,
            &mut state.rng,
        ));
        report.shots_fired += 1;
    }
    integrate(state, dt);

    // Collisions, with scoring and fragmentation callbacks
    let mut hooks = FrameHooks {
        ledger,
        effects,
        events: Vec::new(),
        points: 0,
    };
    report.collisions = resolve_collisions(state, &mut hooks);

    // Elite state machines
    report.shots_fired += advance_elites(state, dt);
    follow_carriers(state);

    // Escapes and timeouts
    let escapes = director::handle_escapes(state);
    for _ in &escapes.stolen {
        hooks.record(ScoreEvent::ResourceLost);
    }
    report.escapes = escapes.escaped;
    report.resources_stolen = escapes.stolen;
    report.timeouts = director::handle_boundaries(state, dt);
    drop_stray_asteroids(state);

    // Frame end
    state.compact();
    state.normalize_order();

    if state.resources_remaining() == 0 {
        state.phase = GamePhase::GameOver;
        report.game_over = true;
        log::info!("Game over on wave {} with score {}", state.wave, hooks.ledger.score());
    } else if state.phase == GamePhase::Playing && state.agents.is_empty() {
        let wave = state.wave;
        hooks.record(ScoreEvent::WaveComplete);
        if state.director.resources_lost == 0 {
            hooks.record(ScoreEvent::PerfectWave);
        }
        state.phase = GamePhase::Breather;
        state.breather_timer = state.settings.breather_duration;
        report.wave_completed = Some(wave);
        log::info!("Wave {wave} complete");
    }

    report.events = hooks.events;
    report.points = hooks.points;
    report
}

/// Move everything by its velocity
fn integrate(state: &mut GameState, dt: f32) {
    for agent in state.agents.iter_mut().filter(|a| a.is_alive() && a.is_steered()) {
        agent.update(dt);
    }
    for asteroid in state.asteroids.iter_mut().filter(|a| a.is_alive()) {
        asteroid.update(dt);
    }
    for projectile in state.projectiles.iter_mut().filter(|p| p.is_alive()) {
        projectile.update(dt);
    }
}

/// Step every live elite and carry out what it asks for. Returns shots fired.
fn advance_elites(state: &mut GameState, dt: f32) -> u32 {
    let screen = state.screen();
    let wave = state.wave;
    let mut requests: Vec<(u32, EliteAction)> = Vec::new();

    for agent in state.agents.iter_mut() {
        if !agent.is_alive() || agent.elite.is_none() {
            continue;
        }
        let nearest_asteroid = state
            .asteroids
            .iter()
            .filter(|a| a.is_alive())
            .min_by(|a, b| {
                distance_squared(agent.pos, a.pos)
                    .partial_cmp(&distance_squared(agent.pos, b.pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|a| a.pos);
        let ctx = EliteContext {
            screen,
            wave,
            nearest_asteroid,
        };
        let id = agent.id;
        requests.extend(
            elite::advance(agent, &ctx, dt, &mut state.rng)
                .into_iter()
                .map(|action| (id, action)),
        );
    }

    let mut fired = 0;
    for (owner, action) in requests {
        match action {
            EliteAction::Fire { origin, direction } => {
                let id = state.ids.allocate();
                state.projectiles.push(Projectile::directed(
                    id,
                    owner,
                    origin,
                    direction,
                    state.settings.projectile_speed,
                    state.settings.projectile_lifetime,
                    &mut state.rng,
                ));
                fired += 1;
            }
            EliteAction::ReleaseResource { resource, .. } => {
                if let Some(r) = state.resource_mut(resource) {
                    r.restore();
                    log::info!("Resource {} returned home", r.index);
                }
            }
            EliteAction::Departed => log::info!("Elite {owner} departed"),
        }
    }
    fired
}

/// Carried resources track their carrier; orphaned ones go home
fn follow_carriers(state: &mut GameState) {
    for resource in state.resources.iter_mut() {
        let Some(carrier) = resource.carrier else {
            continue;
        };
        match state.agents.iter().find(|a| a.id == carrier && a.is_alive()) {
            Some(agent) => resource.pos = agent.pos,
            None => resource.restore(),
        }
    }
}

fn drop_stray_asteroids(state: &mut GameState) {
    let screen = state.screen();
    for asteroid in state.asteroids.iter_mut().filter(|a| a.is_alive()) {
        if is_off_screen(asteroid.pos, asteroid.size + ASTEROID_EXIT_MARGIN, screen) {
            asteroid.destroy();
        }
    }
}

/// Aim point helper for launching at the flock: the live agent nearest `from`
pub fn nearest_agent(state: &GameState, from: Vec2) -> Option<Vec2> {
    state
        .agents
        .iter()
        .filter(|a| a.is_alive())
        .min_by(|a, b| {
            distance_squared(from, a.pos)
                .partial_cmp(&distance_squared(from, b.pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|a| a.pos)
}
