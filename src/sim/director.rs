//! Wave and spawn director
//!
//! Decides how many agents a wave brings, when bosses, StarBases and
//! Shredders appear, and how the flock answers an escape: every agent that
//! reaches the top is replaced by a wave-scaled burst.

use glam::Vec2;
use rand::Rng;

use super::elite::{Boss, Elite, Shredder, StarBase};
use super::entity::{Agent, Entity, EntityKind, Personality};
use super::state::{GamePhase, GameState};
use crate::consts::*;

/// Highest wave accepted from untrusted input
pub const MAX_WAVE: u32 = 10_000;
/// Growth per wave after wave 3
pub const WAVE_GROWTH: f64 = 1.15;
/// Seconds into the game before the first elite timer can fire
pub const ELITE_INITIAL_DELAY: f32 = 5.0;
/// Agents are removed this far past the side and bottom edges
pub const BOUNDARY_MARGIN: f32 = 50.0;
/// Cap on the number of agents a single wave can schedule
const MAX_WAVE_AGENTS: u32 = 200;
const ENTRY_SPEED: f32 = 60.0;

/// Agents spawned at the start of `wave`
pub fn agents_for_wave(wave: u32) -> u32 {
    match wave {
        0 | 1 => 2,
        2 => 3,
        3 => 4,
        n => {
            let count = 4.0 * WAVE_GROWTH.powi((n - 3).min(1_000) as i32);
            (count.round() as u32).min(MAX_WAVE_AGENTS)
        }
    }
}

/// Every fifth wave is a boss wave
pub fn is_boss_wave(wave: u32) -> bool {
    wave > 0 && wave % 5 == 0
}

/// Boss line-up for a boss wave
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossPlan {
    pub count: u32,
    pub health: u32,
    pub shoot_probability: f64,
}

/// Boss waves run in cycles of three with health 5, 10, 15. Each new cycle
/// adds a boss (up to five) and makes them likelier to fire.
pub fn boss_plan(wave: u32) -> Option<BossPlan> {
    if !is_boss_wave(wave) {
        return None;
    }
    let index = wave / 5 - 1;
    let cycle = index / 3;
    let health = [5, 10, 15][(index % 3) as usize];
    let shoot_probability = if cycle == 0 {
        0.0
    } else {
        (0.5 + 0.1 * (cycle - 1) as f64).min(1.0)
    };
    Some(BossPlan {
        count: (cycle + 1).min(5),
        health,
        shoot_probability,
    })
}

/// Turn an untrusted wave number into a usable one (NaN, infinite, zero and
/// negative values become wave 1)
pub fn coerce_wave(raw: f64) -> u32 {
    if !raw.is_finite() || raw < 1.0 {
        log::warn!("Coerced invalid wave {raw} to 1");
        return 1;
    }
    (raw.floor() as u32).min(MAX_WAVE)
}

/// Wave bookkeeping and elite spawn timers
#[derive(Debug, Clone)]
pub struct Director {
    pub starbase_timer: f32,
    pub shredder_timer: f32,
    /// Resources stolen since the current wave began
    pub resources_lost: u32,
}

impl Default for Director {
    fn default() -> Self {
        Self {
            starbase_timer: ELITE_INITIAL_DELAY,
            shredder_timer: ELITE_INITIAL_DELAY,
            resources_lost: 0,
        }
    }
}

/// Entry point on a side edge, in the upper middle band, heading inward
pub fn side_entry(screen: Vec2, rng: &mut impl Rng) -> (Vec2, Vec2) {
    let left = rng.random_bool(0.5);
    let y = rng.random_range(screen.y * 0.15..=screen.y * 0.55);
    let x = if left { -AGENT_RADIUS * 2.0 } else { screen.x + AGENT_RADIUS * 2.0 };
    let vel = Vec2::new(if left { ENTRY_SPEED } else { -ENTRY_SPEED }, 0.0);
    (Vec2::new(x, y), vel)
}

/// Spawn `count` regular agents; returns their IDs
pub fn spawn_agents(state: &mut GameState, count: u32) -> Vec<u32> {
    let screen = state.screen();
    (0..count)
        .map(|_| {
            let id = state.ids.allocate();
            let (pos, vel) = side_entry(screen, &mut state.rng);
            state.agents.push(Agent::spawn(id, pos, vel, &mut state.rng));
            id
        })
        .collect()
}

pub fn spawn_bosses(state: &mut GameState, plan: BossPlan) -> Vec<u32> {
    let screen = state.screen();
    (0..plan.count)
        .map(|_| {
            let id = state.ids.allocate();
            let (pos, vel) = side_entry(screen, &mut state.rng);
            let mut boss = Agent::with_traits(id, pos, Personality::Aggressive, true, true)
                .with_elite(Elite::Boss(Boss::new(plan.health, plan.shoot_probability)));
            boss.vel = vel;
            boss.shoot_cooldown = state.settings.shooter_cooldown;
            state.agents.push(boss);
            id
        })
        .collect()
}

/// Spawn a StarBase above the screen. It holds one available resource hostage.
pub fn spawn_starbase(state: &mut GameState, wave: u32) -> u32 {
    let id = state.ids.allocate();
    let screen = state.screen();
    let x = state.rng.random_range(screen.x * 0.25..=screen.x * 0.75);
    let pos = Vec2::new(x, -STARBASE_SIZE * 2.0);

    let available: Vec<usize> = (0..state.resources.len())
        .filter(|&i| state.resources[i].is_available())
        .collect();
    let hostage = if available.is_empty() {
        None
    } else {
        let i = available[state.rng.random_range(0..available.len())];
        let resource = &mut state.resources[i];
        resource.pick_up(id).then_some((resource.id, resource.home))
    };

    let base = StarBase::new(wave, STARBASE_SIZE, screen.y / 2.0, hostage);
    log::info!(
        "StarBase {id} spawned on wave {wave} with health {}",
        base.health()
    );
    state
        .agents
        .push(Agent::with_traits(id, pos, Personality::Loner, false, false).with_elite(Elite::StarBase(base)));
    id
}

pub fn spawn_shredder(state: &mut GameState, wave: u32) -> u32 {
    let id = state.ids.allocate();
    let screen = state.screen();
    let x = state.rng.random_range(screen.x * 0.2..=screen.x * 0.8);
    let pos = Vec2::new(x, -SHREDDER_SIZE * 2.0);
    let shredder = Shredder::new(wave, screen.y * 0.3);
    log::info!("Shredder {id} spawned on wave {wave}");
    state
        .agents
        .push(Agent::with_traits(id, pos, Personality::Loner, false, false).with_elite(Elite::Shredder(shredder)));
    id
}

/// Start `wave`: reset per-wave bookkeeping and spawn its agents and bosses
pub fn begin_wave(state: &mut GameState, wave: u32) {
    let wave = wave.clamp(1, MAX_WAVE);
    state.wave = wave;
    state.phase = GamePhase::Playing;
    state.breather_timer = 0.0;
    state.director.resources_lost = 0;

    let count = agents_for_wave(wave);
    spawn_agents(state, count);
    if let Some(plan) = boss_plan(wave) {
        log::info!(
            "Boss wave {wave}: {} boss(es), health {}, shoot probability {:.0}%",
            plan.count,
            plan.health,
            plan.shoot_probability * 100.0
        );
        spawn_bosses(state, plan);
    }
    log::info!("Wave {wave} started with {count} agents");
}

fn elite_alive(state: &GameState, kind: EntityKind) -> bool {
    state.agents.iter().any(|a| a.is_alive() && a.kind() == kind)
}

/// Tick the elite spawn timers while a wave is in progress
pub fn update(state: &mut GameState, dt: f32) {
    if state.phase != GamePhase::Playing {
        return;
    }
    let wave = state.wave;

    if wave >= state.settings.starbase_first_wave && !elite_alive(state, EntityKind::StarBase) {
        state.director.starbase_timer -= dt;
        if state.director.starbase_timer <= 0.0 {
            state.director.starbase_timer = state.settings.starbase_interval;
            spawn_starbase(state, wave);
        }
    }

    if wave >= state.settings.shredder_first_wave && !elite_alive(state, EntityKind::Shredder) {
        state.director.shredder_timer -= dt;
        if state.director.shredder_timer <= 0.0 {
            state.director.shredder_timer = state.settings.shredder_interval;
            spawn_shredder(state, wave);
        }
    }
}

/// Result of checking the top edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Escapes {
    pub escaped: u32,
    /// Slots of resources carried off this frame
    pub stolen: Vec<usize>,
    pub spawned: u32,
}

/// Remove agents that reached the top, mark their cargo stolen and answer
/// with one burst per escapee
pub fn handle_escapes(state: &mut GameState) -> Escapes {
    let mut escapes = Escapes::default();
    for agent in state.agents.iter_mut() {
        if !agent.is_alive() || !agent.is_regular() || agent.pos.y >= -AGENT_RADIUS {
            continue;
        }
        if let Some(id) = agent.carrying.take() {
            if let Some(resource) = state.resources.iter_mut().find(|r| r.id == id) {
                resource.carrier = None;
                resource.stolen = true;
                escapes.stolen.push(resource.index);
                log::info!("Resource {} stolen", resource.index);
            }
        }
        agent.destroy();
        escapes.escaped += 1;
    }

    if escapes.escaped > 0 {
        state.director.resources_lost += escapes.stolen.len() as u32;
        let burst = state.settings.escape_burst(state.wave).saturating_mul(escapes.escaped);
        escapes.spawned = spawn_agents(state, burst).len() as u32;
        log::debug!("{} escaped, spawning {}", escapes.escaped, escapes.spawned);
    }
    escapes
}

/// Remove steered agents that stay outside the playfield margin too long.
/// Returns how many timed out.
pub fn handle_boundaries(state: &mut GameState, dt: f32) -> u32 {
    let screen = state.screen();
    let timeout = state.settings.boundary_timeout;
    let mut removed = 0;
    for agent in state.agents.iter_mut() {
        if !agent.is_alive() || !agent.is_steered() {
            continue;
        }
        let outside = agent.pos.x < -BOUNDARY_MARGIN
            || agent.pos.x > screen.x + BOUNDARY_MARGIN
            || agent.pos.y > screen.y + BOUNDARY_MARGIN;
        if !outside {
            agent.out_of_bounds_time = 0.0;
            continue;
        }
        agent.out_of_bounds_time += dt;
        if agent.out_of_bounds_time > timeout {
            if let Some(id) = agent.carrying.take() {
                if let Some(resource) = state.resources.iter_mut().find(|r| r.id == id) {
                    resource.restore();
                }
            }
            log::debug!("Agent {} timed out off-screen", agent.id);
            agent.destroy();
            removed += 1;
        }
    }
    removed
}
