//! Collision detection and response
//!
//! One pass per frame over each interacting pair of entity kinds, in this
//! order: agent–asteroid, asteroid–asteroid, agent–resource,
//! projectile–asteroid. Every candidate pair is a squared-distance test
//! against the squared sum of radii.
//!
//! Two per-frame sets keep resolution exact:
//! - the processed-pair set records each unordered pair at most once;
//! - the resolved set stops an entity from resolving twice, even when it
//!   overlaps several others at once. Ties go to the lowest index.
//!
//! Nothing is removed from the containers here. Destroyed entities are marked
//! dead (and skipped by every later check); fragments are held as pending and
//! appended once all passes are done.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;

use super::elite::{BossHit, Elite, ShredderHit, StarBaseHit};
use super::entity::{Agent, Asteroid, Entity, Resource, SizeClass};
use super::fragment::split_asteroid;
use super::numeric::{distance_squared, normalize, sanitize};
use super::scoring::ScoreEvent;
use super::state::{GameState, IdAllocator};
use crate::consts::{MIN_ASTEROID_SIZE, RESOURCE_RADIUS};
use crate::error::EffectError;

/// Size factor applied by the default fate when an agent dents an asteroid
pub const SHRINK_FACTOR: f32 = 0.85;

/// Reference to one entity by container and index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    Agent(usize),
    Asteroid(usize),
    Projectile(usize),
    Resource(usize),
}

/// What happens to an asteroid after it rams a regular agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AsteroidFate {
    /// Keep flying at the new (smaller) size
    Shrink(f32),
    Destroy,
}

/// Shrink by [`SHRINK_FACTOR`], or destroy once below the minimum size
pub fn default_asteroid_fate(asteroid: &Asteroid) -> AsteroidFate {
    let size = asteroid.size * SHRINK_FACTOR;
    if size.is_finite() && size >= MIN_ASTEROID_SIZE {
        AsteroidFate::Shrink(size)
    } else {
        AsteroidFate::Destroy
    }
}

/// Visual effects requested during resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Explosion { pos: Vec2, size: f32 },
    ShieldHit { pos: Vec2, radius: f32 },
    Shredded { pos: Vec2 },
    Pickup { pos: Vec2 },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Explosion { .. } => "explosion",
            Effect::ShieldHit { .. } => "shield_hit",
            Effect::Shredded { .. } => "shredded",
            Effect::Pickup { .. } => "pickup",
        }
    }
}

/// Consumer of visual effects (renderer, audio). Failures are logged and skipped.
///
/// The frame pipeline also asks the sink what becomes of an asteroid that
/// rams a regular agent; the default shrinks it.
pub trait EffectSink {
    fn play(&mut self, effect: &Effect) -> Result<(), EffectError>;

    fn asteroid_fate(&mut self, asteroid: &Asteroid, _agent: &Agent) -> AsteroidFate {
        default_asteroid_fate(asteroid)
    }
}

/// Sink that drops every effect
#[derive(Debug, Default)]
pub struct NoEffects;

impl EffectSink for NoEffects {
    fn play(&mut self, _effect: &Effect) -> Result<(), EffectError> {
        Ok(())
    }
}

/// Callbacks the collision pass makes into the rest of the game
pub trait CollisionHooks {
    /// Decide the asteroid's fate after it kills a regular agent
    fn asteroid_fate(&mut self, asteroid: &Asteroid, _agent: &Agent) -> AsteroidFate {
        default_asteroid_fate(asteroid)
    }

    /// Score an event. Runs before the entities involved are marked dead.
    fn score(&mut self, event: ScoreEvent, agent: Option<&Agent>);

    fn effect(&mut self, effect: &Effect) -> Result<(), EffectError>;
}

/// What one collision pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Unordered pairs resolved this frame
    pub pairs: usize,
    /// Agents (including elites) destroyed
    pub kills: u32,
    /// Calls into fragmentation
    pub fragmentations: u32,
    /// Fragments created (appended to the asteroid list)
    pub fragments: u32,
    pub pickups: u32,
    pub bounces: u32,
    pub effect_faults: u32,
}

/// Per-frame bookkeeping of what has already been resolved
#[derive(Debug, Default)]
pub struct CollisionFrame {
    pairs: HashSet<(EntityRef, EntityRef)>,
    resolved: HashSet<EntityRef>,
}

impl CollisionFrame {
    /// Claim the pair for resolution. Fails if the pair was seen or either side
    /// already resolved this frame.
    pub fn claim(&mut self, a: EntityRef, b: EntityRef) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        if self.resolved.contains(&a) || self.resolved.contains(&b) || self.pairs.contains(&key) {
            return false;
        }
        self.pairs.insert(key);
        self.resolved.insert(a);
        self.resolved.insert(b);
        true
    }

    pub fn is_resolved(&self, entity: EntityRef) -> bool {
        self.resolved.contains(&entity)
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }
}

/// Circle overlap by squared distance
pub fn overlaps(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    distance_squared(a, b) < r * r
}

/// Which kill event an agent's death is worth (carrier beats navigator beats shooter)
pub fn kill_event(agent: &Agent) -> ScoreEvent {
    if agent.carrying.is_some() {
        ScoreEvent::ResourceCarrierKill
    } else if agent.is_super_navigator() {
        ScoreEvent::EliteNavigatorKill
    } else if agent.is_shooter() {
        ScoreEvent::ShooterKill
    } else {
        ScoreEvent::RegularKill
    }
}

/// Run every collision pass for this frame
pub fn resolve_collisions(state: &mut GameState, hooks: &mut impl CollisionHooks) -> CollisionReport {
    let mut frame = CollisionFrame::default();
    let mut report = CollisionReport::default();
    let mut pending: Vec<Asteroid> = Vec::new();
    let cap = state.settings.max_asteroids;

    agent_asteroid_pass(state, hooks, &mut frame, &mut report, &mut pending, cap);
    asteroid_asteroid_pass(&mut state.asteroids, &mut frame, &mut report);
    agent_resource_pass(&mut state.agents, &mut state.resources, hooks, &mut frame, &mut report);
    projectile_asteroid_pass(state, hooks, &mut frame, &mut report, &mut pending, cap);

    report.pairs = frame.pair_count();
    report.fragments = pending.len() as u32;
    state.asteroids.append(&mut pending);

    if report.pairs > 0 {
        log::debug!(
            "Collisions: {} pairs, {} kills, {} fragmentations",
            report.pairs,
            report.kills,
            report.fragmentations
        );
    }
    report
}

fn play(hooks: &mut impl CollisionHooks, effect: Effect, report: &mut CollisionReport) {
    if let Err(err) = hooks.effect(&effect) {
        log::warn!("Effect {} failed: {err}", effect.name());
        report.effect_faults += 1;
    }
}

/// Split a (now dead) parent into the pending list
#[allow(clippy::too_many_arguments)]
fn fragment(
    parent: &Asteroid,
    live: &[Asteroid],
    pending: &mut Vec<Asteroid>,
    cap: usize,
    repulsion: Option<Vec2>,
    ids: &mut IdAllocator,
    rng: &mut impl Rng,
    report: &mut CollisionReport,
) {
    let population = live.iter().filter(|a| a.is_alive()).count() + pending.len();
    let children = split_asteroid(parent, population, cap, repulsion, || ids.allocate(), rng);
    report.fragmentations += 1;
    pending.extend(children);
}

fn release_carried(agent: &Agent, resources: &mut [Resource]) {
    let Some(id) = agent.carrying else {
        return;
    };
    if let Some(resource) = resources.iter_mut().find(|r| r.id == id) {
        resource.restore();
    }
}

fn agent_asteroid_pass(
    state: &mut GameState,
    hooks: &mut impl CollisionHooks,
    frame: &mut CollisionFrame,
    report: &mut CollisionReport,
    pending: &mut Vec<Asteroid>,
    cap: usize,
) {
    let mut kills_this_frame = 0u32;

    for i in 0..state.agents.len() {
        for j in 0..state.asteroids.len() {
            let agent = &state.agents[i];
            let rock = &state.asteroids[j];
            if !agent.is_alive() || !rock.is_alive() {
                continue;
            }
            if !overlaps(agent.pos, agent.radius(), rock.pos, rock.size) {
                continue;
            }
            if !frame.claim(EntityRef::Agent(i), EntityRef::Asteroid(j)) {
                continue;
            }

            if state.agents[i].is_regular() {
                let agent = &state.agents[i];
                hooks.score(kill_event(agent), Some(agent));
                let fate = hooks.asteroid_fate(&state.asteroids[j], agent);
                release_carried(agent, &mut state.resources);
                let pos = agent.pos;
                state.agents[i].destroy();
                kills_this_frame += 1;
                report.kills += 1;

                let rock = &mut state.asteroids[j];
                match fate {
                    AsteroidFate::Shrink(size)
                        if size.is_finite() && size >= MIN_ASTEROID_SIZE && size < rock.size =>
                    {
                        rock.size = size;
                    }
                    _ => rock.destroy(),
                }
                play(hooks, Effect::Explosion { pos, size: rock.size }, report);
            } else {
                kills_this_frame += elite_asteroid(state, i, j, hooks, report, pending, cap);
            }
            // This agent is resolved for the frame
            break;
        }
    }

    if kills_this_frame >= 2 {
        hooks.score(ScoreEvent::MultiKill, None);
    }
}

/// Elite hit by an asteroid. Returns 1 if the elite was destroyed.
fn elite_asteroid(
    state: &mut GameState,
    i: usize,
    j: usize,
    hooks: &mut impl CollisionHooks,
    report: &mut CollisionReport,
    pending: &mut Vec<Asteroid>,
    cap: usize,
) -> u32 {
    let center = state.agents[i].pos;
    let radius = state.agents[i].radius();
    let Some(elite) = state.agents[i].elite.as_mut() else {
        return 0;
    };

    // Outcome: (score events, destroyed, resource to release)
    let mut events: Vec<ScoreEvent> = Vec::new();
    let mut destroyed = false;
    let mut release = None;
    let effect = match elite {
        Elite::Boss(boss) => match boss.hit() {
            BossHit::Damaged { .. } => {
                events.push(ScoreEvent::BossHit);
                Effect::ShieldHit { pos: center, radius }
            }
            BossHit::Defeated => {
                events.push(ScoreEvent::BossHit);
                events.push(ScoreEvent::BossDefeated);
                destroyed = true;
                Effect::Explosion { pos: center, size: radius }
            }
            BossHit::Ignored => return 0,
        },
        Elite::StarBase(base) => match base.hit() {
            StarBaseHit::Damaged { .. } => Effect::ShieldHit { pos: center, radius },
            StarBaseHit::Destroyed { release: r } => {
                events.push(ScoreEvent::EliteStructureDestroyed);
                destroyed = true;
                release = r;
                Effect::Explosion { pos: center, size: radius }
            }
            StarBaseHit::Ignored => return 0,
        },
        Elite::Shredder(shredder) => match shredder.hit() {
            ShredderHit::Shredded => Effect::Shredded { pos: state.asteroids[j].pos },
            ShredderHit::Damaged { .. } => Effect::ShieldHit { pos: center, radius },
            ShredderHit::Destroyed => {
                events.push(ScoreEvent::EliteStructureDestroyed);
                destroyed = true;
                Effect::Explosion { pos: center, size: radius }
            }
            ShredderHit::Ignored => return 0,
        },
    };

    for event in events {
        hooks.score(event, Some(&state.agents[i]));
    }
    if let Some((resource, _)) = release {
        if let Some(r) = state.resources.iter_mut().find(|r| r.id == resource) {
            r.restore();
        }
    }
    if destroyed {
        log::info!("{:?} {} destroyed", state.agents[i].kind(), state.agents[i].id);
        state.agents[i].destroy();
        report.kills += 1;
    }

    // The asteroid breaks apart against the shield or blades
    state.asteroids[j].destroy();
    let parent = state.asteroids[j].clone();
    fragment(
        &parent,
        &state.asteroids,
        pending,
        cap,
        Some(center),
        &mut state.ids,
        &mut state.rng,
        report,
    );
    play(hooks, effect, report);
    u32::from(destroyed)
}

fn asteroid_asteroid_pass(asteroids: &mut [Asteroid], frame: &mut CollisionFrame, report: &mut CollisionReport) {
    for i in 0..asteroids.len() {
        for j in (i + 1)..asteroids.len() {
            let (a, b) = (&asteroids[i], &asteroids[j]);
            if !a.is_alive() || !b.is_alive() || !overlaps(a.pos, a.size, b.pos, b.size) {
                continue;
            }
            if !frame.claim(EntityRef::Asteroid(i), EntityRef::Asteroid(j)) {
                continue;
            }
            let (left, right) = asteroids.split_at_mut(j);
            bounce(&mut left[i], &mut right[0]);
            report.bounces += 1;
            break;
        }
    }
}

/// Elastic bounce between two rocks, then push them apart
fn bounce(a: &mut Asteroid, b: &mut Asteroid) {
    let delta = b.pos - a.pos;
    let mut normal = normalize(delta);
    if normal == Vec2::ZERO {
        normal = Vec2::X;
    }
    let (ma, mb) = (a.mass(), b.mass());
    let total = ma + mb;
    if !(total.is_finite() && total > 0.0) {
        return;
    }

    let closing = (a.vel - b.vel).dot(normal);
    if closing > 0.0 {
        let impulse = 2.0 * closing / total;
        a.vel = sanitize(a.vel - normal * impulse * mb);
        b.vel = sanitize(b.vel + normal * impulse * ma);
    }

    let overlap = a.size + b.size - delta.length();
    if overlap.is_finite() && overlap > 0.0 {
        a.pos = sanitize(a.pos - normal * overlap * (mb / total));
        b.pos = sanitize(b.pos + normal * overlap * (ma / total));
    }
}

fn agent_resource_pass(
    agents: &mut [Agent],
    resources: &mut [Resource],
    hooks: &mut impl CollisionHooks,
    frame: &mut CollisionFrame,
    report: &mut CollisionReport,
) {
    for (i, agent) in agents.iter_mut().enumerate() {
        if !agent.is_alive() || !agent.is_regular() || agent.carrying.is_some() {
            continue;
        }
        for (j, resource) in resources.iter_mut().enumerate() {
            if !resource.is_available() || !overlaps(agent.pos, agent.radius(), resource.pos, RESOURCE_RADIUS) {
                continue;
            }
            if !frame.claim(EntityRef::Agent(i), EntityRef::Resource(j)) {
                continue;
            }
            if resource.pick_up(agent.id) {
                agent.carrying = Some(resource.id);
                report.pickups += 1;
                log::debug!("Agent {} picked up resource {}", agent.id, resource.index);
                play(hooks, Effect::Pickup { pos: resource.pos }, report);
            }
            break;
        }
    }
}

fn projectile_asteroid_pass(
    state: &mut GameState,
    hooks: &mut impl CollisionHooks,
    frame: &mut CollisionFrame,
    report: &mut CollisionReport,
    pending: &mut Vec<Asteroid>,
    cap: usize,
) {
    for i in 0..state.projectiles.len() {
        for j in 0..state.asteroids.len() {
            let shot = &state.projectiles[i];
            let rock = &state.asteroids[j];
            if !shot.is_alive() || !rock.is_alive() || !overlaps(shot.pos, shot.size, rock.pos, rock.size) {
                continue;
            }
            if !frame.claim(EntityRef::Projectile(i), EntityRef::Asteroid(j)) {
                continue;
            }

            hooks.score(ScoreEvent::AsteroidSplit, None);
            state.projectiles[i].destroy();
            state.asteroids[j].destroy();
            let parent = state.asteroids[j].clone();
            fragment(
                &parent,
                &state.asteroids,
                pending,
                cap,
                None,
                &mut state.ids,
                &mut state.rng,
                report,
            );
            let size = if parent.size_class() == SizeClass::Small { parent.size } else { parent.size * 0.5 };
            play(hooks, Effect::Explosion { pos: parent.pos, size }, report);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::Settings;
    use crate::sim::elite::{Boss, StarBase};
    use crate::sim::entity::{Personality, Projectile};

    /// Hooks that record everything and can be told to fail effects
    #[derive(Default)]
    struct Recorder {
        events: Vec<ScoreEvent>,
        /// Agent alive flag seen by the scoring callback
        alive_at_score: Vec<bool>,
        effects: u32,
        fail_effects: bool,
        fate: Option<AsteroidFate>,
    }

    impl CollisionHooks for Recorder {
        fn asteroid_fate(&mut self, asteroid: &Asteroid, _agent: &Agent) -> AsteroidFate {
            self.fate.unwrap_or_else(|| default_asteroid_fate(asteroid))
        }

        fn score(&mut self, event: ScoreEvent, agent: Option<&Agent>) {
            self.events.push(event);
            if let Some(agent) = agent {
                self.alive_at_score.push(agent.is_alive());
            }
        }

        fn effect(&mut self, _effect: &Effect) -> Result<(), EffectError> {
            self.effects += 1;
            if self.fail_effects {
                Err(EffectError::new("test", "boom"))
            } else {
                Ok(())
            }
        }
    }

    fn empty_state() -> GameState {
        GameState::new(7, Settings::default())
    }

    fn agent(state: &mut GameState, pos: Vec2) -> usize {
        let id = state.next_entity_id();
        state
            .agents
            .push(Agent::with_traits(id, pos, Personality::Aggressive, false, false));
        state.agents.len() - 1
    }

    fn rock(state: &mut GameState, pos: Vec2, vel: Vec2, size: f32) -> usize {
        state.spawn_asteroid(pos, vel, size);
        state.asteroids.len() - 1
    }

    #[test]
    fn test_claim_is_once_per_pair_and_entity() {
        let mut frame = CollisionFrame::default();
        assert!(frame.claim(EntityRef::Agent(0), EntityRef::Asteroid(1)));
        assert!(!frame.claim(EntityRef::Asteroid(1), EntityRef::Agent(0)));
        // Asteroid 1 already resolved
        assert!(!frame.claim(EntityRef::Agent(2), EntityRef::Asteroid(1)));
        assert!(frame.claim(EntityRef::Agent(2), EntityRef::Asteroid(3)));
        assert_eq!(frame.pair_count(), 2);
    }

    #[test]
    fn test_agent_asteroid_scores_before_removal() {
        let mut state = empty_state();
        agent(&mut state, Vec2::new(300.0, 300.0));
        rock(&mut state, Vec2::new(310.0, 300.0), Vec2::ZERO, LARGE_ASTEROID_SIZE);
        let mut hooks = Recorder::default();
        let report = resolve_collisions(&mut state, &mut hooks);

        assert_eq!(hooks.events, vec![ScoreEvent::RegularKill]);
        assert_eq!(hooks.alive_at_score, vec![true]);
        assert!(!state.agents[0].is_alive());
        assert_eq!(report.kills, 1);
        // Default fate shrinks the rock
        assert!(state.asteroids[0].is_alive());
        assert!((state.asteroids[0].size - LARGE_ASTEROID_SIZE * SHRINK_FACTOR).abs() < 1e-4);
    }

    #[test]
    fn test_destroy_fate_removes_asteroid() {
        let mut state = empty_state();
        agent(&mut state, Vec2::new(300.0, 300.0));
        rock(&mut state, Vec2::new(310.0, 300.0), Vec2::ZERO, MEDIUM_ASTEROID_SIZE);
        let mut hooks = Recorder {
            fate: Some(AsteroidFate::Destroy),
            ..Default::default()
        };
        let report = resolve_collisions(&mut state, &mut hooks);
        assert!(!state.asteroids[0].is_alive());
        // Consumed, not split
        assert_eq!(report.fragmentations, 0);
    }

    #[test]
    fn test_one_asteroid_kills_one_agent_per_frame() {
        let mut state = empty_state();
        agent(&mut state, Vec2::new(300.0, 300.0));
        agent(&mut state, Vec2::new(305.0, 300.0));
        rock(&mut state, Vec2::new(302.0, 300.0), Vec2::ZERO, LARGE_ASTEROID_SIZE);
        let mut hooks = Recorder::default();
        let report = resolve_collisions(&mut state, &mut hooks);
        // Lowest index wins the tie
        assert!(!state.agents[0].is_alive());
        assert!(state.agents[1].is_alive());
        assert_eq!(report.kills, 1);
        assert!(!hooks.events.contains(&ScoreEvent::MultiKill));
    }

    #[test]
    fn test_two_kills_award_multi_kill() {
        let mut state = empty_state();
        agent(&mut state, Vec2::new(100.0, 300.0));
        agent(&mut state, Vec2::new(600.0, 300.0));
        rock(&mut state, Vec2::new(100.0, 300.0), Vec2::ZERO, MEDIUM_ASTEROID_SIZE);
        rock(&mut state, Vec2::new(600.0, 300.0), Vec2::ZERO, MEDIUM_ASTEROID_SIZE);
        let mut hooks = Recorder::default();
        resolve_collisions(&mut state, &mut hooks);
        let multi = hooks.events.iter().filter(|e| **e == ScoreEvent::MultiKill).count();
        assert_eq!(multi, 1);
    }

    #[test]
    fn test_carrier_kill_returns_resource() {
        let mut state = empty_state();
        let i = agent(&mut state, Vec2::new(300.0, 300.0));
        let res_id = state.resources[2].id;
        let agent_id = state.agents[i].id;
        assert!(state.resources[2].pick_up(agent_id));
        state.agents[i].carrying = Some(res_id);
        rock(&mut state, Vec2::new(300.0, 300.0), Vec2::ZERO, LARGE_ASTEROID_SIZE);

        let mut hooks = Recorder::default();
        resolve_collisions(&mut state, &mut hooks);
        assert_eq!(hooks.events[0], ScoreEvent::ResourceCarrierKill);
        assert!(state.resources[2].is_available());
        assert_eq!(state.resources[2].pos, state.resources[2].home);
    }

    #[test]
    fn test_projectile_fragments_exactly_once() {
        let mut state = empty_state();
        rock(&mut state, Vec2::new(400.0, 300.0), Vec2::new(50.0, 0.0), LARGE_ASTEROID_SIZE);
        let owner = state.next_entity_id();
        let id = state.next_entity_id();
        let mut shot = Projectile::directed(id, owner, Vec2::new(400.0, 300.0), Vec2::X, 100.0, 2.0, &mut state.rng);
        shot.pos = Vec2::new(400.0, 300.0);
        state.projectiles.push(shot.clone());
        // A second shot on the same rock must not split it again
        let mut second = shot;
        second.id = state.next_entity_id();
        state.projectiles.push(second);

        let mut hooks = Recorder::default();
        let report = resolve_collisions(&mut state, &mut hooks);
        assert_eq!(report.fragmentations, 1);
        assert_eq!(report.fragments, 2);
        assert!(!state.projectiles[0].is_alive());
        assert!(state.projectiles[1].is_alive());
        assert!(!state.asteroids[0].is_alive());
        let live: Vec<&Asteroid> = state.asteroids.iter().filter(|a| a.is_alive()).collect();
        assert_eq!(live.len(), 2);
        for f in live {
            assert!(f.vel.is_finite() && f.vel.length() > 0.0);
        }
    }

    #[test]
    fn test_asteroids_bounce_apart() {
        let mut state = empty_state();
        rock(&mut state, Vec2::new(400.0, 300.0), Vec2::new(50.0, 0.0), MEDIUM_ASTEROID_SIZE);
        rock(&mut state, Vec2::new(460.0, 300.0), Vec2::new(-50.0, 0.0), MEDIUM_ASTEROID_SIZE);
        let mut hooks = Recorder::default();
        let report = resolve_collisions(&mut state, &mut hooks);
        assert_eq!(report.bounces, 1);
        assert!(state.asteroids[0].vel.x < 0.0);
        assert!(state.asteroids[1].vel.x > 0.0);
        let gap = state.asteroids[0].pos.distance(state.asteroids[1].pos);
        assert!(gap >= 2.0 * MEDIUM_ASTEROID_SIZE - 1e-3);
    }

    #[test]
    fn test_agent_picks_up_resource() {
        let mut state = empty_state();
        let home = state.resources[1].home;
        let i = agent(&mut state, home);
        let mut hooks = Recorder::default();
        let report = resolve_collisions(&mut state, &mut hooks);
        assert_eq!(report.pickups, 1);
        assert_eq!(state.agents[i].carrying, Some(state.resources[1].id));
        assert_eq!(state.resources[1].carrier, Some(state.agents[i].id));
    }

    #[test]
    fn test_failing_effect_does_not_abort_resolution() {
        let mut state = empty_state();
        agent(&mut state, Vec2::new(100.0, 300.0));
        agent(&mut state, Vec2::new(600.0, 300.0));
        rock(&mut state, Vec2::new(100.0, 300.0), Vec2::ZERO, MEDIUM_ASTEROID_SIZE);
        rock(&mut state, Vec2::new(600.0, 300.0), Vec2::ZERO, MEDIUM_ASTEROID_SIZE);
        let mut hooks = Recorder {
            fail_effects: true,
            ..Default::default()
        };
        let report = resolve_collisions(&mut state, &mut hooks);
        assert_eq!(report.kills, 2);
        assert_eq!(report.effect_faults, 2);
    }

    #[test]
    fn test_boss_shield_repels_and_scores() {
        let mut state = empty_state();
        let id = state.next_entity_id();
        let boss = Agent::with_traits(id, Vec2::new(400.0, 300.0), Personality::Aggressive, false, false)
            .with_elite(Elite::Boss(Boss::new(2, 0.0)));
        state.agents.push(boss);
        rock(&mut state, Vec2::new(430.0, 300.0), Vec2::ZERO, LARGE_ASTEROID_SIZE);

        let mut hooks = Recorder::default();
        let report = resolve_collisions(&mut state, &mut hooks);
        assert_eq!(hooks.events, vec![ScoreEvent::BossHit]);
        assert!(state.agents[0].is_alive());
        assert_eq!(report.fragmentations, 1);
        // Fragments fly away from the boss
        for f in state.asteroids.iter().filter(|a| a.is_alive()) {
            assert!(f.vel.x > 0.0);
        }

        rock(&mut state, Vec2::new(370.0, 300.0), Vec2::ZERO, LARGE_ASTEROID_SIZE);
        let mut hooks = Recorder::default();
        resolve_collisions(&mut state, &mut hooks);
        assert!(hooks.events.contains(&ScoreEvent::BossDefeated));
        assert!(!state.agents[0].is_alive());
    }

    #[test]
    fn test_starbase_destroyed_releases_resource() {
        let mut state = empty_state();
        let res = state.resources[0].id;
        let home = state.resources[0].home;
        assert!(state.resources[0].pick_up(0));
        let mut base = StarBase::new(1, STARBASE_SIZE, 360.0, Some((res, home)));
        for _ in 0..5 {
            base.hit();
        }
        let id = state.next_entity_id();
        let agent = Agent::with_traits(id, Vec2::new(600.0, 300.0), Personality::Loner, false, false)
            .with_elite(Elite::StarBase(base));
        state.agents.push(agent);
        rock(&mut state, Vec2::new(600.0, 300.0), Vec2::ZERO, SMALL_ASTEROID_SIZE);

        let mut hooks = Recorder::default();
        resolve_collisions(&mut state, &mut hooks);
        assert_eq!(hooks.events, vec![ScoreEvent::EliteStructureDestroyed]);
        assert!(!state.agents[0].is_alive());
        assert!(state.resources[0].is_available());
    }

    #[test]
    fn test_dead_entities_are_skipped() {
        let mut state = empty_state();
        let i = agent(&mut state, Vec2::new(300.0, 300.0));
        state.agents[i].destroy();
        rock(&mut state, Vec2::new(300.0, 300.0), Vec2::ZERO, LARGE_ASTEROID_SIZE);
        let mut hooks = Recorder::default();
        let report = resolve_collisions(&mut state, &mut hooks);
        assert_eq!(report.pairs, 0);
        assert!(hooks.events.is_empty());
    }
}
