//! End-to-end scenarios driven through the public API

use flock_siege::consts::*;
use flock_siege::persistence::{JsonFileStore, SaveData, SaveStore};
use flock_siege::platform::{HookCall, RecordingHooks};
use flock_siege::sim::collision::{CollisionHooks, Effect, resolve_collisions};
use flock_siege::sim::director::{begin_wave, handle_escapes, spawn_agents};
use flock_siege::sim::elite::StarBase;
use flock_siege::sim::entity::{Agent, Asteroid, Entity, Projectile, SizeClass};
use flock_siege::sim::fragment::split_asteroid;
use flock_siege::sim::numeric::normalize;
use flock_siege::sim::scoring::{ScoreEvent, ScoreLedger};
use flock_siege::sim::{GamePhase, GameState, NoEffects, tick};
use flock_siege::error::EffectError;
use flock_siege::{Session, Settings};
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn session() -> Session<RecordingHooks> {
    Session::new(2024, Settings::default(), RecordingHooks::default())
}

#[test]
fn wave_one_starts_with_two_agents() {
    let s = session();
    assert_eq!(s.state().wave, 1);
    assert_eq!(s.state().live_agents(), 2);
    assert_eq!(s.phase(), GamePhase::Playing);
}

#[test]
fn top_reach_with_burst_ten_and_five_alive_gives_fifteen() {
    let settings = Settings {
        escape_burst_base: 10,
        escape_burst_per_wave: 0,
        ..Settings::default()
    };
    let mut state = GameState::new(5, settings);
    begin_wave(&mut state, 1);
    spawn_agents(&mut state, 4);
    assert_eq!(state.live_agents(), 6);

    state.agents[0].pos = Vec2::new(640.0, -25.0);
    let escapes = handle_escapes(&mut state);
    assert_eq!(escapes.escaped, 1);
    assert_eq!(state.live_agents(), 15);
}

#[test]
fn starbase_on_wave_seven_loses_shield_after_five_hits() {
    let mut base = StarBase::new(7, STARBASE_SIZE, SCREEN_HEIGHT / 2.0, None);
    assert_eq!(base.health(), 6);
    assert!(base.has_active_shield());
    for _ in 0..5 {
        base.hit();
    }
    assert!(!base.has_active_shield());
    assert_eq!(base.effective_radius(), STARBASE_SIZE);
}

/// Counts fragmentation through the report and score events through the hooks
#[derive(Default)]
struct Counter {
    splits: u32,
}

impl CollisionHooks for Counter {
    fn score(&mut self, event: ScoreEvent, _agent: Option<&Agent>) {
        if event == ScoreEvent::AsteroidSplit {
            self.splits += 1;
        }
    }

    fn effect(&mut self, _effect: &Effect) -> Result<(), EffectError> {
        Ok(())
    }
}

#[test]
fn projectile_hit_on_large_asteroid_fragments_exactly_once() {
    let mut state = GameState::new(8, Settings::default());
    state.spawn_asteroid(Vec2::new(500.0, 300.0), Vec2::new(0.0, -120.0), LARGE_ASTEROID_SIZE);
    let id = state.next_entity_id();
    let shot = Projectile::directed(id, 0, Vec2::new(520.0, 300.0), Vec2::X, 200.0, 2.0, &mut state.rng);
    state.projectiles.push(shot);

    let mut counter = Counter::default();
    let report = resolve_collisions(&mut state, &mut counter);
    assert_eq!(report.fragmentations, 1);
    assert_eq!(counter.splits, 1);

    let fragments: Vec<&Asteroid> = state.asteroids.iter().filter(|a| a.is_alive()).collect();
    assert_eq!(fragments.len(), 2);
    for f in fragments {
        assert_eq!(f.size_class(), SizeClass::Medium);
        assert!(f.vel.is_finite());
        assert!(f.vel.length() > 0.0);
    }

    // Nothing left to split on the next frame
    let again = resolve_collisions(&mut state, &mut counter);
    assert_eq!(again.fragmentations, 0);
    assert_eq!(counter.splits, 1);
}

#[test]
fn save_restore_round_trip_keeps_wave() {
    let data = SaveData {
        score: 2500,
        wave: 2,
        stolen_resource_indices: vec![1],
    };
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path().join("save.json"));
    store.save(&data).unwrap();

    let mut s = session();
    assert!(s.load(&store).unwrap());
    assert_eq!(s.state().wave, 2);
    assert_eq!(s.ledger().score(), 2500);
    assert_eq!(s.state().stolen_resource_indices(), vec![1]);

    // Saving again and restoring is idempotent
    s.save(&mut store).unwrap();
    let mut again = session();
    again.load(&store).unwrap();
    assert_eq!(again.save_data(), data);
}

#[test]
fn split_respects_population_cap() {
    let mut rng = Pcg32::seed_from_u64(3);
    let parent = Asteroid::new(1, Vec2::new(300.0, 300.0), Vec2::new(30.0, 0.0), LARGE_ASTEROID_SIZE, &mut rng);
    let mut next = 10;
    let mut ids = || {
        next += 1;
        next
    };
    assert_eq!(split_asteroid(&parent, 10, MAX_ASTEROIDS, None, &mut ids, &mut rng).len(), 2);
    assert_eq!(split_asteroid(&parent, 24, MAX_ASTEROIDS, None, &mut ids, &mut rng).len(), 1);

    let small = Asteroid::new(2, Vec2::ZERO, Vec2::ZERO, SMALL_ASTEROID_SIZE, &mut rng);
    assert!(split_asteroid(&small, 0, MAX_ASTEROIDS, None, &mut ids, &mut rng).is_empty());
}

#[test]
fn combo_grows_inside_window_and_resets_after() {
    let mut ledger = ScoreLedger::default();
    assert_eq!(ledger.record(ScoreEvent::RegularKill), 100);
    ledger.advance(1.0);
    assert_eq!(ledger.record(ScoreEvent::RegularKill), 120);
    assert_eq!(ledger.combo(), 2);
    ledger.advance(2.5);
    assert_eq!(ledger.combo(), 0);
    assert_eq!(ledger.record(ScoreEvent::RegularKill), 100);
}

#[test]
fn overspend_is_rejected() {
    let mut ledger = ScoreLedger::default();
    assert!(!ledger.spend(f64::NAN));
    assert!(!ledger.spend(STARTING_SCORE as f64 + 1.0));
    assert_eq!(ledger.score(), STARTING_SCORE);
}

#[test]
fn normalize_is_safe() {
    for v in [
        Vec2::ZERO,
        Vec2::new(f32::NAN, 1.0),
        Vec2::new(f32::INFINITY, 0.0),
        Vec2::new(3.0, 4.0),
        Vec2::new(1e-30, 0.0),
    ] {
        let n = normalize(v);
        assert!(n.is_finite());
        assert!(n.length() <= 1.0 + 1e-6);
    }
}

#[test]
fn long_frames_stay_finite() {
    let mut state = GameState::new(12, Settings::default());
    begin_wave(&mut state, 9);
    state.spawn_asteroid(Vec2::new(640.0, 650.0), Vec2::new(0.0, -300.0), LARGE_ASTEROID_SIZE);
    let mut ledger = ScoreLedger::default();
    for dt in [5.0, f32::MAX, f32::INFINITY, f32::NAN, 1e-9, FRAME_DT] {
        tick(&mut state, &mut ledger, &mut NoEffects, dt);
    }
    for snap in state.snapshots() {
        assert!(snap.pos.is_finite());
        assert!(snap.rotation.is_finite());
    }
}

#[test]
fn failing_effects_do_not_stop_the_game() {
    let mut s = session();
    s.hooks_mut().fail_effects = true;
    let target = s.state().agents[0].pos;
    s.state_mut().spawn_asteroid(target, Vec2::ZERO, LARGE_ASTEROID_SIZE);

    let first = s.tick(FRAME_DT);
    assert!(first.collisions.kills >= 1);
    assert!(first.collisions.effect_faults >= 1);
    assert!(s.hooks().failed_effects >= 1);

    for _ in 0..300 {
        s.tick(FRAME_DT);
    }
    assert!(s.hooks().effects.is_empty());
    assert!(s.state().time > 4.0);
}

#[test]
fn caller_fate_destroys_asteroid_during_tick() {
    let mut s = session();
    s.hooks_mut().destroy_asteroids = true;
    let target = Vec2::new(640.0, 300.0);
    let id = {
        let state = s.state_mut();
        state.agents[0].pos = target;
        state.agents[0].vel = Vec2::ZERO;
        state.agents[1].pos = Vec2::new(150.0, 150.0);
        state.spawn_asteroid(target, Vec2::ZERO, LARGE_ASTEROID_SIZE)
    };

    let report = s.tick(FRAME_DT);
    assert_eq!(report.collisions.kills, 1);
    assert_eq!(report.collisions.fragmentations, 0);
    assert!(!s.state().asteroids.iter().any(|a| a.id == id));
    assert_eq!(s.state().live_agents(), 1);
}

#[test]
fn game_over_is_reported_once() {
    let mut s = session();
    {
        let state = s.state_mut();
        for r in state.resources.iter_mut().skip(1) {
            r.stolen = true;
        }
        let carrier = state.agents[0].id;
        let cell = state.resources[0].id;
        assert!(state.resources[0].pick_up(carrier));
        state.agents[0].carrying = Some(cell);
        state.agents[0].pos = Vec2::new(400.0, -30.0);
    }
    for _ in 0..5 {
        s.tick(FRAME_DT);
    }
    assert_eq!(s.phase(), GamePhase::GameOver);
    assert_eq!(s.hooks().game_overs(), 1);
    assert!(s.hooks().calls.contains(&HookCall::Energy {
        remaining: 0,
        critical: true
    }));
    assert_eq!(s.launch_asteroid(Vec2::ZERO, Vec2::ONE, 20.0), None);
}
