//! Game state and render snapshots
//!
//! `GameState` holds every entity container plus the seeded RNG. Containers
//! are only compacted at the end of a frame; until then destroyed entities
//! stay in place (dead) so indices remain stable for the collision pass.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::director::Director;
use super::elite::Elite;
use super::entity::{Agent, Asteroid, Entity, EntityKind, Projectile, Resource};
use crate::consts::*;
use crate::settings::Settings;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Wave in progress
    Playing,
    /// Between-wave rest period
    Breather,
    /// Every energy cell is gone
    GameOver,
}

/// Monotonic entity ID source
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Complete simulation state for one game
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub settings: Settings,
    /// Current wave (1-based)
    pub wave: u32,
    pub phase: GamePhase,
    /// Seconds left in the breather
    pub breather_timer: f32,
    /// Simulated seconds since the game started
    pub time: f32,
    /// Regular agents and elites (sorted by id)
    pub agents: Vec<Agent>,
    pub asteroids: Vec<Asteroid>,
    pub projectiles: Vec<Projectile>,
    /// Energy cells, indexed by slot
    pub resources: Vec<Resource>,
    /// Wave bookkeeping and elite spawn timers
    pub director: Director,
    pub ids: IdAllocator,
}

impl GameState {
    /// Create a game with the resource bank laid out and no adversaries yet
    pub fn new(seed: u64, settings: Settings) -> Self {
        let settings = settings.sanitized();
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            wave: 1,
            phase: GamePhase::Playing,
            breather_timer: 0.0,
            time: 0.0,
            agents: Vec::new(),
            asteroids: Vec::new(),
            projectiles: Vec::new(),
            resources: Vec::new(),
            director: Director::default(),
            ids: IdAllocator::default(),
            settings,
        };
        state.layout_resources();
        state
    }

    /// Place energy cells in a row along the bottom of the screen
    fn layout_resources(&mut self) {
        let count = self.settings.resource_count as usize;
        let w = self.settings.screen_width;
        let y = self.settings.screen_height - 60.0;
        let spacing = w / (count as f32 + 1.0);
        for index in 0..count {
            let id = self.ids.allocate();
            let home = Vec2::new(spacing * (index as f32 + 1.0), y);
            let hue = 180.0 + index as f32 * 15.0;
            self.resources.push(Resource::new(id, index, home, hue));
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.allocate()
    }

    pub fn screen(&self) -> Vec2 {
        Vec2::new(self.settings.screen_width, self.settings.screen_height)
    }

    pub fn live_agents(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    pub fn live_regular_agents(&self) -> usize {
        self.agents
            .iter()
            .filter(|a| a.is_alive() && a.is_regular())
            .count()
    }

    pub fn live_asteroids(&self) -> usize {
        self.asteroids.iter().filter(|a| a.is_alive()).count()
    }

    /// Energy cells not yet carried off
    pub fn resources_remaining(&self) -> usize {
        self.resources.iter().filter(|r| !r.stolen).count()
    }

    /// One cell (or none) left
    pub fn energy_critical(&self) -> bool {
        self.resources_remaining() <= 1
    }

    /// Slots of cells the flock has stolen
    pub fn stolen_resource_indices(&self) -> Vec<usize> {
        self.resources
            .iter()
            .filter(|r| r.stolen)
            .map(|r| r.index)
            .collect()
    }

    pub fn agent(&self, id: u32) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn resource_mut(&mut self, id: u32) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.id == id)
    }

    /// Add a player asteroid
    pub fn spawn_asteroid(&mut self, pos: Vec2, vel: Vec2, size: f32) -> u32 {
        let id = self.ids.allocate();
        let asteroid = Asteroid::new(id, pos, vel, size, &mut self.rng);
        self.asteroids.push(asteroid);
        id
    }

    /// Drop dead entities (frame end only)
    pub fn compact(&mut self) {
        self.agents.retain(|a| a.is_alive());
        self.asteroids.retain(|a| a.is_alive());
        self.projectiles.retain(|p| p.is_alive());
    }

    /// Ensure containers are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.agents.sort_by_key(|a| a.id);
        self.asteroids.sort_by_key(|a| a.id);
        self.projectiles.sort_by_key(|p| p.id);
    }

    /// Read-only snapshots of every live entity for the renderer
    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        let agents = self.agents.iter().filter(|a| a.is_alive()).map(|a| {
            let elite = a.elite.as_ref();
            EntitySnapshot {
                id: a.id,
                kind: a.kind(),
                pos: a.pos,
                rotation: elite.and_then(Elite::rotation).unwrap_or(a.rotation),
                size: match elite {
                    Some(Elite::StarBase(s)) => s.size(),
                    Some(Elite::Boss(_)) => BOSS_SIZE,
                    Some(Elite::Shredder(_)) => SHREDDER_SIZE,
                    None => AGENT_RADIUS,
                },
                hue: a.personality().hue(),
                health_fraction: elite.map(Elite::health_fraction).unwrap_or(1.0),
                shield_radius: elite.and_then(Elite::shield_radius),
            }
        });
        let asteroids = self.asteroids.iter().filter(|a| a.is_alive()).map(|a| EntitySnapshot {
            id: a.id,
            kind: EntityKind::Asteroid,
            pos: a.pos,
            rotation: a.rotation,
            size: a.size,
            hue: a.hue,
            health_fraction: 1.0,
            shield_radius: None,
        });
        let projectiles = self.projectiles.iter().filter(|p| p.is_alive()).map(|p| EntitySnapshot {
            id: p.id,
            kind: EntityKind::Projectile,
            pos: p.pos,
            rotation: p.vel.y.atan2(p.vel.x),
            size: p.size,
            hue: 30.0,
            health_fraction: 1.0,
            shield_radius: None,
        });
        let resources = self.resources.iter().filter(|r| !r.stolen).map(|r| EntitySnapshot {
            id: r.id,
            kind: EntityKind::Resource,
            pos: r.pos,
            rotation: 0.0,
            size: RESOURCE_RADIUS,
            hue: r.hue,
            health_fraction: 1.0,
            shield_radius: None,
        });
        agents
            .chain(asteroids)
            .chain(projectiles)
            .chain(resources)
            .collect()
    }
}

/// What the renderer needs to draw one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub rotation: f32,
    pub size: f32,
    /// Hue in degrees
    pub hue: f32,
    /// 1.0 for entities without health
    pub health_fraction: f32,
    pub shield_radius: Option<f32>,
}

/// What the HUD needs each frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub combo: u32,
    pub multiplier: f64,
    pub wave: u32,
    pub phase: GamePhase,
    pub resources_remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lays_out_resources() {
        let state = GameState::new(1, Settings::default());
        assert_eq!(state.resources.len(), 5);
        assert_eq!(state.resources_remaining(), 5);
        assert!(!state.energy_critical());
        let indices: Vec<usize> = state.resources.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(state.resources.iter().all(|r| r.home.y > state.settings.screen_height / 2.0));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut state = GameState::new(1, Settings::default());
        let a = state.next_entity_id();
        let b = state.spawn_asteroid(Vec2::ZERO, Vec2::ZERO, 40.0);
        assert_ne!(a, b);
        assert!(state.resources.iter().all(|r| r.id != a && r.id != b));
    }

    #[test]
    fn test_compact_drops_dead() {
        let mut state = GameState::new(1, Settings::default());
        state.spawn_asteroid(Vec2::ZERO, Vec2::ZERO, 40.0);
        state.spawn_asteroid(Vec2::ZERO, Vec2::ZERO, 40.0);
        state.asteroids[0].destroy();
        assert_eq!(state.asteroids.len(), 2);
        assert_eq!(state.live_asteroids(), 1);
        state.compact();
        assert_eq!(state.asteroids.len(), 1);
    }

    #[test]
    fn test_snapshots_skip_dead_and_stolen() {
        let mut state = GameState::new(1, Settings::default());
        state.spawn_asteroid(Vec2::new(10.0, 10.0), Vec2::ZERO, 40.0);
        state.spawn_asteroid(Vec2::new(20.0, 10.0), Vec2::ZERO, 40.0);
        state.asteroids[1].destroy();
        state.resources[0].destroy();
        let snaps = state.snapshots();
        assert_eq!(snaps.iter().filter(|s| s.kind == EntityKind::Asteroid).count(), 1);
        assert_eq!(snaps.iter().filter(|s| s.kind == EntityKind::Resource).count(), 4);
    }

    #[test]
    fn test_snapshot_reports_starbase_health_and_shield() {
        let mut state = GameState::new(1, Settings::default());
        let id = crate::sim::director::spawn_starbase(&mut state, 7);

        let snapshot = |state: &GameState| state.snapshots().into_iter().find(|s| s.id == id).unwrap();
        let fresh = snapshot(&state);
        assert_eq!(fresh.kind, EntityKind::StarBase);
        assert_eq!(fresh.health_fraction, 1.0);
        assert_eq!(fresh.shield_radius, Some(STARBASE_SIZE * 1.5));

        let agent = state.agents.iter_mut().find(|a| a.id == id).unwrap();
        let Some(Elite::StarBase(base)) = agent.elite.as_mut() else {
            panic!("expected a StarBase");
        };
        for _ in 0..5 {
            base.hit();
        }

        let worn = snapshot(&state);
        assert!((worn.health_fraction - 1.0 / 6.0).abs() < 1e-6);
        assert_eq!(worn.shield_radius, None);
        assert_eq!(worn.size, STARBASE_SIZE);
    }
}
