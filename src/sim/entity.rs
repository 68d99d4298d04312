//! Entity model
//!
//! Passive state for everything that lives in the playfield. Entities never
//! look at each other here: steering, collision and the elite machines read
//! and mutate them from the outside in a fixed order each frame.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::elite::Elite;
use super::numeric::{finite_or, sanitize};
use crate::consts::*;
use crate::wrap_hue;

/// Lifecycle contract shared by every entity kind
pub trait Entity {
    /// Stable entity ID (unique for the lifetime of a game)
    fn id(&self) -> u32;
    /// Dead entities are invisible to steering and collision queries
    fn is_alive(&self) -> bool;
    /// Integrate one frame of motion
    fn update(&mut self, dt: f32);
    /// Mark as dead; container removal happens at frame end
    fn destroy(&mut self);
}

/// Kinds of entity, used for collision keys and render snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Agent,
    Boss,
    StarBase,
    Shredder,
    Asteroid,
    Projectile,
    Resource,
}

/// Agent behaviour archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Personality {
    /// Beelines for energy, ignores the flock
    Aggressive,
    /// Gives asteroids a wide berth
    Cautious,
    /// Sticks tightly to the group
    Swarmer,
    /// Keeps its distance from other agents
    Loner,
    /// Fast and twitchy
    Erratic,
}

impl Personality {
    pub const ALL: [Personality; 5] = [
        Personality::Aggressive,
        Personality::Cautious,
        Personality::Swarmer,
        Personality::Loner,
        Personality::Erratic,
    ];

    /// Uniformly random archetype
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Force weights for this archetype
    pub fn weights(self) -> Weights {
        match self {
            Personality::Aggressive => Weights {
                separation: 1.0,
                alignment: 0.6,
                cohesion: 0.6,
                target_seek: 1.8,
                avoidance: 0.8,
                speed_modifier: 1.15,
            },
            Personality::Cautious => Weights {
                separation: 1.4,
                alignment: 1.0,
                cohesion: 0.8,
                target_seek: 0.9,
                avoidance: 2.2,
                speed_modifier: 0.9,
            },
            Personality::Swarmer => Weights {
                separation: 0.8,
                alignment: 1.4,
                cohesion: 1.6,
                target_seek: 1.0,
                avoidance: 1.0,
                speed_modifier: 1.0,
            },
            Personality::Loner => Weights {
                separation: 2.0,
                alignment: 0.3,
                cohesion: 0.2,
                target_seek: 1.3,
                avoidance: 1.2,
                speed_modifier: 1.05,
            },
            Personality::Erratic => Weights {
                separation: 1.0,
                alignment: 0.5,
                cohesion: 0.5,
                target_seek: 1.1,
                avoidance: 0.9,
                speed_modifier: 1.25,
            },
        }
    }

    /// Base hue for rendering
    pub fn hue(self) -> f32 {
        match self {
            Personality::Aggressive => 0.0,
            Personality::Cautious => 200.0,
            Personality::Swarmer => 120.0,
            Personality::Loner => 280.0,
            Personality::Erratic => 50.0,
        }
    }
}

/// Per-archetype steering weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
    pub target_seek: f32,
    pub avoidance: f32,
    /// Scales both max speed and max steering force
    pub speed_modifier: f32,
}

/// Chance that a freshly spawned agent is a super navigator
pub const SUPER_NAVIGATOR_CHANCE: f64 = 0.10;
/// Chance that a freshly spawned agent is a shooter (independent of the above)
pub const SHOOTER_CHANCE: f64 = 0.10;

/// An autonomous raider. Elites are agents with an [`Elite`] behaviour attached.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing angle for rendering (radians)
    pub rotation: f32,
    alive: bool,
    personality: Personality,
    weights: Weights,
    is_super_navigator: bool,
    is_shooter: bool,
    /// Resource currently carried (by resource ID)
    pub carrying: Option<u32>,
    /// Seconds until the next shot (shooters only)
    pub shoot_cooldown: f32,
    /// Seconds spent outside the playfield margin
    pub out_of_bounds_time: f32,
    /// Extra behaviour for bosses and other elites
    pub elite: Option<Elite>,
}

impl Agent {
    /// Spawn an agent with a random archetype and independently rolled traits
    pub fn spawn(id: u32, pos: Vec2, vel: Vec2, rng: &mut impl Rng) -> Self {
        let personality = Personality::random(rng);
        let super_navigator = rng.random_bool(SUPER_NAVIGATOR_CHANCE);
        let shooter = rng.random_bool(SHOOTER_CHANCE);
        let mut agent = Self::with_traits(id, pos, personality, super_navigator, shooter);
        agent.vel = sanitize(vel);
        if shooter {
            // Stagger first shots so a burst does not fire in unison
            agent.shoot_cooldown = rng.random_range(0.5..2.0);
        }
        agent
    }

    /// Build an agent with explicit traits
    pub fn with_traits(
        id: u32,
        pos: Vec2,
        personality: Personality,
        is_super_navigator: bool,
        is_shooter: bool,
    ) -> Self {
        Self {
            id,
            pos: sanitize(pos),
            vel: Vec2::ZERO,
            rotation: 0.0,
            alive: true,
            personality,
            weights: personality.weights(),
            is_super_navigator,
            is_shooter,
            carrying: None,
            shoot_cooldown: 0.0,
            out_of_bounds_time: 0.0,
            elite: None,
        }
    }

    /// Attach elite behaviour (bosses are always shooting super navigators)
    pub fn with_elite(mut self, elite: Elite) -> Self {
        if matches!(elite, Elite::Boss(_)) {
            self.is_super_navigator = true;
            self.is_shooter = true;
        }
        self.elite = Some(elite);
        self
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    pub fn is_super_navigator(&self) -> bool {
        self.is_super_navigator
    }

    pub fn is_shooter(&self) -> bool {
        self.is_shooter
    }

    /// Entity kind, accounting for elite behaviour
    pub fn kind(&self) -> EntityKind {
        match &self.elite {
            None => EntityKind::Agent,
            Some(Elite::Boss(_)) => EntityKind::Boss,
            Some(Elite::StarBase(_)) => EntityKind::StarBase,
            Some(Elite::Shredder(_)) => EntityKind::Shredder,
        }
    }

    /// True for ordinary flock members
    pub fn is_regular(&self) -> bool {
        self.elite.is_none()
    }

    /// True when motion comes from the flocking engine (regular agents and bosses)
    pub fn is_steered(&self) -> bool {
        matches!(self.elite, None | Some(Elite::Boss(_)))
    }

    /// Collision radius (elites report their current shield tier)
    pub fn radius(&self) -> f32 {
        match &self.elite {
            None => AGENT_RADIUS,
            Some(elite) => elite.collision_radius(),
        }
    }

    /// Chance that a ready shooter actually fires
    pub fn shot_chance(&self) -> f64 {
        match &self.elite {
            Some(Elite::Boss(boss)) => boss.shoot_probability(),
            _ => 1.0,
        }
    }
}

impl Entity for Agent {
    fn id(&self) -> u32 {
        self.id
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn update(&mut self, dt: f32) {
        self.vel = sanitize(self.vel);
        self.pos = sanitize(self.pos + self.vel * dt);
        if self.vel.length_squared() > 1e-4 {
            self.rotation = self.vel.y.atan2(self.vel.x);
        }
    }

    fn destroy(&mut self) {
        self.alive = false;
        if let Some(elite) = self.elite.as_mut() {
            elite.cancel_timers();
        }
    }
}

/// A shot fired by a shooter agent or an elite
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left before the projectile fizzles
    pub lifetime: f32,
    pub size: f32,
    /// Agent that fired it
    pub owner: u32,
    alive: bool,
}

impl Projectile {
    /// Fire from `origin` toward `target` at `speed`, jittered ±20%
    pub fn aimed(
        id: u32,
        owner: u32,
        origin: Vec2,
        target: Vec2,
        speed: f32,
        lifetime: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let dir = super::numeric::normalize(target - origin);
        Self::directed(id, owner, origin, dir, speed, lifetime, rng)
    }

    /// Fire from `origin` along unit `dir` at `speed`, jittered ±20%
    pub fn directed(
        id: u32,
        owner: u32,
        origin: Vec2,
        dir: Vec2,
        speed: f32,
        lifetime: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let jitter = rng.random_range(0.8..=1.2);
        Self {
            id,
            pos: sanitize(origin),
            vel: sanitize(dir * finite_or(speed, 0.0) * jitter),
            lifetime: finite_or(lifetime, 0.0).max(0.0),
            size: PROJECTILE_RADIUS,
            owner,
            alive: true,
        }
    }
}

impl Entity for Projectile {
    fn id(&self) -> u32 {
        self.id
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn update(&mut self, dt: f32) {
        self.pos = sanitize(self.pos + self.vel * dt);
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.alive = false;
        }
    }

    fn destroy(&mut self) {
        self.alive = false;
    }
}

/// Asteroid size bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Large,
    Medium,
    Small,
}

impl SizeClass {
    /// Classify a continuous size; a band starts at 80% of its nominal size
    pub fn of(size: f32) -> Self {
        if !size.is_finite() {
            return SizeClass::Small;
        }
        if size >= LARGE_ASTEROID_SIZE * 0.8 {
            SizeClass::Large
        } else if size >= MEDIUM_ASTEROID_SIZE * 0.8 {
            SizeClass::Medium
        } else {
            SizeClass::Small
        }
    }

    /// Nominal size of the band
    pub fn nominal_size(self) -> f32 {
        match self {
            SizeClass::Large => LARGE_ASTEROID_SIZE,
            SizeClass::Medium => MEDIUM_ASTEROID_SIZE,
            SizeClass::Small => SMALL_ASTEROID_SIZE,
        }
    }

    /// Band that fragments of this band fall into (None for the smallest)
    pub fn child(self) -> Option<SizeClass> {
        match self {
            SizeClass::Large => Some(SizeClass::Medium),
            SizeClass::Medium => Some(SizeClass::Small),
            SizeClass::Small => None,
        }
    }
}

/// Number of outline vertices per asteroid
pub const OUTLINE_VERTICES: usize = 10;

/// A player-launched rock (or a fragment of one)
#[derive(Debug, Clone)]
pub struct Asteroid {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Continuous radius in pixels
    pub size: f32,
    pub rotation: f32,
    pub angular_vel: f32,
    /// Hue in degrees [0, 360)
    pub hue: f32,
    /// Radial multipliers for each outline vertex
    pub outline: Vec<f32>,
    alive: bool,
}

impl Asteroid {
    /// New asteroid with a random outline and hue
    pub fn new(id: u32, pos: Vec2, vel: Vec2, size: f32, rng: &mut impl Rng) -> Self {
        let outline = (0..OUTLINE_VERTICES)
            .map(|_| rng.random_range(0.75..1.15))
            .collect();
        Self {
            id,
            pos: sanitize(pos),
            vel: sanitize(vel),
            size: sanitize_size(size),
            rotation: 0.0,
            angular_vel: rng.random_range(-1.5..1.5),
            hue: rng.random_range(0.0..360.0),
            outline,
            alive: true,
        }
    }

    /// Build a fragment with explicit appearance (used by fragmentation)
    pub fn with_appearance(
        id: u32,
        pos: Vec2,
        vel: Vec2,
        size: f32,
        hue: f32,
        outline: Vec<f32>,
        angular_vel: f32,
    ) -> Self {
        Self {
            id,
            pos: sanitize(pos),
            vel: sanitize(vel),
            size: sanitize_size(size),
            rotation: 0.0,
            angular_vel: finite_or(angular_vel, 0.0),
            hue: wrap_hue(hue),
            outline,
            alive: true,
        }
    }

    pub fn size_class(&self) -> SizeClass {
        SizeClass::of(self.size)
    }

    /// Mass proxy for bounces (area)
    pub fn mass(&self) -> f32 {
        self.size * self.size
    }
}

/// Coerce a requested asteroid size into the legal range
pub fn sanitize_size(size: f32) -> f32 {
    if !size.is_finite() {
        return MIN_ASTEROID_SIZE;
    }
    size.clamp(MIN_ASTEROID_SIZE, LARGE_ASTEROID_SIZE * 1.5)
}

impl Entity for Asteroid {
    fn id(&self) -> u32 {
        self.id
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn update(&mut self, dt: f32) {
        self.vel = sanitize(self.vel);
        self.pos = sanitize(self.pos + self.vel * dt);
        self.rotation = crate::normalize_angle(self.rotation + self.angular_vel * dt);
    }

    fn destroy(&mut self) {
        self.alive = false;
    }
}

/// An energy cell the flock tries to steal
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: u32,
    /// Slot index in the player's bank (stable across saves)
    pub index: usize,
    /// Where the cell rests when nobody holds it
    pub home: Vec2,
    pub pos: Vec2,
    /// Carried off-screen; gone for the rest of the game
    pub stolen: bool,
    /// Agent currently holding it
    pub carrier: Option<u32>,
    pub hue: f32,
}

impl Resource {
    pub fn new(id: u32, index: usize, home: Vec2, hue: f32) -> Self {
        Self {
            id,
            index,
            home,
            pos: home,
            stolen: false,
            carrier: None,
            hue: wrap_hue(hue),
        }
    }

    /// Free for an agent to grab
    pub fn is_available(&self) -> bool {
        !self.stolen && self.carrier.is_none()
    }

    /// Hand ownership to `agent`; fails if someone already holds it
    pub fn pick_up(&mut self, agent: u32) -> bool {
        if !self.is_available() {
            return false;
        }
        self.carrier = Some(agent);
        true
    }

    /// Drop ownership and return to the home slot
    pub fn restore(&mut self) {
        self.carrier = None;
        self.stolen = false;
        self.pos = self.home;
    }
}

impl Entity for Resource {
    fn id(&self) -> u32 {
        self.id
    }

    fn is_alive(&self) -> bool {
        !self.stolen
    }

    fn update(&mut self, _dt: f32) {
        if self.carrier.is_none() && !self.stolen {
            self.pos = self.home;
        }
    }

    /// Lost to the flock
    fn destroy(&mut self) {
        self.stolen = true;
        self.carrier = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_size_class_bands() {
        assert_eq!(SizeClass::of(60.0), SizeClass::Large);
        assert_eq!(SizeClass::of(48.0), SizeClass::Large);
        assert_eq!(SizeClass::of(47.9), SizeClass::Medium);
        assert_eq!(SizeClass::of(32.0), SizeClass::Medium);
        assert_eq!(SizeClass::of(31.0), SizeClass::Small);
        assert_eq!(SizeClass::of(f32::NAN), SizeClass::Small);
    }

    #[test]
    fn test_trait_rates() {
        let mut rng = Pcg32::seed_from_u64(7);
        let n = 1000;
        let mut nav = 0;
        let mut shoot = 0;
        let mut both = 0;
        for id in 0..n {
            let a = Agent::spawn(id, Vec2::ZERO, Vec2::ZERO, &mut rng);
            nav += a.is_super_navigator() as u32;
            shoot += a.is_shooter() as u32;
            both += (a.is_super_navigator() && a.is_shooter()) as u32;
        }
        assert!((70..=130).contains(&nav), "super navigators: {nav}");
        assert!((70..=130).contains(&shoot), "shooters: {shoot}");
        assert!(both <= 30, "both: {both}");
    }

    #[test]
    fn test_destroy_hides_agent() {
        let mut a = Agent::with_traits(1, Vec2::ZERO, Personality::Swarmer, false, false);
        assert!(a.is_alive());
        a.destroy();
        assert!(!a.is_alive());
    }

    #[test]
    fn test_projectile_expires() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut p = Projectile::aimed(1, 0, Vec2::ZERO, Vec2::new(10.0, 0.0), 100.0, 0.05, &mut rng);
        let speed = p.vel.length();
        assert!((80.0..=120.0).contains(&speed));
        p.update(0.03);
        assert!(p.is_alive());
        p.update(0.03);
        assert!(!p.is_alive());
    }

    #[test]
    fn test_resource_single_owner() {
        let mut r = Resource::new(1, 0, Vec2::new(100.0, 600.0), 90.0);
        assert!(r.pick_up(5));
        assert!(!r.pick_up(6));
        assert_eq!(r.carrier, Some(5));
        r.pos = Vec2::new(0.0, 0.0);
        r.restore();
        assert_eq!(r.pos, r.home);
        assert!(r.pick_up(6));
    }

    #[test]
    fn test_asteroid_size_is_coerced() {
        let mut rng = Pcg32::seed_from_u64(3);
        let a = Asteroid::new(1, Vec2::ZERO, Vec2::new(f32::NAN, 0.0), f32::INFINITY, &mut rng);
        assert_eq!(a.size, MIN_ASTEROID_SIZE);
        assert_eq!(a.vel, Vec2::ZERO);
        assert_eq!(a.outline.len(), OUTLINE_VERTICES);
    }
}
