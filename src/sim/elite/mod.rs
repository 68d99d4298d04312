//! Elite adversaries
//!
//! Bosses, StarBases and Shredders are ordinary [`Agent`]s carrying one of
//! these behaviours. Each behaviour is an explicit finite-state machine with
//! a single enumerated state and a time-in-state counter, advanced exactly
//! once per frame by [`advance`].

pub mod boss;
pub mod shredder;
pub mod starbase;

use glam::Vec2;
use rand::Rng;

pub use boss::{Boss, BossHit};
pub use shredder::{Shredder, ShredderHit, SpinPhase};
pub use starbase::{CombatStep, StarBase, StarBaseHit, StarBasePhase};

use super::entity::{Agent, Entity};

/// Extra state for an elite agent
#[derive(Debug, Clone)]
pub enum Elite {
    Boss(Boss),
    StarBase(StarBase),
    Shredder(Shredder),
}

impl Elite {
    /// Radius that incoming asteroids are tested against
    pub fn collision_radius(&self) -> f32 {
        match self {
            Elite::Boss(b) => b.collision_radius(),
            Elite::StarBase(s) => s.effective_radius(),
            Elite::Shredder(s) => s.collision_radius(),
        }
    }

    /// Remaining health as a fraction of the starting pool
    pub fn health_fraction(&self) -> f32 {
        match self {
            Elite::Boss(b) => b.health_fraction(),
            Elite::StarBase(s) => s.health_fraction(),
            Elite::Shredder(s) => s.health_fraction(),
        }
    }

    /// Shield radius for rendering (None when unshielded)
    pub fn shield_radius(&self) -> Option<f32> {
        match self {
            Elite::Boss(b) => b.has_active_shield().then(|| b.collision_radius()),
            Elite::StarBase(s) => s.has_active_shield().then(|| s.effective_radius()),
            Elite::Shredder(_) => None,
        }
    }

    /// Rendering rotation override
    pub fn rotation(&self) -> Option<f32> {
        match self {
            Elite::Boss(_) => None,
            Elite::StarBase(s) => Some(s.rotation()),
            Elite::Shredder(s) => Some(s.rotation()),
        }
    }

    /// Drop any pending timers (entity is going away)
    pub fn cancel_timers(&mut self) {
        match self {
            Elite::Boss(b) => b.flash.cancel(),
            Elite::StarBase(s) => s.flash.cancel(),
            Elite::Shredder(s) => s.flash.cancel(),
        }
    }
}

/// Handle to a running timer; a new handle is minted on every (re)trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(pub u32);

/// A single cancellable countdown per entity.
///
/// Triggering while running replaces the active countdown; there is never
/// more than one pending timer.
#[derive(Debug, Clone, Default)]
pub struct FlashTimer {
    active: Option<(TimerHandle, f32)>,
    generation: u32,
}

impl FlashTimer {
    /// Start (or restart) the countdown, returning the new handle
    pub fn trigger(&mut self, duration: f32) -> TimerHandle {
        self.generation = self.generation.wrapping_add(1);
        let handle = TimerHandle(self.generation);
        self.active = Some((handle, duration.max(0.0)));
        handle
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Count down; returns true on the frame the timer completes
    pub fn advance(&mut self, dt: f32) -> bool {
        if let Some((_, remaining)) = self.active.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.active = None;
                return true;
            }
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.active.map(|(h, _)| h)
    }

    pub fn remaining(&self) -> Option<f32> {
        self.active.map(|(_, r)| r)
    }
}

/// Read-only view of the world an elite needs for one step
#[derive(Debug, Clone, Copy)]
pub struct EliteContext {
    pub screen: Vec2,
    pub wave: u32,
    /// Nearest live asteroid to this elite, if any
    pub nearest_asteroid: Option<Vec2>,
}

/// Side effects an elite asks the frame pipeline to carry out
#[derive(Debug, Clone, PartialEq)]
pub enum EliteAction {
    /// Launch a projectile along `direction` (unit vector)
    Fire { origin: Vec2, direction: Vec2 },
    /// Return an embedded resource to its original slot
    ReleaseResource { resource: u32, home: Vec2 },
    /// The elite has finished its leave sequence
    Departed,
}

/// True once a point is fully outside the playfield
pub fn is_off_screen(pos: Vec2, margin: f32, screen: Vec2) -> bool {
    pos.x < -margin || pos.x > screen.x + margin || pos.y < -margin || pos.y > screen.y + margin
}

/// Advance an elite agent by one frame and collect the actions it requests.
///
/// Bosses only tick their flash timer here; their motion comes from the
/// flocking engine. StarBases and Shredders move themselves.
pub fn advance(agent: &mut Agent, ctx: &EliteContext, dt: f32, rng: &mut impl Rng) -> Vec<EliteAction> {
    let mut actions = Vec::new();
    if !agent.is_alive() {
        return actions;
    }
    let Some(elite) = agent.elite.as_mut() else {
        return actions;
    };
    match elite {
        Elite::Boss(boss) => boss.advance(dt),
        Elite::StarBase(base) => {
            base.advance(&mut agent.pos, ctx, dt, rng, &mut actions);
        }
        Elite::Shredder(shredder) => {
            shredder.advance(&mut agent.pos, ctx, dt, rng, &mut actions);
        }
    }
    if actions.iter().any(|a| matches!(a, EliteAction::Departed)) {
        agent.destroy();
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_timer_replaces_instead_of_stacking() {
        let mut t = FlashTimer::default();
        let first = t.trigger(0.1);
        assert!(!t.advance(0.05));
        let second = t.trigger(0.1);
        assert_ne!(first, second);
        assert_eq!(t.handle(), Some(second));
        // The original deadline would have passed here
        assert!(!t.advance(0.06));
        assert!(t.is_active());
        assert!(t.advance(0.05));
        assert!(!t.is_active());
    }

    #[test]
    fn test_flash_timer_cancel() {
        let mut t = FlashTimer::default();
        t.trigger(0.1);
        t.cancel();
        assert!(!t.is_active());
        assert!(!t.advance(1.0));
    }

    #[test]
    fn test_off_screen() {
        let screen = Vec2::new(100.0, 100.0);
        assert!(!is_off_screen(Vec2::new(50.0, 50.0), 10.0, screen));
        assert!(is_off_screen(Vec2::new(-11.0, 50.0), 10.0, screen));
        assert!(is_off_screen(Vec2::new(50.0, 111.0), 10.0, screen));
    }
}
