//! Asteroid fragmentation
//!
//! A destroyed asteroid splits one band down: LARGE into two MEDIUM rocks,
//! MEDIUM into two SMALL rocks, SMALL into dust. Near the population cap only
//! one fragment is produced. Fragments keep part of the parent's momentum,
//! inherit its outline and hue with a little jitter, and are spawned far
//! enough apart that they do not overlap on their first frame.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::entity::{Asteroid, SizeClass};
use super::numeric::{finite_or, normalize, sanitize};
use crate::direction_from_angle;

/// Share of the parent's speed each fragment keeps (before jitter)
pub const MOMENTUM_RETENTION: f32 = 0.7;
/// Uniform speed jitter range applied on top of retention
pub const SPEED_JITTER: (f32, f32) = (0.5, 1.5);
/// Half-angle of the cone fragments fly in when repelled (22.5°)
pub const REPULSION_HALF_ANGLE: f32 = PI / 8.0;
/// Minimum speed of a repelled fragment
pub const MIN_REPULSION_SPEED: f32 = 60.0;
/// Minimum speed of any fragment, so rocks never stall in place
pub const MIN_DRIFT_SPEED: f32 = 20.0;
/// Per-vertex outline jitter
pub const OUTLINE_JITTER: f32 = 0.05;
/// Hue drift in degrees
pub const HUE_JITTER: f32 = 12.0;
/// Child size relative to the parent, so children are always strictly smaller
const MAX_CHILD_RATIO: f32 = 0.9;

/// How many fragments a parent yields given the live population (parent excluded)
pub fn fragment_count(class: SizeClass, population: usize, cap: usize) -> usize {
    if class.child().is_none() {
        return 0;
    }
    if population + 2 >= cap {
        // One fragment near the cap, none if even that would break it
        usize::from(population < cap)
    } else {
        2
    }
}

/// Split `parent` into its fragments.
///
/// `population` is the number of live asteroids once the parent is gone.
/// `repulsion` biases fragments away from a point (a shield, a blade hub).
/// `next_id` hands out entity IDs for the children.
pub fn split_asteroid(
    parent: &Asteroid,
    population: usize,
    cap: usize,
    repulsion: Option<Vec2>,
    mut next_id: impl FnMut() -> u32,
    rng: &mut impl Rng,
) -> Vec<Asteroid> {
    let class = parent.size_class();
    let count = fragment_count(class, population, cap);
    let Some(child_class) = class.child() else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }

    let child_size = child_class
        .nominal_size()
        .min(parent.size * MAX_CHILD_RATIO);
    let parent_speed = finite_or(parent.vel.length(), 0.0);

    let away = repulsion.map(|point| {
        let dir = normalize(parent.pos - point);
        if dir == Vec2::ZERO {
            direction_from_angle(rng.random_range(0.0..TAU))
        } else {
            dir
        }
    });
    let base_angle = rng.random_range(0.0..TAU);

    let mut fragments = Vec::with_capacity(count);
    for i in 0..count {
        let sign = if i == 0 { 1.0 } else { -1.0 };
        let speed = parent_speed * MOMENTUM_RETENTION * rng.random_range(SPEED_JITTER.0..=SPEED_JITTER.1);

        let (dir, speed, offset_dir) = match away {
            Some(away) => {
                let spread = rng.random_range(-REPULSION_HALF_ANGLE..=REPULSION_HALF_ANGLE);
                let dir = away.rotate(direction_from_angle(spread));
                // Side by side across the direction of travel
                (dir, speed.max(MIN_REPULSION_SPEED), away.perp() * sign)
            }
            None => {
                let dir = direction_from_angle(base_angle + i as f32 * PI);
                (dir, speed.max(MIN_DRIFT_SPEED), dir)
            }
        };

        let offset = if count > 1 {
            offset_dir * child_size * 1.05
        } else {
            Vec2::ZERO
        };

        let outline = parent
            .outline
            .iter()
            .map(|v| (v + rng.random_range(-OUTLINE_JITTER..=OUTLINE_JITTER)).clamp(0.6, 1.3))
            .collect();
        let hue = parent.hue + rng.random_range(-HUE_JITTER..=HUE_JITTER);
        let spin = parent.angular_vel + rng.random_range(-0.5..=0.5);

        fragments.push(Asteroid::with_appearance(
            next_id(),
            parent.pos + offset,
            sanitize(dir * speed),
            child_size,
            hue,
            outline,
            spin,
        ));
    }

    log::debug!(
        "Asteroid {} ({:?}) split into {} fragment(s)",
        parent.id,
        class,
        fragments.len()
    );
    fragments
}
