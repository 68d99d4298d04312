//! Flocking engine
//!
//! Each live, steered agent blends five Reynolds-style forces using its
//! personality weights: separation, alignment, cohesion, target seek and
//! asteroid avoidance. Forces for the whole flock are computed from one
//! consistent view of the world before any velocity changes.

use glam::Vec2;
use rand::Rng;

use super::entity::{Agent, Asteroid, Entity, Resource, Weights};
use super::numeric::{distance_squared, limit_magnitude, normalize, sanitize};
use crate::consts::AGENT_RADIUS;

/// Radius inside which agents push apart
pub const SEPARATION_RADIUS: f32 = 30.0;
/// Radius inside which agents align and cohere
pub const VIEW_RADIUS: f32 = 80.0;
/// Extra clearance agents try to keep from asteroid edges
pub const DANGER_MARGIN: f32 = 60.0;
/// How far above the screen carriers aim when fleeing
pub const EXIT_MARGIN: f32 = 60.0;
/// Target-seek weight used by super navigators
pub const SUPER_NAVIGATOR_SEEK: f32 = 4.0;

/// Per-frame tuning shared by the whole flock
#[derive(Debug, Clone, Copy)]
pub struct SteeringParams {
    /// Wave-scaled max speed (before personality scaling)
    pub max_speed: f32,
    /// Max steering force (before personality scaling)
    pub max_force: f32,
}

/// Max agent speed on `wave`: +5% per wave, never more than double
pub fn max_speed_for_wave(base: f32, wave: u32) -> f32 {
    let scale = (1.0 + 0.05 * wave.saturating_sub(1) as f32).min(2.0);
    base * scale
}

/// Weights actually used for an agent; super navigators beeline for their target
pub fn effective_weights(agent: &Agent) -> Weights {
    let w = agent.weights();
    if agent.is_super_navigator() {
        Weights {
            separation: w.separation * 0.25,
            alignment: w.alignment * 0.25,
            cohesion: w.cohesion * 0.25,
            target_seek: SUPER_NAVIGATOR_SEEK,
            avoidance: w.avoidance * 0.5,
            speed_modifier: w.speed_modifier,
        }
    } else {
        w
    }
}

/// Where an agent is heading: the exit while carrying, else the nearest free cell
pub fn seek_target(agent: &Agent, resources: &[Resource]) -> Option<Vec2> {
    if agent.carrying.is_some() {
        return Some(Vec2::new(agent.pos.x, -EXIT_MARGIN));
    }
    // Elites hover over the bank; they never pick anything up
    let usable = |r: &&Resource| {
        if agent.is_regular() {
            r.is_available()
        } else {
            !r.stolen
        }
    };
    resources
        .iter()
        .filter(usable)
        .min_by(|a, b| {
            distance_squared(agent.pos, a.pos)
                .partial_cmp(&distance_squared(agent.pos, b.pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|r| r.pos)
}

/// Reynolds steer: turn current velocity toward `dir` at full speed
fn steer(dir: Vec2, vel: Vec2, max_speed: f32, max_force: f32) -> Vec2 {
    if dir == Vec2::ZERO {
        return Vec2::ZERO;
    }
    limit_magnitude(dir * max_speed - vel, max_force)
}

/// Compute the steering force for every agent (zero for dead or unsteered ones)
pub fn compute_forces(
    agents: &[Agent],
    asteroids: &[Asteroid],
    resources: &[Resource],
    params: &SteeringParams,
) -> Vec<Vec2> {
    let sep_sq = SEPARATION_RADIUS * SEPARATION_RADIUS;
    let view_sq = VIEW_RADIUS * VIEW_RADIUS;

    agents
        .iter()
        .enumerate()
        .map(|(i, agent)| {
            if !agent.is_alive() || !agent.is_steered() {
                return Vec2::ZERO;
            }
            let w = effective_weights(agent);
            let max_speed = params.max_speed * w.speed_modifier;
            let max_force = params.max_force * w.speed_modifier;

            let mut away = Vec2::ZERO;
            let mut heading = Vec2::ZERO;
            let mut centroid = Vec2::ZERO;
            let mut neighbors = 0u32;

            for (j, other) in agents.iter().enumerate() {
                if i == j || !other.is_alive() || !other.is_steered() {
                    continue;
                }
                let d_sq = distance_squared(agent.pos, other.pos);
                if d_sq < sep_sq && d_sq > 0.0 {
                    // Weighted by inverse distance
                    away += normalize(agent.pos - other.pos) / d_sq.sqrt();
                }
                if d_sq < view_sq {
                    heading += other.vel;
                    centroid += other.pos;
                    neighbors += 1;
                }
            }

            let separation = steer(normalize(away), agent.vel, max_speed, max_force);
            let (alignment, cohesion) = if neighbors > 0 {
                let n = neighbors as f32;
                (
                    steer(normalize(heading / n), agent.vel, max_speed, max_force),
                    steer(normalize(centroid / n - agent.pos), agent.vel, max_speed, max_force),
                )
            } else {
                (Vec2::ZERO, Vec2::ZERO)
            };

            let target_seek = seek_target(agent, resources)
                .map(|t| steer(normalize(t - agent.pos), agent.vel, max_speed, max_force))
                .unwrap_or(Vec2::ZERO);

            let mut flee = Vec2::ZERO;
            for rock in asteroids.iter().filter(|a| a.is_alive()) {
                let danger = rock.size + agent.radius() + DANGER_MARGIN;
                let d_sq = distance_squared(agent.pos, rock.pos);
                if d_sq < danger * danger {
                    let closeness = 1.0 - d_sq.sqrt() / danger;
                    flee += normalize(agent.pos - rock.pos) * closeness;
                }
            }
            let avoidance = steer(normalize(flee), agent.vel, max_speed, max_force);

            let total = separation * w.separation
                + alignment * w.alignment
                + cohesion * w.cohesion
                + target_seek * w.target_seek
                + avoidance * w.avoidance;
            limit_magnitude(sanitize(total), max_force)
        })
        .collect()
}

/// Integrate forces into velocities and cap speed
pub fn apply_forces(agents: &mut [Agent], forces: &[Vec2], params: &SteeringParams, dt: f32) {
    for (agent, force) in agents.iter_mut().zip(forces) {
        if !agent.is_alive() || !agent.is_steered() {
            continue;
        }
        let max_speed = params.max_speed * agent.weights().speed_modifier;
        agent.vel = limit_magnitude(agent.vel + *force * dt, max_speed);
    }
}

/// A shot a shooter agent wants to take this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub owner: u32,
    pub origin: Vec2,
    pub target: Vec2,
}

/// Tick shooter cooldowns; ready shooters aim at the nearest asteroid
pub fn update_shooters(
    agents: &mut [Agent],
    asteroids: &[Asteroid],
    cooldown: f32,
    dt: f32,
    rng: &mut impl Rng,
) -> Vec<ShotRequest> {
    let mut shots = Vec::new();
    for agent in agents.iter_mut() {
        if !agent.is_alive() || !agent.is_shooter() || !agent.is_steered() {
            continue;
        }
        agent.shoot_cooldown = (agent.shoot_cooldown - dt).max(0.0);
        if agent.shoot_cooldown > 0.0 {
            continue;
        }
        let nearest = asteroids
            .iter()
            .filter(|a| a.is_alive())
            .min_by(|a, b| {
                distance_squared(agent.pos, a.pos)
                    .partial_cmp(&distance_squared(agent.pos, b.pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(target) = nearest else {
            continue;
        };
        agent.shoot_cooldown = cooldown;
        if rng.random_bool(agent.shot_chance()) {
            let muzzle = normalize(target.pos - agent.pos) * (agent.radius() + AGENT_RADIUS * 0.5);
            shots.push(ShotRequest {
                owner: agent.id,
                origin: agent.pos + muzzle,
                target: target.pos,
            });
        }
    }
    shots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Personality;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn params() -> SteeringParams {
        SteeringParams {
            max_speed: 120.0,
            max_force: 240.0,
        }
    }

    fn agent(id: u32, pos: Vec2) -> Agent {
        Agent::with_traits(id, pos, Personality::Swarmer, false, false)
    }

    #[test]
    fn test_seeks_nearest_free_resource() {
        let a = agent(1, Vec2::new(100.0, 100.0));
        let mut near = Resource::new(10, 0, Vec2::new(120.0, 100.0), 0.0);
        let far = Resource::new(11, 1, Vec2::new(600.0, 100.0), 0.0);
        assert_eq!(seek_target(&a, &[near.clone(), far.clone()]), Some(near.pos));
        near.pick_up(99);
        assert_eq!(seek_target(&a, &[near, far.clone()]), Some(far.pos));
    }

    #[test]
    fn test_carrier_heads_for_exit() {
        let mut a = agent(1, Vec2::new(300.0, 500.0));
        a.carrying = Some(10);
        assert_eq!(seek_target(&a, &[]), Some(Vec2::new(300.0, -EXIT_MARGIN)));
    }

    #[test]
    fn test_separation_pushes_apart() {
        // Loners weigh separation well above cohesion
        let agents = vec![
            Agent::with_traits(1, Vec2::new(100.0, 100.0), Personality::Loner, false, false),
            Agent::with_traits(2, Vec2::new(110.0, 100.0), Personality::Loner, false, false),
        ];
        let forces = compute_forces(&agents, &[], &[], &params());
        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
    }

    #[test]
    fn test_dead_agents_get_no_force_and_are_ignored() {
        let mut agents = vec![agent(1, Vec2::new(100.0, 100.0)), agent(2, Vec2::new(110.0, 100.0))];
        agents[1].destroy();
        let forces = compute_forces(&agents, &[], &[], &params());
        assert_eq!(forces[0], Vec2::ZERO);
        assert_eq!(forces[1], Vec2::ZERO);
    }

    #[test]
    fn test_avoids_asteroids() {
        let mut rng = Pcg32::seed_from_u64(1);
        let agents = vec![agent(1, Vec2::new(100.0, 100.0))];
        let rock = Asteroid::new(5, Vec2::new(150.0, 100.0), Vec2::ZERO, 20.0, &mut rng);
        let forces = compute_forces(&agents, &[rock], &[], &params());
        assert!(forces[0].x < 0.0);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut agents = vec![agent(1, Vec2::ZERO)];
        let forces = vec![Vec2::new(1e9, 0.0)];
        apply_forces(&mut agents, &forces, &params(), 1.0);
        assert!(agents[0].vel.length() <= 120.0 + 1e-3);
    }

    #[test]
    fn test_super_navigator_beelines() {
        let resource = Resource::new(10, 0, Vec2::new(500.0, 100.0), 0.0);
        let mut flock: Vec<Agent> = (0..6)
            .map(|i| agent(i + 2, Vec2::new(100.0, 80.0 + i as f32 * 8.0)))
            .collect();
        flock.push(Agent::with_traits(1, Vec2::new(100.0, 100.0), Personality::Swarmer, true, false));
        let forces = compute_forces(&flock, &[], &[resource], &params());
        let nav = forces[6];
        let dir = normalize(nav);
        assert!(dir.x > 0.9, "navigator force {nav:?}");
    }

    #[test]
    fn test_shooter_fires_at_nearest_and_resets() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut agents = vec![Agent::with_traits(1, Vec2::ZERO, Personality::Loner, false, true)];
        let near = Asteroid::new(5, Vec2::new(50.0, 0.0), Vec2::ZERO, 20.0, &mut rng);
        let far = Asteroid::new(6, Vec2::new(500.0, 0.0), Vec2::ZERO, 20.0, &mut rng);
        let shots = update_shooters(&mut agents, &[far, near], 2.0, 0.016, &mut rng);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].target, Vec2::new(50.0, 0.0));
        assert_eq!(agents[0].shoot_cooldown, 2.0);
        let shots = update_shooters(&mut agents, &[], 2.0, 0.016, &mut rng);
        assert!(shots.is_empty());
    }

    #[test]
    fn test_shooter_waits_without_targets() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut agents = vec![Agent::with_traits(1, Vec2::ZERO, Personality::Loner, false, true)];
        assert!(update_shooters(&mut agents, &[], 2.0, 0.5, &mut rng).is_empty());
        assert_eq!(agents[0].shoot_cooldown, 0.0);
    }

    fn boss_for_wave(wave: u32) -> Agent {
        use crate::sim::director::boss_plan;
        use crate::sim::elite::{Boss, Elite};

        let plan = boss_plan(wave).unwrap();
        Agent::with_traits(1, Vec2::ZERO, Personality::Aggressive, true, true)
            .with_elite(Elite::Boss(Boss::new(plan.health, plan.shoot_probability)))
    }

    /// Shots fired over `rounds` ready cooldowns
    fn boss_shots(wave: u32, rounds: usize, seed: u64) -> usize {
        let mut rng = Pcg32::seed_from_u64(seed);
        let rock = Asteroid::new(9, Vec2::new(100.0, 0.0), Vec2::ZERO, 20.0, &mut rng);
        let mut agents = vec![boss_for_wave(wave)];
        (0..rounds)
            .map(|_| update_shooters(&mut agents, std::slice::from_ref(&rock), 0.0, 0.1, &mut rng).len())
            .sum()
    }

    #[test]
    fn test_first_cycle_boss_never_fires() {
        for wave in [5, 10, 15] {
            assert_eq!(boss_shots(wave, 1000, wave as u64), 0, "wave {wave}");
        }
    }

    #[test]
    fn test_later_cycle_boss_fires_at_its_probability() {
        // Wave 35 is the third cycle: 60% per ready cooldown
        let shots = boss_shots(35, 1000, 11);
        assert!((540..=660).contains(&shots), "fired {shots} of 1000");

        // Wave 95 is far enough out to always fire
        assert_eq!(boss_shots(95, 200, 12), 200);
    }
}
