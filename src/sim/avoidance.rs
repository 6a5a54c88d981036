//! Collision avoidance and containment
//!
//! Steering forces in screen space (pixels per reference frame). The player
//! sits at the screen origin, so "away from the player" is simply outward.

use glam::Vec2;

use super::tick::TargetCircle;
use crate::consts::REFERENCE_FRAME_MS;
use crate::safe_normalize;
use crate::tuning::Tuning;

/// Another live mover as seen by the avoidance pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

/// Push away from overlapping circles, proportional to penetration depth
fn repel(pos: Vec2, other: Vec2, threshold: f32) -> Vec2 {
    let delta = pos - other;
    let dist = delta.length();
    if dist >= threshold {
        return Vec2::ZERO;
    }
    // Coincident centers push along +x rather than producing NaN
    safe_normalize(delta, Vec2::X) * (threshold - dist)
}

/// Repulsion from live stationary targets
pub fn target_repulsion(
    pos: Vec2,
    radius: f32,
    targets: &[TargetCircle],
    avoidance: f32,
    tuning: &Tuning,
) -> Vec2 {
    targets
        .iter()
        .map(|t| repel(pos, t.pos, radius + t.radius + tuning.target_padding))
        .sum::<Vec2>()
        * tuning.target_weight
        * avoidance
        * tuning.force_gain
}

/// Separation from other live movers
pub fn mover_separation(
    pos: Vec2,
    radius: f32,
    others: &[Obstacle],
    avoidance: f32,
    tuning: &Tuning,
) -> Vec2 {
    others
        .iter()
        .map(|o| repel(pos, o.pos, radius + o.radius + tuning.mover_padding))
        .sum::<Vec2>()
        * tuning.mover_weight
        * avoidance
        * tuning.force_gain
}

/// Time-to-collision avoidance: steer away from the predicted closest
/// approach within the look-ahead window.
pub fn predictive_avoidance(
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    others: &[Obstacle],
    avoidance: f32,
    tuning: &Tuning,
) -> Vec2 {
    let horizon = tuning.lookahead_secs * 1000.0 / REFERENCE_FRAME_MS;
    let mut force = Vec2::ZERO;
    for other in others {
        let rel_pos = other.pos - pos;
        let rel_vel = other.vel - vel;
        let speed_sq = rel_vel.length_squared();
        let t = if speed_sq > 1e-6 {
            (-rel_pos.dot(rel_vel) / speed_sq).clamp(0.0, horizon)
        } else {
            0.0
        };
        let closest = rel_pos + rel_vel * t;
        let threshold = radius + other.radius + tuning.predictive_padding;
        let dist = closest.length();
        if dist < threshold {
            let away = safe_normalize(-closest, safe_normalize(-rel_pos, Vec2::X));
            force += away * (threshold - dist);
        }
    }
    force * tuning.predictive_weight * avoidance * tuning.force_gain
}

/// Flee from the player, blended with a sideways component.
///
/// Active while the player moves or the mover carries an escape boost.
pub fn flee_force(
    pos: Vec2,
    player_speed: f32,
    escape_boost: f32,
    lateral_sign: f32,
    half: Vec2,
    tuning: &Tuning,
) -> Vec2 {
    let moving = player_speed > tuning.player_moving_threshold;
    if !moving && escape_boost <= 0.0 {
        return Vec2::ZERO;
    }
    let (radial_w, lateral_w, speed) = if moving {
        let (r, l) = tuning.flee_moving_weights;
        (r, l, player_speed)
    } else {
        let (r, l) = tuning.flee_boost_weights;
        (r, l, tuning.flee_reference_speed)
    };

    let away = safe_normalize(pos, Vec2::Y);
    let lateral = away.perp() * lateral_sign.signum();
    let dir = away * radial_w + lateral * lateral_w;

    let norm = half.min_element().max(1.0);
    let proximity = 1.0 / (0.25 + pos.length() / norm);

    dir * speed * (1.0 + escape_boost) * proximity * tuning.flee_gain
}

/// Combine steering into a velocity: cap the speed, and keep drifting on
/// the previous velocity instead of freezing when everything cancels out.
pub fn resolve_velocity(desired: Vec2, prev_vel: Vec2, base_speed: f32, tuning: &Tuning) -> Vec2 {
    if desired.length() < 1e-3 {
        return prev_vel * tuning.velocity_retention;
    }
    desired.clamp_length_max(base_speed * tuning.speed_cap_factor)
}

/// Clamp to the arena; zero only the outward velocity component (wall slide)
pub fn contain(pos: Vec2, vel: Vec2, limit: Vec2) -> (Vec2, Vec2) {
    let limit = limit.max(Vec2::ZERO);
    let mut pos = pos;
    let mut vel = vel;
    if pos.x > limit.x {
        pos.x = limit.x;
        vel.x = vel.x.min(0.0);
    } else if pos.x < -limit.x {
        pos.x = -limit.x;
        vel.x = vel.x.max(0.0);
    }
    if pos.y > limit.y {
        pos.y = limit.y;
        vel.y = vel.y.min(0.0);
    } else if pos.y < -limit.y {
        pos.y = -limit.y;
        vel.y = vel.y.max(0.0);
    }
    (pos, vel)
}
