//! Anchor scheduling
//!
//! Each mover travels between macro targets ("anchors") in screen space.
//! New targets are scored over random heatmap cells so movers spread out,
//! keep clear of each other and of stationary targets, and follow their
//! role/episode distance bias.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::heatmap::{Cell, HeatMap};
use super::tick::TargetCircle;
use crate::consts::{ANCHOR_WALL_MARGIN, HEAT_COLS, HEAT_ROWS};
use crate::tuning::Tuning;

/// Extra clearance around targets counted as an invasion
const INVASION_PADDING: f32 = 10.0;
/// Fallback region when no candidate can be scored
const FALLBACK_FRACTION: f32 = 0.8;

/// Region anchors may occupy, as a half-extent around the origin
#[inline]
pub fn anchor_limit(half: Vec2) -> Vec2 {
    (half - Vec2::splat(ANCHOR_WALL_MARGIN)).max(Vec2::ZERO)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorState {
    /// Current anchor position (screen)
    pub pos: Vec2,
    /// Where the current transition ends up
    pub target: Vec2,
    /// Per-axis transition velocity (px/ms)
    pub vel: Vec2,
    pub move_start: f64,
    pub move_duration: f64,
    pub move_end: f64,
}

/// Everything the scheduler reads besides the anchor itself
#[derive(Debug, Clone, Copy)]
pub struct AnchorContext<'a> {
    pub now: f64,
    pub half: Vec2,
    pub radius: f32,
    /// Anchors of the other live movers; inside a frame, as they were before it
    pub other_anchors: &'a [Vec2],
    pub targets: &'a [TargetCircle],
    pub flee_enabled: bool,
    /// Role bias + episode bias
    pub distance_bias: f32,
    /// Episode macro-speed multiplier
    pub macro_speed: f32,
}

impl AnchorState {
    /// Random position inside the anchor region, due for a retarget immediately
    pub fn spawn<R: Rng>(rng: &mut R, half: Vec2, now: f64) -> Self {
        let pos = random_point(rng, anchor_limit(half));
        Self {
            pos,
            target: pos,
            vel: Vec2::ZERO,
            move_start: now,
            move_duration: 0.0,
            move_end: now,
        }
    }

    pub fn transition_done(&self, now: f64) -> bool {
        now >= self.move_end
    }

    /// Soft cancel: the next scheduling check picks a new target
    pub fn expire(&mut self, now: f64) {
        self.move_end = self.move_end.min(now);
    }

    /// Score random candidate cells and start a transition toward the best one
    pub fn choose_new_target<R: Rng>(
        &mut self,
        rng: &mut R,
        ctx: &AnchorContext<'_>,
        heat: &mut HeatMap,
        tuning: &Tuning,
    ) {
        let limit = anchor_limit(ctx.half);
        let target = if limit.x <= 0.0 || limit.y <= 0.0 {
            None
        } else {
            best_candidate(rng, ctx, heat, tuning)
        };

        let target = match target {
            Some((cell, point)) => {
                heat.increment(cell, tuning.heat_increment);
                point
            }
            None => {
                let point = random_point(rng, ctx.half * FALLBACK_FRACTION).clamp(-limit, limit);
                log::debug!("Anchor fallback to random point {point:?}");
                point
            }
        };

        let distance = (target - self.pos).length();
        let duration =
            (rng.random_range(2000.0..4000.0) + distance as f64 * 2.0) / ctx.macro_speed.max(0.1) as f64;
        let duration = duration.max(1.0);

        self.target = target;
        self.move_start = ctx.now;
        self.move_duration = duration;
        self.move_end = ctx.now + duration;
        self.vel = (target - self.pos) / duration as f32;
    }

    /// Linear advance toward the target; snaps on arrival
    pub fn advance(&mut self, now: f64, dt_ms: f32, half: Vec2) {
        let limit = anchor_limit(half);
        if now >= self.move_end {
            self.pos = self.target;
            self.vel = Vec2::ZERO;
        } else {
            self.pos += self.vel * dt_ms;
        }
        self.pos = self.pos.clamp(-limit, limit);
    }

    /// Pull the transition deadline earlier and speed up to still arrive on time
    pub fn reschedule(&mut self, now: f64, new_end: f64) {
        if new_end >= self.move_end || now >= self.move_end {
            return;
        }
        self.move_end = new_end.max(now);
        let remaining = (self.move_end - now).max(1.0) as f32;
        self.vel = (self.target - self.pos) / remaining;
    }
}

fn best_candidate<R: Rng>(
    rng: &mut R,
    ctx: &AnchorContext<'_>,
    heat: &HeatMap,
    tuning: &Tuning,
) -> Option<(Cell, Vec2)> {
    let limit = anchor_limit(ctx.half);
    let norm = ctx.half.min_element().max(1.0);
    let mut best: Option<(f32, Cell)> = None;

    for _ in 0..tuning.candidate_samples {
        let cell = Cell {
            row: rng.random_range(0..HEAT_ROWS),
            col: rng.random_range(0..HEAT_COLS),
        };
        let (min, size) = heat.cell_rect(cell, ctx.half);
        let point = (min + size * 0.5).clamp(-limit, limit);
        let score = score_candidate(point, heat.heat(cell), ctx, norm, tuning);
        if best.is_none_or(|(s, _)| score > s) {
            best = Some((score, cell));
        }
    }

    best.map(|(_, cell)| {
        // Jitter inside the winning cell so targets never repeat exactly
        let (min, size) = heat.cell_rect(cell, ctx.half);
        let jitter = Vec2::new(rng.random::<f32>(), rng.random::<f32>());
        (cell, (min + size * jitter).clamp(-limit, limit))
    })
}

fn score_candidate(point: Vec2, heat: f32, ctx: &AnchorContext<'_>, norm: f32, tuning: &Tuning) -> f32 {
    let spacing = ctx
        .other_anchors
        .iter()
        .map(|other| (*other - point).length())
        .reduce(f32::min)
        .map_or(1.0, |d| d / norm);

    let invasion = if ctx
        .targets
        .iter()
        .any(|t| (t.pos - point).length() < t.radius + ctx.radius + INVASION_PADDING)
    {
        tuning.invasion_penalty
    } else {
        0.0
    };

    let center = point.length() / norm;
    let flee_bonus = if ctx.flee_enabled { tuning.flee_center_bonus * center } else { 0.0 };

    (1.0 - heat * tuning.heat_penalty) + spacing * tuning.spacing_weight - invasion
        + flee_bonus
        + ctx.distance_bias * center
}

fn random_point<R: Rng>(rng: &mut R, extent: Vec2) -> Vec2 {
    let unit = Vec2::new(rng.random::<f32>(), rng.random::<f32>()) * 2.0 - Vec2::ONE;
    unit * extent
}
