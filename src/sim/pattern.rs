//! Micro-pattern library
//!
//! Local trajectories layered on top of a mover's anchor. Every pattern is a
//! pure function of local time returning a normalized offset (roughly within
//! [-1, 1] per axis); `MicroState` picks patterns and tiers, then rotates,
//! scales, clamps and cross-fades the result into screen pixels.
//!
//! Shapes are always evaluated at unit gain and shrunk as a whole; gain is
//! applied afterwards as a fraction of the largest reachable gain, so a higher
//! gain always means a larger (never a flattened) pattern.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::behavior::BehaviorProfile;
use super::state::Dna;
use crate::consts::BLEND_WINDOW_MS;
use crate::{rotate, smoothstep};

/// Micro-pattern kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    /// 1:2 Lissajous "∞"
    Figure8,
    /// 1:1.4 Lissajous
    Figure8Wide,
    /// Figure-eight growing over its lifetime
    Figure8Spiral,
    /// Radius grows along a rotating angle, wraps every duration
    Spiral,
    /// Spiral restarting three times per duration
    SpiralBurst,
    /// Hypotrochoid-like rosette
    Rosette,
    /// Hold still, then sweep a semicircle
    SwerveStop,
}

impl PatternKind {
    pub const ALL: [PatternKind; 7] = [
        PatternKind::Figure8,
        PatternKind::Figure8Wide,
        PatternKind::Figure8Spiral,
        PatternKind::Spiral,
        PatternKind::SpiralBurst,
        PatternKind::Rosette,
        PatternKind::SwerveStop,
    ];

    pub fn is_figure8(self) -> bool {
        matches!(
            self,
            PatternKind::Figure8 | PatternKind::Figure8Wide | PatternKind::Figure8Spiral
        )
    }

    /// Figure-eights stretch with the arena per axis, the rest scale uniformly
    pub fn scaling(self) -> Scaling {
        if self.is_figure8() {
            Scaling::PerAxis
        } else {
            Scaling::Uniform
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// x by half-width, y by half-height
    PerAxis,
    /// Both axes by the smaller half-dimension
    Uniform,
}

/// Size class of a micro-pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Small,
    Medium,
    Large,
}

/// S -> M -> L -> M -> S ...
pub const TIER_CYCLE: [Tier; 4] = [Tier::Small, Tier::Medium, Tier::Large, Tier::Medium];

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Small, Tier::Medium, Tier::Large];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Amplitude as a fraction of the relevant half-dimension
    pub fn amplitude(self, scaling: Scaling) -> f32 {
        match (scaling, self) {
            (Scaling::PerAxis, Tier::Small) => 0.10,
            (Scaling::PerAxis, Tier::Medium) => 0.18,
            (Scaling::PerAxis, Tier::Large) => 0.28,
            (Scaling::Uniform, Tier::Small) => 0.12,
            (Scaling::Uniform, Tier::Medium) => 0.20,
            (Scaling::Uniform, Tier::Large) => 0.30,
        }
    }
}

/// Per-evaluation parameters
#[derive(Debug, Clone, Copy)]
pub struct PatternParams {
    /// Angular frequency (rad/s)
    pub angular_freq: f32,
    pub phase1: f32,
    pub phase2: f32,
    /// Time since the pattern started (ms)
    pub elapsed_ms: f32,
    /// Scheduled pattern duration (ms)
    pub duration_ms: f32,
}

impl PatternParams {
    fn fraction(&self) -> f32 {
        (self.elapsed_ms / self.duration_ms.max(1.0)).clamp(0.0, 1.0)
    }

    /// Position within a cycle repeating `cycles` times per duration
    fn cycle_fraction(&self, cycles: f32) -> f32 {
        let period = self.duration_ms.max(1.0) / cycles;
        (self.elapsed_ms.max(0.0) % period) / period
    }
}

/// Evaluate a pattern at local time `t` (seconds)
pub fn evaluate(kind: PatternKind, t: f32, gain: f32, p: &PatternParams) -> Vec2 {
    let a = p.angular_freq * t + p.phase1;
    let raw = match kind {
        PatternKind::Figure8 => Vec2::new(a.sin(), (2.0 * a + p.phase2).sin() * 0.6),
        PatternKind::Figure8Wide => Vec2::new(a.sin(), (1.4 * a + p.phase2).sin() * 0.7),
        PatternKind::Figure8Spiral => {
            let growth = 0.35 + 0.65 * p.fraction();
            Vec2::new(a.sin(), (2.0 * a + p.phase2).sin() * 0.6) * growth
        }
        PatternKind::Spiral => {
            let r = p.cycle_fraction(1.0).powf(0.9);
            Vec2::new(a.cos(), a.sin()) * r
        }
        PatternKind::SpiralBurst => {
            let r = p.cycle_fraction(3.0).powf(0.9);
            Vec2::new(a.cos(), a.sin()) * r
        }
        PatternKind::Rosette => {
            let b = 3.7 * a + p.phase2;
            Vec2::new(a.cos() + 0.35 * b.cos(), a.sin() - 0.35 * b.sin()) / 1.35
        }
        PatternKind::SwerveStop => {
            let f = p.cycle_fraction(1.0);
            if f < 0.35 {
                // Near-still hold
                Vec2::new(a.sin(), a.cos()) * 0.04
            } else {
                let s = smoothstep((f - 0.35) / 0.65);
                let sweep = p.phase1 + PI * s;
                let start = Vec2::new(p.phase1.cos(), p.phase1.sin());
                (Vec2::new(sweep.cos(), sweep.sin()) - start) * 0.5
            }
        }
    };
    raw * gain
}

/// Shrink a normalized offset into the unit box (per-axis) or unit disc
/// (uniform). Both axes are scaled by the same factor.
pub fn bound_normalized(kind: PatternKind, v: Vec2) -> Vec2 {
    let extent = match kind.scaling() {
        Scaling::PerAxis => v.abs().max_element(),
        Scaling::Uniform => v.length(),
    };
    if extent > 1.0 { v / extent } else { v }
}

/// Bounded unit-gain offset scaled by `gain` relative to `gain_ceiling`
pub fn apply_gain(kind: PatternKind, v: Vec2, gain: f32, gain_ceiling: f32) -> Vec2 {
    let fraction = (gain / gain_ceiling.max(1e-3)).clamp(0.0, 1.0);
    bound_normalized(kind, v) * fraction
}

/// Normalized offset -> screen pixels
pub fn scale_offset(kind: PatternKind, tier: Tier, v: Vec2, half: Vec2) -> Vec2 {
    let scaling = kind.scaling();
    let amp = tier.amplitude(scaling);
    match scaling {
        Scaling::PerAxis => v * half * amp,
        Scaling::Uniform => v * half.min_element() * amp,
    }
}

/// Shrink `offset` uniformly so `anchor + offset` stays within `limit`.
///
/// Scaling the whole vector (instead of truncating per axis) keeps the shape
/// of large patterns readable near the walls.
pub fn soft_radial_clamp(anchor: Vec2, offset: Vec2, limit: Vec2) -> Vec2 {
    let mut scale: f32 = 1.0;
    for (a, o, l) in [(anchor.x, offset.x, limit.x), (anchor.y, offset.y, limit.y)] {
        let l = l.max(0.0);
        if o.abs() < 1e-6 {
            continue;
        }
        let room = if o > 0.0 { l - a } else { l + a };
        scale = scale.min((room / o.abs()).max(0.0));
    }
    offset * scale.clamp(0.0, 1.0)
}

/// Short threat-triggered deviation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Feint {
    #[default]
    None,
    /// Mirror the pattern until the deadline
    PhaseInvert { until: f64 },
    /// Add 25 Hz lateral jitter until the deadline
    ZigZag { until: f64 },
}

impl Feint {
    pub fn is_active(&self, now: f64) -> bool {
        match *self {
            Feint::None => false,
            Feint::PhaseInvert { until } | Feint::ZigZag { until } => now < until,
        }
    }
}

const ZIGZAG_HZ: f32 = 25.0;
const ZIGZAG_AMPLITUDE: f32 = 0.15;
/// Consecutive non-figure-eight picks before one is forced
const FIGURE8_DROUGHT: u32 = 3;

/// Inputs for one offset evaluation
#[derive(Debug, Clone, Copy)]
pub struct OffsetContext {
    pub now: f64,
    /// Gain after amplitude modulation and threat
    pub gain: f32,
    /// Largest gain modulation and threat can reach; maps to full tier amplitude
    pub gain_ceiling: f32,
    /// Arena half-extent
    pub half: Vec2,
    /// Current anchor (screen)
    pub anchor: Vec2,
    /// Mover radius
    pub radius: f32,
    pub feint: Feint,
}

/// Per-mover micro-pattern state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroState {
    pub kind: PatternKind,
    pub tier: Tier,
    /// Own position in `TIER_CYCLE`
    pub tier_cursor: usize,
    pub phase1: f32,
    pub phase2: f32,
    pub started_at: f64,
    pub duration_ms: f64,
    /// Deadline; threat may pull it earlier, never later
    pub ends_at: f64,
    pub gain: f32,
    /// Frequency-warped local time (s)
    pub local_time: f32,
    /// Eased oscillation frequency (Hz)
    pub current_freq: f32,
    pub frame_angle: f32,
    /// Frame rotation rate (rad/s)
    pub frame_rate: f32,
    pub am_phase: f32,
    pub fm_phase: f32,
    /// Last published offset
    pub prev_offset: Vec2,
    pub blend_from: Vec2,
    pub blend_start: f64,
    pub figure8_drought: u32,
}

impl MicroState {
    /// Fresh state with randomized phases; call `choose_new_micro` before use
    pub fn spawn<R: Rng>(rng: &mut R, dna: &Dna, now: f64) -> Self {
        Self {
            kind: PatternKind::Figure8,
            tier: Tier::Small,
            tier_cursor: rng.random_range(0..TIER_CYCLE.len()),
            phase1: rng.random_range(0.0..TAU),
            phase2: rng.random_range(0.0..TAU),
            started_at: now,
            duration_ms: 0.0,
            ends_at: now,
            gain: dna.gain_min,
            local_time: 0.0,
            current_freq: dna.base_freq,
            frame_angle: rng.random_range(0.0..TAU),
            frame_rate: 0.0,
            am_phase: rng.random_range(0.0..TAU),
            fm_phase: rng.random_range(0.0..TAU),
            prev_offset: Vec2::ZERO,
            blend_from: Vec2::ZERO,
            blend_start: now - BLEND_WINDOW_MS,
            figure8_drought: 0,
        }
    }

    pub fn expired(&self, now: f64) -> bool {
        now >= self.ends_at
    }

    /// Pick the next tier and pattern from the role/episode weights
    pub fn choose_new_micro<R: Rng>(
        &mut self,
        rng: &mut R,
        dna: &Dna,
        role: &BehaviorProfile,
        episode: &BehaviorProfile,
        now: f64,
    ) {
        let prev_kind = self.kind;
        let prev_tier = self.tier;

        self.tier_cursor = (self.tier_cursor + 1) % TIER_CYCLE.len();
        self.tier = pick_tier(rng, TIER_CYCLE[self.tier_cursor], role, episode);

        let force_figure8 = self.figure8_drought >= FIGURE8_DROUGHT;
        let weighted: Vec<(PatternKind, f32)> = PatternKind::ALL
            .iter()
            .filter(|k| !force_figure8 || k.is_figure8())
            .map(|&k| (k, role.pattern_weight(k) * episode.pattern_weight(k)))
            .collect();
        self.kind = weighted_pick(rng, &weighted).unwrap_or(PatternKind::Figure8);

        if self.kind.is_figure8() {
            self.figure8_drought = 0;
        } else {
            self.figure8_drought += 1;
        }

        self.started_at = now;
        self.duration_ms = rng.random_range(2500.0..5000.0);
        self.ends_at = now + self.duration_ms;
        self.gain = if dna.gain_max > dna.gain_min {
            rng.random_range(dna.gain_min..dna.gain_max)
        } else {
            dna.gain_min
        };
        self.local_time = 0.0;
        self.frame_rate = rng.random_range(0.05..0.2) * if rng.random_bool(0.5) { 1.0 } else { -1.0 };

        if self.kind != prev_kind || self.tier != prev_tier {
            self.blend_from = self.prev_offset;
            self.blend_start = now;
        }
    }

    /// Advance local time and the rotating frame with the eased frequency
    pub fn advance_clock(&mut self, dt_secs: f32, base_freq: f32, target_freq: f32, ease: f32) {
        self.current_freq += (target_freq - self.current_freq) * ease.clamp(0.0, 1.0);
        self.local_time += dt_secs * self.current_freq / base_freq.max(1e-3);
        self.frame_angle = (self.frame_angle + self.frame_rate * dt_secs) % TAU;
    }

    /// Screen-space offset from the anchor for this frame
    pub fn compute_offset(&mut self, dna: &Dna, ctx: &OffsetContext) -> Vec2 {
        let params = PatternParams {
            angular_freq: TAU * dna.base_freq,
            phase1: self.phase1,
            phase2: self.phase2,
            elapsed_ms: (ctx.now - self.started_at) as f32,
            duration_ms: self.duration_ms as f32,
        };
        let raw = evaluate(self.kind, self.local_time, 1.0, &params);
        let mut v = rotate(raw, self.frame_angle.cos(), self.frame_angle.sin());

        match ctx.feint {
            Feint::PhaseInvert { until } if ctx.now < until => v = -v,
            Feint::ZigZag { until } if ctx.now < until => {
                let side = crate::safe_normalize(v, Vec2::X).perp();
                let wobble = (TAU * ZIGZAG_HZ * (ctx.now / 1000.0) as f32).sin();
                v += side * wobble * ZIGZAG_AMPLITUDE;
            }
            _ => {}
        }

        let v = apply_gain(self.kind, v, ctx.gain, ctx.gain_ceiling);
        let scaled = scale_offset(self.kind, self.tier, v, ctx.half);

        let since_blend = ctx.now - self.blend_start;
        let blended = if since_blend < BLEND_WINDOW_MS {
            let t = (since_blend / BLEND_WINDOW_MS).clamp(0.0, 1.0) as f32;
            self.blend_from.lerp(scaled, t)
        } else {
            scaled
        };

        let limit = ctx.half - Vec2::splat(ctx.radius);
        let out = soft_radial_clamp(ctx.anchor, blended, limit);
        self.prev_offset = out;
        out
    }
}

/// Keep the cycled tier with probability proportional to its combined
/// weight, otherwise draw a tier by weight.
fn pick_tier<R: Rng>(
    rng: &mut R,
    cycled: Tier,
    role: &BehaviorProfile,
    episode: &BehaviorProfile,
) -> Tier {
    let weighted: Vec<(Tier, f32)> = Tier::ALL
        .iter()
        .map(|&t| (t, role.tier_weight(t) * episode.tier_weight(t)))
        .collect();
    let max = weighted.iter().map(|(_, w)| *w).fold(0.0, f32::max);
    let keep = weighted[cycled.index()].1;
    if max <= 0.0 || rng.random::<f32>() * max <= keep {
        cycled
    } else {
        weighted_pick(rng, &weighted).unwrap_or(cycled)
    }
}

/// Weighted random draw; `None` when no weight is positive
pub fn weighted_pick<R: Rng, T: Copy>(rng: &mut R, items: &[(T, f32)]) -> Option<T> {
    let total: f32 = items.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.random::<f32>() * total;
    for &(item, w) in items {
        let w = w.max(0.0);
        if roll < w {
            return Some(item);
        }
        roll -= w;
    }
    items.iter().rev().find(|(_, w)| *w > 0.0).map(|(item, _)| *item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::behavior::{Category, Episode, Role};
    use crate::sim::threat::effective_gain;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const HALF: Vec2 = Vec2::new(640.0, 360.0);
    const CEILING: f32 = 2.0;

    fn ctx(now: f64, gain: f32, feint: Feint) -> OffsetContext {
        OffsetContext {
            now,
            gain,
            gain_ceiling: CEILING,
            half: HALF,
            anchor: Vec2::ZERO,
            radius: 20.0,
            feint,
        }
    }

    /// Running pattern started at t = 10 ms with no rotation and no blend
    fn steady(kind: PatternKind, tier: Tier) -> (Dna, MicroState) {
        let mut rng = Pcg32::seed_from_u64(21);
        let dna = Dna::spawn(&mut rng);
        let mut micro = MicroState::spawn(&mut rng, &dna, 10.0);
        micro.kind = kind;
        micro.tier = tier;
        micro.duration_ms = 4000.0;
        micro.ends_at = 4010.0;
        micro.frame_angle = 0.0;
        micro.blend_start = -1.0e9;
        (dna, micro)
    }

    fn params(elapsed_ms: f32) -> PatternParams {
        PatternParams {
            angular_freq: TAU * 0.35,
            phase1: 0.4,
            phase2: 1.1,
            elapsed_ms,
            duration_ms: 4000.0,
        }
    }

    #[test]
    fn test_swerve_holds_then_sweeps() {
        let still = evaluate(PatternKind::SwerveStop, 1.0, 1.0, &params(1000.0));
        assert!(still.length() < 0.05);
        let swept = evaluate(PatternKind::SwerveStop, 1.0, 1.0, &params(3990.0));
        // End of sweep: half-turn from start, chord of length 2 * 0.5
        assert!((swept.length() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_spiral_wraps_each_duration() {
        let late = evaluate(PatternKind::Spiral, 0.0, 1.0, &params(3999.0));
        let wrapped = evaluate(PatternKind::Spiral, 0.0, 1.0, &params(4001.0));
        assert!(late.length() > 0.95);
        assert!(wrapped.length() < 0.01);
    }

    #[test]
    fn test_spiral_burst_resets_three_times() {
        let third = 4000.0 / 3.0;
        let before = evaluate(PatternKind::SpiralBurst, 0.0, 1.0, &params(third - 1.0));
        let after = evaluate(PatternKind::SpiralBurst, 0.0, 1.0, &params(third + 1.0));
        assert!(before.length() > 0.95);
        assert!(after.length() < 0.01);
    }

    #[test]
    fn test_figure8_spiral_grows() {
        let p_early = params(0.0);
        let p_late = params(4000.0);
        let t = 0.3;
        let early = evaluate(PatternKind::Figure8Spiral, t, 1.0, &p_early);
        let late = evaluate(PatternKind::Figure8Spiral, t, 1.0, &p_late);
        assert!(late.length() > early.length());
    }

    #[test]
    fn test_soft_clamp_scales_uniformly() {
        let limit = Vec2::new(100.0, 100.0);
        let anchor = Vec2::new(80.0, 0.0);
        let offset = Vec2::new(40.0, 40.0);
        let clamped = soft_radial_clamp(anchor, offset, limit);
        assert!((clamped.x - 20.0).abs() < 1e-4);
        // Direction is preserved, not truncated per-axis
        assert!((clamped.y - 20.0).abs() < 1e-4);
        assert_eq!(soft_radial_clamp(Vec2::ZERO, offset, limit), offset);
    }

    #[test]
    fn test_anti_drought_forces_figure8() {
        let mut rng = Pcg32::seed_from_u64(11);
        let dna = Dna::spawn(&mut rng);
        let mut micro = MicroState::spawn(&mut rng, &dna, 0.0);
        let role = Role::Orbiter.profile();
        let episode = Episode::Coil.profile();
        let mut streak = 0;
        for i in 0..200 {
            micro.choose_new_micro(&mut rng, &dna, &role, &episode, i as f64 * 3000.0);
            if micro.kind.is_figure8() {
                streak = 0;
            } else {
                streak += 1;
            }
            assert!(streak <= FIGURE8_DROUGHT);
        }
    }

    #[test]
    fn test_choose_sets_schedule_and_gain() {
        let mut rng = Pcg32::seed_from_u64(5);
        let dna = Dna::spawn(&mut rng);
        let mut micro = MicroState::spawn(&mut rng, &dna, 100.0);
        micro.choose_new_micro(&mut rng, &dna, &Role::Lurker.profile(), &Episode::Cruise.profile(), 100.0);
        assert!(micro.duration_ms >= 2500.0 && micro.duration_ms < 5000.0);
        assert_eq!(micro.ends_at, 100.0 + micro.duration_ms);
        assert!(micro.gain >= dna.gain_min && micro.gain <= dna.gain_max);
    }

    #[test]
    fn test_blend_starts_from_previous_offset() {
        let mut rng = Pcg32::seed_from_u64(9);
        let dna = Dna::spawn(&mut rng);
        let mut micro = MicroState::spawn(&mut rng, &dna, 0.0);
        micro.prev_offset = Vec2::new(30.0, -12.0);
        micro.kind = PatternKind::Rosette;
        micro.tier = Tier::Large;
        // Rosette and Large are weighted out, so both must change
        let role = BehaviorProfile {
            distance_bias: 0.0,
            pattern_weights: &[(PatternKind::Rosette, 0.0)],
            tier_weights: [1.0, 0.0, 0.0],
            macro_speed: 1.0,
        };
        micro.choose_new_micro(&mut rng, &dna, &role, &Episode::Cruise.profile(), 1000.0);
        assert_ne!(micro.kind, PatternKind::Rosette);
        assert_eq!(micro.tier, Tier::Small);
        assert_eq!(micro.blend_start, 1000.0);

        let out = micro.compute_offset(&dna, &ctx(1000.0, 1.0, Feint::None));
        assert!((out - Vec2::new(30.0, -12.0)).length() < 1e-3);
    }

    #[test]
    fn test_threat_gain_enlarges_pattern() {
        let tuning = Tuning::default();
        let (dna, mut micro) = steady(PatternKind::Figure8, Tier::Large);
        micro.local_time = 0.6;
        let calm = effective_gain(1.0, 3.0, micro.am_phase, 0.0, &tuning);
        let threatened = effective_gain(1.0, 3.0, micro.am_phase, 1.0, &tuning);
        let a = micro.clone().compute_offset(&dna, &ctx(10_000.0, calm, Feint::None));
        let b = micro.compute_offset(&dna, &ctx(10_000.0, threatened, Feint::None));
        assert!(b.length() > a.length());
        assert!((b.length() / a.length() - threatened / calm).abs() < 1e-3);
    }

    #[test]
    fn test_full_gain_keeps_shape_unclipped() {
        let (dna, mut micro) = steady(PatternKind::Figure8, Tier::Large);
        let amp = Tier::Large.amplitude(Scaling::PerAxis);
        let params = PatternParams {
            angular_freq: TAU * dna.base_freq,
            phase1: micro.phase1,
            phase2: micro.phase2,
            elapsed_ms: 10_000.0,
            duration_ms: micro.duration_ms as f32,
        };
        let mut peak = 0.0f32;
        for step in 0..400 {
            micro.local_time = step as f32 * 0.01;
            let out = micro.compute_offset(&dna, &ctx(10_000.0, CEILING, Feint::None));
            // Pure linear scaling of the unit-gain curve: nothing truncated
            let expected = evaluate(PatternKind::Figure8, micro.local_time, 1.0, &params) * HALF * amp;
            assert!((out - expected).length() < 1e-2);
            peak = peak.max(out.x.abs());
        }
        assert!(peak > 0.99 * amp * HALF.x);
    }

    #[test]
    fn test_phase_invert_mirrors_offset() {
        let (dna, mut micro) = steady(PatternKind::Spiral, Tier::Medium);
        let plain = micro.clone().compute_offset(&dna, &ctx(1010.0, CEILING * 0.5, Feint::None));
        let inverted = micro.compute_offset(
            &dna,
            &ctx(1010.0, CEILING * 0.5, Feint::PhaseInvert { until: 2000.0 }),
        );
        assert!(plain.length() > 1.0);
        assert!((inverted + plain).length() < 1e-3);
    }

    #[test]
    fn test_zigzag_jitters_sideways() {
        let (dna, mut micro) = steady(PatternKind::Spiral, Tier::Medium);
        let plain = micro.clone().compute_offset(&dna, &ctx(1010.0, CEILING * 0.5, Feint::None));
        let zig = micro.compute_offset(&dna, &ctx(1010.0, CEILING * 0.5, Feint::ZigZag { until: 2000.0 }));
        let jitter = zig - plain;
        assert!(jitter.length() > 1.0);
        assert!(jitter.normalize().dot(plain.normalize()).abs() < 1e-2);

        // Expired feints are ignored
        let late = micro.compute_offset(&dna, &ctx(1010.0, CEILING * 0.5, Feint::ZigZag { until: 1000.0 }));
        assert!((late - plain).length() < 1e-3);
    }

    #[test]
    fn test_weighted_pick_skips_zero_weights() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(weighted_pick(&mut rng, &[(1, 0.0), (2, 3.0), (3, 0.0)]), Some(2));
        }
        assert_eq!(weighted_pick::<_, i32>(&mut rng, &[(1, 0.0)]), None);
    }

    proptest! {
        #[test]
        fn prop_offset_within_tier_amplitude(
            kind_idx in 0usize..7,
            tier_idx in 0usize..3,
            t in 0.0f32..60.0,
            elapsed in 0.0f32..10_000.0,
            gain in 0.0f32..2.5,
            angle in 0.0f32..TAU,
        ) {
            let kind = PatternKind::ALL[kind_idx];
            let tier = Tier::ALL[tier_idx];
            let raw = evaluate(kind, t, 1.0, &params(elapsed));
            let v = rotate(raw, angle.cos(), angle.sin());
            let scaled = scale_offset(kind, tier, apply_gain(kind, v, gain, CEILING), HALF);
            let amp = tier.amplitude(kind.scaling());
            match kind.scaling() {
                Scaling::PerAxis => {
                    prop_assert!(scaled.x.abs() <= amp * HALF.x + 1e-3);
                    prop_assert!(scaled.y.abs() <= amp * HALF.y + 1e-3);
                }
                Scaling::Uniform => {
                    prop_assert!(scaled.length() <= amp * HALF.min_element() + 1e-3);
                }
            }
        }

        #[test]
        fn prop_soft_clamp_keeps_inside(
            ax in -300.0f32..300.0,
            ay in -150.0f32..150.0,
            ox in -400.0f32..400.0,
            oy in -400.0f32..400.0,
        ) {
            let limit = Vec2::new(300.0, 150.0);
            let out = soft_radial_clamp(Vec2::new(ax, ay), Vec2::new(ox, oy), limit);
            prop_assert!((ax + out.x).abs() <= limit.x + 1e-2);
            prop_assert!((ay + out.y).abs() <= limit.y + 1e-2);
        }
    }
}
