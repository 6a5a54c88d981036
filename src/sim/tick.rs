//! Per-frame update
//!
//! One synchronous call advances every mover. Order matters and is fixed:
//! heatmap decay, role/episode expiry, anchor retarget/advance, threat,
//! micro offset, avoidance, integration, containment, world publish.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::avoidance::{
    Obstacle, contain, flee_force, mover_separation, predictive_avoidance, resolve_velocity,
    target_repulsion,
};
use super::behavior::{Category, EPISODE_LIFETIME_MS, ROLE_LIFETIME_MS, draw_lifetime};
use super::lifecycle::HitOutcome;
use super::pattern::{Feint, OffsetContext};
use super::state::{MoverEvent, MoverSystem, ResetKind};
use super::threat::{
    FeintTrigger, effective_gain, gain_ceiling, hasten, roll_feint, target_frequency, threat_alpha,
};
use super::transform::ScreenTransform;
use crate::consts::{HIT_FLASH_MS, REFERENCE_FRAME_MS};

/// Base speed at which the steering gain applies unscaled
const REFERENCE_BASE_SPEED: f32 = 2.0;
/// Per-frame chance to flip the lateral flee side
const LATERAL_FLIP_CHANCE: f32 = 0.002;

/// Playable arena: half-width/half-height minus the screen margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub half: Vec2,
}

impl Arena {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half: Vec2::new(half_width, half_height),
        }
    }
}

/// A live stationary target in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetCircle {
    pub pos: Vec2,
    pub radius: f32,
}

/// Inputs for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Normalized elapsed time (1.0 = one reference frame)
    pub dt: f32,
    /// Monotonic clock (ms)
    pub now_ms: f64,
    /// Player position and view rotation
    pub transform: ScreenTransform,
    /// `None` until the arena has been measured
    pub arena: Option<Arena>,
    /// Live (un-hit, not fading) targets
    pub targets: Vec<TargetCircle>,
    /// Player speed (px per reference frame)
    pub player_speed: f32,
}

impl MoverSystem {
    /// Reconcile the collection with the configured count.
    ///
    /// Returns false (and does nothing) while the arena is unknown.
    pub fn ensure_count(&mut self, arena: Option<Arena>, now: f64) -> bool {
        let Some(arena) = arena else {
            return false;
        };
        self.frame.half = Some(arena.half);

        let wanted = self.settings.effective_count();
        if wanted == self.movers.len() {
            return true;
        }
        log::info!("Mover count {} -> {}", self.movers.len(), wanted);

        while self.movers.len() > wanted {
            if let Some(mover) = self.movers.pop() {
                if mover.is_alive() {
                    self.roles.release(mover.role);
                    self.episodes.release(mover.episode);
                }
            }
        }
        while self.movers.len() < wanted {
            let slot = self.movers.len();
            let mover = self.spawn_mover(slot, arena.half, now);
            self.movers.push(mover);
            self.events.push(MoverEvent::Spawned { slot });
        }
        true
    }

    /// Advance every mover by one frame.
    ///
    /// Returns false while the arena is unknown; the caller retries next frame.
    pub fn update(&mut self, input: &FrameInput) -> bool {
        let Some(arena) = input.arena else {
            return false;
        };
        let half = arena.half;
        let now = input.now_ms;
        let dt = input.dt.max(0.0);
        let dt_ms = dt * REFERENCE_FRAME_MS;
        let dt_secs = dt_ms / 1000.0;
        let time_secs = (now / 1000.0) as f32;

        self.frame.now = now;
        self.frame.half = Some(half);
        self.frame.transform = input.transform;
        self.frame.targets.clone_from(&input.targets);

        self.heat.decay();

        // Pre-update snapshot so no mover sees another's half-updated state
        let obstacles: Vec<(usize, Obstacle)> = self
            .movers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_alive())
            .map(|(i, m)| {
                (
                    i,
                    Obstacle {
                        pos: m.screen_pos,
                        vel: m.screen_vel,
                        radius: m.radius,
                    },
                )
            })
            .collect();
        let anchors: Vec<(usize, Vec2)> = self
            .movers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_alive())
            .map(|(i, m)| (i, m.anchor.pos))
            .collect();
        let gain_ceiling = gain_ceiling(&self.tuning);

        for idx in 0..self.movers.len() {
            if !self.movers[idx].is_alive() {
                continue;
            }

            if self.movers[idx].combat.try_heal(now, &self.settings) {
                log::debug!("Mover {idx} healed");
                self.events.push(MoverEvent::Healed { slot: idx });
            }

            self.rotate_behaviors(idx, now);

            if self.rng.random_bool((LATERAL_FLIP_CHANCE * dt).clamp(0.0, 1.0) as f64) {
                let mover = &mut self.movers[idx];
                mover.lateral_sign = -mover.lateral_sign;
            }

            if self.movers[idx].anchor.transition_done(now) {
                let other_anchors: Vec<Vec2> = anchors
                    .iter()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, pos)| *pos)
                    .collect();
                self.retarget(idx, half, now, &other_anchors);
            }

            let others: Vec<Obstacle> = obstacles
                .iter()
                .filter(|(i, _)| *i != idx)
                .map(|(_, o)| *o)
                .collect();

            let settings = &self.settings;
            let tuning = &self.tuning;
            let mover = &mut self.movers[idx];

            mover.anchor.advance(now, dt_ms, half);

            // Threat
            let threat = threat_alpha(mover.screen_pos, half, settings.flee_enabled, tuning);
            mover.threat = threat;
            if threat > 0.0 {
                let anchor_end = hasten(mover.anchor.move_end, now, threat, dt, tuning);
                mover.anchor.reschedule(now, anchor_end);
                mover.micro.ends_at = hasten(mover.micro.ends_at, now, threat, dt, tuning);
            }

            if !mover.feint.is_active(now) {
                mover.feint = Feint::None;
                match roll_feint(&mut self.rng, &mover.dna, threat, false, now, dt, tuning) {
                    Some(FeintTrigger::Reanchor) => {
                        log::debug!("Mover {idx} feints: re-anchor");
                        mover.anchor.expire(now);
                    }
                    Some(FeintTrigger::Effect(feint)) => {
                        log::debug!("Mover {idx} feints: {feint:?}");
                        mover.feint = feint;
                    }
                    None => {}
                }
            }

            // Micro-pattern
            if mover.micro.expired(now) {
                let role = mover.role.profile();
                let episode = mover.episode.profile();
                mover
                    .micro
                    .choose_new_micro(&mut self.rng, &mover.dna, &role, &episode, now);
            }
            let freq = target_frequency(&mover.dna, time_secs, mover.micro.fm_phase, threat, tuning);
            mover
                .micro
                .advance_clock(dt_secs, mover.dna.base_freq, freq, tuning.freq_ease_rate * dt);
            let gain = effective_gain(mover.micro.gain, time_secs, mover.micro.am_phase, threat, tuning);
            let offset = mover.micro.compute_offset(
                &mover.dna,
                &OffsetContext {
                    now,
                    gain,
                    gain_ceiling,
                    half,
                    anchor: mover.anchor.pos,
                    radius: mover.radius,
                    feint: mover.feint,
                },
            );

            // Steering
            let goal = mover.anchor.pos + offset;
            let speed_scale = settings.base_speed / REFERENCE_BASE_SPEED;
            let mut desired = (goal - mover.screen_pos) * tuning.steering_gain * speed_scale;

            desired += target_repulsion(
                mover.screen_pos,
                mover.radius,
                &input.targets,
                settings.avoidance,
                tuning,
            );
            desired += mover_separation(mover.screen_pos, mover.radius, &others, settings.avoidance, tuning);
            desired += predictive_avoidance(
                mover.screen_pos,
                mover.screen_vel,
                mover.radius,
                &others,
                settings.avoidance,
                tuning,
            );

            let boost = mover.combat.escape_boost;
            if settings.flee_enabled {
                desired += flee_force(
                    mover.screen_pos,
                    input.player_speed,
                    boost,
                    mover.lateral_sign,
                    half,
                    tuning,
                );
            } else if boost > 0.0 {
                // Same scripted path, just faster
                desired *= 1.0 + boost;
            }

            // Integrate and contain
            let vel = resolve_velocity(desired, mover.screen_vel, settings.base_speed, tuning);
            let limit = half - Vec2::splat(mover.radius);
            let (pos, vel) = contain(mover.screen_pos + vel * dt, vel, limit);
            mover.screen_pos = pos;
            mover.screen_vel = vel;

            // Publish
            mover.world_pos = input.transform.to_world(pos);
            mover.world_vel = input.transform.dir_to_world(vel);
        }

        true
    }

    /// Expire role and episode on their deadlines; a change forces a fresh
    /// anchor and micro-pattern so the new bias shows immediately.
    fn rotate_behaviors(&mut self, idx: usize, now: f64) {
        let mover = &mut self.movers[idx];
        let mut changed = false;

        if now >= mover.role_until {
            self.roles.release(mover.role);
            let role = self.roles.assign(&mut self.rng);
            log::debug!("Mover {idx} role {:?} -> {:?}", mover.role, role);
            mover.role = role;
            mover.role_until = now + draw_lifetime(&mut self.rng, ROLE_LIFETIME_MS);
            changed = true;
        }
        if now >= mover.episode_until {
            self.episodes.release(mover.episode);
            let episode = self.episodes.assign(&mut self.rng);
            log::debug!("Mover {idx} episode {:?} -> {:?}", mover.episode, episode);
            mover.episode = episode;
            mover.episode_until = now + draw_lifetime(&mut self.rng, EPISODE_LIFETIME_MS);
            changed = true;
        }

        if changed {
            mover.anchor.expire(now);
            mover.micro.ends_at = now;
        }
    }

    /// Index of the first live mover under the reticle (player at the screen origin)
    pub fn hit_test(&self) -> Option<usize> {
        self.movers
            .iter()
            .position(|m| m.is_alive() && m.screen_pos.length() <= m.radius)
    }

    /// Register a hit at the last frame's clock
    pub fn register_hit(&mut self, idx: usize) -> HitOutcome {
        self.register_hit_at(idx, self.frame.now)
    }

    /// Register a hit at an explicit timestamp
    pub fn register_hit_at(&mut self, idx: usize, now: f64) -> HitOutcome {
        // No arena yet, nowhere to respawn into
        let Some(half) = self.frame.half else {
            return HitOutcome::Ignored;
        };
        let Some(mover) = self.movers.get_mut(idx) else {
            return HitOutcome::Ignored;
        };
        if !mover.is_alive() {
            return HitOutcome::Ignored;
        }

        let exhausted = mover.combat.record_hit(now, HIT_FLASH_MS, &self.settings);
        let hits = mover.combat.hits;
        self.events.push(MoverEvent::Hit { slot: idx, hits });
        if !exhausted {
            return HitOutcome::Damaged { hits };
        }

        if self.settings.regen_on_hit {
            self.reset_slot(idx, ResetKind::Fresh, half, now);
            log::info!("Mover {idx} exhausted, respawned");
            self.events.push(MoverEvent::Respawned { slot: idx });
            HitOutcome::Respawned
        } else {
            mover_dies(self, idx);
            log::info!("Mover {idx} exhausted, dead until respawn");
            self.events.push(MoverEvent::Died { slot: idx });
            HitOutcome::Died
        }
    }

    /// Reset every mover regardless of state. Dead movers come back with new
    /// DNA; live ones are relocated and keep theirs.
    pub fn respawn_all(&mut self) {
        let Some(half) = self.frame.half else {
            return;
        };
        let now = self.frame.now;
        self.heat.clear();
        for idx in 0..self.movers.len() {
            let kind = if self.movers[idx].is_alive() {
                ResetKind::Relocate
            } else {
                ResetKind::Fresh
            };
            self.reset_slot(idx, kind, half, now);
        }
        log::info!("Respawned all {} movers", self.movers.len());
        self.events.push(MoverEvent::AllRespawned);
    }
}

/// Flip the dead flag and hand the role/episode back to the pools
fn mover_dies(system: &mut MoverSystem, idx: usize) {
    let mover = &mut system.movers[idx];
    system.roles.release(mover.role);
    system.episodes.release(mover.episode);
    mover.combat.dead = true;
    mover.screen_vel = Vec2::ZERO;
    mover.world_vel = Vec2::ZERO;
}
