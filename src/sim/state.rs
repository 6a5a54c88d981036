//! Mover state and the owning system
//!
//! The system owns everything that used to be shared mutable state: the mover
//! slots, the heatmap, the role/episode pools and the seeded RNG.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::anchor::AnchorState;
use super::behavior::{CappedPool, Category, EPISODE_LIFETIME_MS, Episode, ROLE_LIFETIME_MS, Role, draw_lifetime};
use super::heatmap::HeatMap;
use super::lifecycle::{CombatState, MoverTint, tint};
use super::pattern::{Feint, MicroState};
use super::tick::TargetCircle;
use super::transform::ScreenTransform;
use crate::consts::BEHAVIOR_CAP;
use crate::settings::MoverSettings;
use crate::tuning::Tuning;

/// Range of `Dna::gain_min`
const GAIN_MIN_RANGE: (f32, f32) = (0.75, 0.9);
/// Range of `gain_max - gain_min`
const GAIN_SPREAD_RANGE: (f32, f32) = (0.1, 0.25);
/// Largest `gain_max` a DNA roll can produce
pub const MAX_DNA_GAIN: f32 = GAIN_MIN_RANGE.1 + GAIN_SPREAD_RANGE.1;

/// Per-mover constants rolled at spawn and never mutated afterwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dna {
    /// Base oscillation frequency (Hz)
    pub base_freq: f32,
    pub gain_min: f32,
    pub gain_max: f32,
    /// Feint probability scale (per reference frame at full threat)
    pub feint_chance: f32,
}

impl Dna {
    pub fn spawn<R: Rng>(rng: &mut R) -> Self {
        let gain_min = rng.random_range(GAIN_MIN_RANGE.0..GAIN_MIN_RANGE.1);
        Self {
            base_freq: rng.random_range(0.25..0.45),
            gain_min,
            gain_max: gain_min + rng.random_range(GAIN_SPREAD_RANGE.0..GAIN_SPREAD_RANGE.1),
            feint_chance: rng.random_range(0.01..0.04),
        }
    }
}

/// Lifecycle notifications for audio/score collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoverEvent {
    Spawned { slot: usize },
    Hit { slot: usize, hits: u32 },
    Respawned { slot: usize },
    Died { slot: usize },
    Healed { slot: usize },
    AllRespawned,
}

/// How a slot is reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Move elsewhere, keep the mover's DNA
    Relocate,
    /// Brand-new DNA as well
    Fresh,
}

/// A mobile target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mover {
    /// Stable slot in the collection
    pub slot: usize,
    pub dna: Dna,
    pub anchor: AnchorState,
    pub micro: MicroState,
    pub combat: CombatState,
    pub role: Role,
    pub role_until: f64,
    pub episode: Episode,
    pub episode_until: f64,
    /// Integrated position and velocity (screen space, px / px per frame)
    pub screen_pos: Vec2,
    pub screen_vel: Vec2,
    /// Published world-space position and velocity
    pub world_pos: Vec2,
    pub world_vel: Vec2,
    pub radius: f32,
    pub threat: f32,
    pub feint: Feint,
    /// Side of the lateral flee component (+1 / -1)
    pub lateral_sign: f32,
}

impl Mover {
    pub fn is_alive(&self) -> bool {
        !self.combat.dead
    }

    /// Sum of role and episode distance bias
    pub fn distance_bias(&self) -> f32 {
        self.role.profile().distance_bias + self.episode.profile().distance_bias
    }

    pub fn view(&self, now: f64, max_hits: u32) -> MoverView {
        MoverView {
            slot: self.slot,
            world_pos: self.world_pos,
            world_vel: self.world_vel,
            radius: self.radius,
            hits: self.combat.hits,
            tint: tint(self.combat.hits, max_hits),
            just_hit: self.combat.just_hit(now),
            dead: self.combat.dead,
        }
    }
}

/// Read-only per-mover data for rendering and hit-testing collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoverView {
    pub slot: usize,
    pub world_pos: Vec2,
    pub world_vel: Vec2,
    pub radius: f32,
    pub hits: u32,
    pub tint: MoverTint,
    pub just_hit: bool,
    pub dead: bool,
}

/// Last frame context, reused by calls that arrive between frames
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameContext {
    pub now: f64,
    pub half: Option<Vec2>,
    pub transform: ScreenTransform,
    pub targets: Vec<TargetCircle>,
}

/// The mover engine
#[derive(Debug, Clone)]
pub struct MoverSystem {
    pub(crate) settings: MoverSettings,
    pub(crate) tuning: Tuning,
    pub(crate) movers: Vec<Mover>,
    pub(crate) heat: HeatMap,
    pub(crate) roles: CappedPool<Role>,
    pub(crate) episodes: CappedPool<Episode>,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<MoverEvent>,
    pub(crate) frame: FrameContext,
}

impl MoverSystem {
    pub fn new(settings: MoverSettings) -> Self {
        Self::with_tuning(settings, Tuning::default())
    }

    pub fn with_tuning(settings: MoverSettings, tuning: Tuning) -> Self {
        let settings = settings.clamped();
        Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            settings,
            tuning,
            movers: Vec::new(),
            heat: HeatMap::new(),
            roles: CappedPool::new(BEHAVIOR_CAP),
            episodes: CappedPool::new(BEHAVIOR_CAP),
            events: Vec::new(),
            frame: FrameContext::default(),
        }
    }

    pub fn settings(&self) -> &MoverSettings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Replace the settings; count changes apply on the next `ensure_count`.
    /// A different seed restarts the random stream.
    pub fn set_settings(&mut self, settings: MoverSettings) {
        let settings = settings.clamped();
        if settings.seed != self.settings.seed {
            log::debug!("Reseeding mover RNG with {}", settings.seed);
            self.rng = Pcg32::seed_from_u64(settings.seed);
        }
        self.settings = settings;
        let max_hits = self.settings.max_hits;
        for mover in &mut self.movers {
            mover.radius = self.settings.radius;
            mover.combat.hits = mover.combat.hits.min(max_hits);
        }
    }

    pub fn movers(&self) -> &[Mover] {
        &self.movers
    }

    pub fn mover(&self, slot: usize) -> Option<&Mover> {
        self.movers.get(slot)
    }

    pub fn heatmap(&self) -> &HeatMap {
        &self.heat
    }

    pub fn role_count(&self, role: Role) -> usize {
        self.roles.count(role)
    }

    pub fn episode_count(&self, episode: Episode) -> usize {
        self.episodes.count(episode)
    }

    /// Published per-mover state
    pub fn snapshot(&self) -> Vec<MoverView> {
        self.movers
            .iter()
            .map(|m| m.view(self.frame.now, self.settings.max_hits))
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<MoverEvent> {
        std::mem::take(&mut self.events)
    }

    /// True when movers exist and every one of them is dead
    pub fn all_dead(&self) -> bool {
        !self.movers.is_empty() && self.movers.iter().all(|m| m.combat.dead)
    }

    /// Construct a mover for a new slot
    pub(crate) fn spawn_mover(&mut self, slot: usize, half: Vec2, now: f64) -> Mover {
        let dna = Dna::spawn(&mut self.rng);
        let anchor = AnchorState::spawn(&mut self.rng, half, now);
        let micro = MicroState::spawn(&mut self.rng, &dna, now);
        let role = self.roles.assign(&mut self.rng);
        let episode = self.episodes.assign(&mut self.rng);
        let transform = self.frame.transform;
        Mover {
            slot,
            dna,
            screen_pos: anchor.pos,
            screen_vel: Vec2::ZERO,
            world_pos: transform.to_world(anchor.pos),
            world_vel: Vec2::ZERO,
            anchor,
            micro,
            combat: CombatState::default(),
            role,
            role_until: now + draw_lifetime(&mut self.rng, ROLE_LIFETIME_MS),
            episode,
            episode_until: now + draw_lifetime(&mut self.rng, EPISODE_LIFETIME_MS),
            radius: self.settings.radius,
            threat: 0.0,
            feint: Feint::None,
            lateral_sign: if self.rng.random_bool(0.5) { 1.0 } else { -1.0 },
        }
    }

    /// Reset a slot in place: hits, anchor, micro state, role and episode.
    /// `ResetKind` decides whether the DNA survives.
    pub(crate) fn reset_slot(&mut self, idx: usize, kind: ResetKind, half: Vec2, now: f64) {
        let Some(mover) = self.movers.get_mut(idx) else {
            return;
        };
        if !mover.combat.dead {
            self.roles.release(mover.role);
            self.episodes.release(mover.episode);
        }

        if kind == ResetKind::Fresh {
            mover.dna = Dna::spawn(&mut self.rng);
        }
        mover.anchor = AnchorState::spawn(&mut self.rng, half, now);
        mover.micro = MicroState::spawn(&mut self.rng, &mover.dna, now);
        mover.combat.reset();
        mover.role = self.roles.assign(&mut self.rng);
        mover.role_until = now + draw_lifetime(&mut self.rng, ROLE_LIFETIME_MS);
        mover.episode = self.episodes.assign(&mut self.rng);
        mover.episode_until = now + draw_lifetime(&mut self.rng, EPISODE_LIFETIME_MS);
        mover.screen_pos = mover.anchor.pos;
        mover.screen_vel = Vec2::ZERO;
        mover.world_pos = self.frame.transform.to_world(mover.screen_pos);
        mover.world_vel = Vec2::ZERO;
        mover.threat = 0.0;
        mover.feint = Feint::None;
        mover.lateral_sign = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };

        let others = self.live_anchors(idx);
        self.retarget(idx, half, now, &others);
    }

    /// Anchors of every other live mover as they are right now
    fn live_anchors(&self, except: usize) -> Vec<Vec2> {
        self.movers
            .iter()
            .enumerate()
            .filter(|(i, m)| *i != except && m.is_alive())
            .map(|(_, m)| m.anchor.pos)
            .collect()
    }

    /// Pick a new anchor target for one mover, spacing it from `others`
    pub(crate) fn retarget(&mut self, idx: usize, half: Vec2, now: f64, others: &[Vec2]) {
        let Some(mover) = self.movers.get_mut(idx) else {
            return;
        };
        let ctx = super::anchor::AnchorContext {
            now,
            half,
            radius: mover.radius,
            other_anchors: others,
            targets: &self.frame.targets,
            flee_enabled: self.settings.flee_enabled,
            distance_bias: mover.distance_bias(),
            macro_speed: mover.episode.profile().macro_speed,
        };
        mover
            .anchor
            .choose_new_target(&mut self.rng, &ctx, &mut self.heat, &self.tuning);
        if self.rng.random_bool(0.3) {
            mover.lateral_sign = -mover.lateral_sign;
        }
        log::debug!(
            "Mover {} retargeted to ({:.0}, {:.0}) over {:.0} ms",
            mover.slot,
            mover.anchor.target.x,
            mover.anchor.target.y,
            mover.anchor.move_duration
        );
    }
}
