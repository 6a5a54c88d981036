//! Roles and episodes
//!
//! Two independent behavioral layers. A role is long-lived, an episode short
//! and layered on top. Each biases anchor distance, pattern choice and tier
//! choice. Both are drawn from capacity-bounded pools so no single behavior
//! dominates the arena.

use std::marker::PhantomData;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pattern::{PatternKind, Tier};

/// Role lifetime range (ms)
pub const ROLE_LIFETIME_MS: (f64, f64) = (8000.0, 16000.0);
/// Episode lifetime range (ms)
pub const EPISODE_LIFETIME_MS: (f64, f64) = (2000.0, 6000.0);

/// Bias shared by roles and episodes
#[derive(Debug, Clone, Copy)]
pub struct BehaviorProfile {
    /// Positive prefers anchors far from center, negative near it
    pub distance_bias: f32,
    /// Pattern weights; unlisted patterns weigh 1
    pub pattern_weights: &'static [(PatternKind, f32)],
    /// Weights for Small, Medium, Large
    pub tier_weights: [f32; 3],
    /// Macro (anchor) speed multiplier; roles use 1
    pub macro_speed: f32,
}

impl BehaviorProfile {
    pub fn pattern_weight(&self, kind: PatternKind) -> f32 {
        self.pattern_weights
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, w)| *w)
            .unwrap_or(1.0)
    }

    pub fn tier_weight(&self, tier: Tier) -> f32 {
        self.tier_weights[tier.index()]
    }
}

/// A closed set of categories managed by a `CappedPool`
pub trait Category: Copy + Eq + std::fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn profile(self) -> BehaviorProfile;
}

/// Long-lived behavioral role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Hugs the edges and swerves
    Skirmisher,
    /// Circles mid-field in rosettes and spirals
    Orbiter,
    /// Small figure-eights far out
    Lurker,
    /// Large sweeping shapes near the center
    Drifter,
}

impl Category for Role {
    const ALL: &'static [Self] = &[Role::Skirmisher, Role::Orbiter, Role::Lurker, Role::Drifter];

    fn index(self) -> usize {
        self as usize
    }

    fn profile(self) -> BehaviorProfile {
        use PatternKind::*;
        match self {
            Role::Skirmisher => BehaviorProfile {
                distance_bias: 0.3,
                pattern_weights: &[(SwerveStop, 2.0), (Figure8Wide, 1.5)],
                tier_weights: [0.6, 1.0, 1.4],
                macro_speed: 1.0,
            },
            Role::Orbiter => BehaviorProfile {
                distance_bias: 0.0,
                pattern_weights: &[(Rosette, 2.0), (Spiral, 1.5)],
                tier_weights: [0.8, 1.4, 0.8],
                macro_speed: 1.0,
            },
            Role::Lurker => BehaviorProfile {
                distance_bias: 0.5,
                pattern_weights: &[(Figure8, 2.0), (Figure8Spiral, 1.3), (SpiralBurst, 0.5)],
                tier_weights: [1.5, 1.0, 0.5],
                macro_speed: 1.0,
            },
            Role::Drifter => BehaviorProfile {
                distance_bias: -0.2,
                pattern_weights: &[(SpiralBurst, 1.6), (Figure8Wide, 1.4), (SwerveStop, 0.6)],
                tier_weights: [0.5, 1.0, 1.6],
                macro_speed: 1.0,
            },
        }
    }
}

/// Short-lived behavioral episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Episode {
    Cruise,
    Dash,
    Coil,
    Loiter,
}

impl Category for Episode {
    const ALL: &'static [Self] = &[Episode::Cruise, Episode::Dash, Episode::Coil, Episode::Loiter];

    fn index(self) -> usize {
        self as usize
    }

    fn profile(self) -> BehaviorProfile {
        use PatternKind::*;
        match self {
            Episode::Cruise => BehaviorProfile {
                distance_bias: 0.0,
                pattern_weights: &[],
                tier_weights: [1.0, 1.0, 1.0],
                macro_speed: 1.0,
            },
            Episode::Dash => BehaviorProfile {
                distance_bias: 0.2,
                pattern_weights: &[(SwerveStop, 1.8), (Figure8, 1.2)],
                tier_weights: [1.4, 1.0, 0.6],
                macro_speed: 1.6,
            },
            Episode::Coil => BehaviorProfile {
                distance_bias: -0.1,
                pattern_weights: &[(Spiral, 1.6), (SpiralBurst, 1.6)],
                tier_weights: [0.7, 1.3, 1.1],
                macro_speed: 0.8,
            },
            Episode::Loiter => BehaviorProfile {
                distance_bias: 0.1,
                pattern_weights: &[(Figure8, 1.6), (Rosette, 1.3)],
                tier_weights: [0.6, 1.0, 1.5],
                macro_speed: 0.6,
            },
        }
    }
}

/// Live population counts per category with a per-category cap
#[derive(Debug, Clone)]
pub struct CappedPool<K: Category> {
    counts: Vec<usize>,
    cap: usize,
    _kind: PhantomData<K>,
}

impl<K: Category> CappedPool<K> {
    pub fn new(cap: usize) -> Self {
        Self {
            counts: vec![0; K::ALL.len()],
            cap,
            _kind: PhantomData,
        }
    }

    /// Draw uniformly among categories under the cap; when all are full,
    /// take the least-populated one.
    pub fn assign<R: Rng>(&mut self, rng: &mut R) -> K {
        let open: Vec<K> = K::ALL
            .iter()
            .copied()
            .filter(|k| self.counts[k.index()] < self.cap)
            .collect();

        let chosen = if open.is_empty() {
            K::ALL
                .iter()
                .copied()
                .min_by_key(|k| self.counts[k.index()])
                .unwrap_or(K::ALL[0])
        } else {
            open[rng.random_range(0..open.len())]
        };

        self.counts[chosen.index()] += 1;
        chosen
    }

    pub fn release(&mut self, kind: K) {
        let count = &mut self.counts[kind.index()];
        *count = count.saturating_sub(1);
    }

    pub fn count(&self, kind: K) -> usize {
        self.counts[kind.index()]
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Lifetime draw for a new role or episode
pub fn draw_lifetime<R: Rng>(rng: &mut R, range: (f64, f64)) -> f64 {
    rng.random_range(range.0..range.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_pool_respects_cap() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut pool = CappedPool::<Role>::new(2);
        for _ in 0..Role::ALL.len() * 2 {
            pool.assign(&mut rng);
            assert!(pool.max_count() <= 2);
        }
        for role in Role::ALL {
            assert_eq!(pool.count(*role), 2);
        }
    }

    #[test]
    fn test_pool_overflow_picks_minimum() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = CappedPool::<Episode>::new(2);
        for _ in 0..Episode::ALL.len() * 2 {
            pool.assign(&mut rng);
        }
        pool.release(Episode::Coil);
        pool.release(Episode::Coil);
        // Everything else is at cap, Coil has room
        assert_eq!(pool.assign(&mut rng), Episode::Coil);
        assert_eq!(pool.assign(&mut rng), Episode::Coil);
        // All full now; the fallback picks a global minimum, so counts stay balanced
        pool.assign(&mut rng);
        assert_eq!(pool.max_count(), 3);
    }

    #[test]
    fn test_release_saturates() {
        let mut pool = CappedPool::<Role>::new(2);
        pool.release(Role::Lurker);
        assert_eq!(pool.count(Role::Lurker), 0);
    }

    #[test]
    fn test_unlisted_pattern_weight_defaults_to_one() {
        let profile = Episode::Cruise.profile();
        assert_eq!(profile.pattern_weight(PatternKind::Rosette), 1.0);
        assert_eq!(Role::Orbiter.profile().pattern_weight(PatternKind::Rosette), 2.0);
    }

    #[test]
    fn test_episodes_differ_in_speed() {
        assert!(Episode::Dash.profile().macro_speed > Episode::Loiter.profile().macro_speed);
    }
}
