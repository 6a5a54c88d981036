//! Hit / heal lifecycle
//!
//! Alive (0 hits) -> damaged (1..max-1) -> exhausted (max). Exhaustion either
//! respawns the mover in place or marks it dead until a bulk respawn.

use serde::{Deserialize, Serialize};

use crate::settings::MoverSettings;

/// Hit counters and timers of a mover
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatState {
    pub hits: u32,
    /// Timestamp of the last registered hit (ms)
    pub last_hit_at: Option<f64>,
    /// Speed-up fraction derived from `hits`
    pub escape_boost: f32,
    /// "Just hit" flash visible until this timestamp
    pub flash_until: f64,
    pub dead: bool,
}

/// Result of `register_hit`, for sound and score hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Dead mover or unknown slot
    Ignored,
    /// Still alive with this many hits
    Damaged { hits: u32 },
    /// Exhausted and regenerated in place
    Respawned,
    /// Exhausted and gone until `respawn_all`
    Died,
}

impl HitOutcome {
    /// Whether the hit finished the mover off (respawn or death)
    pub fn exhausted(self) -> bool {
        matches!(self, HitOutcome::Respawned | HitOutcome::Died)
    }
}

/// Color state for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoverTint {
    Fresh,
    Wounded,
    Critical,
}

/// Escape boost for a hit count: cumulative, not multiplicative
pub fn escape_boost(hits: u32, settings: &MoverSettings) -> f32 {
    match hits {
        0 => 0.0,
        1 => settings.hit1_boost,
        _ => settings.hit1_boost + settings.hit2_boost,
    }
}

pub fn tint(hits: u32, max_hits: u32) -> MoverTint {
    if hits == 0 {
        MoverTint::Fresh
    } else if hits + 1 >= max_hits {
        MoverTint::Critical
    } else {
        MoverTint::Wounded
    }
}

impl CombatState {
    /// Count a hit. Returns true when the mover reached `max_hits`.
    pub fn record_hit(&mut self, now: f64, flash_ms: f64, settings: &MoverSettings) -> bool {
        self.hits = (self.hits + 1).min(settings.max_hits);
        self.last_hit_at = Some(now);
        self.flash_until = now + flash_ms;
        self.escape_boost = escape_boost(self.hits, settings);
        self.hits >= settings.max_hits
    }

    /// Full heal after `heal_interval_ms` without hits. Returns true if it healed.
    pub fn try_heal(&mut self, now: f64, settings: &MoverSettings) -> bool {
        if self.dead || self.hits == 0 {
            return false;
        }
        match self.last_hit_at {
            Some(at) if now - at >= settings.heal_interval_ms => {
                self.hits = 0;
                self.escape_boost = 0.0;
                true
            }
            _ => false,
        }
    }

    pub fn just_hit(&self, now: f64) -> bool {
        now < self.flash_until
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boost_for_default_fractions() {
        let settings = MoverSettings::default();
        assert_eq!(escape_boost(0, &settings), 0.0);
        assert_eq!(escape_boost(1, &settings), 0.40);
        assert!((escape_boost(2, &settings) - 1.0).abs() < 1e-6);
        assert!((escape_boost(7, &settings) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_record_hit_reaches_max() {
        let settings = MoverSettings::default();
        let mut combat = CombatState::default();
        assert!(!combat.record_hit(0.0, 150.0, &settings));
        assert!(!combat.record_hit(100.0, 150.0, &settings));
        assert!(combat.record_hit(200.0, 150.0, &settings));
        assert_eq!(combat.hits, 3);
        assert!(combat.just_hit(300.0));
        assert!(!combat.just_hit(400.0));
    }

    #[test]
    fn test_heal_after_interval() {
        let settings = MoverSettings::default();
        let mut combat = CombatState::default();
        combat.record_hit(1000.0, 150.0, &settings);
        assert!(!combat.try_heal(4999.0, &settings));
        assert_eq!(combat.hits, 1);
        assert!(combat.try_heal(5000.0, &settings));
        assert_eq!(combat.hits, 0);
        assert_eq!(combat.escape_boost, 0.0);
    }

    #[test]
    fn test_dead_never_heals() {
        let settings = MoverSettings::default();
        let mut combat = CombatState::default();
        combat.record_hit(0.0, 150.0, &settings);
        combat.dead = true;
        assert!(!combat.try_heal(1e9, &settings));
    }

    #[test]
    fn test_tint_progression() {
        assert_eq!(tint(0, 3), MoverTint::Fresh);
        assert_eq!(tint(1, 3), MoverTint::Wounded);
        assert_eq!(tint(2, 3), MoverTint::Critical);
        assert_eq!(tint(1, 2), MoverTint::Critical);
    }

    proptest! {
        #[test]
        fn prop_boost_is_cumulative(h1 in 0.0f32..2.0, h2 in 0.0f32..2.0, hits in 0u32..10) {
            let settings = MoverSettings { hit1_boost: h1, hit2_boost: h2, ..Default::default() };
            let expected = match hits {
                0 => 0.0,
                1 => h1,
                _ => h1 + h2,
            };
            prop_assert_eq!(escape_boost(hits, &settings), expected);
        }
    }
}
