//! Threat modulation
//!
//! Proximity to the player raises a per-mover threat scalar in [0, 1] which
//! speeds up and agitates motion. All effects are eased; deadlines are only
//! ever pulled earlier.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::pattern::Feint;
use super::state::{Dna, MAX_DNA_GAIN};
use crate::tuning::Tuning;

/// Slow frequency-modulation rate (Hz)
const FM_RATE_HZ: f32 = 0.13;
const FM_DEPTH: f32 = 0.15;
/// Slow amplitude-modulation rate (Hz)
const AM_RATE_HZ: f32 = 0.09;
const AM_DEPTH: f32 = 0.2;

/// Threat from the player's proximity; the player sits at the screen origin
pub fn threat_alpha(screen_pos: Vec2, half: Vec2, flee_enabled: bool, tuning: &Tuning) -> f32 {
    if !flee_enabled {
        return 0.0;
    }
    let radius = (tuning.threat_radius_factor * half.min_element()).max(1.0);
    (1.0 - screen_pos.length() / radius).clamp(0.0, 1.0)
}

/// Oscillation frequency the mover eases toward (Hz)
pub fn target_frequency(dna: &Dna, time_secs: f32, fm_phase: f32, threat: f32, tuning: &Tuning) -> f32 {
    let fm = 1.0 + FM_DEPTH * (TAU * FM_RATE_HZ * time_secs + fm_phase).sin();
    dna.base_freq * fm * (1.0 + tuning.threat_freq_boost * threat)
}

/// Pattern gain after slow amplitude modulation and threat
pub fn effective_gain(base_gain: f32, time_secs: f32, am_phase: f32, threat: f32, tuning: &Tuning) -> f32 {
    let am = 1.0 + AM_DEPTH * (TAU * AM_RATE_HZ * time_secs + am_phase).sin();
    base_gain * am * (1.0 + tuning.threat_gain_boost * threat)
}

/// Upper bound of `effective_gain` for any DNA, phase and threat
pub fn gain_ceiling(tuning: &Tuning) -> f32 {
    MAX_DNA_GAIN * (1.0 + AM_DEPTH) * (1.0 + tuning.threat_gain_boost.max(0.0))
}

/// Shorten the time remaining until `deadline`; never extends it
pub fn hasten(deadline: f64, now: f64, threat: f32, dt: f32, tuning: &Tuning) -> f64 {
    if threat <= 0.0 || deadline <= now {
        return deadline;
    }
    let factor = (1.0 - tuning.threat_hasten_rate * threat * dt).clamp(0.0, 1.0) as f64;
    now + (deadline - now) * factor
}

/// Feint outcome chosen for this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeintTrigger {
    /// Expire the anchor transition now
    Reanchor,
    /// Set a transient micro-pattern effect
    Effect(Feint),
}

/// Roll for a feint. Only above the threshold and only when none is active.
pub fn roll_feint<R: Rng>(
    rng: &mut R,
    dna: &Dna,
    threat: f32,
    active: bool,
    now: f64,
    dt: f32,
    tuning: &Tuning,
) -> Option<FeintTrigger> {
    if active || threat < tuning.feint_threshold {
        return None;
    }
    let chance = (dna.feint_chance * threat * dt).clamp(0.0, 1.0) as f64;
    if !rng.random_bool(chance) {
        return None;
    }
    let trigger = match rng.random_range(0..3) {
        0 => FeintTrigger::Reanchor,
        1 => FeintTrigger::Effect(Feint::PhaseInvert {
            until: now + rng.random_range(350.0..600.0),
        }),
        _ => FeintTrigger::Effect(Feint::ZigZag {
            until: now + rng.random_range(400.0..700.0),
        }),
    };
    Some(trigger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const HALF: Vec2 = Vec2::new(640.0, 360.0);

    fn dna() -> Dna {
        Dna {
            base_freq: 0.35,
            gain_min: 0.8,
            gain_max: 1.0,
            feint_chance: 0.03,
        }
    }

    #[test]
    fn test_threat_zero_when_flee_disabled() {
        let tuning = Tuning::default();
        assert_eq!(threat_alpha(Vec2::ZERO, HALF, false, &tuning), 0.0);
        assert_eq!(threat_alpha(Vec2::ZERO, HALF, true, &tuning), 1.0);
    }

    #[test]
    fn test_threat_falls_off_with_distance() {
        let tuning = Tuning::default();
        // Radius = 0.75 * 360 = 270
        let mid = threat_alpha(Vec2::new(135.0, 0.0), HALF, true, &tuning);
        assert!((mid - 0.5).abs() < 1e-5);
        assert_eq!(threat_alpha(Vec2::new(400.0, 0.0), HALF, true, &tuning), 0.0);
    }

    #[test]
    fn test_threat_raises_frequency_and_gain() {
        let tuning = Tuning::default();
        let d = dna();
        let calm = target_frequency(&d, 2.0, 0.3, 0.0, &tuning);
        let scared = target_frequency(&d, 2.0, 0.3, 1.0, &tuning);
        assert!((scared / calm - 1.8).abs() < 1e-4);
        let g0 = effective_gain(1.0, 2.0, 0.1, 0.0, &tuning);
        let g1 = effective_gain(1.0, 2.0, 0.1, 1.0, &tuning);
        assert!((g1 / g0 - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_hasten_never_extends() {
        let tuning = Tuning::default();
        assert_eq!(hasten(2000.0, 1000.0, 0.0, 1.0, &tuning), 2000.0);
        let sooner = hasten(2000.0, 1000.0, 1.0, 1.0, &tuning);
        assert!(sooner < 2000.0 && sooner > 1000.0);
        // Past deadlines stay put
        assert_eq!(hasten(500.0, 1000.0, 1.0, 1.0, &tuning), 500.0);
    }

    #[test]
    fn test_no_feint_below_threshold_or_while_active() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let d = Dna { feint_chance: 1.0, ..dna() };
        for _ in 0..100 {
            assert!(roll_feint(&mut rng, &d, 0.3, false, 0.0, 1.0, &tuning).is_none());
            assert!(roll_feint(&mut rng, &d, 1.0, true, 0.0, 1.0, &tuning).is_none());
        }
    }

    #[test]
    fn test_feint_effects_expire_shortly() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let d = Dna { feint_chance: 1.0, ..dna() };
        let mut seen = 0;
        for _ in 0..100 {
            if let Some(FeintTrigger::Effect(feint)) = roll_feint(&mut rng, &d, 1.0, false, 1000.0, 1.0, &tuning) {
                assert!(feint.is_active(1000.0));
                assert!(!feint.is_active(1700.0));
                seen += 1;
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn test_gain_ceiling_bounds_effective_gain() {
        let tuning = Tuning::default();
        let ceiling = gain_ceiling(&tuning);
        for step in 0..500 {
            let t = step as f32 * 0.05;
            let gain = effective_gain(MAX_DNA_GAIN, t, 0.7, 1.0, &tuning);
            assert!(gain <= ceiling + 1e-5);
        }
        assert!(effective_gain(0.9, 2.0, 0.7, 1.0, &tuning) > effective_gain(0.9, 2.0, 0.7, 0.0, &tuning));
    }
}
