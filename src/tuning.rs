//! Data-driven motion tuning
//!
//! Empirically tuned weights for steering, avoidance and threat response.
//! Defaults reproduce the shipped feel; every value can be overridden from JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Steering ===
    /// Fraction of the distance to the goal converted into desired velocity
    pub steering_gain: f32,
    /// Desired speed cap, as a multiple of base speed
    pub speed_cap_factor: f32,
    /// Velocity retained when the combined steering vector vanishes
    pub velocity_retention: f32,
    /// Scale applied to every avoidance force
    pub force_gain: f32,

    // === Avoidance ===
    pub target_weight: f32,
    pub mover_weight: f32,
    pub predictive_weight: f32,
    pub target_padding: f32,
    pub mover_padding: f32,
    pub predictive_padding: f32,
    /// Time-to-collision look-ahead (seconds)
    pub lookahead_secs: f32,

    // === Flee ===
    /// (radial, lateral) weights while the player moves
    pub flee_moving_weights: (f32, f32),
    /// (radial, lateral) weights when only the escape boost drives the flee
    pub flee_boost_weights: (f32, f32),
    /// Stand-in player speed for boosted flee with a stationary player
    pub flee_reference_speed: f32,
    pub flee_gain: f32,
    /// Player speed below which the player counts as stationary
    pub player_moving_threshold: f32,

    // === Threat ===
    /// Threat radius as a fraction of the smaller half-dimension
    pub threat_radius_factor: f32,
    pub threat_freq_boost: f32,
    pub threat_gain_boost: f32,
    /// Per-frame ease rate of the oscillation frequency
    pub freq_ease_rate: f32,
    /// Per-frame shortening of remaining schedules at full threat
    pub threat_hasten_rate: f32,
    pub feint_threshold: f32,

    // === Anchor scoring ===
    pub candidate_samples: usize,
    pub heat_penalty: f32,
    pub spacing_weight: f32,
    pub invasion_penalty: f32,
    pub flee_center_bonus: f32,
    pub heat_increment: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            steering_gain: 0.06,
            speed_cap_factor: 8.0,
            velocity_retention: 0.7,
            force_gain: 0.05,

            target_weight: 1.2,
            mover_weight: 0.8,
            predictive_weight: 1.0,
            target_padding: 70.0,
            mover_padding: 55.0,
            predictive_padding: 50.0,
            lookahead_secs: 0.5,

            flee_moving_weights: (0.6, 0.4),
            flee_boost_weights: (0.8, 0.2),
            flee_reference_speed: 4.0,
            flee_gain: 0.35,
            player_moving_threshold: 0.1,

            threat_radius_factor: 0.75,
            threat_freq_boost: 0.8,
            threat_gain_boost: 0.5,
            freq_ease_rate: 0.1,
            threat_hasten_rate: 0.015,
            feint_threshold: 0.45,

            candidate_samples: 25,
            heat_penalty: 0.5,
            spacing_weight: 0.8,
            invasion_penalty: 2.0,
            flee_center_bonus: 0.4,
            heat_increment: 1.0,
        }
    }
}

impl Tuning {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
