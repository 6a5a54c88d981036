//! Mover settings
//!
//! Values arrive from the configuration UI and are clamped here, once,
//! before they reach the simulation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_MOVERS;

/// Configuration of the mobile-target set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoverSettings {
    /// Number of movers (0 - 5)
    pub count: usize,
    /// Master switch; disabled means zero movers
    pub enabled: bool,
    /// Mover radius in pixels
    pub radius: f32,
    /// Base speed (pixels per reference frame)
    pub base_speed: f32,
    /// Global avoidance coefficient
    pub avoidance: f32,
    /// Movers flee from the player and react to proximity
    pub flee_enabled: bool,
    /// Escape boost fraction after the first hit
    pub hit1_boost: f32,
    /// Additional escape boost fraction from the second hit on
    pub hit2_boost: f32,
    /// Hits until a mover is exhausted
    pub max_hits: u32,
    /// Time without hits before a full heal (ms)
    pub heal_interval_ms: f64,
    /// Exhausted movers respawn immediately instead of dying
    pub regen_on_hit: bool,
    /// Seed for the simulation RNG
    pub seed: u64,
}

impl Default for MoverSettings {
    fn default() -> Self {
        Self {
            count: 3,
            enabled: true,
            radius: 22.0,
            base_speed: 2.0,
            avoidance: 1.0,
            flee_enabled: true,
            hit1_boost: 0.40,
            hit2_boost: 0.60,
            max_hits: 3,
            heal_interval_ms: 4000.0,
            regen_on_hit: true,
            seed: 0x5EED_A7E4,
        }
    }
}

impl MoverSettings {
    /// Clamp every value into the range the simulation assumes
    pub fn clamped(&self) -> Self {
        Self {
            count: self.count.min(MAX_MOVERS),
            enabled: self.enabled,
            radius: finite_or(self.radius, 22.0).clamp(6.0, 60.0),
            base_speed: finite_or(self.base_speed, 2.0).clamp(0.25, 12.0),
            avoidance: finite_or(self.avoidance, 1.0).clamp(0.0, 3.0),
            flee_enabled: self.flee_enabled,
            hit1_boost: finite_or(self.hit1_boost, 0.0).clamp(0.0, 2.0),
            hit2_boost: finite_or(self.hit2_boost, 0.0).clamp(0.0, 2.0),
            max_hits: self.max_hits.clamp(1, 10),
            heal_interval_ms: if self.heal_interval_ms.is_finite() {
                self.heal_interval_ms.max(250.0)
            } else {
                4000.0
            },
            regen_on_hit: self.regen_on_hit,
            seed: self.seed,
        }
    }

    /// Number of movers the collection should hold right now
    pub fn effective_count(&self) -> usize {
        if self.enabled { self.count.min(MAX_MOVERS) } else { 0 }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Self>(json).map(|s| s.clamped())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded mover settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Invalid settings in {}: {err}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Cannot read {}: {err}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
