//! Reticle Arena - motion engine for mobile targets
//!
//! Core modules:
//! - `sim`: Deterministic mover simulation (anchors, micro-patterns, threat, avoidance, lifecycle)
//! - `settings`: Mover configuration, clamped at the boundary
//! - `tuning`: Data-driven steering and threat constants

pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::MoverSettings;
pub use sim::{FrameInput, MoverSystem};
pub use tuning::Tuning;

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Reference frame interval; `dt = 1.0` covers this many milliseconds
    pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Upper bound on configured movers
    pub const MAX_MOVERS: usize = 5;

    /// Heatmap grid over the arena
    pub const HEAT_COLS: usize = 16;
    pub const HEAT_ROWS: usize = 9;
    /// Per-frame geometric decay of every heat cell
    pub const HEAT_DECAY: f32 = 0.98;

    /// Anchors never get closer than this to the arena edge
    pub const ANCHOR_WALL_MARGIN: f32 = 40.0;
    /// Movers allowed per role or per episode at the same time
    pub const BEHAVIOR_CAP: usize = 2;

    /// Pattern/tier changes cross-fade over this window
    pub const BLEND_WINDOW_MS: f64 = 600.0;
    /// "Just hit" flash duration
    pub const HIT_FLASH_MS: f64 = 150.0;
}

/// Rotate a vector by an angle given as (cos, sin)
#[inline]
pub fn rotate(v: Vec2, cos: f32, sin: f32) -> Vec2 {
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Hermite smoothstep on [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Normalize, substituting the fallback for near-zero vectors
#[inline]
pub fn safe_normalize(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.length();
    if len > 1e-4 { v / len } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        let r = rotate(Vec2::X, 0.0, 1.0);
        assert!((r - Vec2::Y).length() < 1e-6);
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(2.0), 1.0);
    }

    #[test]
    fn test_safe_normalize_zero() {
        assert_eq!(safe_normalize(Vec2::ZERO, Vec2::Y), Vec2::Y);
        let n = safe_normalize(Vec2::new(3.0, 4.0), Vec2::Y);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}
