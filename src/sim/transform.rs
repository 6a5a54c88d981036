//! World <-> screen conversion
//!
//! Screen space is centered on the player and rotated with the view, so the
//! player always sits at the screen origin.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::rotate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenTransform {
    /// Player position in world space
    pub player: Vec2,
    /// View rotation as (cos, sin)
    pub cos: f32,
    pub sin: f32,
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 1.0, 0.0)
    }
}

impl ScreenTransform {
    pub fn new(player: Vec2, cos: f32, sin: f32) -> Self {
        Self { player, cos, sin }
    }

    pub fn from_angle(player: Vec2, angle: f32) -> Self {
        Self::new(player, angle.cos(), angle.sin())
    }

    /// World position -> screen position
    #[inline]
    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        // Inverse rotation: transpose of (cos, sin)
        rotate(world - self.player, self.cos, -self.sin)
    }

    /// Screen position -> world position
    #[inline]
    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        self.player + rotate(screen, self.cos, self.sin)
    }

    /// Rotate a screen-space direction into world space (no translation)
    #[inline]
    pub fn dir_to_world(&self, screen_dir: Vec2) -> Vec2 {
        rotate(screen_dir, self.cos, self.sin)
    }
}
