//! Deterministic mover simulation
//!
//! All motion logic lives here. This module must stay pure and deterministic:
//! - Caller-supplied clock and elapsed time only
//! - Seeded RNG only
//! - Stable iteration order (by slot)
//! - No rendering or platform dependencies

pub mod anchor;
pub mod avoidance;
pub mod behavior;
pub mod heatmap;
pub mod lifecycle;
pub mod pattern;
pub mod state;
pub mod threat;
pub mod tick;
pub mod transform;

pub use anchor::AnchorState;
pub use behavior::{CappedPool, Episode, Role};
pub use heatmap::{Cell, HeatMap};
pub use lifecycle::{CombatState, HitOutcome, MoverTint, escape_boost};
pub use pattern::{Feint, MicroState, PatternKind, Tier};
pub use state::{Dna, Mover, MoverEvent, MoverSystem, MoverView, ResetKind};
pub use tick::{Arena, FrameInput, TargetCircle};
pub use transform::ScreenTransform;
