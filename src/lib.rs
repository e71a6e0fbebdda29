//! Slide Jigsaw - A drag-and-snap image puzzle overlay
//!
//! Core modules:
//! - `sim`: Puzzle state machine (grid, pieces, drag tracking, snapping, completion)
//! - `renderer`: Rasterizes image fragments for each piece
//! - `platform`: Mouse/touch normalization into play-surface pointer samples
//! - `settings`: Puzzle configuration surface and validation

pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{PuzzleError, PuzzleResult};
pub use settings::{CompletionPolicy, PuzzleConfig};

use glam::Vec2;

/// Puzzle configuration constants
pub mod consts {
    /// Default number of pieces (2x2 grid)
    pub const DEFAULT_PIECES: u32 = 4;

    /// Largest accepted piece count (100x100 grid). Every piece owns a
    /// rendered fragment and a canvas, so the count is bounded up front.
    pub const MAX_PIECES: u32 = 10_000;

    /// Play surface dimensions
    pub const SURFACE_WIDTH: f32 = 600.0;
    pub const SURFACE_HEIGHT: f32 = 600.0;

    /// Max per-axis distance from target that still snaps (exclusive)
    pub const SNAP_TOLERANCE: f32 = 10.0;

    /// How long the reward image stays on screen after completion
    pub const REWARD_DISPLAY_MS: u32 = 5000;

    /// Stacking order for a piece while it is being dragged
    pub const DRAG_Z_INDEX: u32 = 1000;
}

/// Clamp a piece's top-left so its `size` footprint stays inside `bounds`.
///
/// Saturates on both axes; a piece larger than the bounds pins to the origin.
#[inline]
pub fn clamp_to_surface(pos: Vec2, size: Vec2, bounds: Vec2) -> Vec2 {
    let max = (bounds - size).max(Vec2::ZERO);
    pos.clamp(Vec2::ZERO, max)
}

/// True when `a` and `b` differ by less than `tolerance` on both axes
#[inline]
pub fn within_tolerance(a: Vec2, b: Vec2, tolerance: f32) -> bool {
    let d = (a - b).abs();
    d.x < tolerance && d.y < tolerance
}
