//! Drag tracking
//!
//! One tracker per session maps each active pointer to the piece it holds.
//! Move and release events are routed through it, so a release anywhere in
//! the document ends the drag, and teardown only has to drain one map.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identity of one pointer (the mouse, or a single touch point)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub i32);

impl PointerId {
    /// The mouse never shares ids with touch points
    pub const MOUSE: PointerId = PointerId(-1);
}

/// Per-piece drag state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Held by `pointer`; `grab_offset` is pointer minus piece top-left at grab time
    Dragging { pointer: PointerId, grab_offset: Vec2 },
    /// Released, snap check in progress
    Settling,
}

/// Active pointer -> piece id
#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    active: HashMap<PointerId, usize>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking. Fails if the pointer is already holding a piece.
    pub fn begin(&mut self, pointer: PointerId, piece: usize) -> bool {
        if self.active.contains_key(&pointer) {
            return false;
        }
        self.active.insert(pointer, piece);
        true
    }

    /// Piece currently held by `pointer`
    pub fn piece_for(&self, pointer: PointerId) -> Option<usize> {
        self.active.get(&pointer).copied()
    }

    /// Stop tracking `pointer`, returning the piece it held
    pub fn end(&mut self, pointer: PointerId) -> Option<usize> {
        self.active.remove(&pointer)
    }

    /// Stop tracking everything. Sorted by piece id for stable settle order.
    pub fn drain(&mut self) -> Vec<(PointerId, usize)> {
        let mut held: Vec<_> = self.active.drain().collect();
        held.sort_by_key(|&(_, piece)| piece);
        held
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
