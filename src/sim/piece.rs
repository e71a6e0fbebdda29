//! Puzzle piece entity and its drag transitions

use glam::Vec2;
use image::RgbaImage;

use super::drag::{DragPhase, PointerId};
use super::grid::{PieceDescriptor, PixelRect, SourceRect};
use crate::{clamp_to_surface, within_tolerance};

/// One rectangular fragment of the puzzle image
#[derive(Debug, Clone)]
pub struct Piece {
    /// Index in creation (row-major) order
    pub id: usize,
    pub col: u32,
    pub row: u32,
    /// On-screen footprint
    pub size: Vec2,
    pub source: SourceRect,
    pub pixels: PixelRect,
    /// Rendered fragment, `size` rounded to whole pixels
    pub surface: RgbaImage,
    /// Top-left on the play surface
    pub pos: Vec2,
    pub drag: DragPhase,
}

impl Piece {
    pub fn new(id: usize, desc: &PieceDescriptor, surface: RgbaImage, pos: Vec2) -> Self {
        Self {
            id,
            col: desc.col,
            row: desc.row,
            size: desc.size,
            source: desc.source,
            pixels: desc.pixels,
            surface,
            pos,
            drag: DragPhase::Idle,
        }
    }

    /// Correct top-left for this piece's grid cell
    #[inline]
    pub fn target(&self) -> Vec2 {
        Vec2::new(self.col as f32 * self.size.x, self.row as f32 * self.size.y)
    }

    /// Derived from position; never cached
    #[inline]
    pub fn is_snapped(&self, tolerance: f32) -> bool {
        within_tolerance(self.pos, self.target(), tolerance)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragPhase::Dragging { .. })
    }

    /// Whether a play-surface point lies on this piece
    pub fn contains(&self, point: Vec2) -> bool {
        let rel = point - self.pos;
        rel.x >= 0.0 && rel.y >= 0.0 && rel.x < self.size.x && rel.y < self.size.y
    }

    /// Idle -> Dragging. Returns false if the piece is not idle.
    pub fn grab(&mut self, pointer: PointerId, at: Vec2) -> bool {
        if self.drag != DragPhase::Idle {
            return false;
        }
        self.drag = DragPhase::Dragging {
            pointer,
            grab_offset: at - self.pos,
        };
        true
    }

    /// Follow the pointer, keeping the footprint inside `bounds`
    pub fn drag_to(&mut self, at: Vec2, bounds: Vec2) -> Option<Vec2> {
        let DragPhase::Dragging { grab_offset, .. } = self.drag else {
            return None;
        };
        self.pos = clamp_to_surface(at - grab_offset, self.size, bounds);
        Some(self.pos)
    }

    /// Dragging -> Settling. Returns false if the piece was not being dragged.
    pub fn release(&mut self) -> bool {
        if !self.is_dragging() {
            return false;
        }
        self.drag = DragPhase::Settling;
        true
    }

    /// Settling -> Idle
    pub fn settle(&mut self) {
        self.drag = DragPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::partition;

    fn piece(col: u32, row: u32, pos: Vec2) -> Piece {
        let descs = partition(4, Vec2::splat(600.0), Some((4, 4))).unwrap();
        let id = (row * 2 + col) as usize;
        Piece::new(id, &descs[id], RgbaImage::new(1, 1), pos)
    }

    #[test]
    fn test_target_and_snapped() {
        let p = piece(1, 0, Vec2::new(295.0, 9.0));
        assert_eq!(p.target(), Vec2::new(300.0, 0.0));
        assert!(p.is_snapped(10.0));
        assert!(!p.is_snapped(5.0));
    }

    #[test]
    fn test_grab_offset_is_kept() {
        let mut p = piece(0, 0, Vec2::new(100.0, 100.0));
        assert!(p.grab(PointerId::MOUSE, Vec2::new(150.0, 120.0)));
        let bounds = Vec2::splat(600.0);
        assert_eq!(p.drag_to(Vec2::new(250.0, 220.0), bounds), Some(Vec2::new(200.0, 200.0)));
        // Clamped to [0, 300] on both axes
        assert_eq!(p.drag_to(Vec2::new(750.0, 750.0), bounds), Some(Vec2::new(300.0, 300.0)));
        assert_eq!(p.drag_to(Vec2::new(-40.0, 0.0), bounds), Some(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_transitions_guarded() {
        let mut p = piece(0, 0, Vec2::ZERO);
        assert!(!p.release());
        assert_eq!(p.drag_to(Vec2::splat(50.0), Vec2::splat(600.0)), None);
        assert!(p.grab(PointerId(3), Vec2::splat(10.0)));
        assert!(!p.grab(PointerId(4), Vec2::splat(10.0)));
        assert!(p.release());
        assert_eq!(p.drag, DragPhase::Settling);
        p.settle();
        assert_eq!(p.drag, DragPhase::Idle);
    }

    #[test]
    fn test_contains() {
        let p = piece(0, 0, Vec2::new(10.0, 10.0));
        assert!(p.contains(Vec2::new(10.0, 10.0)));
        assert!(p.contains(Vec2::new(309.0, 309.0)));
        assert!(!p.contains(Vec2::new(310.0, 20.0)));
        assert!(!p.contains(Vec2::new(5.0, 20.0)));
    }
}
