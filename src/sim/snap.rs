//! Snap and completion evaluation
//!
//! Both use the same per-axis tolerance test against a piece's derived
//! target, recomputed from current positions every time.

use serde::{Deserialize, Serialize};

use super::piece::Piece;
use crate::settings::CompletionPolicy;

/// Result of a snap check on a dropped piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapOutcome {
    /// Moved exactly onto its target
    Snapped,
    /// Left where it was dropped
    Missed,
}

impl SnapOutcome {
    pub fn is_snapped(self) -> bool {
        self == SnapOutcome::Snapped
    }
}

/// Hard-snap `piece` onto its target if it is within `tolerance` on both axes.
///
/// Idempotent: a piece already on target stays there and reports `Snapped`.
pub fn snap_piece(piece: &mut Piece, tolerance: f32) -> SnapOutcome {
    if piece.is_snapped(tolerance) {
        piece.pos = piece.target();
        SnapOutcome::Snapped
    } else {
        SnapOutcome::Missed
    }
}

/// Every piece is within tolerance of its target
pub fn is_complete(pieces: &[Piece], tolerance: f32) -> bool {
    pieces.iter().all(|p| p.is_snapped(tolerance))
}

/// Decides when a successful snap should raise the completion signal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionTracker {
    pub policy: CompletionPolicy,
    completed: bool,
}

impl CompletionTracker {
    pub fn new(policy: CompletionPolicy) -> Self {
        Self {
            policy,
            completed: false,
        }
    }

    /// Run after a successful snap. Returns true when the signal should fire.
    pub fn on_snap(&mut self, pieces: &[Piece], tolerance: f32) -> bool {
        if !is_complete(pieces, tolerance) {
            return false;
        }
        let first = !self.completed;
        self.completed = true;
        match self.policy {
            CompletionPolicy::Once => first,
            CompletionPolicy::EverySnap => true,
        }
    }

    /// Whether the solved state has been reached this session
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn reset(&mut self) {
        self.completed = false;
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use image::RgbaImage;

    use super::*;
    use crate::sim::grid::partition;

    fn pieces_at(positions: &[Vec2]) -> Vec<Piece> {
        let descs = partition(4, Vec2::splat(600.0), Some((8, 8))).unwrap();
        descs
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(id, (d, &pos))| Piece::new(id, d, RgbaImage::new(1, 1), pos))
            .collect()
    }

    fn solved() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(300.0, 0.0),
            Vec2::new(0.0, 300.0),
            Vec2::new(300.0, 300.0),
        ]
    }

    #[test]
    fn test_snap_within_tolerance() {
        let mut pieces = pieces_at(&[Vec2::new(8.0, 7.0)]);
        assert_eq!(snap_piece(&mut pieces[0], 10.0), SnapOutcome::Snapped);
        assert_eq!(pieces[0].pos, Vec2::ZERO);
    }

    #[test]
    fn test_miss_leaves_position() {
        let mut pieces = pieces_at(&[Vec2::new(50.0, 50.0)]);
        assert_eq!(snap_piece(&mut pieces[0], 10.0), SnapOutcome::Missed);
        assert_eq!(pieces[0].pos, Vec2::new(50.0, 50.0));

        // One axis in range is not enough
        pieces[0].pos = Vec2::new(3.0, 10.0);
        assert_eq!(snap_piece(&mut pieces[0], 10.0), SnapOutcome::Missed);
        assert_eq!(pieces[0].pos, Vec2::new(3.0, 10.0));
    }

    #[test]
    fn test_snap_idempotent() {
        let mut pieces = pieces_at(&[Vec2::new(-4.0, 9.5)]);
        assert!(snap_piece(&mut pieces[0], 10.0).is_snapped());
        let first = pieces[0].pos;
        assert!(snap_piece(&mut pieces[0], 10.0).is_snapped());
        assert_eq!(pieces[0].pos, first);
    }

    #[test]
    fn test_is_complete() {
        let mut positions = solved();
        assert!(is_complete(&pieces_at(&positions), 10.0));
        positions[3] = Vec2::new(309.0, 291.0);
        assert!(is_complete(&pieces_at(&positions), 10.0));
        positions[2] = Vec2::new(0.0, 200.0);
        assert!(!is_complete(&pieces_at(&positions), 10.0));
    }

    #[test]
    fn test_once_policy_signals_once() {
        let pieces = pieces_at(&solved());
        let mut tracker = CompletionTracker::new(CompletionPolicy::Once);
        assert!(tracker.on_snap(&pieces, 10.0));
        assert!(!tracker.on_snap(&pieces, 10.0));
        assert!(tracker.is_completed());
    }

    #[test]
    fn test_every_snap_policy_repeats() {
        let pieces = pieces_at(&solved());
        let mut tracker = CompletionTracker::new(CompletionPolicy::EverySnap);
        assert!(tracker.on_snap(&pieces, 10.0));
        assert!(tracker.on_snap(&pieces, 10.0));
    }

    #[test]
    fn test_incomplete_never_signals() {
        let mut positions = solved();
        positions[0] = Vec2::new(200.0, 200.0);
        let pieces = pieces_at(&positions);
        let mut tracker = CompletionTracker::default();
        assert!(!tracker.on_snap(&pieces, 10.0));
        assert!(!tracker.is_completed());
    }
}
