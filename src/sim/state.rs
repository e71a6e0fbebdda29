//! Puzzle session state
//!
//! The session owns every piece, the shared drag tracker and the completion
//! tracker. All methods run to completion synchronously; the host feeds it
//! pointer events and drains `PuzzleEvent`s to update the presentation.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::drag::{DragPhase, DragTracker, PointerId};
use super::grid::partition;
use super::piece::Piece;
use super::snap::{CompletionTracker, SnapOutcome, snap_piece};
use crate::consts::DRAG_Z_INDEX;
use crate::error::PuzzleResult;
use crate::renderer::{ImageAsset, render_piece};
use crate::settings::PuzzleConfig;

/// Notifications for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PuzzleEvent {
    /// Piece grabbed and raised above the others
    PieceLifted { piece: usize },
    /// Piece released and returned to normal stacking
    PieceDropped { piece: usize, pos: Vec2, snapped: bool },
    /// Every piece is on its target
    Completed,
}

/// One running puzzle
#[derive(Debug, Clone)]
pub struct PuzzleSession {
    /// Scatter seed
    pub seed: u64,
    grid: u32,
    surface: Vec2,
    tolerance: f32,
    /// Pieces in creation (row-major) order; index == id
    pieces: Vec<Piece>,
    /// Dragged pieces in the order they were lifted (last is topmost)
    raised: Vec<usize>,
    tracker: DragTracker,
    completion: CompletionTracker,
    events: Vec<PuzzleEvent>,
}

impl PuzzleSession {
    /// Validate the config, cut the image and scatter the pieces.
    ///
    /// Fails with `InvalidConfiguration` or `AssetNotReady`; no session
    /// exists in either case.
    pub fn new(config: &PuzzleConfig, image: &ImageAsset, seed: u64) -> PuzzleResult<Self> {
        let grid = config.validate()?;
        let surface = config.surface_size();
        let descriptors = partition(config.pieces, surface, image.dimensions())?;
        let pixels = image.pixels()?;

        let pieces = descriptors
            .iter()
            .enumerate()
            .map(|(id, desc)| {
                let fragment = render_piece(pixels, desc.pixels, desc.size);
                Piece::new(id, desc, fragment, Vec2::ZERO)
            })
            .collect();

        let mut session = Self {
            seed,
            grid,
            surface,
            tolerance: config.snap_tolerance,
            pieces,
            raised: Vec::new(),
            tracker: DragTracker::new(),
            completion: CompletionTracker::new(config.completion),
            events: Vec::new(),
        };
        session.scatter(seed);

        log::info!(
            "Puzzle session started: {}x{} grid, seed {}",
            grid,
            grid,
            seed
        );
        Ok(session)
    }

    /// Drop any drags and place every piece at a fresh random position
    /// with its whole footprint on the surface
    pub fn scatter(&mut self, seed: u64) {
        self.seed = seed;
        self.tracker.drain();
        self.raised.clear();
        self.completion.reset();
        self.events.clear();

        let mut rng = Pcg32::seed_from_u64(seed);
        for piece in &mut self.pieces {
            let max = (self.surface - piece.size).max(Vec2::ZERO);
            piece.pos = Vec2::new(rng.random::<f32>() * max.x, rng.random::<f32>() * max.y);
            piece.drag = DragPhase::Idle;
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: usize) -> Option<&Piece> {
        self.pieces.get(id)
    }

    /// Grid dimension N
    pub fn grid(&self) -> u32 {
        self.grid
    }

    pub fn surface(&self) -> Vec2 {
        self.surface
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Number of pieces currently held by a pointer
    pub fn active_drags(&self) -> usize {
        self.tracker.len()
    }

    /// Every piece is on target right now
    pub fn is_solved(&self) -> bool {
        super::snap::is_complete(&self.pieces, self.tolerance)
    }

    /// The completion signal has fired at least once
    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }

    /// Stacking level for a piece's drawable (0 = normal)
    pub fn z_index(&self, id: usize) -> u32 {
        if self.raised.contains(&id) { DRAG_Z_INDEX } else { 0 }
    }

    /// Topmost idle piece under `pos`
    pub fn piece_at(&self, pos: Vec2) -> Option<usize> {
        self.pieces
            .iter()
            .rev()
            .find(|p| !p.is_dragging() && p.contains(pos))
            .map(|p| p.id)
    }

    /// Pointer pressed at `pos`: grab the topmost piece under it
    pub fn pointer_down(&mut self, pointer: PointerId, pos: Vec2) -> Option<usize> {
        let id = self.piece_at(pos)?;
        self.begin_drag(id, pointer, pos).then_some(id)
    }

    /// Start dragging a specific piece (when the host already knows the target)
    pub fn begin_drag(&mut self, id: usize, pointer: PointerId, pos: Vec2) -> bool {
        if self.tracker.piece_for(pointer).is_some() {
            log::debug!("Pointer {:?} already holds a piece, ignoring grab of {}", pointer, id);
            return false;
        }
        let Some(piece) = self.pieces.get_mut(id) else {
            return false;
        };
        if !piece.grab(pointer, pos) {
            return false;
        }
        self.tracker.begin(pointer, id);
        self.raised.push(id);
        self.events.push(PuzzleEvent::PieceLifted { piece: id });
        log::debug!("Piece {} lifted by {:?}", id, pointer);
        true
    }

    /// Pointer moved to `pos`; returns the held piece and its clamped position
    pub fn pointer_move(&mut self, pointer: PointerId, pos: Vec2) -> Option<(usize, Vec2)> {
        let id = self.tracker.piece_for(pointer)?;
        let surface = self.surface;
        let new_pos = self.pieces.get_mut(id)?.drag_to(pos, surface)?;
        Some((id, new_pos))
    }

    /// Pointer released anywhere. `None` when the pointer held nothing
    /// (duplicate or stray release), which is ignored.
    pub fn pointer_up(&mut self, pointer: PointerId) -> Option<(usize, SnapOutcome)> {
        let Some(id) = self.tracker.end(pointer) else {
            log::debug!("Release from {:?} with no active drag, ignored", pointer);
            return None;
        };
        let outcome = self.settle(id)?;
        Some((id, outcome))
    }

    /// Force-end every drag in progress (window blur, hidden tab, touch cancel).
    ///
    /// Pieces go through the normal release path, so one left within
    /// tolerance still snaps. Returns how many drags were ended.
    pub fn release_all(&mut self) -> usize {
        let held = self.tracker.drain();
        for &(pointer, id) in &held {
            log::debug!("Force-releasing piece {} held by {:?}", id, pointer);
            self.settle(id);
        }
        held.len()
    }

    /// Queued events since the last drain
    pub fn drain_events(&mut self) -> Vec<PuzzleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Dragging -> Settling -> (snap check) -> Idle
    fn settle(&mut self, id: usize) -> Option<SnapOutcome> {
        let tolerance = self.tolerance;
        let piece = self.pieces.get_mut(id)?;
        if !piece.release() {
            return None;
        }
        self.raised.retain(|&r| r != id);

        let outcome = snap_piece(piece, tolerance);
        let pos = piece.pos;
        piece.settle();

        self.events.push(PuzzleEvent::PieceDropped {
            piece: id,
            pos,
            snapped: outcome.is_snapped(),
        });

        if outcome.is_snapped() {
            log::debug!("Piece {} snapped to {:?}", id, pos);
            if self.completion.on_snap(&self.pieces, tolerance) {
                log::info!("Puzzle solved ({} pieces)", self.pieces.len());
                self.events.push(PuzzleEvent::Completed);
            }
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::error::PuzzleError;

    fn session(pieces: u32) -> PuzzleSession {
        let config = PuzzleConfig::new("test.png", "reward.png", pieces);
        let image = ImageAsset::Ready(RgbaImage::new(60, 60));
        PuzzleSession::new(&config, &image, 42).unwrap()
    }

    /// Grab piece `id` at its top-left corner and drop it at `to`
    fn drag(session: &mut PuzzleSession, id: usize, to: Vec2) -> Option<(usize, SnapOutcome)> {
        let from = session.pieces()[id].pos;
        assert!(session.begin_drag(id, PointerId::MOUSE, from));
        session.pointer_move(PointerId::MOUSE, to);
        session.pointer_up(PointerId::MOUSE)
    }

    #[test]
    fn test_new_requires_loaded_image() {
        let config = PuzzleConfig::new("test.png", "", 4);
        assert!(matches!(
            PuzzleSession::new(&config, &ImageAsset::Pending, 1),
            Err(PuzzleError::AssetNotReady)
        ));
    }

    #[test]
    fn test_new_rejects_non_square() {
        let config = PuzzleConfig::new("test.png", "", 10);
        let image = ImageAsset::Ready(RgbaImage::new(60, 60));
        assert!(matches!(
            PuzzleSession::new(&config, &image, 1),
            Err(PuzzleError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_scatter_in_bounds_and_deterministic() {
        let a = session(9);
        let b = session(9);
        assert_eq!(a.pieces().len(), 9);
        for (pa, pb) in a.pieces().iter().zip(b.pieces()) {
            assert_eq!(pa.pos, pb.pos);
            assert!(pa.pos.x >= 0.0 && pa.pos.x <= 400.0);
            assert!(pa.pos.y >= 0.0 && pa.pos.y <= 400.0);
            assert_eq!(pa.surface.dimensions(), (200, 200));
        }
    }

    #[test]
    fn test_drop_near_target_snaps() {
        let mut s = session(4);
        let result = drag(&mut s, 0, Vec2::new(8.0, 7.0));
        assert_eq!(result, Some((0, SnapOutcome::Snapped)));
        assert_eq!(s.pieces()[0].pos, Vec2::ZERO);
        assert_eq!(s.pieces()[0].drag, DragPhase::Idle);
    }

    #[test]
    fn test_drop_far_from_target_stays() {
        let mut s = session(4);
        let result = drag(&mut s, 0, Vec2::new(50.0, 50.0));
        assert_eq!(result, Some((0, SnapOutcome::Missed)));
        assert_eq!(s.pieces()[0].pos, Vec2::new(50.0, 50.0));
        assert!(!s.drain_events().contains(&PuzzleEvent::Completed));
    }

    #[test]
    fn test_duplicate_release_ignored() {
        let mut s = session(4);
        drag(&mut s, 1, Vec2::new(100.0, 100.0));
        s.drain_events();
        assert_eq!(s.pointer_up(PointerId::MOUSE), None);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_raise_and_restore_stacking() {
        let mut s = session(4);
        let pos = s.pieces()[1].pos;
        assert!(s.begin_drag(1, PointerId::MOUSE, pos));
        assert_eq!(s.z_index(1), DRAG_Z_INDEX);
        assert_eq!(s.z_index(0), 0);
        assert_eq!(s.active_drags(), 1);

        s.pointer_up(PointerId::MOUSE);
        assert_eq!(s.z_index(1), 0);
        assert!((0..4).all(|id| s.z_index(id) == 0));
        assert_eq!(
            s.drain_events()[0],
            PuzzleEvent::PieceLifted { piece: 1 }
        );
    }

    #[test]
    fn test_multi_touch_independent() {
        let mut s = session(4);
        let (a, b) = (PointerId(0), PointerId(1));
        let pa = s.pieces()[0].pos;
        let pb = s.pieces()[3].pos;
        assert!(s.begin_drag(0, a, pa));
        assert!(s.begin_drag(3, b, pb));
        // A second pointer cannot steal a held piece
        assert!(!s.begin_drag(0, PointerId(2), pa));
        assert_eq!(s.active_drags(), 2);

        assert_eq!(s.pointer_move(a, pa + Vec2::new(10.0, 0.0)).map(|m| m.0), Some(0));
        assert_eq!(s.pieces()[3].pos, pb);

        s.pointer_up(a);
        assert!(s.pieces()[3].is_dragging());
        s.pointer_up(b);
        assert_eq!(s.active_drags(), 0);
    }

    #[test]
    fn test_pointer_down_hits_topmost() {
        let mut s = session(4);
        // Park 1 and 3 on the right, then stack 0 and 2 at the same spot
        drag(&mut s, 1, Vec2::new(300.0, 0.0));
        drag(&mut s, 3, Vec2::new(300.0, 300.0));
        for id in [0, 2] {
            drag(&mut s, id, Vec2::new(150.0, 150.0));
        }
        assert_eq!(s.piece_at(Vec2::new(160.0, 160.0)), Some(2));
        assert_eq!(s.pointer_down(PointerId::MOUSE, Vec2::new(160.0, 160.0)), Some(2));
        // Held piece is skipped by hit testing
        assert_eq!(s.piece_at(Vec2::new(160.0, 160.0)), Some(0));
    }

    #[test]
    fn test_release_all_settles_and_snaps() {
        let mut s = session(4);
        let pos = s.pieces()[3].pos;
        s.begin_drag(3, PointerId(5), pos);
        s.pointer_move(PointerId(5), Vec2::new(296.0, 295.0));
        // Grabbed at top-left, so top-left follows the pointer exactly
        assert_eq!(s.pieces()[3].pos, Vec2::new(296.0, 295.0));

        assert_eq!(s.release_all(), 1);
        assert_eq!(s.pieces()[3].pos, Vec2::new(300.0, 300.0));
        assert!(!s.pieces()[3].is_dragging());
        assert_eq!(s.release_all(), 0);
    }
}
