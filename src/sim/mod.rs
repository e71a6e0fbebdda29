//! Puzzle simulation module
//!
//! All gameplay logic lives here. No rendering backend or platform
//! dependencies: the host feeds pointer samples in play-surface coordinates
//! and reads back piece positions and events.

pub mod drag;
pub mod grid;
pub mod piece;
pub mod snap;
pub mod state;

pub use drag::{DragPhase, DragTracker, PointerId};
pub use grid::{PieceDescriptor, PixelRect, SourceRect, grid_dimension, partition};
pub use piece::Piece;
pub use snap::{CompletionTracker, SnapOutcome, is_complete, snap_piece};
pub use state::{PuzzleEvent, PuzzleSession};
