//! Grid partitioning
//!
//! Splits the source image and the play surface into the same N x N grid.
//! Source rectangles are in image pixels (fractional), destination sizes are
//! in play-surface units.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_PIECES;
use crate::error::{PuzzleError, PuzzleResult};

/// Sub-rectangle of the source image, in (possibly fractional) pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Whole-pixel sub-rectangle of the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Start and length of cell `index` when `len` pixels are split `n` ways.
///
/// Edges are `floor(i * len / n)` in integer math, so neighbouring cells
/// share edges exactly and the cells tile `len` with no gaps or overlap.
#[inline]
fn pixel_span(index: u32, n: u32, len: u32) -> (u32, u32) {
    let edge = |i: u32| (i as u64 * len as u64 / n as u64) as u32;
    let start = edge(index);
    (start, edge(index + 1) - start)
}

/// Geometry for one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PieceDescriptor {
    pub col: u32,
    pub row: u32,
    /// On-screen footprint (surface / N)
    pub size: Vec2,
    pub source: SourceRect,
    /// `source` snapped to whole pixels for cropping
    pub pixels: PixelRect,
}

impl PieceDescriptor {
    /// Correct top-left of this piece on the play surface
    #[inline]
    pub fn target(&self) -> Vec2 {
        Vec2::new(self.col as f32 * self.size.x, self.row as f32 * self.size.y)
    }
}

/// Grid dimension N for a piece count, or `InvalidConfiguration` when the
/// count is zero, above `MAX_PIECES`, or not a perfect square
pub fn grid_dimension(pieces: u32) -> PuzzleResult<u32> {
    if pieces == 0 {
        return Err(PuzzleError::config("piece count must be positive"));
    }
    if pieces > MAX_PIECES {
        return Err(PuzzleError::config(format!(
            "piece count {pieces} exceeds the maximum of {MAX_PIECES}"
        )));
    }
    let n = (pieces as f64).sqrt().round() as u32;
    if n.checked_mul(n) != Some(pieces) {
        return Err(PuzzleError::config(format!(
            "piece count {pieces} is not a perfect square"
        )));
    }
    Ok(n)
}

/// Compute every cell's descriptor in row-major order.
///
/// `image_size` is `None` until the image has loaded.
pub fn partition(
    pieces: u32,
    surface: Vec2,
    image_size: Option<(u32, u32)>,
) -> PuzzleResult<Vec<PieceDescriptor>> {
    let n = grid_dimension(pieces)?;
    let (w_px, h_px) = match image_size {
        Some((w, h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(PuzzleError::AssetNotReady),
    };
    let (img_w, img_h) = (w_px as f32, h_px as f32);

    let nf = n as f32;
    let size = surface / nf;
    let cell_w = img_w / nf;
    let cell_h = img_h / nf;

    let mut descriptors = Vec::with_capacity(pieces as usize);
    for row in 0..n {
        for col in 0..n {
            let (px, pw) = pixel_span(col, n, w_px);
            let (py, ph) = pixel_span(row, n, h_px);
            descriptors.push(PieceDescriptor {
                col,
                row,
                size,
                source: SourceRect {
                    x: col as f32 * img_w / nf,
                    y: row as f32 * img_h / nf,
                    w: cell_w,
                    h: cell_h,
                },
                pixels: PixelRect { x: px, y: py, w: pw, h: ph },
            });
        }
    }

    log::debug!(
        "Partitioned {}x{} image into {}x{} grid, piece size {}x{}",
        img_w,
        img_h,
        n,
        n,
        size.x,
        size.y
    );
    Ok(descriptors)
}
