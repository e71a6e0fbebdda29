//! Piece rendering
//!
//! CPU-side rasterization of image fragments. The host blits the resulting
//! RGBA buffers onto its own drawable surfaces.

pub mod asset;
pub mod fragment;

pub use asset::ImageAsset;
pub use fragment::render_piece;
