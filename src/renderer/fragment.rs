//! Fragment rasterization: crop a source sub-rectangle and resample it to the
//! piece's on-screen footprint.

use glam::Vec2;
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::sim::grid::PixelRect;

/// Whole-pixel surface size for a footprint (at least 1x1)
#[inline]
pub fn surface_dimensions(size: Vec2) -> (u32, u32) {
    let w = size.x.round().max(1.0) as u32;
    let h = size.y.round().max(1.0) as u32;
    (w, h)
}

/// Render one piece: the `source` region of `image`, scaled to `size`.
///
/// Uses bilinear filtering. Degenerate source rects (images smaller than the
/// grid) are widened to one pixel inside the image bounds.
pub fn render_piece(image: &RgbaImage, source: PixelRect, size: Vec2) -> RgbaImage {
    let (img_w, img_h) = image.dimensions();
    let x = source.x.min(img_w.saturating_sub(1));
    let y = source.y.min(img_h.saturating_sub(1));
    let w = source.w.max(1).min(img_w - x);
    let h = source.h.max(1).min(img_h - y);

    let crop = imageops::crop_imm(image, x, y, w, h).to_image();
    let (dest_w, dest_h) = surface_dimensions(size);
    if (w, h) == (dest_w, dest_h) {
        return crop;
    }
    imageops::resize(&crop, dest_w, dest_h, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 4x4 image with a distinct solid colour per 2x2 quadrant
    fn quadrant_image() -> RgbaImage {
        RgbaImage::from_fn(4, 4, |x, y| match (x / 2, y / 2) {
            (0, 0) => Rgba([255, 0, 0, 255]),
            (1, 0) => Rgba([0, 255, 0, 255]),
            (0, 1) => Rgba([0, 0, 255, 255]),
            _ => Rgba([255, 255, 255, 255]),
        })
    }

    #[test]
    fn test_render_matches_footprint() {
        let img = quadrant_image();
        let rect = PixelRect { x: 2, y: 0, w: 2, h: 2 };
        let out = render_piece(&img, rect, Vec2::new(300.0, 150.0));
        assert_eq!(out.dimensions(), (300, 150));
        // Solid source region stays solid after resampling
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 255, 0, 255]));
        assert_eq!(*out.get_pixel(299, 149), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_render_same_size_is_exact_crop() {
        let img = quadrant_image();
        let rect = PixelRect { x: 0, y: 2, w: 2, h: 2 };
        let out = render_piece(&img, rect, Vec2::new(2.0, 2.0));
        assert!(out.pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
    }

    #[test]
    fn test_render_degenerate_rect() {
        let img = quadrant_image();
        let rect = PixelRect { x: 4, y: 4, w: 0, h: 0 };
        let out = render_piece(&img, rect, Vec2::new(10.4, 0.2));
        assert_eq!(out.dimensions(), (10, 1));
    }
}
