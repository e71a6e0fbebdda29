//! Platform abstraction layer
//!
//! Turns raw mouse/touch events into pointer samples in play-surface
//! coordinates. The mapping is pure so it can be tested natively; the
//! browser bindings live in `web`.

use glam::Vec2;

use crate::sim::PointerId;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// One pointer position in client (viewport) coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer: PointerId,
    pub client: Vec2,
}

impl PointerSample {
    pub fn mouse(x: f32, y: f32) -> Self {
        Self {
            pointer: PointerId::MOUSE,
            client: Vec2::new(x, y),
        }
    }

    /// Touch identifiers are non-negative, so they never collide with the mouse
    pub fn touch(identifier: i32, x: f32, y: f32) -> Self {
        Self {
            pointer: PointerId(identifier.max(0)),
            client: Vec2::new(x, y),
        }
    }
}

/// Where the play surface sits in the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFrame {
    /// Client-space top-left of the surface element
    pub origin: Vec2,
    /// Surface units per client pixel (1.0 unless CSS scales the element)
    pub scale: Vec2,
}

impl Default for SurfaceFrame {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
        }
    }
}

impl SurfaceFrame {
    /// Build from the element's bounding rect and the logical surface size
    pub fn from_rect(left: f32, top: f32, width: f32, height: f32, surface: Vec2) -> Self {
        let displayed = Vec2::new(width, height);
        let scale = if displayed.x > 0.0 && displayed.y > 0.0 {
            surface / displayed
        } else {
            Vec2::ONE
        };
        Self {
            origin: Vec2::new(left, top),
            scale,
        }
    }

    /// Client coordinates -> play-surface coordinates (not clamped)
    #[inline]
    pub fn to_surface(&self, client: Vec2) -> Vec2 {
        (client - self.origin) * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscaled_frame() {
        let frame = SurfaceFrame::from_rect(100.0, 50.0, 600.0, 600.0, Vec2::splat(600.0));
        assert_eq!(frame.to_surface(Vec2::new(100.0, 50.0)), Vec2::ZERO);
        assert_eq!(frame.to_surface(Vec2::new(400.0, 350.0)), Vec2::new(300.0, 300.0));
        // Outside the element maps outside the surface; clamping is the piece's job
        assert_eq!(frame.to_surface(Vec2::new(0.0, 0.0)), Vec2::new(-100.0, -50.0));
    }

    #[test]
    fn test_scaled_frame() {
        // Surface shown at half size on a small screen
        let frame = SurfaceFrame::from_rect(0.0, 0.0, 300.0, 300.0, Vec2::splat(600.0));
        assert_eq!(frame.to_surface(Vec2::new(150.0, 30.0)), Vec2::new(300.0, 60.0));
    }

    #[test]
    fn test_collapsed_rect_falls_back() {
        let frame = SurfaceFrame::from_rect(10.0, 10.0, 0.0, 0.0, Vec2::splat(600.0));
        assert_eq!(frame.scale, Vec2::ONE);
    }

    #[test]
    fn test_pointer_ids_distinct() {
        assert_ne!(PointerSample::mouse(0.0, 0.0).pointer, PointerSample::touch(0, 0.0, 0.0).pointer);
        assert_eq!(PointerSample::touch(-3, 0.0, 0.0).pointer, PointerId(0));
    }
}
