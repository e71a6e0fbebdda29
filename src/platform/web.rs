//! Browser event bindings

use glam::Vec2;
use web_sys::{Element, MouseEvent, TouchList};

use super::{PointerSample, SurfaceFrame};

pub fn mouse_sample(event: &MouseEvent) -> PointerSample {
    PointerSample::mouse(event.client_x() as f32, event.client_y() as f32)
}

/// One sample per touch point in `list` (use `changed_touches` for end events)
pub fn touch_samples(list: &TouchList) -> Vec<PointerSample> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| PointerSample::touch(t.identifier(), t.client_x() as f32, t.client_y() as f32))
        .collect()
}

/// Current on-screen frame of the surface element
pub fn surface_frame(element: &Element, surface: Vec2) -> SurfaceFrame {
    let rect = element.get_bounding_client_rect();
    SurfaceFrame::from_rect(
        rect.left() as f32,
        rect.top() as f32,
        rect.width() as f32,
        rect.height() as f32,
        surface,
    )
}
