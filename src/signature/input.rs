//! Normalized pointer input for the signature surface.
//!
//! The surface is agnostic to the event source (mouse, touch, stylus): hosts
//! translate whatever their platform delivers into [`PointerEvent`]s carrying
//! surface-local [`Point`]s.

/// Position in surface-local coordinates, origin at the surface's top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One normalized pointer transition. `Move` events that extend an open
/// stroke are consumed by the surface; the host must suppress its default
/// scroll/pan handling for those (see [`super::SignaturePad::handle_pointer`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
}

/// Page-space placement of the surface's top-left corner. Translates pointer
/// positions (mouse client coordinates, or the first touch of a gesture) into
/// surface-local points, so drawing is independent of page scroll and layout.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceFrame {
    pub left: f32,
    pub top: f32,
}

impl SurfaceFrame {
    pub fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }

    pub fn to_local(&self, page_x: f32, page_y: f32) -> Point {
        Point {
            x: page_x - self.left,
            y: page_y - self.top,
        }
    }
}
