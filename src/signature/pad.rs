use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use crate::error::SignatureError;

use super::input::{Point, PointerEvent};

/// Logical surface dimensions, matching the report-embedded raster size.
pub const SURFACE_WIDTH: u32 = 600;
pub const SURFACE_HEIGHT: u32 = 150;

const INK_WIDTH: f32 = 2.0;
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BLANK: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Free-hand signature capture surface: a fixed-size raster canvas that turns
/// a stream of surface-local points into a connected 2px ink stroke with
/// rounded caps and joins, and tracks whether any ink exists.
#[derive(Debug, Clone)]
pub struct SignaturePad {
    canvas: RgbaImage,
    cursor: Option<Point>,
    has_ink: bool,
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new()
    }
}

impl SignaturePad {
    pub fn new() -> Self {
        Self {
            canvas: RgbaImage::from_pixel(SURFACE_WIDTH, SURFACE_HEIGHT, BLANK),
            cursor: None,
            has_ink: false,
        }
    }

    pub fn has_ink(&self) -> bool {
        self.has_ink
    }

    /// Opens a new path at `point`. Draws nothing yet; ink appears on the
    /// first extension.
    pub fn begin_stroke(&mut self, point: Point) {
        self.cursor = Some(point);
    }

    /// Draws a connected segment from the previous point. No-op when no
    /// stroke is open.
    pub fn extend_stroke(&mut self, point: Point) {
        let Some(from) = self.cursor else { return };
        self.draw_segment(from, point);
        self.cursor = Some(point);
        self.has_ink = true;
    }

    pub fn end_stroke(&mut self) {
        self.cursor = None;
    }

    /// Routes a normalized pointer event through the stroke protocol.
    ///
    /// Returns true when the event belonged to an active gesture; the host
    /// must then suppress its default scroll/pan behavior for that event
    /// (scoped to the surface only).
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down(point) => {
                self.begin_stroke(point);
                true
            }
            PointerEvent::Move(point) => {
                if self.cursor.is_some() {
                    self.extend_stroke(point);
                    true
                } else {
                    false
                }
            }
            PointerEvent::Up => {
                let was_drawing = self.cursor.is_some();
                self.end_stroke();
                was_drawing
            }
        }
    }

    /// Erases all rendered ink. Returns false without touching the canvas
    /// when there is nothing to erase.
    pub fn clear(&mut self) -> bool {
        if !self.has_ink {
            return false;
        }
        self.canvas = RgbaImage::from_pixel(SURFACE_WIDTH, SURFACE_HEIGHT, BLANK);
        self.cursor = None;
        self.has_ink = false;
        true
    }

    /// Deterministic lossless PNG of exactly what is rendered. Rejected while
    /// the surface is blank; callers gate on [`Self::has_ink`].
    pub fn export_png(&self) -> Result<Vec<u8>, SignatureError> {
        if !self.has_ink {
            return Err(SignatureError::NoInk);
        }
        let mut bytes = Vec::new();
        self.canvas
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn draw_segment(&mut self, from: Point, to: Point) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let length = (dx * dx + dy * dy).sqrt();
        // Stamp the round brush densely enough that the segment reads as a
        // continuous line; stamping both endpoints gives the rounded caps.
        let steps = (length * 2.0).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(from.x + dx * t, from.y + dy * t);
        }
    }

    fn stamp(&mut self, cx: f32, cy: f32) {
        let radius = INK_WIDTH / 2.0;
        let min_x = (cx - radius).floor().max(0.0) as u32;
        let max_x = ((cx + radius).ceil() as i64).min(SURFACE_WIDTH as i64 - 1);
        let min_y = (cy - radius).floor().max(0.0) as u32;
        let max_y = ((cy + radius).ceil() as i64).min(SURFACE_HEIGHT as i64 - 1);
        if max_x < 0 || max_y < 0 {
            return;
        }
        for y in min_y..=max_y as u32 {
            for x in min_x..=max_x as u32 {
                let px = x as f32 + 0.5 - cx;
                let py = y as f32 + 0.5 - cy;
                if px * px + py * py <= radius * radius {
                    self.canvas.put_pixel(x, y, INK);
                }
            }
        }
    }
}
