pub mod input;
pub mod pad;

pub use input::{Point, PointerEvent, SurfaceFrame};
pub use pad::{SignaturePad, SURFACE_HEIGHT, SURFACE_WIDTH};
