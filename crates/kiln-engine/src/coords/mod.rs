//! Coordinate and geometry types shared by the controller, textures and primitives.
//!
//! Canonical CPU space:
//! - Physical framebuffer pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Primitives convert to NDC either on the CPU (`Viewport::pixel_to_ndc`) or in
//! the shared vertex stage using the same formula.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
