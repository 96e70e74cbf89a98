//! Kiln engine crate.
//!
//! A minimal 2D rendering layer over wgpu: one window and GPU context with
//! thread ownership, GPU textures, and immediate-mode draw primitives.

pub mod device;
pub mod window;

pub mod logging;
pub mod coords;
pub mod render;
pub mod texture;

pub use coords::{ColorRgba, Rect, Vec2, Viewport};
pub use device::{GpuContext, GpuInit};
pub use render::PrimitiveKind;
pub use texture::{Filter, PixelFormat, Texture, TextureId, TextureKind, Wrap};
pub use window::{RenderSettings, RenderSystem};
