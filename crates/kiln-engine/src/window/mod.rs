//! Window + frame controller.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer, and
//! exposes the draw primitives for the current frame.

mod events;
mod settings;
mod system;

pub use settings::RenderSettings;
pub use system::RenderSystem;
