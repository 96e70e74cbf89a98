//! GPU device, surface and context ownership.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (windowed or headless)
//! - creating & configuring the Surface (swapchain) and acquiring images
//! - arbitrating which thread owns the context
//! - capturing GPU-reported errors around individual operations

mod context;
mod error;
mod frame;
mod gpu;
mod init;
mod ownership;
mod surface;

pub use context::GpuContext;
pub use frame::SurfaceFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use ownership::{Acquire, ContextLock};
pub use surface::SurfaceErrorAction;

#[cfg(test)]
pub(crate) use context::test_context;
