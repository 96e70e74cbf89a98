use crate::coords::Viewport;
use crate::device::GpuContext;

use super::ShaderLibrary;

/// Renderer-facing context (GPU context + shader sources + target format + viewport).
///
/// This is intentionally small and stable.
pub struct RenderCtx<'a> {
    pub gpu: &'a GpuContext,
    pub shaders: &'a ShaderLibrary,
    pub surface_format: wgpu::TextureFormat,
    pub viewport: Viewport, // physical px
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        gpu: &'a GpuContext,
        shaders: &'a ShaderLibrary,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
    ) -> Self {
        Self {
            gpu,
            shaders,
            surface_format,
            viewport,
        }
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        self.gpu.device()
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        self.gpu.queue()
    }
}

/// Target for drawing. Every draw records and submits its own encoder.
#[derive(Clone, Copy)]
pub struct RenderTarget<'a> {
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(color_view: &'a wgpu::TextureView) -> Self {
        Self { color_view }
    }
}
