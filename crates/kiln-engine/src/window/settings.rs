use std::path::PathBuf;

use crate::coords::ColorRgba;
use crate::device::GpuInit;

/// Render system configuration.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Color each frame is cleared to.
    pub clear_color: ColorRgba,

    /// Device/surface parameters.
    pub gpu: GpuInit,

    /// Read WGSL sources from this directory instead of the embedded copies.
    pub shader_dir: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: ColorRgba::new(0.05, 0.05, 0.08, 1.0),
            gpu: GpuInit::default(),
            shader_dir: None,
        }
    }
}

impl RenderSettings {
    pub fn with_clear_color(mut self, color: ColorRgba) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_gpu(mut self, gpu: GpuInit) -> Self {
        self.gpu = gpu;
        self
    }

    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }
}
