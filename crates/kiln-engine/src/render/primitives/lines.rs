use anyhow::Result;

use crate::coords::{ColorRgba, Vec2};
use crate::render::{RenderCtx, RenderTarget};

use super::path::{to_ndc, PathRenderer};

/// Open polyline through a list of points (line strip).
///
/// Single segments go through here too, so `line` has no state of its own.
pub struct LinesRenderer {
    path: PathRenderer,
}

impl Default for LinesRenderer {
    fn default() -> Self {
        Self {
            path: PathRenderer::new("lines", wgpu::PrimitiveTopology::LineStrip),
        }
    }
}

impl LinesRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.path.is_initialized()
    }

    pub fn destroy(&mut self) {
        self.path.destroy();
    }

    /// Fewer than two points draws nothing.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        points: &[Vec2],
        color: ColorRgba,
    ) -> Result<()> {
        if points.len() < 2 {
            return Ok(());
        }
        let vertices = to_ndc(ctx.viewport, points.iter().copied());
        self.path.draw(ctx, target, &vertices, None, color)
    }
}
