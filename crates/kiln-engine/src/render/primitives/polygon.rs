use anyhow::{anyhow, Result};
use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers,
};
use lyon::math::point;
use lyon::path::Path;

use crate::coords::{ColorRgba, Vec2};
use crate::render::{RenderCtx, RenderTarget};

use super::path::{to_ndc, PathRenderer};

/// Closed outline: the strip returns to the first point.
pub struct PolygonRenderer {
    path: PathRenderer,
}

impl Default for PolygonRenderer {
    fn default() -> Self {
        Self {
            path: PathRenderer::new("polygon", wgpu::PrimitiveTopology::LineStrip),
        }
    }
}

impl PolygonRenderer {
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
        let [first, ..] = points else { return Ok(()) };
        if points.len() < 2 {
            return Ok(());
        }
        let closed = points.iter().copied().chain(std::iter::once(*first));
        let vertices = to_ndc(ctx.viewport, closed);
        self.path.draw(ctx, target, &vertices, None, color)
    }
}

/// Filled polygon, tessellated on the CPU (concave outlines included).
pub struct PolygonFilledRenderer {
    path: PathRenderer,
    tessellator: FillTessellator,
}

impl Default for PolygonFilledRenderer {
    fn default() -> Self {
        Self {
            path: PathRenderer::new("polygon fill", wgpu::PrimitiveTopology::TriangleList),
            tessellator: FillTessellator::new(),
        }
    }
}

impl PolygonFilledRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.path.is_initialized()
    }

    pub fn destroy(&mut self) {
        self.path.destroy();
    }

    /// Fewer than three points draws nothing.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        points: &[Vec2],
        color: ColorRgba,
    ) -> Result<()> {
        if points.len() < 3 {
            return Ok(());
        }
        if !points.iter().all(|p| p.is_finite()) {
            log::debug!("polygon_filled: skipping outline with non-finite points");
            return Ok(());
        }

        let (positions, indices) = tessellate(&mut self.tessellator, points)?;
        if indices.is_empty() {
            return Ok(());
        }

        let vertices = to_ndc(ctx.viewport, positions);
        self.path.draw(ctx, target, &vertices, Some(&indices), color)
    }
}

/// Triangulates a closed outline into pixel-space positions and triangle indices.
pub(super) fn tessellate(
    tessellator: &mut FillTessellator,
    points: &[Vec2],
) -> Result<(Vec<Vec2>, Vec<u32>)> {
    let mut builder = Path::builder();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        builder.begin(point(first.x, first.y));
        for p in iter {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(true);
    }
    let path = builder.build();

    let mut geometry: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    tessellator
        .tessellate_path(
            &path,
            &FillOptions::default(),
            &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
                let p = vertex.position();
                Vec2::new(p.x, p.y)
            }),
        )
        .map_err(|e| anyhow!("polygon tessellation failed: {e:?}"))?;

    Ok((geometry.vertices, geometry.indices))
}
