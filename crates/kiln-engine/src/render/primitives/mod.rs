//! Shader-backed draw primitives.
//!
//! Every primitive builds its program and buffers on first use and keeps them
//! until torn down through [`Primitives::destroy`] or [`Primitives::destroy_all`].

mod circle;
mod common;
mod lines;
mod path;
mod polygon;
mod texture_quad;

pub use circle::CircleRenderer;
pub use lines::LinesRenderer;
pub use polygon::{PolygonFilledRenderer, PolygonRenderer};
pub use texture_quad::TextureQuadRenderer;

use anyhow::Result;

use crate::coords::{ColorRgba, Rect, Vec2};
use crate::render::{RenderCtx, RenderTarget};
use crate::texture::Texture;

/// Names one primitive's cached state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Line,
    Lines,
    Circle,
    CircleFilled,
    Polygon,
    PolygonFilled,
    TextureQuad,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 7] = [
        PrimitiveKind::Line,
        PrimitiveKind::Lines,
        PrimitiveKind::Circle,
        PrimitiveKind::CircleFilled,
        PrimitiveKind::Polygon,
        PrimitiveKind::PolygonFilled,
        PrimitiveKind::TextureQuad,
    ];
}

/// Arena of primitive renderers, one per kind.
pub struct Primitives {
    lines: LinesRenderer,
    circle: CircleRenderer,
    circle_filled: CircleRenderer,
    polygon: PolygonRenderer,
    polygon_filled: PolygonFilledRenderer,
    texture_quad: TextureQuadRenderer,
}

impl Default for Primitives {
    fn default() -> Self {
        Self {
            lines: LinesRenderer::new(),
            circle: CircleRenderer::outline(),
            circle_filled: CircleRenderer::filled(),
            polygon: PolygonRenderer::new(),
            polygon_filled: PolygonFilledRenderer::new(),
            texture_quad: TextureQuadRenderer::new(),
        }
    }
}

impl Primitives {
    pub fn new() -> Self {
        Self::default()
    }

    // ── draws ─────────────────────────────────────────────────────────────

    pub fn line(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        a: Vec2,
        b: Vec2,
        color: ColorRgba,
    ) -> Result<()> {
        self.lines.draw(ctx, target, &[a, b], color)
    }

    pub fn lines(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        points: &[Vec2],
        color: ColorRgba,
    ) -> Result<()> {
        self.lines.draw(ctx, target, points, color)
    }

    pub fn circle(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        center: Vec2,
        radius: f32,
        color: ColorRgba,
    ) -> Result<()> {
        self.circle.draw(ctx, target, center, radius, color)
    }

    pub fn circle_filled(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        center: Vec2,
        radius: f32,
        color: ColorRgba,
    ) -> Result<()> {
        self.circle_filled.draw(ctx, target, center, radius, color)
    }

    pub fn polygon(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        points: &[Vec2],
        color: ColorRgba,
    ) -> Result<()> {
        self.polygon.draw(ctx, target, points, color)
    }

    pub fn polygon_filled(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        points: &[Vec2],
        color: ColorRgba,
    ) -> Result<()> {
        self.polygon_filled.draw(ctx, target, points, color)
    }

    pub fn texture_quad(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        texture: &Texture,
        dst: Rect,
        sub: Rect,
        tint: ColorRgba,
    ) -> Result<()> {
        self.texture_quad.draw(ctx, target, texture, dst, sub, tint)
    }

    // ── state ─────────────────────────────────────────────────────────────

    pub fn is_initialized(&self, kind: PrimitiveKind) -> bool {
        match kind {
            PrimitiveKind::Line | PrimitiveKind::Lines => self.lines.is_initialized(),
            PrimitiveKind::Circle => self.circle.is_initialized(),
            PrimitiveKind::CircleFilled => self.circle_filled.is_initialized(),
            PrimitiveKind::Polygon => self.polygon.is_initialized(),
            PrimitiveKind::PolygonFilled => self.polygon_filled.is_initialized(),
            PrimitiveKind::TextureQuad => self.texture_quad.is_initialized(),
        }
    }

    /// Tears down one primitive's GPU state.
    ///
    /// `Line` draws through `Lines` and owns nothing, so destroying it is a no-op.
    pub fn destroy(&mut self, kind: PrimitiveKind) {
        match kind {
            PrimitiveKind::Line => {}
            PrimitiveKind::Lines => self.lines.destroy(),
            PrimitiveKind::Circle => self.circle.destroy(),
            PrimitiveKind::CircleFilled => self.circle_filled.destroy(),
            PrimitiveKind::Polygon => self.polygon.destroy(),
            PrimitiveKind::PolygonFilled => self.polygon_filled.destroy(),
            PrimitiveKind::TextureQuad => self.texture_quad.destroy(),
        }
    }

    pub fn destroy_all(&mut self) {
        for kind in PrimitiveKind::ALL {
            self.destroy(kind);
        }
    }
}
