use anyhow::Result;

use crate::coords::{ColorRgba, Rect, Vec2};
use crate::render::shader::{CIRCLE_FILLED_FRAG, CIRCLE_FRAG, GEOMETRY_VERT};
use crate::render::{RenderCtx, RenderTarget};

use super::common::{
    submit_pass, GeometryUniform, Program, ProgramDesc, QuadBuffers, QuadVertex, UniformBinding,
};

/// Ring width of the outline variant, in pixels.
const OUTLINE_WIDTH: f32 = 1.0;

/// Anti-aliased circle drawn as a quad over its bounds.
///
/// The fragment stage computes coverage from the distance to the center and
/// discards fragments outside the ring (outline) or disc (filled).
pub struct CircleRenderer {
    filled: bool,

    program: Option<Program>,
    quad: Option<QuadBuffers>,
    uniforms: Option<UniformBinding>,
}

impl CircleRenderer {
    pub fn outline() -> Self {
        Self::with_fill(false)
    }

    pub fn filled() -> Self {
        Self::with_fill(true)
    }

    fn with_fill(filled: bool) -> Self {
        Self {
            filled,
            program: None,
            quad: None,
            uniforms: None,
        }
    }

    fn label(&self) -> &'static str {
        if self.filled { "circle fill" } else { "circle" }
    }

    pub fn is_initialized(&self) -> bool {
        self.program.is_some()
    }

    pub fn destroy(&mut self) {
        *self = Self::with_fill(self.filled);
    }

    /// Non-positive radius draws nothing.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        center: Vec2,
        radius: f32,
        color: ColorRgba,
    ) -> Result<()> {
        if radius <= 0.0 || !radius.is_finite() || !center.is_finite() {
            log::debug!("{}: skipping radius {radius} at {center:?}", self.label());
            return Ok(());
        }

        let label = self.label();
        if self.program.as_ref().is_some_and(|p| p.format != ctx.surface_format) {
            self.uniforms = None;
        }
        let program = Program::ensure(
            &mut self.program,
            ctx,
            &ProgramDesc {
                label,
                vertex: GEOMETRY_VERT,
                fragment: if self.filled { CIRCLE_FILLED_FRAG } else { CIRCLE_FRAG },
                buffers: &[QuadVertex::layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                textured: false,
            },
        )?;

        let device = ctx.device();
        let quad = self.quad.get_or_insert_with(|| QuadBuffers::new(device, label));
        let uniforms = self
            .uniforms
            .get_or_insert_with(|| UniformBinding::new(device, &program.bind_group_layout, label));

        // One extra pixel so the anti-aliased edge is not clipped by the quad.
        let bounds = Rect::around_circle(center, radius, 1.0);
        uniforms.write(
            ctx.queue(),
            &GeometryUniform::new(ctx, color)
                .with_rect(bounds)
                .with_params(radius, OUTLINE_WIDTH),
        );

        submit_pass(ctx, target, label, |rpass| {
            rpass.set_pipeline(&program.pipeline);
            rpass.set_bind_group(0, &uniforms.bind_group, &[]);
            rpass.set_vertex_buffer(0, quad.vbo.slice(..));
            rpass.set_index_buffer(quad.ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..6, 0, 0..1);
        })
    }
}
