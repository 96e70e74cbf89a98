use anyhow::{ensure, Context, Result};

use crate::coords::{ColorRgba, Rect};
use crate::render::shader::{GEOMETRY_VERT, TEXTURE_FRAG};
use crate::render::{RenderCtx, RenderTarget};
use crate::texture::{Texture, TextureKind};

use super::common::{
    new_uniform_buffer, submit_pass, GeometryUniform, Program, ProgramDesc, QuadBuffers,
    QuadVertex,
};

const LABEL: &str = "texture quad";

/// Draws a sub-rectangle of a texture into a destination rect, tinted.
///
/// The unit quad, uniform buffer and program persist across draws; only the
/// bind group (texture view + sampler of unit 0) is built per call.
#[derive(Default)]
pub struct TextureQuadRenderer {
    program: Option<Program>,
    quad: Option<QuadBuffers>,
    ubo: Option<wgpu::Buffer>,
}

impl TextureQuadRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.program.is_some()
    }

    pub fn destroy(&mut self) {
        *self = Self::default();
    }

    /// `sub` is normalized (`Rect::unit()` is the whole texture). The texture
    /// is bound to unit 0 for the draw and unit 0 is left unbound afterwards.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        texture: &Texture,
        dst: Rect,
        sub: Rect,
        tint: ColorRgba,
    ) -> Result<()> {
        if !texture.is_valid() {
            log::warn!("texture_quad: texture is empty; skipping");
            return Ok(());
        }
        if texture.kind() == TextureKind::CubeMap || texture.format().is_depth() {
            log::warn!(
                "texture_quad: {:?} {:?} textures cannot be drawn as a quad; skipping",
                texture.kind(),
                texture.format()
            );
            return Ok(());
        }
        ensure!(
            texture.belongs_to(ctx.gpu),
            "texture_quad: texture {} belongs to a different graphics context",
            texture.id().get()
        );

        let dst = dst.normalized();
        if dst.is_empty() || !dst.is_finite() {
            log::debug!("texture_quad: skipping empty destination {dst:?}");
            return Ok(());
        }

        let program = Program::ensure(
            &mut self.program,
            ctx,
            &ProgramDesc {
                label: LABEL,
                vertex: GEOMETRY_VERT,
                fragment: TEXTURE_FRAG,
                buffers: &[QuadVertex::layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                textured: true,
            },
        )?;

        let device = ctx.device();
        let quad = self.quad.get_or_insert_with(|| QuadBuffers::new(device, LABEL));
        let ubo = self.ubo.get_or_insert_with(|| new_uniform_buffer(device, LABEL));

        texture.bind(ctx.gpu, 0)?;
        let drawn = (|| {
            let bound = ctx
                .gpu
                .units()
                .get(0)
                .context("texture unit 0 is empty after bind")?;

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("kiln texture quad bind group"),
                layout: &program.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&bound.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&bound.sampler),
                    },
                ],
            });

            let uniform = GeometryUniform::new(ctx, tint)
                .with_rect(dst)
                .with_subtexture(sub);
            ctx.queue().write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));

            submit_pass(ctx, target, LABEL, |rpass| {
                rpass.set_pipeline(&program.pipeline);
                rpass.set_bind_group(0, &bind_group, &[]);
                rpass.set_vertex_buffer(0, quad.vbo.slice(..));
                rpass.set_index_buffer(quad.ibo.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..6, 0, 0..1);
            })
        })();

        Texture::unbind(ctx.gpu, 0)?;
        drawn
    }
}
