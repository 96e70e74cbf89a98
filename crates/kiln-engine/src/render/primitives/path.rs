use anyhow::Result;

use crate::coords::{ColorRgba, Vec2, Viewport};
use crate::render::shader::{PATH_VERT, SOLID_FRAG};
use crate::render::{RenderCtx, RenderTarget};

use super::common::{submit_pass, GeometryUniform, PathVertex, Program, ProgramDesc, UniformBinding};

/// Solid-color geometry given as CPU-converted NDC vertices.
///
/// Backs the line, polyline and polygon primitives; each owns its own
/// instance. Vertex and index buffers grow to the next power of two and are
/// reused across draws.
pub(super) struct PathRenderer {
    label: &'static str,
    topology: wgpu::PrimitiveTopology,

    program: Option<Program>,
    uniforms: Option<UniformBinding>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,

    ibo: Option<wgpu::Buffer>,
    ibo_capacity: usize,
}

impl PathRenderer {
    pub(super) const fn new(label: &'static str, topology: wgpu::PrimitiveTopology) -> Self {
        Self {
            label,
            topology,
            program: None,
            uniforms: None,
            vbo: None,
            vbo_capacity: 0,
            ibo: None,
            ibo_capacity: 0,
        }
    }

    pub(super) fn is_initialized(&self) -> bool {
        self.program.is_some()
    }

    /// Drops every GPU resource; the next draw recreates them.
    pub(super) fn destroy(&mut self) {
        *self = Self::new(self.label, self.topology);
    }

    /// Draws `vertices`, indexed when `indices` is given.
    pub(super) fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: RenderTarget<'_>,
        vertices: &[PathVertex],
        indices: Option<&[u32]>,
        color: ColorRgba,
    ) -> Result<()> {
        if vertices.is_empty() || indices.is_some_and(|i| i.is_empty()) {
            return Ok(());
        }

        if self.program.as_ref().is_some_and(|p| p.format != ctx.surface_format) {
            self.uniforms = None;
        }
        let program = Program::ensure(
            &mut self.program,
            ctx,
            &ProgramDesc {
                label: self.label,
                vertex: PATH_VERT,
                fragment: SOLID_FRAG,
                buffers: &[PathVertex::layout()],
                topology: self.topology,
                textured: false,
            },
        )?;

        let device = ctx.device();
        let uniforms = self
            .uniforms
            .get_or_insert_with(|| UniformBinding::new(device, &program.bind_group_layout, self.label));
        uniforms.write(ctx.queue(), &GeometryUniform::new(ctx, color));

        let vbo = grow_buffer(
            device,
            &mut self.vbo,
            &mut self.vbo_capacity,
            vertices.len(),
            std::mem::size_of::<PathVertex>(),
            wgpu::BufferUsages::VERTEX,
            self.label,
        );
        ctx.queue().write_buffer(vbo, 0, bytemuck::cast_slice(vertices));

        let ibo = match indices {
            Some(indices) => {
                let ibo = grow_buffer(
                    device,
                    &mut self.ibo,
                    &mut self.ibo_capacity,
                    indices.len(),
                    std::mem::size_of::<u32>(),
                    wgpu::BufferUsages::INDEX,
                    self.label,
                );
                ctx.queue().write_buffer(ibo, 0, bytemuck::cast_slice(indices));
                Some((ibo, indices.len() as u32))
            }
            None => None,
        };

        submit_pass(ctx, target, self.label, |rpass| {
            rpass.set_pipeline(&program.pipeline);
            rpass.set_bind_group(0, &uniforms.bind_group, &[]);
            rpass.set_vertex_buffer(0, vbo.slice(..));
            match ibo {
                Some((ibo, count)) => {
                    rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..count, 0, 0..1);
                }
                None => rpass.draw(0..vertices.len() as u32, 0..1),
            }
        })
    }
}

/// Returns a buffer holding at least `required` elements, reallocating on growth.
fn grow_buffer<'b>(
    device: &wgpu::Device,
    slot: &'b mut Option<wgpu::Buffer>,
    capacity: &mut usize,
    required: usize,
    stride: usize,
    usage: wgpu::BufferUsages,
    label: &str,
) -> &'b wgpu::Buffer {
    if required > *capacity || slot.is_none() {
        let new_cap = required.next_power_of_two().max(64);
        *capacity = new_cap;
        *slot = None;
        log::trace!("{label}: growing buffer to {new_cap} elements");
    }

    slot.get_or_insert_with(|| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("kiln {label} buffer")),
            size: (*capacity * stride) as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    })
}

/// Converts pixel positions to NDC vertices.
pub(super) fn to_ndc(viewport: Viewport, points: impl IntoIterator<Item = Vec2>) -> Vec<PathVertex> {
    points
        .into_iter()
        .map(|p| PathVertex {
            pos: viewport.pixel_to_ndc(p),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_ndc_maps_window_corners() {
        let vp = Viewport::new(200.0, 100.0);
        let v = to_ndc(vp, [Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0)]);
        assert_eq!(v[0].pos, [-1.0, 1.0]);
        assert_eq!(v[1].pos, [1.0, -1.0]);
    }
}
