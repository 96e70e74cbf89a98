//! Shared GPU types and utilities used by all primitive renderers.

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{ColorRgba, Rect};
use crate::render::{RenderCtx, RenderTarget};

// ── blend ─────────────────────────────────────────────────────────────────

/// `src_alpha, one_minus_src_alpha` on straight (non-premultiplied) colors.
pub(super) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState::ALPHA_BLENDING
}

// ── geometry uniform ──────────────────────────────────────────────────────

/// Uniform block shared by every primitive program (80 bytes).
///
///  offset  0  resolution [f32; 2]
///  offset  8  _pad       [f32; 2]
///  offset 16  rect       [f32; 4]   x, y, w, h in pixels
///  offset 32  color      [f32; 4]
///  offset 48  subtexture [f32; 4]   u, v, w, h normalized
///  offset 64  params     [f32; 4]   .x = radius, .y = stroke width
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct GeometryUniform {
    pub resolution: [f32; 2],
    pub _pad: [f32; 2],
    pub rect: [f32; 4],
    pub color: [f32; 4],
    pub subtexture: [f32; 4],
    pub params: [f32; 4],
}

impl GeometryUniform {
    pub(super) fn new(ctx: &RenderCtx<'_>, color: ColorRgba) -> Self {
        Self {
            resolution: ctx.viewport.resolution(),
            _pad: [0.0; 2],
            rect: [0.0; 4],
            color: color.to_array(),
            subtexture: Rect::unit().to_array(),
            params: [0.0; 4],
        }
    }

    pub(super) fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect.to_array();
        self
    }

    pub(super) fn with_subtexture(mut self, sub: Rect) -> Self {
        self.subtexture = sub.to_array();
        self
    }

    pub(super) fn with_params(mut self, radius: f32, stroke_width: f32) -> Self {
        self.params = [radius, stroke_width, 0.0, 0.0];
        self
    }
}

// ── vertices ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Path vertex, already in NDC.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct PathVertex {
    pub pos: [f32; 2],
}

impl PathVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PathVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Unit quad buffers, created once per renderer.
pub(super) struct QuadBuffers {
    pub vbo: wgpu::Buffer,
    pub ibo: wgpu::Buffer,
}

impl QuadBuffers {
    pub(super) fn new(device: &wgpu::Device, label: &str) -> Self {
        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("kiln {label} quad vbo")),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("kiln {label} quad ibo")),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vbo, ibo }
    }
}

// ── program ───────────────────────────────────────────────────────────────

/// What a primitive needs compiled.
pub(super) struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
    pub buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub topology: wgpu::PrimitiveTopology,
    /// Adds texture (binding 1) and sampler (binding 2) entries.
    pub textured: bool,
}

/// Compiled pipeline plus its bind group layout, for one target format.
pub(super) struct Program {
    pub format: wgpu::TextureFormat,
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl Program {
    /// Returns the cached program, (re)building it when the target format changed.
    ///
    /// Shader load or compile failures are returned; the slot stays empty.
    pub(super) fn ensure<'s>(
        slot: &'s mut Option<Program>,
        ctx: &RenderCtx<'_>,
        desc: &ProgramDesc<'_>,
    ) -> Result<&'s Program> {
        if slot.as_ref().is_some_and(|p| p.format != ctx.surface_format) {
            *slot = None;
        }
        if slot.is_none() {
            let program = Self::build(ctx, desc)
                .with_context(|| format!("failed to build the {} program", desc.label))?;
            log::debug!("built {} program for {:?}", desc.label, ctx.surface_format);
            *slot = Some(program);
        }
        slot.as_ref().context("program slot empty after build")
    }

    fn build(ctx: &RenderCtx<'_>, desc: &ProgramDesc<'_>) -> Result<Program> {
        let vertex_src = ctx.shaders.source(desc.vertex)?;
        let fragment_src = ctx.shaders.source(desc.fragment)?;
        let format = ctx.surface_format;
        let label = desc.label;

        ctx.gpu.scoped(&format!("{label} program build"), |device| {
            let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.vertex),
                source: wgpu::ShaderSource::Wgsl(vertex_src),
            });
            let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.fragment),
                source: wgpu::ShaderSource::Wgsl(fragment_src),
            });

            let mut entries = vec![wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<GeometryUniform>() as u64,
                    ),
                },
                count: None,
            }];
            if desc.textured {
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                });
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                });
            }

            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("kiln {label} bgl")),
                    entries: &entries,
                });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("kiln {label} pipeline layout")),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("kiln {label} pipeline")),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: desc.buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: desc.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

            Program {
                format,
                pipeline,
                bind_group_layout,
            }
        })
    }
}

// ── uniform buffer ────────────────────────────────────────────────────────

/// Uniform buffer plus the bind group that exposes it at binding 0.
///
/// Only for untextured programs; textured draws build their bind group per call.
pub(super) struct UniformBinding {
    pub ubo: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    pub(super) fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let ubo = new_uniform_buffer(device, label);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("kiln {label} bind group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });
        Self { ubo, bind_group }
    }

    pub(super) fn write(&self, queue: &wgpu::Queue, uniform: &GeometryUniform) {
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(uniform));
    }
}

pub(super) fn new_uniform_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("kiln {label} ubo")),
        size: std::mem::size_of::<GeometryUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ── submission ────────────────────────────────────────────────────────────

/// Records one load/store pass over `target`, lets `f` draw, and submits.
///
/// Recording and submission run inside an error scope, so a validation error
/// raised by the draw is returned instead of reaching the uncaptured handler.
pub(super) fn submit_pass(
    ctx: &RenderCtx<'_>,
    target: RenderTarget<'_>,
    label: &str,
    f: impl FnOnce(&mut wgpu::RenderPass<'_>),
) -> Result<()> {
    ctx.gpu.scoped(&format!("{label} draw"), |device| {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(&format!("kiln {label} encoder")),
        });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!("kiln {label} pass")),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            f(&mut rpass);
        }

        ctx.queue().submit(Some(encoder.finish()));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<GeometryUniform>(), 80);
    }

    #[test]
    fn quad_indices_cover_two_triangles() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }
}
