//! Depth resolve pass.
//!
//! Depth attachments cannot be sampled while another pass writes depth, so
//! the scene depth is resolved into a colour texture right after the scene
//! pass. The copy stores *linear view-space distance* rather than the raw
//! non-linear depth value, which is what the forcefield intersection test
//! wants to compare against.

use crate::renderer::graph::{ExecuteContext, PrepareContext, RenderNode};
use crate::renderer::{ShaderCache, Tracked, DEPTH_COPY_FORMAT};
use crate::uniforms::DepthResolveUniforms;

const SHADER_SOURCE: &str = include_str!("../shaders/depth_resolve.wgsl");

pub struct DepthResolvePass {
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,

    bind_group: Option<wgpu::BindGroup>,
    bound_depth_id: Option<u64>,
    output_view: Option<Tracked<wgpu::TextureView>>,
}

impl DepthResolvePass {
    pub fn new(device: &wgpu::Device, shader_cache: &mut ShaderCache) -> Self {
        let shader = shader_cache.get_or_compile(device, "Depth Resolve Shader", SHADER_SOURCE);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Depth Resolve Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Resolve Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Depth Resolve Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: DEPTH_COPY_FORMAT,
                    // R32Float is not blendable.
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Depth Resolve Uniforms"),
            size: std::mem::size_of::<DepthResolveUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            layout,
            pipeline,
            uniform_buffer,
            bind_group: None,
            bound_depth_id: None,
            output_view: None,
        }
    }
}

impl RenderNode for DepthResolvePass {
    fn name(&self) -> &str {
        "Depth Resolve Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        let uniforms = DepthResolveUniforms::new(ctx.camera.near, ctx.camera.far);
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        // The depth view is recreated on resize; rebuild the bind group when
        // its identity changes.
        let depth_view = &ctx.frame_resources.depth_view;
        if self.bound_depth_id != Some(depth_view.id()) {
            self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Depth Resolve BindGroup"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(depth_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                ],
            }));
            self.bound_depth_id = Some(depth_view.id());
        }

        self.output_view = Some(ctx.frame_resources.depth_copy_view.clone());
    }

    fn run(&self, _ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        let Some(output_view) = &self.output_view else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Depth Resolve Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
