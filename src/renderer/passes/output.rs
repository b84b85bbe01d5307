//! Output pass.
//!
//! Terminal pass of every frame: tone maps the HDR frame (ACES filmic with
//! an exposure pre-scale) and writes it to the caller's output view. The
//! pipeline targets whatever format that view has and is rebuilt when the
//! format changes, which happens when a surface is reconfigured.
//!
//! Colour is emitted linear; sRGB output formats apply the transfer curve
//! in hardware.

use rustc_hash::FxHashMap;

use crate::renderer::graph::{ExecuteContext, PrepareContext, RenderNode};
use crate::renderer::ShaderCache;
use crate::uniforms::OutputUniforms;

const SHADER_SOURCE: &str = include_str!("../shaders/output.wgsl");

pub struct OutputPass {
    layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    shader: wgpu::ShaderModule,
    pipeline: wgpu::RenderPipeline,
    pipeline_format: wgpu::TextureFormat,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,

    // Keyed by input view id; only the two ping-pong ids are live.
    bind_groups: FxHashMap<u64, wgpu::BindGroup>,
    current_bind_group: Option<wgpu::BindGroup>,
}

impl OutputPass {
    pub fn new(
        device: &wgpu::Device,
        shader_cache: &mut ShaderCache,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = shader_cache
            .get_or_compile(device, "Output Shader", SHADER_SOURCE)
            .clone();

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Output Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
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
            label: Some("Output Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipeline = Self::build_pipeline(device, &pipeline_layout, &shader, output_format);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Output Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Output Uniforms"),
            size: std::mem::size_of::<OutputUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            layout,
            pipeline_layout,
            shader,
            pipeline,
            pipeline_format: output_format,
            sampler,
            uniform_buffer,
            bind_groups: FxHashMap::default(),
            current_bind_group: None,
        }
    }

    /// Drops bind groups built over views that no longer exist.
    pub fn invalidate_bind_groups(&mut self) {
        self.bind_groups.clear();
    }

    fn build_pipeline(
        device: &wgpu::Device,
        pipeline_layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Output Pipeline"),
            layout: Some(pipeline_layout),
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
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

impl RenderNode for OutputPass {
    fn name(&self) -> &str {
        "Output Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        if ctx.output_format != self.pipeline_format {
            log::info!(
                "Output format changed: {:?} -> {:?}, rebuilding pipeline",
                self.pipeline_format,
                ctx.output_format
            );
            self.pipeline = Self::build_pipeline(
                ctx.device,
                &self.pipeline_layout,
                &self.shader,
                ctx.output_format,
            );
            self.pipeline_format = ctx.output_format;
        }

        let uniforms = OutputUniforms {
            exposure: ctx.settings.exposure,
            _pad: [0.0; 3],
        };
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let input = ctx.get_scene_color_input().clone();
        if !self.bind_groups.contains_key(&input.id()) {
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Output BindGroup"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&input),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                ],
            });
            self.bind_groups.insert(input.id(), bind_group);
        }
        self.current_bind_group = self.bind_groups.get(&input.id()).cloned();
        // Terminal pass: reads the final chain state, no flip.
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let Some(bind_group) = &self.current_bind_group else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Output Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: ctx.output_view,
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
