//! Vignette pass.
//!
//! Darkens the frame towards its corners with a radial falloff, plus a slow
//! pulse so the edges feel alive rather than printed on. Runs after bloom so
//! the glow is darkened with the scene.

use rustc_hash::FxHashMap;

use crate::renderer::graph::{ExecuteContext, PrepareContext, RenderNode};
use crate::renderer::{ShaderCache, Tracked, HDR_FORMAT};
use crate::uniforms::VignetteUniforms;

const SHADER_SOURCE: &str = include_str!("../shaders/vignette.wgsl");

pub struct VignettePass {
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,

    enabled: bool,
    // Keyed by input view id; only the two ping-pong ids are live.
    bind_groups: FxHashMap<u64, wgpu::BindGroup>,
    current_bind_group: Option<wgpu::BindGroup>,
    output_view: Option<Tracked<wgpu::TextureView>>,
}

impl VignettePass {
    pub fn new(device: &wgpu::Device, shader_cache: &mut ShaderCache) -> Self {
        let shader = shader_cache.get_or_compile(device, "Vignette Shader", SHADER_SOURCE);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Vignette Layout"),
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
            label: Some("Vignette Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Vignette Pipeline"),
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
                    format: HDR_FORMAT,
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
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Vignette Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Vignette Uniforms"),
            size: std::mem::size_of::<VignetteUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            layout,
            pipeline,
            sampler,
            uniform_buffer,
            enabled: true,
            bind_groups: FxHashMap::default(),
            current_bind_group: None,
            output_view: None,
        }
    }

    /// Drops bind groups built over views that no longer exist.
    pub fn invalidate_bind_groups(&mut self) {
        self.bind_groups.clear();
    }
}

impl RenderNode for VignettePass {
    fn name(&self) -> &str {
        "Vignette Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        let config = &ctx.settings.vignette;
        self.enabled = config.enabled;
        if !self.enabled {
            // No flip: the frame passes straight through.
            return;
        }

        let uniforms = VignetteUniforms {
            intensity: config.intensity,
            dropoff: config.dropoff,
            time: ctx.time,
            _pad: 0.0,
        };
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let input = ctx.get_scene_color_input().clone();
        let output = ctx.get_scene_color_output().clone();

        if !self.bind_groups.contains_key(&input.id()) {
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Vignette BindGroup"),
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

        self.output_view = Some(output);
        ctx.flip_scene_color();
    }

    fn run(&self, _ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if !self.enabled {
            return;
        }
        let Some(bind_group) = &self.current_bind_group else {
            return;
        };
        let Some(output_view) = &self.output_view else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Vignette Pass"),
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
