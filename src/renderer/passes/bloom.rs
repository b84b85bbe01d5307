//! Bloom pass.
//!
//! Runs the dual-filter chain described by a [`BloomPlan`]:
//!
//! 1. Seed: the HDR frame is copied into `downsample-0`.
//! 2. Downsample: 13-tap reductions walk the chain to the deepest level.
//!    The first step applies Karis averaging and the colour grade.
//! 3. Upsample: 3×3 tent filters walk back up, each step adding the
//!    matching downsample mip in-shader.
//! 4. Composite: the accumulated glow is mixed over the frame into the
//!    scene output, flipping the ping-pong chain.
//!
//! Chain targets live in a [`RenderTargetPool`] owned by the pass. Every
//! mip-to-mip bind group is prebuilt when the pool (re)allocates; only the
//! two bind groups touching the ping-pong scene buffers are resolved per
//! frame, cached by view identity.

use rustc_hash::FxHashMap;

use crate::chain::{BloomPlan, BloomStep, ChainLayout};
use crate::errors::Result;
use crate::renderer::graph::{ExecuteContext, PrepareContext, RenderNode};
use crate::renderer::targets::RenderTargetPool;
use crate::renderer::{ShaderCache, Tracked, HDR_FORMAT};
use crate::settings::BloomConfig;
use crate::uniforms::{CompositeUniforms, DownsampleUniforms, UpsampleUniforms};

const BLIT_SHADER: &str = include_str!("../shaders/blit.wgsl");
const DOWNSAMPLE_SHADER: &str = include_str!("../shaders/bloom_downsample.wgsl");
const UPSAMPLE_SHADER: &str = include_str!("../shaders/bloom_upsample.wgsl");
const COMPOSITE_SHADER: &str = include_str!("../shaders/bloom_composite.wgsl");

pub struct BloomPass {
    enabled: bool,
    plan: BloomPlan,
    pool: RenderTargetPool,

    blit_layout: wgpu::BindGroupLayout,
    downsample_layout: wgpu::BindGroupLayout,
    upsample_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,

    blit_pipeline: wgpu::RenderPipeline,
    downsample_pipeline: wgpu::RenderPipeline,
    upsample_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,

    sampler: wgpu::Sampler,

    /// One buffer per downsample step, written every frame.
    downsample_uniforms: Vec<wgpu::Buffer>,
    /// One buffer per upsample step, written every frame.
    upsample_uniforms: Vec<wgpu::Buffer>,
    composite_uniform: wgpu::Buffer,

    // Static bind groups over pool targets, in step order. Rebuilt when the
    // pool reallocates.
    downsample_bind_groups: Vec<wgpu::BindGroup>,
    upsample_seed_bind_group: Option<wgpu::BindGroup>,
    upsample_bind_groups: Vec<wgpu::BindGroup>,

    // Bind groups over the ping-pong scene buffers, keyed by input view id.
    // Only the two ping-pong ids are live between resizes.
    seed_bind_groups: FxHashMap<u64, wgpu::BindGroup>,
    composite_bind_groups: FxHashMap<u64, wgpu::BindGroup>,

    current_seed: Option<wgpu::BindGroup>,
    current_composite: Option<wgpu::BindGroup>,
    output_view: Option<Tracked<wgpu::TextureView>>,
}

impl BloomPass {
    pub fn new(
        device: &wgpu::Device,
        shader_cache: &mut ShaderCache,
        config: &BloomConfig,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        config.validate()?;
        let layout = ChainLayout::new(width, height, config.levels)?;
        let plan = BloomPlan::build(layout.levels());
        let pool = RenderTargetPool::new(device, layout);

        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Blit Layout"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let downsample_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Downsample Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });
        let upsample_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Upsample Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                sampler_entry(2),
                uniform_entry(3),
            ],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Composite Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                sampler_entry(2),
                uniform_entry(3),
            ],
        });

        let blit_pipeline = fullscreen_pipeline(
            device,
            "Bloom Blit Pipeline",
            &blit_layout,
            shader_cache.get_or_compile(device, "Bloom Blit Shader", BLIT_SHADER),
        );
        let downsample_pipeline = fullscreen_pipeline(
            device,
            "Bloom Downsample Pipeline",
            &downsample_layout,
            shader_cache.get_or_compile(device, "Bloom Downsample Shader", DOWNSAMPLE_SHADER),
        );
        let upsample_pipeline = fullscreen_pipeline(
            device,
            "Bloom Upsample Pipeline",
            &upsample_layout,
            shader_cache.get_or_compile(device, "Bloom Upsample Shader", UPSAMPLE_SHADER),
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "Bloom Composite Pipeline",
            &composite_layout,
            shader_cache.get_or_compile(device, "Bloom Composite Shader", COMPOSITE_SHADER),
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let levels = plan.levels() as usize;
        let downsample_uniforms = (0..levels)
            .map(|_| {
                uniform_buffer(
                    device,
                    "Bloom Downsample Uniforms",
                    std::mem::size_of::<DownsampleUniforms>() as u64,
                )
            })
            .collect();
        let upsample_uniforms = (0..levels)
            .map(|_| {
                uniform_buffer(
                    device,
                    "Bloom Upsample Uniforms",
                    std::mem::size_of::<UpsampleUniforms>() as u64,
                )
            })
            .collect();
        let composite_uniform = uniform_buffer(
            device,
            "Bloom Composite Uniforms",
            std::mem::size_of::<CompositeUniforms>() as u64,
        );

        let mut pass = Self {
            enabled: config.enabled,
            plan,
            pool,
            blit_layout,
            downsample_layout,
            upsample_layout,
            composite_layout,
            blit_pipeline,
            downsample_pipeline,
            upsample_pipeline,
            composite_pipeline,
            sampler,
            downsample_uniforms,
            upsample_uniforms,
            composite_uniform,
            downsample_bind_groups: Vec::new(),
            upsample_seed_bind_group: None,
            upsample_bind_groups: Vec::new(),
            seed_bind_groups: FxHashMap::default(),
            composite_bind_groups: FxHashMap::default(),
            current_seed: None,
            current_composite: None,
            output_view: None,
        };
        pass.rebuild_static_bind_groups(device)?;
        Ok(pass)
    }

    /// Chain depth this pass was built for. Fixed for the pass lifetime.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.plan.levels()
    }

    /// Resizes the chain targets and rebuilds every bind group over them.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<()> {
        self.pool.resize(device, width, height);
        self.rebuild_static_bind_groups(device)?;
        // Scene colour views are recreated on resize as well.
        self.seed_bind_groups.clear();
        self.composite_bind_groups.clear();
        Ok(())
    }

    /// Releases the chain targets.
    pub fn dispose(self) {
        self.pool.dispose();
    }

    fn rebuild_static_bind_groups(&mut self, device: &wgpu::Device) -> Result<()> {
        self.downsample_bind_groups.clear();
        self.upsample_bind_groups.clear();
        self.upsample_seed_bind_group = None;

        let steps = self.plan.steps().to_vec();
        let mut down_idx = 0usize;
        let mut up_idx = 0usize;
        for step in steps {
            match step {
                BloomStep::Downsample { source, .. } => {
                    let view = self.pool.view(source)?;
                    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("Bloom Downsample BindGroup"),
                        layout: &self.downsample_layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: wgpu::BindingResource::TextureView(view),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::Sampler(&self.sampler),
                            },
                            wgpu::BindGroupEntry {
                                binding: 2,
                                resource: self.downsample_uniforms[down_idx].as_entire_binding(),
                            },
                        ],
                    });
                    self.downsample_bind_groups.push(bind_group);
                    down_idx += 1;
                }
                BloomStep::UpsampleSeed { source, .. } => {
                    let view = self.pool.view(source)?;
                    self.upsample_seed_bind_group = Some(create_blit_bind_group(
                        device,
                        &self.blit_layout,
                        view,
                        &self.sampler,
                        "Bloom Upsample Seed BindGroup",
                    ));
                }
                BloomStep::Upsample { source, mip, .. } => {
                    let source_view = self.pool.view(source)?;
                    let mip_view = self.pool.view(mip)?;
                    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("Bloom Upsample BindGroup"),
                        layout: &self.upsample_layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: wgpu::BindingResource::TextureView(source_view),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::TextureView(mip_view),
                            },
                            wgpu::BindGroupEntry {
                                binding: 2,
                                resource: wgpu::BindingResource::Sampler(&self.sampler),
                            },
                            wgpu::BindGroupEntry {
                                binding: 3,
                                resource: self.upsample_uniforms[up_idx].as_entire_binding(),
                            },
                        ],
                    });
                    self.upsample_bind_groups.push(bind_group);
                    up_idx += 1;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl RenderNode for BloomPass {
    fn name(&self) -> &str {
        "Bloom Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        let config = &ctx.settings.bloom;
        self.enabled = config.enabled;
        if !self.enabled {
            // No flip: the untouched scene input passes straight through.
            return;
        }

        // Per-step uniforms. Resolution is always the extent of the texture
        // being read.
        let steps = self.plan.steps().to_vec();
        let mut down_idx = 0usize;
        let mut up_idx = 0usize;
        for step in steps {
            match step {
                BloomStep::Downsample {
                    source,
                    karis,
                    grade,
                    ..
                } => {
                    let Ok(extent) = self.pool.extent(source) else {
                        log::warn!("Bloom chain target missing: {}", source.name());
                        self.enabled = false;
                        return;
                    };
                    let uniforms =
                        DownsampleUniforms::for_step(extent, &config.render, karis, grade);
                    ctx.queue.write_buffer(
                        &self.downsample_uniforms[down_idx],
                        0,
                        bytemuck::bytes_of(&uniforms),
                    );
                    down_idx += 1;
                }
                BloomStep::Upsample { source, .. } => {
                    let Ok(extent) = self.pool.extent(source) else {
                        log::warn!("Bloom chain target missing: {}", source.name());
                        self.enabled = false;
                        return;
                    };
                    let uniforms = UpsampleUniforms::for_step(extent, &config.render);
                    ctx.queue.write_buffer(
                        &self.upsample_uniforms[up_idx],
                        0,
                        bytemuck::bytes_of(&uniforms),
                    );
                    up_idx += 1;
                }
                BloomStep::Composite { .. } => {
                    let uniforms = CompositeUniforms::new(&config.composite);
                    ctx.queue
                        .write_buffer(&self.composite_uniform, 0, bytemuck::bytes_of(&uniforms));
                }
                _ => {}
            }
        }

        let input = ctx.get_scene_color_input().clone();
        let output = ctx.get_scene_color_output().clone();

        if !self.seed_bind_groups.contains_key(&input.id()) {
            let bind_group = create_blit_bind_group(
                ctx.device,
                &self.blit_layout,
                &input,
                &self.sampler,
                "Bloom Seed BindGroup",
            );
            self.seed_bind_groups.insert(input.id(), bind_group);
        }
        self.current_seed = self.seed_bind_groups.get(&input.id()).cloned();

        if !self.composite_bind_groups.contains_key(&input.id()) {
            let bloom_ref = BloomPlan::composite_source(self.plan.levels());
            let bloom_view = match self.pool.view(bloom_ref) {
                Ok(view) => view,
                Err(err) => {
                    log::warn!("Bloom composite source missing: {err}");
                    self.enabled = false;
                    return;
                }
            };
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Bloom Composite BindGroup"),
                layout: &self.composite_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&input),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(bloom_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: self.composite_uniform.as_entire_binding(),
                    },
                ],
            });
            self.composite_bind_groups.insert(input.id(), bind_group);
        }
        self.current_composite = self.composite_bind_groups.get(&input.id()).cloned();

        self.output_view = Some(output);
        ctx.flip_scene_color();
    }

    fn run(&self, _ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if !self.enabled {
            return;
        }
        let Some(seed_bind_group) = &self.current_seed else {
            return;
        };
        let Some(composite_bind_group) = &self.current_composite else {
            return;
        };
        let Some(output_view) = &self.output_view else {
            return;
        };

        let mut down_idx = 0usize;
        let mut up_idx = 0usize;
        for step in self.plan.steps() {
            match *step {
                BloomStep::Seed { dest } => {
                    let Ok(view) = self.pool.view(dest) else {
                        return;
                    };
                    encode_fullscreen(
                        encoder,
                        "Bloom Seed Pass",
                        &self.blit_pipeline,
                        seed_bind_group,
                        view,
                    );
                }
                BloomStep::Downsample { dest, .. } => {
                    let Ok(view) = self.pool.view(dest) else {
                        return;
                    };
                    let Some(bind_group) = self.downsample_bind_groups.get(down_idx) else {
                        return;
                    };
                    down_idx += 1;
                    encode_fullscreen(
                        encoder,
                        "Bloom Downsample Pass",
                        &self.downsample_pipeline,
                        bind_group,
                        view,
                    );
                }
                BloomStep::UpsampleSeed { dest, .. } => {
                    let Ok(view) = self.pool.view(dest) else {
                        return;
                    };
                    let Some(bind_group) = &self.upsample_seed_bind_group else {
                        return;
                    };
                    encode_fullscreen(
                        encoder,
                        "Bloom Upsample Seed Pass",
                        &self.blit_pipeline,
                        bind_group,
                        view,
                    );
                }
                BloomStep::Upsample { dest, .. } => {
                    let Ok(view) = self.pool.view(dest) else {
                        return;
                    };
                    let Some(bind_group) = self.upsample_bind_groups.get(up_idx) else {
                        return;
                    };
                    up_idx += 1;
                    encode_fullscreen(
                        encoder,
                        "Bloom Upsample Pass",
                        &self.upsample_pipeline,
                        bind_group,
                        view,
                    );
                }
                BloomStep::Composite { .. } => {
                    encode_fullscreen(
                        encoder,
                        "Bloom Composite Pass",
                        &self.composite_pipeline,
                        composite_bind_group,
                        output_view,
                    );
                }
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[Some(bind_group_layout)],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
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
    })
}

fn create_blit_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn encode_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    view: &wgpu::TextureView,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        ..Default::default()
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}
