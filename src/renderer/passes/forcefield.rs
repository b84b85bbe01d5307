//! Forcefield overlay pass.
//!
//! Draws every configured forcefield volume as a double-sided unit cube over
//! the finished opaque scene. The shell is additive and does not write depth;
//! it still depth-tests against the scene so geometry in front occludes it.
//! The fragment shader compares its own view distance against the resolved
//! depth copy to light up intersections with nearby geometry.
//!
//! All instances share one uniform buffer at a fixed stride and bind with a
//! dynamic offset, so a frame with N volumes stays at one bind group and N
//! draws.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::renderer::graph::{ExecuteContext, PrepareContext, RenderNode};
use crate::renderer::{ShaderCache, Tracked, DEPTH_FORMAT, HDR_FORMAT};
use crate::uniforms::ForcefieldUniforms;

const SHADER_SOURCE: &str = include_str!("../shaders/forcefield.wgsl");

const PATTERN_SIZE: u32 = 64;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CubeVertex {
    position: [f32; 3],
    uv: [f32; 2],
}

/// Unit cube, 4 vertices per face so every face gets a full 0–1 uv tile.
/// Side faces map `v` along world Y, which keeps the pattern scroll vertical.
fn unit_cube() -> ([CubeVertex; 24], [u16; 36]) {
    let positions: [[f32; 3]; 24] = [
        // Front face (+Z)
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
        // Back face (-Z)
        [-0.5, -0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [0.5, 0.5, -0.5],
        [0.5, -0.5, -0.5],
        // Top face (+Y)
        [-0.5, 0.5, -0.5],
        [-0.5, 0.5, 0.5],
        [0.5, 0.5, 0.5],
        [0.5, 0.5, -0.5],
        // Bottom face (-Y)
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, -0.5, 0.5],
        [-0.5, -0.5, 0.5],
        // Right face (+X)
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [0.5, 0.5, 0.5],
        [0.5, -0.5, 0.5],
        // Left face (-X)
        [-0.5, -0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [-0.5, 0.5, 0.5],
        [-0.5, 0.5, -0.5],
    ];

    let uvs: [[f32; 2]; 24] = [
        // Front
        [0.0, 1.0],
        [1.0, 1.0],
        [1.0, 0.0],
        [0.0, 0.0],
        // Back
        [1.0, 1.0],
        [1.0, 0.0],
        [0.0, 0.0],
        [0.0, 1.0],
        // Top
        [0.0, 0.0],
        [0.0, 1.0],
        [1.0, 1.0],
        [1.0, 0.0],
        // Bottom
        [0.0, 1.0],
        [1.0, 1.0],
        [1.0, 0.0],
        [0.0, 0.0],
        // Right
        [0.0, 1.0],
        [0.0, 0.0],
        [1.0, 0.0],
        [1.0, 1.0],
        // Left
        [0.0, 1.0],
        [1.0, 1.0],
        [1.0, 0.0],
        [0.0, 0.0],
    ];

    let mut vertices = [CubeVertex {
        position: [0.0; 3],
        uv: [0.0; 2],
    }; 24];
    for i in 0..24 {
        vertices[i] = CubeVertex {
            position: positions[i],
            uv: uvs[i],
        };
    }

    let mut indices = [0u16; 36];
    for face in 0..6u16 {
        let base = face * 4;
        indices[face as usize * 6..face as usize * 6 + 6]
            .copy_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

/// Generates the tileable circle pattern (one soft ring per tile).
///
/// The texture should use `Repeat` addressing and `Linear` filtering; the
/// shader tiles it across each face with the template's `pattern_tiling`.
#[must_use]
fn generate_circle_pattern() -> Vec<[u8; 4]> {
    let size = PATTERN_SIZE as usize;
    let mut texels = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let u = (x as f32 + 0.5) / size as f32 - 0.5;
            let v = (y as f32 + 0.5) / size as f32 - 0.5;
            let d = (u * u + v * v).sqrt();
            // Soft ring centred at radius 0.35.
            let ring = smoothstep(0.28, 0.33, d) * (1.0 - smoothstep(0.37, 0.42, d));
            let byte = (ring * 255.0) as u8;
            texels.push([byte, byte, byte, byte]);
        }
    }
    texels
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub struct ForcefieldPass {
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    pattern_view: wgpu::TextureView,
    sampler: wgpu::Sampler,

    /// One [`ForcefieldUniforms::STRIDE`] slot per instance.
    instance_buffer: wgpu::Buffer,
    capacity: usize,

    bind_group: Option<wgpu::BindGroup>,
    bound_depth_copy_id: Option<u64>,
    draw_count: u32,
    color_view: Option<Tracked<wgpu::TextureView>>,
    depth_view: Option<Tracked<wgpu::TextureView>>,
}

impl ForcefieldPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shader_cache: &mut ShaderCache,
    ) -> Self {
        let shader = shader_cache.get_or_compile(device, "Forcefield Shader", SHADER_SOURCE);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Forcefield Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ForcefieldUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Depth copy, read with textureLoad.
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forcefield Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Forcefield Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<CubeVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 12,
                            shader_location: 1,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    // Additive over the scene.
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Both shell sides are visible through the volume.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: Some(false),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let (vertices, indices) = unit_cube();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Forcefield Cube Vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Forcefield Cube Indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let pattern_view = Self::create_pattern_texture(device, queue);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Forcefield Pattern Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let capacity = 4;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Forcefield Instance Uniforms"),
            size: capacity as u64 * ForcefieldUniforms::STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            layout,
            pipeline,
            vertex_buffer,
            index_buffer,
            pattern_view,
            sampler,
            instance_buffer,
            capacity,
            bind_group: None,
            bound_depth_copy_id: None,
            draw_count: 0,
            color_view: None,
            depth_view: None,
        }
    }

    fn create_pattern_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Forcefield Circle Pattern"),
            size: wgpu::Extent3d {
                width: PATTERN_SIZE,
                height: PATTERN_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let texels = generate_circle_pattern();
        let flat: Vec<u8> = texels.iter().flat_map(|p| p.iter().copied()).collect();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &flat,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(PATTERN_SIZE * 4),
                rows_per_image: Some(PATTERN_SIZE),
            },
            wgpu::Extent3d {
                width: PATTERN_SIZE,
                height: PATTERN_SIZE,
                depth_or_array_layers: 1,
            },
        );

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, count: usize) {
        if count <= self.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        self.instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Forcefield Instance Uniforms"),
            size: capacity as u64 * ForcefieldUniforms::STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.capacity = capacity;
        // The old bind group still references the replaced buffer.
        self.bind_group = None;
        log::debug!("Forcefield instance buffer grown to {capacity} slots");
    }
}

impl RenderNode for ForcefieldPass {
    fn name(&self) -> &str {
        "Forcefield Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        let instances = &ctx.settings.forcefields;
        self.draw_count = instances.len() as u32;
        if instances.is_empty() {
            return;
        }

        self.ensure_capacity(ctx.device, instances.len());

        let template = &ctx.settings.forcefield_template;
        let stride = ForcefieldUniforms::STRIDE as usize;
        let mut data = vec![0u8; instances.len() * stride];
        for (i, instance) in instances.iter().enumerate() {
            let resolved = template.resolve(instance);
            let block = ForcefieldUniforms::new(
                &resolved,
                ctx.camera.view_proj,
                ctx.camera.near,
                ctx.camera.far,
                ctx.size,
                ctx.time,
                template.pattern_tiling,
                template.scroll_speed,
                template.intersection_range,
            );
            let offset = i * stride;
            data[offset..offset + std::mem::size_of::<ForcefieldUniforms>()]
                .copy_from_slice(bytemuck::bytes_of(&block));
        }
        ctx.queue.write_buffer(&self.instance_buffer, 0, &data);

        let depth_copy = &ctx.frame_resources.depth_copy_view;
        if self.bind_group.is_none() || self.bound_depth_copy_id != Some(depth_copy.id()) {
            self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Forcefield BindGroup"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &self.instance_buffer,
                            offset: 0,
                            size: wgpu::BufferSize::new(
                                std::mem::size_of::<ForcefieldUniforms>() as u64
                            ),
                        }),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&self.pattern_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(depth_copy),
                    },
                ],
            }));
            self.bound_depth_copy_id = Some(depth_copy.id());
        }

        // Drawn over the scene in place, before the post chain flips.
        self.color_view = Some(ctx.get_scene_color_input().clone());
        self.depth_view = Some(ctx.frame_resources.depth_view.clone());
    }

    fn run(&self, _ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if self.draw_count == 0 {
            return;
        }
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        let Some(color_view) = &self.color_view else {
            return;
        };
        let Some(depth_view) = &self.depth_view else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forcefield Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        for i in 0..self.draw_count {
            let offset = i * ForcefieldUniforms::STRIDE as u32;
            pass.set_bind_group(0, bind_group, &[offset]);
            pass.draw_indexed(0..36, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_indices_cover_every_face_vertex() {
        let (vertices, indices) = unit_cube();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        let max = indices.iter().copied().max().unwrap();
        assert_eq!(max as usize, vertices.len() - 1);
    }

    #[test]
    fn pattern_is_transparent_at_tile_corner_and_centre() {
        let texels = generate_circle_pattern();
        assert_eq!(texels.len(), (PATTERN_SIZE * PATTERN_SIZE) as usize);
        // Corner texel is outside the ring, centre texel inside it.
        assert_eq!(texels[0][3], 0);
        let centre = (PATTERN_SIZE / 2 * PATTERN_SIZE + PATTERN_SIZE / 2) as usize;
        assert_eq!(texels[centre][3], 0);
        // Somewhere on the ring radius the pattern is opaque.
        let on_ring = (PATTERN_SIZE / 2 * PATTERN_SIZE) as usize + (PATTERN_SIZE as f32 * 0.15) as usize;
        assert!(texels[on_ring][3] > 200);
    }
}
