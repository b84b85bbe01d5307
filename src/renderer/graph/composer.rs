//! Frame Composer
//!
//! [`FrameComposer`] owns the whole frame pipeline: the ping-pong
//! attachments, the six passes in [`RenderStage`] order, the shader cache
//! and the live settings. One `render` call runs both phases over every
//! pass and submits a single command buffer:
//!
//! 1. **prepare** — uniforms written, bind groups resolved, ping-pong
//!    choreographed (each consuming pass flips after resolving its views).
//! 2. **execute** — commands recorded into one encoder, one debug group
//!    per pass, then submitted.
//!
//! Resizes are debounced: `set_size` only records the request, and the next
//! `render` reallocates attachments before preparing. Nothing is ever
//! recreated mid-frame.

use std::time::Instant;

use crate::errors::Result;
use crate::renderer::context::GpuContext;
use crate::renderer::frame::FrameResources;
use crate::renderer::passes::{
    BloomPass, DepthResolvePass, ForcefieldPass, OutputPass, ScenePainter, ScenePass, VignettePass,
};
use crate::renderer::ShaderCache;
use crate::settings::{BloomConfig, FrameSettings, VignetteConfig};
use crate::settings::{ForcefieldInstance, ForcefieldTemplate};

use super::context::{CameraState, ExecuteContext, PrepareContext};
use super::node::RenderNode;
use super::stage::RenderStage;

pub struct FrameComposer {
    device: wgpu::Device,
    queue: wgpu::Queue,

    shader_cache: ShaderCache,
    frame_resources: FrameResources,
    settings: FrameSettings,
    camera: CameraState,
    output_format: wgpu::TextureFormat,
    size: (u32, u32),
    pending_size: Option<(u32, u32)>,

    scene_pass: ScenePass,
    depth_resolve_pass: DepthResolvePass,
    forcefield_pass: ForcefieldPass,
    bloom_pass: BloomPass,
    vignette_pass: VignettePass,
    output_pass: OutputPass,

    start: Instant,
}

impl FrameComposer {
    /// Builds the pipeline for an initial size and output format.
    ///
    /// Validates the bloom configuration and allocates every attachment and
    /// chain target up front; the only later allocations are resize
    /// reallocations and forcefield instance-buffer growth.
    pub fn new(
        gpu: &GpuContext,
        settings: FrameSettings,
        width: u32,
        height: u32,
        output_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let device = gpu.device.clone();
        let queue = gpu.queue.clone();
        let size = (width.max(1), height.max(1));

        let mut shader_cache = ShaderCache::new();
        let frame_resources = FrameResources::new(&device, size);

        let scene_pass = ScenePass::new();
        let depth_resolve_pass = DepthResolvePass::new(&device, &mut shader_cache);
        let forcefield_pass = ForcefieldPass::new(&device, &queue, &mut shader_cache);
        let bloom_pass =
            BloomPass::new(&device, &mut shader_cache, &settings.bloom, size.0, size.1)?;
        let vignette_pass = VignettePass::new(&device, &mut shader_cache);
        let output_pass = OutputPass::new(&device, &mut shader_cache, output_format);

        log::info!(
            "Frame composer ready: {}x{}, {} bloom levels, output {:?}",
            size.0,
            size.1,
            bloom_pass.levels(),
            output_format
        );
        log::debug!("Shader cache holds {} modules", shader_cache.module_count());

        Ok(Self {
            device,
            queue,
            shader_cache,
            frame_resources,
            settings,
            camera: CameraState::default(),
            output_format,
            size,
            pending_size: None,
            scene_pass,
            depth_resolve_pass,
            forcefield_pass,
            bloom_pass,
            vignette_pass,
            output_pass,
            start: Instant::now(),
        })
    }

    // ========================================================================
    // Tuning
    // ========================================================================

    /// Records a new frame size; applied at the start of the next `render`.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.pending_size = Some((width.max(1), height.max(1)));
    }

    /// Current frame size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Replaces the bloom tuning.
    ///
    /// The chain depth is fixed when the composer is built; a config with a
    /// different `levels` keeps the existing depth and logs a warning.
    pub fn set_bloom_config(&mut self, config: BloomConfig) {
        let levels = self.bloom_pass.levels();
        if config.levels != levels {
            log::warn!(
                "Bloom chain depth is fixed at construction ({levels} levels); ignoring requested {}",
                config.levels
            );
        }
        self.settings.bloom = BloomConfig { levels, ..config };
    }

    pub fn set_vignette_config(&mut self, config: VignetteConfig) {
        self.settings.vignette = config;
    }

    /// Exposure applied by the output tone map.
    pub fn set_exposure(&mut self, exposure: f32) {
        self.settings.exposure = exposure.max(0.0);
    }

    #[must_use]
    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    /// Camera for subsequent frames, as plain data.
    pub fn camera_mut(&mut self) -> &mut CameraState {
        &mut self.camera
    }

    #[must_use]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// Forcefield volumes drawn each frame. Push, mutate or clear freely
    /// between frames.
    pub fn forcefields_mut(&mut self) -> &mut Vec<ForcefieldInstance> {
        &mut self.settings.forcefields
    }

    /// Shared material template for every forcefield volume.
    pub fn forcefield_template_mut(&mut self) -> &mut ForcefieldTemplate {
        &mut self.settings.forcefield_template
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Renders one frame into `output_view`.
    ///
    /// The view must match the current frame size and the composer's output
    /// format; a format change is picked up here and rebuilds the output
    /// pipeline.
    pub fn render(
        &mut self,
        output_view: &wgpu::TextureView,
        painter: &dyn ScenePainter,
    ) -> Result<()> {
        self.apply_pending_size()?;

        let time = self.start.elapsed().as_secs_f32();

        // Prepare phase, in RenderStage order. Ping-pong starts at side 0
        // every frame; passes that consume the chain flip it.
        {
            let mut ctx = PrepareContext {
                device: &self.device,
                queue: &self.queue,
                shader_cache: &mut self.shader_cache,
                frame_resources: &self.frame_resources,
                settings: &self.settings,
                camera: &self.camera,
                time,
                output_format: self.output_format,
                size: self.size,
                color_view_flip_flop: 0,
            };
            self.scene_pass.prepare(&mut ctx);
            self.depth_resolve_pass.prepare(&mut ctx);
            self.forcefield_pass.prepare(&mut ctx);
            self.bloom_pass.prepare(&mut ctx);
            self.vignette_pass.prepare(&mut ctx);
            self.output_pass.prepare(&mut ctx);
        }

        // Execute phase: one encoder, one submit.
        let ctx = ExecuteContext {
            device: &self.device,
            output_view,
            frame_resources: &self.frame_resources,
            camera: &self.camera,
            painter,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Composer Encoder"),
            });

        for stage in RenderStage::all() {
            let node = self.node_for_stage(stage);
            encoder.push_debug_group(node.name());
            node.run(&ctx, &mut encoder);
            encoder.pop_debug_group();
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Releases the chain targets. Frame attachments and pipelines drop with
    /// the composer itself.
    pub fn dispose(self) {
        self.bloom_pass.dispose();
        log::info!("Frame composer disposed");
    }

    fn node_for_stage(&self, stage: RenderStage) -> &dyn RenderNode {
        match stage {
            RenderStage::Scene => &self.scene_pass,
            RenderStage::DepthResolve => &self.depth_resolve_pass,
            RenderStage::Forcefield => &self.forcefield_pass,
            RenderStage::Bloom => &self.bloom_pass,
            RenderStage::Vignette => &self.vignette_pass,
            RenderStage::Output => &self.output_pass,
        }
    }

    fn apply_pending_size(&mut self) -> Result<()> {
        let Some(size) = self.pending_size.take() else {
            return Ok(());
        };
        if size == self.size {
            return Ok(());
        }
        self.size = size;
        self.frame_resources.resize(&self.device, size);
        self.bloom_pass.resize(&self.device, size.0, size.1)?;
        self.vignette_pass.invalidate_bind_groups();
        self.output_pass.invalidate_bind_groups();
        log::info!("Composer resized to {}x{}", size.0, size.1);
        Ok(())
    }
}
