//! Scene pass: clears the frame and delegates geometry to the caller.

use crate::renderer::graph::{CameraState, ExecuteContext, PrepareContext, RenderNode};
use crate::renderer::Tracked;

/// Records the application's geometry into the opened scene pass.
///
/// The composer owns the attachments and the post-processing chain but not
/// the scene itself. Whoever drives a frame implements this trait and binds
/// its own pipelines, vertex data and bind groups inside `paint`.
///
/// The pass targets the HDR colour attachment
/// ([`HDR_FORMAT`](crate::renderer::HDR_FORMAT)) with a depth attachment
/// ([`DEPTH_FORMAT`](crate::renderer::DEPTH_FORMAT)), both already cleared.
/// Pipelines bound inside `paint` must match those formats.
pub trait ScenePainter {
    fn paint(&self, pass: &mut wgpu::RenderPass<'_>, camera: &CameraState);
}

/// Painter that records nothing. The attachments are still cleared and the
/// rest of the pipeline still runs over the empty frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPainter;

impl ScenePainter for NullPainter {
    fn paint(&self, _pass: &mut wgpu::RenderPass<'_>, _camera: &CameraState) {}
}

/// Opens the frame.
///
/// Clears the current scene colour attachment and the depth attachment, then
/// hands the pass to the [`ScenePainter`] carried on the execute context.
/// First writer of the frame, so it draws into the ping-pong *input* side and
/// does not flip.
pub struct ScenePass {
    color_view: Option<Tracked<wgpu::TextureView>>,
    depth_view: Option<Tracked<wgpu::TextureView>>,
}

impl ScenePass {
    pub fn new() -> Self {
        Self {
            color_view: None,
            depth_view: None,
        }
    }
}

impl Default for ScenePass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for ScenePass {
    fn name(&self) -> &str {
        "Scene Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        self.color_view = Some(ctx.get_scene_color_input().clone());
        self.depth_view = Some(ctx.frame_resources.depth_view.clone());
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let Some(color_view) = &self.color_view else {
            return;
        };
        let Some(depth_view) = &self.depth_view else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        ctx.painter.paint(&mut pass, ctx.camera);
    }
}
