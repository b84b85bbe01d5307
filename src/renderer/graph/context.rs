//! Phase-Separated Frame Contexts
//!
//! Two contexts drive every frame:
//!
//! - [`PrepareContext`]: mutable, for the **prepare** phase. Passes compile
//!   pipelines here, rebuild bind groups, and write their uniform buffers.
//!   It also owns the ping-pong counter that decides which HDR buffer is the
//!   current read side and which is the write side.
//! - [`ExecuteContext`]: read-only, for the **execute** phase. Passes record
//!   commands into the shared encoder; nothing may be allocated or written.
//!
//! Ping-pong resolution happens strictly in prepare: a pass that consumes
//! the chain caches the views (or bind groups over them) it resolved, then
//! flips the counter so the next pass sees its output as input.

use glam::{Mat4, Vec3};

use crate::renderer::frame::FrameResources;
use crate::renderer::passes::ScenePainter;
use crate::renderer::{ShaderCache, Tracked};
use crate::settings::FrameSettings;

// ============================================================================
// CameraState
// ============================================================================

/// Camera of the frame, as plain data.
///
/// The composer does not own a scene graph; whoever drives it supplies the
/// combined view-projection and the projection range each frame. The range
/// feeds depth linearization and the forcefield intersection test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub view_proj: Mat4,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            position: Vec3::ZERO,
            near: 0.1,
            far: 1000.0,
        }
    }
}

// ============================================================================
// PrepareContext
// ============================================================================

/// Mutable context available during the **prepare** phase.
pub struct PrepareContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Shared shader module cache.
    pub shader_cache: &'a mut ShaderCache,
    /// Frame-persistent attachments (ping-pong colour, depth, depth copy).
    pub frame_resources: &'a FrameResources,
    /// Current tuning, consumed fresh each frame.
    pub settings: &'a FrameSettings,
    /// Camera of this frame.
    pub camera: &'a CameraState,
    /// Seconds since the composer was created.
    pub time: f32,
    /// Format of the view the output pass will write to.
    pub output_format: wgpu::TextureFormat,
    /// Frame pixel size.
    pub size: (u32, u32),
    /// Ping-pong counter for post-processing I/O selection.
    pub(crate) color_view_flip_flop: usize,
}

impl PrepareContext<'_> {
    /// The current "input" scene colour view (previous pass output).
    #[must_use]
    #[inline]
    pub fn get_scene_color_input(&self) -> &Tracked<wgpu::TextureView> {
        &self.frame_resources.scene_color_view[self.color_view_flip_flop]
    }

    /// The current "output" scene colour view (this pass's target).
    #[must_use]
    #[inline]
    pub fn get_scene_color_output(&self) -> &Tracked<wgpu::TextureView> {
        &self.frame_resources.scene_color_view[1 - self.color_view_flip_flop]
    }

    /// Flips the ping-pong state.
    ///
    /// A pass that wrote to `get_scene_color_output()` calls this at the end
    /// of its `prepare`, after resolving every view it needs, so subsequent
    /// passes read what it wrote.
    #[inline]
    pub fn flip_scene_color(&mut self) {
        self.color_view_flip_flop = 1 - self.color_view_flip_flop;
    }
}

// ============================================================================
// ExecuteContext
// ============================================================================

/// Read-only context available during the **execute** phase.
pub struct ExecuteContext<'a> {
    pub device: &'a wgpu::Device,
    /// Destination of this frame's output pass (swapchain or headless).
    pub output_view: &'a wgpu::TextureView,
    /// Frame-persistent attachments.
    pub frame_resources: &'a FrameResources,
    /// Camera of this frame.
    pub camera: &'a CameraState,
    /// Draws the primary scene's geometry into the scene pass.
    pub painter: &'a dyn ScenePainter,
}
