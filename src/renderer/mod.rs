//! GPU Frame Composition
//!
//! Everything that touches wgpu lives under this module:
//!
//! - [`context`]: device and queue acquisition.
//! - [`frame`]: the per-frame attachment set (ping-pong colour, scene depth,
//!   resolved depth copy) and the target pool the bloom chain draws from.
//! - [`graph`]: the pass trait, the shared prepare/execute contexts, and the
//!   [`FrameComposer`](graph::FrameComposer) that drives a frame end to end.
//! - [`passes`]: the six render passes, in execution order: scene, depth
//!   resolve, forcefields, bloom, vignette, output.
//!
//! All intermediate targets use one HDR colour format; only the output pass
//! converts down to whatever format the caller presents.

pub mod context;
pub mod frame;
pub mod graph;
pub mod passes;
pub mod targets;

mod shaders;
mod tracked;

pub use context::GpuContext;
pub use frame::FrameResources;
pub use targets::RenderTargetPool;

pub(crate) use shaders::ShaderCache;
pub(crate) use tracked::Tracked;

/// Colour format of every intermediate render target.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Scene depth attachment format.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Format of the resolved view-space depth copy sampled by the forcefield
/// pass.
pub const DEPTH_COPY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
